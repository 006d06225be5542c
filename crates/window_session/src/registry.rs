//! Native handle registry and per-window callback records
//!
//! The registry answers one question for the dispatcher: which window owns this
//! native handle? It stores the owning [`WindowId`], never a reference, so a
//! window can move in memory without invalidating its entry.
//!
//! Registration happens after the native window exists and before any of its
//! events can be dispatched. Unregistration happens before the native window is
//! destroyed. Both run on the session thread, so no locking is involved.

use std::collections::HashMap;

use crate::backend::NativeHandle;
use crate::error::RegistryError;
use crate::event::EventMask;
use crate::foundation::collections::{CallbackKey, HandleMap};
use crate::window::WindowId;

/// Mapping from live native handles to their owning windows
#[derive(Debug, Default)]
pub struct HandleRegistry {
    entries: HashMap<NativeHandle, WindowId>,
}

impl HandleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate a freshly created handle with its window
    pub fn register(&mut self, handle: NativeHandle, window: WindowId) -> Result<(), RegistryError> {
        if let Some(&existing) = self.entries.get(&handle) {
            return Err(RegistryError::AlreadyRegistered { handle, existing });
        }
        self.entries.insert(handle, window);
        Ok(())
    }

    /// Window owning `handle`
    pub fn lookup(&self, handle: NativeHandle) -> Result<WindowId, RegistryError> {
        self.entries.get(&handle).copied().ok_or(RegistryError::NotFound(handle))
    }

    /// Drop the entry for `handle`, returning the window it mapped to
    pub fn unregister(&mut self, handle: NativeHandle) -> Option<WindowId> {
        self.entries.remove(&handle)
    }

    /// Whether `handle` is registered
    pub fn contains(&self, handle: NativeHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    /// Number of registered handles
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no handle is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(handle, window)` entries
    pub fn iter(&self) -> impl Iterator<Item = (NativeHandle, WindowId)> + '_ {
        self.entries.iter().map(|(&handle, &window)| (handle, window))
    }
}

/// Per-window callback context, referenced from the native user-data slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackState {
    /// Owning window
    pub window: WindowId,
    /// Native handle the callbacks are installed on
    pub handle: NativeHandle,
    /// Event kinds with an installed trampoline
    pub installed: EventMask,
}

/// Arena of callback records, one per live window
pub type CallbackArena = HandleMap<CallbackKey, CallbackState>;

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(raw: u64) -> NativeHandle {
        NativeHandle::from_raw(raw).unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = HandleRegistry::new();
        registry.register(handle(1), WindowId::from_raw(1)).unwrap();
        registry.register(handle(2), WindowId::from_raw(2)).unwrap();

        assert_eq!(registry.lookup(handle(2)), Ok(WindowId::from_raw(2)));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_lookup_missing_handle() {
        let registry = HandleRegistry::new();
        assert_eq!(registry.lookup(handle(9)), Err(RegistryError::NotFound(handle(9))));
    }

    #[test]
    fn test_double_registration_rejected() {
        let mut registry = HandleRegistry::new();
        registry.register(handle(1), WindowId::from_raw(1)).unwrap();
        let err = registry.register(handle(1), WindowId::from_raw(2)).unwrap_err();
        assert_eq!(err, RegistryError::AlreadyRegistered { handle: handle(1), existing: WindowId::from_raw(1) });
        assert_eq!(registry.lookup(handle(1)), Ok(WindowId::from_raw(1)));
    }

    #[test]
    fn test_unregister() {
        let mut registry = HandleRegistry::new();
        registry.register(handle(4), WindowId::from_raw(1)).unwrap();
        assert_eq!(registry.unregister(handle(4)), Some(WindowId::from_raw(1)));
        assert_eq!(registry.unregister(handle(4)), None);
        assert!(registry.is_empty());
        assert!(registry.lookup(handle(4)).is_err());
    }
}
