//! Windowing session and main loop
//!
//! A [`Session`] is the process-side owner of the native windowing library: it
//! initializes the backend, owns every live [`Window`] keyed by [`WindowId`],
//! holds the hints for the next window and drives the main loop.
//!
//! # Main loop
//!
//! Each iteration polls native events (dispatching them to window signals),
//! then walks the live windows. Windows that requested closing are collected
//! first and erased in a second pass, after the walk is over. Every other window
//! gets the `on_window_process` observers and a buffer swap. The loop ends when
//! the last window is gone.
//!
//! # Threading
//! Sessions are confined to the thread that created them (`Rc`/`RefCell`
//! inside), which is also the only thread native callbacks are delivered on.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::backend::{CreateRequest, EventBatch, NativeHandle, WindowBackend};
use crate::config::SessionConfig;
use crate::dispatch;
use crate::error::{DispatchError, ErrorCode, NativeError, RegistryError, SessionError, SessionResult};
use crate::event::{EventKind, EventMask, NativeEvent};
use crate::foundation::collections::CallbackKey;
use crate::hints::{apply_init_hints, WindowHints};
use crate::monitor::{Monitor, VideoMode};
use crate::registry::{CallbackArena, CallbackState, HandleRegistry};
use crate::signal::Signal;
use crate::window::{Window, WindowId};

/// State reachable from both the session and its windows
pub(crate) struct SessionShared {
    pub(crate) backend: RefCell<Box<dyn WindowBackend>>,
    pub(crate) registry: RefCell<HandleRegistry>,
    pub(crate) callbacks: RefCell<CallbackArena>,
    pub(crate) current: Cell<Option<NativeHandle>>,
}

/// Owner of the native windowing library and every live window
pub struct Session {
    shared: Rc<SessionShared>,
    windows: BTreeMap<WindowId, Window>,
    next_id: u64,
    base_hints: WindowHints,
    pending_hints: Option<WindowHints>,

    /// Invoked once per iteration for every window that isn't closing, right
    /// before its buffers are swapped
    pub on_window_process: Signal<WindowId>,
}

impl Session {
    /// Initialize `backend` with default configuration
    pub fn new(backend: impl WindowBackend + 'static) -> SessionResult<Self> {
        Self::with_config(backend, &SessionConfig::default())
    }

    /// Apply the configured init hints and initialize `backend`
    ///
    /// # Errors
    /// [`SessionError::PlatformUnavailable`] when there's no usable windowing
    /// platform, [`SessionError::PlatformError`] for any other init failure.
    pub fn with_config(backend: impl WindowBackend + 'static, config: &SessionConfig) -> SessionResult<Self> {
        let mut backend: Box<dyn WindowBackend> = Box::new(backend);
        apply_init_hints(&config.init_hints, backend.as_mut());
        backend.init().map_err(SessionError::from_init)?;
        log::info!("Windowing session initialized");

        Ok(Self {
            shared: Rc::new(SessionShared {
                backend: RefCell::new(backend),
                registry: RefCell::new(HandleRegistry::new()),
                callbacks: RefCell::new(CallbackArena::with_key()),
                current: Cell::new(None),
            }),
            windows: BTreeMap::new(),
            next_id: 1,
            base_hints: config.window_hints.clone(),
            pending_hints: None,
            on_window_process: Signal::new(),
        })
    }

    /// Session on the GLFW native layer
    #[cfg(feature = "glfw")]
    pub fn glfw(config: &SessionConfig) -> SessionResult<Self> {
        Self::with_config(crate::backend::GlfwBackend::new(), config)
    }

    /// Hints for the next [`create_window`](Self::create_window) call only
    ///
    /// They are applied on top of the library defaults and the configured base
    /// hints, then dropped. Replaces any snapshot that wasn't consumed yet.
    pub fn set_next_window_hints(&mut self, hints: WindowHints) {
        self.pending_hints = Some(hints);
    }

    /// Create a window and take ownership of it
    ///
    /// `monitor` selects full screen mode, `share_with` names a live window
    /// whose context objects are shared ([`WindowId::NONE`] means no sharing).
    /// Pending hints are consumed even if creation fails.
    ///
    /// # Errors
    /// [`SessionError::UnknownWindow`] if `share_with` isn't live,
    /// [`SessionError::WindowCreation`] if the native layer refuses.
    pub fn create_window(
        &mut self,
        width: u32,
        height: u32,
        title: &str,
        monitor: Option<&Monitor>,
        share_with: Option<WindowId>,
    ) -> SessionResult<&mut Window> {
        let share = match share_with.filter(|id| !id.is_none()) {
            Some(id) => Some(self.windows.get(&id).ok_or(SessionError::UnknownWindow(id))?.handle()),
            None => None,
        };
        let hints = self.pending_hints.take();

        let handle = {
            let mut backend = self.shared.backend.borrow_mut();
            backend.default_window_hints();
            self.base_hints.apply(&mut **backend);
            if let Some(hints) = &hints {
                hints.apply(&mut **backend);
            }

            let request = CreateRequest { width, height, title, monitor: monitor.map(Monitor::handle), share };
            match backend.create_window(&request) {
                Some(handle) => handle,
                None => {
                    let error = backend
                        .last_error()
                        .unwrap_or_else(|| NativeError::new(ErrorCode::PlatformError, "native window creation failed"));
                    return Err(SessionError::WindowCreation(error));
                }
            }
        };

        let id = WindowId::from_raw(self.next_id);
        self.next_id += 1;
        let window = self.wire(id, handle)?;
        log::debug!("Created {id} ({handle}) {width}x{height} {title:?}");

        let interval = hints.and_then(|hints| hints.swap_interval).or(self.base_hints.swap_interval);
        if let Some(interval) = interval {
            self.apply_swap_interval(handle, interval);
        }

        Ok(self.windows.entry(id).or_insert(window))
    }

    /// Callback record, registry entry, user-data slot and trampolines for a
    /// freshly created native window
    fn wire(&mut self, id: WindowId, handle: NativeHandle) -> SessionResult<Window> {
        let callback = self.shared.callbacks.borrow_mut().insert(CallbackState {
            window: id,
            handle,
            installed: EventMask::empty(),
        });

        if let Err(error) = self.shared.registry.borrow_mut().register(handle, id) {
            self.shared.callbacks.borrow_mut().remove(callback);
            self.shared.backend.borrow_mut().destroy_window(handle);
            return Err(SessionError::Registry(error));
        }
        let window = Window::new(id, handle, callback, Rc::downgrade(&self.shared));

        let mut backend = self.shared.backend.borrow_mut();
        backend.set_user_slot(handle, Some(callback.to_user_slot()));
        for kind in EventKind::ALL {
            backend.install_callback(handle, kind);
        }
        if let Some(state) = self.shared.callbacks.borrow_mut().get_mut(callback) {
            state.installed = EventMask::ALL;
        }
        Ok(window)
    }

    #[cfg(test)]
    pub(crate) fn shared(&self) -> &SessionShared {
        &self.shared
    }

    fn apply_swap_interval(&mut self, handle: NativeHandle, interval: u32) {
        let previous = self.shared.current.get();
        let mut backend = self.shared.backend.borrow_mut();
        if !backend.make_context_current(Some(handle)) {
            log::warn!("Swap interval {interval} not applied, {handle} has no usable context");
            return;
        }
        backend.swap_interval(interval);
        backend.make_context_current(previous);
    }

    /// Poll native events and dispatch them to window signals
    ///
    /// # Panics
    /// If an event can't be matched to its window. That means the registry and
    /// the live windows disagree, which is a bug in the dispatch wiring.
    pub fn poll_events(&mut self) {
        let batch = self.shared.backend.borrow_mut().poll_events();
        self.deliver(batch);
    }

    /// Block until an event arrives, then dispatch pending events
    pub fn wait_events(&mut self) {
        let batch = self.shared.backend.borrow_mut().wait_events();
        self.deliver(batch);
    }

    /// Like [`wait_events`](Self::wait_events), giving up after `timeout` seconds
    pub fn wait_events_timeout(&mut self, timeout: f64) {
        let batch = self.shared.backend.borrow_mut().wait_events_timeout(timeout);
        self.deliver(batch);
    }

    /// Wake up a blocked [`wait_events`](Self::wait_events)
    pub fn post_empty_event(&mut self) {
        self.shared.backend.borrow_mut().post_empty_event();
    }

    fn deliver(&mut self, batch: EventBatch) {
        for (handle, event) in batch {
            match self.dispatch_event(handle, event) {
                Ok(_) => {}
                Err(error) if error.is_invariant_violation() => {
                    panic!("native event dispatch invariant violated: {error}");
                }
                Err(error) => log::warn!("Dropping native event: {error}"),
            }
        }
    }

    /// Route one native event as if the backend had delivered it
    ///
    /// # Errors
    /// [`DispatchError::NotFound`] if no live window owns `handle`.
    pub fn dispatch_event(&mut self, handle: NativeHandle, event: NativeEvent) -> Result<EventKind, DispatchError> {
        let registry = self.shared.registry.borrow();
        dispatch::dispatch(&registry, &mut self.windows, handle, event)
    }

    /// One main loop iteration, returns the ids erased in it
    pub fn run_once(&mut self) -> Vec<WindowId> {
        self.poll_events();

        let mut to_delete = BTreeSet::new();
        for (&id, window) in &mut self.windows {
            if window.should_close() {
                to_delete.insert(id);
                continue;
            }
            self.on_window_process.emit(window, &id);
            window.swap_buffers();
        }

        for id in &to_delete {
            self.windows.remove(id);
        }
        to_delete.into_iter().collect()
    }

    /// Run until every window is closed
    pub fn run(&mut self) {
        log::info!("Entering main loop with {} window(s)", self.windows.len());
        while !self.windows.is_empty() {
            for id in self.run_once() {
                log::info!("Closed {id}");
            }
        }
        log::info!("Main loop finished");
    }

    /// Destroy a window right away, `false` if it wasn't live
    pub fn destroy_window(&mut self, id: WindowId) -> bool {
        self.windows.remove(&id).is_some()
    }

    /// Live window by id
    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(&id)
    }

    /// Live window by id, mutably
    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.get_mut(&id)
    }

    /// Ids of live windows, ascending
    pub fn window_ids(&self) -> Vec<WindowId> {
        self.windows.keys().copied().collect()
    }

    /// Live windows in id order
    pub fn windows(&self) -> impl Iterator<Item = &Window> {
        self.windows.values()
    }

    /// Whether `id` names a live window
    pub fn contains(&self, id: WindowId) -> bool {
        self.windows.contains_key(&id)
    }

    /// Number of live windows
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Whether no window is live
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Connected monitors, primary first
    pub fn monitors(&mut self) -> Vec<Monitor> {
        let mut backend = self.shared.backend.borrow_mut();
        let handles = backend.monitors();
        handles
            .into_iter()
            .map(|handle| Monitor::new(handle, backend.monitor_name(handle)))
            .collect()
    }

    /// Primary monitor
    pub fn primary_monitor(&mut self) -> Option<Monitor> {
        let mut backend = self.shared.backend.borrow_mut();
        let handle = backend.primary_monitor()?;
        Some(Monitor::new(handle, backend.monitor_name(handle)))
    }

    /// Every video mode `monitor` supports
    pub fn video_modes(&mut self, monitor: &Monitor) -> Vec<VideoMode> {
        self.shared.backend.borrow_mut().video_modes(monitor.handle())
    }

    /// Video mode `monitor` currently uses
    pub fn current_video_mode(&mut self, monitor: &Monitor) -> Option<VideoMode> {
        self.shared.backend.borrow_mut().current_video_mode(monitor.handle())
    }

    /// Take the last native error
    ///
    /// Per-window operations don't fail observably; this is where their errors end up.
    pub fn last_error(&mut self) -> Option<NativeError> {
        self.shared.backend.borrow_mut().last_error()
    }

    /// Verify that registry, callback records and user-data slots agree
    ///
    /// # Errors
    /// The first disagreement found.
    pub fn check_consistency(&self) -> Result<(), RegistryError> {
        let registry = self.shared.registry.borrow();
        let callbacks = self.shared.callbacks.borrow();
        let backend = self.shared.backend.borrow();

        for (&id, window) in &self.windows {
            let handle = window.handle();
            let inconsistent = |reason: String| RegistryError::Inconsistent { window: id, reason };

            let owner = registry.lookup(handle)?;
            if owner != id {
                return Err(inconsistent(format!("registry maps {handle} to {owner}")));
            }

            let key = window.callback_key();
            let state = callbacks
                .get(key)
                .ok_or_else(|| inconsistent("callback record released".to_string()))?;
            if state.window != id || state.handle != handle {
                return Err(inconsistent(format!("callback record belongs to {} ({})", state.window, state.handle)));
            }
            if state.installed != EventMask::ALL {
                return Err(inconsistent(format!("trampolines installed: {:?}", state.installed)));
            }
            if backend.user_slot(handle).map(CallbackKey::from_user_slot) != Some(key) {
                return Err(inconsistent("user-data slot doesn't reference the callback record".to_string()));
            }
        }

        if registry.len() != self.windows.len() || callbacks.len() != self.windows.len() {
            return Err(RegistryError::Inconsistent {
                window: WindowId::NONE,
                reason: format!(
                    "{} windows, {} registry entries, {} callback records",
                    self.windows.len(),
                    registry.len(),
                    callbacks.len()
                ),
            });
        }
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shared.current.set(None);
        self.shared.backend.borrow_mut().make_context_current(None);

        let remaining = self.windows.len();
        self.windows.clear();
        self.shared.backend.borrow_mut().terminate();
        log::info!("Windowing session shut down ({remaining} window(s) destroyed)");
    }
}
