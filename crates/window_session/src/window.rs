//! Session-owned windows
//!
//! A [`Window`] wraps one native handle and owns one [`Signal`] per event kind.
//! Windows are only created by [`Session::create_window`](crate::Session::create_window)
//! and only destroyed by the session, either when the main loop sees a close
//! request or when the session itself goes away.
//!
//! # Teardown order
//! Dropping a window releases its callback record, removes its registry entry,
//! clears the native user-data slot and only then destroys the native handle. No
//! event can be routed to a half destroyed window.
//!
//! # Relocation
//! The registry maps handles to [`WindowId`]s, not addresses. A window may move
//! freely (returned by value, rebalanced inside the session's map) without any
//! bookkeeping update.

use std::fmt;
use std::path::PathBuf;
use std::rc::Weak;

use crate::backend::{Image, NativeHandle, ProcAddress, SizeLimits, WindowBackend};
use crate::foundation::collections::CallbackKey;
use crate::input::{KeyInput, Modifiers, MouseInput};
use crate::session::SessionShared;
use crate::signal::Signal;

/// Session-scoped window identifier
///
/// Allocated from a counter that starts at 1 and never goes back, so ids are
/// never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(u64);

impl WindowId {
    /// Reserved id meaning "no window" (e.g. no shared context)
    pub const NONE: Self = Self(0);

    /// Wrap a raw id
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id
    pub fn as_raw(self) -> u64 {
        self.0
    }

    /// Whether this is the reserved [`WindowId::NONE`]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

/// Native window owned by a session
///
/// A `Window` is bound to the session that created it and to one native
/// handle. Don't `std::mem::swap` or `replace` windows reached through
/// [`Session::window_mut`](crate::Session::window_mut): the session keeps
/// finding the window by its id, so the next event for the displaced handle
/// fails the handle check and polling panics.
pub struct Window {
    id: WindowId,
    handle: NativeHandle,
    callback: CallbackKey,
    owner: Weak<SessionShared>,

    /// Window moved, `(x, y)` of the content area
    pub on_pos: Signal<(i32, i32)>,
    /// Content area resized, `(width, height)`
    pub on_size: Signal<(i32, i32)>,
    /// User asked to close the window
    pub on_close: Signal<()>,
    /// Contents need to be redrawn
    pub on_refresh: Signal<()>,
    /// Focus gained (`true`) or lost
    pub on_focus: Signal<bool>,
    /// Minimized (`true`) or restored
    pub on_iconify: Signal<bool>,
    /// Maximized (`true`) or restored
    pub on_maximize: Signal<bool>,
    /// Framebuffer resized, `(width, height)` in pixels
    pub on_framebuffer_size: Signal<(i32, i32)>,
    /// Content scale changed, `(x, y)`
    pub on_content_scale: Signal<(f32, f32)>,
    /// Keyboard key event
    pub on_key: Signal<KeyInput>,
    /// Character input
    pub on_char: Signal<char>,
    /// Character input with modifiers
    pub on_char_mods: Signal<(char, Modifiers)>,
    /// Mouse button event
    pub on_mouse_button: Signal<MouseInput>,
    /// Cursor moved, `(x, y)` relative to the content area
    pub on_cursor_pos: Signal<(f64, f64)>,
    /// Cursor entered (`true`) or left the content area
    pub on_cursor_enter: Signal<bool>,
    /// Scrolled, `(x, y)` offsets
    pub on_scroll: Signal<(f64, f64)>,
    /// Paths dropped onto the window
    pub on_drop: Signal<Vec<PathBuf>>,
}

impl Window {
    pub(crate) fn new(id: WindowId, handle: NativeHandle, callback: CallbackKey, owner: Weak<SessionShared>) -> Self {
        Self {
            id,
            handle,
            callback,
            owner,
            on_pos: Signal::new(),
            on_size: Signal::new(),
            on_close: Signal::new(),
            on_refresh: Signal::new(),
            on_focus: Signal::new(),
            on_iconify: Signal::new(),
            on_maximize: Signal::new(),
            on_framebuffer_size: Signal::new(),
            on_content_scale: Signal::new(),
            on_key: Signal::new(),
            on_char: Signal::new(),
            on_char_mods: Signal::new(),
            on_mouse_button: Signal::new(),
            on_cursor_pos: Signal::new(),
            on_cursor_enter: Signal::new(),
            on_scroll: Signal::new(),
            on_drop: Signal::new(),
        }
    }

    /// Session id
    pub fn id(&self) -> WindowId {
        self.id
    }

    /// Native handle
    pub fn handle(&self) -> NativeHandle {
        self.handle
    }

    pub(crate) fn callback_key(&self) -> CallbackKey {
        self.callback
    }

    fn with_backend<R>(&self, f: impl FnOnce(&mut dyn WindowBackend) -> R) -> Option<R> {
        let shared = self.owner.upgrade()?;
        let result = f(&mut **shared.backend.borrow_mut());
        Some(result)
    }

    fn query<R: Default>(&self, f: impl FnOnce(&dyn WindowBackend) -> R) -> R {
        self.owner
            .upgrade()
            .map(|shared| {
                let backend = shared.backend.borrow();
                f(&**backend)
            })
            .unwrap_or_default()
    }

    /// Bind (`true`) or unbind this window's graphics context on this thread
    ///
    /// A failed bind leaves the previous context current. The cause is not
    /// reported here, check [`Session::last_error`](crate::Session::last_error).
    pub fn make_current(&mut self, is_on: bool) {
        let Some(shared) = self.owner.upgrade() else { return };
        if is_on {
            let bound = shared.backend.borrow_mut().make_context_current(Some(self.handle));
            if bound {
                shared.current.set(Some(self.handle));
            }
        } else if shared.current.get() == Some(self.handle) {
            shared.backend.borrow_mut().make_context_current(None);
            shared.current.set(None);
        }
    }

    /// Whether this window's context is current on this thread
    pub fn is_current(&self) -> bool {
        self.owner
            .upgrade()
            .is_some_and(|shared| shared.current.get() == Some(self.handle))
    }

    /// Present the back buffer
    pub fn swap_buffers(&mut self) {
        let handle = self.handle;
        self.with_backend(|backend| backend.swap_buffers(handle));
    }

    /// Whether closing was requested, does not change any state
    pub fn should_close(&self) -> bool {
        let handle = self.handle;
        self.query(|backend| backend.should_close(handle))
    }

    /// Request (or cancel a request) to close the window
    ///
    /// The session erases the window on its next loop iteration.
    pub fn set_should_close(&mut self, value: bool) {
        let handle = self.handle;
        self.with_backend(|backend| backend.set_should_close(handle, value));
    }

    /// Current title
    pub fn title(&self) -> String {
        let handle = self.handle;
        self.query(|backend| backend.title(handle))
    }

    /// Set the title
    pub fn set_title(&mut self, title: &str) {
        let handle = self.handle;
        self.with_backend(|backend| backend.set_title(handle, title));
    }

    /// Set the icon, the backend picks the best size. Empty restores the default.
    pub fn set_icon(&mut self, images: &[Image]) {
        let handle = self.handle;
        self.with_backend(|backend| backend.set_icon(handle, images));
    }

    /// Content area position
    pub fn pos(&self) -> (i32, i32) {
        let handle = self.handle;
        self.query(|backend| backend.pos(handle))
    }

    /// Move the content area
    pub fn set_pos(&mut self, x: i32, y: i32) {
        let handle = self.handle;
        self.with_backend(|backend| backend.set_pos(handle, x, y));
    }

    /// Content area size
    pub fn size(&self) -> (u32, u32) {
        let handle = self.handle;
        self.query(|backend| backend.size(handle))
    }

    /// Resize the content area
    pub fn set_size(&mut self, width: u32, height: u32) {
        let handle = self.handle;
        self.with_backend(|backend| backend.set_size(handle, width, height));
    }

    /// Framebuffer size in pixels
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let handle = self.handle;
        self.query(|backend| backend.framebuffer_size(handle))
    }

    /// Limit the content area size, `None` leaves that side unbounded
    pub fn set_size_limits(&mut self, min: Option<(u32, u32)>, max: Option<(u32, u32)>) {
        let handle = self.handle;
        self.with_backend(|backend| backend.set_size_limits(handle, SizeLimits { min, max }));
    }

    /// Lock the content area to `numerator:denominator`, `None` unlocks
    pub fn set_aspect_ratio(&mut self, ratio: Option<(u32, u32)>) {
        let handle = self.handle;
        self.with_backend(|backend| backend.set_aspect_ratio(handle, ratio));
    }

    /// Whole-window opacity
    pub fn opacity(&self) -> f32 {
        let handle = self.handle;
        self.query(|backend| backend.opacity(handle))
    }

    /// Set whole-window opacity in `[0, 1]`
    pub fn set_opacity(&mut self, opacity: f32) {
        let handle = self.handle;
        self.with_backend(|backend| backend.set_opacity(handle, opacity));
    }

    /// Resolve a graphics API entry point
    ///
    /// Only meaningful while this window's context is current; returns `None`
    /// otherwise, or when the name doesn't resolve.
    pub fn proc_address(&mut self, name: &str) -> Option<ProcAddress> {
        if !self.is_current() {
            log::warn!("{}: proc_address({name}) without a current context", self.id);
            return None;
        }
        self.with_backend(|backend| backend.proc_address(name))
            .filter(|address| !address.is_null())
    }

    /// Whether the current context supports a graphics API extension
    pub fn extension_supported(&self, name: &str) -> bool {
        self.is_current() && self.query(|backend| backend.extension_supported(name))
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        let Some(shared) = self.owner.upgrade() else {
            log::warn!("{} outlived its session, native handle {} leaked", self.id, self.handle);
            return;
        };

        shared.callbacks.borrow_mut().remove(self.callback);
        shared.registry.borrow_mut().unregister(self.handle);
        if shared.current.get() == Some(self.handle) {
            shared.current.set(None);
        }

        let mut backend = shared.backend.borrow_mut();
        backend.set_user_slot(self.handle, None);
        backend.destroy_window(self.handle);
        log::debug!("Destroyed {} ({})", self.id, self.handle);
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}
