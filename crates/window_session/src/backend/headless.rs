//! In-memory native layer
//!
//! [`HeadlessBackend`] keeps every native window as a plain record and never
//! touches a display server. Everything a real platform would do on its own
//! (the user clicking the close button, the window manager moving a window,
//! input arriving) is driven from the outside through a [`HeadlessProbe`], a
//! cloneable view onto the same state that stays usable after the backend was
//! moved into a session.
//!
//! Geometry setters echo the matching events (`Pos`, `Size`,
//! `FramebufferSize`) into the queue, as a window manager would.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use super::{CreateRequest, EventBatch, Image, NativeHandle, ProcAddress, SizeLimits, UserSlot, WindowBackend};
use crate::error::{ErrorCode, NativeError};
use crate::event::{EventKind, EventMask, NativeEvent};
use crate::hints::{ClientApi, InitHint, WindowHint};
use crate::monitor::{MonitorHandle, VideoMode};

/// Non-null target for resolved entry points
static ENTRY_POINT: u8 = 0;

const DEFAULT_PROCS: &[&str] = &["glClear", "glClearColor", "glGetString", "glViewport"];
const DEFAULT_EXTENSIONS: &[&str] = &["GL_ARB_debug_output", "GL_KHR_debug"];

/// Lifecycle call observed by the headless layer, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum HeadlessCall {
    Init,
    Create(NativeHandle),
    SetUserSlot(NativeHandle, Option<UserSlot>),
    Destroy(NativeHandle),
    MakeCurrent(Option<NativeHandle>),
    SwapInterval(u32),
    Terminate,
}

/// Snapshot of one headless native window
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessWindow {
    /// Title
    pub title: String,
    /// Content area position
    pub pos: (i32, i32),
    /// Content area size
    pub size: (u32, u32),
    /// Opacity
    pub opacity: f32,
    /// Close requested flag
    pub should_close: bool,
    /// User-data slot
    pub user_slot: Option<UserSlot>,
    /// Event kinds with an installed callback
    pub installed: EventMask,
    /// Window hint state at creation time, in application order
    pub hints: Vec<WindowHint>,
    /// Full screen monitor
    pub monitor: Option<MonitorHandle>,
    /// Window whose context objects are shared
    pub share: Option<NativeHandle>,
    /// Icon candidates
    pub icon: Vec<Image>,
    /// Size limits
    pub size_limits: SizeLimits,
    /// Aspect ratio lock
    pub aspect_ratio: Option<(u32, u32)>,
    /// Swap interval set while this window's context was current
    pub swap_interval: Option<u32>,
    /// Number of buffer swaps
    pub swaps: u64,
}

impl HeadlessWindow {
    fn has_context(&self) -> bool {
        !self.hints.contains(&WindowHint::ClientApi(ClientApi::NoApi))
    }
}

struct HeadlessMonitor {
    handle: MonitorHandle,
    name: String,
    modes: Vec<VideoMode>,
}

#[derive(Default)]
struct HeadlessState {
    initialized: bool,
    init_failure: Option<NativeError>,
    create_failure: Option<NativeError>,
    reuse_handles: bool,

    init_hints: Vec<InitHint>,
    window_hints: Vec<WindowHint>,

    windows: BTreeMap<NativeHandle, HeadlessWindow>,
    recycled: Vec<NativeHandle>,
    next_handle: u64,
    current: Option<NativeHandle>,

    queue: VecDeque<(NativeHandle, NativeEvent)>,
    wakeups: u32,

    monitors: Vec<HeadlessMonitor>,
    next_monitor: u64,

    last_error: Option<NativeError>,
    calls: Vec<HeadlessCall>,
}

impl HeadlessState {
    fn new() -> Self {
        let mut state = Self { next_handle: 0x1000, next_monitor: 1, ..Self::default() };
        state.add_monitor(
            "Headless-1",
            vec![
                VideoMode { width: 1280, height: 720, red_bits: 8, green_bits: 8, blue_bits: 8, refresh_rate: 60 },
                VideoMode { width: 1920, height: 1080, red_bits: 8, green_bits: 8, blue_bits: 8, refresh_rate: 60 },
            ],
        );
        state
    }

    fn add_monitor(&mut self, name: &str, modes: Vec<VideoMode>) -> Option<MonitorHandle> {
        let handle = MonitorHandle::from_raw(self.next_monitor)?;
        self.next_monitor += 1;
        self.monitors.push(HeadlessMonitor { handle, name: name.to_string(), modes });
        Some(handle)
    }

    fn error(&mut self, code: ErrorCode, description: impl Into<String>) {
        let error = NativeError::new(code, description);
        log::debug!("headless native error {error}");
        self.last_error = Some(error);
    }

    fn allocate_handle(&mut self) -> Option<NativeHandle> {
        if self.reuse_handles {
            if let Some(handle) = self.recycled.pop() {
                return Some(handle);
            }
        }
        let handle = NativeHandle::from_raw(self.next_handle)?;
        self.next_handle += 1;
        Some(handle)
    }

    fn window_mut(&mut self, handle: NativeHandle) -> Option<&mut HeadlessWindow> {
        if !self.windows.contains_key(&handle) {
            self.error(ErrorCode::PlatformError, format!("{handle} is not a live window"));
        }
        self.windows.get_mut(&handle)
    }

    fn monitor(&self, handle: MonitorHandle) -> Option<&HeadlessMonitor> {
        self.monitors.iter().find(|monitor| monitor.handle == handle)
    }

    /// Pending events the native layer would actually deliver
    fn drain(&mut self) -> EventBatch {
        let queue = std::mem::take(&mut self.queue);
        queue
            .into_iter()
            .filter(|(handle, event)| {
                let delivered = self
                    .windows
                    .get(handle)
                    .is_some_and(|window| window.installed.contains(event.kind().mask()));
                if !delivered {
                    log::trace!("headless: discarding {:?} for {handle}", event.kind());
                }
                delivered
            })
            .collect()
    }
}

/// In-memory [`WindowBackend`]
pub struct HeadlessBackend {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessBackend {
    /// Backend with one default monitor and no windows
    pub fn new() -> Self {
        Self { state: Rc::new(RefCell::new(HeadlessState::new())) }
    }

    /// View onto this backend's state
    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe { state: Rc::clone(&self.state) }
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowBackend for HeadlessBackend {
    fn init(&mut self) -> Result<(), NativeError> {
        let mut state = self.state.borrow_mut();
        if let Some(error) = state.init_failure.clone() {
            state.last_error = Some(error.clone());
            return Err(error);
        }
        state.initialized = true;
        state.calls.push(HeadlessCall::Init);
        Ok(())
    }

    fn terminate(&mut self) {
        let mut state = self.state.borrow_mut();
        let leftover: Vec<_> = state.windows.keys().copied().collect();
        for handle in leftover {
            log::warn!("headless: terminate destroys live {handle}");
            state.windows.remove(&handle);
            state.calls.push(HeadlessCall::Destroy(handle));
        }
        state.current = None;
        state.queue.clear();
        state.initialized = false;
        state.calls.push(HeadlessCall::Terminate);
    }

    fn init_hint(&mut self, hint: &InitHint) {
        self.state.borrow_mut().init_hints.push(*hint);
    }

    fn default_window_hints(&mut self) {
        self.state.borrow_mut().window_hints.clear();
    }

    fn window_hint(&mut self, hint: &WindowHint) {
        self.state.borrow_mut().window_hints.push(*hint);
    }

    fn create_window(&mut self, request: &CreateRequest<'_>) -> Option<NativeHandle> {
        let mut state = self.state.borrow_mut();
        if !state.initialized {
            state.error(ErrorCode::NotInitialized, "library not initialized");
            return None;
        }
        if let Some(error) = state.create_failure.take() {
            state.last_error = Some(error);
            return None;
        }
        if request.width == 0 || request.height == 0 {
            state.error(ErrorCode::InvalidValue, format!("invalid size {}x{}", request.width, request.height));
            return None;
        }
        if let Some(share) = request.share {
            if !state.windows.contains_key(&share) {
                state.error(ErrorCode::PlatformError, format!("share target {share} is not a live window"));
                return None;
            }
        }
        if let Some(monitor) = request.monitor {
            if state.monitor(monitor).is_none() {
                state.error(ErrorCode::InvalidValue, "unknown monitor");
                return None;
            }
        }

        let handle = state.allocate_handle()?;
        let window = HeadlessWindow {
            title: request.title.to_string(),
            pos: (0, 0),
            size: (request.width, request.height),
            opacity: 1.0,
            should_close: false,
            user_slot: None,
            installed: EventMask::empty(),
            hints: state.window_hints.clone(),
            monitor: request.monitor,
            share: request.share,
            icon: Vec::new(),
            size_limits: SizeLimits::default(),
            aspect_ratio: None,
            swap_interval: None,
            swaps: 0,
        };
        state.windows.insert(handle, window);
        state.calls.push(HeadlessCall::Create(handle));
        Some(handle)
    }

    fn destroy_window(&mut self, handle: NativeHandle) {
        let mut state = self.state.borrow_mut();
        if state.windows.remove(&handle).is_none() {
            state.error(ErrorCode::PlatformError, format!("destroying dead {handle}"));
            return;
        }
        if state.current == Some(handle) {
            state.current = None;
        }
        if state.reuse_handles {
            state.recycled.push(handle);
        }
        state.calls.push(HeadlessCall::Destroy(handle));
    }

    fn install_callback(&mut self, handle: NativeHandle, kind: EventKind) {
        if let Some(window) = self.state.borrow_mut().window_mut(handle) {
            window.installed |= kind.mask();
        }
    }

    fn set_user_slot(&mut self, handle: NativeHandle, slot: Option<UserSlot>) {
        let mut state = self.state.borrow_mut();
        if let Some(window) = state.window_mut(handle) {
            window.user_slot = slot;
            state.calls.push(HeadlessCall::SetUserSlot(handle, slot));
        }
    }

    fn user_slot(&self, handle: NativeHandle) -> Option<UserSlot> {
        self.state.borrow().windows.get(&handle).and_then(|window| window.user_slot)
    }

    fn should_close(&self, handle: NativeHandle) -> bool {
        self.state.borrow().windows.get(&handle).is_some_and(|window| window.should_close)
    }

    fn set_should_close(&mut self, handle: NativeHandle, value: bool) {
        if let Some(window) = self.state.borrow_mut().window_mut(handle) {
            window.should_close = value;
        }
    }

    fn title(&self, handle: NativeHandle) -> String {
        self.state.borrow().windows.get(&handle).map(|window| window.title.clone()).unwrap_or_default()
    }

    fn set_title(&mut self, handle: NativeHandle, title: &str) {
        if let Some(window) = self.state.borrow_mut().window_mut(handle) {
            window.title = title.to_string();
        }
    }

    fn set_icon(&mut self, handle: NativeHandle, images: &[Image]) {
        if let Some(window) = self.state.borrow_mut().window_mut(handle) {
            window.icon = images.to_vec();
        }
    }

    fn pos(&self, handle: NativeHandle) -> (i32, i32) {
        self.state.borrow().windows.get(&handle).map(|window| window.pos).unwrap_or_default()
    }

    fn set_pos(&mut self, handle: NativeHandle, x: i32, y: i32) {
        let mut state = self.state.borrow_mut();
        if let Some(window) = state.window_mut(handle) {
            window.pos = (x, y);
            state.queue.push_back((handle, NativeEvent::Pos { x, y }));
        }
    }

    fn size(&self, handle: NativeHandle) -> (u32, u32) {
        self.state.borrow().windows.get(&handle).map(|window| window.size).unwrap_or_default()
    }

    fn set_size(&mut self, handle: NativeHandle, width: u32, height: u32) {
        let mut state = self.state.borrow_mut();
        let Some(window) = state.window_mut(handle) else { return };

        let SizeLimits { min, max } = window.size_limits;
        let (min_w, min_h) = min.unwrap_or((0, 0));
        let (max_w, max_h) = max.unwrap_or((u32::MAX, u32::MAX));
        let size = (width.clamp(min_w, max_w.max(min_w)), height.clamp(min_h, max_h.max(min_h)));
        window.size = size;

        let (width, height) = (i32::try_from(size.0).unwrap_or(i32::MAX), i32::try_from(size.1).unwrap_or(i32::MAX));
        state.queue.push_back((handle, NativeEvent::Size { width, height }));
        state.queue.push_back((handle, NativeEvent::FramebufferSize { width, height }));
    }

    fn framebuffer_size(&self, handle: NativeHandle) -> (u32, u32) {
        self.size(handle)
    }

    fn set_size_limits(&mut self, handle: NativeHandle, limits: SizeLimits) {
        if let Some(window) = self.state.borrow_mut().window_mut(handle) {
            window.size_limits = limits;
        }
    }

    fn set_aspect_ratio(&mut self, handle: NativeHandle, ratio: Option<(u32, u32)>) {
        let mut state = self.state.borrow_mut();
        if matches!(ratio, Some((0, _) | (_, 0))) {
            state.error(ErrorCode::InvalidValue, "aspect ratio terms must be positive");
            return;
        }
        if let Some(window) = state.window_mut(handle) {
            window.aspect_ratio = ratio;
        }
    }

    fn opacity(&self, handle: NativeHandle) -> f32 {
        self.state.borrow().windows.get(&handle).map_or(1.0, |window| window.opacity)
    }

    fn set_opacity(&mut self, handle: NativeHandle, opacity: f32) {
        let mut state = self.state.borrow_mut();
        if !(0.0..=1.0).contains(&opacity) {
            state.error(ErrorCode::InvalidValue, format!("opacity {opacity} outside [0, 1]"));
            return;
        }
        if let Some(window) = state.window_mut(handle) {
            window.opacity = opacity;
        }
    }

    fn make_context_current(&mut self, handle: Option<NativeHandle>) -> bool {
        let mut state = self.state.borrow_mut();
        if let Some(handle) = handle {
            let Some(window) = state.window_mut(handle) else { return false };
            if !window.has_context() {
                state.error(ErrorCode::NoWindowContext, format!("{handle} has no graphics context"));
                return false;
            }
        }
        state.current = handle;
        state.calls.push(HeadlessCall::MakeCurrent(handle));
        true
    }

    fn swap_buffers(&mut self, handle: NativeHandle) {
        if let Some(window) = self.state.borrow_mut().window_mut(handle) {
            window.swaps += 1;
        }
    }

    fn swap_interval(&mut self, interval: u32) {
        let mut state = self.state.borrow_mut();
        let Some(current) = state.current else {
            state.error(ErrorCode::NoCurrentContext, "swap interval without a current context");
            return;
        };
        if let Some(window) = state.windows.get_mut(&current) {
            window.swap_interval = Some(interval);
        }
        state.calls.push(HeadlessCall::SwapInterval(interval));
    }

    fn poll_events(&mut self) -> EventBatch {
        self.state.borrow_mut().drain()
    }

    fn wait_events(&mut self) -> EventBatch {
        self.poll_events()
    }

    fn wait_events_timeout(&mut self, timeout: f64) -> EventBatch {
        if !timeout.is_finite() || timeout < 0.0 {
            self.state.borrow_mut().error(ErrorCode::InvalidValue, format!("invalid timeout {timeout}"));
            return EventBatch::new();
        }
        self.poll_events()
    }

    fn post_empty_event(&mut self) {
        self.state.borrow_mut().wakeups += 1;
    }

    fn monitors(&mut self) -> Vec<MonitorHandle> {
        self.state.borrow().monitors.iter().map(|monitor| monitor.handle).collect()
    }

    fn primary_monitor(&mut self) -> Option<MonitorHandle> {
        self.state.borrow().monitors.first().map(|monitor| monitor.handle)
    }

    fn monitor_name(&mut self, monitor: MonitorHandle) -> Option<String> {
        self.state.borrow().monitor(monitor).map(|monitor| monitor.name.clone())
    }

    fn video_modes(&mut self, monitor: MonitorHandle) -> Vec<VideoMode> {
        self.state.borrow().monitor(monitor).map(|monitor| monitor.modes.clone()).unwrap_or_default()
    }

    fn current_video_mode(&mut self, monitor: MonitorHandle) -> Option<VideoMode> {
        self.state.borrow().monitor(monitor).and_then(|monitor| monitor.modes.last().copied())
    }

    fn last_error(&mut self) -> Option<NativeError> {
        self.state.borrow_mut().last_error.take()
    }

    fn proc_address(&mut self, name: &str) -> ProcAddress {
        let mut state = self.state.borrow_mut();
        if state.current.is_none() {
            state.error(ErrorCode::NoCurrentContext, format!("resolving {name} without a current context"));
            return std::ptr::null();
        }
        if DEFAULT_PROCS.contains(&name) {
            std::ptr::addr_of!(ENTRY_POINT).cast()
        } else {
            std::ptr::null()
        }
    }

    fn extension_supported(&self, name: &str) -> bool {
        self.state.borrow().current.is_some() && DEFAULT_EXTENSIONS.contains(&name)
    }
}

/// Outside view onto a [`HeadlessBackend`]
///
/// Plays the platform's part: injects events, raises close requests and
/// reports what the session did to the native layer.
#[derive(Clone)]
pub struct HeadlessProbe {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessProbe {
    /// Queue a native event for the next poll
    ///
    /// Events for handles that are dead by then, or whose callback isn't
    /// installed, are discarded like a native library would.
    pub fn push_event(&self, handle: NativeHandle, event: NativeEvent) {
        self.state.borrow_mut().queue.push_back((handle, event));
    }

    /// Simulate the user closing a window: raise its flag and queue `Close`
    pub fn request_close(&self, handle: NativeHandle) {
        let mut state = self.state.borrow_mut();
        if let Some(window) = state.windows.get_mut(&handle) {
            window.should_close = true;
            state.queue.push_back((handle, NativeEvent::Close));
        }
    }

    /// Snapshot of a live native window
    pub fn window(&self, handle: NativeHandle) -> Option<HeadlessWindow> {
        self.state.borrow().windows.get(&handle).cloned()
    }

    /// Whether `handle` is a live native window
    pub fn is_alive(&self, handle: NativeHandle) -> bool {
        self.state.borrow().windows.contains_key(&handle)
    }

    /// Every live native window, ascending
    pub fn live_handles(&self) -> Vec<NativeHandle> {
        self.state.borrow().windows.keys().copied().collect()
    }

    /// Whether the library is initialized
    pub fn is_initialized(&self) -> bool {
        self.state.borrow().initialized
    }

    /// Context current on the session thread
    pub fn current_context(&self) -> Option<NativeHandle> {
        self.state.borrow().current
    }

    /// Init hints received so far
    pub fn init_hints(&self) -> Vec<InitHint> {
        self.state.borrow().init_hints.clone()
    }

    /// Number of [`WindowBackend::post_empty_event`] calls
    pub fn wakeups(&self) -> u32 {
        self.state.borrow().wakeups
    }

    /// Lifecycle calls in order
    pub fn calls(&self) -> Vec<HeadlessCall> {
        self.state.borrow().calls.clone()
    }

    /// Make every future `init` fail with `error`
    pub fn fail_init(&self, error: NativeError) {
        self.state.borrow_mut().init_failure = Some(error);
    }

    /// Make the next window creation fail with `error`
    pub fn fail_next_create(&self, error: NativeError) {
        self.state.borrow_mut().create_failure = Some(error);
    }

    /// Hand out destroyed handles again, like a native allocator reusing addresses
    pub fn reuse_handles(&self, reuse: bool) {
        self.state.borrow_mut().reuse_handles = reuse;
    }

    /// Connect another monitor, the last mode is its current one
    pub fn add_monitor(&self, name: &str, modes: Vec<VideoMode>) -> Option<MonitorHandle> {
        self.state.borrow_mut().add_monitor(name, modes)
    }
}
