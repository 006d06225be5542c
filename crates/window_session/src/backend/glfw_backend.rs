//! GLFW native layer
//!
//! Wraps the `glfw` crate. Every native window keeps its event receiver; a poll
//! runs GLFW's own event processing and then flushes each receiver, tagging the
//! messages with the window's handle. Events therefore arrive grouped per
//! window within one poll.
//!
//! Monitors are identified by their position in GLFW's connected monitor list
//! (primary first), which is only stable until a monitor is plugged or unplugged.

use std::cell::RefCell;
use std::collections::HashMap;

use glfw::Context;

use super::{CreateRequest, EventBatch, Image, NativeHandle, ProcAddress, SizeLimits, UserSlot, WindowBackend};
use crate::error::{ErrorCode, NativeError};
use crate::event::{EventKind, EventMask, NativeEvent};
use crate::hints::{
    ClientApi, ContextCreationApi, ContextRobustness, InitHint, OpenGlProfile, WindowHint,
};
use crate::monitor::{MonitorHandle, VideoMode};

thread_local! {
    static LAST_ERROR: RefCell<Option<NativeError>> = const { RefCell::new(None) };
}

/// GLFW error callback, keeps the most recent error for `last_error`
fn record_error(error: glfw::Error, description: String) {
    log::debug!("GLFW error {error:?}: {description}");
    let error = NativeError::new(ErrorCode::from_raw(error as i32), description);
    LAST_ERROR.with(|last| *last.borrow_mut() = Some(error));
}

struct GlfwWindow {
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
    title: String,
    user_slot: Option<UserSlot>,
    installed: EventMask,
}

/// [`WindowBackend`] on top of GLFW
pub struct GlfwBackend {
    glfw: Option<glfw::Glfw>,
    init_hints: Vec<InitHint>,
    windows: HashMap<NativeHandle, GlfwWindow>,
}

impl GlfwBackend {
    /// Backend that initializes GLFW on [`WindowBackend::init`]
    pub fn new() -> Self {
        Self { glfw: None, init_hints: Vec::new(), windows: HashMap::new() }
    }

    fn window(&self, handle: NativeHandle) -> Option<&GlfwWindow> {
        self.windows.get(&handle)
    }

    fn window_mut(&mut self, handle: NativeHandle) -> Option<&mut GlfwWindow> {
        self.windows.get_mut(&handle)
    }

    fn drain(&mut self) -> EventBatch {
        let mut batch = EventBatch::new();
        for (&handle, entry) in &self.windows {
            for (_, event) in glfw::flush_messages(&entry.events) {
                if let Some(event) = native_event(event) {
                    if entry.installed.contains(event.kind().mask()) {
                        batch.push((handle, event));
                    }
                }
            }
        }
        batch
    }
}

impl Default for GlfwBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_init_hint(hint: InitHint) {
    match hint {
        InitHint::JoystickHatButtons(value) => glfw::init_hint(glfw::InitHint::JoystickHatButtons(value)),
        InitHint::CocoaChdirResources(value) => glfw::init_hint(glfw::InitHint::CocoaChdirResources(value)),
        InitHint::CocoaMenubar(value) => glfw::init_hint(glfw::InitHint::CocoaMenubar(value)),
        InitHint::AnglePlatformType(_) | InitHint::Platform(_) | InitHint::WaylandLibdecor(_) => {
            log::warn!("GLFW binding doesn't expose init hint {hint:?}, ignoring it");
        }
    }
}

fn glfw_window_hint(hint: WindowHint) -> glfw::WindowHint {
    match hint {
        WindowHint::Samples(samples) => glfw::WindowHint::Samples(Some(samples.count()).filter(|&n| n > 0)),
        WindowHint::DoubleBuffer(value) => glfw::WindowHint::DoubleBuffer(value),
        WindowHint::Resizable(value) => glfw::WindowHint::Resizable(value),
        WindowHint::Visible(value) => glfw::WindowHint::Visible(value),
        WindowHint::Decorated(value) => glfw::WindowHint::Decorated(value),
        WindowHint::Focused(value) => glfw::WindowHint::Focused(value),
        WindowHint::Floating(value) => glfw::WindowHint::Floating(value),
        WindowHint::Maximized(value) => glfw::WindowHint::Maximized(value),
        WindowHint::TransparentFramebuffer(value) => glfw::WindowHint::TransparentFramebuffer(value),
        WindowHint::ScaleToMonitor(value) => glfw::WindowHint::ScaleToMonitor(value),
        WindowHint::ClientApi(api) => glfw::WindowHint::ClientApi(match api {
            ClientApi::NoApi => glfw::ClientApiHint::NoApi,
            ClientApi::OpenGl => glfw::ClientApiHint::OpenGl,
            ClientApi::OpenGlEs => glfw::ClientApiHint::OpenGlEs,
        }),
        WindowHint::ContextCreationApi(api) => glfw::WindowHint::ContextCreationApi(match api {
            ContextCreationApi::Native => glfw::ContextCreationApi::Native,
            ContextCreationApi::Egl => glfw::ContextCreationApi::Egl,
            ContextCreationApi::OsMesa => glfw::ContextCreationApi::OsMesa,
        }),
        WindowHint::ContextVersion { major, minor } => {
            glfw::WindowHint::ContextVersion(u32::from(major), u32::from(minor))
        }
        WindowHint::OpenGlProfile(profile) => glfw::WindowHint::OpenGlProfile(match profile {
            OpenGlProfile::Any => glfw::OpenGlProfileHint::Any,
            OpenGlProfile::Core => glfw::OpenGlProfileHint::Core,
            OpenGlProfile::Compat => glfw::OpenGlProfileHint::Compat,
        }),
        WindowHint::ContextRobustness(robustness) => glfw::WindowHint::ContextRobustness(match robustness {
            ContextRobustness::NoRobustness => glfw::ContextRobustnessHint::NoRobustness,
            ContextRobustness::NoResetNotification => glfw::ContextRobustnessHint::NoResetNotification,
            ContextRobustness::LoseContextOnReset => glfw::ContextRobustnessHint::LoseContextOnReset,
        }),
        WindowHint::OpenGlForwardCompat(value) => glfw::WindowHint::OpenGlForwardCompat(value),
        WindowHint::ContextDebug(value) => glfw::WindowHint::OpenGlDebugContext(value),
        WindowHint::ContextNoError(value) => glfw::WindowHint::ContextNoError(value),
        WindowHint::RefreshRate(rate) => glfw::WindowHint::RefreshRate(rate),
    }
}

fn native_event(event: glfw::WindowEvent) -> Option<NativeEvent> {
    use glfw::WindowEvent as E;

    Some(match event {
        E::Pos(x, y) => NativeEvent::Pos { x, y },
        E::Size(width, height) => NativeEvent::Size { width, height },
        E::Close => NativeEvent::Close,
        E::Refresh => NativeEvent::Refresh,
        E::Focus(focused) => NativeEvent::Focus { focused: i32::from(focused) },
        E::Iconify(iconified) => NativeEvent::Iconify { iconified: i32::from(iconified) },
        E::Maximize(maximized) => NativeEvent::Maximize { maximized: i32::from(maximized) },
        E::FramebufferSize(width, height) => NativeEvent::FramebufferSize { width, height },
        E::ContentScale(x, y) => NativeEvent::ContentScale { x, y },
        E::Key(key, scancode, action, mods) => NativeEvent::Key {
            key: key as i32,
            scancode,
            action: action as i32,
            mods: mods.bits(),
        },
        E::Char(c) => NativeEvent::Char { codepoint: u32::from(c) },
        E::CharModifiers(c, mods) => NativeEvent::CharMods { codepoint: u32::from(c), mods: mods.bits() },
        E::MouseButton(button, action, mods) => NativeEvent::MouseButton {
            button: button as i32,
            action: action as i32,
            mods: mods.bits(),
        },
        E::CursorPos(x, y) => NativeEvent::CursorPos { x, y },
        E::CursorEnter(entered) => NativeEvent::CursorEnter { entered: i32::from(entered) },
        E::Scroll(x, y) => NativeEvent::Scroll { x, y },
        E::FileDrop(paths) => NativeEvent::Drop { paths },
        _ => return None,
    })
}

fn set_polling(window: &mut glfw::PWindow, kind: EventKind) {
    match kind {
        EventKind::Pos => window.set_pos_polling(true),
        EventKind::Size => window.set_size_polling(true),
        EventKind::Close => window.set_close_polling(true),
        EventKind::Refresh => window.set_refresh_polling(true),
        EventKind::Focus => window.set_focus_polling(true),
        EventKind::Iconify => window.set_iconify_polling(true),
        EventKind::Maximize => window.set_maximize_polling(true),
        EventKind::FramebufferSize => window.set_framebuffer_size_polling(true),
        EventKind::ContentScale => window.set_content_scale_polling(true),
        EventKind::Key => window.set_key_polling(true),
        EventKind::Char => window.set_char_polling(true),
        EventKind::CharMods => window.set_char_mods_polling(true),
        EventKind::MouseButton => window.set_mouse_button_polling(true),
        EventKind::CursorPos => window.set_cursor_pos_polling(true),
        EventKind::CursorEnter => window.set_cursor_enter_polling(true),
        EventKind::Scroll => window.set_scroll_polling(true),
        EventKind::Drop => window.set_drag_and_drop_polling(true),
    }
}

fn video_mode(mode: &glfw::VidMode) -> VideoMode {
    VideoMode {
        width: mode.width,
        height: mode.height,
        red_bits: mode.red_bits,
        green_bits: mode.green_bits,
        blue_bits: mode.blue_bits,
        refresh_rate: mode.refresh_rate,
    }
}

fn monitor_index(monitor: MonitorHandle) -> usize {
    usize::try_from(monitor.as_raw() - 1).unwrap_or(usize::MAX)
}

fn positive(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn non_negative((width, height): (i32, i32)) -> (u32, u32) {
    (u32::try_from(width).unwrap_or(0), u32::try_from(height).unwrap_or(0))
}

impl WindowBackend for GlfwBackend {
    fn init(&mut self) -> Result<(), NativeError> {
        for hint in &self.init_hints {
            apply_init_hint(*hint);
        }
        match glfw::init(record_error) {
            Ok(glfw) => {
                log::info!("GLFW {} initialized", glfw::get_version_string());
                self.glfw = Some(glfw);
                Ok(())
            }
            Err(error) => Err(self
                .last_error()
                .unwrap_or_else(|| NativeError::new(ErrorCode::PlatformError, format!("{error:?}")))),
        }
    }

    fn terminate(&mut self) {
        self.windows.clear();
        // The binding terminates GLFW when its last handle is dropped
        self.glfw = None;
    }

    fn init_hint(&mut self, hint: &InitHint) {
        self.init_hints.push(*hint);
    }

    fn default_window_hints(&mut self) {
        if let Some(glfw) = self.glfw.as_mut() {
            glfw.default_window_hints();
        }
    }

    fn window_hint(&mut self, hint: &WindowHint) {
        if let Some(glfw) = self.glfw.as_mut() {
            glfw.window_hint(glfw_window_hint(*hint));
        }
    }

    fn create_window(&mut self, request: &CreateRequest<'_>) -> Option<NativeHandle> {
        let share = match request.share {
            Some(handle) => Some(&self.windows.get(&handle)?.window),
            None => None,
        };
        let glfw = self.glfw.as_mut()?;
        let (width, height, title) = (request.width, request.height, request.title);

        let created = glfw.with_connected_monitors(|glfw, monitors| {
            let mode = match request.monitor {
                Some(monitor) => glfw::WindowMode::FullScreen(monitors.get(monitor_index(monitor))?),
                None => glfw::WindowMode::Windowed,
            };
            match share {
                Some(share) => share.create_shared(width, height, title, mode),
                None => glfw.create_window(width, height, title, mode),
            }
        });
        let (window, events) = created?;

        let handle = NativeHandle::from_raw(window.window_ptr() as usize as u64)?;
        self.windows.insert(
            handle,
            GlfwWindow { window, events, title: title.to_string(), user_slot: None, installed: EventMask::empty() },
        );
        Some(handle)
    }

    fn destroy_window(&mut self, handle: NativeHandle) {
        // Dropping the PWindow destroys the native window
        self.windows.remove(&handle);
    }

    fn install_callback(&mut self, handle: NativeHandle, kind: EventKind) {
        if let Some(entry) = self.window_mut(handle) {
            set_polling(&mut entry.window, kind);
            entry.installed |= kind.mask();
        }
    }

    fn set_user_slot(&mut self, handle: NativeHandle, slot: Option<UserSlot>) {
        if let Some(entry) = self.window_mut(handle) {
            entry.user_slot = slot;
        }
    }

    fn user_slot(&self, handle: NativeHandle) -> Option<UserSlot> {
        self.window(handle).and_then(|entry| entry.user_slot)
    }

    fn should_close(&self, handle: NativeHandle) -> bool {
        self.window(handle).is_some_and(|entry| entry.window.should_close())
    }

    fn set_should_close(&mut self, handle: NativeHandle, value: bool) {
        if let Some(entry) = self.window_mut(handle) {
            entry.window.set_should_close(value);
        }
    }

    fn title(&self, handle: NativeHandle) -> String {
        self.window(handle).map(|entry| entry.title.clone()).unwrap_or_default()
    }

    fn set_title(&mut self, handle: NativeHandle, title: &str) {
        if let Some(entry) = self.window_mut(handle) {
            entry.window.set_title(title);
            entry.title = title.to_string();
        }
    }

    fn set_icon(&mut self, handle: NativeHandle, images: &[Image]) {
        let Some(entry) = self.window_mut(handle) else { return };
        let icons = images
            .iter()
            .map(|image| glfw::PixelImage {
                width: image.width,
                height: image.height,
                pixels: image
                    .pixels
                    .chunks_exact(4)
                    .map(|rgba| u32::from_ne_bytes([rgba[0], rgba[1], rgba[2], rgba[3]]))
                    .collect(),
            })
            .collect();
        entry.window.set_icon_from_pixels(icons);
    }

    fn pos(&self, handle: NativeHandle) -> (i32, i32) {
        self.window(handle).map(|entry| entry.window.get_pos()).unwrap_or_default()
    }

    fn set_pos(&mut self, handle: NativeHandle, x: i32, y: i32) {
        if let Some(entry) = self.window_mut(handle) {
            entry.window.set_pos(x, y);
        }
    }

    fn size(&self, handle: NativeHandle) -> (u32, u32) {
        self.window(handle).map(|entry| non_negative(entry.window.get_size())).unwrap_or_default()
    }

    fn set_size(&mut self, handle: NativeHandle, width: u32, height: u32) {
        if let Some(entry) = self.window_mut(handle) {
            entry.window.set_size(positive(width), positive(height));
        }
    }

    fn framebuffer_size(&self, handle: NativeHandle) -> (u32, u32) {
        self.window(handle)
            .map(|entry| non_negative(entry.window.get_framebuffer_size()))
            .unwrap_or_default()
    }

    fn set_size_limits(&mut self, handle: NativeHandle, limits: SizeLimits) {
        if let Some(entry) = self.window_mut(handle) {
            entry.window.set_size_limits(
                limits.min.map(|(width, _)| width),
                limits.min.map(|(_, height)| height),
                limits.max.map(|(width, _)| width),
                limits.max.map(|(_, height)| height),
            );
        }
    }

    fn set_aspect_ratio(&mut self, handle: NativeHandle, ratio: Option<(u32, u32)>) {
        if let Some(entry) = self.window_mut(handle) {
            // u32::MAX wraps to GLFW_DONT_CARE on the native side
            let (numerator, denominator) = ratio.unwrap_or((u32::MAX, u32::MAX));
            entry.window.set_aspect_ratio(numerator, denominator);
        }
    }

    fn opacity(&self, handle: NativeHandle) -> f32 {
        self.window(handle).map_or(1.0, |entry| entry.window.get_opacity())
    }

    fn set_opacity(&mut self, handle: NativeHandle, opacity: f32) {
        if let Some(entry) = self.window_mut(handle) {
            entry.window.set_opacity(opacity);
        }
    }

    fn make_context_current(&mut self, handle: Option<NativeHandle>) -> bool {
        let Some(handle) = handle else {
            glfw::make_context_current(None);
            return true;
        };
        match self.windows.get_mut(&handle) {
            Some(entry) => {
                entry.window.make_current();
                entry.window.is_current()
            }
            None => {
                let error = NativeError::new(ErrorCode::PlatformError, format!("{handle} is not a live window"));
                LAST_ERROR.with(|last| *last.borrow_mut() = Some(error));
                false
            }
        }
    }

    fn swap_buffers(&mut self, handle: NativeHandle) {
        if let Some(entry) = self.window_mut(handle) {
            entry.window.swap_buffers();
        }
    }

    fn swap_interval(&mut self, interval: u32) {
        if let Some(glfw) = self.glfw.as_mut() {
            let interval = if interval == 0 { glfw::SwapInterval::None } else { glfw::SwapInterval::Sync(interval) };
            glfw.set_swap_interval(interval);
        }
    }

    fn poll_events(&mut self) -> EventBatch {
        if let Some(glfw) = self.glfw.as_mut() {
            glfw.poll_events();
        }
        self.drain()
    }

    fn wait_events(&mut self) -> EventBatch {
        if let Some(glfw) = self.glfw.as_mut() {
            glfw.wait_events();
        }
        self.drain()
    }

    fn wait_events_timeout(&mut self, timeout: f64) -> EventBatch {
        if let Some(glfw) = self.glfw.as_mut() {
            glfw.wait_events_timeout(timeout);
        }
        self.drain()
    }

    fn post_empty_event(&mut self) {
        if let Some(glfw) = self.glfw.as_mut() {
            glfw.post_empty_event();
        }
    }

    fn monitors(&mut self) -> Vec<MonitorHandle> {
        let Some(glfw) = self.glfw.as_mut() else { return Vec::new() };
        glfw.with_connected_monitors(|_, monitors| {
            (1..=monitors.len() as u64).filter_map(MonitorHandle::from_raw).collect()
        })
    }

    fn primary_monitor(&mut self) -> Option<MonitorHandle> {
        let glfw = self.glfw.as_mut()?;
        let connected = glfw.with_primary_monitor(|_, monitor| monitor.is_some());
        connected.then(|| MonitorHandle::from_raw(1)).flatten()
    }

    fn monitor_name(&mut self, monitor: MonitorHandle) -> Option<String> {
        let glfw = self.glfw.as_mut()?;
        glfw.with_connected_monitors(|_, monitors| monitors.get(monitor_index(monitor))?.get_name())
    }

    fn video_modes(&mut self, monitor: MonitorHandle) -> Vec<VideoMode> {
        let Some(glfw) = self.glfw.as_mut() else { return Vec::new() };
        glfw.with_connected_monitors(|_, monitors| {
            monitors
                .get(monitor_index(monitor))
                .map(|monitor| monitor.get_video_modes().iter().map(video_mode).collect())
                .unwrap_or_default()
        })
    }

    fn current_video_mode(&mut self, monitor: MonitorHandle) -> Option<VideoMode> {
        let glfw = self.glfw.as_mut()?;
        glfw.with_connected_monitors(|_, monitors| {
            monitors.get(monitor_index(monitor))?.get_video_mode().as_ref().map(video_mode)
        })
    }

    fn last_error(&mut self) -> Option<NativeError> {
        LAST_ERROR.with(|last| last.borrow_mut().take())
    }

    fn proc_address(&mut self, name: &str) -> ProcAddress {
        match self.glfw.as_ref() {
            Some(glfw) => glfw.get_proc_address_raw(name).cast(),
            None => std::ptr::null(),
        }
    }

    fn extension_supported(&self, name: &str) -> bool {
        self.glfw.as_ref().is_some_and(|glfw| glfw.extension_supported(name))
    }
}
