//! Native windowing capability layer
//!
//! The session core never talks to a windowing library directly. Everything it
//! needs from the platform goes through the [`WindowBackend`] trait defined here,
//! which keeps the registry, dispatch and main-loop logic testable without a
//! display server.
//!
//! # Backends
//!
//! - [`HeadlessBackend`]: in-memory native layer. Windows are plain records,
//!   events are injected through a [`HeadlessProbe`]. Used by the test-suite and
//!   by tools that must run without a display.
//! - `GlfwBackend` (feature `glfw`): the real native layer on top of the `glfw`
//!   crate.
//!
//! # Event delivery
//!
//! Native libraries deliver events through callbacks fired from inside their
//! poll call. Backends drain those callbacks into a list of
//! `(NativeHandle, NativeEvent)` pairs and hand the list back from
//! [`WindowBackend::poll_events`]; the session dispatches every entry before its
//! own poll step returns. Handlers therefore observe the same synchronous
//! ordering the native library produced, while the backend itself is never
//! borrowed during a handler call.

mod headless;
#[cfg(feature = "glfw")]
mod glfw_backend;

pub use headless::{HeadlessBackend, HeadlessCall, HeadlessProbe, HeadlessWindow};
#[cfg(feature = "glfw")]
pub use glfw_backend::GlfwBackend;

use std::fmt;
use std::num::NonZeroU64;

use crate::error::NativeError;
use crate::event::{EventKind, NativeEvent};
use crate::hints::{InitHint, WindowHint};
use crate::monitor::{MonitorHandle, VideoMode};

/// Opaque identity of a native window
///
/// Issued by the backend when a window is created and unique among live windows.
/// Once the window is destroyed the value is dead and must not be passed back to
/// the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(NonZeroU64);

impl NativeHandle {
    /// Wrap a raw backend value, `None` for zero
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// Raw backend value
    pub fn as_raw(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "native#{}", self.0)
    }
}

/// Value stored in a native window's user-data slot
///
/// The session writes the key of the window's callback record here so the
/// record can be recovered from the handle alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserSlot(pub u64);

/// Resolved graphics API entry point, null when unresolved
pub type ProcAddress = *const std::ffi::c_void;

/// Window minimum and maximum content size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeLimits {
    /// Smallest allowed `(width, height)`, `None` for no limit
    pub min: Option<(u32, u32)>,
    /// Largest allowed `(width, height)`, `None` for no limit
    pub max: Option<(u32, u32)>,
}

/// RGBA8 image, used for window icons
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Tightly packed RGBA8 pixels, row major, top row first
    pub pixels: Vec<u8>,
}

impl Image {
    /// Create an image from raw RGBA8 pixels
    ///
    /// Returns `None` when the buffer length doesn't match the dimensions.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        (pixels.len() == expected).then_some(Self { width, height, pixels })
    }

    /// Decode an in-memory PNG into an icon image
    pub fn from_png(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let decoded = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)?.to_rgba8();
        let (width, height) = decoded.dimensions();
        Ok(Self { width, height, pixels: decoded.into_raw() })
    }
}

/// Parameters of a single native window creation
#[derive(Debug, Clone, Copy)]
pub struct CreateRequest<'a> {
    /// Requested content width
    pub width: u32,
    /// Requested content height
    pub height: u32,
    /// Initial title
    pub title: &'a str,
    /// Monitor for full screen mode, `None` for windowed
    pub monitor: Option<MonitorHandle>,
    /// Window whose graphics context objects are shared with the new one
    pub share: Option<NativeHandle>,
}

/// Events drained from the native layer during one poll
pub type EventBatch = Vec<(NativeHandle, NativeEvent)>;

/// Capability interface of the native windowing library
///
/// One backend instance represents the whole native library for the lifetime of
/// a session: global init/terminate, hint state, every native window, monitors
/// and the graphics entry point loader.
///
/// # Error policy
/// Per-window operations never fail observably. Failures are kept by the backend
/// and reported through [`WindowBackend::last_error`], mirroring how native
/// windowing libraries expose errors.
///
/// # Threading
/// Backends are driven from a single thread. Nothing here is required to be
/// `Send`, and the session never shares a backend across threads.
pub trait WindowBackend {
    /// Global initialization
    fn init(&mut self) -> Result<(), NativeError>;

    /// Global shutdown, destroys anything still alive
    fn terminate(&mut self);

    /// Apply one initialization hint, only meaningful before [`init`](Self::init)
    fn init_hint(&mut self, hint: &InitHint);

    /// Reset every window hint to its library default
    fn default_window_hints(&mut self);

    /// Apply one window hint for subsequently created windows
    fn window_hint(&mut self, hint: &WindowHint);

    /// Create a native window using the current hint state
    fn create_window(&mut self, request: &CreateRequest<'_>) -> Option<NativeHandle>;

    /// Destroy a native window, the handle is dead afterwards
    fn destroy_window(&mut self, handle: NativeHandle);

    /// Route native events of `kind` for `handle` to the session dispatcher
    fn install_callback(&mut self, handle: NativeHandle, kind: EventKind);

    /// Write the user-data slot of a native window
    fn set_user_slot(&mut self, handle: NativeHandle, slot: Option<UserSlot>);

    /// Read the user-data slot of a native window
    fn user_slot(&self, handle: NativeHandle) -> Option<UserSlot>;

    /// Native "close requested" flag
    fn should_close(&self, handle: NativeHandle) -> bool;

    /// Set or clear the native "close requested" flag
    fn set_should_close(&mut self, handle: NativeHandle, value: bool);

    /// Current title
    fn title(&self, handle: NativeHandle) -> String;

    /// Change the title
    fn set_title(&mut self, handle: NativeHandle, title: &str);

    /// Replace the window icon, an empty slice restores the default icon
    fn set_icon(&mut self, handle: NativeHandle, images: &[Image]);

    /// Position of the content area's top-left corner in screen coordinates
    fn pos(&self, handle: NativeHandle) -> (i32, i32);

    /// Move the content area's top-left corner
    fn set_pos(&mut self, handle: NativeHandle, x: i32, y: i32);

    /// Content area size in screen coordinates
    fn size(&self, handle: NativeHandle) -> (u32, u32);

    /// Resize the content area
    fn set_size(&mut self, handle: NativeHandle, width: u32, height: u32);

    /// Framebuffer size in pixels
    fn framebuffer_size(&self, handle: NativeHandle) -> (u32, u32);

    /// Constrain the content area size
    fn set_size_limits(&mut self, handle: NativeHandle, limits: SizeLimits);

    /// Lock the aspect ratio, `None` removes the constraint
    fn set_aspect_ratio(&mut self, handle: NativeHandle, ratio: Option<(u32, u32)>);

    /// Whole-window opacity in `[0, 1]`
    fn opacity(&self, handle: NativeHandle) -> f32;

    /// Set whole-window opacity
    fn set_opacity(&mut self, handle: NativeHandle, opacity: f32);

    /// Bind a window's context to the calling thread, `None` detaches
    ///
    /// Returns `false` when the bind failed, in which case the previously
    /// current context stays current and the cause is left for `last_error`.
    fn make_context_current(&mut self, handle: Option<NativeHandle>) -> bool;

    /// Present the back buffer
    fn swap_buffers(&mut self, handle: NativeHandle);

    /// Swap interval of the current context
    fn swap_interval(&mut self, interval: u32);

    /// Process pending events without blocking
    fn poll_events(&mut self) -> EventBatch;

    /// Block until at least one event is available, then process pending events
    fn wait_events(&mut self) -> EventBatch;

    /// Like [`wait_events`](Self::wait_events) with an upper bound in seconds
    fn wait_events_timeout(&mut self, timeout: f64) -> EventBatch;

    /// Wake up a thread blocked in one of the wait calls
    fn post_empty_event(&mut self);

    /// Connected monitors, primary first
    fn monitors(&mut self) -> Vec<MonitorHandle>;

    /// Primary monitor
    fn primary_monitor(&mut self) -> Option<MonitorHandle>;

    /// Human readable monitor name
    fn monitor_name(&mut self, monitor: MonitorHandle) -> Option<String>;

    /// Every video mode a monitor supports
    fn video_modes(&mut self, monitor: MonitorHandle) -> Vec<VideoMode>;

    /// Video mode a monitor currently uses
    fn current_video_mode(&mut self, monitor: MonitorHandle) -> Option<VideoMode>;

    /// Take the last recorded native error, clearing it
    fn last_error(&mut self) -> Option<NativeError>;

    /// Resolve a graphics API entry point against the current context
    fn proc_address(&mut self, name: &str) -> ProcAddress;

    /// Whether the current context supports a named API extension
    fn extension_supported(&self, name: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_handle_rejects_zero() {
        assert!(NativeHandle::from_raw(0).is_none());
        assert_eq!(NativeHandle::from_raw(7).map(NativeHandle::as_raw), Some(7));
    }

    #[test]
    fn test_image_size_check() {
        assert!(Image::from_rgba(2, 2, vec![0; 16]).is_some());
        assert!(Image::from_rgba(2, 2, vec![0; 15]).is_none());
    }

    /// 2x1 RGBA: opaque red, then half-transparent blue
    const TWO_PIXEL_PNG: [u8; 71] = [
        0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52, 0x00, 0x00,
        0x00, 0x02, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0xf4, 0x22, 0x7f, 0x8a, 0x00, 0x00, 0x00,
        0x0e, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0xf8, 0xcf, 0xc0, 0x00, 0x42, 0x0d, 0x00, 0x0f, 0x7a, 0x03,
        0x7e, 0x77, 0xe9, 0x7f, 0x97, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
    ];

    #[test]
    fn test_png_icon_decodes_to_rgba() {
        let image = Image::from_png(&TWO_PIXEL_PNG).unwrap();
        assert_eq!((image.width, image.height), (2, 1));
        assert_eq!(image.pixels, vec![255, 0, 0, 255, 0, 0, 255, 128]);
    }

    #[test]
    fn test_png_decode_rejects_garbage() {
        assert!(Image::from_png(b"not a png").is_err());
        assert!(Image::from_png(&TWO_PIXEL_PNG[..40]).is_err());
    }
}
