//! Initialization and window creation hints
//!
//! Hints are tagged variants. Backends apply them with one exhaustive `match`
//! per target ([`WindowBackend::init_hint`] and [`WindowBackend::window_hint`]),
//! so adding a variant is a compile error until every backend handles it.
//!
//! [`WindowBackend::init_hint`]: crate::backend::WindowBackend::init_hint
//! [`WindowBackend::window_hint`]: crate::backend::WindowBackend::window_hint

use serde::{Deserialize, Serialize};

use crate::backend::WindowBackend;

/// Multisample count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum Samples {
    #[default]
    Off,
    X1,
    X2,
    X4,
    X8,
    X16,
}

impl Samples {
    /// Sample count the native layer expects
    pub fn count(self) -> u32 {
        match self {
            Self::Off => 0,
            Self::X1 => 1,
            Self::X2 => 2,
            Self::X4 => 4,
            Self::X8 => 8,
            Self::X16 => 16,
        }
    }
}

/// Graphics API the window context is created for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientApi {
    /// No context, for Vulkan or software presentation
    NoApi,
    /// Desktop OpenGL
    OpenGl,
    /// OpenGL ES
    OpenGlEs,
}

/// Context creation path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum ContextCreationApi {
    Native,
    Egl,
    OsMesa,
}

/// OpenGL profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum OpenGlProfile {
    Any,
    Core,
    Compat,
}

/// Context robustness strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum ContextRobustness {
    NoRobustness,
    NoResetNotification,
    LoseContextOnReset,
}

/// ANGLE rendering backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum AnglePlatformType {
    None,
    OpenGl,
    OpenGlEs,
    D3d9,
    D3d11,
    Vulkan,
    Metal,
}

/// Windowing platform selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum PlatformKind {
    Any,
    Win32,
    Cocoa,
    Wayland,
    X11,
    Null,
}

/// Hint applied once before global initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitHint {
    /// Report joystick hats as buttons too
    JoystickHatButtons(bool),
    /// ANGLE backend for OpenGL ES contexts
    AnglePlatformType(AnglePlatformType),
    /// Platform to initialize
    Platform(PlatformKind),
    /// macOS: change directory to the bundle resources
    CocoaChdirResources(bool),
    /// macOS: create a menu bar
    CocoaMenubar(bool),
    /// Wayland: use libdecor for decorations
    WaylandLibdecor(bool),
}

/// Hint applied to the next created window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowHint {
    /// Multisample count of the default framebuffer
    Samples(Samples),
    /// Double buffered default framebuffer
    DoubleBuffer(bool),
    /// User resizable
    Resizable(bool),
    /// Initially visible
    Visible(bool),
    /// Has decorations
    Decorated(bool),
    /// Focused when created
    Focused(bool),
    /// Always on top
    Floating(bool),
    /// Initially maximized
    Maximized(bool),
    /// Framebuffer alpha is used for compositing
    TransparentFramebuffer(bool),
    /// Content area scaled by the monitor content scale
    ScaleToMonitor(bool),
    /// Client API of the context
    ClientApi(ClientApi),
    /// Context creation path
    ContextCreationApi(ContextCreationApi),
    /// Requested client API version
    ContextVersion {
        /// Major version
        major: u8,
        /// Minor version
        minor: u8,
    },
    /// OpenGL profile
    OpenGlProfile(OpenGlProfile),
    /// Robustness strategy
    ContextRobustness(ContextRobustness),
    /// Forward compatible OpenGL context
    OpenGlForwardCompat(bool),
    /// Debug context
    ContextDebug(bool),
    /// Context that reports no errors
    ContextNoError(bool),
    /// Full screen refresh rate, `None` for the monitor default
    RefreshRate(Option<u32>),
}

/// Hint snapshot consumed by one window creation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowHints {
    /// Hints applied in order over the library defaults
    pub hints: Vec<WindowHint>,
    /// Swap interval set on the new context right after creation
    pub swap_interval: Option<u32>,
}

impl WindowHints {
    /// Empty snapshot, equivalent to library defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hint
    pub fn with(mut self, hint: WindowHint) -> Self {
        self.hints.push(hint);
        self
    }

    /// Set the swap interval applied after creation
    pub fn with_swap_interval(mut self, interval: u32) -> Self {
        self.swap_interval = Some(interval);
        self
    }

    /// Preset for a desktop OpenGL core context
    pub fn opengl_core(major: u8, minor: u8) -> Self {
        Self::new()
            .with(WindowHint::ClientApi(ClientApi::OpenGl))
            .with(WindowHint::ContextCreationApi(ContextCreationApi::Native))
            .with(WindowHint::ContextVersion { major, minor })
            .with(WindowHint::OpenGlProfile(OpenGlProfile::Core))
            .with(WindowHint::OpenGlForwardCompat(cfg!(target_os = "macos")))
            .with(WindowHint::DoubleBuffer(true))
    }

    /// Preset for an OpenGL ES context
    pub fn opengl_es(major: u8, minor: u8) -> Self {
        Self::new()
            .with(WindowHint::ClientApi(ClientApi::OpenGlEs))
            .with(WindowHint::ContextCreationApi(ContextCreationApi::Native))
            .with(WindowHint::ContextVersion { major, minor })
            .with(WindowHint::DoubleBuffer(true))
    }

    /// Apply every hint to the backend's window hint state
    pub fn apply(&self, backend: &mut dyn WindowBackend) {
        for hint in &self.hints {
            backend.window_hint(hint);
        }
    }
}

/// Apply init hints in order
pub fn apply_init_hints(hints: &[InitHint], backend: &mut dyn WindowBackend) {
    for hint in hints {
        backend.init_hint(hint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_count() {
        assert_eq!(Samples::Off.count(), 0);
        assert_eq!(Samples::X16.count(), 16);
    }

    #[test]
    fn test_builder_keeps_order() {
        let hints = WindowHints::new()
            .with(WindowHint::Resizable(false))
            .with(WindowHint::Samples(Samples::X4))
            .with_swap_interval(1);
        assert_eq!(hints.hints, vec![WindowHint::Resizable(false), WindowHint::Samples(Samples::X4)]);
        assert_eq!(hints.swap_interval, Some(1));
    }

    #[test]
    fn test_opengl_core_preset() {
        let hints = WindowHints::opengl_core(4, 6);
        assert!(hints.hints.contains(&WindowHint::ContextVersion { major: 4, minor: 6 }));
        assert!(hints.hints.contains(&WindowHint::OpenGlProfile(OpenGlProfile::Core)));
    }

    #[test]
    fn test_window_hints_from_toml() {
        let text = r#"
            swap_interval = 1
            hints = [
                { resizable = false },
                { samples = "x4" },
                { client_api = "open_gl_es" },
                { context_version = { major = 3, minor = 0 } },
            ]
        "#;
        let hints: WindowHints = toml::from_str(text).unwrap();
        assert_eq!(hints.swap_interval, Some(1));
        assert_eq!(
            hints.hints,
            vec![
                WindowHint::Resizable(false),
                WindowHint::Samples(Samples::X4),
                WindowHint::ClientApi(ClientApi::OpenGlEs),
                WindowHint::ContextVersion { major: 3, minor: 0 },
            ]
        );
    }
}
