//! Configuration system

pub use serde::{Deserialize, Serialize};

use crate::hints::{InitHint, WindowHints};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }

    /// Parse configuration from TOML text
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Session-wide configuration
///
/// ```toml
/// init_hints = [{ platform = "x11" }]
///
/// [window_hints]
/// swap_interval = 1
/// hints = [{ resizable = false }, { samples = "x4" }]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Applied in order before the native library is initialized
    pub init_hints: Vec<InitHint>,
    /// Base hints for every window, applied over the library defaults and
    /// under the per-window snapshot
    pub window_hints: WindowHints,
}

impl Config for SessionConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hints::{PlatformKind, Samples, WindowHint};

    #[test]
    fn test_session_config_from_toml() {
        let config = SessionConfig::from_toml_str(
            r#"
            init_hints = [{ platform = "x11" }]

            [window_hints]
            swap_interval = 1
            hints = [{ resizable = false }, { samples = "x4" }]
            "#,
        )
        .unwrap();

        assert_eq!(config.init_hints, vec![InitHint::Platform(PlatformKind::X11)]);
        assert_eq!(
            config.window_hints.hints,
            vec![WindowHint::Resizable(false), WindowHint::Samples(Samples::X4)]
        );
        assert_eq!(config.window_hints.swap_interval, Some(1));
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(SessionConfig::from_toml_str("").unwrap(), SessionConfig::default());
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        assert!(matches!(SessionConfig::from_toml_str("init_hints = 3"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = SessionConfig::load_from_file("session.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_) | ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_ron_roundtrip_through_file() {
        let path = std::env::temp_dir().join(format!("window_session_{}.ron", std::process::id()));
        let path = path.to_string_lossy().into_owned();

        let config = SessionConfig {
            init_hints: vec![InitHint::JoystickHatButtons(false)],
            window_hints: WindowHints::opengl_core(3, 3).with_swap_interval(0),
        };
        config.save_to_file(&path).unwrap();
        let loaded = SessionConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }
}
