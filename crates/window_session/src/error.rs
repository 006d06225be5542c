//! Error types for every layer of the session core

use thiserror::Error;

use crate::backend::NativeHandle;
use crate::config::ConfigError;
use crate::event::EventKind;
use crate::window::WindowId;

/// Native error codes, numbered like the underlying windowing library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    /// No error has occurred
    NoError = 0,
    /// Library not initialized
    NotInitialized = 0x0001_0001,
    /// No context is current on this thread
    NoCurrentContext = 0x0001_0002,
    /// Invalid enum argument
    InvalidEnum = 0x0001_0003,
    /// Invalid value argument
    InvalidValue = 0x0001_0004,
    /// Allocation failure
    OutOfMemory = 0x0001_0005,
    /// Requested client API not available
    ApiUnavailable = 0x0001_0006,
    /// Requested client API version not available
    VersionUnavailable = 0x0001_0007,
    /// Generic platform error
    PlatformError = 0x0001_0008,
    /// Requested pixel or clipboard format not available
    FormatUnavailable = 0x0001_0009,
    /// Window has no graphics context
    NoWindowContext = 0x0001_000A,
    /// Requested cursor shape not available
    CursorUnavailable = 0x0001_000B,
    /// Feature not provided by the platform
    FeatureUnavailable = 0x0001_000C,
    /// Feature not implemented by the library
    FeatureUnimplemented = 0x0001_000D,
    /// Platform not available or not supported
    PlatformUnavailable = 0x0001_000E,
}

impl ErrorCode {
    /// Map a raw native code, unknown values fold into `PlatformError`
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::NoError,
            0x0001_0001 => Self::NotInitialized,
            0x0001_0002 => Self::NoCurrentContext,
            0x0001_0003 => Self::InvalidEnum,
            0x0001_0004 => Self::InvalidValue,
            0x0001_0005 => Self::OutOfMemory,
            0x0001_0006 => Self::ApiUnavailable,
            0x0001_0007 => Self::VersionUnavailable,
            0x0001_0009 => Self::FormatUnavailable,
            0x0001_000A => Self::NoWindowContext,
            0x0001_000B => Self::CursorUnavailable,
            0x0001_000C => Self::FeatureUnavailable,
            0x0001_000D => Self::FeatureUnimplemented,
            0x0001_000E => Self::PlatformUnavailable,
            _ => Self::PlatformError,
        }
    }
}

/// Error recorded by the native layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code:?}: {description}")]
pub struct NativeError {
    /// Native error code
    pub code: ErrorCode,
    /// Native description, may be empty
    pub description: String,
}

impl NativeError {
    /// Create a native error
    pub fn new(code: ErrorCode, description: impl Into<String>) -> Self {
        Self { code, description: description.into() }
    }
}

/// Session level errors
#[derive(Error, Debug)]
pub enum SessionError {
    /// The windowing platform isn't available on this machine
    #[error("windowing platform unavailable: {0}")]
    PlatformUnavailable(String),

    /// Global initialization failed for another platform reason
    #[error("windowing platform error: {0}")]
    PlatformError(String),

    /// The native layer refused to create a window
    #[error("window creation failed: {0}")]
    WindowCreation(NativeError),

    /// A window id doesn't name a live window of this session
    #[error("unknown window {0}")]
    UnknownWindow(WindowId),

    /// The native layer handed out a handle that is still registered
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Session configuration couldn't be loaded
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl SessionError {
    /// Classify a failed global initialization
    pub(crate) fn from_init(error: NativeError) -> Self {
        match error.code {
            ErrorCode::PlatformUnavailable | ErrorCode::ApiUnavailable => {
                Self::PlatformUnavailable(error.description)
            }
            _ => Self::PlatformError(error.to_string()),
        }
    }
}

/// Handle registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No window is registered for the handle
    #[error("no window registered for {0}")]
    NotFound(NativeHandle),

    /// The handle already maps to a live window
    #[error("{handle} is already registered to window {existing}")]
    AlreadyRegistered {
        /// Offending handle
        handle: NativeHandle,
        /// Window currently owning the handle
        existing: WindowId,
    },

    /// Registry, user-data slot and callback record disagree
    #[error("registry inconsistent for window {window}: {reason}")]
    Inconsistent {
        /// Window whose bookkeeping is broken
        window: WindowId,
        /// What disagreed
        reason: String,
    },
}

/// Failure to route a native event to its window signal
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No live window owns the dispatching handle
    #[error("no window registered for {0}")]
    NotFound(NativeHandle),

    /// The registry resolved a window that owns a different handle
    #[error("{dispatched} resolved to window {window} which owns {owned}")]
    HandleMismatch {
        /// Handle the event arrived on
        dispatched: NativeHandle,
        /// Window the registry resolved
        window: WindowId,
        /// Handle that window actually owns
        owned: NativeHandle,
    },

    /// A native argument couldn't be decoded into its public type
    #[error("malformed {kind:?} event: {detail}")]
    Malformed {
        /// Event kind being decoded
        kind: EventKind,
        /// What couldn't be decoded
        detail: String,
    },
}

impl DispatchError {
    /// Whether the error means the dispatch wiring itself is broken
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::HandleMismatch { .. })
    }
}

/// Session result alias
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_roundtrip_known() {
        assert_eq!(ErrorCode::from_raw(0x0001_000E), ErrorCode::PlatformUnavailable);
        assert_eq!(ErrorCode::from_raw(0x0001_0002), ErrorCode::NoCurrentContext);
        assert_eq!(ErrorCode::from_raw(-5), ErrorCode::PlatformError);
    }

    #[test]
    fn test_init_error_classification() {
        let unavailable = NativeError::new(ErrorCode::PlatformUnavailable, "no display");
        assert!(matches!(
            SessionError::from_init(unavailable),
            SessionError::PlatformUnavailable(msg) if msg == "no display"
        ));

        let other = NativeError::new(ErrorCode::OutOfMemory, "oom");
        assert!(matches!(SessionError::from_init(other), SessionError::PlatformError(_)));
    }

    #[test]
    fn test_invariant_classification() {
        let handle = NativeHandle::from_raw(3).unwrap();
        assert!(DispatchError::NotFound(handle).is_invariant_violation());
        let malformed = DispatchError::Malformed { kind: EventKind::Char, detail: "bad".into() };
        assert!(!malformed.is_invariant_violation());
    }
}
