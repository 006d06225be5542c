//! Monitor handles and video modes

use std::fmt;
use std::num::NonZeroU64;

/// Opaque identity of a connected monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonitorHandle(NonZeroU64);

impl MonitorHandle {
    /// Wrap a raw backend value, `None` for zero
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// Raw backend value
    pub fn as_raw(self) -> u64 {
        self.0.get()
    }
}

/// Monitor video mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VideoMode {
    /// Width in screen coordinates
    pub width: u32,
    /// Height in screen coordinates
    pub height: u32,
    /// Red channel bit depth
    pub red_bits: u32,
    /// Green channel bit depth
    pub green_bits: u32,
    /// Blue channel bit depth
    pub blue_bits: u32,
    /// Refresh rate in Hz
    pub refresh_rate: u32,
}

impl fmt::Display for VideoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} @ {}Hz (r{}g{}b{})",
            self.width, self.height, self.refresh_rate, self.red_bits, self.green_bits, self.blue_bits
        )
    }
}

/// Connected monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Monitor {
    handle: MonitorHandle,
    name: Option<String>,
}

impl Monitor {
    pub(crate) fn new(handle: MonitorHandle, name: Option<String>) -> Self {
        Self { handle, name }
    }

    /// Backend handle
    pub fn handle(&self) -> MonitorHandle {
        self.handle
    }

    /// Name reported when the monitor was enumerated
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
