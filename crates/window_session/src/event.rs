//! Window event kinds and their native and decoded shapes
//!
//! A [`NativeEvent`] is what a backend reports: raw integers exactly as the
//! native callback received them. [`WindowEvent`] is the decoded form handlers
//! see. Decoding is the only place native values are validated.

use std::path::PathBuf;

use bitflags::bitflags;

use crate::error::DispatchError;
use crate::input::{Action, Key, KeyInput, Modifiers, MouseButton, MouseInput};

/// One per native window callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Window moved
    Pos,
    /// Content area resized
    Size,
    /// Close requested
    Close,
    /// Contents need redrawing
    Refresh,
    /// Input focus gained or lost
    Focus,
    /// Minimized or restored
    Iconify,
    /// Maximized or restored
    Maximize,
    /// Framebuffer resized
    FramebufferSize,
    /// Content scale changed
    ContentScale,
    /// Physical key event
    Key,
    /// Unicode character input
    Char,
    /// Unicode character input with modifier state
    CharMods,
    /// Mouse button event
    MouseButton,
    /// Cursor moved
    CursorPos,
    /// Cursor entered or left the content area
    CursorEnter,
    /// Scroll wheel or touchpad scroll
    Scroll,
    /// Paths dropped onto the window
    Drop,
}

impl EventKind {
    /// Every kind, in trampoline installation order
    pub const ALL: [Self; 17] = [
        Self::Pos,
        Self::Size,
        Self::Close,
        Self::Refresh,
        Self::Focus,
        Self::Iconify,
        Self::Maximize,
        Self::FramebufferSize,
        Self::ContentScale,
        Self::Key,
        Self::Char,
        Self::CharMods,
        Self::MouseButton,
        Self::CursorPos,
        Self::CursorEnter,
        Self::Scroll,
        Self::Drop,
    ];

    /// Single-bit mask for this kind
    pub fn mask(self) -> EventMask {
        EventMask::from_bits_truncate(1 << self as u32)
    }
}

bitflags! {
    /// Set of event kinds, one bit per [`EventKind`] in declaration order
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventMask: u32 {
        /// Every kind
        const ALL = (1 << 17) - 1;
    }
}

impl FromIterator<EventKind> for EventMask {
    fn from_iter<I: IntoIterator<Item = EventKind>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), |mask, kind| mask | kind.mask())
    }
}

/// Event as reported by the native layer
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum NativeEvent {
    Pos { x: i32, y: i32 },
    Size { width: i32, height: i32 },
    Close,
    Refresh,
    Focus { focused: i32 },
    Iconify { iconified: i32 },
    Maximize { maximized: i32 },
    FramebufferSize { width: i32, height: i32 },
    ContentScale { x: f32, y: f32 },
    Key { key: i32, scancode: i32, action: i32, mods: i32 },
    Char { codepoint: u32 },
    CharMods { codepoint: u32, mods: i32 },
    MouseButton { button: i32, action: i32, mods: i32 },
    CursorPos { x: f64, y: f64 },
    CursorEnter { entered: i32 },
    Scroll { x: f64, y: f64 },
    Drop { paths: Vec<PathBuf> },
}

impl NativeEvent {
    /// Callback this event arrives through
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Pos { .. } => EventKind::Pos,
            Self::Size { .. } => EventKind::Size,
            Self::Close => EventKind::Close,
            Self::Refresh => EventKind::Refresh,
            Self::Focus { .. } => EventKind::Focus,
            Self::Iconify { .. } => EventKind::Iconify,
            Self::Maximize { .. } => EventKind::Maximize,
            Self::FramebufferSize { .. } => EventKind::FramebufferSize,
            Self::ContentScale { .. } => EventKind::ContentScale,
            Self::Key { .. } => EventKind::Key,
            Self::Char { .. } => EventKind::Char,
            Self::CharMods { .. } => EventKind::CharMods,
            Self::MouseButton { .. } => EventKind::MouseButton,
            Self::CursorPos { .. } => EventKind::CursorPos,
            Self::CursorEnter { .. } => EventKind::CursorEnter,
            Self::Scroll { .. } => EventKind::Scroll,
            Self::Drop { .. } => EventKind::Drop,
        }
    }
}

/// Decoded event, as delivered to window signals
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum WindowEvent {
    Pos(i32, i32),
    Size(i32, i32),
    Close,
    Refresh,
    Focus(bool),
    Iconify(bool),
    Maximize(bool),
    FramebufferSize(i32, i32),
    ContentScale(f32, f32),
    Key(KeyInput),
    Char(char),
    CharMods(char, Modifiers),
    MouseButton(MouseInput),
    CursorPos(f64, f64),
    CursorEnter(bool),
    Scroll(f64, f64),
    Drop(Vec<PathBuf>),
}

impl TryFrom<NativeEvent> for WindowEvent {
    type Error = DispatchError;

    fn try_from(event: NativeEvent) -> Result<Self, Self::Error> {
        let kind = event.kind();
        let malformed = |detail: String| DispatchError::Malformed { kind, detail };
        let action = |raw: i32| Action::try_from(raw).map_err(|raw| malformed(format!("action code {raw}")));
        let codepoint = |raw: u32| char::from_u32(raw).ok_or_else(|| malformed(format!("codepoint {raw:#x}")));

        Ok(match event {
            NativeEvent::Pos { x, y } => Self::Pos(x, y),
            NativeEvent::Size { width, height } => Self::Size(width, height),
            NativeEvent::Close => Self::Close,
            NativeEvent::Refresh => Self::Refresh,
            NativeEvent::Focus { focused } => Self::Focus(focused != 0),
            NativeEvent::Iconify { iconified } => Self::Iconify(iconified != 0),
            NativeEvent::Maximize { maximized } => Self::Maximize(maximized != 0),
            NativeEvent::FramebufferSize { width, height } => Self::FramebufferSize(width, height),
            NativeEvent::ContentScale { x, y } => Self::ContentScale(x, y),
            NativeEvent::Key { key, scancode, action: raw_action, mods } => Self::Key(KeyInput {
                key: Key::from_raw(key),
                scancode,
                action: action(raw_action)?,
                mods: Modifiers::from_bits_truncate(mods),
            }),
            NativeEvent::Char { codepoint: raw } => Self::Char(codepoint(raw)?),
            NativeEvent::CharMods { codepoint: raw, mods } => {
                Self::CharMods(codepoint(raw)?, Modifiers::from_bits_truncate(mods))
            }
            NativeEvent::MouseButton { button, action: raw_action, mods } => Self::MouseButton(MouseInput {
                button: MouseButton::try_from(button).map_err(|raw| malformed(format!("mouse button {raw}")))?,
                action: action(raw_action)?,
                mods: Modifiers::from_bits_truncate(mods),
            }),
            NativeEvent::CursorPos { x, y } => Self::CursorPos(x, y),
            NativeEvent::CursorEnter { entered } => Self::CursorEnter(entered != 0),
            NativeEvent::Scroll { x, y } => Self::Scroll(x, y),
            NativeEvent::Drop { paths } => Self::Drop(paths),
        })
    }
}
