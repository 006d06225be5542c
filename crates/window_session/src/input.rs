//! Public input types
//!
//! Native callbacks report keys, buttons and modifier state as raw integers.
//! The dispatcher converts them into the types below before any handler runs.

use bitflags::bitflags;

/// Keyboard key, numbered like the native key table
///
/// Keys the native layer reports but that have no named constant still carry
/// their raw code, so nothing is lost in the conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(i32);

#[allow(missing_docs)]
impl Key {
    pub const UNKNOWN: Self = Self(-1);
    pub const SPACE: Self = Self(32);
    pub const APOSTROPHE: Self = Self(39);
    pub const COMMA: Self = Self(44);
    pub const MINUS: Self = Self(45);
    pub const PERIOD: Self = Self(46);
    pub const SLASH: Self = Self(47);
    pub const NUM_0: Self = Self(48);
    pub const NUM_1: Self = Self(49);
    pub const NUM_2: Self = Self(50);
    pub const NUM_3: Self = Self(51);
    pub const NUM_4: Self = Self(52);
    pub const NUM_5: Self = Self(53);
    pub const NUM_6: Self = Self(54);
    pub const NUM_7: Self = Self(55);
    pub const NUM_8: Self = Self(56);
    pub const NUM_9: Self = Self(57);
    pub const SEMICOLON: Self = Self(59);
    pub const EQUAL: Self = Self(61);
    pub const A: Self = Self(65);
    pub const B: Self = Self(66);
    pub const C: Self = Self(67);
    pub const D: Self = Self(68);
    pub const E: Self = Self(69);
    pub const F: Self = Self(70);
    pub const G: Self = Self(71);
    pub const H: Self = Self(72);
    pub const I: Self = Self(73);
    pub const J: Self = Self(74);
    pub const K: Self = Self(75);
    pub const L: Self = Self(76);
    pub const M: Self = Self(77);
    pub const N: Self = Self(78);
    pub const O: Self = Self(79);
    pub const P: Self = Self(80);
    pub const Q: Self = Self(81);
    pub const R: Self = Self(82);
    pub const S: Self = Self(83);
    pub const T: Self = Self(84);
    pub const U: Self = Self(85);
    pub const V: Self = Self(86);
    pub const W: Self = Self(87);
    pub const X: Self = Self(88);
    pub const Y: Self = Self(89);
    pub const Z: Self = Self(90);
    pub const LEFT_BRACKET: Self = Self(91);
    pub const BACKSLASH: Self = Self(92);
    pub const RIGHT_BRACKET: Self = Self(93);
    pub const GRAVE_ACCENT: Self = Self(96);
    pub const ESCAPE: Self = Self(256);
    pub const ENTER: Self = Self(257);
    pub const TAB: Self = Self(258);
    pub const BACKSPACE: Self = Self(259);
    pub const INSERT: Self = Self(260);
    pub const DELETE: Self = Self(261);
    pub const RIGHT: Self = Self(262);
    pub const LEFT: Self = Self(263);
    pub const DOWN: Self = Self(264);
    pub const UP: Self = Self(265);
    pub const PAGE_UP: Self = Self(266);
    pub const PAGE_DOWN: Self = Self(267);
    pub const HOME: Self = Self(268);
    pub const END: Self = Self(269);
    pub const CAPS_LOCK: Self = Self(280);
    pub const SCROLL_LOCK: Self = Self(281);
    pub const NUM_LOCK: Self = Self(282);
    pub const PRINT_SCREEN: Self = Self(283);
    pub const PAUSE: Self = Self(284);
    pub const F1: Self = Self(290);
    pub const F2: Self = Self(291);
    pub const F3: Self = Self(292);
    pub const F4: Self = Self(293);
    pub const F5: Self = Self(294);
    pub const F6: Self = Self(295);
    pub const F7: Self = Self(296);
    pub const F8: Self = Self(297);
    pub const F9: Self = Self(298);
    pub const F10: Self = Self(299);
    pub const F11: Self = Self(300);
    pub const F12: Self = Self(301);
    pub const KP_0: Self = Self(320);
    pub const KP_1: Self = Self(321);
    pub const KP_2: Self = Self(322);
    pub const KP_3: Self = Self(323);
    pub const KP_4: Self = Self(324);
    pub const KP_5: Self = Self(325);
    pub const KP_6: Self = Self(326);
    pub const KP_7: Self = Self(327);
    pub const KP_8: Self = Self(328);
    pub const KP_9: Self = Self(329);
    pub const KP_DECIMAL: Self = Self(330);
    pub const KP_DIVIDE: Self = Self(331);
    pub const KP_MULTIPLY: Self = Self(332);
    pub const KP_SUBTRACT: Self = Self(333);
    pub const KP_ADD: Self = Self(334);
    pub const KP_ENTER: Self = Self(335);
    pub const KP_EQUAL: Self = Self(336);
    pub const LEFT_SHIFT: Self = Self(340);
    pub const LEFT_CONTROL: Self = Self(341);
    pub const LEFT_ALT: Self = Self(342);
    pub const LEFT_SUPER: Self = Self(343);
    pub const RIGHT_SHIFT: Self = Self(344);
    pub const RIGHT_CONTROL: Self = Self(345);
    pub const RIGHT_ALT: Self = Self(346);
    pub const RIGHT_SUPER: Self = Self(347);
    pub const MENU: Self = Self(348);
}

impl Key {
    /// Convert a raw native key code
    ///
    /// Codes outside the native key table become [`Key::UNKNOWN`].
    pub fn from_raw(raw: i32) -> Self {
        if (32..=348).contains(&raw) {
            Self(raw)
        } else {
            Self::UNKNOWN
        }
    }

    /// Raw native key code
    pub fn raw(self) -> i32 {
        self.0
    }
}

/// Key or button transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Released
    Release,
    /// Pressed
    Press,
    /// Held down long enough to auto-repeat
    Repeat,
}

impl TryFrom<i32> for Action {
    type Error = i32;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Release),
            1 => Ok(Self::Press),
            2 => Ok(Self::Repeat),
            other => Err(other),
        }
    }
}

/// Mouse button, numbered like the native button table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum MouseButton {
    Button1,
    Button2,
    Button3,
    Button4,
    Button5,
    Button6,
    Button7,
    Button8,
}

impl MouseButton {
    /// Primary button
    pub const LEFT: Self = Self::Button1;
    /// Secondary button
    pub const RIGHT: Self = Self::Button2;
    /// Wheel button
    pub const MIDDLE: Self = Self::Button3;
}

impl TryFrom<i32> for MouseButton {
    type Error = i32;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        Ok(match raw {
            0 => Self::Button1,
            1 => Self::Button2,
            2 => Self::Button3,
            3 => Self::Button4,
            4 => Self::Button5,
            5 => Self::Button6,
            6 => Self::Button7,
            7 => Self::Button8,
            other => return Err(other),
        })
    }
}

bitflags! {
    /// Modifier keys held during an input event
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: i32 {
        /// Either shift key
        const SHIFT = 0x0001;
        /// Either control key
        const CONTROL = 0x0002;
        /// Either alt key
        const ALT = 0x0004;
        /// Either super key
        const SUPER = 0x0008;
        /// Caps lock enabled
        const CAPS_LOCK = 0x0010;
        /// Num lock enabled
        const NUM_LOCK = 0x0020;
    }
}

/// Decoded keyboard event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    /// Logical key
    pub key: Key,
    /// Platform specific scancode
    pub scancode: i32,
    /// Transition
    pub action: Action,
    /// Modifier state
    pub mods: Modifiers,
}

/// Decoded mouse button event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseInput {
    /// Button
    pub button: MouseButton,
    /// Transition
    pub action: Action,
    /// Modifier state
    pub mods: Modifiers,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_raw() {
        assert_eq!(Key::from_raw(256), Key::ESCAPE);
        assert_eq!(Key::from_raw(65), Key::A);
        assert_eq!(Key::from_raw(9999), Key::UNKNOWN);
        assert_eq!(Key::from_raw(-1), Key::UNKNOWN);
    }

    #[test]
    fn test_action_decoding() {
        assert_eq!(Action::try_from(1), Ok(Action::Press));
        assert_eq!(Action::try_from(5), Err(5));
    }

    #[test]
    fn test_mouse_button_aliases() {
        assert_eq!(MouseButton::try_from(0), Ok(MouseButton::LEFT));
        assert_eq!(MouseButton::try_from(2), Ok(MouseButton::MIDDLE));
        assert!(MouseButton::try_from(8).is_err());
    }

    #[test]
    fn test_modifiers_drop_unknown_bits() {
        let mods = Modifiers::from_bits_truncate(0x0003 | 0x4000);
        assert_eq!(mods, Modifiers::SHIFT | Modifiers::CONTROL);
    }
}
