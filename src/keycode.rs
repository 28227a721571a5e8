use serde::{Deserialize, Serialize};

/// Key category for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCategory {
    /// Modifier key (Ctrl, Shift, Alt, GUI)
    Modifier,
    /// Letter key (A-Z)
    Letter,
    /// Number key (0-9)
    Number,
    /// Function key (F1-F12)
    Function,
    /// Special key (Enter, Space, Esc, punctuation)
    Special,
    /// Navigation key (Arrows, Home, End, etc.)
    Navigation,
    /// International/Language key
    International,
}

/// Macro for defining keycodes with their USB HID usage id
///
/// Syntax: `KC_NAME = usage, category`
///
/// Categories: modifier, letter, number, function, special, navigation, international
///
/// Example:
/// ```ignore
/// KC_LCTL = 0xE0, modifier,
/// KC_A = 0x04, letter,
/// ```
macro_rules! define_keycodes {
    (
        $(
            $variant:ident = $code:literal, $category:ident,
        )*
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[repr(u8)]
        #[allow(non_camel_case_types)]
        pub enum KeyCode {
            $(
                $variant = $code,
            )*
        }

        impl KeyCode {
            /// Create a KeyCode from a HID keyboard page usage id
            /// Returns None if the usage is not mapped
            #[must_use]
            pub const fn from_hid_code(code: u8) -> Option<Self> {
                match code {
                    $(
                        $code => Some(Self::$variant),
                    )*
                    _ => None,
                }
            }

            /// Get the HID usage id for this KeyCode
            #[must_use]
            pub const fn code(self) -> u8 {
                self as u8
            }

            /// Check if this key is a modifier (Ctrl, Shift, Alt, GUI)
            #[must_use]
            pub const fn is_modifier(self) -> bool {
                matches!(self.category(), KeyCategory::Modifier)
            }

            /// Get the category of this key
            #[must_use]
            pub const fn category(self) -> KeyCategory {
                match self {
                    $(
                        Self::$variant => define_keycodes!(@@category $category),
                    )*
                }
            }

            /// Get the name of this key (e.g., "KC_A")
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(
                        Self::$variant => stringify!($variant),
                    )*
                }
            }
        }
    };

    (@@category modifier) => { KeyCategory::Modifier };
    (@@category letter) => { KeyCategory::Letter };
    (@@category number) => { KeyCategory::Number };
    (@@category function) => { KeyCategory::Function };
    (@@category special) => { KeyCategory::Special };
    (@@category navigation) => { KeyCategory::Navigation };
    (@@category international) => { KeyCategory::International };
}

// Keyboard/Keypad page (0x07)
define_keycodes! {
    // Letters
    KC_A = 0x04, letter,
    KC_B = 0x05, letter,
    KC_C = 0x06, letter,
    KC_D = 0x07, letter,
    KC_E = 0x08, letter,
    KC_F = 0x09, letter,
    KC_G = 0x0A, letter,
    KC_H = 0x0B, letter,
    KC_I = 0x0C, letter,
    KC_J = 0x0D, letter,
    KC_K = 0x0E, letter,
    KC_L = 0x0F, letter,
    KC_M = 0x10, letter,
    KC_N = 0x11, letter,
    KC_O = 0x12, letter,
    KC_P = 0x13, letter,
    KC_Q = 0x14, letter,
    KC_R = 0x15, letter,
    KC_S = 0x16, letter,
    KC_T = 0x17, letter,
    KC_U = 0x18, letter,
    KC_V = 0x19, letter,
    KC_W = 0x1A, letter,
    KC_X = 0x1B, letter,
    KC_Y = 0x1C, letter,
    KC_Z = 0x1D, letter,

    // Numbers
    KC_1 = 0x1E, number,
    KC_2 = 0x1F, number,
    KC_3 = 0x20, number,
    KC_4 = 0x21, number,
    KC_5 = 0x22, number,
    KC_6 = 0x23, number,
    KC_7 = 0x24, number,
    KC_8 = 0x25, number,
    KC_9 = 0x26, number,
    KC_0 = 0x27, number,

    // Special keys
    KC_ENT = 0x28, special,
    KC_ESC = 0x29, special,
    KC_BSPC = 0x2A, special,
    KC_TAB = 0x2B, special,
    KC_SPC = 0x2C, special,
    KC_MINS = 0x2D, special,
    KC_EQL = 0x2E, special,
    KC_LBRC = 0x2F, special,
    KC_RBRC = 0x30, special,
    KC_BSLS = 0x31, special,
    KC_SCLN = 0x33, special,
    KC_QUOT = 0x34, special,
    KC_GRV = 0x35, special,
    KC_COMM = 0x36, special,
    KC_DOT = 0x37, special,
    KC_SLSH = 0x38, special,
    KC_CAPS = 0x39, special,

    // Function keys
    KC_F1 = 0x3A, function,
    KC_F2 = 0x3B, function,
    KC_F3 = 0x3C, function,
    KC_F4 = 0x3D, function,
    KC_F5 = 0x3E, function,
    KC_F6 = 0x3F, function,
    KC_F7 = 0x40, function,
    KC_F8 = 0x41, function,
    KC_F9 = 0x42, function,
    KC_F10 = 0x43, function,
    KC_F11 = 0x44, function,
    KC_F12 = 0x45, function,

    // Navigation
    KC_PSCR = 0x46, navigation,
    KC_INS = 0x49, navigation,
    KC_HOME = 0x4A, navigation,
    KC_PGUP = 0x4B, navigation,
    KC_DEL = 0x4C, navigation,
    KC_END = 0x4D, navigation,
    KC_PGDN = 0x4E, navigation,
    KC_RGHT = 0x4F, navigation,
    KC_LEFT = 0x50, navigation,
    KC_DOWN = 0x51, navigation,
    KC_UP = 0x52, navigation,

    // Japanese input method keys
    KC_RO = 0x87, international,
    KC_KANA = 0x88, international,
    KC_JYEN = 0x89, international,
    KC_HENK = 0x8A, international,
    KC_MHEN = 0x8B, international,
    KC_LANG1 = 0x90, international,
    KC_LANG2 = 0x91, international,

    // Modifiers
    KC_LCTL = 0xE0, modifier,
    KC_LSFT = 0xE1, modifier,
    KC_LALT = 0xE2, modifier,
    KC_LGUI = 0xE3, modifier,
    KC_RCTL = 0xE4, modifier,
    KC_RSFT = 0xE5, modifier,
    KC_RALT = 0xE6, modifier,
    KC_RGUI = 0xE7, modifier,
}

// Aliases for common alternative names (QMK compatibility)
impl KeyCode {
    /// Alias for KC_LGUI (Left Command key on Mac)
    pub const KC_LCMD: Self = Self::KC_LGUI;
    /// Alias for KC_RGUI (Right Command key on Mac)
    pub const KC_RCMD: Self = Self::KC_RGUI;
    /// Alias for KC_ENT
    pub const KC_ENTER: Self = Self::KC_ENT;
    /// Alias for KC_SPC
    pub const KC_SPACE: Self = Self::KC_SPC;
}

impl std::fmt::Display for KeyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
