//! Key and mouse-button vocabulary.
//!
//! Names are parsed once, when a [`RunConfig`](crate::config::RunConfig) is
//! built, so a typo is reported before anything is sent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RepeatError, Result};

/// A key that can be pressed, held or tapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum KeyName {
    Space,
    Enter,
    Tab,
    Escape,
    Backspace,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    Shift,
    Control,
    Alt,
    Meta,
    CapsLock,
    /// Function key `F1`..=`F20`.
    Function(u8),
    /// Any single printable character, sent as typed text.
    Char(char),
}

impl KeyName {
    pub fn parse(name: &str) -> Result<Self> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            // A lone space is still a valid key.
            if name.contains(' ') {
                return Ok(Self::Space);
            }
            return Err(RepeatError::invalid_key(name, "key cannot be empty"));
        }

        let mut chars = trimmed.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_control() {
                return Err(RepeatError::invalid_key(name, "control characters are not keys"));
            }
            return Ok(Self::Char(c));
        }

        let lower = trimmed.to_lowercase();
        let key = match lower.as_str() {
            "space" | "spacebar" => Self::Space,
            "enter" | "return" => Self::Enter,
            "tab" => Self::Tab,
            "escape" | "esc" => Self::Escape,
            "backspace" => Self::Backspace,
            "delete" | "del" => Self::Delete,
            "home" => Self::Home,
            "end" => Self::End,
            "pageup" | "pgup" => Self::PageUp,
            "pagedown" | "pgdn" => Self::PageDown,
            "up" | "arrowup" => Self::Up,
            "down" | "arrowdown" => Self::Down,
            "left" | "arrowleft" => Self::Left,
            "right" | "arrowright" => Self::Right,
            "shift" => Self::Shift,
            "ctrl" | "control" => Self::Control,
            "alt" | "option" => Self::Alt,
            "meta" | "win" | "super" | "cmd" | "command" => Self::Meta,
            "capslock" => Self::CapsLock,
            other => match other.strip_prefix('f').map(str::parse::<u8>) {
                Some(Ok(n)) if (1..=20).contains(&n) => Self::Function(n),
                _ => {
                    return Err(RepeatError::invalid_key(name, "unknown key name"));
                }
            },
        };
        Ok(key)
    }
}

impl FromStr for KeyName {
    type Err = RepeatError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for KeyName {
    type Error = RepeatError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<KeyName> for String {
    fn from(key: KeyName) -> Self {
        key.to_string()
    }
}

impl fmt::Display for KeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Space => "space",
            Self::Enter => "enter",
            Self::Tab => "tab",
            Self::Escape => "escape",
            Self::Backspace => "backspace",
            Self::Delete => "delete",
            Self::Home => "home",
            Self::End => "end",
            Self::PageUp => "pageup",
            Self::PageDown => "pagedown",
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::Shift => "shift",
            Self::Control => "ctrl",
            Self::Alt => "alt",
            Self::Meta => "meta",
            Self::CapsLock => "capslock",
            Self::Function(n) => return write!(f, "f{n}"),
            Self::Char(c) => return write!(f, "{c}"),
        };
        f.write_str(name)
    }
}

/// Mouse button for click mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "left" | "l" | "primary" => Ok(Self::Left),
            "right" | "r" | "secondary" => Ok(Self::Right),
            "middle" | "m" | "wheel" => Ok(Self::Middle),
            "" => Err(RepeatError::invalid_key(
                name,
                "mouse button cannot be empty (left/right/middle)",
            )),
            _ => Err(RepeatError::invalid_key(
                name,
                "expected left, right or middle",
            )),
        }
    }
}

impl FromStr for MouseButton {
    type Err = RepeatError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MouseButton {
    type Error = RepeatError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<MouseButton> for String {
    fn from(button: MouseButton) -> Self {
        button.to_string()
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Middle => "middle",
        })
    }
}
