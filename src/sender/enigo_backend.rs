use enigo::{Button, Direction, Enigo, Key, Keyboard, Mouse, Settings};

use super::InputBackend;
use crate::config::Action;
use crate::error::{RepeatError, Result};
use crate::keys::{KeyName, MouseButton};

/// Primary backend: virtual-key and mouse events through `enigo`.
pub struct EnigoBackend {
    enigo: Enigo,
}

impl EnigoBackend {
    pub fn new() -> Result<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| RepeatError::backend_unavailable("primary", e.to_string()))?;
        Ok(Self { enigo })
    }

    fn send(&mut self, action: &Action, direction: Direction) -> Result<()> {
        let sent = match action {
            Action::Key(key) => self.enigo.key(to_enigo_key(*key), direction),
            Action::Click(button) => self.enigo.button(to_enigo_button(*button), direction),
        };
        sent.map_err(|e| RepeatError::injection(action.to_string(), e.to_string()))
    }
}

impl InputBackend for EnigoBackend {
    fn down(&mut self, action: &Action) -> Result<()> {
        self.send(action, Direction::Press)
    }

    fn up(&mut self, action: &Action) -> Result<()> {
        self.send(action, Direction::Release)
    }

    fn tap(&mut self, action: &Action) -> Result<()> {
        self.send(action, Direction::Click)
    }
}

fn to_enigo_key(key: KeyName) -> Key {
    match key {
        KeyName::Space => Key::Space,
        KeyName::Enter => Key::Return,
        KeyName::Tab => Key::Tab,
        KeyName::Escape => Key::Escape,
        KeyName::Backspace => Key::Backspace,
        KeyName::Delete => Key::Delete,
        KeyName::Home => Key::Home,
        KeyName::End => Key::End,
        KeyName::PageUp => Key::PageUp,
        KeyName::PageDown => Key::PageDown,
        KeyName::Up => Key::UpArrow,
        KeyName::Down => Key::DownArrow,
        KeyName::Left => Key::LeftArrow,
        KeyName::Right => Key::RightArrow,
        KeyName::Shift => Key::Shift,
        KeyName::Control => Key::Control,
        KeyName::Alt => Key::Alt,
        KeyName::Meta => Key::Meta,
        KeyName::CapsLock => Key::CapsLock,
        KeyName::Function(n) => function_key(n),
        KeyName::Char(c) => Key::Unicode(c),
    }
}

fn function_key(n: u8) -> Key {
    match n {
        1 => Key::F1,
        2 => Key::F2,
        3 => Key::F3,
        4 => Key::F4,
        5 => Key::F5,
        6 => Key::F6,
        7 => Key::F7,
        8 => Key::F8,
        9 => Key::F9,
        10 => Key::F10,
        11 => Key::F11,
        12 => Key::F12,
        13 => Key::F13,
        14 => Key::F14,
        15 => Key::F15,
        16 => Key::F16,
        17 => Key::F17,
        18 => Key::F18,
        19 => Key::F19,
        // KeyName::parse caps function keys at 20.
        _ => Key::F20,
    }
}

fn to_enigo_button(button: MouseButton) -> Button {
    match button {
        MouseButton::Left => Button::Left,
        MouseButton::Right => Button::Right,
        MouseButton::Middle => Button::Middle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        assert_eq!(to_enigo_key(KeyName::Enter), Key::Return);
        assert_eq!(to_enigo_key(KeyName::Char('q')), Key::Unicode('q'));
        assert_eq!(to_enigo_key(KeyName::Function(11)), Key::F11);
        assert_eq!(to_enigo_key(KeyName::Up), Key::UpArrow);
    }

    #[test]
    fn test_button_mapping() {
        assert_eq!(to_enigo_button(MouseButton::Middle), Button::Middle);
    }
}
