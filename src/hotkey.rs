//! System-wide start/stop hotkey.
//!
//! [`HotkeyToggle`] owns the registration; a listener thread forwards each
//! press as a [`HotkeyPressed`] message so the front end can toggle the run
//! from its own event loop.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use tracing::{debug, info};

use crate::error::{RepeatError, Result};
use crate::keys::KeyName;

/// Sent once per hotkey press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyPressed;

pub struct HotkeyToggle {
    manager: GlobalHotKeyManager,
    current: Option<(HotKey, String)>,
    active_id: Arc<AtomicU32>,
    shutdown: Arc<AtomicBool>,
}

impl HotkeyToggle {
    pub fn new() -> Result<Self> {
        let manager = GlobalHotKeyManager::new()
            .map_err(|e| RepeatError::hotkey(format!("failed to create hotkey manager: {e}")))?;

        Ok(Self {
            manager,
            current: None,
            active_id: Arc::new(AtomicU32::new(0)),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Replace the current hotkey with `spec` (e.g. `ctrl+alt+k`).
    ///
    /// On failure the previous hotkey is already gone and none is active.
    pub fn register(&mut self, spec: &str) -> Result<()> {
        let hotkey = parse_hotkey(spec)?;
        self.unregister();

        self.manager
            .register(hotkey)
            .map_err(|e| RepeatError::hotkey(format!("failed to register '{spec}': {e}")))?;

        self.active_id.store(hotkey.id(), Ordering::Release);
        self.current = Some((hotkey, spec.trim().to_string()));
        info!(hotkey = spec, "global hotkey registered");
        Ok(())
    }

    pub fn unregister(&mut self) {
        if let Some((hotkey, spec)) = self.current.take() {
            self.active_id.store(0, Ordering::Release);
            if let Err(e) = self.manager.unregister(hotkey) {
                debug!(hotkey = %spec, error = %e, "unregister failed");
            }
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_ref().map(|(_, spec)| spec.as_str())
    }

    /// Forward presses of the registered hotkey to `tx` until this toggle is
    /// dropped or the receiver goes away.
    pub fn spawn_listener(&self, tx: Sender<HotkeyPressed>) -> JoinHandle<()> {
        let receiver = GlobalHotKeyEvent::receiver();
        let active_id = Arc::clone(&self.active_id);
        let shutdown = Arc::clone(&self.shutdown);

        thread::spawn(move || {
            while !shutdown.load(Ordering::Acquire) {
                if let Ok(event) = receiver.try_recv() {
                    let wanted = active_id.load(Ordering::Acquire);
                    if event.state == HotKeyState::Pressed
                        && wanted != 0
                        && event.id == wanted
                        && tx.send(HotkeyPressed).is_err()
                    {
                        break;
                    }
                    continue;
                }
                thread::sleep(Duration::from_millis(10));
            }
            debug!("hotkey listener stopped");
        })
    }
}

impl Drop for HotkeyToggle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        self.unregister();
    }
}

/// Parse `modifier+...+key`. Modifiers are ctrl, alt, shift and meta.
pub fn parse_hotkey(spec: &str) -> Result<HotKey> {
    let binding = spec.trim().to_lowercase();
    if binding.is_empty() {
        return Err(RepeatError::hotkey("hotkey is empty"));
    }

    let mut modifiers = Modifiers::empty();
    let mut code = None;

    for part in binding.split('+').map(str::trim) {
        match part {
            "ctrl" | "control" => modifiers |= Modifiers::CONTROL,
            "alt" | "option" => modifiers |= Modifiers::ALT,
            "shift" => modifiers |= Modifiers::SHIFT,
            "meta" | "cmd" | "super" | "win" => modifiers |= Modifiers::SUPER,
            key => {
                if code.is_some() {
                    return Err(RepeatError::hotkey(format!(
                        "multiple keys specified in hotkey '{spec}'"
                    )));
                }
                let name = KeyName::parse(key)
                    .map_err(|e| RepeatError::hotkey(format!("in '{spec}': {e}")))?;
                code = Some(key_code(name)?);
            }
        }
    }

    let code = code.ok_or_else(|| RepeatError::hotkey(format!("no key specified in hotkey '{spec}'")))?;
    Ok(HotKey::new(Some(modifiers), code))
}

fn key_code(key: KeyName) -> Result<Code> {
    let code = match key {
        KeyName::Char(c) => return char_code(c),
        KeyName::Space => Code::Space,
        KeyName::Enter => Code::Enter,
        KeyName::Tab => Code::Tab,
        KeyName::Escape => Code::Escape,
        KeyName::Backspace => Code::Backspace,
        KeyName::Delete => Code::Delete,
        KeyName::Home => Code::Home,
        KeyName::End => Code::End,
        KeyName::PageUp => Code::PageUp,
        KeyName::PageDown => Code::PageDown,
        KeyName::Up => Code::ArrowUp,
        KeyName::Down => Code::ArrowDown,
        KeyName::Left => Code::ArrowLeft,
        KeyName::Right => Code::ArrowRight,
        KeyName::Function(n) => match n {
            1 => Code::F1,
            2 => Code::F2,
            3 => Code::F3,
            4 => Code::F4,
            5 => Code::F5,
            6 => Code::F6,
            7 => Code::F7,
            8 => Code::F8,
            9 => Code::F9,
            10 => Code::F10,
            11 => Code::F11,
            12 => Code::F12,
            _ => return Err(unsupported(key)),
        },
        KeyName::Shift | KeyName::Control | KeyName::Alt | KeyName::Meta | KeyName::CapsLock => {
            return Err(unsupported(key));
        }
    };
    Ok(code)
}

fn char_code(c: char) -> Result<Code> {
    const LETTERS: [Code; 26] = [
        Code::KeyA, Code::KeyB, Code::KeyC, Code::KeyD, Code::KeyE, Code::KeyF, Code::KeyG,
        Code::KeyH, Code::KeyI, Code::KeyJ, Code::KeyK, Code::KeyL, Code::KeyM, Code::KeyN,
        Code::KeyO, Code::KeyP, Code::KeyQ, Code::KeyR, Code::KeyS, Code::KeyT, Code::KeyU,
        Code::KeyV, Code::KeyW, Code::KeyX, Code::KeyY, Code::KeyZ,
    ];
    const DIGITS: [Code; 10] = [
        Code::Digit0, Code::Digit1, Code::Digit2, Code::Digit3, Code::Digit4,
        Code::Digit5, Code::Digit6, Code::Digit7, Code::Digit8, Code::Digit9,
    ];

    let c = c.to_ascii_lowercase();
    match c {
        'a'..='z' => Ok(LETTERS[(c as u8 - b'a') as usize]),
        '0'..='9' => Ok(DIGITS[(c as u8 - b'0') as usize]),
        _ => Err(unsupported(KeyName::Char(c))),
    }
}

fn unsupported(key: KeyName) -> RepeatError {
    RepeatError::hotkey(format!("'{key}' cannot be used as a hotkey"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_key() {
        assert_eq!(
            parse_hotkey("k").unwrap(),
            HotKey::new(Some(Modifiers::empty()), Code::KeyK)
        );
        assert_eq!(
            parse_hotkey("F8").unwrap(),
            HotKey::new(Some(Modifiers::empty()), Code::F8)
        );
    }

    #[test]
    fn test_parse_with_modifiers() {
        assert_eq!(
            parse_hotkey("ctrl+alt+r").unwrap(),
            HotKey::new(Some(Modifiers::CONTROL | Modifiers::ALT), Code::KeyR)
        );
        assert_eq!(
            parse_hotkey(" Shift + 5 ").unwrap(),
            HotKey::new(Some(Modifiers::SHIFT), Code::Digit5)
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_hotkey("").is_err());
        assert!(parse_hotkey("ctrl+alt").is_err());
        assert!(parse_hotkey("ctrl+a+b").is_err());
        assert!(parse_hotkey("ctrl+nonsense").is_err());
        assert!(parse_hotkey("ctrl+;").is_err());
    }
}
