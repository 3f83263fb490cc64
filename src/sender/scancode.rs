//! Alternate backend: `SendInput` with hardware scan codes.
//!
//! Some games read raw scan codes and ignore virtual-key events; this
//! backend reaches them.

use std::mem;

use winapi::ctypes::c_int;
use winapi::shared::minwindef::{DWORD, WORD};
use winapi::um::winuser::{
    MapVirtualKeyW, SendInput, VkKeyScanW, INPUT, INPUT_KEYBOARD, INPUT_MOUSE,
    KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, KEYEVENTF_SCANCODE, MAPVK_VK_TO_VSC,
    MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP,
    MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP, VK_BACK, VK_CAPITAL, VK_CONTROL, VK_DELETE,
    VK_DOWN, VK_END, VK_ESCAPE, VK_F1, VK_HOME, VK_LEFT, VK_LWIN, VK_MENU, VK_NEXT, VK_PRIOR,
    VK_RETURN, VK_RIGHT, VK_SHIFT, VK_SPACE, VK_TAB, VK_UP,
};

use super::InputBackend;
use crate::config::Action;
use crate::error::{RepeatError, Result};
use crate::keys::{KeyName, MouseButton};

pub struct ScanCodeBackend;

impl ScanCodeBackend {
    pub fn new() -> Self {
        Self
    }

    fn key(&self, action: &Action, key: KeyName, release: bool) -> Result<()> {
        let vk = virtual_key(key).ok_or_else(|| {
            RepeatError::invalid_key(key.to_string(), "no scan code on this keyboard layout")
        })?;
        let main = key_input(scan_code(key, vk.code)?, vk.extended, release);
        if !vk.shifted {
            return send(action, &mut [main]);
        }

        // Characters that need Shift on this layout are wrapped in it.
        let shift = key_input(scan_code(KeyName::Shift, VK_SHIFT)?, false, release);
        let mut inputs = if release { [main, shift] } else { [shift, main] };
        send(action, &mut inputs)
    }

    fn mouse(&self, action: &Action, button: MouseButton, release: bool) -> Result<()> {
        let flags: DWORD = match (button, release) {
            (MouseButton::Left, false) => MOUSEEVENTF_LEFTDOWN,
            (MouseButton::Left, true) => MOUSEEVENTF_LEFTUP,
            (MouseButton::Right, false) => MOUSEEVENTF_RIGHTDOWN,
            (MouseButton::Right, true) => MOUSEEVENTF_RIGHTUP,
            (MouseButton::Middle, false) => MOUSEEVENTF_MIDDLEDOWN,
            (MouseButton::Middle, true) => MOUSEEVENTF_MIDDLEUP,
        };

        let mut input: INPUT = unsafe { mem::zeroed() };
        input.type_ = INPUT_MOUSE;
        unsafe {
            input.u.mi_mut().dwFlags = flags;
        }
        send(action, &mut [input])
    }

    fn event(&mut self, action: &Action, release: bool) -> Result<()> {
        match action {
            Action::Key(key) => self.key(action, *key, release),
            Action::Click(button) => self.mouse(action, *button, release),
        }
    }
}

impl Default for ScanCodeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBackend for ScanCodeBackend {
    fn down(&mut self, action: &Action) -> Result<()> {
        self.event(action, false)
    }

    fn up(&mut self, action: &Action) -> Result<()> {
        self.event(action, true)
    }

    fn tap(&mut self, action: &Action) -> Result<()> {
        self.event(action, false)?;
        self.event(action, true)
    }
}

fn scan_code(key: KeyName, vk: c_int) -> Result<WORD> {
    let scan = unsafe { MapVirtualKeyW(vk as u32, MAPVK_VK_TO_VSC) } as WORD;
    if scan == 0 {
        return Err(RepeatError::invalid_key(
            key.to_string(),
            "no scan code on this keyboard layout",
        ));
    }
    Ok(scan)
}

fn key_input(scan: WORD, extended: bool, release: bool) -> INPUT {
    let mut flags = KEYEVENTF_SCANCODE;
    if extended {
        flags |= KEYEVENTF_EXTENDEDKEY;
    }
    if release {
        flags |= KEYEVENTF_KEYUP;
    }

    let mut input: INPUT = unsafe { mem::zeroed() };
    input.type_ = INPUT_KEYBOARD;
    unsafe {
        let ki = input.u.ki_mut();
        ki.wScan = scan;
        ki.dwFlags = flags;
    }
    input
}

fn send(action: &Action, inputs: &mut [INPUT]) -> Result<()> {
    let count = inputs.len() as u32;
    let sent = unsafe { SendInput(count, inputs.as_mut_ptr(), mem::size_of::<INPUT>() as c_int) };
    if sent == count {
        Ok(())
    } else {
        Err(RepeatError::injection(
            action.to_string(),
            std::io::Error::last_os_error().to_string(),
        ))
    }
}

struct VirtualKey {
    code: c_int,
    /// Lives on the extended key block.
    extended: bool,
    /// Needs Shift held to produce the character.
    shifted: bool,
}

fn virtual_key(key: KeyName) -> Option<VirtualKey> {
    let (code, extended) = match key {
        KeyName::Space => (VK_SPACE, false),
        KeyName::Enter => (VK_RETURN, false),
        KeyName::Tab => (VK_TAB, false),
        KeyName::Escape => (VK_ESCAPE, false),
        KeyName::Backspace => (VK_BACK, false),
        KeyName::Delete => (VK_DELETE, true),
        KeyName::Home => (VK_HOME, true),
        KeyName::End => (VK_END, true),
        KeyName::PageUp => (VK_PRIOR, true),
        KeyName::PageDown => (VK_NEXT, true),
        KeyName::Up => (VK_UP, true),
        KeyName::Down => (VK_DOWN, true),
        KeyName::Left => (VK_LEFT, true),
        KeyName::Right => (VK_RIGHT, true),
        KeyName::Shift => (VK_SHIFT, false),
        KeyName::Control => (VK_CONTROL, false),
        KeyName::Alt => (VK_MENU, false),
        KeyName::Meta => (VK_LWIN, true),
        KeyName::CapsLock => (VK_CAPITAL, false),
        KeyName::Function(n) => (VK_F1 + c_int::from(n) - 1, false),
        KeyName::Char(c) => {
            let mut units = [0u16; 2];
            if c.encode_utf16(&mut units).len() != 1 {
                return None;
            }
            return split_key_scan(unsafe { VkKeyScanW(units[0]) });
        }
    };
    Some(VirtualKey {
        code,
        extended,
        shifted: false,
    })
}

/// Decode a `VkKeyScanW` result: low byte is the virtual key, bit 0x100 of
/// the high byte is Shift, -1 means the layout cannot type the character.
fn split_key_scan(scan: i16) -> Option<VirtualKey> {
    if scan == -1 {
        return None;
    }
    let bits = scan as u16;
    Some(VirtualKey {
        code: c_int::from(bits & 0xff),
        extended: false,
        shifted: bits & 0x100 != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_bit_is_kept() {
        // 'A' on a US layout: VK 0x41 with Shift.
        let upper = split_key_scan(0x0141).unwrap();
        assert_eq!(upper.code, 0x41);
        assert!(upper.shifted);

        let lower = split_key_scan(0x0041).unwrap();
        assert_eq!(lower.code, 0x41);
        assert!(!lower.shifted);

        assert!(split_key_scan(-1).is_none());
    }

    #[test]
    fn test_named_keys_never_shifted() {
        let up = virtual_key(KeyName::Up).unwrap();
        assert_eq!(up.code, VK_UP);
        assert!(up.extended);
        assert!(!up.shifted);
    }
}
