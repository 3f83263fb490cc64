use winapi::shared::minwindef::{BOOL, LPARAM, TRUE};
use winapi::shared::windef::HWND;
use winapi::um::winuser::{
    EnumWindows, GetWindowTextLengthW, GetWindowTextW, IsIconic, IsWindow, IsWindowVisible,
    SetForegroundWindow, ShowWindow, SW_RESTORE,
};

use super::{WindowHandle, WindowTargeter};
use crate::error::{RepeatError, Result};

/// Top-level window targeting through user32.
#[derive(Debug, Default)]
pub struct Win32Targeter;

impl Win32Targeter {
    pub fn new() -> Self {
        Self
    }
}

unsafe extern "system" fn collect_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let windows = &mut *(lparam as *mut Vec<(u64, String)>);
    if IsWindowVisible(hwnd) == 0 {
        return TRUE;
    }
    let len = GetWindowTextLengthW(hwnd);
    if len <= 0 {
        return TRUE;
    }
    let mut buf = vec![0u16; len as usize + 1];
    let copied = GetWindowTextW(hwnd, buf.as_mut_ptr(), buf.len() as i32);
    if copied > 0 {
        let title = String::from_utf16_lossy(&buf[..copied as usize]);
        windows.push((hwnd as usize as u64, title));
    }
    TRUE
}

impl WindowTargeter for Win32Targeter {
    fn windows(&self) -> Result<Vec<(u64, String)>> {
        let mut windows: Vec<(u64, String)> = Vec::new();
        let ok = unsafe {
            EnumWindows(
                Some(collect_window),
                &mut windows as *mut Vec<(u64, String)> as LPARAM,
            )
        };
        if ok == 0 {
            return Err(RepeatError::window(format!(
                "EnumWindows failed: {}",
                std::io::Error::last_os_error()
            )));
        }
        Ok(windows)
    }

    fn activate(&self, handle: &WindowHandle) -> Result<()> {
        let hwnd = handle.id() as usize as HWND;
        unsafe {
            if IsWindow(hwnd) == 0 {
                return Err(RepeatError::window(format!(
                    "window '{}' no longer exists",
                    handle.title()
                )));
            }
            if IsIconic(hwnd) != 0 {
                ShowWindow(hwnd, SW_RESTORE);
            }
            if SetForegroundWindow(hwnd) == 0 {
                return Err(RepeatError::window(format!(
                    "could not bring '{}' to the foreground",
                    handle.title()
                )));
            }
        }
        Ok(())
    }
}
