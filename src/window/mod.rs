//! Finding and focusing the window a run is aimed at.

#[cfg(target_os = "linux")]
mod x11;
#[cfg(windows)]
mod win32;

#[cfg(target_os = "linux")]
pub use x11::X11Targeter;
#[cfg(windows)]
pub use win32::Win32Targeter;

use crate::error::{RepeatError, Result};

/// A window resolved once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowHandle {
    id: u64,
    title: String,
}

impl WindowHandle {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }

    /// Platform window identifier (X11 window id, `HWND` value).
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

/// Window enumeration and activation.
///
/// Implementors provide [`windows`](Self::windows) in the window manager's
/// own order plus [`activate`](Self::activate); lookup by title is shared.
pub trait WindowTargeter {
    /// Visible top-level windows as `(id, title)` pairs.
    fn windows(&self) -> Result<Vec<(u64, String)>>;

    /// Ask for `handle` to become the foreground window.
    fn activate(&self, handle: &WindowHandle) -> Result<()>;

    /// First window whose title contains `needle` (case-sensitive).
    fn resolve(&self, needle: &str) -> Result<WindowHandle> {
        first_match(self.windows()?, needle).ok_or_else(|| RepeatError::window_not_found(needle))
    }

    /// Non-blank titles, for pickers.
    fn titles(&self) -> Result<Vec<String>> {
        Ok(self
            .windows()?
            .into_iter()
            .map(|(_, title)| title)
            .filter(|title| !title.trim().is_empty())
            .collect())
    }
}

impl<T: WindowTargeter + ?Sized> WindowTargeter for Box<T> {
    fn windows(&self) -> Result<Vec<(u64, String)>> {
        (**self).windows()
    }

    fn activate(&self, handle: &WindowHandle) -> Result<()> {
        (**self).activate(handle)
    }
}

pub fn first_match(
    windows: impl IntoIterator<Item = (u64, String)>,
    needle: &str,
) -> Option<WindowHandle> {
    windows
        .into_iter()
        .find(|(_, title)| title.contains(needle))
        .map(|(id, title)| WindowHandle::new(id, title))
}

/// Connect to the platform's window system.
#[cfg(target_os = "linux")]
pub fn native_targeter() -> Result<Box<dyn WindowTargeter>> {
    Ok(Box::new(X11Targeter::connect()?))
}

#[cfg(windows)]
pub fn native_targeter() -> Result<Box<dyn WindowTargeter>> {
    Ok(Box::new(Win32Targeter::new()))
}

#[cfg(not(any(target_os = "linux", windows)))]
pub fn native_targeter() -> Result<Box<dyn WindowTargeter>> {
    Err(RepeatError::unsupported_platform(
        "window targeting is not available on this platform",
    ))
}

#[cfg(target_os = "linux")]
pub fn native_available() -> bool {
    X11Targeter::connect().is_ok()
}

#[cfg(windows)]
pub fn native_available() -> bool {
    true
}

#[cfg(not(any(target_os = "linux", windows)))]
pub fn native_available() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedWindows(Vec<(u64, String)>);

    impl WindowTargeter for FixedWindows {
        fn windows(&self) -> Result<Vec<(u64, String)>> {
            Ok(self.0.clone())
        }

        fn activate(&self, _handle: &WindowHandle) -> Result<()> {
            Ok(())
        }
    }

    fn sample() -> FixedWindows {
        FixedWindows(vec![
            (1, "Terminal".to_string()),
            (2, "   ".to_string()),
            (3, "Untitled - Notepad".to_string()),
            (4, "notes.txt - Notepad".to_string()),
        ])
    }

    #[test]
    fn test_first_match_wins() {
        let handle = sample().resolve("Notepad").unwrap();
        assert_eq!(handle.id(), 3);
        assert_eq!(handle.title(), "Untitled - Notepad");
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let err = sample().resolve("notepad").unwrap_err();
        assert!(matches!(err, RepeatError::WindowNotFound(ref t) if t == "notepad"));
        assert_eq!(sample().resolve("notes").unwrap().id(), 4);
    }

    #[test]
    fn test_titles_skip_blank() {
        let titles = sample().titles().unwrap();
        assert_eq!(titles.len(), 3);
        assert!(!titles.iter().any(|t| t.trim().is_empty()));
    }
}
