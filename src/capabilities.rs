//! Optional OS capabilities, probed once at startup.

use tracing::debug;

/// Which optional integrations this process can use.
///
/// Built once by [`Capabilities::detect`] and passed to whatever needs it;
/// nothing re-probes the environment while a run is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Scan-code injection ([`Backend::Alternate`](crate::config::Backend)).
    pub alternate_backend: bool,
    /// Window enumeration and activation.
    pub window_targeting: bool,
    /// System-wide hotkey registration.
    pub global_hotkeys: bool,
}

impl Capabilities {
    pub fn detect() -> Self {
        let caps = Self {
            alternate_backend: crate::sender::alternate_available(),
            window_targeting: crate::window::native_available(),
            global_hotkeys: hotkeys_available(),
        };
        debug!(?caps, "detected capabilities");
        caps
    }

    /// Nothing optional is available.
    pub fn none() -> Self {
        Self::default()
    }
}

#[cfg(any(windows, target_os = "macos"))]
fn hotkeys_available() -> bool {
    true
}

#[cfg(all(unix, not(target_os = "macos")))]
fn hotkeys_available() -> bool {
    // The hotkey crate needs an X display; Wayland-only sessions have none.
    std::env::var_os("DISPLAY").is_some_and(|d| !d.is_empty())
}

#[cfg(not(any(windows, unix)))]
fn hotkeys_available() -> bool {
    false
}
