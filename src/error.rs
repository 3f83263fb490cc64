//! Custom error types for input-repeater.
//!
//! Every failure a run can hit before its first action is one of these
//! variants. Cancellation is deliberately absent: a stopped run is a normal
//! [`Termination`](crate::repeater::Termination), not an error.

use std::io;
use thiserror::Error;

/// Main error type for input-repeater operations.
#[derive(Error, Debug)]
pub enum RepeatError {
    /// A numeric parameter or required field failed validation.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The specified key or mouse button is invalid or unsupported.
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// Error parsing a duration string.
    #[error("invalid duration '{value}': {reason}")]
    InvalidDuration { value: String, reason: String },

    /// No open window title contains the requested substring.
    #[error("no window found with title containing '{0}'")]
    WindowNotFound(String),

    /// The requested input backend cannot be used in this environment.
    #[error("input backend '{backend}' is unavailable: {reason}")]
    BackendUnavailable { backend: String, reason: String },

    /// Platform-specific operation is not supported.
    #[error("operation not supported on this platform: {0}")]
    UnsupportedPlatform(String),

    /// The OS rejected a synthesized input event.
    #[error("failed to send '{action}': {reason}")]
    Injection { action: String, reason: String },

    /// Error enumerating or focusing windows.
    #[error("window error: {0}")]
    Window(String),

    /// Error registering or handling hotkey.
    #[error("hotkey error: {0}")]
    Hotkey(String),

    /// Error reading or parsing a preset file.
    #[error("failed to load preset from '{path}': {reason}")]
    ConfigLoad { path: String, reason: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for input-repeater operations.
pub type Result<T> = std::result::Result<T, RepeatError>;

impl RepeatError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_duration(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDuration {
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn window_not_found(title: impl Into<String>) -> Self {
        Self::WindowNotFound(title.into())
    }

    pub fn backend_unavailable(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            backend: backend.into(),
            reason: reason.into(),
        }
    }

    pub fn unsupported_platform(message: impl Into<String>) -> Self {
        Self::UnsupportedPlatform(message.into())
    }

    pub fn injection(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Injection {
            action: action.into(),
            reason: reason.into(),
        }
    }

    pub fn window(message: impl Into<String>) -> Self {
        Self::Window(message.into())
    }

    pub fn hotkey(message: impl Into<String>) -> Self {
        Self::Hotkey(message.into())
    }

    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by user input rather than the environment.
    ///
    /// The CLI maps these to a distinct exit status.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::InvalidKey { .. }
                | Self::InvalidDuration { .. }
                | Self::ConfigLoad { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RepeatError::window_not_found("Notepad");
        assert_eq!(
            err.to_string(),
            "no window found with title containing 'Notepad'"
        );

        let err = RepeatError::invalid_key("xyz", "unknown key");
        assert_eq!(err.to_string(), "invalid key 'xyz': unknown key");

        let err = RepeatError::configuration("interval must be > 0");
        assert_eq!(err.to_string(), "configuration error: interval must be > 0");

        let err = RepeatError::backend_unavailable("alternate", "requires Windows");
        assert_eq!(
            err.to_string(),
            "input backend 'alternate' is unavailable: requires Windows"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: RepeatError = io_err.into();
        assert!(matches!(err, RepeatError::Io(_)));
        assert!(!err.is_usage_error());
    }

    #[test]
    fn test_usage_errors() {
        assert!(RepeatError::configuration("x").is_usage_error());
        assert!(RepeatError::invalid_duration("-1", "negative").is_usage_error());
        assert!(!RepeatError::window_not_found("x").is_usage_error());
        assert!(!RepeatError::backend_unavailable("alternate", "x").is_usage_error());
    }
}
