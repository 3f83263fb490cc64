//! Run configuration, duration parsing and read-only JSON presets.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{RepeatError, Result};
use crate::keys::{KeyName, MouseButton};

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(200);
pub const DEFAULT_DURATION: Duration = Duration::from_secs(10);
pub const DEFAULT_START_DELAY: Duration = Duration::from_secs(3);
pub const DEFAULT_BUTTON: MouseButton = MouseButton::Left;
pub const DEFAULT_HOTKEY: &str = "ctrl+alt+k";

/// What a single repetition does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Key(KeyName),
    Click(MouseButton),
}

impl Action {
    pub fn mode(&self) -> Mode {
        match self {
            Self::Key(_) => Mode::Key,
            Self::Click(_) => Mode::Click,
        }
    }

    /// The bare key or button name.
    pub fn target(&self) -> String {
        match self {
            Self::Key(key) => key.to_string(),
            Self::Click(button) => button.to_string(),
        }
    }

    /// Plural noun used in summaries ("presses", "clicks").
    pub fn noun(&self) -> &'static str {
        match self {
            Self::Key(_) => "presses",
            Self::Click(_) => "clicks",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{key}"),
            Self::Click(button) => write!(f, "{button} click"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Key,
    Click,
}

/// Which input-injection mechanism sends the events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Cross-platform virtual-key injection.
    #[default]
    Primary,
    /// Hardware scan-code injection (Windows only). Reaches some
    /// applications that ignore virtual-key events.
    Alternate,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Primary => "primary",
            Self::Alternate => "alternate",
        })
    }
}

/// Everything one run needs. Built once, then only borrowed by the loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfig {
    pub action: Action,
    #[serde(with = "secs")]
    pub interval: Duration,
    /// Zero means run until cancelled.
    #[serde(with = "secs")]
    pub duration: Duration,
    #[serde(with = "secs")]
    pub start_delay: Duration,
    /// Zero means tap; otherwise press, wait this long, release.
    #[serde(with = "secs")]
    pub hold: Duration,
    pub backend: Backend,
    pub target_window: Option<String>,
    pub force_focus: bool,
}

impl RunConfig {
    /// A config with the tool's default timings for `action`.
    pub fn new(action: Action) -> Self {
        Self {
            action,
            interval: DEFAULT_INTERVAL,
            duration: DEFAULT_DURATION,
            start_delay: DEFAULT_START_DELAY,
            hold: Duration::ZERO,
            backend: Backend::Primary,
            target_window: None,
            force_focus: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(RepeatError::configuration("interval must be > 0"));
        }
        if let Some(title) = &self.target_window {
            if title.is_empty() {
                return Err(RepeatError::configuration(
                    "target window title cannot be empty",
                ));
            }
        }
        Ok(())
    }

    pub fn is_unbounded(&self) -> bool {
        self.duration.is_zero()
    }

    /// One-line description used in status lines and logs.
    pub fn describe(&self) -> String {
        let span = if self.is_unbounded() {
            "until stopped".to_string()
        } else {
            format!("for {}", format_duration(self.duration))
        };
        format!(
            "{} '{}' every {} {} via {}",
            match self.action.mode() {
                Mode::Key => "key",
                Mode::Click => "click",
            },
            self.action.target(),
            format_duration(self.interval),
            span,
            self.backend
        )
    }
}

/// Parse a duration such as `0.2`, `250ms`, `1.5s` or `2m`.
///
/// Bare numbers are seconds. Units are case-insensitive and surrounding
/// whitespace is ignored. Negative and non-finite values are rejected.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let value = input.trim().to_lowercase();
    if value.is_empty() {
        return Err(RepeatError::invalid_duration(input, "empty value"));
    }

    let (number, scale) = if let Some(n) = value.strip_suffix("ms") {
        (n, 0.001)
    } else if let Some(n) = value.strip_suffix('s') {
        (n, 1.0)
    } else if let Some(n) = value.strip_suffix('m') {
        (n, 60.0)
    } else {
        (value.as_str(), 1.0)
    };

    let amount: f64 = number
        .trim()
        .parse()
        .map_err(|_| RepeatError::invalid_duration(input, "expected a number with optional ms/s/m unit"))?;

    seconds_to_duration(amount * scale)
        .ok_or_else(|| RepeatError::invalid_duration(input, "must be a finite value >= 0"))
}

fn seconds_to_duration(secs: f64) -> Option<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    let nanos = (secs * 1e9).round();
    if nanos > u64::MAX as f64 {
        return None;
    }
    Some(Duration::from_nanos(nanos as u64))
}

/// Render a duration as seconds without trailing zeros (`0.2s`, `10s`).
pub fn format_duration(duration: Duration) -> String {
    let text = format!("{:.3}", duration.as_secs_f64());
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{text}s")
}

mod secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }
}

/// A duration in a preset: either a number of seconds or a string with unit.
fn de_opt_duration<'de, D>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Seconds(secs)) => seconds_to_duration(secs)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid duration {secs}"))),
        Some(Raw::Text(text)) => parse_duration(&text)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Optional starting values for the CLI, read from a JSON file.
///
/// Every field may be omitted. Presets are only ever read.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Preset {
    #[serde(default)]
    pub mode: Option<Mode>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub button: Option<String>,
    #[serde(default, deserialize_with = "de_opt_duration")]
    pub interval: Option<Duration>,
    #[serde(default, deserialize_with = "de_opt_duration")]
    pub duration: Option<Duration>,
    #[serde(default, deserialize_with = "de_opt_duration")]
    pub start_delay: Option<Duration>,
    #[serde(default, deserialize_with = "de_opt_duration")]
    pub hold: Option<Duration>,
    #[serde(default)]
    pub backend: Option<Backend>,
    #[serde(default)]
    pub target_window: Option<String>,
    #[serde(default)]
    pub force_focus: Option<bool>,
}

impl Preset {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| RepeatError::config_load(path.display().to_string(), e.to_string()))?;
        Self::from_json(&content)
            .map_err(|e| RepeatError::config_load(path.display().to_string(), e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_config() -> RunConfig {
        RunConfig::new(Action::Key(KeyName::Space))
    }

    #[test]
    fn test_defaults() {
        let config = key_config();
        assert_eq!(config.interval, Duration::from_millis(200));
        assert_eq!(config.duration, Duration::from_secs(10));
        assert_eq!(config.start_delay, Duration::from_secs(3));
        assert_eq!(config.hold, Duration::ZERO);
        assert_eq!(config.backend, Backend::Primary);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut config = key_config();
        config.interval = Duration::ZERO;
        assert!(matches!(
            config.validate(),
            Err(RepeatError::Configuration(_))
        ));

        let mut config = key_config();
        config.target_window = Some(String::new());
        assert!(config.validate().is_err());

        // Unbounded runs and long holds are legal.
        let mut config = key_config();
        config.duration = Duration::ZERO;
        config.hold = Duration::from_secs(5);
        assert!(config.validate().is_ok());
        assert!(config.is_unbounded());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("0.2").unwrap(), Duration::from_millis(200));
        assert_eq!(parse_duration("0.1").unwrap(), Duration::from_millis(100));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("5S").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration(" 2m ").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);

        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("10x").is_err());
        assert!(parse_duration("-1").is_err());
        assert!(parse_duration("inf").is_err());
        assert!(parse_duration("NaN").is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(200)), "0.2s");
        assert_eq!(format_duration(Duration::from_secs(10)), "10s");
        assert_eq!(format_duration(Duration::from_millis(1250)), "1.25s");
    }

    #[test]
    fn test_describe() {
        let mut config = RunConfig::new(Action::Click(MouseButton::Left));
        config.duration = Duration::ZERO;
        assert_eq!(
            config.describe(),
            "click 'left' every 0.2s until stopped via primary"
        );
        assert_eq!(
            key_config().describe(),
            "key 'space' every 0.2s for 10s via primary"
        );
    }

    #[test]
    fn test_preset_mixed_duration_formats() {
        let json = r#"
        {
            "mode": "click",
            "button": "right",
            "interval": 0.05,
            "duration": "5s",
            "start_delay": "500ms",
            "backend": "alternate",
            "force_focus": true
        }
        "#;

        let preset = Preset::from_json(json).unwrap();
        assert_eq!(preset.mode, Some(Mode::Click));
        assert_eq!(preset.button.as_deref(), Some("right"));
        assert_eq!(preset.interval, Some(Duration::from_millis(50)));
        assert_eq!(preset.duration, Some(Duration::from_secs(5)));
        assert_eq!(preset.start_delay, Some(Duration::from_millis(500)));
        assert_eq!(preset.hold, None);
        assert_eq!(preset.backend, Some(Backend::Alternate));
        assert_eq!(preset.force_focus, Some(true));
    }

    #[test]
    fn test_preset_rejects_unknown_fields_and_bad_durations() {
        assert!(matches!(
            Preset::from_json(r#"{"speed": 3}"#),
            Err(RepeatError::Json(_))
        ));
        assert!(Preset::from_json(r#"{"interval": -1}"#).is_err());
        assert!(Preset::from_json(r#"{"hold": "soon"}"#).is_err());
        assert_eq!(Preset::from_json("{}").unwrap(), Preset::default());
    }

    #[test]
    fn test_run_config_serializes_seconds() {
        let value = serde_json::to_value(key_config()).unwrap();
        assert_eq!(value["interval"], serde_json::json!(0.2));
        assert_eq!(value["action"], serde_json::json!({"key": "space"}));
        assert_eq!(value["backend"], serde_json::json!("primary"));
    }
}
