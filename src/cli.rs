//! Command-line arguments and their merge with an optional preset.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::{
    parse_duration, Action, Backend, Mode, Preset, RunConfig, DEFAULT_BUTTON, DEFAULT_DURATION,
    DEFAULT_INTERVAL, DEFAULT_START_DELAY,
};
use crate::error::{RepeatError, Result};
use crate::keys::{KeyName, MouseButton};

/// Repeat a key press or mouse click at a fixed interval.
///
/// Run without arguments to open the interactive form.
#[derive(Parser, Debug, Default, Clone)]
#[command(name = "irep", version, about, long_about = None)]
pub struct Cli {
    /// Open the interactive form even when other arguments are given
    #[arg(long)]
    pub gui: bool,

    /// Send key presses or mouse clicks [default: key]
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Key to press, e.g. space, a, enter, f5 (required in key mode)
    #[arg(long)]
    pub key: Option<String>,

    /// Mouse button for click mode: left, right or middle [default: left]
    #[arg(long)]
    pub button: Option<String>,

    /// Time between actions, e.g. 0.2, 200ms, 1s [default: 0.2]
    #[arg(long, value_parser = parse_duration)]
    pub interval: Option<Duration>,

    /// How long to run; 0 runs until Ctrl+C [default: 10]
    #[arg(long, value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Delay before the first action, to focus the target [default: 3]
    #[arg(long, value_parser = parse_duration)]
    pub start_delay: Option<Duration>,

    /// Hold each press this long; 0 taps [default: 0]
    #[arg(long, value_parser = parse_duration)]
    pub hold: Option<Duration>,

    /// Input backend [default: primary]
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Substring of the target window's title (case-sensitive)
    #[arg(long)]
    pub target_window: Option<String>,

    /// Re-activate the target window around every action
    #[arg(long)]
    pub force_focus: bool,

    /// Read starting values from a JSON preset; flags override it
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// List open window titles and exit
    #[arg(long)]
    pub list_windows: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Whether to open the form: no arguments at all, or an explicit `--gui`.
    pub fn wants_gui(&self, arg_count: usize) -> bool {
        arg_count == 0 || self.gui
    }

    /// Load the preset, if any, and build the run configuration.
    pub fn run_config(&self) -> Result<RunConfig> {
        let preset = match &self.config {
            Some(path) => Preset::from_file(path)?,
            None => Preset::default(),
        };
        self.merge(preset)
    }

    /// Flags win over preset values, which win over defaults.
    pub fn merge(&self, preset: Preset) -> Result<RunConfig> {
        let mode = self.mode.or(preset.mode).unwrap_or_default();
        let action = match mode {
            Mode::Key => {
                let key = self.key.clone().or(preset.key).ok_or_else(|| {
                    RepeatError::configuration(
                        "--key is required in key mode. Omit arguments to open the form.",
                    )
                })?;
                Action::Key(KeyName::parse(&key)?)
            }
            Mode::Click => {
                let button = match self.button.clone().or(preset.button) {
                    Some(name) => MouseButton::parse(&name)?,
                    None => DEFAULT_BUTTON,
                };
                Action::Click(button)
            }
        };

        let target_window = self
            .target_window
            .clone()
            .or(preset.target_window)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let config = RunConfig {
            action,
            interval: self.interval.or(preset.interval).unwrap_or(DEFAULT_INTERVAL),
            duration: self.duration.or(preset.duration).unwrap_or(DEFAULT_DURATION),
            start_delay: self
                .start_delay
                .or(preset.start_delay)
                .unwrap_or(DEFAULT_START_DELAY),
            hold: self.hold.or(preset.hold).unwrap_or(Duration::ZERO),
            backend: self.backend.or(preset.backend).unwrap_or_default(),
            target_window,
            force_focus: self.force_focus || preset.force_focus.unwrap_or(false),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("irep").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_gui_selection() {
        assert!(parse(&[]).wants_gui(0));
        assert!(!parse(&["--key", "a"]).wants_gui(2));
        assert!(parse(&["--key", "a", "--gui"]).wants_gui(3));
    }

    #[test]
    fn test_key_mode_requires_key() {
        let err = parse(&["--interval", "0.1"]).run_config().unwrap_err();
        assert!(matches!(err, RepeatError::Configuration(_)));
        assert!(err.to_string().contains("--key is required"));
    }

    #[test]
    fn test_defaults_applied() {
        let config = parse(&["--key", "space"]).run_config().unwrap();
        assert_eq!(config.action, Action::Key(KeyName::Space));
        assert_eq!(config.interval, DEFAULT_INTERVAL);
        assert_eq!(config.duration, DEFAULT_DURATION);
        assert_eq!(config.start_delay, DEFAULT_START_DELAY);
        assert_eq!(config.hold, Duration::ZERO);
        assert_eq!(config.backend, Backend::Primary);
        assert!(!config.force_focus);
    }

    #[test]
    fn test_click_mode_flags() {
        let config = parse(&[
            "--mode",
            "click",
            "--button",
            "right",
            "--interval",
            "50ms",
            "--duration",
            "0",
            "--hold",
            "0.01",
            "--backend",
            "alternate",
            "--target-window",
            "  Game  ",
            "--force-focus",
        ])
        .run_config()
        .unwrap();
        assert_eq!(config.action, Action::Click(MouseButton::Right));
        assert_eq!(config.interval, Duration::from_millis(50));
        assert!(config.is_unbounded());
        assert_eq!(config.hold, Duration::from_millis(10));
        assert_eq!(config.backend, Backend::Alternate);
        assert_eq!(config.target_window.as_deref(), Some("Game"));
        assert!(config.force_focus);
    }

    #[test]
    fn test_bad_values_rejected() {
        assert!(Cli::try_parse_from(["irep", "--interval", "-1"]).is_err());
        assert!(Cli::try_parse_from(["irep", "--backend", "turbo"]).is_err());
        assert!(parse(&["--key", "a", "--interval", "0"]).run_config().is_err());
        assert!(parse(&["--key", "not-a-key"]).run_config().is_err());
        assert!(parse(&["--mode", "click", "--button", ""]).run_config().is_err());
    }

    #[test]
    fn test_flags_override_preset() {
        let preset = Preset {
            mode: Some(Mode::Key),
            key: Some("enter".into()),
            interval: Some(Duration::from_secs(1)),
            hold: Some(Duration::from_millis(100)),
            target_window: Some("  ".into()),
            ..Preset::default()
        };
        let cli = parse(&["--interval", "0.5"]);
        let config = cli.merge(preset).unwrap();
        assert_eq!(config.action, Action::Key(KeyName::Enter));
        assert_eq!(config.interval, Duration::from_millis(500));
        assert_eq!(config.hold, Duration::from_millis(100));
        // A blank title means no target.
        assert_eq!(config.target_window, None);
    }
}
