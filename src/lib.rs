//! # Input Repeater
//!
//! Repeats a keystroke or mouse click at a fixed interval, for a fixed time or
//! until stopped, optionally aimed at a window picked by title.
//!
//! ## Features
//!
//! - Tap or hold (press, wait, release) on every repetition
//! - Start delay, bounded or unbounded duration
//! - Cooperative cancellation with bounded latency
//! - Two input backends: cross-platform virtual keys, or scan codes on Windows
//! - Target window activation, once or around every action
//! - CLI, interactive terminal form and a global start/stop hotkey
//!
//! ## Example
//!
//! ```no_run
//! use input_repeater::{Action, Capabilities, CancellationToken, KeyName, RunConfig};
//! use std::time::Duration;
//!
//! let mut config = RunConfig::new(Action::Key(KeyName::Space));
//! config.interval = Duration::from_millis(100);
//! config.duration = Duration::from_secs(2);
//! config.start_delay = Duration::ZERO;
//!
//! let token = CancellationToken::new();
//! let result = input_repeater::run(&config, &token, &Capabilities::detect()).unwrap();
//! println!("sent {} presses", result.action_count);
//! ```
//!
//! ## Presets
//!
//! The CLI can read starting values from a JSON file; durations are seconds or
//! strings with a unit:
//!
//! ```json
//! {
//!   "mode": "click",
//!   "button": "left",
//!   "interval": "50ms",
//!   "duration": 5,
//!   "start_delay": "1s"
//! }
//! ```

pub mod cancel;
pub mod capabilities;
pub mod cli;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod hotkey;
pub mod keys;
pub mod logging;
pub mod repeater;
pub mod sender;
pub mod tui;
pub mod waiter;
pub mod window;

pub use cancel::CancellationToken;
pub use capabilities::Capabilities;
pub use config::{Action, Backend, Mode, RunConfig};
pub use controller::RunController;
pub use error::{RepeatError, Result};
pub use hotkey::HotkeyToggle;
pub use keys::{KeyName, MouseButton};
pub use repeater::{run, Repeater, RunResult, Termination};
pub use waiter::Waiter;
pub use window::{WindowHandle, WindowTargeter};
