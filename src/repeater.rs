//! The timed repeat loop.
//!
//! [`Repeater::run`] sends one action per interval until the configured
//! duration elapses or its [`CancellationToken`] is set. It blocks the calling
//! thread; callers that need to stay responsive run it on a worker (see
//! [`RunController`](crate::controller::RunController)).
//!
//! Focus handling differs by action kind when `force_focus` is on: the target
//! window is activated *before* a key is sent, because keystrokes only matter
//! once the window has focus, but *after* a click is sent, because the click
//! itself may be what selects the target.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::cancel::CancellationToken;
use crate::capabilities::Capabilities;
use crate::config::{Action, RunConfig};
use crate::error::{RepeatError, Result};
use crate::sender::{ActionSender, InputBackend};
use crate::waiter::Waiter;
use crate::window::{self, WindowHandle, WindowTargeter};

/// Why a run stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "message", rename_all = "snake_case")]
pub enum Termination {
    DurationElapsed,
    Cancelled,
    /// An input event could not be sent; carries the error text.
    Error(String),
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DurationElapsed => f.write_str("duration elapsed"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::Error(message) => write!(f, "error: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub action_count: u64,
    pub terminated_by: Termination,
}

impl RunResult {
    pub fn new(action_count: u64, terminated_by: Termination) -> Self {
        Self {
            action_count,
            terminated_by,
        }
    }

    pub fn was_cancelled(&self) -> bool {
        self.terminated_by == Termination::Cancelled
    }
}

/// Drives an [`InputBackend`] on a fixed cadence.
pub struct Repeater {
    sender: Box<dyn InputBackend>,
    targeter: Option<Box<dyn WindowTargeter>>,
    waiter: Waiter,
}

impl Repeater {
    pub fn new(sender: Box<dyn InputBackend>, waiter: Waiter) -> Self {
        Self {
            sender,
            targeter: None,
            waiter,
        }
    }

    pub fn with_targeter(mut self, targeter: Box<dyn WindowTargeter>) -> Self {
        self.targeter = Some(targeter);
        self
    }

    /// Build a repeater from the platform's real backend and window system.
    ///
    /// Fails before anything is sent if `config` is invalid, the backend is
    /// unavailable, or a target window is requested without window support.
    pub fn native(config: &RunConfig, caps: &Capabilities) -> Result<Self> {
        config.validate()?;
        let sender = ActionSender::new(config.backend, caps)?;
        let repeater = Self::new(Box::new(sender), Waiter::system());
        if config.target_window.is_none() {
            return Ok(repeater);
        }
        if !caps.window_targeting {
            return Err(RepeatError::unsupported_platform(
                "window targeting needs an X11 session or Windows",
            ));
        }
        Ok(repeater.with_targeter(window::native_targeter()?))
    }

    pub fn run(&mut self, config: &RunConfig, token: &CancellationToken) -> Result<RunResult> {
        config.validate()?;
        let target = self.resolve_target(config)?;

        info!(run = %config.describe(), "starting run");

        if !config.start_delay.is_zero() {
            debug!(delay = ?config.start_delay, "waiting before first action");
            self.waiter.wait(config.start_delay, token);
            if token.is_cancelled() {
                info!("cancelled during start delay");
                return Ok(RunResult::new(0, Termination::Cancelled));
            }
        }

        if let (Some(handle), false) = (&target, config.force_focus) {
            self.activate(handle);
        }

        let deadline = (!config.is_unbounded()).then(|| self.waiter.now() + config.duration);
        let focus = target.as_ref().filter(|_| config.force_focus);
        let mut action_count: u64 = 0;

        let terminated_by = loop {
            if token.is_cancelled() {
                break Termination::Cancelled;
            }
            if deadline.is_some_and(|end| self.waiter.now() >= end) {
                break Termination::DurationElapsed;
            }

            if let Err(e) = self.perform(config, focus, token) {
                error!(error = %e, action_count, "sending input failed");
                break Termination::Error(e.to_string());
            }
            action_count += 1;
            debug!(action_count, "action sent");

            self.waiter.wait(config.interval, token);
        };

        info!(action_count, %terminated_by, "run finished");
        Ok(RunResult::new(action_count, terminated_by))
    }

    fn resolve_target(&self, config: &RunConfig) -> Result<Option<WindowHandle>> {
        let Some(title) = &config.target_window else {
            return Ok(None);
        };
        let targeter = self.targeter.as_ref().ok_or_else(|| {
            RepeatError::unsupported_platform("no window targeter configured")
        })?;
        let handle = targeter.resolve(title)?;
        debug!(id = handle.id(), title = handle.title(), "resolved target window");
        Ok(Some(handle))
    }

    /// One repetition: optional focus, then tap or hold.
    fn perform(
        &mut self,
        config: &RunConfig,
        focus: Option<&WindowHandle>,
        token: &CancellationToken,
    ) -> Result<()> {
        let action = &config.action;
        let focus_first = matches!(action, Action::Key(_));

        if focus_first {
            if let Some(handle) = focus {
                self.activate(handle);
            }
        }

        if config.hold.is_zero() {
            self.sender.tap(action)?;
        } else {
            self.hold(action, config.hold, token)?;
        }

        if !focus_first {
            if let Some(handle) = focus {
                self.activate(handle);
            }
        }
        Ok(())
    }

    /// Press, wait, release. The release is sent even if the wait was cut
    /// short by cancellation, so nothing is left held down.
    fn hold(&mut self, action: &Action, hold: Duration, token: &CancellationToken) -> Result<()> {
        self.sender.down(action)?;
        self.waiter.wait(hold, token);
        self.sender.up(action)
    }

    fn activate(&self, handle: &WindowHandle) {
        let Some(targeter) = &self.targeter else {
            return;
        };
        if let Err(e) = targeter.activate(handle) {
            warn!(title = handle.title(), error = %e, "could not focus target window");
        }
    }
}

/// Run `config` with the platform's real backend and a wall clock.
pub fn run(config: &RunConfig, token: &CancellationToken, caps: &Capabilities) -> Result<RunResult> {
    Repeater::native(config, caps)?.run(config, token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_termination_display() {
        assert_eq!(Termination::DurationElapsed.to_string(), "duration elapsed");
        assert_eq!(
            Termination::Error("boom".into()).to_string(),
            "error: boom"
        );
    }

    #[test]
    fn test_result_serializes() {
        let result = RunResult::new(4, Termination::Cancelled);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"action_count": 4, "terminated_by": {"reason": "cancelled"}})
        );
        assert!(result.was_cancelled());

        let failed = RunResult::new(1, Termination::Error("denied".into()));
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["terminated_by"]["message"], "denied");
    }

    #[test]
    fn test_native_rejects_invalid_config_first() {
        let mut config = RunConfig::new(Action::Key(crate::keys::KeyName::Space));
        config.interval = Duration::ZERO;
        config.backend = crate::config::Backend::Alternate;
        let err = Repeater::native(&config, &Capabilities::none()).err().unwrap();
        assert!(matches!(err, RepeatError::Configuration(_)));
    }
}
