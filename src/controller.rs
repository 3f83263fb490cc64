//! Owns the single active run for an interactive front end.
//!
//! The worker thread never touches controller state. It reports back by
//! sending one [`RunEvent`] over a channel that the front end drains from its
//! own event loop.

use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cancel::CancellationToken;
use crate::capabilities::Capabilities;
use crate::config::RunConfig;
use crate::error::{RepeatError, Result};
use crate::repeater::{self, RunResult};

/// Executes one run to completion on the worker thread.
pub type Runner = Arc<dyn Fn(&RunConfig, &CancellationToken) -> Result<RunResult> + Send + Sync>;

/// Message posted by the worker when its run ends.
#[derive(Debug)]
pub enum RunEvent {
    Finished(Result<RunResult>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// A run was already active; nothing was changed.
    AlreadyRunning,
}

struct ActiveRun {
    token: CancellationToken,
    worker: JoinHandle<()>,
}

pub struct RunController {
    runner: Runner,
    active: Option<ActiveRun>,
    events_tx: Sender<RunEvent>,
    events_rx: Receiver<RunEvent>,
}

impl RunController {
    /// Controller that runs against the real input backend.
    pub fn native(caps: Capabilities) -> Self {
        Self::with_runner(Arc::new(move |config: &RunConfig, token: &CancellationToken| {
            repeater::run(config, token, &caps)
        }))
    }

    pub fn with_runner(runner: Runner) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            runner,
            active: None,
            events_tx,
            events_rx,
        }
    }

    /// Start `config` on a background worker with a fresh token.
    ///
    /// Configuration errors are returned here, synchronously. Starting while
    /// a run is active is a no-op.
    pub fn start(&mut self, config: RunConfig) -> Result<StartOutcome> {
        if self.is_running() {
            debug!("start ignored, a run is already active");
            return Ok(StartOutcome::AlreadyRunning);
        }
        config.validate()?;

        let token = CancellationToken::new();
        let worker_token = token.clone();
        let runner = Arc::clone(&self.runner);
        let events = self.events_tx.clone();

        let worker = thread::Builder::new()
            .name("repeat-worker".into())
            .spawn(move || {
                let result = runner(&config, &worker_token);
                if events.send(RunEvent::Finished(result)).is_err() {
                    warn!("controller dropped before run finished");
                }
            })?;

        info!("run started");
        self.active = Some(ActiveRun { token, worker });
        Ok(StartOutcome::Started)
    }

    /// Ask the active run to stop. Returns `false` if nothing was running
    /// or a stop was already requested.
    pub fn stop(&self) -> bool {
        match &self.active {
            Some(run) if !run.worker.is_finished() => run.token.cancel(),
            _ => false,
        }
    }

    /// Start if idle, stop if running. Returns `true` when a run was started.
    ///
    /// `config` is only evaluated when starting.
    pub fn toggle(&mut self, config: impl FnOnce() -> Result<RunConfig>) -> Result<bool> {
        if self.is_running() {
            self.stop();
            return Ok(false);
        }
        Ok(self.start(config()?)? == StartOutcome::Started)
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Whether the active run has been asked to stop but has not finished.
    pub fn is_stopping(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|run| run.token.is_cancelled())
    }

    /// Collect a finished run without blocking.
    pub fn try_recv(&mut self) -> Option<RunEvent> {
        if let Ok(event) = self.events_rx.try_recv() {
            self.reap();
            return Some(event);
        }
        let finished = self
            .active
            .as_ref()
            .is_some_and(|run| run.worker.is_finished());
        if !finished {
            return None;
        }
        // The worker sends before it exits, so an empty channel here means
        // it died without reporting.
        if let Ok(event) = self.events_rx.try_recv() {
            self.reap();
            return Some(event);
        }
        self.reap();
        Some(RunEvent::Finished(Err(RepeatError::Io(io::Error::other(
            "repeat worker exited without a result",
        )))))
    }

    /// Wait up to `timeout` for the active run to finish.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<RunEvent> {
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => {
                self.reap();
                Some(event)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    fn reap(&mut self) {
        if let Some(run) = self.active.take() {
            if run.worker.join().is_err() {
                warn!("repeat worker panicked");
            }
        }
    }
}

impl Drop for RunController {
    fn drop(&mut self) {
        if let Some(run) = &self.active {
            run.token.cancel();
        }
    }
}
