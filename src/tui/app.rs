use std::sync::mpsc::Receiver;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};

use crate::capabilities::Capabilities;
use crate::config::{
    format_duration, parse_duration, Action, Backend, Mode, RunConfig, DEFAULT_BUTTON,
    DEFAULT_DURATION, DEFAULT_HOTKEY, DEFAULT_INTERVAL, DEFAULT_START_DELAY,
};
use crate::controller::{RunController, RunEvent, StartOutcome};
use crate::error::{RepeatError, Result};
use crate::hotkey::{HotkeyPressed, HotkeyToggle};
use crate::keys::{KeyName, MouseButton};
use crate::repeater::{RunResult, Termination};
use crate::window::WindowTargeter;

/// Focusable rows of the form, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Mode,
    Key,
    Button,
    Interval,
    Duration,
    StartDelay,
    Hold,
    Backend,
    TargetWindow,
    ForceFocus,
    Hotkey,
    TestPad,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::Mode,
        Field::Key,
        Field::Button,
        Field::Interval,
        Field::Duration,
        Field::StartDelay,
        Field::Hold,
        Field::Backend,
        Field::TargetWindow,
        Field::ForceFocus,
        Field::Hotkey,
        Field::TestPad,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::Mode => "Mode",
            Field::Key => "Key (space, a, enter)",
            Field::Button => "Mouse button",
            Field::Interval => "Interval seconds",
            Field::Duration => "Duration (0 = until Stop)",
            Field::StartDelay => "Start delay seconds",
            Field::Hold => "Hold seconds (0 = tap)",
            Field::Backend => "Send method",
            Field::TargetWindow => "Target window",
            Field::ForceFocus => "Force focus each action",
            Field::Hotkey => "Start/Stop hotkey",
            Field::TestPad => "Test pad",
        }
    }

    fn index(self) -> usize {
        Field::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }
}

/// Raw text of the form. Nothing here is validated until Start.
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub mode: Mode,
    pub key: String,
    pub button: String,
    pub interval: String,
    pub duration: String,
    pub start_delay: String,
    pub hold: String,
    pub backend: Backend,
    pub target_window: String,
    pub force_focus: bool,
    pub hotkey: String,
}

impl Default for Form {
    fn default() -> Self {
        Self {
            mode: Mode::Key,
            key: KeyName::Space.to_string(),
            button: DEFAULT_BUTTON.to_string(),
            interval: secs_text(DEFAULT_INTERVAL),
            duration: secs_text(DEFAULT_DURATION),
            start_delay: secs_text(DEFAULT_START_DELAY),
            hold: "0".to_string(),
            backend: Backend::Primary,
            target_window: String::new(),
            force_focus: false,
            hotkey: DEFAULT_HOTKEY.to_string(),
        }
    }
}

fn secs_text(duration: std::time::Duration) -> String {
    format_duration(duration).trim_end_matches('s').to_string()
}

impl Form {
    pub fn to_config(&self) -> Result<RunConfig> {
        let action = match self.mode {
            Mode::Key => {
                if self.key.trim().is_empty() && !self.key.contains(' ') {
                    return Err(RepeatError::configuration("Key cannot be empty."));
                }
                Action::Key(KeyName::parse(&self.key)?)
            }
            Mode::Click => {
                if self.button.trim().is_empty() {
                    return Err(RepeatError::configuration(
                        "Mouse button cannot be empty (left/right/middle).",
                    ));
                }
                Action::Click(MouseButton::parse(&self.button)?)
            }
        };

        let target = self.target_window.trim();
        let config = RunConfig {
            action,
            interval: parse_duration(&self.interval)?,
            duration: parse_duration(&self.duration)?,
            start_delay: parse_duration(&self.start_delay)?,
            hold: parse_duration(&self.hold)?,
            backend: self.backend,
            target_window: (!target.is_empty()).then(|| target.to_string()),
            force_focus: self.force_focus,
        };
        config.validate()?;
        Ok(config)
    }

    fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::Key => Some(&mut self.key),
            Field::Button => Some(&mut self.button),
            Field::Interval => Some(&mut self.interval),
            Field::Duration => Some(&mut self.duration),
            Field::StartDelay => Some(&mut self.start_delay),
            Field::Hold => Some(&mut self.hold),
            Field::TargetWindow => Some(&mut self.target_window),
            Field::Hotkey => Some(&mut self.hotkey),
            Field::Mode | Field::Backend | Field::ForceFocus | Field::TestPad => None,
        }
    }
}

pub struct App {
    pub form: Form,
    pub focus: Field,
    pub test_pad: String,
    pub status: String,
    pub windows: Vec<String>,
    pub should_quit: bool,
    pub caps: Capabilities,
    window_pick: Option<usize>,
    controller: RunController,
    targeter: Option<Box<dyn WindowTargeter>>,
    hotkey: Option<HotkeyToggle>,
    hotkey_rx: Option<Receiver<HotkeyPressed>>,
    last_config: Option<RunConfig>,
}

impl App {
    pub fn new(
        controller: RunController,
        caps: Capabilities,
        targeter: Option<Box<dyn WindowTargeter>>,
    ) -> Self {
        let mut app = Self {
            form: Form::default(),
            focus: Field::Mode,
            test_pad: String::new(),
            status: "Idle".to_string(),
            windows: Vec::new(),
            should_quit: false,
            caps,
            window_pick: None,
            controller,
            targeter,
            hotkey: None,
            hotkey_rx: None,
            last_config: None,
        };
        app.refresh_windows();
        app
    }

    /// Attach the global hotkey and register the form's current binding.
    pub fn attach_hotkey(&mut self, hotkey: HotkeyToggle, presses: Receiver<HotkeyPressed>) {
        self.hotkey = Some(hotkey);
        self.hotkey_rx = Some(presses);
        self.apply_hotkey();
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    pub fn can_start(&self) -> bool {
        !self.controller.is_running()
    }

    pub fn can_stop(&self) -> bool {
        self.controller.is_running() && !self.controller.is_stopping()
    }

    pub fn hotkey_active(&self) -> Option<&str> {
        self.hotkey.as_ref().and_then(HotkeyToggle::current)
    }

    // -- Focus and editing --

    pub fn next_field(&mut self) {
        let i = self.focus.index();
        self.focus = Field::ALL[(i + 1) % Field::ALL.len()];
    }

    pub fn prev_field(&mut self) {
        let i = self.focus.index();
        self.focus = Field::ALL[(i + Field::ALL.len() - 1) % Field::ALL.len()];
    }

    /// A field is editable unless it belongs to the other mode.
    pub fn field_enabled(&self, field: Field) -> bool {
        match field {
            Field::Key => self.form.mode == Mode::Key,
            Field::Button => self.form.mode == Mode::Click,
            _ => true,
        }
    }

    /// Route a key press. While the test pad has focus every unmodified key
    /// is pad input, so repeated keys cannot drive the form; only Ctrl
    /// chords stay bound.
    pub fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('q') | KeyCode::Char('c') => self.quit(),
                KeyCode::Char('l') => self.clear_test_pad(),
                KeyCode::Char('x') if self.focus == Field::TestPad => self.focus = Field::Mode,
                _ => {}
            }
            return;
        }

        if self.focus == Field::TestPad {
            self.pad_key(key);
            return;
        }

        match key.code {
            KeyCode::F(5) => self.start(),
            KeyCode::F(6) | KeyCode::Esc => self.stop(),
            KeyCode::F(9) => self.refresh_windows(),
            KeyCode::Tab | KeyCode::Down => self.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.prev_field(),
            KeyCode::Left => self.cycle(false),
            KeyCode::Right => self.cycle(true),
            KeyCode::Enter => self.enter(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Char(c) => self.input_char(c),
            _ => {}
        }
    }

    fn pad_key(&mut self, key: KeyEvent) {
        if key
            .modifiers
            .intersects(KeyModifiers::ALT | KeyModifiers::SUPER | KeyModifiers::META)
        {
            return;
        }
        match key.code {
            KeyCode::Char(c) => self.test_pad.push(c),
            KeyCode::Enter => self.test_pad.push('\n'),
            KeyCode::Tab => self.test_pad.push('\t'),
            KeyCode::Backspace => {
                self.test_pad.pop();
            }
            _ => {}
        }
    }

    pub fn input_char(&mut self, c: char) {
        match self.focus {
            Field::TestPad => self.test_pad.push(c),
            Field::Mode | Field::Backend | Field::ForceFocus if c == ' ' => self.cycle(true),
            field if self.field_enabled(field) => {
                if let Some(text) = self.form.text_mut(field) {
                    text.push(c);
                }
            }
            _ => {}
        }
    }

    pub fn backspace(&mut self) {
        let focus = self.focus;
        if focus == Field::TestPad {
            self.test_pad.pop();
        } else if self.field_enabled(focus) {
            if let Some(text) = self.form.text_mut(focus) {
                text.pop();
            }
        }
    }

    /// Enter: newline in the pad, apply on the hotkey row, next row elsewhere.
    pub fn enter(&mut self) {
        match self.focus {
            Field::TestPad => self.test_pad.push('\n'),
            Field::Hotkey => self.apply_hotkey(),
            _ => self.next_field(),
        }
    }

    pub fn clear_test_pad(&mut self) {
        self.test_pad.clear();
    }

    /// Left/right on choice rows; on the target row, step through open windows.
    pub fn cycle(&mut self, forward: bool) {
        match self.focus {
            Field::Mode => {
                self.form.mode = match self.form.mode {
                    Mode::Key => Mode::Click,
                    Mode::Click => Mode::Key,
                };
            }
            Field::Backend => {
                self.form.backend = match self.form.backend {
                    Backend::Primary if self.caps.alternate_backend => Backend::Alternate,
                    _ => Backend::Primary,
                };
            }
            Field::ForceFocus => self.form.force_focus = !self.form.force_focus,
            Field::TargetWindow => self.pick_window(forward),
            _ => {}
        }
    }

    fn pick_window(&mut self, forward: bool) {
        if self.windows.is_empty() {
            return;
        }
        let len = self.windows.len();
        let next = match (self.window_pick, forward) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
        };
        self.window_pick = Some(next);
        self.form.target_window = self.windows[next].clone();
    }

    pub fn refresh_windows(&mut self) {
        self.window_pick = None;
        let Some(targeter) = &self.targeter else {
            self.windows.clear();
            return;
        };
        match targeter.titles() {
            Ok(titles) => self.windows = titles,
            Err(e) => {
                warn!(error = %e, "window list refresh failed");
                self.windows.clear();
                self.status = format!("Window list unavailable: {e}");
            }
        }
    }

    // -- Run control --

    pub fn start(&mut self) {
        let config = match self.form.to_config() {
            Ok(config) => config,
            Err(e) => {
                self.status = format!("Invalid input: {e}");
                return;
            }
        };
        let description = config.describe();
        match self.controller.start(config.clone()) {
            Ok(StartOutcome::Started) => {
                self.status = format!("Running {description}");
                self.last_config = Some(config);
            }
            Ok(StartOutcome::AlreadyRunning) => {}
            Err(e) => self.status = format!("Invalid input: {e}"),
        }
    }

    pub fn stop(&mut self) {
        if self.controller.stop() {
            self.status = "Stopping...".to_string();
        }
    }

    pub fn toggle_run(&mut self) {
        if self.controller.is_running() {
            self.stop();
        } else {
            self.start();
        }
    }

    pub fn apply_hotkey(&mut self) {
        let Some(hotkey) = self.hotkey.as_mut() else {
            self.status = if self.caps.global_hotkeys {
                "Global hotkey could not be initialised".to_string()
            } else {
                "Global hotkeys are not available in this session".to_string()
            };
            return;
        };
        let spec = self.form.hotkey.trim().to_string();
        if spec.is_empty() {
            hotkey.unregister();
            self.status = "Hotkey not set".to_string();
            return;
        }
        self.status = match hotkey.register(&spec) {
            Ok(()) => format!("Hotkey '{spec}' toggles start/stop"),
            Err(e) => format!("Hotkey failed: {e}"),
        };
    }

    /// Drain worker results and hotkey presses. Called once per UI frame.
    /// Finished runs are collected before presses are handled.
    pub fn tick(&mut self) {
        while let Some(RunEvent::Finished(result)) = self.controller.try_recv() {
            self.finish(result);
        }

        let presses = self
            .hotkey_rx
            .as_ref()
            .map(|rx| rx.try_iter().count())
            .unwrap_or(0);
        for _ in 0..presses {
            self.toggle_run();
        }
    }

    fn finish(&mut self, result: Result<RunResult>) {
        let config = self.last_config.take();
        self.status = match (result, config) {
            (Ok(result), Some(config)) => summary(&result, &config.action),
            (Ok(result), None) => format!("Finished after {} actions.", result.action_count),
            (Err(e), _) => format!("Error: {e}"),
        };
        info!(status = %self.status, "run ended");
    }

    pub fn quit(&mut self) {
        self.controller.stop();
        self.should_quit = true;
    }
}

fn summary(result: &RunResult, action: &Action) -> String {
    match &result.terminated_by {
        Termination::DurationElapsed => format!(
            "Finished. Sent {} {} of '{}'.",
            result.action_count,
            action.noun(),
            action.target()
        ),
        Termination::Cancelled => format!(
            "Stopped. Sent {} {} of '{}'.",
            result.action_count,
            action.noun(),
            action.target()
        ),
        Termination::Error(message) => format!(
            "Error after {} {}: {message}",
            result.action_count,
            action.noun()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancellationToken;
    use crate::window::WindowHandle;
    use std::sync::Arc;
    use std::time::Duration;

    fn idle_controller() -> RunController {
        RunController::with_runner(Arc::new(|_: &RunConfig, token: &CancellationToken| {
            while !token.is_cancelled() {
                std::thread::sleep(Duration::from_millis(5));
            }
            Ok(RunResult::new(3, Termination::Cancelled))
        }))
    }

    struct TwoWindows;

    impl WindowTargeter for TwoWindows {
        fn windows(&self) -> Result<Vec<(u64, String)>> {
            Ok(vec![(1, "Editor".into()), (2, "Game".into())])
        }

        fn activate(&self, _handle: &WindowHandle) -> Result<()> {
            Ok(())
        }
    }

    fn app() -> App {
        App::new(idle_controller(), Capabilities::none(), Some(Box::new(TwoWindows)))
    }

    fn wait_until_idle(app: &mut App) {
        for _ in 0..400 {
            app.tick();
            if !app.is_running() {
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("run did not finish");
    }

    #[test]
    fn test_default_form_is_valid() {
        let config = Form::default().to_config().unwrap();
        assert_eq!(config.action, Action::Key(KeyName::Space));
        assert_eq!(config.interval, DEFAULT_INTERVAL);
        assert_eq!(config.duration, DEFAULT_DURATION);
        assert_eq!(config.start_delay, DEFAULT_START_DELAY);
    }

    #[test]
    fn test_form_validation_messages() {
        let mut form = Form {
            key: String::new(),
            ..Form::default()
        };
        assert!(form.to_config().unwrap_err().to_string().contains("Key cannot be empty"));

        form.mode = Mode::Click;
        form.button = "  ".into();
        assert!(form
            .to_config()
            .unwrap_err()
            .to_string()
            .contains("Mouse button cannot be empty"));

        form.button = "middle".into();
        form.interval = "0".into();
        assert!(matches!(
            form.to_config(),
            Err(RepeatError::Configuration(_))
        ));

        form.interval = "fast".into();
        assert!(matches!(
            form.to_config(),
            Err(RepeatError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn test_editing_respects_mode() {
        let mut app = app();
        app.focus = Field::Button;
        app.input_char('x');
        assert_eq!(app.form.button, "left");

        app.focus = Field::Mode;
        app.input_char(' ');
        assert_eq!(app.form.mode, Mode::Click);

        app.focus = Field::Button;
        app.backspace();
        app.input_char('!');
        assert_eq!(app.form.button, "lef!");
    }

    #[test]
    fn test_focus_wraps() {
        let mut app = app();
        app.prev_field();
        assert_eq!(app.focus, Field::TestPad);
        app.next_field();
        assert_eq!(app.focus, Field::Mode);
    }

    #[test]
    fn test_window_picker_cycles() {
        let mut app = app();
        assert_eq!(app.windows, vec!["Editor".to_string(), "Game".to_string()]);
        app.focus = Field::TargetWindow;
        app.cycle(true);
        assert_eq!(app.form.target_window, "Editor");
        app.cycle(true);
        assert_eq!(app.form.target_window, "Game");
        app.cycle(true);
        assert_eq!(app.form.target_window, "Editor");
    }

    #[test]
    fn test_backend_needs_capability() {
        let mut app = app();
        app.focus = Field::Backend;
        app.cycle(true);
        assert_eq!(app.form.backend, Backend::Primary);

        app.caps.alternate_backend = true;
        app.cycle(true);
        assert_eq!(app.form.backend, Backend::Alternate);
    }

    #[test]
    fn test_test_pad_collects_input() {
        let mut app = app();
        app.focus = Field::TestPad;
        for c in "ab c".chars() {
            app.input_char(c);
        }
        app.enter();
        app.backspace();
        assert_eq!(app.test_pad, "ab c");
        app.clear_test_pad();
        assert!(app.test_pad.is_empty());
    }

    #[test]
    fn test_start_stop_cycle() {
        let mut app = app();
        assert!(app.can_start());
        assert!(!app.can_stop());

        app.start();
        assert!(app.is_running());
        assert!(app.status.starts_with("Running key 'space'"));
        assert!(!app.can_start());
        assert!(app.can_stop());

        // Second start while active is a no-op.
        app.start();
        assert!(app.status.starts_with("Running"));

        app.toggle_run();
        assert_eq!(app.status, "Stopping...");
        assert!(!app.can_stop());

        wait_until_idle(&mut app);
        assert_eq!(app.status, "Stopped. Sent 3 presses of 'space'.");
        assert!(app.can_start());
    }

    #[test]
    fn test_invalid_form_does_not_start() {
        let mut app = app();
        app.form.hold = "-1".into();
        app.start();
        assert!(!app.is_running());
        assert!(app.status.starts_with("Invalid input"));
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn test_pad_swallows_form_keys_during_run() {
        let mut app = app();
        app.form.key = "escape".into();
        app.on_key(press(KeyCode::F(5)));
        assert!(app.can_stop());

        app.focus = Field::TestPad;
        app.on_key(press(KeyCode::Esc));
        app.on_key(press(KeyCode::F(6)));
        app.on_key(press(KeyCode::Up));
        assert!(app.can_stop());
        assert!(app.status.starts_with("Running"));
        assert_eq!(app.focus, Field::TestPad);

        app.on_key(press(KeyCode::Tab));
        app.on_key(KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT));
        app.on_key(press(KeyCode::Enter));
        assert_eq!(app.focus, Field::TestPad);
        assert_eq!(app.test_pad, "\tA\n");

        app.on_key(ctrl('x'));
        assert_eq!(app.focus, Field::Mode);
        app.on_key(press(KeyCode::Esc));
        assert_eq!(app.status, "Stopping...");
        wait_until_idle(&mut app);
    }

    #[test]
    fn test_ctrl_chords_work_from_pad() {
        let mut app = app();
        app.focus = Field::TestPad;
        app.on_key(press(KeyCode::Char('z')));
        app.on_key(ctrl('l'));
        assert!(app.test_pad.is_empty());
        app.on_key(ctrl('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_hotkey_press_after_run_ends_starts_again() {
        let controller =
            RunController::with_runner(Arc::new(|_: &RunConfig, _: &CancellationToken| {
                Ok(RunResult::new(1, Termination::DurationElapsed))
            }));
        let mut app = App::new(controller, Capabilities::none(), None);
        let (tx, rx) = std::sync::mpsc::channel();
        app.hotkey_rx = Some(rx);

        app.start();
        // Let the worker exit without collecting its result.
        std::thread::sleep(Duration::from_millis(100));
        tx.send(HotkeyPressed).unwrap();
        app.tick();

        assert!(app.is_running());
        assert!(app.status.starts_with("Running"));
        wait_until_idle(&mut app);
        assert_eq!(app.status, "Finished. Sent 1 presses of 'space'.");
    }

    #[test]
    fn test_hotkey_without_support() {
        let mut app = app();
        app.apply_hotkey();
        assert_eq!(app.status, "Global hotkeys are not available in this session");
        assert_eq!(app.hotkey_active(), None);
    }
}
