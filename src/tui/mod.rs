//! Interactive terminal form.
//!
//! Mirrors the CLI flags as editable rows, with Start/Stop, a global
//! start/stop hotkey and a test pad for checking that synthetic input lands.

mod app;
mod ui;

pub use app::{App, Field, Form};

use std::io;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};

use crate::capabilities::Capabilities;
use crate::controller::RunController;
use crate::hotkey::HotkeyToggle;
use crate::window;

/// Open the form and block until the user quits.
pub fn run(caps: Capabilities) -> Result<()> {
    let targeter = if caps.window_targeting {
        match window::native_targeter() {
            Ok(targeter) => Some(targeter),
            Err(e) => {
                warn!(error = %e, "window list disabled");
                None
            }
        }
    } else {
        None
    };

    let mut app = App::new(RunController::native(caps), caps, targeter);

    // The listener thread lives as long as the toggle; dropping the app
    // stops it.
    if caps.global_hotkeys {
        match HotkeyToggle::new() {
            Ok(hotkey) => {
                let (tx, rx) = mpsc::channel();
                hotkey.spawn_listener(tx);
                app.attach_hotkey(hotkey, rx);
            }
            Err(e) => {
                warn!(error = %e, "global hotkey disabled");
                app.status = format!("Hotkey failed: {e}");
            }
        }
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    info!("form opened");
    let result = event_loop(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn event_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.tick();
        if app.should_quit && !app.is_running() {
            return Ok(());
        }

        terminal.draw(|f| ui::draw(f, app))?;

        // 100ms keeps the status line fresh without spinning.
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }
    }
}
