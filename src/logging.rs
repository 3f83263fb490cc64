//! `tracing` subscriber setup for the two front ends.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

fn filter(verbose: bool) -> EnvFilter {
    let default = if verbose {
        "input_repeater=debug,irep=debug"
    } else {
        "input_repeater=info,irep=info"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Log to stderr, for CLI runs.
pub fn init_stderr(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Log to a file in the temp directory, for the terminal form, which owns
/// the screen. Returns the log path when the file could be created.
pub fn init_file(verbose: bool) -> Option<PathBuf> {
    let path = std::env::temp_dir().join("input-repeater.log");
    let file = File::create(&path).ok()?;
    tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .ok()?;
    Some(path)
}
