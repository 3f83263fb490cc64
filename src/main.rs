use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use serde::Serialize;
use tracing::{debug, warn};

use input_repeater::cli::Cli;
use input_repeater::config::format_duration;
use input_repeater::{
    logging, tui, window, Capabilities, CancellationToken, RepeatError, RunConfig, RunResult,
    Termination,
};

fn main() -> ExitCode {
    let arg_count = std::env::args_os().len().saturating_sub(1);
    let cli = Cli::parse();

    if cli.wants_gui(arg_count) {
        let log_path = logging::init_file(cli.verbose);
        let caps = Capabilities::detect();
        return match tui::run(caps) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{} {e:#}", "error:".red().bold());
                if let Some(path) = log_path {
                    eprintln!("log: {}", path.display());
                }
                ExitCode::FAILURE
            }
        };
    }

    logging::init_stderr(cli.verbose);
    let caps = Capabilities::detect();

    if cli.list_windows {
        return list_windows(caps);
    }

    let config = match cli.run_config() {
        Ok(config) => config,
        Err(e) => return report_error(&e),
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{} failed to start runtime: {e}", "error:".red().bold());
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run_cli(config, caps, cli.json)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

#[derive(Serialize)]
struct Summary<'a> {
    config: &'a RunConfig,
    #[serde(flatten)]
    result: &'a RunResult,
}

async fn run_cli(config: RunConfig, caps: Capabilities, json: bool) -> anyhow::Result<ExitCode> {
    debug!(?config, "resolved configuration");
    if !config.start_delay.is_zero() && !json {
        eprintln!(
            "{} {}, starting in {}. Focus the target window now.",
            "▶".green(),
            config.describe(),
            format_duration(config.start_delay)
        );
    }

    let token = CancellationToken::new();
    let worker_token = token.clone();
    let worker_config = config.clone();
    let mut worker = tokio::task::spawn_blocking(move || {
        input_repeater::run(&worker_config, &worker_token, &caps)
    });

    let joined = tokio::select! {
        joined = &mut worker => joined,
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => {
                    token.cancel();
                    if !json {
                        eprintln!();
                    }
                }
                Err(e) => warn!(error = %e, "Ctrl+C handler unavailable"),
            }
            worker.await
        }
    };

    let result = match joined.context("repeat worker panicked")? {
        Ok(result) => result,
        Err(e) => return Ok(report_error(&e)),
    };

    if json {
        let summary = Summary {
            config: &config,
            result: &result,
        };
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        print_summary(&config, &result);
    }

    Ok(match result.terminated_by {
        Termination::Error(_) => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}

fn print_summary(config: &RunConfig, result: &RunResult) {
    let action = &config.action;
    let sent = format!(
        "Sent {} {} of '{}'.",
        result.action_count,
        action.noun(),
        action.target()
    );
    match &result.terminated_by {
        Termination::DurationElapsed => println!("{} {sent}", "Done.".green().bold()),
        Termination::Cancelled => {
            println!("{} {sent}", "Stopped early (Ctrl+C).".yellow().bold())
        }
        Termination::Error(message) => {
            println!("{} {sent}", "Failed.".red().bold());
            eprintln!("{} {message}", "error:".red().bold());
        }
    }
}

fn list_windows(caps: Capabilities) -> ExitCode {
    if !caps.window_targeting {
        return report_error(&RepeatError::unsupported_platform(
            "window listing needs an X11 session or Windows",
        ));
    }
    let titles = window::native_targeter().and_then(|targeter| targeter.titles());
    match titles {
        Ok(titles) => {
            for title in titles {
                println!("{title}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => report_error(&e),
    }
}

fn report_error(e: &RepeatError) -> ExitCode {
    eprintln!("{} {e}", "error:".red().bold());
    if e.is_usage_error() {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}
