#![forbid(unsafe_code)]

mod output;
mod scenario;

use anyhow::Context;
use clap::{Parser, Subcommand};
use deadlock_core::config::resolve_config;
use output::{OutputMode, render_report};
use scenario::{Scenario, evaluate};
use std::env;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Exit status when the final state is deadlocked.
const EXIT_DEADLOCKED: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "deadlock: resource allocation graph deadlock checker",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Graph config file.
    #[arg(long, global = true, value_name = "PATH", default_value = "deadlock.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Run the two-process example",
        long_about = "Build the classic two-process, two-resource deadlock, check it, release one grant and check again.",
        after_help = "EXAMPLES:\n    # Walk through the example\n    deadlock demo\n\n    # Emit machine-readable output\n    deadlock demo --json"
    )]
    Demo,

    #[command(
        about = "Check a scenario file",
        long_about = "Load nodes, edges and releases from a TOML scenario and report deadlocks before and after the releases.",
        after_help = "EXAMPLES:\n    # Check a scenario\n    deadlock check locks.toml\n\n    # Strict removal from the environment\n    DEADLOCK_REMOVAL=strict deadlock check locks.toml"
    )]
    Check {
        /// Scenario file.
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("DEADLOCK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "deadlock=debug,info"
        } else {
            "deadlock=info,warn"
        })
    });

    let format = env::var("DEADLOCK_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<bool> {
    let config = resolve_config(&cli.config).context("Config error")?;
    debug!(?config, path = %cli.config.display(), "config resolved");

    let scenario = match &cli.command {
        Commands::Demo => Scenario::demo(),
        Commands::Check { file } => Scenario::load(file)?,
    };

    let report = evaluate(&scenario, config)?;
    let mode = OutputMode::from_json_flag(cli.json);
    render_report(&mut io::stdout().lock(), &report, mode).context("Failed to write report")?;
    Ok(report.deadlocked())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::from(EXIT_DEADLOCKED),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
