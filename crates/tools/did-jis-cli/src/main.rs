use anyhow::Result;
use clap::Parser;
use std::io;
use std::process::ExitCode;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

use did_jis_cli::{run, Cli, CliConfig, Outcome};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;

    let log_level_str = config.log_level.as_deref().unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level_str))
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    // stdout carries command output only.
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(command = ?cli.command, "running");
    let stdout = io::stdout();
    let outcome = run(&cli, &config, &mut stdout.lock())?;

    Ok(match outcome {
        Outcome::Success => ExitCode::SUCCESS,
        Outcome::Rejected => ExitCode::from(1),
    })
}
