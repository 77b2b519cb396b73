use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod builtins;
mod command;
mod config;
mod error;
mod jobs;
mod launcher;
mod redirects;
mod shell;
mod signals;
mod status;

use config::Config;
use shell::Shell;

/// EX_OSERR: the shell lost the ability to create processes.
const FATAL_EXIT_CODE: u8 = 71;

fn init_logging(config: &Config) {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| config.default_log_filter().to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from(filter))
        .with_writer(io::stderr)
        .with_ansi(!config.no_color && io::stderr().is_terminal())
        .with_target(false)
        .compact()
        .init();
}

fn run(config: &Config) -> anyhow::Result<()> {
    let start = Instant::now();

    signals::ignore_interrupt().context("failed to ignore SIGINT in the shell")?;

    let stdin = io::stdin();
    let mut shell = Shell::new(stdin.lock(), io::stdout(), config);
    debug!(max_jobs = config.max_jobs, "startup took {:?}", start.elapsed());

    shell.run()?;
    Ok(())
}

fn main() -> ExitCode {
    let config = Config::parse();

    if config.no_color {
        colored::control::set_override(false);
    }
    init_logging(&config);

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            shell::report(&format!("{:#}", e));
            ExitCode::from(FATAL_EXIT_CODE)
        }
    }
}
