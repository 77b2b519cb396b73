use clap::builder::TypedValueParser;
use clap::Parser;

use crate::jobs::DEFAULT_CAPACITY;

/// smallsh - a small job-control shell
#[derive(Debug, Clone, Parser)]
#[command(name = "smallsh", version, about)]
pub struct Config {
    /// Maximum number of background jobs tracked at once
    #[arg(
        long,
        env = "SMALLSH_MAX_JOBS",
        default_value_t = DEFAULT_CAPACITY,
        value_parser = clap::value_parser!(u16).range(1..).map(usize::from)
    )]
    pub max_jobs: usize,

    /// Log spawns, reaps and directory changes to stderr
    #[arg(short, long)]
    pub debug: bool,

    /// Disable coloured diagnostics
    #[arg(long, env = "NO_COLOR", value_parser = clap::builder::FalseyValueParser::new())]
    pub no_color: bool,
}

impl Config {
    /// Filter used when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "warn"
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_jobs: DEFAULT_CAPACITY,
            debug: false,
            no_color: false,
        }
    }
}
