mod cli;
mod scenarios;

use std::env;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Outcome};

const EXIT_NO_PLAN: u8 = 1;
const EXIT_ERROR: u8 = 2;

fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// `RUST_LOG` wins over the `-v` count when set.
fn init_tracing(verbosity: u8) {
    let filter = match env::var("RUST_LOG") {
        Ok(raw) if !raw.trim().is_empty() => EnvFilter::new(raw),
        _ => EnvFilter::new(level_for(verbosity)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.run() {
        Ok(Outcome::Success) => ExitCode::SUCCESS,
        Ok(Outcome::NoPlan) => ExitCode::from(EXIT_NO_PLAN),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
