//! Archivist CLI - Command-line utility for compressing and extracting
//! zip, jar, gzip and tar archives.

mod cli;
mod commands;
mod error;
mod output;
mod progress;

use clap::Parser;
use env_logger::Env;
use std::process::ExitCode;

/// Exit code used when a run is stopped with Ctrl-C (128 + SIGINT).
const EXIT_INTERRUPTED: u8 = 130;

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let formatter = output::create_formatter(cli.json, cli.verbose, cli.quiet);
    let quiet_progress = cli.quiet || cli.json;

    let (name, result) = match &cli.command {
        cli::Commands::Compress(args) => (
            "compress",
            commands::compress::execute(args, &*formatter, quiet_progress),
        ),
        cli::Commands::Extract(args) => (
            "extract",
            commands::extract::execute(args, &*formatter, quiet_progress),
        ),
        cli::Commands::Formats => ("formats", commands::formats::execute(&*formatter)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if error::is_interrupted(&err) => {
            formatter.format_warning(&format!("{name} interrupted"));
            ExitCode::from(EXIT_INTERRUPTED)
        }
        Err(err) => {
            formatter.format_error(name, &err);
            ExitCode::FAILURE
        }
    }
}
