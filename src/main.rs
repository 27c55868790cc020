mod cli;
mod logging;
mod reporter;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use cli::Cli;
use colored::*;
use dotenv::dotenv;
use reporter::CliReporter;
use sov_convert::config::load_configuration;
use sov_convert::{ConvertEngine, RunSummary};
use std::panic::{self, AssertUnwindSafe};
use std::process::{self, ExitCode};
use tracing::{error, info, warn};

const EXIT_USER_ERROR: u8 = 1;
const EXIT_INTERNAL_ERROR: u8 = 3;

fn main() -> ExitCode {
    dotenv().ok();

    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EXIT_USER_ERROR),
            };
        }
    };

    let _guard = logging::init_logger(args.log_level.as_deref(), args.log_file.as_deref());

    // No internal cancellation: artifacts already renamed into place stay valid,
    // and leftover temp files are removed by the next run's validation.
    if let Err(err) = ctrlc::set_handler(|| {
        warn!("Interrupted, exiting");
        eprintln!("\n{}", "Interrupted".yellow());
        process::exit(EXIT_USER_ERROR as i32);
    }) {
        warn!("Failed to set signal handler: {}", err);
    }

    match panic::catch_unwind(AssertUnwindSafe(|| run(&args))) {
        Ok(Ok(summary)) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Ok(Err(err)) => {
            let user_error = err
                .downcast_ref::<sov_convert::Error>()
                .map(sov_convert::Error::is_user_error)
                .unwrap_or(false);
            error!("{:#}", err);
            eprintln!("{} {:#}", "Error:".red().bold(), err);
            if user_error {
                ExitCode::from(EXIT_USER_ERROR)
            } else {
                ExitCode::from(EXIT_INTERNAL_ERROR)
            }
        }
        Err(_) => {
            error!("Unexpected internal error, aborting run");
            ExitCode::from(EXIT_INTERNAL_ERROR)
        }
    }
}

fn run(args: &Cli) -> Result<RunSummary> {
    let config = load_configuration(args.config.as_deref())
        .map_err(sov_convert::Error::from)
        .context("Error loading configuration")?;
    let config = args.apply_overrides(config);
    info!(
        "Searching {} root(s) for '{}' directories",
        args.roots.len(),
        config.pattern
    );

    let engine = ConvertEngine::new(config);
    let reporter = CliReporter::new();
    let summary = engine.run(&args.roots, &args.output, args.rescan, &reporter)?;
    Ok(summary)
}

fn print_summary(summary: &RunSummary) {
    let stats = &summary.stats;
    info!(
        "Run complete: {} file(s) discovered, {} skipped, {} processed, {} sheet(s), {} rows, {} error(s)",
        summary.files_discovered,
        stats.files_skipped,
        stats.files_processed,
        stats.sheets_converted,
        stats.rows_written,
        stats.errors
    );

    let source = if summary.used_registry {
        "registry".to_string()
    } else {
        format!("{} target directories", summary.target_dirs)
    };

    println!("{}", "Summary".bold());
    println!("  Files discovered:  {} (from {})", summary.files_discovered, source);
    println!("  Already converted: {}", stats.files_skipped);
    println!("  Files processed:   {}", stats.files_processed);
    println!("  Sheets converted:  {}", stats.sheets_converted.to_string().green());
    println!("  Rows written:      {}", stats.rows_written);
    let errors = if stats.errors == 0 {
        stats.errors.to_string().green()
    } else {
        stats.errors.to_string().red()
    };
    println!("  Errors:            {}", errors);
    println!(
        "  Elapsed:           {:.2}s scan, {:.2}s convert",
        summary.scan_duration.as_secs_f64(),
        summary.convert_duration.as_secs_f64()
    );
}
