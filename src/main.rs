//! du-walker - Concurrent Disk Usage Walker
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use du_walker::cancel::{install_interrupt_handler, spawn_stdin_trigger, spawn_timeout};
use du_walker::config::{CliArgs, WalkConfig};
use du_walker::progress::{print_disk_usage, print_header, print_summary, ProgressReporter};
use du_walker::walker::{DiskUsageCoordinator, RunningTotals};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.debug)?;

    // Validate and create config
    let config = WalkConfig::from_args(args).context("Invalid configuration")?;

    // Create tokio runtime
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.threads)
        .enable_all()
        .build()
        .context("Failed to create async runtime")?;

    runtime.block_on(run_async(config))
}

async fn run_async(config: WalkConfig) -> Result<()> {
    if config.show_summary {
        print_header(config.roots.len(), config.concurrency);
    }

    let coordinator = DiskUsageCoordinator::new(config.clone());

    // Cancellation triggers
    let cancel = coordinator.cancel_signal();
    install_interrupt_handler(cancel.clone()).context("Failed to set signal handler")?;
    if config.stdin_cancel {
        spawn_stdin_trigger(cancel.clone()).context("Failed to watch stdin")?;
    }
    let timeout = config
        .timeout
        .map(|after| spawn_timeout(cancel.clone(), after));

    // Create progress reporter
    let progress = if config.show_progress {
        Some(ProgressReporter::new())
    } else {
        None
    };

    if let Some(ref p) = progress {
        p.set_status("Walking...");
    }

    // Progress lines in verbose mode, spinner updates with --progress
    let on_tick = |totals: &RunningTotals| match progress {
        Some(ref p) => p.update(totals),
        None => print_disk_usage(totals),
    };

    let result = coordinator.run(on_tick).await.context("Walk failed")?;

    if let Some(handle) = timeout {
        handle.abort();
    }

    // Finish progress
    if let Some(ref p) = progress {
        p.finish_and_clear();
    }

    print_disk_usage(&result.totals);

    if config.show_summary {
        print_summary(&result);
    }

    if !result.completed {
        info!("Walk was cancelled before completion");
    }

    if result.errors > 0 {
        info!(errors = result.errors, "Walk completed with errors");
    }

    Ok(())
}

fn setup_logging(debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("du_walker=debug,warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("du_walker=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
