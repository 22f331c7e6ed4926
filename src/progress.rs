//! Progress reporting for the disk usage walker
//!
//! Two styles of output:
//! - plain `<files> files <GB> GB` lines on stdout (periodic and final)
//! - an indicatif spinner and a styled summary for interactive use

use crate::walker::{DiskUsageResult, RunningTotals};
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

/// Format totals as `<files> files <GB> GB` with one decimal
pub fn format_disk_usage(totals: &RunningTotals) -> String {
    format!("{} files {:.1} GB", totals.files, totals.gigabytes())
}

/// Print a disk usage line to stdout
pub fn print_disk_usage(totals: &RunningTotals) {
    println!("{}", format_disk_usage(totals));
}

/// Live spinner showing running totals
pub struct ProgressReporter {
    bar: ProgressBar,
    started: Instant,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self {
            bar,
            started: Instant::now(),
        }
    }

    /// Update the progress display
    pub fn update(&self, totals: &RunningTotals) {
        let secs = self.started.elapsed().as_secs_f64();
        let rate = if secs > 0.0 {
            totals.files as f64 / secs
        } else {
            0.0
        };

        self.bar.set_message(format!(
            "Files: {} | Size: {} | Rate: {:.0}/s",
            format_number(totals.files),
            format_size(totals.bytes, BINARY),
            rate,
        ));
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| {
            chunk
                .iter()
                .rev()
                .map(|&b| b as char)
                .collect::<String>()
        })
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Print a detailed summary of the walk results
pub fn print_summary(result: &DiskUsageResult) {
    let duration_secs = result.duration.as_secs_f64();
    let rate = if duration_secs > 0.0 {
        result.totals.files as f64 / duration_secs
    } else {
        0.0
    };

    let title = if result.completed {
        style("Walk Complete").green().bold()
    } else {
        style("Walk Cancelled").yellow().bold()
    };

    println!();
    println!("{}", title);
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {}",
        style("Directories:").bold(),
        format_number(result.dirs)
    );
    println!(
        "  {} {}",
        style("Files:").bold(),
        format_number(result.totals.files)
    );
    println!(
        "  {} {}",
        style("Total Size:").bold(),
        format_size(result.totals.bytes, BINARY)
    );
    println!(
        "  {} {:.1}s ({:.0} files/sec)",
        style("Duration:").bold(),
        duration_secs,
        rate
    );
    if result.excluded > 0 {
        println!(
            "  {} {}",
            style("Excluded:").bold(),
            format_number(result.excluded)
        );
    }
    if result.errors > 0 {
        println!(
            "  {} {}",
            style("Errors:").yellow().bold(),
            format_number(result.errors)
        );
    }
    println!();
}

/// Print a header at the start of the walk
pub fn print_header(roots: usize, concurrency: usize) {
    eprintln!(
        "{} {}",
        style("du-walker").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("{}", style("─".repeat(50)).dim());
    eprintln!("  {} {}", style("Roots:").bold(), roots);
    eprintln!("  {} {}", style("Concurrency:").bold(), concurrency);
    eprintln!();
}
