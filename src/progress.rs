//! Progress reporting for hash runs
//!
//! Provides a live spinner using indicatif and styled header/summary output.

use crate::hashes::HashDiff;
use crate::walker::{HashProgress, WalkResult};
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner showing files and bytes hashed so far
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        // The template is a literal; a parse failure falls back to the default style
        if let Ok(spinner) = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
        {
            bar.set_style(spinner.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, label: &str, progress: &HashProgress) {
        let msg = format!(
            "{} | Files: {} | Size: {} | Rate: {:.0}/s ({}/s) | Pending: {}",
            label,
            format_number(progress.hashed),
            format_size(progress.bytes, BINARY),
            progress.files_per_second(),
            format_size(progress.bytes_per_second() as u64, BINARY),
            format_number(progress.in_flight()),
        );

        self.bar.set_message(msg);
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
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
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}

/// Print a header at the start of the program
pub fn print_header(root: &str, workers: usize, chunk_size: usize) {
    println!();
    println!(
        "{} {}",
        style("tree-hasher").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Root:").bold(), root);
    println!("  {} {}", style("Workers:").bold(), workers);
    println!(
        "  {} {}",
        style("Chunk size:").bold(),
        format_size(chunk_size as u64, BINARY)
    );
    println!();
}

/// Print a summary of one strategy's run
pub fn print_summary(label: &str, result: &WalkResult, output: &str) {
    let duration_secs = result.duration.as_secs_f64();
    let rate = if duration_secs > 0.0 {
        result.total_files as f64 / duration_secs
    } else {
        0.0
    };

    println!();
    println!("{}", style(format!("{} complete", label)).green().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {}",
        style("Files:").bold(),
        format_number(result.total_files)
    );
    println!(
        "  {} {}",
        style("Total Size:").bold(),
        format_size(result.total_bytes, BINARY)
    );
    println!(
        "  {} {:.1}s ({:.0} files/sec)",
        style("Duration:").bold(),
        duration_secs,
        rate
    );
    if result.skipped > 0 {
        println!(
            "  {} {}",
            style("Skipped:").yellow().bold(),
            format_number(result.skipped)
        );
    }
    println!("  {} {}", style("Output:").bold(), output);
    println!();
}

/// Print the outcome of comparing two mappings
pub fn print_comparison(left: &str, right: &str, diff: &HashDiff) {
    if diff.is_empty() {
        println!(
            "{} {} and {} hold identical mappings",
            style("✓").green().bold(),
            left,
            right
        );
        return;
    }

    println!(
        "{} {} and {} differ",
        style("✗").red().bold(),
        left,
        right
    );
    for key in &diff.only_left {
        println!("  {} {}", style("only in first: ").yellow(), key);
    }
    for key in &diff.only_right {
        println!("  {} {}", style("only in second:").yellow(), key);
    }
    for key in &diff.mismatched {
        println!("  {} {}", style("fingerprint:   ").red(), key);
    }
}
