//! Progress indicators for long-running steps
//!
//! Spinners and byte bars built on indicatif. Verbose runs stream child
//! process output instead, so callers skip the spinner in that case.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Style presets for different types of progress indicators
pub struct ProgressStyles;

impl ProgressStyles {
    /// Style for indeterminate operations (spinner only)
    pub fn spinner() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
    }

    /// Style for download operations
    pub fn download() -> ProgressStyle {
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}) ETA: {eta} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░  ")
    }

    /// Style for a finished step
    pub fn done(color: &str) -> ProgressStyle {
        ProgressStyle::with_template(&format!("{{prefix:.{color}}} {{msg}}"))
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

/// Create a spinner for an indeterminate step
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyles::spinner());
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Spinner that is hidden in verbose mode
pub fn step(msg: &str, verbose: bool) -> ProgressBar {
    if verbose {
        ProgressBar::hidden()
    } else {
        spinner(msg)
    }
}

/// Create a byte progress bar for a download of known size
pub fn download_bar(total: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(ProgressStyles::download());
    pb.set_message(msg.to_string());
    pb
}

/// Helper trait for progress bar operations
pub trait ProgressExt {
    /// Finish with a success message
    fn finish_success(&self, msg: &str);

    /// Finish with an error message
    fn finish_error(&self, msg: &str);
}

impl ProgressExt for ProgressBar {
    fn finish_success(&self, msg: &str) {
        self.set_style(ProgressStyles::done("green"));
        self.set_prefix("✓");
        self.finish_with_message(msg.to_string());
    }

    fn finish_error(&self, msg: &str) {
        self.set_style(ProgressStyles::done("red"));
        self.set_prefix("✗");
        self.finish_with_message(msg.to_string());
    }
}
