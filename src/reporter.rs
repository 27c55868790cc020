use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use sov_convert::ProgressReporter;
use std::sync::Mutex;
use std::time::Duration;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif progress bars.
///
/// - Scan phase: spinner (number of directories unknown upfront)
/// - Convert phase: progress bar over the files left after dedup
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.take() {
                old.finish_and_clear();
            }
            *guard = Some(pb);
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl Default for CliReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for CliReporter {
    fn on_scan_start(&self) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars(TICK_CHARS),
        );
        pb.set_message("Scanning directories...");
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_scan_complete(&self, target_dirs: usize, files: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  {} Scan complete: {} files in {} directories in {:.2}s",
            "✓".green(),
            files,
            target_dirs,
            duration_secs
        );
    }

    fn on_registry_loaded(&self, files: usize) {
        eprintln!("  {} Loaded {} files from registry", "✓".green(), files);
    }

    fn on_convert_start(&self, files_to_convert: usize) {
        let pb = ProgressBar::new(files_to_convert as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "  {spinner:.cyan} Converting [{bar:30.cyan/dim}] {pos}/{len} files ({eta} remaining)",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸─")
            .tick_chars(TICK_CHARS),
        );
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_file_converted(&self, files_done: usize, _files_to_convert: usize) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                // Completions arrive out of order; never move the bar backwards.
                if files_done as u64 > pb.position() {
                    pb.set_position(files_done as u64);
                }
            }
        }
    }

    fn on_convert_complete(&self, sheets_converted: usize, errors: usize, duration_secs: f64) {
        self.finish_bar();
        let mark = if errors == 0 { "✓".green() } else { "!".yellow() };
        eprintln!(
            "  {} Conversion complete: {} sheets, {} errors in {:.2}s",
            mark, sheets_converted, errors, duration_secs
        );
    }
}
