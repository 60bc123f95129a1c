use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;
use tv_organizer_core::ProgressReporter;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif.
///
/// - Scan: spinner (file count unknown upfront)
/// - Analysis phases: spinner
/// - Deletions and moves: bar over the known operation count
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn spinner(message: String) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars(TICK_CHARS));
        }
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
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

impl ProgressReporter for CliReporter {
    fn on_scan_start(&self, directories: usize) {
        self.set_bar(Self::spinner(format!(
            "Scanning {} TV directories...",
            directories
        )));
    }

    fn on_scan_progress(&self, files_found: usize, _current_path: &str) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.set_message(format!("Scanning... {} video files found", files_found));
            }
        }
    }

    fn on_scan_warning(&self, message: &str) {
        if let Ok(guard) = self.bar.lock() {
            match guard.as_ref() {
                Some(pb) => pb.println(format!("  \x1b[33m!\x1b[0m {}", message)),
                None => eprintln!("  \x1b[33m!\x1b[0m {}", message),
            }
        }
    }

    fn on_scan_complete(&self, total_files: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Scan complete: {} episodes in {:.2}s",
            total_files, duration_secs
        );
    }

    fn on_analysis_start(&self, phase: &str) {
        self.set_bar(Self::spinner(format!("Analyzing {}...", phase)));
    }

    fn on_analysis_complete(&self, phase: &str, items: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m {} complete: {} results in {:.2}s",
            phase, items, duration_secs
        );
    }

    fn on_operation_progress(&self, completed: usize, total: usize, description: &str) {
        let Ok(mut guard) = self.bar.lock() else {
            return;
        };
        if guard.is_none() {
            let pb = ProgressBar::new(total as u64);
            if let Ok(style) = ProgressStyle::with_template(
                "  {spinner:.cyan} [{bar:30.cyan/dim}] {pos}/{len} {msg}",
            ) {
                pb.set_style(style.progress_chars("━╸─").tick_chars(TICK_CHARS));
            }
            *guard = Some(pb);
        }
        if let Some(pb) = guard.as_ref() {
            pb.set_position(completed as u64);
            pb.set_message(description.to_string());
        }
        if completed >= total {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}
