/// Trait for reporting scan, analysis and execution progress.
///
/// The CLI implements it with indicatif bars. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self, _directories: usize) {}
    fn on_scan_progress(&self, _files_found: usize, _current_path: &str) {}
    fn on_scan_warning(&self, _message: &str) {}
    fn on_scan_complete(&self, _total_files: usize, _duration_secs: f64) {}
    fn on_analysis_start(&self, _phase: &str) {}
    fn on_analysis_complete(&self, _phase: &str, _items: usize, _duration_secs: f64) {}
    /// Called after each deletion or move finishes, successfully or not.
    fn on_operation_progress(&self, _completed: usize, _total: usize, _description: &str) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
