/// Trait for reporting pipeline progress.
///
/// The CLI implements it with indicatif bars. Reporting is advisory: the
/// statistics a run returns never depend on it. All methods default to no-ops.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self) {}
    fn on_scan_complete(&self, _target_dirs: usize, _files: usize, _duration_secs: f64) {}
    fn on_registry_loaded(&self, _files: usize) {}
    fn on_convert_start(&self, _files_to_convert: usize) {}
    fn on_file_converted(&self, _files_done: usize, _files_to_convert: usize) {}
    fn on_convert_complete(&self, _sheets_converted: usize, _errors: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
