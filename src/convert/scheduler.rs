use crate::convert::artifact::write_artifact;
use crate::convert::dedup::already_processed;
use crate::convert::normalize::{normalize, Normalized};
use crate::convert::reader::{panic_message, select_reader};
use crate::convert::table::DEFAULT_MAX_CELLS;
use crate::model::{ConversionResult, DiscoveredFile, ProcessingStats};
use crate::progress::{ProgressReporter, SilentReporter};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, error, info, warn};

/// Converts a batch of files on a bounded pool.
///
/// Every task returns its own `ConversionResult`; the results are summed
/// only after all tasks have joined, so the totals do not depend on the
/// pool size or on completion order.
pub struct WorkScheduler<'a> {
    output_dir: PathBuf,
    max_workers: Option<usize>,
    max_cells: usize,
    reporter: &'a dyn ProgressReporter,
}

impl<'a> WorkScheduler<'a> {
    pub fn new(output_dir: impl Into<PathBuf>, max_workers: Option<usize>) -> Self {
        WorkScheduler {
            output_dir: output_dir.into(),
            max_workers,
            max_cells: DEFAULT_MAX_CELLS,
            reporter: &SilentReporter,
        }
    }

    /// Per-sheet grid limit; larger sheets are counted as errors.
    pub fn with_max_cells(mut self, max_cells: usize) -> Self {
        self.max_cells = max_cells;
        self
    }

    pub fn with_reporter(mut self, reporter: &'a dyn ProgressReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Never fails. Per-file and per-sheet failures are logged and counted.
    pub fn run(&self, files: &[DiscoveredFile]) -> ProcessingStats {
        let unique = unique_by_canonical_path(files);

        // Snapshot taken once; files converted during this batch are not re-checked.
        let processed = already_processed(&self.output_dir);
        info!("Found {} already-processed file(s)", processed.len());

        let (pending, skipped): (Vec<_>, Vec<_>) = unique
            .into_iter()
            .partition(|(key, _)| !processed.contains(&*key.to_string_lossy()));

        let mut stats = ProcessingStats {
            files_total: pending.len() + skipped.len(),
            files_skipped: skipped.len(),
            files_processed: pending.len(),
            ..Default::default()
        };

        if !skipped.is_empty() {
            info!("Skipped {} already-processed file(s)", skipped.len());
        }
        if pending.is_empty() {
            info!("No files left to convert");
            return stats;
        }

        info!("Processing {} remaining file(s) in parallel", pending.len());
        self.reporter.on_convert_start(pending.len());

        let done = AtomicUsize::new(0);
        let task = |(_, file): &(PathBuf, &DiscoveredFile)| {
            let result = convert_file(file, &self.output_dir, self.max_cells);
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            self.reporter.on_file_converted(finished, pending.len());
            result
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers.unwrap_or(0))
            .build();
        let results: Vec<ConversionResult> = match pool {
            Ok(pool) => pool.install(|| pending.par_iter().map(task).collect()),
            Err(e) => {
                warn!("Could not build conversion pool, converting sequentially: {}", e);
                pending.iter().map(task).collect()
            }
        };

        let totals: ConversionResult = results.into_iter().sum();
        stats.sheets_converted = totals.sheets_converted;
        stats.rows_written = totals.rows_written;
        stats.errors = totals.errors;

        info!(
            "Converted {} sheet(s) with {} total rows ({} error(s))",
            stats.sheets_converted, stats.rows_written, stats.errors
        );
        stats
    }
}

/// Convenience wrapper around [`WorkScheduler`] without progress reporting.
pub fn run(
    files: &[DiscoveredFile],
    output_dir: &Path,
    max_workers: Option<usize>,
) -> ProcessingStats {
    WorkScheduler::new(output_dir, max_workers).run(files)
}

/// Keys each file by its canonical path, keeping the first occurrence.
fn unique_by_canonical_path(files: &[DiscoveredFile]) -> Vec<(PathBuf, &DiscoveredFile)> {
    let mut seen = HashSet::new();
    files
        .iter()
        .map(|file| {
            let key = fs::canonicalize(&file.path).unwrap_or_else(|_| file.path.clone());
            (key, file)
        })
        .filter(|(key, _)| seen.insert(key.clone()))
        .collect()
}

/// Converts every sheet of one file into its own artifact.
///
/// Never panics: a panic escaping the file's conversion is logged and the
/// file counted as one error, leaving the rest of the batch untouched.
pub fn convert_file(
    file: &DiscoveredFile,
    output_dir: &Path,
    max_cells: usize,
) -> ConversionResult {
    match panic::catch_unwind(AssertUnwindSafe(|| convert_sheets(file, output_dir, max_cells))) {
        Ok(result) => result,
        Err(payload) => {
            error!(
                "Error processing file {}: conversion panicked: {}",
                file.path.display(),
                panic_message(&*payload)
            );
            ConversionResult::failed()
        }
    }
}

fn convert_sheets(
    file: &DiscoveredFile,
    output_dir: &Path,
    max_cells: usize,
) -> ConversionResult {
    let path = &file.path;
    debug!("Processing file: {}", path.display());

    if !path.exists() {
        error!("File no longer exists: {}", path.display());
        return ConversionResult::failed();
    }
    let source = fs::canonicalize(path).unwrap_or_else(|_| path.clone());
    let file_name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut workbook = match select_reader(&file.extension).open(&source) {
        Ok(workbook) => workbook,
        Err(err) => {
            error!("Error processing file {}: {}", source.display(), err);
            return ConversionResult::failed();
        }
    };

    let mut result = ConversionResult::default();
    for (sheet, table) in workbook.read_all_sheets(max_cells) {
        let table = match table {
            Ok(table) => table,
            Err(err) => {
                error!("Error processing sheet '{}' in {}: {}", sheet, file_name, err);
                result.errors += 1;
                continue;
            }
        };

        let records = match normalize(&sheet, &table, &source) {
            Normalized::SkippedEmpty => {
                warn!("Skipping empty sheet '{}' in {}", sheet, file_name);
                continue;
            }
            Normalized::Records(records) => records,
        };

        match write_artifact(output_dir, &records) {
            Ok(artifact) => {
                debug!(
                    "Saved sheet '{}' from {} to {} ({} rows)",
                    sheet,
                    file_name,
                    artifact.display(),
                    records.len()
                );
                result.sheets_converted += 1;
                result.rows_written += records.len();
            }
            Err(err) => {
                error!("Error writing sheet '{}' in {}: {}", sheet, file_name, err);
                result.errors += 1;
            }
        }
    }

    result
}
