use crate::config::AppConfig;
use crate::convert::artifact::remove_stale_temp_files;
use crate::convert::WorkScheduler;
use crate::error::{Error, ValidationError};
use crate::model::{DiscoveredFile, ProcessingStats};
use crate::progress::ProgressReporter;
use crate::registry::Registry;
use crate::scanner::{self, compile_ignore_patterns, PathPattern, ScanOptions, TreeScanner};
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub struct ConvertEngine {
    config: AppConfig,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Zero when the file list came from the registry.
    pub target_dirs: usize,
    pub files_discovered: usize,
    pub used_registry: bool,
    pub scan_duration: Duration,
    pub convert_duration: Duration,
    pub stats: ProcessingStats,
}

impl ConvertEngine {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Run the full pipeline:
    /// 1. Validate roots and output location
    /// 2. Discover spreadsheets (registry, or tree scan + enumeration)
    /// 3. Convert everything not already present in the output
    ///
    /// Only validation and configuration problems return `Err`; per-directory,
    /// per-file and per-sheet failures are logged and counted instead.
    pub fn run<P: AsRef<Path>>(
        &self,
        roots: &[P],
        output_dir: &Path,
        rescan: bool,
        reporter: &dyn ProgressReporter,
    ) -> Result<RunSummary, Error> {
        validate_inputs(roots, output_dir)?;
        let pattern = PathPattern::new(&self.config.pattern)?;
        let ignore_patterns = compile_ignore_patterns(&self.config.ignore_patterns)?;
        info!("Output directory: {}", output_dir.display());

        // Phase 1: Discover
        let scan_start = Instant::now();
        let registry = Registry::new(&self.config.registry_path);
        let cached = if rescan {
            info!("Rescan requested, ignoring registry");
            None
        } else {
            load_registry(&registry)
        };

        let mut summary = RunSummary::default();
        let files = match cached {
            Some(files) => {
                reporter.on_registry_loaded(files.len());
                summary.used_registry = true;
                files
            }
            None => {
                reporter.on_scan_start();
                let tree = TreeScanner::new(
                    pattern,
                    ScanOptions {
                        parallel_threshold: self.config.parallel_threshold,
                        max_workers: self.config.scan_workers,
                        include_match_root: self.config.include_match_root,
                        ignore_patterns,
                    },
                );
                let target_dirs = tree.find_target_dirs(roots);
                let files = scanner::discover_files(&target_dirs);
                summary.target_dirs = target_dirs.len();

                if let Err(err) = registry.save(&files) {
                    error!(
                        "Failed to save registry {}: {}",
                        registry.path().display(),
                        err
                    );
                }
                reporter.on_scan_complete(
                    target_dirs.len(),
                    files.len(),
                    scan_start.elapsed().as_secs_f64(),
                );
                files
            }
        };
        summary.scan_duration = scan_start.elapsed();
        summary.files_discovered = files.len();
        debug!(
            "Discovery completed in {:.2}s: {} file(s)",
            summary.scan_duration.as_secs_f64(),
            files.len()
        );

        if files.is_empty() {
            warn!("No spreadsheet files found to convert");
            return Ok(summary);
        }

        // Phase 2: Convert
        let convert_start = Instant::now();
        summary.stats = WorkScheduler::new(output_dir, self.config.convert_workers)
            .with_max_cells(self.config.max_cells)
            .with_reporter(reporter)
            .run(&files);
        summary.convert_duration = convert_start.elapsed();
        reporter.on_convert_complete(
            summary.stats.sheets_converted,
            summary.stats.errors,
            summary.convert_duration.as_secs_f64(),
        );

        Ok(summary)
    }
}

fn load_registry(registry: &Registry) -> Option<Vec<DiscoveredFile>> {
    if !registry.exists() {
        debug!("No registry at {}", registry.path().display());
        return None;
    }
    match registry.load() {
        Ok(files) => Some(files),
        Err(err) => {
            warn!(
                "Could not load registry {}, rescanning: {}",
                registry.path().display(),
                err
            );
            None
        }
    }
}

/// Pre-flight checks, run before any directory is scanned.
///
/// Every root must be a listable directory. The output location is created
/// when missing and checked for writability with a throwaway file. Temporary
/// files left by an interrupted run are removed from it.
pub fn validate_inputs<P: AsRef<Path>>(
    roots: &[P],
    output_dir: &Path,
) -> Result<(), ValidationError> {
    for root in roots {
        let root = root.as_ref();
        if !root.exists() {
            return Err(ValidationError::RootMissing(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(ValidationError::RootNotDirectory(root.to_path_buf()));
        }
        fs::read_dir(root).map_err(|source| ValidationError::RootUnreadable {
            path: root.to_path_buf(),
            source,
        })?;
    }

    if output_dir.exists() && !output_dir.is_dir() {
        return Err(ValidationError::OutputNotDirectory(output_dir.to_path_buf()));
    }
    let not_writable = |source| ValidationError::OutputNotWritable {
        path: output_dir.to_path_buf(),
        source,
    };
    fs::create_dir_all(output_dir).map_err(not_writable)?;
    tempfile::tempfile_in(output_dir).map_err(not_writable)?;

    let removed = remove_stale_temp_files(output_dir);
    if removed > 0 {
        info!("Removed {} stale temporary file(s) from {}", removed, output_dir.display());
    }
    Ok(())
}
