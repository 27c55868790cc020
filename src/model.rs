use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::path::PathBuf;
use std::sync::Arc;

/// A spreadsheet found by discovery (or loaded from the registry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredFile {
    #[serde(rename = "source_path")]
    pub path: PathBuf,
    /// Lower-case, without the leading dot.
    pub extension: String,
    pub discovered_at: DateTime<Local>,
}

impl DiscoveredFile {
    pub fn new(path: PathBuf, discovered_at: DateTime<Local>) -> Self {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        DiscoveredFile {
            path,
            extension,
            discovered_at,
        }
    }
}

/// One cell of a source sheet in long format.
///
/// The three lineage fields are shared between every record of a sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub source_path: Arc<str>,
    pub source_name: Arc<str>,
    pub sheet: Arc<str>,
    pub row: u64,
    pub column: u64,
    pub value: String,
}

/// Outcome of converting a single file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionResult {
    pub sheets_converted: usize,
    pub rows_written: usize,
    pub errors: usize,
}

impl ConversionResult {
    pub fn failed() -> Self {
        ConversionResult {
            errors: 1,
            ..Default::default()
        }
    }
}

impl Add for ConversionResult {
    type Output = ConversionResult;

    fn add(self, other: ConversionResult) -> ConversionResult {
        ConversionResult {
            sheets_converted: self.sheets_converted + other.sheets_converted,
            rows_written: self.rows_written + other.rows_written,
            errors: self.errors + other.errors,
        }
    }
}

impl AddAssign for ConversionResult {
    fn add_assign(&mut self, other: ConversionResult) {
        *self = *self + other;
    }
}

impl Sum for ConversionResult {
    fn sum<I: Iterator<Item = ConversionResult>>(iter: I) -> Self {
        iter.fold(ConversionResult::default(), Add::add)
    }
}

/// Batch-level totals produced by the scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessingStats {
    /// Files handed to the scheduler.
    pub files_total: usize,
    /// Files already represented in the output.
    pub files_skipped: usize,
    /// Files dispatched for conversion.
    pub files_processed: usize,
    pub sheets_converted: usize,
    pub rows_written: usize,
    pub errors: usize,
}
