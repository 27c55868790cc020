//! Output artifacts: one self-contained Parquet file per converted sheet.
//!
//! The six-column layout below is a compatibility contract for downstream
//! readers; column names, order and types must not change.

use crate::error::ArtifactError;
use crate::model::NormalizedRecord;
use arrow::array::{Array, ArrayRef, Int64Array, Int64Builder, StringArray, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::{ArrowWriter, ProjectionMask};
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::collections::HashSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

pub const ARTIFACT_EXTENSION: &str = "parquet";
pub const SOURCE_PATH_COLUMN: &str = "source_path";

const BATCH_ROWS: usize = 65_536;

const TEMP_PREFIX: &str = ".sov-";
const TEMP_SUFFIX: &str = ".tmp";

pub fn artifact_schema() -> Schema {
    Schema::new(vec![
        Field::new(SOURCE_PATH_COLUMN, DataType::Utf8, false),
        Field::new("source_name", DataType::Utf8, false),
        Field::new("sheet", DataType::Utf8, false),
        Field::new("row", DataType::Int64, false),
        Field::new("column", DataType::Int64, false),
        Field::new("value", DataType::Utf8, false),
    ])
}

pub fn artifact_schema_ref() -> Arc<Schema> {
    Arc::new(artifact_schema())
}

fn writer_properties() -> Result<WriterProperties, ArtifactError> {
    Ok(WriterProperties::builder()
        .set_compression(Compression::ZSTD(ZstdLevel::try_new(3)?))
        .set_statistics_enabled(parquet::file::properties::EnabledStatistics::Chunk)
        .build())
}

/// Writes `records` as `<uuid>.parquet` inside `output_dir` and returns its path.
///
/// The data goes to a hidden temporary file first and is renamed into place
/// only after it is closed and synced, so an interrupted write never leaves
/// a partial artifact behind.
pub fn write_artifact(
    output_dir: &Path,
    records: &[NormalizedRecord],
) -> Result<PathBuf, ArtifactError> {
    let final_path = output_dir.join(format!("{}.{}", Uuid::new_v4(), ARTIFACT_EXTENSION));

    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(output_dir)?;

    let schema = artifact_schema_ref();
    {
        let mut writer =
            ArrowWriter::try_new(tmp.as_file_mut(), schema.clone(), Some(writer_properties()?))?;
        for chunk in records.chunks(BATCH_ROWS) {
            writer.write(&build_batch(&schema, chunk)?)?;
        }
        writer.close()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(&final_path)?;

    Ok(final_path)
}

/// Deletes temporary files left behind by an interrupted earlier run.
///
/// Returns how many were removed. Must not run while another process is
/// writing into the same directory.
pub fn remove_stale_temp_files(output_dir: &Path) -> usize {
    let entries = match fs::read_dir(output_dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Could not list {}: {}", output_dir.display(), e);
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let is_temp = name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX);
        if !is_temp || !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Could not remove stale temp file {}: {}", entry.path().display(), e),
        }
    }
    removed
}

fn build_batch(
    schema: &Arc<Schema>,
    records: &[NormalizedRecord],
) -> Result<RecordBatch, ArtifactError> {
    let mut b_source_path = StringBuilder::new();
    let mut b_source_name = StringBuilder::new();
    let mut b_sheet = StringBuilder::new();
    let mut b_row = Int64Builder::with_capacity(records.len());
    let mut b_column = Int64Builder::with_capacity(records.len());
    let mut b_value = StringBuilder::new();

    for record in records {
        b_source_path.append_value(&*record.source_path);
        b_source_name.append_value(&*record.source_name);
        b_sheet.append_value(&*record.sheet);
        b_row.append_value(record.row as i64);
        b_column.append_value(record.column as i64);
        b_value.append_value(&record.value);
    }

    let columns: Vec<ArrayRef> = vec![
        Arc::new(b_source_path.finish()),
        Arc::new(b_source_name.finish()),
        Arc::new(b_sheet.finish()),
        Arc::new(b_row.finish()),
        Arc::new(b_column.finish()),
        Arc::new(b_value.finish()),
    ];

    Ok(RecordBatch::try_new(schema.clone(), columns)?)
}

/// Distinct `source_path` values of one artifact, reading only that column.
pub fn read_source_paths(path: &Path) -> Result<HashSet<String>, ArtifactError> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let index = builder
        .schema()
        .index_of(SOURCE_PATH_COLUMN)
        .map_err(|_| ArtifactError::MissingColumn(SOURCE_PATH_COLUMN))?;
    let mask = ProjectionMask::roots(builder.parquet_schema(), [index]);
    let reader = builder.with_projection(mask).build()?;

    let mut paths = HashSet::new();
    for batch in reader {
        let batch = batch?;
        let column = batch
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or(ArtifactError::MissingColumn(SOURCE_PATH_COLUMN))?;
        for i in 0..column.len() {
            if column.is_valid(i) {
                paths.insert(column.value(i).to_string());
            }
        }
    }
    Ok(paths)
}

/// Every record of one artifact, in stored order.
pub fn read_records(path: &Path) -> Result<Vec<NormalizedRecord>, ArtifactError> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut records = Vec::new();
    for batch in reader {
        let batch = batch?;
        let source_path = string_column(&batch, SOURCE_PATH_COLUMN)?;
        let source_name = string_column(&batch, "source_name")?;
        let sheet = string_column(&batch, "sheet")?;
        let value = string_column(&batch, "value")?;
        let row = int_column(&batch, "row")?;
        let column = int_column(&batch, "column")?;

        for i in 0..batch.num_rows() {
            records.push(NormalizedRecord {
                source_path: source_path.value(i).into(),
                source_name: source_name.value(i).into(),
                sheet: sheet.value(i).into(),
                row: row.value(i) as u64,
                column: column.value(i) as u64,
                value: value.value(i).to_string(),
            });
        }
    }
    Ok(records)
}

fn string_column<'a>(
    batch: &'a RecordBatch,
    name: &'static str,
) -> Result<&'a StringArray, ArtifactError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or(ArtifactError::MissingColumn(name))
}

fn int_column<'a>(
    batch: &'a RecordBatch,
    name: &'static str,
) -> Result<&'a Int64Array, ArtifactError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<Int64Array>())
        .ok_or(ArtifactError::MissingColumn(name))
}
