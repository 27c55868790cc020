use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Input validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Registry error: {0}")]
    Registry(#[from] csv::Error),
}

impl Error {
    /// Errors caused by what the user asked for, rather than by the pipeline itself.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::Config(_))
    }
}

/// Pre-flight failures, raised before any directory is scanned or file converted.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Root directory does not exist: {0}")]
    RootMissing(PathBuf),

    #[error("Root path is not a directory: {0}")]
    RootNotDirectory(PathBuf),

    #[error("Root directory is not readable: {path}: {source}")]
    RootUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Output path exists but is not a directory: {0}")]
    OutputNotDirectory(PathBuf),

    #[error("Output directory is not writable: {path}: {source}")]
    OutputNotWritable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid path pattern '{0}': must be a single non-empty path segment")]
    InvalidPattern(String),

    #[error("Invalid ignore pattern '{pattern}': {reason}")]
    InvalidIgnorePattern { pattern: String, reason: String },
}

#[derive(Error, Debug, Clone)]
pub enum ReadError {
    /// The workbook itself could not be opened; aborts the whole file.
    #[error("Failed to open workbook '{path}': {reason}")]
    Open { path: PathBuf, reason: String },

    /// One sheet could not be read; the remaining sheets are still attempted.
    #[error("Failed to read sheet '{sheet}': {reason}")]
    Sheet { sheet: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to move artifact into place: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Artifact has no '{0}' column")]
    MissingColumn(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_is_user_error() {
        let err: Error = ValidationError::RootMissing(PathBuf::from("/missing")).into();
        assert!(err.is_user_error());
        assert!(err.to_string().contains("/missing"));
    }

    #[test]
    fn test_io_error_is_not_user_error() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert!(!err.is_user_error());
    }
}
