use crate::convert::artifact::{read_source_paths, ARTIFACT_EXTENSION};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Source paths already present in the artifacts under `output_dir`.
///
/// A missing or unlistable directory yields an empty set. An artifact that
/// cannot be read is skipped with a warning; the rest still count.
pub fn already_processed(output_dir: &Path) -> HashSet<String> {
    let artifacts = match list_artifacts(output_dir) {
        Ok(artifacts) => artifacts,
        Err(err) => {
            debug!(
                "No existing artifacts in {}: {}",
                output_dir.display(),
                err
            );
            return HashSet::new();
        }
    };

    let per_artifact: Vec<HashSet<String>> = artifacts
        .par_iter()
        .filter_map(|path| match read_source_paths(path) {
            Ok(paths) => Some(paths),
            Err(err) => {
                warn!("Skipping unreadable artifact {}: {}", path.display(), err);
                None
            }
        })
        .collect();

    let processed: HashSet<String> = per_artifact.into_iter().flatten().collect();
    debug!(
        "{} source path(s) already converted across {} artifact(s)",
        processed.len(),
        artifacts.len()
    );
    processed
}

fn list_artifacts(output_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut artifacts = Vec::new();
    for entry in fs::read_dir(output_dir)? {
        let path = entry?.path();
        let is_artifact = path
            .extension()
            .map(|ext| ext == ARTIFACT_EXTENSION)
            .unwrap_or(false);
        if is_artifact && path.is_file() {
            artifacts.push(path);
        }
    }
    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::artifact::write_artifact;
    use crate::model::NormalizedRecord;
    use tempfile::tempdir;

    fn record(source: &str) -> NormalizedRecord {
        NormalizedRecord {
            source_path: source.into(),
            source_name: "book.xlsx".into(),
            sheet: "Sheet1".into(),
            row: 0,
            column: 0,
            value: "v".to_string(),
        }
    }

    #[test]
    fn test_missing_output_dir_is_empty() {
        let dir = tempdir().unwrap();
        assert!(already_processed(&dir.path().join("missing")).is_empty());
    }

    #[test]
    fn test_collects_across_artifacts() {
        let dir = tempdir().unwrap();
        write_artifact(dir.path(), &[record("/a/one.xlsx")]).unwrap();
        write_artifact(dir.path(), &[record("/a/two.xlsx"), record("/a/one.xlsx")]).unwrap();

        let processed = already_processed(dir.path());
        assert_eq!(processed.len(), 2);
        assert!(processed.contains("/a/one.xlsx"));
        assert!(processed.contains("/a/two.xlsx"));
    }

    #[test]
    fn test_corrupt_artifact_is_skipped() {
        let dir = tempdir().unwrap();
        write_artifact(dir.path(), &[record("/a/one.xlsx")]).unwrap();
        fs::write(dir.path().join("broken.parquet"), b"garbage").unwrap();
        fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let processed = already_processed(dir.path());
        assert_eq!(processed.len(), 1);
        assert!(processed.contains("/a/one.xlsx"));
    }
}
