use crate::model::DiscoveredFile;
use chrono::Local;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extensions the converter knows how to read, lower-case.
pub const SPREADSHEET_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xlsb", "xls"];

pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            SPREADSHEET_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Lists spreadsheets sitting directly inside each target directory.
///
/// Every nested directory below a match is itself a target directory, so a
/// depth-one listing covers each subtree exactly once.
pub fn discover_files<P: AsRef<Path>>(target_dirs: &[P]) -> Vec<DiscoveredFile> {
    let discovered_at = Local::now();
    let mut paths: BTreeSet<PathBuf> = BTreeSet::new();

    for dir in target_dirs {
        let dir = dir.as_ref();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Error listing {}: {}", dir.display(), err);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !is_spreadsheet(entry.path()) {
                continue;
            }

            let resolved = match fs::canonicalize(entry.path()) {
                Ok(path) => path,
                Err(err) => {
                    warn!("Error resolving {}: {}", entry.path().display(), err);
                    continue;
                }
            };
            paths.insert(resolved);
        }
        debug!("Listed {}", dir.display());
    }

    info!(
        "Found {} spreadsheet file(s) in {} target director(ies)",
        paths.len(),
        target_dirs.len()
    );

    paths
        .into_iter()
        .map(|path| DiscoveredFile::new(path, discovered_at))
        .collect()
}
