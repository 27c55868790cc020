//! Flat-file cache of discovered spreadsheets.
//!
//! One CSV row per file with the header `source_path,extension,discovered_at`.
//! A present registry lets a run skip tree scanning entirely.

use crate::error::Result;
use crate::model::DiscoveredFile;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_REGISTRY_PATH: &str = "data/files.csv";

#[derive(Debug, Clone)]
pub struct Registry {
    path: PathBuf,
}

impl Registry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Registry { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn load(&self) -> Result<Vec<DiscoveredFile>> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let files = reader
            .deserialize()
            .collect::<std::result::Result<Vec<DiscoveredFile>, csv::Error>>()?;
        info!(
            "Loaded {} file(s) from registry {}",
            files.len(),
            self.path.display()
        );
        Ok(files)
    }

    /// Rewrites the registry, creating parent directories as needed.
    pub fn save(&self, files: &[DiscoveredFile]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        for file in files {
            writer.serialize(file)?;
        }
        writer.flush()?;

        debug!(
            "Saved {} file(s) to registry {}",
            files.len(),
            self.path.display()
        );
        Ok(())
    }
}
