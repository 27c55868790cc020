use crate::convert::table::DEFAULT_MAX_CELLS;
use crate::registry::DEFAULT_REGISTRY_PATH;
use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::path::Path;

pub const ENV_PREFIX: &str = "SOV_CONVERT";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Path segment that marks a target directory, matched case-sensitively.
    pub pattern: String,
    pub parallel_threshold: usize,
    pub scan_workers: Option<usize>,
    pub convert_workers: Option<usize>,
    pub registry_path: String,
    pub include_match_root: bool,
    pub ignore_patterns: Vec<String>,
    /// Sheets whose grid (counted from A1) exceeds this many cells are rejected.
    pub max_cells: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            pattern: "SOV".to_string(),
            parallel_threshold: 10,
            scan_workers: None,
            convert_workers: None,
            registry_path: DEFAULT_REGISTRY_PATH.to_string(),
            include_match_root: false,
            ignore_patterns: Vec::new(),
            max_cells: DEFAULT_MAX_CELLS,
        }
    }
}

/// Loads `Config.toml` from the working directory (or `path` when given),
/// then applies `SOV_CONVERT_*` environment overrides.
pub fn load_configuration(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let file_source = match path {
        Some(path) => ConfigFile::from(path).required(true),
        None => ConfigFile::with_name("Config").required(false),
    };

    let builder = Config::builder()
        .add_source(file_source)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("ignore_patterns"),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.pattern, "SOV");
        assert_eq!(config.parallel_threshold, 10);
        assert_eq!(config.registry_path, "data/files.csv");
        assert!(!config.include_match_root);
        assert_eq!(config.max_cells, DEFAULT_MAX_CELLS);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(
            &path,
            "pattern = \"Schedules\"\nparallel_threshold = 4\nmax_cells = 1000\n\
             ignore_patterns = [\"**/.git\"]\n",
        )
        .unwrap();

        let config = load_configuration(Some(&path)).unwrap();
        assert_eq!(config.pattern, "Schedules");
        assert_eq!(config.parallel_threshold, 4);
        assert_eq!(config.max_cells, 1000);
        assert_eq!(config.ignore_patterns, vec!["**/.git".to_string()]);
        assert_eq!(config.scan_workers, None);
        assert_eq!(config.registry_path, "data/files.csv");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempdir().unwrap();
        assert!(load_configuration(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
