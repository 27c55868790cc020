use clap::Parser;
use sov_convert::AppConfig;
use std::path::PathBuf;

#[derive(Debug, Parser)] // requires `derive` feature
#[command(name = "sov-convert", version)]
#[command(
    about = "Find spreadsheets below SOV directories and convert them to long-format Parquet",
    long_about = None
)]
pub struct Cli {
    /// Root directories to search
    #[arg(required = true, value_name = "ROOT_DIRS")]
    pub roots: Vec<PathBuf>,

    /// Directory the Parquet artifacts are written to
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Ignore the file registry and scan the roots again
    #[arg(long)]
    pub rescan: bool,

    /// Log filter, e.g. `info` or `sov_convert=debug`
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Also write logs to this file (appended)
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Configuration file to use instead of ./Config.toml
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path segment marking a target directory
    #[arg(long, value_name = "SEGMENT")]
    pub pattern: Option<String>,

    /// Worker threads for conversion
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// Worker threads for directory traversal
    #[arg(long, value_name = "N")]
    pub scan_workers: Option<usize>,

    /// Subdirectories to collect before traversal goes parallel
    #[arg(long, value_name = "N")]
    pub parallel_threshold: Option<usize>,

    /// Location of the file registry CSV
    #[arg(long, value_name = "FILE")]
    pub registry: Option<PathBuf>,

    /// Also report the directory named by the pattern itself
    #[arg(long)]
    pub include_match_root: bool,

    /// Reject sheets whose grid from A1 holds more than N cells
    #[arg(long, value_name = "N")]
    pub max_cells: Option<usize>,
}

impl Cli {
    /// Command-line flags take precedence over file and environment settings.
    pub fn apply_overrides(&self, mut config: AppConfig) -> AppConfig {
        if let Some(pattern) = &self.pattern {
            config.pattern = pattern.clone();
        }
        if let Some(workers) = self.workers {
            config.convert_workers = Some(workers);
        }
        if let Some(workers) = self.scan_workers {
            config.scan_workers = Some(workers);
        }
        if let Some(threshold) = self.parallel_threshold {
            config.parallel_threshold = threshold;
        }
        if let Some(registry) = &self.registry {
            config.registry_path = registry.to_string_lossy().into_owned();
        }
        if self.include_match_root {
            config.include_match_root = true;
        }
        if let Some(max_cells) = self.max_cells {
            config.max_cells = max_cells;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let cli = Cli::try_parse_from(["sov-convert", "/data", "--output", "/out"]).unwrap();
        assert_eq!(cli.roots, vec![PathBuf::from("/data")]);
        assert_eq!(cli.output, PathBuf::from("/out"));
        assert!(!cli.rescan);
    }

    #[test]
    fn test_roots_are_required() {
        assert!(Cli::try_parse_from(["sov-convert", "--output", "/out"]).is_err());
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "sov-convert",
            "/a",
            "/b",
            "-o",
            "/out",
            "--pattern",
            "Schedules",
            "--workers",
            "4",
            "--include-match-root",
            "--max-cells",
            "250000",
        ])
        .unwrap();
        let config = cli.apply_overrides(AppConfig::default());
        assert_eq!(config.pattern, "Schedules");
        assert_eq!(config.convert_workers, Some(4));
        assert_eq!(config.scan_workers, None);
        assert!(config.include_match_root);
        assert_eq!(config.max_cells, 250_000);
    }
}
