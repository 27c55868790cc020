pub mod files;
pub mod pattern;
pub mod tree;

pub use files::discover_files;
pub use pattern::{PathPattern, SegmentMatch};
pub use tree::{compile_ignore_patterns, ScanOptions, TreeScanner};
