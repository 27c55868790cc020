pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod model;
pub mod progress;
pub mod registry;
pub mod scanner;

pub use config::AppConfig;
pub use engine::{ConvertEngine, RunSummary};
pub use error::Error;
pub use model::{ConversionResult, DiscoveredFile, NormalizedRecord, ProcessingStats};
pub use progress::{ProgressReporter, SilentReporter};
