pub mod artifact;
pub mod dedup;
pub mod normalize;
pub mod reader;
pub mod scheduler;
pub mod table;

pub use artifact::{artifact_schema, write_artifact};
pub use dedup::already_processed;
pub use normalize::{normalize, Normalized};
pub use reader::{select_reader, SheetReader, Workbook};
pub use scheduler::WorkScheduler;
pub use table::{Cell, GridTooLarge, Table, DEFAULT_MAX_CELLS};
