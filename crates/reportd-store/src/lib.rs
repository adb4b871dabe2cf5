pub mod error;
pub mod store;
pub mod writer;

pub use error::StoreError;
pub use store::{ClearOutcome, LevelCounts, LogQuery, LogStats, LogStore, QueryOutcome, DEFAULT_QUERY_LIMIT};
pub use writer::LogWriter;
