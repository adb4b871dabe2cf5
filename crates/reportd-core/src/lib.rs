pub mod record;

pub use record::{now_timestamp, parse_line, parse_timestamp, render_line, LogLevel, LogRecord};
