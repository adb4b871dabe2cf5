//! The log line format: one `\n`-terminated entry per record, rendered and
//! parsed by this module.
//!
//! Layout (fixed, shared with every existing consumer of the log file):
//!
//! ```text
//! [2025-12-22T12:23:00.889Z] [INFO] Server started {"host":"0.0.0.0","port":3000}
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Lowercase form, the canonical one on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Uppercase form used inside the bracketed line layout.
    pub fn as_upper(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ();

    /// Case-insensitive; anything outside the three known levels is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("info") {
            Ok(LogLevel::Info)
        } else if s.eq_ignore_ascii_case("warn") {
            Ok(LogLevel::Warn)
        } else if s.eq_ignore_ascii_case("error") {
            Ok(LogLevel::Error)
        } else {
            Err(())
        }
    }
}

/// One structured log entry, reconstructed from its text line on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
    pub meta: Map<String, Value>,
}

fn line_regex() -> &'static Regex {
    static LINE_RE: OnceLock<Regex> = OnceLock::new();
    LINE_RE.get_or_init(|| {
        // bracketed timestamp, bracketed level, lazy message, optional
        // trailing JSON blob introduced by " {"
        Regex::new(r"^\[([^\]]+)\] \[([^\]]+)\] (.+?)( \{.*\})?$").unwrap()
    })
}

/// Render one log line (without the trailing newline).
///
/// The meta block is always present, `{}` included, so a rendered line always
/// has four parseable parts.
pub fn render_line(
    timestamp: &str,
    level: LogLevel,
    message: &str,
    meta: &Map<String, Value>,
) -> String {
    let meta_json = serde_json::to_string(meta).unwrap_or_else(|_| "{}".into());
    format!("[{timestamp}] [{}] {message} {meta_json}", level.as_upper())
}

/// Current wall-clock time in the line format's timestamp shape
/// (millisecond precision, `Z` suffix).
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored or user-supplied timestamp for date comparisons.
///
/// Accepts a full ISO-8601 timestamp or a bare `YYYY-MM-DD`, which means
/// midnight UTC of that day.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::from_str(s)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse one line back into a [`LogRecord`].
///
/// Returns `None` when the line does not match the layout (or carries an
/// unknown level). A malformed trailing meta blob degrades to an empty map
/// rather than invalidating the record.
pub fn parse_line(line: &str) -> Option<LogRecord> {
    let caps = line_regex().captures(line)?;

    let timestamp = caps.get(1)?.as_str().to_string();
    let level = caps.get(2)?.as_str().parse::<LogLevel>().ok()?;
    let message = caps.get(3)?.as_str().to_string();

    let meta = caps
        .get(4)
        .and_then(|blob| serde_json::from_str::<Value>(blob.as_str().trim()).ok())
        .and_then(|value| match value {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .unwrap_or_default();

    Some(LogRecord {
        timestamp,
        level,
        message,
        meta,
    })
}
