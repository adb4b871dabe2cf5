//! Read-side operations over the log file: filtered queries, aggregate
//! stats, and the destructive backup-then-truncate clear.
//!
//! Every call re-reads the whole file; the text lines are the only source of
//! truth and nothing is cached between calls. A clear racing a concurrent
//! query can be observed as a partially truncated file.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use reportd_core::{parse_line, parse_timestamp, LogLevel, LogRecord};

use crate::error::StoreError;

/// Record cap applied when a query does not name its own limit.
pub const DEFAULT_QUERY_LIMIT: usize = 1000;

/// Filters for a log query. All fields optional and conjunctive.
#[derive(Clone, Debug, Default)]
pub struct LogQuery {
    /// Exact level match, case-insensitive.
    pub level: Option<String>,
    /// Case-insensitive substring over message or serialized meta.
    pub search: Option<String>,
    /// Inclusive lower bound; full timestamp or bare `YYYY-MM-DD`.
    pub start_date: Option<String>,
    /// Inclusive upper bound, same forms as `start_date`.
    pub end_date: Option<String>,
    pub limit: Option<usize>,
}

/// Result of a query: the limited page plus the pre-limit match count.
#[derive(Clone, Debug, Serialize)]
pub struct QueryOutcome {
    pub records: Vec<LogRecord>,
    pub total: usize,
    pub returned: usize,
}

/// Per-level record counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCounts {
    pub info: usize,
    pub warn: usize,
    pub error: usize,
}

/// Aggregate view over the whole file.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStats {
    pub total: usize,
    pub by_level: LevelCounts,
    pub file_size: u64,
    pub oldest_log: Option<String>,
    pub newest_log: Option<String>,
}

/// Outcome of a clear operation.
#[derive(Clone, Debug, Serialize)]
pub struct ClearOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
}

/// Read-side handle on the log file. Cheap to clone, holds no state beyond
/// the path.
#[derive(Clone, Debug)]
pub struct LogStore {
    path: PathBuf,
}

impl LogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every parseable record in file order (oldest first).
    /// An absent file is an empty dataset, not an error.
    fn load(&self) -> Result<Vec<LogRecord>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(parse_line)
            .collect())
    }

    /// Run a filtered query, newest record first.
    pub fn query(&self, q: &LogQuery) -> Result<QueryOutcome, StoreError> {
        let mut records = self.load()?;

        // newest-appended first; ties on identical timestamps keep reverse
        // file order
        records.reverse();

        if let Some(level) = &q.level {
            match level.parse::<LogLevel>() {
                Ok(want) => records.retain(|r| r.level == want),
                Err(()) => records.clear(),
            }
        }

        if let Some(search) = &q.search {
            let needle = search.to_lowercase();
            records.retain(|r| {
                r.message.to_lowercase().contains(&needle)
                    || serde_json::to_string(&r.meta)
                        .map(|meta| meta.to_lowercase().contains(&needle))
                        .unwrap_or(false)
            });
        }

        if let Some(start) = &q.start_date {
            let bound = parse_timestamp(start);
            records.retain(|r| matches!((parse_timestamp(&r.timestamp), bound),
                (Some(ts), Some(b)) if ts >= b));
        }

        if let Some(end) = &q.end_date {
            let bound = parse_timestamp(end);
            records.retain(|r| matches!((parse_timestamp(&r.timestamp), bound),
                (Some(ts), Some(b)) if ts <= b));
        }

        let total = records.len();
        records.truncate(q.limit.unwrap_or(DEFAULT_QUERY_LIMIT));
        let returned = records.len();

        Ok(QueryOutcome {
            records,
            total,
            returned,
        })
    }

    /// Aggregate counts over the whole file.
    pub fn stats(&self) -> Result<LogStats, StoreError> {
        let records = self.load()?;

        let file_size = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };

        let mut by_level = LevelCounts::default();
        for record in &records {
            match record.level {
                LogLevel::Info => by_level.info += 1,
                LogLevel::Warn => by_level.warn += 1,
                LogLevel::Error => by_level.error += 1,
            }
        }

        Ok(LogStats {
            total: records.len(),
            by_level,
            file_size,
            // file order, not sorted: the first line is reported as newest
            // and the last as oldest, matching the existing dashboard
            newest_log: records.first().map(|r| r.timestamp.clone()),
            oldest_log: records.last().map(|r| r.timestamp.clone()),
        })
    }

    /// Snapshot the file to `<path>.backup.<epoch-millis>`, then truncate it.
    ///
    /// The copy is fully written and synced before the primary is touched, so
    /// an interruption can duplicate data but never lose it.
    pub fn clear(&self) -> Result<ClearOutcome, StoreError> {
        if !self.path.exists() {
            return Ok(ClearOutcome {
                success: true,
                message: "log file already empty".into(),
                backup: None,
            });
        }

        let backup = PathBuf::from(format!(
            "{}.backup.{}",
            self.path.display(),
            Utc::now().timestamp_millis()
        ));

        {
            let mut src = File::open(&self.path)?;
            let mut dst = File::create(&backup)?;
            io::copy(&mut src, &mut dst)?;
            dst.sync_all()?;
        }

        OpenOptions::new().write(true).truncate(true).open(&self.path)?;

        Ok(ClearOutcome {
            success: true,
            message: "logs cleared".into(),
            backup: Some(backup),
        })
    }
}
