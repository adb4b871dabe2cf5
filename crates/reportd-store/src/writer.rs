//! Append-only log writer.
//!
//! `write` renders one line, echoes it to the console synchronously, and
//! hands it to a background appender task. The appender owns the file; its
//! failures surface on the diagnostics channel only and never reach the
//! caller.

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use reportd_core::{now_timestamp, render_line, LogLevel};

enum Command {
    Append(String),
    Flush(oneshot::Sender<()>),
}

/// Process-wide writer for the application log file.
#[derive(Clone)]
pub struct LogWriter {
    tx: mpsc::UnboundedSender<Command>,
    path: Option<PathBuf>,
}

impl LogWriter {
    /// Create the writer, its parent directory, and the background appender.
    ///
    /// If the directory cannot be created (read-only filesystem), the writer
    /// degrades to console-only mode instead of failing.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
        let path = match parent.map(std::fs::create_dir_all) {
            Some(Err(e)) => {
                warn!(error = %e, "cannot create log directory, using console only");
                None
            }
            _ => Some(path),
        };

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_appender(path.clone(), rx));

        Self { tx, path }
    }

    /// The log file path, or `None` in console-only mode.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write one entry: console echo now, file append in the background.
    pub fn write(&self, level: LogLevel, message: &str, meta: Map<String, Value>) {
        let line = render_line(&now_timestamp(), level, message, &meta);

        match level {
            LogLevel::Error => eprintln!("{line}"),
            _ => println!("{line}"),
        }

        // the appender may already be gone during shutdown; dropping the
        // line is the contract either way
        let _ = self.tx.send(Command::Append(line));
    }

    pub fn info(&self, message: &str, meta: Map<String, Value>) {
        self.write(LogLevel::Info, message, meta);
    }

    pub fn warn(&self, message: &str, meta: Map<String, Value>) {
        self.write(LogLevel::Warn, message, meta);
    }

    pub fn error(&self, message: &str, meta: Map<String, Value>) {
        self.write(LogLevel::Error, message, meta);
    }

    /// Wait until every entry enqueued before this call has been appended.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(Command::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }
}

async fn run_appender(path: Option<PathBuf>, mut rx: mpsc::UnboundedReceiver<Command>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            Command::Append(line) => {
                let Some(path) = &path else { continue };
                if let Err(e) = append_line(path, &line) {
                    warn!(error = %e, "log file write error");
                }
            }
            Command::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    file.write_all(b"\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use reportd_core::parse_line;
    use serde_json::json;

    fn temp_log_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("reportd-test-writer-{}", uuid::Uuid::now_v7()))
            .join("app.log")
    }

    #[tokio::test]
    async fn written_lines_land_in_the_file_in_order() {
        let path = temp_log_path();
        let writer = LogWriter::new(&path);

        let mut meta = Map::new();
        meta.insert("port".into(), json!(3000));
        writer.info("Server started", meta);
        writer.error("DB failed", Map::new());
        writer.flush().await;

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first = parse_line(lines[0]).unwrap();
        assert_eq!(first.message, "Server started");
        assert_eq!(first.meta["port"], json!(3000));

        let second = parse_line(lines[1]).unwrap();
        assert_eq!(second.message, "DB failed");
        assert!(second.meta.is_empty());
    }

    #[tokio::test]
    async fn every_line_carries_a_meta_block() {
        let path = temp_log_path();
        let writer = LogWriter::new(&path);

        writer.warn("no meta here", Map::new());
        writer.flush().await;

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.trim_end().ends_with(" {}"));
    }

    #[tokio::test]
    async fn unwritable_directory_degrades_to_console_only() {
        // a file where the parent directory should be makes create_dir_all fail
        let base = std::env::temp_dir().join(format!("reportd-test-ro-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&base).unwrap();
        let blocker = base.join("blocker");
        std::fs::write(&blocker, b"").unwrap();

        let writer = LogWriter::new(blocker.join("logs").join("app.log"));
        assert!(writer.path().is_none());

        // must not panic or error
        writer.info("still fine", Map::new());
        writer.flush().await;
    }

    #[tokio::test]
    async fn flush_waits_for_prior_appends() {
        let path = temp_log_path();
        let writer = LogWriter::new(&path);

        for i in 0..50 {
            writer.info(&format!("msg {i}"), Map::new());
        }
        writer.flush().await;

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 50);
    }
}
