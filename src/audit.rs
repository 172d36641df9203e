//! Append-only audit log.
//!
//! Every store operation leaves one line in the log, formatted as
//! `Message: <text> @Timestamp: <epoch-millis>`. The log is an explicit
//! handle: it is opened once at startup, shared behind an `Arc`, and closed
//! on shutdown so the last entries reach the disk.

use crate::{Result, StoreError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

const MESSAGE_PREFIX: &str = "Message: ";
const TIMESTAMP_SEPARATOR: &str = " @Timestamp: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub message: String,
    pub timestamp: u128,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            MESSAGE_PREFIX, self.message, TIMESTAMP_SEPARATOR, self.timestamp
        )
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("malformed log line: {0:?}")]
pub struct MalformedEntry(String);

impl FromStr for LogEntry {
    type Err = MalformedEntry;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let malformed = || MalformedEntry(line.to_string());
        let rest = line.strip_prefix(MESSAGE_PREFIX).ok_or_else(malformed)?;
        let (message, timestamp) = rest
            .rsplit_once(TIMESTAMP_SEPARATOR)
            .ok_or_else(malformed)?;
        let timestamp = timestamp.trim().parse().map_err(|_| malformed())?;
        Ok(LogEntry {
            message: message.to_string(),
            timestamp,
        })
    }
}

struct AuditState {
    file: Option<File>,
    last_timestamp: u128,
}

pub struct AuditLog {
    path: PathBuf,
    state: Mutex<AuditState>,
}

impl AuditLog {
    /// Opens `path` for appending, creating it and its parent directories if
    /// needed. Existing entries are kept.
    pub async fn open(path: impl Into<PathBuf>) -> Result<AuditLog> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(AuditLog {
            path,
            state: Mutex::new(AuditState {
                file: Some(file),
                last_timestamp: 0,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry. Timestamps never go backwards, even if the wall
    /// clock does.
    pub async fn log(&self, message: impl AsRef<str>) -> Result<LogEntry> {
        let mut state = self.state.lock().await;
        let timestamp = now_millis().max(state.last_timestamp);
        let entry = LogEntry {
            // one entry per line
            message: message.as_ref().replace('\n', "\\n"),
            timestamp,
        };

        let file = state.file.as_mut().ok_or(StoreError::AuditClosed)?;
        file.write_all(format!("{}\n", entry).as_bytes()).await?;
        file.flush().await?;
        state.last_timestamp = timestamp;

        Ok(entry)
    }

    /// Flushes and syncs the log. Later calls to [`AuditLog::log`] fail with
    /// [`StoreError::AuditClosed`].
    pub async fn close(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if let Some(mut file) = state.file.take() {
            file.flush().await?;
            file.sync_all().await?;
        }
        Ok(())
    }

    pub async fn entries(&self) -> Result<Vec<LogEntry>> {
        let contents = fs::read_to_string(&self.path).await?;
        contents
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| {
                line.parse::<LogEntry>().map_err(|e| {
                    StoreError::IO(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
                })
            })
            .collect()
    }
}

pub(crate) fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}
