//! Log storage in plain JSON-lines files.
//!
//! Layout inside the log directory:
//! - `logs-all.log`: every entry
//! - `logs-medium.log`: medium entries
//! - `logs-high.log`: high entries

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

use crate::domain::{LogEntry, LogRepository, LogSeverity, SystemClock};
use crate::error::RepositoryError;

pub const ALL_LOGS_FILE: &str = "logs-all.log";
pub const MEDIUM_LOGS_FILE: &str = "logs-medium.log";
pub const HIGH_LOGS_FILE: &str = "logs-high.log";

pub struct FileSystemLogRepository {
    directory: PathBuf,
    // Orders the all-file and severity-file appends of one entry within this process
    write_lock: Mutex<()>,
}

impl FileSystemLogRepository {
    /// Open the repository, creating the directory and the log files if needed
    pub async fn open(directory: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory).await?;

        for file in [ALL_LOGS_FILE, MEDIUM_LOGS_FILE, HIGH_LOGS_FILE] {
            OpenOptions::new().create(true).append(true).open(directory.join(file)).await?;
        }

        Ok(Self { directory, write_lock: Mutex::new(()) })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File holding the entries returned for `severity`
    pub fn path_for(&self, severity: LogSeverity) -> PathBuf {
        let file = match severity {
            LogSeverity::Low => ALL_LOGS_FILE,
            LogSeverity::Medium => MEDIUM_LOGS_FILE,
            LogSeverity::High => HIGH_LOGS_FILE,
        };
        self.directory.join(file)
    }

    /// Every log file this repository writes, in attachment order
    pub fn log_files(&self) -> Vec<PathBuf> {
        [ALL_LOGS_FILE, HIGH_LOGS_FILE, MEDIUM_LOGS_FILE]
            .iter()
            .map(|file| self.directory.join(file))
            .collect()
    }

    /// One write per record on an O_APPEND handle; lines from concurrent writers never interleave
    async fn append_line(path: &Path, line: &str) -> Result<(), RepositoryError> {
        let record = format!("{line}\n");
        let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
        file.write_all(record.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn read_entries(path: &Path) -> Result<Vec<LogEntry>, RepositoryError> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for (number, line) in content.lines().enumerate() {
            match LogEntry::from_json(line, &SystemClock) {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable record at {}:{}: {}", path.display(), number + 1, e),
            }
        }
        Ok(entries)
    }
}

#[async_trait]
impl LogRepository for FileSystemLogRepository {
    fn name(&self) -> &str {
        "file_system"
    }

    async fn save_log(&self, entry: &LogEntry) -> Result<(), RepositoryError> {
        let line = entry.to_json().map_err(RepositoryError::Serialize)?;
        let _guard = self.write_lock.lock().await;

        Self::append_line(&self.path_for(LogSeverity::Low), &line).await?;
        if entry.level() != LogSeverity::Low {
            Self::append_line(&self.path_for(entry.level()), &line).await?;
        }
        Ok(())
    }

    async fn get_logs(&self, severity: LogSeverity) -> Result<Vec<LogEntry>, RepositoryError> {
        Self::read_entries(&self.path_for(severity)).await
    }
}
