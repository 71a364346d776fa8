use async_trait::async_trait;

use super::log_entry::{LogEntry, LogSeverity};
use crate::error::RepositoryError;

/// Storage for log entries.
#[async_trait]
pub trait LogRepository: Send + Sync {
    /// Short name used when reporting failures
    fn name(&self) -> &str;

    /// Persist one entry
    async fn save_log(&self, entry: &LogEntry) -> Result<(), RepositoryError>;

    /// Entries recorded for `severity`, oldest first.
    ///
    /// What `Low` selects is up to the adapter: the file store keeps no low-only file and
    /// returns every entry, the SQLite store returns only low rows.
    async fn get_logs(&self, severity: LogSeverity) -> Result<Vec<LogEntry>, RepositoryError>;
}
