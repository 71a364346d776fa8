use anyhow::Result;
use async_trait::async_trait;
use chrono::SecondsFormat;
use libsql::params;
use serde_json::json;

use crate::database::initialize_database;
use crate::domain::{LogEntry, LogRepository, LogSeverity, SystemClock};
use crate::error::RepositoryError;
use crate::pool::{LibsqlManager, LibsqlPool};

/// Log storage in a libsql (SQLite) database
pub struct SqliteLogRepository {
    pool: LibsqlPool,
}

impl SqliteLogRepository {
    /// Wrap a pool, bringing the schema up to date first
    pub async fn open(pool: LibsqlPool) -> Result<Self> {
        let conn = pool.get().await?;
        initialize_database(&conn).await?;
        drop(conn);

        Ok(Self { pool })
    }

    /// Get a connection from the pool
    async fn get_conn(&self) -> Result<deadpool::managed::Object<LibsqlManager>, RepositoryError> {
        self.pool.get().await.map_err(|e| RepositoryError::Pool(e.to_string()))
    }
}

#[async_trait]
impl LogRepository for SqliteLogRepository {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn save_log(&self, entry: &LogEntry) -> Result<(), RepositoryError> {
        let conn = self.get_conn().await?;
        // Fixed-width timestamps keep ORDER BY created_at chronological
        let created_at = entry.created_at().to_rfc3339_opts(SecondsFormat::Nanos, true);

        conn.execute(
            "INSERT INTO logs (message, level, origin, created_at) VALUES (?, ?, ?, ?)",
            params![entry.message(), entry.level().as_str(), entry.origin(), created_at],
        )
        .await?;

        Ok(())
    }

    async fn get_logs(&self, severity: LogSeverity) -> Result<Vec<LogEntry>, RepositoryError> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare("SELECT message, level, origin, created_at FROM logs WHERE level = ? ORDER BY created_at, id")
            .await?;

        let mut rows = stmt.query(params![severity.as_str()]).await?;
        let mut entries = Vec::new();

        while let Some(row) = rows.next().await? {
            let record = json!({
                "message": row.get::<String>(0)?,
                "level": row.get::<String>(1)?,
                "origin": row.get::<String>(2)?,
                "createdAt": row.get::<String>(3)?,
            });
            if let Some(entry) = LogEntry::from_value(Some(record), &SystemClock)? {
                entries.push(entry);
            }
        }

        Ok(entries)
    }
}
