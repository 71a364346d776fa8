/// Database layer for the SQLite log store
///
/// Schema changes go through versioned migrations; the repository itself lives in
/// `infrastructure::sqlite_log_repository`.

pub mod migrations;

use anyhow::Result;

/// Initialize database with schema
pub async fn initialize_database(conn: &libsql::Connection) -> Result<()> {
    migrations::run_migrations(conn).await
}
