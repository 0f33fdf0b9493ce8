//! Schema provisioning for the `todos` table.
//!
//! Safe to run any number of times. Existing rows are never touched: a table
//! created before priorities existed gets the `priority` column added with
//! `medium` as the value for every existing row.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::Result;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS todos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        task TEXT NOT NULL,
        completed BOOLEAN NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
    )
"#;

const ADD_PRIORITY: &str = "ALTER TABLE todos ADD COLUMN priority TEXT NOT NULL DEFAULT 'medium' \
     CHECK (priority IN ('low', 'medium', 'high'))";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MigrationReport {
    pub created_table: bool,
    pub added_priority: bool,
}

pub async fn ensure_schema(pool: &SqlitePool) -> Result<MigrationReport> {
    let mut conn = pool.acquire().await?;
    debug!("checking database schema");

    let table_exists: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'todos'",
    )
    .fetch_one(&mut *conn)
    .await?;

    let mut report = MigrationReport::default();

    if table_exists == 0 {
        sqlx::query(CREATE_TABLE).execute(&mut *conn).await?;
        report.created_table = true;
        info!("created todos table");
    }

    let has_priority: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('todos') WHERE name = 'priority'",
    )
    .fetch_one(&mut *conn)
    .await?;

    if has_priority == 0 {
        sqlx::query(ADD_PRIORITY).execute(&mut *conn).await?;
        report.added_priority = true;
        info!("added priority column");
    } else {
        debug!("priority column already exists");
    }

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_todos_created_at ON todos (created_at)")
        .execute(&mut *conn)
        .await?;

    Ok(report)
}
