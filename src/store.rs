//! SQLite-backed persistence for tasks.
//!
//! Every operation checks one connection out of the pool and holds it for the
//! duration of the call. The checkout is a guard, so the connection goes back
//! to the pool on every return path, including `?` on a failed query.

use std::{str::FromStr, time::Duration};

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Row, SqlitePool,
};
use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    task::{Priority, Task, TaskId},
};

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl StoreConfig {
    fn is_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }
}

/// Handle to the task table. Cloning shares the underlying pool.
#[derive(Debug, Clone)]
pub struct TaskStore {
    pool: SqlitePool,
}

impl TaskStore {
    /// Opens the process-wide pool. Call once at start-up and pass the
    /// resulting handle to everything that needs storage.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new().acquire_timeout(config.acquire_timeout);
        // Each in-memory connection is its own database.
        if config.is_memory() {
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>);
        } else {
            pool_options = pool_options.max_connections(config.max_connections.max(1));
        }

        let pool = pool_options.connect_with(options).await?;
        info!(
            database_url = %config.database_url,
            max_connections = config.max_connections,
            "connection pool ready"
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// All tasks, newest first.
    pub async fn list_all(&self) -> Result<Vec<Task>> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query(
            "SELECT id, task, completed, priority, created_at FROM todos \
             ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&mut *conn)
        .await?;

        debug!(count = rows.len(), "listed tasks");
        rows.into_iter().map(row_to_task).collect()
    }

    pub async fn insert(&self, task: &str, priority: Priority) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        let id = sqlx::query("INSERT INTO todos (task, priority) VALUES (?, ?)")
            .bind(task)
            .bind(priority.as_str())
            .execute(&mut *conn)
            .await?
            .last_insert_rowid();

        debug!(id, %priority, "inserted task");
        Ok(())
    }

    /// Missing ids are not an error; zero rows simply match.
    pub async fn set_completed(&self, id: i64, completed: bool) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        let affected = sqlx::query("UPDATE todos SET completed = ? WHERE id = ?")
            .bind(completed)
            .bind(id)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        debug!(id, completed, affected, "updated completion");
        Ok(())
    }

    /// Missing ids are not an error; zero rows simply match.
    pub async fn delete_by_id(&self, id: i64) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        let affected = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        debug!(id, affected, "deleted task");
        Ok(())
    }
}

fn row_to_task(row: SqliteRow) -> Result<Task> {
    let id: i64 = row.try_get("id")?;

    let priority: String = row.try_get("priority")?;
    let priority = priority.parse::<Priority>().map_err(|_| Error::CorruptRow {
        id,
        reason: format!("unknown priority '{priority}'"),
    })?;

    let created_at: String = row.try_get("created_at")?;
    let created_at = parse_timestamp(&created_at).ok_or_else(|| Error::CorruptRow {
        id,
        reason: format!("unreadable created_at '{created_at}'"),
    })?;

    Ok(Task {
        id: TaskId::Stored(id),
        task: row.try_get("task")?,
        completed: row.try_get("completed")?,
        priority,
        created_at,
    })
}

/// Accepts RFC 3339 (the column default) and SQLite's `CURRENT_TIMESTAMP`
/// layout for rows written by other tools.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
                .ok()
                .map(|ts| ts.and_utc())
        })
}
