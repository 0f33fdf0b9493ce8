use std::time::Duration;

use chrono::{TimeZone, Utc};
use ratatui::{backend::TestBackend, Terminal};
use sqlx::SqlitePool;
use tempfile::TempDir;

use crate::{
    migrate::ensure_schema,
    store::{StoreConfig, TaskStore},
    task::{Priority, Task, TaskId},
};

fn scratch_config(dir: &TempDir, max_connections: u32) -> StoreConfig {
    StoreConfig {
        database_url: format!("sqlite://{}", dir.path().join("todos.db").display()),
        max_connections,
        acquire_timeout: Duration::from_secs(2),
    }
}

/// Empty database file without the schema.
pub async fn scratch_pool() -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().unwrap();
    let store = TaskStore::connect(&scratch_config(&dir, 2)).await.unwrap();
    (dir, store.pool().clone())
}

pub async fn scratch_store_with(max_connections: u32) -> (TempDir, TaskStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = TaskStore::connect(&scratch_config(&dir, max_connections))
        .await
        .unwrap();
    ensure_schema(store.pool()).await.unwrap();
    (dir, store)
}

pub async fn scratch_store() -> (TempDir, TaskStore) {
    scratch_store_with(4).await
}

pub fn stored_task(id: i64, text: &str, completed: bool, priority: Priority) -> Task {
    Task {
        id: TaskId::Stored(id),
        task: text.to_string(),
        completed,
        priority,
        created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::minutes(id),
    }
}

/// Rendered cells, one line per row.
pub fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
    let buffer = terminal.backend().buffer();
    let mut text = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            text.push_str(buffer[(x, y)].symbol());
        }
        text.push('\n');
    }
    text
}
