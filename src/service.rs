//! The mutation surface used by the board.
//!
//! Every successful write invalidates the cached snapshot and bumps a revision
//! counter. Refreshers watching the revision re-read the list; invalidation
//! happens after the write committed, so it never undoes one.

use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    store::TaskStore,
    task::{Priority, Task},
};

#[derive(Debug)]
struct SnapshotCache {
    tasks: RwLock<Option<Vec<Task>>>,
    revision: watch::Sender<u64>,
}

#[derive(Debug, Clone)]
pub struct TaskService {
    store: TaskStore,
    cache: Arc<SnapshotCache>,
}

impl TaskService {
    pub fn new(store: TaskStore) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            store,
            cache: Arc::new(SnapshotCache {
                tasks: RwLock::new(None),
                revision,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.cache.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.cache.revision.borrow()
    }

    pub async fn fetch_all(&self) -> Result<Vec<Task>> {
        if let Some(tasks) = self.cache.tasks.read().await.as_ref() {
            debug!(count = tasks.len(), "serving cached snapshot");
            return Ok(tasks.clone());
        }

        let seen = self.revision();
        let tasks = self.store.list_all().await?;

        let mut slot = self.cache.tasks.write().await;
        // A write that landed while we were reading makes this list stale.
        if self.revision() == seen {
            *slot = Some(tasks.clone());
        }
        Ok(tasks)
    }

    pub async fn create(&self, task: &str, priority: Priority) -> Result<()> {
        let task = task.trim();
        if task.is_empty() {
            return Err(Error::EmptyTask);
        }
        self.store.insert(task, priority).await?;
        info!(%priority, "task created");
        self.invalidate().await;
        Ok(())
    }

    pub async fn set_completed(&self, id: i64, completed: bool) -> Result<()> {
        self.store.set_completed(id, completed).await?;
        info!(id, completed, "task completion changed");
        self.invalidate().await;
        Ok(())
    }

    pub async fn remove(&self, id: i64) -> Result<()> {
        self.store.delete_by_id(id).await?;
        info!(id, "task removed");
        self.invalidate().await;
        Ok(())
    }

    /// Drops the cached snapshot and notifies subscribers.
    pub async fn invalidate(&self) {
        let mut slot = self.cache.tasks.write().await;
        *slot = None;
        self.cache.revision.send_modify(|revision| *revision += 1);
        debug!(revision = self.revision(), "snapshot invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::scratch_store;

    #[tokio::test]
    async fn create_is_visible_in_the_next_fetch() {
        let (_dir, store) = scratch_store().await;
        let service = TaskService::new(store);
        assert!(service.fetch_all().await.unwrap().is_empty());

        service.create("  plan sprint  ", Priority::High).await.unwrap();

        let tasks = service.fetch_all().await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].task, "plan sprint");
        assert_eq!(tasks[0].priority, Priority::High);
    }

    #[tokio::test]
    async fn cached_snapshot_is_served_until_invalidated() {
        let (_dir, store) = scratch_store().await;
        let service = TaskService::new(store.clone());
        service.fetch_all().await.unwrap();

        store.insert("behind the cache", Priority::Low).await.unwrap();
        assert!(service.fetch_all().await.unwrap().is_empty());

        service.invalidate().await;
        assert_eq!(service.fetch_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn every_mutation_bumps_the_revision() {
        let (_dir, store) = scratch_store().await;
        let service = TaskService::new(store);
        let mut revisions = service.subscribe();

        service.create("a", Priority::Low).await.unwrap();
        assert!(revisions.has_changed().unwrap());
        revisions.mark_unchanged();

        let id = service.fetch_all().await.unwrap()[0].id.stored().unwrap();
        service.set_completed(id, true).await.unwrap();
        assert!(revisions.has_changed().unwrap());
        revisions.mark_unchanged();

        service.remove(id).await.unwrap();
        assert!(revisions.has_changed().unwrap());
        assert_eq!(service.revision(), 3);
    }

    #[tokio::test]
    async fn missing_ids_still_succeed() {
        let (_dir, store) = scratch_store().await;
        let service = TaskService::new(store);

        service.set_completed(404, true).await.unwrap();
        service.remove(404).await.unwrap();
    }

    #[tokio::test]
    async fn blank_text_is_rejected_before_the_store() {
        let (_dir, store) = scratch_store().await;
        let service = TaskService::new(store);

        let result = service.create(" \t ", Priority::Medium).await;

        assert!(matches!(result, Err(Error::EmptyTask)));
        assert_eq!(service.revision(), 0);
        assert!(service.fetch_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_failures_propagate_without_invalidating() {
        let (_dir, store) = scratch_store().await;
        let service = TaskService::new(store.clone());
        sqlx::query("DROP TABLE todos")
            .execute(store.pool())
            .await
            .unwrap();

        let result = service.create("doomed", Priority::Low).await;

        assert!(matches!(result, Err(Error::Database(_))));
        assert_eq!(service.revision(), 0);
    }
}
