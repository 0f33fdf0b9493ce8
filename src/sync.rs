//! Background bridge between the board and the service.
//!
//! The UI thread never waits on storage. Commands go to a worker task that
//! applies them in order; a refresher task turns every snapshot invalidation
//! into a fresh list and sends it back. A failed command invalidates the
//! snapshot as well, so the next reconcile discards the optimistic change.

use tokio::{
    runtime::Handle,
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::{board::Command, error::Result, service::TaskService, task::Task};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Snapshot(Vec<Task>),
    Failed {
        command: &'static str,
        message: String,
    },
}

pub struct SyncHandle {
    commands: mpsc::UnboundedSender<Command>,
    events: mpsc::UnboundedReceiver<SyncEvent>,
    worker: JoinHandle<()>,
    refresher: JoinHandle<()>,
}

impl SyncHandle {
    pub fn spawn(service: TaskService, runtime: &Handle) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (event_tx, events) = mpsc::unbounded_channel();

        let revisions = service.subscribe();
        let refresher = runtime.spawn(run_refresher(service.clone(), revisions, event_tx.clone()));
        let worker = runtime.spawn(run_worker(service, command_rx, event_tx));

        Self {
            commands,
            events,
            worker,
            refresher,
        }
    }

    pub fn dispatch(&self, command: Command) {
        debug!(command = command.name(), "dispatching");
        if self.commands.send(command).is_err() {
            warn!("sync worker is gone, command dropped");
        }
    }

    /// Next event if one is ready. Never blocks.
    pub fn try_next(&mut self) -> Option<SyncEvent> {
        self.events.try_recv().ok()
    }

    /// Lets queued commands finish, then stops refreshing.
    pub async fn shutdown(self) {
        let Self {
            commands,
            events,
            worker,
            refresher,
        } = self;
        drop(commands);
        drop(events);
        if let Err(error) = worker.await {
            warn!(%error, "sync worker ended abnormally");
        }
        refresher.abort();
    }
}

async fn run_worker(
    service: TaskService,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<SyncEvent>,
) {
    while let Some(command) = commands.recv().await {
        let name = command.name();
        if let Err(error) = execute(&service, command).await {
            warn!(command = name, %error, "command failed");
            // The UI may already be gone during shutdown.
            let _ = events.send(SyncEvent::Failed {
                command: name,
                message: error.to_string(),
            });
            service.invalidate().await;
        }
    }
    debug!("sync worker drained");
}

async fn execute(service: &TaskService, command: Command) -> Result<()> {
    match command {
        Command::Create { task, priority } => service.create(&task, priority).await,
        Command::SetCompleted { id, completed } => service.set_completed(id, completed).await,
        Command::Remove { id } => service.remove(id).await,
    }
}

async fn run_refresher(
    service: TaskService,
    mut revisions: watch::Receiver<u64>,
    events: mpsc::UnboundedSender<SyncEvent>,
) {
    while revisions.changed().await.is_ok() {
        let event = match service.fetch_all().await {
            Ok(tasks) => SyncEvent::Snapshot(tasks),
            Err(error) => {
                warn!(%error, "refresh failed");
                SyncEvent::Failed {
                    command: "refresh",
                    message: error.to_string(),
                }
            }
        };
        if events.send(event).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{task::Priority, test_support::scratch_store};

    async fn next_event(sync: &mut SyncHandle) -> SyncEvent {
        tokio::time::timeout(Duration::from_secs(5), sync.events.recv())
            .await
            .expect("timed out waiting for a sync event")
            .expect("event channel closed")
    }

    async fn snapshot_where(sync: &mut SyncHandle, done: impl Fn(&[Task]) -> bool) -> Vec<Task> {
        loop {
            if let SyncEvent::Snapshot(tasks) = next_event(sync).await {
                if done(&tasks) {
                    return tasks;
                }
            }
        }
    }

    #[tokio::test]
    async fn create_comes_back_as_a_snapshot() {
        let (_dir, store) = scratch_store().await;
        let mut sync = SyncHandle::spawn(TaskService::new(store), &Handle::current());

        sync.dispatch(Command::Create {
            task: "ship it".to_string(),
            priority: Priority::High,
        });

        match next_event(&mut sync).await {
            SyncEvent::Snapshot(tasks) => {
                assert_eq!(tasks.len(), 1);
                assert_eq!(tasks[0].task, "ship it");
                assert!(!tasks[0].id.is_provisional());
            }
            other => panic!("expected a snapshot, got {other:?}"),
        }
        sync.shutdown().await;
    }

    #[tokio::test]
    async fn toggle_and_remove_converge() {
        let (_dir, store) = scratch_store().await;
        store.insert("keep", Priority::Low).await.unwrap();
        store.insert("drop", Priority::Low).await.unwrap();
        let tasks = store.list_all().await.unwrap();
        let drop_id = tasks[0].id.stored().unwrap();
        let keep_id = tasks[1].id.stored().unwrap();
        let mut sync = SyncHandle::spawn(TaskService::new(store), &Handle::current());

        sync.dispatch(Command::SetCompleted {
            id: keep_id,
            completed: true,
        });
        sync.dispatch(Command::Remove { id: drop_id });

        let tasks = snapshot_where(&mut sync, |tasks| tasks.len() == 1).await;
        assert_eq!(tasks[0].task, "keep");
        assert!(tasks[0].completed);
        sync.shutdown().await;
    }

    #[tokio::test]
    async fn failures_are_reported_and_trigger_a_refresh() {
        let (_dir, store) = scratch_store().await;
        sqlx::query("DROP TABLE todos")
            .execute(store.pool())
            .await
            .unwrap();
        let mut sync = SyncHandle::spawn(TaskService::new(store), &Handle::current());

        sync.dispatch(Command::Create {
            task: "never stored".to_string(),
            priority: Priority::Medium,
        });

        match next_event(&mut sync).await {
            SyncEvent::Failed { command, message } => {
                assert_eq!(command, "create");
                assert!(message.contains("database error"));
            }
            other => panic!("expected a failure, got {other:?}"),
        }
        assert!(matches!(
            next_event(&mut sync).await,
            SyncEvent::Failed {
                command: "refresh",
                ..
            }
        ));
        sync.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_finishes_queued_commands() {
        let (_dir, store) = scratch_store().await;
        let sync = SyncHandle::spawn(TaskService::new(store.clone()), &Handle::current());

        for text in ["one", "two", "three"] {
            sync.dispatch(Command::Create {
                task: text.to_string(),
                priority: Priority::Low,
            });
        }
        sync.shutdown().await;

        assert_eq!(store.list_all().await.unwrap().len(), 3);
    }
}
