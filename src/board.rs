//! View model for the task list.
//!
//! The board keeps two layers: the snapshot last confirmed by the store and
//! the overlay the user sees. Mutations hit the overlay immediately and hand
//! back the [`Command`] that makes them durable. When a fresh snapshot
//! arrives, [`TaskBoard::reconcile`] replaces both layers wholesale.

use chrono::Utc;
use tracing::debug;

use crate::task::{Filter, Priority, Task, TaskId};

/// A write the board wants the service to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create { task: String, priority: Priority },
    SetCompleted { id: i64, completed: bool },
    Remove { id: i64 },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::SetCompleted { .. } => "set_completed",
            Self::Remove { .. } => "remove",
        }
    }
}

#[derive(Debug, Default)]
pub struct TaskBoard {
    snapshot: Vec<Task>,
    overlay: Vec<Task>,
    filter: Filter,
    selected: usize,
    next_provisional: u64,
    last_error: Option<String>,
}

impl TaskBoard {
    pub fn new(snapshot: Vec<Task>) -> Self {
        Self {
            overlay: snapshot.clone(),
            snapshot,
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn tasks(&self) -> &[Task] {
        &self.overlay
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn total(&self) -> usize {
        self.overlay.len()
    }

    pub fn completed_count(&self) -> usize {
        self.overlay.iter().filter(|t| t.completed).count()
    }

    pub fn filtered_tasks(&self) -> Vec<&Task> {
        self.overlay
            .iter()
            .filter(|t| self.filter.matches(t))
            .collect()
    }

    /// Prepends a provisional task. Blank text is ignored.
    pub fn add(&mut self, text: &str, priority: Priority) -> Option<Command> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        self.next_provisional += 1;
        let id = TaskId::Provisional(self.next_provisional);
        self.overlay.insert(
            0,
            Task {
                id,
                task: text.to_string(),
                completed: false,
                priority,
                created_at: Utc::now(),
            },
        );
        debug!(%id, %priority, "optimistic add");

        Some(Command::Create {
            task: text.to_string(),
            priority,
        })
    }

    pub fn toggle(&mut self, id: TaskId) -> Option<Command> {
        let task = self.overlay.iter_mut().find(|t| t.id == id)?;
        let before = task.completed;
        task.completed = !before;
        debug!(%id, completed = !before, "optimistic toggle");
        // The row may have left the filtered view.
        self.clamp_selection();

        // Provisional rows have nothing to address in the store yet.
        let id = id.stored()?;
        Some(Command::SetCompleted {
            id,
            completed: !before,
        })
    }

    pub fn remove(&mut self, id: TaskId) -> Option<Command> {
        let index = self.overlay.iter().position(|t| t.id == id)?;
        self.overlay.remove(index);
        self.clamp_selection();
        debug!(%id, "optimistic remove");

        let id = id.stored()?;
        Some(Command::Remove { id })
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
        self.selected = 0;
    }

    /// Replaces local state with a confirmed snapshot. Pending local changes
    /// are dropped; the snapshot is the source of truth.
    pub fn reconcile(&mut self, snapshot: Vec<Task>) {
        debug!(count = snapshot.len(), "reconciling snapshot");
        self.overlay = snapshot.clone();
        self.snapshot = snapshot;
        self.clamp_selection();
    }

    /// True when the task is not yet confirmed as shown.
    pub fn is_pending(&self, task: &Task) -> bool {
        if task.id.is_provisional() {
            return true;
        }
        self.snapshot
            .iter()
            .find(|t| t.id == task.id)
            .map_or(true, |confirmed| confirmed.completed != task.completed)
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.filtered_tasks().get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        let len = self.filtered_tasks().len();
        if self.selected + 1 < len {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    fn clamp_selection(&mut self) {
        let len = self.filtered_tasks().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }
}
