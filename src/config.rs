use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};

use crate::{
    store::StoreConfig,
    task::{Filter, Priority},
};

const DEFAULT_TUI_LOG: &str = "todos.log";

/// Personal task tracker.
#[derive(Debug, Parser)]
#[command(name = "todos", version, about)]
pub struct Cli {
    /// SQLite database to use.
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://todos.db")]
    pub database_url: String,

    #[arg(long, env = "TODOS_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,

    /// Seconds to wait for a free pooled connection.
    #[arg(long, env = "TODOS_ACQUIRE_TIMEOUT_SECS", default_value_t = 5)]
    pub acquire_timeout_secs: u64,

    /// Where logs go. The interactive UI defaults to `todos.log`, other
    /// commands to stderr.
    #[arg(long, env = "TODOS_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Do not provision the schema on start-up.
    #[arg(long)]
    pub skip_migrate: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum CliCommand {
    /// Interactive terminal UI (default).
    Tui,
    /// Print tasks, newest first.
    List {
        #[arg(long, default_value = "all")]
        filter: Filter,
        #[arg(long)]
        json: bool,
    },
    /// Create a task.
    Add {
        text: String,
        #[arg(long, short, default_value = "medium")]
        priority: Priority,
    },
    /// Mark a task as completed.
    Done {
        id: i64,
        /// Mark it as not completed instead.
        #[arg(long)]
        undo: bool,
    },
    /// Delete a task.
    Rm { id: i64 },
    /// Create the table or add missing columns, then exit.
    Migrate,
}

impl Cli {
    pub fn action(&self) -> CliCommand {
        self.command.clone().unwrap_or(CliCommand::Tui)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            database_url: self.database_url.clone(),
            max_connections: self.max_connections,
            acquire_timeout: Duration::from_secs(self.acquire_timeout_secs),
        }
    }

    /// `None` means stderr.
    pub fn log_target(&self) -> Option<PathBuf> {
        match (&self.log_file, self.action()) {
            (Some(path), _) => Some(path.clone()),
            (None, CliCommand::Tui) => Some(PathBuf::from(DEFAULT_TUI_LOG)),
            (None, _) => None,
        }
    }

    pub fn should_migrate(&self) -> bool {
        !self.skip_migrate && self.action() != CliCommand::Migrate
    }
}
