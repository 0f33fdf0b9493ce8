mod board;
mod config;
mod error;
mod migrate;
mod service;
mod store;
mod sync;
mod task;
#[cfg(test)]
mod test_support;
mod ui;

use std::{fs::OpenOptions, io, path::Path, sync::Mutex};

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    board::TaskBoard,
    config::{Cli, CliCommand},
    migrate::ensure_schema,
    service::TaskService,
    store::TaskStore,
    sync::SyncHandle,
    task::Filter,
    ui::{run_app, App},
};

fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("todos=info"));
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_target().as_deref())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;

    let store = runtime
        .block_on(TaskStore::connect(&cli.store_config()))
        .with_context(|| format!("failed to open {}", cli.database_url))?;

    let outcome = run_command(&runtime, &store, &cli);
    runtime.block_on(store.pool().close());
    outcome
}

fn run_command(runtime: &Runtime, store: &TaskStore, cli: &Cli) -> anyhow::Result<()> {
    if cli.should_migrate() {
        let report = runtime
            .block_on(ensure_schema(store.pool()))
            .context("schema migration failed")?;
        info!(?report, "schema ready");
    }
    let service = TaskService::new(store.clone());

    match cli.action() {
        CliCommand::Tui => run_tui(runtime, service)?,
        CliCommand::List { filter, json } => runtime.block_on(list(&service, filter, json))?,
        CliCommand::Add { text, priority } => {
            runtime.block_on(service.create(&text, priority))?;
            println!("Added \"{}\" ({priority}).", text.trim());
        }
        CliCommand::Done { id, undo } => {
            runtime.block_on(service.set_completed(id, !undo))?;
            println!("Task #{id} marked {}.", if undo { "active" } else { "done" });
        }
        CliCommand::Rm { id } => {
            runtime.block_on(service.remove(id))?;
            println!("Task #{id} removed.");
        }
        CliCommand::Migrate => {
            let report = runtime
                .block_on(ensure_schema(store.pool()))
                .context("schema migration failed")?;
            println!(
                "table {}, priority column {}.",
                if report.created_table { "created" } else { "already present" },
                if report.added_priority { "added" } else { "already present" },
            );
        }
    }
    Ok(())
}

async fn list(service: &TaskService, filter: Filter, json: bool) -> anyhow::Result<()> {
    let tasks: Vec<_> = service
        .fetch_all()
        .await?
        .into_iter()
        .filter(|t| filter.matches(t))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }
    for task in &tasks {
        println!(
            "{:>6} [{}] {:<6} {}",
            task.id.to_string(),
            if task.completed { 'x' } else { ' ' },
            task.priority.as_str(),
            task.task
        );
    }
    Ok(())
}

fn run_tui(runtime: &Runtime, service: TaskService) -> anyhow::Result<()> {
    let snapshot = runtime
        .block_on(service.fetch_all())
        .context("failed to load tasks")?;
    info!(count = snapshot.len(), "starting terminal ui");
    let mut sync = SyncHandle::spawn(service, runtime.handle());
    let mut app = App::new(TaskBoard::new(snapshot), Local::now().date_naive());

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &mut sync);

    // Restore terminal
    let restored = restore_terminal(&mut terminal);

    finish_tui(runtime, sync, result, restored)
}

/// Drains queued writes before reporting either error.
fn finish_tui(
    runtime: &Runtime,
    sync: SyncHandle,
    result: io::Result<()>,
    restored: io::Result<()>,
) -> anyhow::Result<()> {
    runtime.block_on(sync.shutdown());
    result.context("terminal ui failed")?;
    restored.context("failed to restore the terminal")
}

fn restore_terminal<B: Backend + io::Write>(terminal: &mut Terminal<B>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{board::Command, task::Priority, test_support::scratch_store};

    #[test]
    fn queued_writes_land_when_the_terminal_cannot_be_restored() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();
        let (_dir, store) = runtime.block_on(scratch_store());
        let sync = SyncHandle::spawn(TaskService::new(store.clone()), runtime.handle());
        for text in ["one", "two"] {
            sync.dispatch(Command::Create {
                task: text.to_string(),
                priority: Priority::Medium,
            });
        }

        let outcome = finish_tui(
            &runtime,
            sync,
            Ok(()),
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "tty gone")),
        );

        let message = format!("{:#}", outcome.unwrap_err());
        assert!(message.contains("failed to restore the terminal"));
        assert_eq!(runtime.block_on(store.list_all()).unwrap().len(), 2);
    }
}
