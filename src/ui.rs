mod filters;
mod header;
mod input;
mod list;

use std::{io, time::Duration};

use chrono::NaiveDate;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use tracing::info;

pub use self::input::TaskInput;
use self::{
    filters::render_filters,
    header::render_header,
    input::{render_input, render_priority_picker},
    list::render_list,
};
use crate::{
    board::{Command, TaskBoard},
    sync::{SyncEvent, SyncHandle},
    task::{Filter, Priority},
};

const TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Editing,
}

#[derive(Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
    Dispatch(Command),
}

impl From<Option<Command>> for KeyOutcome {
    fn from(command: Option<Command>) -> Self {
        command.map_or(Self::Continue, Self::Dispatch)
    }
}

pub struct App {
    pub board: TaskBoard,
    pub input: TaskInput,
    mode: Mode,
    today: NaiveDate,
}

impl App {
    pub fn new(board: TaskBoard, today: NaiveDate) -> Self {
        Self {
            board,
            input: TaskInput::default(),
            mode: Mode::Browse,
            today,
        }
    }

    #[cfg(test)]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn apply_sync(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::Snapshot(tasks) => self.board.reconcile(tasks),
            SyncEvent::Failed { command, message } => {
                self.board.record_failure(format!("{command} failed: {message}"));
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyOutcome::Quit;
        }
        self.board.clear_error();
        match self.mode {
            Mode::Browse => self.handle_browse_key(key),
            Mode::Editing => self.handle_editing_key(key),
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> KeyOutcome {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return KeyOutcome::Quit,
            KeyCode::Char('a') | KeyCode::Char('i') => self.mode = Mode::Editing,
            KeyCode::Up | KeyCode::Char('k') => self.board.select_previous(),
            KeyCode::Down | KeyCode::Char('j') => self.board.select_next(),
            KeyCode::Char(' ') | KeyCode::Enter => {
                if let Some(id) = self.board.selected_task().map(|t| t.id) {
                    return self.board.toggle(id).into();
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.board.selected_task().map(|t| t.id) {
                    return self.board.remove(id).into();
                }
            }
            KeyCode::Tab | KeyCode::Right => self.board.set_filter(self.board.filter().cycle(1)),
            KeyCode::BackTab | KeyCode::Left => {
                self.board.set_filter(self.board.filter().cycle(-1))
            }
            KeyCode::Char(c @ '1'..='6') => {
                let index = c as usize - '1' as usize;
                if let Some(filter) = Filter::from_index(index) {
                    self.board.set_filter(filter);
                }
            }
            _ => {}
        }
        KeyOutcome::Continue
    }

    fn handle_editing_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if self.input.is_picker_open() {
            match key.code {
                KeyCode::Tab | KeyCode::Down => self.input.cycle_priority(),
                KeyCode::Char('l') => self.input.select_priority(Priority::Low),
                KeyCode::Char('m') => self.input.select_priority(Priority::Medium),
                KeyCode::Char('h') => self.input.select_priority(Priority::High),
                KeyCode::Enter | KeyCode::Esc => self.input.close_picker(),
                _ => {}
            }
            return KeyOutcome::Continue;
        }

        match key.code {
            KeyCode::Esc => self.mode = Mode::Browse,
            KeyCode::Tab => self.input.open_picker(),
            KeyCode::Backspace => self.input.pop(),
            KeyCode::Enter => {
                if let Some((text, priority)) = self.input.submit() {
                    return self.board.add(&text, priority).into();
                }
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
        KeyOutcome::Continue
    }

    pub fn draw(&self, frame: &mut Frame) {
        let [header, filters, input, list, status] = Layout::vertical([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        render_header(
            frame,
            header,
            self.board.total(),
            self.board.completed_count(),
            self.today,
        );
        render_filters(frame, filters, self.board.filter());
        render_input(frame, input, &self.input, self.mode == Mode::Editing);
        render_list(frame, list, &self.board, self.mode == Mode::Browse);
        frame.render_widget(self.status_line(), status);
        render_priority_picker(frame, input, &self.input);
    }

    fn status_line(&self) -> Paragraph<'_> {
        if let Some(error) = self.board.last_error() {
            return Paragraph::new(Span::styled(error, Style::default().fg(Color::Red)));
        }
        let help = match self.mode {
            Mode::Browse => {
                "a add · space toggle · d delete · ←/→ filter · q quit"
            }
            Mode::Editing if self.input.is_picker_open() => "l/m/h or tab choose · enter close",
            Mode::Editing => "enter add · tab priority · esc back",
        };
        Paragraph::new(Line::from(Span::styled(
            help,
            Style::default().fg(Color::DarkGray),
        )))
    }
}

pub fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    sync: &mut SyncHandle,
) -> io::Result<()> {
    loop {
        while let Some(event) = sync.try_next() {
            app.apply_sync(event);
        }

        terminal.draw(|f| app.draw(f))?;

        if !event::poll(TICK)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match app.handle_key(key) {
                KeyOutcome::Continue => {}
                KeyOutcome::Quit => {
                    info!("quit requested");
                    return Ok(());
                }
                KeyOutcome::Dispatch(command) => sync.dispatch(command),
            }
        }
    }
}
