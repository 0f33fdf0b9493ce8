//! New-task input with its priority picker.
//!
//! The draft text and draft priority belong to this component only; the board
//! sees them once, on submit.

use ratatui::{
    layout::{Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::{task::Priority, ui::list::priority_color};

const PLACEHOLDER: &str = "Add a new task…";
const PICKER_WIDTH: u16 = 21;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskInput {
    text: String,
    priority: Priority,
    picker_open: bool,
}

impl TaskInput {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn is_picker_open(&self) -> bool {
        self.picker_open
    }

    pub fn can_submit(&self) -> bool {
        !self.text.trim().is_empty()
    }

    pub fn push(&mut self, c: char) {
        self.text.push(c);
    }

    pub fn pop(&mut self) {
        self.text.pop();
    }

    pub fn open_picker(&mut self) {
        self.picker_open = true;
    }

    pub fn close_picker(&mut self) {
        self.picker_open = false;
    }

    pub fn cycle_priority(&mut self) {
        self.priority = self.priority.next();
    }

    pub fn select_priority(&mut self, priority: Priority) {
        self.priority = priority;
        self.picker_open = false;
    }

    /// Hands out the trimmed draft and resets the component. Blank drafts
    /// stay where they are.
    pub fn submit(&mut self) -> Option<(String, Priority)> {
        if !self.can_submit() {
            return None;
        }
        let submitted = (self.text.trim().to_string(), self.priority);
        *self = Self::default();
        Some(submitted)
    }
}

pub fn render_input(frame: &mut Frame, area: Rect, input: &TaskInput, focused: bool) {
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let block = Block::default()
        .title(" New task ")
        .borders(Borders::ALL)
        .border_style(border);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let badge = format!(" {} ▾ ", input.priority().as_str());
    let [text_area, badge_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(Line::from(badge.as_str()).width() as u16),
    ])
    .areas(inner);

    let text = if input.text().is_empty() {
        Line::from(Span::styled(
            PLACEHOLDER,
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(input.text())
    };
    frame.render_widget(Paragraph::new(text), text_area);
    frame.render_widget(
        Paragraph::new(Span::styled(
            badge,
            Style::default()
                .fg(Color::Black)
                .bg(priority_color(input.priority())),
        )),
        badge_area,
    );

    if focused && !input.is_picker_open() {
        let offset = Line::from(input.text()).width() as u16;
        frame.set_cursor_position(Position::new(
            (text_area.x + offset).min(text_area.right().saturating_sub(1)),
            text_area.y,
        ));
    }
}

/// Drop-down under the input box, right aligned.
pub fn render_priority_picker(frame: &mut Frame, input_area: Rect, input: &TaskInput) {
    if !input.is_picker_open() {
        return;
    }
    let screen = frame.area();
    let height = Priority::ALL.len() as u16 + 2;
    let area = Rect {
        x: input_area.right().saturating_sub(PICKER_WIDTH + 1),
        y: input_area.bottom(),
        width: PICKER_WIDTH,
        height,
    }
    .intersection(screen);

    let items: Vec<ListItem> = Priority::ALL
        .iter()
        .map(|priority| {
            ListItem::new(Line::from(vec![
                Span::styled("● ", Style::default().fg(priority_color(*priority))),
                Span::raw(priority.label()),
            ]))
        })
        .collect();
    let selected = Priority::ALL.iter().position(|p| *p == input.priority());

    let list = List::new(items)
        .block(Block::default().title(" Priority ").borders(Borders::ALL))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED));

    frame.render_widget(Clear, area);
    frame.render_stateful_widget(list, area, &mut ListState::default().with_selected(selected));
}
