use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::{
    board::TaskBoard,
    task::{Priority, Task},
};

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Low => Color::Blue,
        Priority::Medium => Color::Yellow,
        Priority::High => Color::Red,
    }
}

fn task_line(task: &Task, pending: bool) -> Line<'_> {
    let (check, text_style) = if task.completed {
        (
            Span::styled("[x] ", Style::default().fg(Color::Magenta)),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::CROSSED_OUT),
        )
    } else {
        (Span::raw("[ ] "), Style::default().fg(Color::White))
    };

    let mut spans = vec![
        check,
        Span::styled(task.task.as_str(), text_style),
        Span::raw(" "),
        Span::styled(
            format!(" {} ", task.priority.as_str().to_uppercase()),
            Style::default()
                .fg(Color::Black)
                .bg(priority_color(task.priority)),
        ),
    ];
    if pending {
        spans.push(Span::styled(" …", Style::default().fg(Color::DarkGray)));
    }
    Line::from(spans)
}

pub fn render_list(frame: &mut Frame, area: Rect, board: &TaskBoard, focused: bool) {
    let block = Block::default()
        .title(format!(" Tasks ({}) ", board.filter().label()))
        .borders(Borders::ALL);
    let tasks = board.filtered_tasks();

    if tasks.is_empty() {
        let placeholder = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "No tasks yet",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Add a task to get started!",
                Style::default().fg(Color::Gray),
            )),
        ])
        .alignment(Alignment::Center)
        .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let items: Vec<ListItem> = tasks
        .iter()
        .map(|task| ListItem::new(task_line(task, board.is_pending(task))))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_symbol("> ")
        .highlight_style(Style::default().add_modifier(Modifier::BOLD));

    let mut state = ListState::default().with_selected(focused.then(|| board.selected()));
    frame.render_stateful_widget(list, area, &mut state);
}
