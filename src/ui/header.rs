use chrono::NaiveDate;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

/// Share of completed tasks, rounded to the nearest whole percent.
pub fn progress_percent(completed: usize, total: usize) -> u16 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total) as u64;
    let total = total as u64;
    // Half-up rounding of completed * 100 / total without floats.
    ((completed * 200 + total) / (total * 2)) as u16
}

pub fn render_header(frame: &mut Frame, area: Rect, total: usize, completed: usize, today: NaiveDate) {
    let block = Block::default()
        .title(Span::styled(
            " My Tasks ",
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [summary, bar] = Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(inner);

    let fraction = format!("{completed}/{total}");
    let [date_area, count_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(fraction.len() as u16),
    ])
    .areas(summary);

    frame.render_widget(
        Paragraph::new(today.format("%A, %B %-d").to_string())
            .style(Style::default().fg(Color::Gray)),
        date_area,
    );
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            fraction,
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ))),
        count_area,
    );

    let percent = progress_percent(completed, total);
    frame.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(Color::Magenta).bg(Color::Black))
            .percent(percent)
            .label(format!("{percent}%")),
        bar,
    );
}
