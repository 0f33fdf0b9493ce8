use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Tabs},
    Frame,
};

use crate::task::Filter;

pub fn render_filters(frame: &mut Frame, area: Rect, current: Filter) {
    let titles: Vec<Line> = Filter::ALL
        .iter()
        .enumerate()
        .map(|(i, filter)| Line::from(format!("{} {}", i + 1, filter.label())))
        .collect();

    let tabs = Tabs::new(titles)
        .block(Block::default().title(" Filter ").borders(Borders::ALL))
        .select(current.index())
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )
        .divider("|");

    frame.render_widget(tabs, area);
}
