//! Common view rendering helpers.

use crate::state::{App, LookupState, PagedList};
use crate::widgets::Pager;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

/// Left and right columns of `area`.
pub fn two_column(area: Rect, left_percent: u16) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(left_percent),
            Constraint::Percentage(100 - left_percent),
        ])
        .split(area);
    (chunks[0], chunks[1])
}

/// A rectangle of the given percentages, centered in `area`.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

/// Render one page of `list` with a pager line underneath.
pub fn render_paged_list<T>(
    f: &mut Frame<'_>,
    app: &App,
    area: Rect,
    title: &str,
    list: &PagedList<T>,
    to_item: impl Fn(&T) -> ListItem<'static>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);

    if let Some(error) = list.error.as_ref().filter(|_| list.items.is_empty()) {
        let message = Paragraph::new(format!("Could not load: {}\nPress r to retry.", error))
            .style(Style::default().fg(app.theme.error))
            .wrap(Wrap { trim: true })
            .block(block);
        f.render_widget(message, chunks[0]);
        return;
    }
    if !list.loaded {
        let message = Paragraph::new("Loading…")
            .style(Style::default().fg(app.theme.text_dim))
            .block(block);
        f.render_widget(message, chunks[0]);
        return;
    }

    let items: Vec<ListItem> = list.items.iter().map(to_item).collect();
    let widget = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(app.theme.primary)
                .bg(app.theme.bg_highlight)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(list.selected);
    f.render_stateful_widget(widget, chunks[0], &mut state);

    Pager {
        page: list.page,
        page_count: list.page_count(),
        total: list.total,
        style: Style::default().fg(app.theme.text_dim),
    }
    .render(f, chunks[1]);
}

/// Placeholder text for a lookup that has not produced an entity.
pub fn lookup_placeholder<T>(state: &LookupState<T>, what: &str) -> String {
    match state {
        LookupState::Idle | LookupState::Loading => format!("Loading {}…", what),
        LookupState::Missing => format!("No such {}.", what),
        LookupState::Failed(error) => format!("Could not load {}: {}", what, error),
        LookupState::Found(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_placeholder_keeps_missing_and_failed_apart() {
        let missing: LookupState<()> = LookupState::Missing;
        let failed: LookupState<()> = LookupState::Failed("503".to_string());
        assert_eq!(lookup_placeholder(&missing, "sensor"), "No such sensor.");
        assert_eq!(lookup_placeholder(&failed, "sensor"), "Could not load sensor: 503");
    }

    #[test]
    fn test_centered_rect_is_inside() {
        let area = Rect::new(0, 0, 100, 50);
        let inner = centered_rect(60, 40, area);
        assert!(inner.x >= 20 && inner.right() <= 80);
        assert!(inner.y >= 15 && inner.bottom() <= 35);
    }
}
