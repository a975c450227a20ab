//! Environment screen: rooms and members tabs.

use crate::nav::{EnvTab, Route};
use crate::state::App;
use crate::theme::role_color;
use crate::views::helpers::{render_paged_list, two_column};
use crate::widgets::DetailPanel;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, ListItem, Tabs},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let Route::Environment { tab, .. } = app.route else {
        return;
    };
    let tab = tab.unwrap_or(EnvTab::Rooms);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let title = app
        .current_environment()
        .map(|env| env.name)
        .unwrap_or_else(|| "Environment".to_string());
    let tabs = Tabs::new(EnvTab::all().iter().map(|t| t.title()).collect::<Vec<_>>())
        .select(tab.index())
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .fg(app.theme.primary)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, chunks[0]);

    match tab {
        EnvTab::Rooms => render_rooms(f, app, chunks[1]),
        EnvTab::Members => render_members(f, app, chunks[1]),
    }
}

fn render_rooms(f: &mut Frame<'_>, app: &App, area: Rect) {
    let (left, right) = two_column(area, 60);
    render_paged_list(f, app, left, "Rooms", &app.rooms, |room| {
        ListItem::new(format!("{}  ({} parameters)", room.name, room.parameters().len()))
    });

    let mut detail = DetailPanel::new("Room", Style::default().fg(app.theme.secondary))
        .placeholder("No room selected.");
    if let Some(room) = app.rooms.selected_item() {
        detail = detail
            .field("ID", room.id.to_string())
            .field("Name", room.name.clone());
        for parameter in room.parameters() {
            detail = detail.field(
                crate::history::parameter_label(&parameter.name),
                parameter.display_value(),
            );
        }
    }
    detail.render(f, right);
}

fn render_members(f: &mut Frame<'_>, app: &App, area: Rect) {
    let (left, right) = two_column(area, 60);
    let theme = app.theme.clone();
    render_paged_list(f, app, left, "Members", &app.members, |member| {
        ListItem::new(Line::from(vec![
            Span::raw(format!("{} <{}>  ", member.name, member.email)),
            Span::styled(
                member.role.to_string(),
                Style::default().fg(role_color(member.role, &theme)),
            ),
        ]))
    });

    let mut detail = DetailPanel::new("Member", Style::default().fg(app.theme.secondary))
        .placeholder("No member selected.");
    if let Some(member) = app.members.selected_item() {
        detail = detail
            .field("ID", member.id.to_string())
            .field("Name", member.name.clone())
            .field("Email", member.email.clone())
            .field("Role", member.role.to_string());
    }
    detail.render(f, right);
}
