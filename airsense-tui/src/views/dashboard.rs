//! Environment list.

use crate::state::App;
use crate::theme::role_color;
use crate::views::helpers::{render_paged_list, two_column};
use crate::widgets::DetailPanel;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::ListItem,
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let (left, right) = two_column(area, 60);
    let theme = app.theme.clone();
    render_paged_list(f, app, left, "Environments", &app.environments, |env| {
        ListItem::new(Line::from(vec![
            Span::raw(env.name.clone()),
            Span::raw("  "),
            Span::styled(env.role.to_string(), Style::default().fg(role_color(env.role, &theme))),
        ]))
    });

    let mut detail = DetailPanel::new("Environment", Style::default().fg(app.theme.secondary))
        .placeholder("No environment selected.");
    if let Some(env) = app.environments.selected_item() {
        detail = detail
            .field("ID", env.id.to_string())
            .field("Name", env.name.clone())
            .field("Your role", env.role.to_string())
            .field(
                "Can manage",
                if env.role.can_manage() { "yes" } else { "no" },
            );
    }
    detail.render(f, right);
}
