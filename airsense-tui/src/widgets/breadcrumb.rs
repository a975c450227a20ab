//! Breadcrumb bar shown in the header.

use crate::breadcrumbs::{Crumb, CrumbState};
use crate::theme::{crumb_state_color, AirSenseTheme};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const SEPARATOR: &str = " › ";

pub struct BreadcrumbBar<'a> {
    pub root: &'a str,
    pub crumbs: &'a [Crumb],
    /// Per crumb, whether its lookup is in flight right now.
    pub loading: Vec<bool>,
    pub title: String,
    pub theme: &'a AirSenseTheme,
}

/// Text of one crumb, with its state spelled out.
pub fn crumb_text(crumb: &Crumb, loading: bool) -> String {
    match &crumb.state {
        CrumbState::Resolved => crumb.label.clone(),
        CrumbState::Loading if loading => format!("{} …", crumb.label),
        CrumbState::Loading => crumb.label.clone(),
        CrumbState::Missing => format!("{} (not found)", crumb.label),
        CrumbState::Failed(_) => format!("{} (error)", crumb.label),
    }
}

impl<'a> BreadcrumbBar<'a> {
    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let mut spans = vec![Span::styled(
            self.root,
            Style::default()
                .fg(self.theme.primary)
                .add_modifier(Modifier::BOLD),
        )];
        for (index, crumb) in self.crumbs.iter().enumerate() {
            let loading = self.loading.get(index).copied().unwrap_or(false);
            let mut style = Style::default().fg(crumb_state_color(&crumb.state, self.theme));
            if index + 1 == self.crumbs.len() {
                style = style.add_modifier(Modifier::BOLD);
            }
            spans.push(Span::styled(SEPARATOR, Style::default().fg(self.theme.border)));
            spans.push(Span::styled(crumb_text(crumb, loading), style));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border))
            .title(self.title.as_str());
        f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
    }
}
