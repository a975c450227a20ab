//! Page position indicator for paged lists.

use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    widgets::Paragraph,
    Frame,
};

pub struct Pager {
    /// Zero-based page on screen.
    pub page: u64,
    pub page_count: u64,
    pub total: u64,
    pub style: Style,
}

impl Pager {
    pub fn label(&self) -> String {
        if self.page_count == 0 {
            return "No items".to_string();
        }
        format!(
            "Page {}/{} · {} total",
            self.page + 1,
            self.page_count.max(self.page + 1),
            self.total
        )
    }

    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let widget = Paragraph::new(self.label())
            .style(self.style)
            .alignment(Alignment::Right);
        f.render_widget(widget, area);
    }
}
