//! Signed-out screen.

use crate::state::App;
use crate::views::helpers::centered_rect;
use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let source = match (&app.config.auth.token_path, &app.config.auth.token) {
        (Some(path), _) => format!("the token file at {}", path.display()),
        (None, Some(_)) => "the token in the config file".to_string(),
        (None, None) => "a configured token".to_string(),
    };
    let text = format!(
        "You are signed out.\n\nRenew {} and press r to sign in again, or q to quit.",
        source
    );
    let widget = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(app.theme.text))
        .block(Block::default().title("Sign in").borders(Borders::ALL));
    f.render_widget(widget, centered_rect(60, 30, area));
}
