//! View rendering dispatch.

pub mod dashboard;
pub mod device;
pub mod environment;
pub mod helpers;
pub mod login;
pub mod room;
pub mod sensor;

use crate::management::{Mutation, Prompt};
use crate::nav::Route;
use crate::notifications::NotificationLevel;
use crate::state::App;
use crate::widgets::BreadcrumbBar;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub fn render_view(f: &mut Frame<'_>, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.size());

    render_header(f, app, layout[0]);

    match app.route {
        Route::Dashboard => dashboard::render(f, app, layout[1]),
        Route::Login => login::render(f, app, layout[1]),
        Route::Environment { .. } => environment::render(f, app, layout[1]),
        Route::Room { .. } => room::render(f, app, layout[1]),
        Route::Sensor { .. } => sensor::render(f, app, layout[1]),
        Route::Device { .. } => device::render(f, app, layout[1]),
    }

    render_footer(f, app, layout[2]);

    if app.show_help {
        render_help(f, app);
    }
    if let Some(prompt) = &app.prompt {
        render_prompt(f, app, prompt);
    }
    if let Some(mutation) = &app.confirm {
        render_confirm(f, app, mutation);
    }
}

fn render_header(f: &mut Frame<'_>, app: &App, area: Rect) {
    let sources = app.stores.trail_sources();
    let loading = app
        .breadcrumbs
        .iter()
        .map(|crumb| sources.is_loading(crumb))
        .collect();
    let user = app
        .claims
        .as_ref()
        .map(|claims| claims.display_name().to_string())
        .unwrap_or_else(|| "signed out".to_string());
    let bar = BreadcrumbBar {
        root: "AirSense",
        crumbs: &app.breadcrumbs,
        loading,
        title: format!("{} | {}", app.route.title(), user),
        theme: &app.theme,
    };
    bar.render(f, area);
}

fn render_footer(f: &mut Frame<'_>, app: &App, area: Rect) {
    let help = "j/k move • Enter open • h back • Tab tabs • n/p page • a/e/d edit • r reload • ? help • q quit";
    let (text, style) = match app.notifications.latest() {
        Some(note) => {
            let color = match note.level {
                NotificationLevel::Info => app.theme.info,
                NotificationLevel::Warning => app.theme.warning,
                NotificationLevel::Error => app.theme.error,
                NotificationLevel::Success => app.theme.success,
            };
            (
                format!("{}: {}", note.level.label(), note.message),
                Style::default().fg(color),
            )
        }
        None => (help.to_string(), Style::default().fg(app.theme.text_dim)),
    };
    let footer = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .style(style);
    f.render_widget(footer, area);
}

fn render_help(f: &mut Frame<'_>, app: &App) {
    let area = helpers::centered_rect(60, 70, f.size());
    let mut lines: Vec<Line> = [
        "j / k, arrows    move selection",
        "Enter, l         open selected item",
        "h, Esc           go up one level",
        "Tab / Shift-Tab  switch tab",
        "n / p            next / previous page",
        "i                cycle history interval",
        "a                add to the list on screen",
        "e                rename room",
        "d                remove selected item",
        "c                toggle member admin role",
        "r                reload from the API",
        "Esc              dismiss notification",
        "q, Ctrl-c        quit",
        "",
        "Cache activity",
    ]
    .into_iter()
    .map(Line::from)
    .collect();

    for (name, stats) in app.stores.stats() {
        lines.push(Line::from(format!(
            "  {:<13} {} pages fetched, {} scans, {:.0}% index hits",
            name,
            stats.page_fetches,
            stats.scans,
            stats.hit_rate() * 100.0
        )));
    }

    let widget = Paragraph::new(lines)
        .style(Style::default().fg(app.theme.text))
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border_focus)),
        );
    f.render_widget(Clear, area);
    f.render_widget(widget, area);
}

fn render_prompt(f: &mut Frame<'_>, app: &App, prompt: &Prompt) {
    let area = helpers::centered_rect(50, 20, f.size());
    let lines = vec![
        Line::from(format!("{}_", prompt.input)),
        Line::from(""),
        Line::from("Enter submit • Esc cancel"),
    ];
    let widget = Paragraph::new(lines)
        .style(Style::default().fg(app.theme.text))
        .block(
            Block::default()
                .title(prompt.kind.title())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border_focus)),
        );
    f.render_widget(Clear, area);
    f.render_widget(widget, area);
}

fn render_confirm(f: &mut Frame<'_>, app: &App, mutation: &Mutation) {
    let area = helpers::centered_rect(50, 20, f.size());
    let border = if mutation.is_removal() {
        app.theme.error
    } else {
        app.theme.warning
    };
    let lines = vec![
        Line::from(format!("{}?", mutation.describe())),
        Line::from(""),
        Line::from("y confirm • any other key cancels"),
    ];
    let widget = Paragraph::new(lines)
        .style(Style::default().fg(app.theme.text))
        .block(
            Block::default()
                .title("Confirm")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        );
    f.render_widget(Clear, area);
    f.render_widget(widget, area);
}
