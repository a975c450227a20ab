//! Room screen: live parameters, sensors, devices and settings.

use crate::history::{parameter_label, sparkline_buckets, summarize};
use crate::nav::{Route, RoomTab};
use crate::state::App;
use crate::theme::parameter_status_color;
use crate::views::helpers::{lookup_placeholder, render_paged_list, two_column};
use crate::widgets::DetailPanel;
use airsense_core::{ParameterStatus, Room};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Sparkline, Tabs},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let Route::Room { env, room, tab } = app.route else {
        return;
    };
    let tab = tab.unwrap_or(RoomTab::Parameters);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    // Live record first, then whatever the room list already brought in.
    let record = app
        .room
        .found()
        .cloned()
        .or_else(|| app.stores.rooms.get_cached(&env, room));
    let title = record
        .as_ref()
        .map(|r| r.name.clone())
        .unwrap_or_else(|| format!("Room {}", room));

    let tabs = Tabs::new(RoomTab::all().iter().map(|t| t.title()).collect::<Vec<_>>())
        .select(tab.index())
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .fg(app.theme.primary)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, chunks[0]);

    match tab {
        RoomTab::Parameters => render_parameters(f, app, chunks[1], record.as_ref()),
        RoomTab::Sensors => render_sensors(f, app, chunks[1]),
        RoomTab::Devices => render_devices(f, app, chunks[1]),
        RoomTab::Settings => render_settings(f, app, chunks[1], record.as_ref()),
    }
}

fn render_parameters(f: &mut Frame<'_>, app: &App, area: Rect, record: Option<&Room>) {
    let (left, right) = two_column(area, 45);

    let block = Block::default().title("Parameters").borders(Borders::ALL);
    match record {
        Some(room) if !room.parameters().is_empty() => {
            let items: Vec<ListItem> = room
                .parameters()
                .iter()
                .map(|parameter| {
                    let status = parameter.status();
                    let marker = match status {
                        ParameterStatus::Critical => " !!",
                        ParameterStatus::OutOfRange => " !",
                        ParameterStatus::Normal | ParameterStatus::NoData => "",
                    };
                    ListItem::new(Line::from(vec![
                        Span::raw(format!("{:<20}", parameter_label(&parameter.name))),
                        Span::styled(
                            format!("{}{}", parameter.display_value(), marker),
                            Style::default().fg(parameter_status_color(status, &app.theme)),
                        ),
                    ]))
                })
                .collect();
            f.render_widget(List::new(items).block(block), left);
        }
        Some(_) => {
            let empty = Paragraph::new("This room reports no parameters.")
                .style(Style::default().fg(app.theme.text_dim))
                .block(block);
            f.render_widget(empty, left);
        }
        None => {
            let text = lookup_placeholder(&app.room, "room");
            f.render_widget(Paragraph::new(text).block(block), left);
        }
    }

    render_history(f, app, right, "Ventilation history");
}

/// Sparkline of the loaded history with a one-line summary.
pub(crate) fn render_history(f: &mut Frame<'_>, app: &App, area: Rect, title: &str) {
    let title = format!("{} ({}) [i]", title, app.history.interval.label());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    if let Some(error) = &app.history.error {
        let message = Paragraph::new(format!("History unavailable: {}", error))
            .style(Style::default().fg(app.theme.error))
            .block(Block::default().title(title).borders(Borders::ALL));
        f.render_widget(message, area);
        return;
    }

    let width = chunks[0].width.saturating_sub(2) as usize;
    let buckets = sparkline_buckets(&app.history.entries, width);
    let sparkline = Sparkline::default()
        .block(Block::default().title(title).borders(Borders::ALL))
        .data(&buckets)
        .max(100)
        .style(Style::default().fg(app.theme.secondary));
    f.render_widget(sparkline, chunks[0]);

    let summary = match summarize(&app.history.entries) {
        Some(s) => format!(
            "min {:.1} · mean {:.1} · max {:.1} · latest {:.1}",
            s.min, s.mean, s.max, s.latest.value
        ),
        None => "No readings in this window.".to_string(),
    };
    let summary = Paragraph::new(summary)
        .style(Style::default().fg(app.theme.text_dim))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(summary, chunks[1]);
}

fn render_sensors(f: &mut Frame<'_>, app: &App, area: Rect) {
    let (left, right) = two_column(area, 55);
    render_paged_list(f, app, left, "Sensors", &app.sensors, |sensor| {
        ListItem::new(format!("{}  {}", sensor.label(), sensor.serial_number))
    });

    let mut detail = DetailPanel::new("Sensor", Style::default().fg(app.theme.secondary))
        .placeholder("No sensor selected.");
    if let Some(sensor) = app.sensors.selected_item() {
        detail = detail
            .field("ID", sensor.id.to_string())
            .field("Type", sensor.type_name.clone())
            .field("Serial", sensor.serial_number.clone())
            .field("Measures", sensor.types.join(", "));
    }
    detail.render(f, right);
}

fn render_devices(f: &mut Frame<'_>, app: &App, area: Rect) {
    let (left, right) = two_column(area, 55);
    render_paged_list(f, app, left, "Devices", &app.devices, |device| {
        ListItem::new(format!("{}  fan {:.0}%", device.label(), device.fan_speed))
    });

    let mut detail = DetailPanel::new("Device", Style::default().fg(app.theme.secondary))
        .placeholder("No device selected.");
    if let Some(device) = app.devices.selected_item() {
        detail = detail
            .field("ID", device.id.to_string())
            .field("Serial", device.serial_number.clone())
            .field("Fan speed", format!("{:.0}%", device.fan_speed))
            .field(
                "Last active",
                device
                    .last_active()
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string()),
            );
    }
    detail.render(f, right);
}

fn render_settings(f: &mut Frame<'_>, app: &App, area: Rect, record: Option<&Room>) {
    let mut detail = DetailPanel::new("Settings", Style::default().fg(app.theme.secondary))
        .placeholder("Room not loaded.");
    if let Some(room) = record {
        detail = detail
            .field("ID", room.id.to_string())
            .field("Name", room.name.clone())
            .field(
                "Ventilation speed",
                room.device_speed
                    .map(|speed| format!("{:.0}%", speed))
                    .unwrap_or_else(|| "-".to_string()),
            );
        let manages = app
            .route
            .params()
            .env
            .and_then(|env| app.role_in(env))
            .map(|role| role.can_manage())
            .unwrap_or(false);
        if manages {
            detail = detail.field("Manage", "e rename · d remove room".to_string());
        }
        for parameter in room.parameters() {
            detail = detail.field(
                parameter_label(&parameter.name),
                format!(
                    "range {:.1}..{:.1} {} · critical {:.1}",
                    parameter.min_value, parameter.max_value, parameter.unit, parameter.critical_value
                ),
            );
        }
    }
    detail.render(f, area);
}
