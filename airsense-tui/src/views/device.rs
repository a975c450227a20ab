//! Device detail with its fan speed history.

use crate::history::to_series;
use crate::state::App;
use crate::views::helpers::lookup_placeholder;
use crate::views::room::render_history;
use crate::widgets::DetailPanel;
use chrono::DateTime;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let placeholder = lookup_placeholder(&app.device_detail, "device");
    let mut detail = DetailPanel::new("Device", Style::default().fg(app.theme.secondary))
        .placeholder(&placeholder);

    let Some(device) = app.device_detail.found() else {
        detail.render(f, area);
        return;
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Min(8),
            Constraint::Length(8),
        ])
        .split(area);

    detail = detail
        .field("Serial", device.serial_number.clone())
        .field("Fan speed", format!("{:.0}%", device.fan_speed))
        .field(
            "Last active",
            device
                .last_active()
                .map(|at| at.to_rfc3339())
                .unwrap_or_else(|| "-".to_string()),
        );
    detail.render(f, chunks[0]);

    render_chart(f, app, chunks[1]);
    render_history(f, app, chunks[2], "Fan speed");
}

fn render_chart(f: &mut Frame<'_>, app: &App, area: Rect) {
    let points = to_series(&app.history.entries);
    let block = Block::default().title("Fan speed over time").borders(Borders::ALL);
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        f.render_widget(block, area);
        return;
    };
    let (x_min, x_max) = (first.0, last.0.max(first.0 + 1.0));
    let y_max = points.iter().map(|p| p.1).fold(0.0_f64, f64::max).max(1.0);

    let time_label = |seconds: f64| {
        DateTime::from_timestamp(seconds as i64, 0)
            .map(|at| at.format("%d %b %H:%M").to_string())
            .unwrap_or_default()
    };
    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(app.theme.primary))
        .data(&points);
    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(app.theme.text_dim))
                .bounds([x_min, x_max])
                .labels(vec![Span::raw(time_label(x_min)), Span::raw(time_label(x_max))]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(app.theme.text_dim))
                .bounds([0.0, y_max])
                .labels(vec![Span::raw("0"), Span::raw(format!("{:.0}", y_max))]),
        );
    f.render_widget(chart, area);
}
