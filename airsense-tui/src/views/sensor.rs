//! Sensor detail.

use crate::history::parameter_label;
use crate::state::App;
use crate::theme::parameter_status_color;
use crate::views::helpers::{lookup_placeholder, two_column};
use crate::widgets::DetailPanel;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let (left, right) = two_column(area, 50);
    let placeholder = lookup_placeholder(&app.sensor_detail, "sensor");
    let mut detail = DetailPanel::new("Sensor", Style::default().fg(app.theme.secondary))
        .placeholder(&placeholder);

    let Some(sensor) = app.sensor_detail.found() else {
        detail.render(f, area);
        return;
    };
    detail = detail
        .field("ID", sensor.id.to_string())
        .field("Type", sensor.type_name.clone())
        .field("Serial", sensor.serial_number.clone())
        .field("Measures", sensor.types.join(", "));
    detail.render(f, left);

    let items: Vec<ListItem> = sensor
        .parameters
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|parameter| {
            ListItem::new(Line::from(vec![
                Span::raw(format!("{:<20}", parameter_label(&parameter.name))),
                Span::styled(
                    parameter.display_value(),
                    Style::default().fg(parameter_status_color(parameter.status(), &app.theme)),
                ),
            ]))
        })
        .collect();
    let list = List::new(items).block(Block::default().title("Readings").borders(Borders::ALL));
    f.render_widget(list, right);
}
