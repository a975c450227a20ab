//! AirSense theme and color utilities.

use crate::breadcrumbs::CrumbState;
use airsense_core::{EnvironmentRole, ParameterStatus};
use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct AirSenseTheme {
    pub bg: Color,
    pub bg_highlight: Color,
    pub primary: Color,
    pub primary_dim: Color,
    pub secondary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub text: Color,
    pub text_dim: Color,
    pub border: Color,
    pub border_focus: Color,
}

impl AirSenseTheme {
    pub fn airsense() -> Self {
        Self {
            bg: Color::Rgb(16, 20, 24),
            bg_highlight: Color::Rgb(38, 46, 54),
            primary: Color::Rgb(72, 187, 120),
            primary_dim: Color::Rgb(40, 110, 70),
            secondary: Color::Rgb(99, 179, 237),
            success: Color::Rgb(72, 187, 120),
            warning: Color::Rgb(236, 201, 75),
            error: Color::Rgb(245, 101, 101),
            info: Color::Rgb(99, 179, 237),
            text: Color::Rgb(237, 242, 247),
            text_dim: Color::Rgb(160, 174, 192),
            border: Color::Rgb(74, 85, 104),
            border_focus: Color::Rgb(72, 187, 120),
        }
    }
}

pub fn parameter_status_color(status: ParameterStatus, theme: &AirSenseTheme) -> Color {
    match status {
        ParameterStatus::NoData => theme.text_dim,
        ParameterStatus::Normal => theme.success,
        ParameterStatus::OutOfRange => theme.warning,
        ParameterStatus::Critical => theme.error,
    }
}

pub fn role_color(role: EnvironmentRole, theme: &AirSenseTheme) -> Color {
    match role {
        EnvironmentRole::Owner => theme.primary,
        EnvironmentRole::Admin => theme.secondary,
        EnvironmentRole::User => theme.text_dim,
    }
}

pub fn crumb_state_color(state: &CrumbState, theme: &AirSenseTheme) -> Color {
    match state {
        CrumbState::Loading => theme.text_dim,
        CrumbState::Resolved => theme.text,
        CrumbState::Missing => theme.warning,
        CrumbState::Failed(_) => theme.error,
    }
}
