//! AirSense TUI library exports.

pub mod api_client;
pub mod auth;
pub mod breadcrumbs;
pub mod config;
pub mod error;
pub mod events;
pub mod fetchers;
pub mod history;
pub mod keys;
pub mod management;
pub mod nav;
pub mod notifications;
pub mod persistence;
pub mod state;
pub mod stores;
pub mod telemetry;
pub mod theme;
pub mod views;
pub mod widgets;
