//! Event types for the TUI event loop.

use crate::breadcrumbs::Crumb;
use crossterm::event::KeyEvent;

#[derive(Debug, Clone)]
pub enum TuiEvent {
    Input(KeyEvent),
    Tick,
    Resize { width: u16, height: u16 },
    /// Breadcrumbs resolved in the background for the route at `path`.
    Breadcrumbs { path: String, crumbs: Vec<Crumb> },
    TokenRefreshed,
    /// The session ended; the payload says why.
    SignedOut(String),
    ApiError(String),
}
