//! AirSense TUI entry point.

use airsense_core::{CacheError, EntityId, FetchError};
use airsense_tui::api_client::RestClient;
use airsense_tui::auth::{sign_in, spawn_token_refresh, FileTokenSource, StaticToken, TokenSource, TokenStore};
use airsense_tui::config::{AuthConfig, TuiConfig};
use airsense_tui::error::TuiError;
use airsense_tui::events::TuiEvent;
use airsense_tui::history::HistoryQuery;
use airsense_tui::keys::{map_key, Action};
use airsense_tui::management::Mutation;
use airsense_tui::nav::{EnvTab, Route, RoomTab};
use airsense_tui::notifications::NotificationLevel;
use airsense_tui::persistence::{self, PersistedState};
use airsense_tui::state::{App, LookupState};
use airsense_tui::telemetry;
use airsense_tui::views::render_view;
use chrono::Utc;
use crossterm::{
    event::{self, Event as CrosstermEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// How long non-error notifications stay in the footer.
const NOTIFICATION_TTL_SECS: i64 = 8;

struct Session {
    source: Arc<dyn TokenSource>,
    sender: mpsc::Sender<TuiEvent>,
}

#[tokio::main]
async fn main() -> Result<(), TuiError> {
    let config = TuiConfig::load()?;
    telemetry::init_logging(&config)?;
    info!(api = %config.api_base_url, "Starting AirSense TUI");

    let tokens = TokenStore::new();
    let client = RestClient::new(&config, tokens.clone())?;
    let source = token_source(&config.auth);
    let mut app = App::new(config, client);

    let (event_tx, mut event_rx) = mpsc::channel::<TuiEvent>(256);
    let session = Session {
        source: Arc::clone(&source),
        sender: event_tx.clone(),
    };

    let notification_token = app.config.auth.notification_token.clone();
    match sign_in(source.as_ref(), &tokens, &app.client, notification_token.as_deref()).await {
        Ok(claims) => app.claims = Some(claims),
        Err(err) => {
            warn!(error = %err, "Sign-in failed");
            app.notify(NotificationLevel::Error, format!("Sign-in failed: {}", err));
        }
    }
    spawn_token_refresh(
        source,
        tokens,
        Duration::from_secs(app.config.auth.refresh_interval_secs),
        event_tx.clone(),
    );

    let mut start = Route::Dashboard;
    if let Ok(Some(state)) = persistence::load(&app.config.persistence_path) {
        if let Some(route) = state.route() {
            start = route;
        }
        if let Some(interval) = state.history_interval {
            app.history.interval = interval;
        }
    }

    let mut terminal = setup_terminal()?;
    let _guard = TerminalGuard {};

    spawn_input_reader(event_tx.clone());
    go(&mut app, &session, start).await;

    let tick_rate = Duration::from_millis(app.config.refresh_interval_ms);
    let mut ticker = tokio::time::interval(tick_rate);

    loop {
        terminal.draw(|f| render_view(f, &app))?;

        tokio::select! {
            _ = ticker.tick() => {
                let _ = event_tx.send(TuiEvent::Tick).await;
            }
            Some(event) = event_rx.recv() => {
                if handle_event(&mut app, &session, event).await? {
                    break;
                }
            }
        }
    }

    let persisted = PersistedState {
        last_route: app.route.path(),
        history_interval: Some(app.history.interval),
    };
    if let Err(err) = persistence::save(&app.config.persistence_path, &persisted) {
        warn!(error = %err, "Could not save UI state");
    }
    info!("AirSense TUI stopped");

    Ok(())
}

fn token_source(auth: &AuthConfig) -> Arc<dyn TokenSource> {
    match (&auth.token_path, &auth.token) {
        (Some(path), _) => Arc::new(FileTokenSource::new(path.clone())),
        (None, token) => Arc::new(StaticToken(token.clone().unwrap_or_default())),
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen);
    }
}

fn spawn_input_reader(sender: mpsc::Sender<TuiEvent>) {
    std::thread::spawn(move || loop {
        if let Ok(true) = event::poll(Duration::from_millis(200)) {
            if let Ok(evt) = event::read() {
                let event = match evt {
                    CrosstermEvent::Key(key) => TuiEvent::Input(key),
                    CrosstermEvent::Resize(width, height) => TuiEvent::Resize { width, height },
                    _ => continue,
                };
                if sender.blocking_send(event).is_err() {
                    break;
                }
            }
        }
    });
}

/// Resolve the trail of the current route in the background.
fn spawn_breadcrumbs(app: &App, sender: mpsc::Sender<TuiEvent>) {
    let stores = Arc::clone(&app.stores);
    let route = app.route;
    tokio::spawn(async move {
        let crumbs = stores.trail_sources().resolve(&route).await;
        let _ = sender
            .send(TuiEvent::Breadcrumbs {
                path: route.path(),
                crumbs,
            })
            .await;
    });
}

async fn go(app: &mut App, session: &Session, route: Route) {
    app.navigate(route);
    spawn_breadcrumbs(app, session.sender.clone());
    refresh_view(app).await;
}

async fn handle_event(app: &mut App, session: &Session, event: TuiEvent) -> Result<bool, TuiError> {
    match event {
        TuiEvent::Input(key) if app.is_editing() => {
            let submitted = if app.prompt.is_some() {
                app.prompt_key(key)
            } else {
                app.confirm_key(key)
            };
            if let Some(mutation) = submitted {
                apply_mutation(app, session, mutation).await;
            }
        }
        TuiEvent::Input(key) => {
            if let Some(action) = map_key(key) {
                return handle_action(app, session, action).await;
            }
        }
        TuiEvent::Tick => {
            app.notifications
                .expire(Utc::now(), chrono::Duration::seconds(NOTIFICATION_TTL_SECS));
        }
        TuiEvent::Breadcrumbs { path, crumbs } => {
            app.apply_breadcrumbs(&path, crumbs);
        }
        TuiEvent::TokenRefreshed => {
            app.claims = app.client.tokens().claims();
        }
        TuiEvent::SignedOut(reason) => app.sign_out(reason),
        TuiEvent::ApiError(message) => app.notify(NotificationLevel::Error, message),
        TuiEvent::Resize { .. } => {}
    }
    Ok(false)
}

async fn handle_action(app: &mut App, session: &Session, action: Action) -> Result<bool, TuiError> {
    if app.show_help && !matches!(action, Action::Quit | Action::OpenHelp) {
        app.show_help = false;
        return Ok(false);
    }
    match action {
        Action::Quit => return Ok(true),
        Action::OpenHelp => app.show_help = !app.show_help,
        Action::Cancel if !app.notifications.is_empty() => app.notifications.dismiss(),
        Action::Cancel => {
            if let Some(route) = app.route.up() {
                go(app, session, route).await;
            }
        }
        Action::MoveDown => app.select_next(),
        Action::MoveUp => app.select_previous(),
        Action::Open => {
            if let Some(route) = app.open_selected() {
                go(app, session, route).await;
            }
        }
        Action::Back => {
            if let Some(route) = app.route.up() {
                go(app, session, route).await;
            }
        }
        Action::NextTab => {
            let route = app.route.next_tab();
            go(app, session, route).await;
        }
        Action::PrevTab => {
            let route = app.route.previous_tab();
            go(app, session, route).await;
        }
        Action::NextPage => {
            if app.next_page() {
                refresh_view(app).await;
            }
        }
        Action::PrevPage => {
            if app.previous_page() {
                refresh_view(app).await;
            }
        }
        Action::CycleInterval => {
            app.cycle_interval();
            refresh_view(app).await;
        }
        Action::NewItem => app.begin_new(),
        Action::EditItem => app.begin_edit(),
        Action::DeleteItem => app.begin_delete(),
        Action::ChangeRole => app.begin_role_change(),
        Action::Reload if app.route == Route::Login => retry_sign_in(app, session).await,
        Action::Reload => {
            app.reload();
            let route = app.route;
            go(app, session, route).await;
            app.notify(NotificationLevel::Info, "Reloaded from the API");
        }
    }
    Ok(false)
}

/// Send a confirmed write, then rebuild the stores and revisit the screen.
async fn apply_mutation(app: &mut App, session: &Session, mutation: Mutation) {
    match mutation.send(&app.client).await {
        Ok(()) => {
            let route = app.mutation_applied(&mutation);
            go(app, session, route).await;
        }
        Err(err) => {
            let err = FetchError::from(err);
            warn!(mutation = %mutation.describe(), error = %err, "Write rejected");
            check_session(app, &err);
            app.notify(
                NotificationLevel::Error,
                format!("{}: {}", mutation.describe(), err),
            );
        }
    }
}

async fn retry_sign_in(app: &mut App, session: &Session) {
    let notification_token = app.config.auth.notification_token.clone();
    let outcome = sign_in(
        session.source.as_ref(),
        app.client.tokens(),
        &app.client,
        notification_token.as_deref(),
    )
    .await;
    match outcome {
        Ok(claims) => {
            app.notify(
                NotificationLevel::Success,
                format!("Signed in as {}", claims.display_name()),
            );
            app.claims = Some(claims);
            app.reload();
            go(app, session, Route::Dashboard).await;
        }
        Err(err) => app.notify(NotificationLevel::Error, format!("Sign-in failed: {}", err)),
    }
}

/// Load what the current screen shows. Failures land in view state.
async fn refresh_view(app: &mut App) {
    let stores = Arc::clone(&app.stores);
    match app.route {
        Route::Login => {}
        Route::Dashboard => {
            let page = app.environments.page;
            match stores.environment_page(page).await {
                Ok(result) => {
                    let size = stores.environment_stride();
                    app.environments.apply_page(page, &result, size);
                }
                Err(err) => {
                    app.environments.fail(err.to_string());
                    check_session(app, &err);
                }
            }
        }
        Route::Environment { env, tab } => match tab.unwrap_or(EnvTab::Rooms) {
            EnvTab::Rooms => {
                let page = app.rooms.page;
                match stores.room_page(env, page).await {
                    Ok(result) => {
                        let size = stores.room_stride(env);
                        app.rooms.apply_page(page, &result, size);
                    }
                    Err(err) => {
                        app.rooms.fail(err.to_string());
                        check_session(app, &err);
                    }
                }
            }
            EnvTab::Members => {
                let page = app.members.page;
                match stores.member_page(env, page).await {
                    Ok(result) => {
                        let size = stores.member_stride(env);
                        app.members.apply_page(page, &result, size);
                    }
                    Err(err) => {
                        app.members.fail(err.to_string());
                        check_session(app, &err);
                    }
                }
            }
        },
        Route::Room { env, room, tab } => match tab.unwrap_or(RoomTab::Parameters) {
            RoomTab::Parameters | RoomTab::Settings => {
                app.room = match app.client.get_room(env, room).await {
                    Ok(record) => LookupState::Found(record),
                    Err(err) => {
                        let err = FetchError::from(err);
                        check_session(app, &err);
                        LookupState::Failed(err.to_string())
                    }
                };
                if tab.unwrap_or(RoomTab::Parameters) == RoomTab::Parameters {
                    load_history(app, room, None).await;
                }
            }
            RoomTab::Sensors => {
                let page = app.sensors.page;
                match stores.sensor_page(room, page).await {
                    Ok(result) => {
                        let size = stores.sensor_stride(room);
                        app.sensors.apply_page(page, &result, size);
                    }
                    Err(err) => {
                        app.sensors.fail(err.to_string());
                        check_session(app, &err);
                    }
                }
            }
            RoomTab::Devices => {
                let page = app.devices.page;
                match stores.device_page(room, page).await {
                    Ok(result) => {
                        let size = stores.device_stride(room);
                        app.devices.apply_page(page, &result, size);
                    }
                    Err(err) => {
                        app.devices.fail(err.to_string());
                        check_session(app, &err);
                    }
                }
            }
        },
        Route::Sensor { room, sensor, .. } => {
            app.sensor_detail = LookupState::Loading;
            let outcome = stores.find_sensor(room, sensor).await;
            if let Err(CacheError::Fetch(err)) = &outcome {
                check_session(app, err);
            }
            app.sensor_detail = LookupState::from_outcome(outcome);
        }
        Route::Device { room, device, .. } => {
            app.device_detail = LookupState::Loading;
            let outcome = stores.find_device(room, device).await;
            if let Err(CacheError::Fetch(err)) = &outcome {
                check_session(app, err);
            }
            let found = matches!(outcome, Ok(Some(_)));
            app.device_detail = LookupState::from_outcome(outcome);
            if found {
                load_history(app, room, Some(device)).await;
            }
        }
    }
}

async fn load_history(app: &mut App, room: EntityId, device: Option<EntityId>) {
    let query = HistoryQuery::ending_at(app.history.interval, Utc::now());
    let result = match device {
        Some(device) => app.client.device_history(room, device, &query).await,
        None => app.client.room_history(room, &query).await,
    };
    match result {
        Ok(entries) => {
            app.history.entries = entries;
            app.history.error = None;
        }
        Err(err) => {
            let err = FetchError::from(err);
            app.history.error = Some(err.to_string());
            check_session(app, &err);
        }
    }
}

/// A 401 anywhere ends the session.
fn check_session(app: &mut App, err: &FetchError) {
    if *err == FetchError::Unauthenticated && app.route != Route::Login {
        app.sign_out("Session expired, sign in again");
    }
}
