//! Application state and per-screen view state.

use crate::api_client::RestClient;
use crate::auth::Claims;
use crate::breadcrumbs::Crumb;
use crate::config::TuiConfig;
use crate::history::Interval;
use crate::management::{
    authorize, require_manager, toggled_role, Mutation, PermissionError, Prompt, PromptKind,
};
use crate::nav::{guard, EnvTab, Route, RoomTab};
use crate::notifications::{Notification, NotificationLevel, Notifications};
use crate::stores::Stores;
use crate::theme::AirSenseTheme;
use airsense_cache::CacheResult;
use airsense_core::{
    Device, EntityId, Environment, EnvironmentRole, HistoryEntry, Member, Page, Room, Sensor,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use tracing::debug;

// ============================================================================
// LIST AND LOOKUP STATE
// ============================================================================

/// One numbered page of a collection, with a selection.
#[derive(Debug, Clone)]
pub struct PagedList<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
    /// Page requested by the user, zero-based.
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub loaded: bool,
    pub error: Option<String>,
}

impl<T> Default for PagedList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            selected: None,
            page: 0,
            page_size: 0,
            total: 0,
            loaded: false,
            error: None,
        }
    }
}

impl<T: Clone> PagedList<T> {
    pub fn apply_page(&mut self, page_number: u64, page: &Page<T>, page_size: u64) {
        self.items = page.data.clone();
        self.page = page_number;
        self.page_size = page_size;
        self.total = page.pagination.total;
        self.loaded = true;
        self.error = None;
        self.selected = match self.items.len() {
            0 => None,
            len => Some(self.selected.unwrap_or(0).min(len - 1)),
        };
    }
}

impl<T> PagedList<T> {
    pub fn fail(&mut self, message: impl Into<String>) {
        self.loaded = true;
        self.error = Some(message.into());
    }

    pub fn select_next(&mut self) {
        if self.items.is_empty() {
            self.selected = None;
            return;
        }
        self.selected = Some(match self.selected {
            Some(index) => (index + 1) % self.items.len(),
            None => 0,
        });
    }

    pub fn select_previous(&mut self) {
        if self.items.is_empty() {
            self.selected = None;
            return;
        }
        self.selected = Some(match self.selected {
            Some(0) | None => self.items.len() - 1,
            Some(index) => index - 1,
        });
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|index| self.items.get(index))
    }

    pub fn page_count(&self) -> u64 {
        if self.page_size == 0 {
            return u64::from(!self.items.is_empty());
        }
        self.total.div_ceil(self.page_size)
    }

    pub fn has_next_page(&self) -> bool {
        self.page_size > 0 && (self.page + 1) * self.page_size < self.total
    }

    /// Move to the next page; the caller refetches.
    pub fn next_page(&mut self) -> bool {
        if !self.has_next_page() {
            return false;
        }
        self.page += 1;
        self.selected = None;
        true
    }

    pub fn previous_page(&mut self) -> bool {
        if self.page == 0 {
            return false;
        }
        self.page -= 1;
        self.selected = None;
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Outcome of a single-entity lookup shown on a detail screen.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupState<T> {
    Idle,
    Loading,
    Found(T),
    Missing,
    Failed(String),
}

impl<T> LookupState<T> {
    pub fn from_outcome(outcome: CacheResult<Option<T>>) -> Self {
        match outcome {
            Ok(Some(entity)) => LookupState::Found(entity),
            Ok(None) => LookupState::Missing,
            Err(err) => LookupState::Failed(err.to_string()),
        }
    }

    pub fn found(&self) -> Option<&T> {
        match self {
            LookupState::Found(entity) => Some(entity),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HistoryView {
    pub interval: Interval,
    pub entries: Vec<HistoryEntry>,
    pub error: Option<String>,
}

impl HistoryView {
    fn new(interval: Interval) -> Self {
        Self {
            interval,
            entries: Vec::new(),
            error: None,
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.error = None;
    }
}

// ============================================================================
// APP
// ============================================================================

pub struct App {
    pub config: TuiConfig,
    pub theme: AirSenseTheme,
    pub client: RestClient,
    pub stores: Arc<Stores>,
    pub route: Route,
    pub claims: Option<Claims>,
    pub breadcrumbs: Vec<Crumb>,

    pub environments: PagedList<Environment>,
    pub rooms: PagedList<Room>,
    pub members: PagedList<Member>,
    pub sensors: PagedList<Sensor>,
    pub devices: PagedList<Device>,

    /// Live room record with current parameter values.
    pub room: LookupState<Room>,
    pub history: HistoryView,
    pub sensor_detail: LookupState<Sensor>,
    pub device_detail: LookupState<Device>,

    pub notifications: Notifications,
    pub show_help: bool,
    /// Text input for a pending write.
    pub prompt: Option<Prompt>,
    /// Write waiting for a yes/no answer.
    pub confirm: Option<Mutation>,
}

impl App {
    pub fn new(config: TuiConfig, client: RestClient) -> Self {
        let stores = Arc::new(Stores::new(&client, &config.paging));
        let claims = client.tokens().claims();
        Self {
            config,
            theme: AirSenseTheme::airsense(),
            client,
            stores,
            route: Route::Dashboard,
            claims,
            breadcrumbs: Vec::new(),
            environments: PagedList::default(),
            rooms: PagedList::default(),
            members: PagedList::default(),
            sensors: PagedList::default(),
            devices: PagedList::default(),
            room: LookupState::Idle,
            history: HistoryView::new(Interval::Hour),
            sensor_detail: LookupState::Idle,
            device_detail: LookupState::Idle,
            notifications: Notifications::default(),
            show_help: false,
            prompt: None,
            confirm: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.tokens().is_authenticated()
    }

    /// Go to `route`, subject to the navigation guard. Returns where the
    /// app actually landed.
    pub fn navigate(&mut self, route: Route) -> Route {
        let target = guard(route, self.is_authenticated());
        let before = self.route.params();
        let after = target.params();

        if before.env != after.env {
            self.rooms.reset();
            self.members.reset();
        }
        if before.env != after.env || before.room != after.room {
            self.sensors.reset();
            self.devices.reset();
            self.room = LookupState::Idle;
            self.history.clear();
        }
        if before.sensor != after.sensor {
            self.sensor_detail = LookupState::Idle;
        }
        if before.device != after.device {
            self.device_detail = LookupState::Idle;
            self.history.clear();
        }

        debug!(from = %self.route.path(), to = %target.path(), "Navigate");
        self.route = target;
        self.breadcrumbs = self.stores.trail_sources().skeleton(&target);
        target
    }

    /// Accept resolved crumbs unless the user has moved on since.
    pub fn apply_breadcrumbs(&mut self, path: &str, crumbs: Vec<Crumb>) -> bool {
        if path != self.route.path() {
            return false;
        }
        self.breadcrumbs = crumbs;
        true
    }

    /// Replace every store; the next refresh starts from empty caches.
    pub fn reload(&mut self) {
        self.stores = Arc::new(Stores::new(&self.client, &self.config.paging));
        for loaded in [
            &mut self.environments.loaded,
            &mut self.rooms.loaded,
            &mut self.members.loaded,
            &mut self.sensors.loaded,
            &mut self.devices.loaded,
        ] {
            *loaded = false;
        }
        self.room = LookupState::Idle;
        self.sensor_detail = LookupState::Idle;
        self.device_detail = LookupState::Idle;
        self.history.clear();
        self.breadcrumbs = self.stores.trail_sources().skeleton(&self.route);
    }

    pub fn sign_out(&mut self, reason: impl Into<String>) {
        self.client.tokens().clear();
        self.claims = None;
        self.prompt = None;
        self.confirm = None;
        self.notify(NotificationLevel::Error, reason);
        self.navigate(Route::Login);
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push(Notification::new(level, message));
    }

    pub fn cycle_interval(&mut self) {
        self.history.interval = self.history.interval.next();
        self.history.clear();
    }

    pub fn select_next(&mut self) {
        match self.route {
            Route::Dashboard => self.environments.select_next(),
            Route::Environment { tab, .. } => match tab.unwrap_or(EnvTab::Rooms) {
                EnvTab::Rooms => self.rooms.select_next(),
                EnvTab::Members => self.members.select_next(),
            },
            Route::Room { tab, .. } => match tab.unwrap_or(RoomTab::Parameters) {
                RoomTab::Sensors => self.sensors.select_next(),
                RoomTab::Devices => self.devices.select_next(),
                RoomTab::Parameters | RoomTab::Settings => {}
            },
            _ => {}
        }
    }

    pub fn select_previous(&mut self) {
        match self.route {
            Route::Dashboard => self.environments.select_previous(),
            Route::Environment { tab, .. } => match tab.unwrap_or(EnvTab::Rooms) {
                EnvTab::Rooms => self.rooms.select_previous(),
                EnvTab::Members => self.members.select_previous(),
            },
            Route::Room { tab, .. } => match tab.unwrap_or(RoomTab::Parameters) {
                RoomTab::Sensors => self.sensors.select_previous(),
                RoomTab::Devices => self.devices.select_previous(),
                RoomTab::Parameters | RoomTab::Settings => {}
            },
            _ => {}
        }
    }

    /// Route of the selected list item, if the current screen has one.
    pub fn open_selected(&self) -> Option<Route> {
        match self.route {
            Route::Dashboard => self.environments.selected_item().map(|e| Route::Environment {
                env: e.id,
                tab: None,
            }),
            Route::Environment { env, tab } => match tab.unwrap_or(EnvTab::Rooms) {
                EnvTab::Rooms => self.rooms.selected_item().map(|r| Route::Room {
                    env,
                    room: r.id,
                    tab: None,
                }),
                EnvTab::Members => None,
            },
            Route::Room { env, room, tab } => match tab.unwrap_or(RoomTab::Parameters) {
                RoomTab::Sensors => self.sensors.selected_item().map(|s| Route::Sensor {
                    env,
                    room,
                    sensor: s.id,
                }),
                RoomTab::Devices => self.devices.selected_item().map(|d| Route::Device {
                    env,
                    room,
                    device: d.id,
                }),
                RoomTab::Parameters | RoomTab::Settings => None,
            },
            _ => None,
        }
    }

    /// Advance the list on screen by one page. Returns whether a refetch is
    /// needed.
    pub fn next_page(&mut self) -> bool {
        match self.route {
            Route::Dashboard => self.environments.next_page(),
            Route::Environment { tab, .. } => match tab.unwrap_or(EnvTab::Rooms) {
                EnvTab::Rooms => self.rooms.next_page(),
                EnvTab::Members => self.members.next_page(),
            },
            Route::Room { tab, .. } => match tab.unwrap_or(RoomTab::Parameters) {
                RoomTab::Sensors => self.sensors.next_page(),
                RoomTab::Devices => self.devices.next_page(),
                RoomTab::Parameters | RoomTab::Settings => false,
            },
            _ => false,
        }
    }

    pub fn previous_page(&mut self) -> bool {
        match self.route {
            Route::Dashboard => self.environments.previous_page(),
            Route::Environment { tab, .. } => match tab.unwrap_or(EnvTab::Rooms) {
                EnvTab::Rooms => self.rooms.previous_page(),
                EnvTab::Members => self.members.previous_page(),
            },
            Route::Room { tab, .. } => match tab.unwrap_or(RoomTab::Parameters) {
                RoomTab::Sensors => self.sensors.previous_page(),
                RoomTab::Devices => self.devices.previous_page(),
                RoomTab::Parameters | RoomTab::Settings => false,
            },
            _ => false,
        }
    }

    /// Environment the current route belongs to, from the cache if known.
    pub fn current_environment(&self) -> Option<Environment> {
        let env = self.route.params().env?;
        self.stores.environments.get_cached(&(), env)
    }

    pub fn current_room_id(&self) -> Option<EntityId> {
        self.route.params().room
    }

    // ------------------------------------------------------------------------
    // Management
    // ------------------------------------------------------------------------

    /// The user's role in `env`, from the cache or the list on screen.
    pub fn role_in(&self, env: EntityId) -> Option<EnvironmentRole> {
        self.stores
            .environments
            .get_cached(&(), env)
            .map(|e| e.role)
            .or_else(|| {
                self.environments
                    .items
                    .iter()
                    .find(|e| e.id == env)
                    .map(|e| e.role)
            })
    }

    /// Whether a modal input owns the keyboard.
    pub fn is_editing(&self) -> bool {
        self.prompt.is_some() || self.confirm.is_some()
    }

    /// Ask for the name or address of something new in the list on screen.
    pub fn begin_new(&mut self) {
        let kind = match self.route {
            Route::Dashboard => PromptKind::NewEnvironment,
            Route::Environment { env, tab } => match tab.unwrap_or(EnvTab::Rooms) {
                EnvTab::Rooms => PromptKind::NewRoom { env },
                EnvTab::Members => PromptKind::InviteMember { env },
            },
            Route::Room { env, room, tab } => match tab.unwrap_or(RoomTab::Parameters) {
                RoomTab::Sensors => PromptKind::AddSensor { env, room },
                RoomTab::Devices => PromptKind::AddDevice { env, room },
                RoomTab::Parameters | RoomTab::Settings => return,
            },
            _ => return,
        };
        self.open_prompt(Prompt::new(kind));
    }

    /// Rename the room on screen, or the selected one in a room list.
    pub fn begin_edit(&mut self) {
        let target = match self.route {
            Route::Room { env, room, .. } => {
                let name = self
                    .room
                    .found()
                    .cloned()
                    .or_else(|| self.stores.rooms.get_cached(&env, room))
                    .map(|r| r.name)
                    .unwrap_or_default();
                Some((env, room, name))
            }
            Route::Environment { env, tab } if tab.unwrap_or(EnvTab::Rooms) == EnvTab::Rooms => self
                .rooms
                .selected_item()
                .map(|r| (env, r.id, r.name.clone())),
            _ => None,
        };
        if let Some((env, room, name)) = target {
            self.open_prompt(Prompt::with_input(PromptKind::RenameRoom { env, room }, name));
        }
    }

    /// Ask to remove the selected item, or the entity on screen.
    pub fn begin_delete(&mut self) {
        let mutation = match self.route {
            Route::Environment { env, tab } => match tab.unwrap_or(EnvTab::Rooms) {
                EnvTab::Rooms => self
                    .rooms
                    .selected_item()
                    .map(|r| Mutation::RemoveRoom { env, room: r.id }),
                EnvTab::Members => match self.members.selected_item() {
                    Some(member) if member.role == EnvironmentRole::Owner => {
                        self.notify(
                            NotificationLevel::Warning,
                            PermissionError::OwnerProtected.to_string(),
                        );
                        return;
                    }
                    Some(member) => Some(Mutation::RemoveMember {
                        env,
                        member: member.id,
                    }),
                    None => None,
                },
            },
            Route::Room { env, room, tab } => match tab.unwrap_or(RoomTab::Parameters) {
                RoomTab::Sensors => self.sensors.selected_item().map(|s| Mutation::RemoveSensor {
                    env,
                    room,
                    sensor: s.id,
                }),
                RoomTab::Devices => self.devices.selected_item().map(|d| Mutation::RemoveDevice {
                    env,
                    room,
                    device: d.id,
                }),
                RoomTab::Parameters | RoomTab::Settings => Some(Mutation::RemoveRoom { env, room }),
            },
            Route::Sensor { env, room, sensor } => Some(Mutation::RemoveSensor { env, room, sensor }),
            Route::Device { env, room, device } => Some(Mutation::RemoveDevice { env, room, device }),
            Route::Dashboard | Route::Login => None,
        };
        if let Some(mutation) = mutation {
            self.request_confirmation(mutation);
        }
    }

    /// Flip the selected member between user and admin.
    pub fn begin_role_change(&mut self) {
        let Route::Environment { env, tab } = self.route else {
            return;
        };
        if tab.unwrap_or(EnvTab::Rooms) != EnvTab::Members {
            return;
        }
        let Some((member, role)) = self.members.selected_item().map(|m| (m.id, m.role)) else {
            return;
        };
        match toggled_role(role) {
            Ok(role) => self.request_confirmation(Mutation::ChangeMemberRole { env, member, role }),
            Err(err) => self.notify(NotificationLevel::Warning, err.to_string()),
        }
    }

    /// Feed one key to the open prompt. Returns the write once submitted.
    pub fn prompt_key(&mut self, key: KeyEvent) -> Option<Mutation> {
        let prompt = self.prompt.as_mut()?;
        match key.code {
            KeyCode::Esc => self.prompt = None,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.prompt = None
            }
            KeyCode::Backspace => prompt.pop(),
            KeyCode::Char(c) => prompt.push(c),
            KeyCode::Enter => match prompt.submit() {
                Ok(mutation) => {
                    self.prompt = None;
                    if self.permit(&mutation) {
                        return Some(mutation);
                    }
                }
                Err(reason) => self.notify(NotificationLevel::Warning, reason),
            },
            _ => {}
        }
        None
    }

    /// Answer the pending confirmation. `y` or Enter accepts.
    pub fn confirm_key(&mut self, key: KeyEvent) -> Option<Mutation> {
        let mutation = self.confirm.take()?;
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => Some(mutation),
            _ => {
                self.notify(
                    NotificationLevel::Info,
                    format!("{}: cancelled", mutation.describe()),
                );
                None
            }
        }
    }

    /// Record an accepted write. Every store is replaced, since cached pages
    /// no longer match the server. Returns where to go next.
    pub fn mutation_applied(&mut self, mutation: &Mutation) -> Route {
        self.reload();
        self.notify(
            NotificationLevel::Success,
            format!("{}: done", mutation.describe()),
        );
        mutation.landing(self.route)
    }

    fn open_prompt(&mut self, prompt: Prompt) {
        if let Some(env) = prompt.kind.environment() {
            if let Err(err) = require_manager(env, self.role_in(env)) {
                self.notify(NotificationLevel::Warning, err.to_string());
                return;
            }
        }
        self.prompt = Some(prompt);
    }

    fn request_confirmation(&mut self, mutation: Mutation) {
        if self.permit(&mutation) {
            self.confirm = Some(mutation);
        }
    }

    fn permit(&mut self, mutation: &Mutation) -> bool {
        let role = mutation.environment().and_then(|env| self.role_in(env));
        match authorize(mutation, role) {
            Ok(()) => true,
            Err(err) => {
                self.notify(NotificationLevel::Warning, err.to_string());
                false
            }
        }
    }
}
