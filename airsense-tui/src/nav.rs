//! Routes, the navigation guard, and tab switching.
//!
//! Routes use the same paths as the web dashboard, so a path copied from a
//! browser opens the same screen here.

use airsense_core::EntityId;

/// Sub-screens of an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvTab {
    Rooms,
    Members,
}

impl EnvTab {
    pub fn all() -> &'static [EnvTab] {
        &[EnvTab::Rooms, EnvTab::Members]
    }

    pub fn title(&self) -> &'static str {
        match self {
            EnvTab::Rooms => "Rooms",
            EnvTab::Members => "Members",
        }
    }

    fn segment(&self) -> &'static str {
        match self {
            EnvTab::Rooms => "rooms",
            EnvTab::Members => "members",
        }
    }

    fn from_segment(segment: &str) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.segment() == segment)
    }

    pub fn index(&self) -> usize {
        Self::all().iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn next(&self) -> EnvTab {
        let all = Self::all();
        all[(self.index() + 1) % all.len()]
    }

    pub fn previous(&self) -> EnvTab {
        let all = Self::all();
        all[(self.index() + all.len() - 1) % all.len()]
    }
}

/// Sub-screens of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomTab {
    Parameters,
    Sensors,
    Devices,
    Settings,
}

impl RoomTab {
    pub fn all() -> &'static [RoomTab] {
        &[
            RoomTab::Parameters,
            RoomTab::Sensors,
            RoomTab::Devices,
            RoomTab::Settings,
        ]
    }

    pub fn title(&self) -> &'static str {
        match self {
            RoomTab::Parameters => "Parameters",
            RoomTab::Sensors => "Sensors",
            RoomTab::Devices => "Devices",
            RoomTab::Settings => "Settings",
        }
    }

    fn segment(&self) -> &'static str {
        match self {
            RoomTab::Parameters => "parameters",
            RoomTab::Sensors => "sensors",
            RoomTab::Devices => "devices",
            RoomTab::Settings => "settings",
        }
    }

    fn from_segment(segment: &str) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.segment() == segment)
    }

    pub fn index(&self) -> usize {
        Self::all().iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn next(&self) -> RoomTab {
        let all = Self::all();
        all[(self.index() + 1) % all.len()]
    }

    pub fn previous(&self) -> RoomTab {
        let all = Self::all();
        all[(self.index() + all.len() - 1) % all.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// `/`: the environment list.
    Dashboard,
    /// `/login`
    Login,
    /// `/env/:env`, `/env/:env/rooms`, `/env/:env/members`
    Environment { env: EntityId, tab: Option<EnvTab> },
    /// `/env/:env/room/:room` and its tab children.
    Room {
        env: EntityId,
        room: EntityId,
        tab: Option<RoomTab>,
    },
    /// `/env/:env/room/:room/sensors/:sensor`
    Sensor {
        env: EntityId,
        room: EntityId,
        sensor: EntityId,
    },
    /// `/env/:env/room/:room/devices/:device`
    Device {
        env: EntityId,
        room: EntityId,
        device: EntityId,
    },
}

/// Entity ids named by a route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteParams {
    pub env: Option<EntityId>,
    pub room: Option<EntityId>,
    pub sensor: Option<EntityId>,
    pub device: Option<EntityId>,
}

impl Route {
    /// Parse a dashboard path. Query strings, fragments and trailing slashes
    /// are ignored.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Some(Route::Dashboard),
            ["login"] => Some(Route::Login),
            ["env", env] => Some(Route::Environment {
                env: parse_id(env)?,
                tab: None,
            }),
            ["env", env, tab] => Some(Route::Environment {
                env: parse_id(env)?,
                tab: Some(EnvTab::from_segment(tab)?),
            }),
            ["env", env, "room", room] => Some(Route::Room {
                env: parse_id(env)?,
                room: parse_id(room)?,
                tab: None,
            }),
            ["env", env, "room", room, tab] => Some(Route::Room {
                env: parse_id(env)?,
                room: parse_id(room)?,
                tab: Some(RoomTab::from_segment(tab)?),
            }),
            ["env", env, "room", room, "sensors", sensor] => Some(Route::Sensor {
                env: parse_id(env)?,
                room: parse_id(room)?,
                sensor: parse_id(sensor)?,
            }),
            ["env", env, "room", room, "devices", device] => Some(Route::Device {
                env: parse_id(env)?,
                room: parse_id(room)?,
                device: parse_id(device)?,
            }),
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Dashboard => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Environment { env, tab: None } => format!("/env/{}", env),
            Route::Environment { env, tab: Some(tab) } => {
                format!("/env/{}/{}", env, tab.segment())
            }
            Route::Room {
                env,
                room,
                tab: None,
            } => format!("/env/{}/room/{}", env, room),
            Route::Room {
                env,
                room,
                tab: Some(tab),
            } => format!("/env/{}/room/{}/{}", env, room, tab.segment()),
            Route::Sensor { env, room, sensor } => {
                format!("/env/{}/room/{}/sensors/{}", env, room, sensor)
            }
            Route::Device { env, room, device } => {
                format!("/env/{}/room/{}/devices/{}", env, room, device)
            }
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Dashboard => "Environments",
            Route::Login => "Sign in",
            Route::Environment { .. } => "Environment",
            Route::Room { .. } => "Room",
            Route::Sensor { .. } => "Sensor",
            Route::Device { .. } => "Device",
        }
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Login)
    }

    pub fn guest_only(&self) -> bool {
        matches!(self, Route::Login)
    }

    pub fn params(&self) -> RouteParams {
        match *self {
            Route::Dashboard | Route::Login => RouteParams::default(),
            Route::Environment { env, .. } => RouteParams {
                env: Some(env),
                ..Default::default()
            },
            Route::Room { env, room, .. } => RouteParams {
                env: Some(env),
                room: Some(room),
                ..Default::default()
            },
            Route::Sensor { env, room, sensor } => RouteParams {
                env: Some(env),
                room: Some(room),
                sensor: Some(sensor),
                device: None,
            },
            Route::Device { env, room, device } => RouteParams {
                env: Some(env),
                room: Some(room),
                sensor: None,
                device: Some(device),
            },
        }
    }

    /// The enclosing screen, `None` at the top.
    pub fn up(&self) -> Option<Route> {
        match *self {
            Route::Dashboard | Route::Login => None,
            Route::Environment { .. } => Some(Route::Dashboard),
            Route::Room { env, .. } => Some(Route::Environment {
                env,
                tab: Some(EnvTab::Rooms),
            }),
            Route::Sensor { env, room, .. } => Some(Route::Room {
                env,
                room,
                tab: Some(RoomTab::Sensors),
            }),
            Route::Device { env, room, .. } => Some(Route::Room {
                env,
                room,
                tab: Some(RoomTab::Devices),
            }),
        }
    }

    /// The same screen on its next tab, if it has tabs.
    pub fn next_tab(&self) -> Route {
        match *self {
            Route::Environment { env, tab } => Route::Environment {
                env,
                tab: Some(tab.unwrap_or(EnvTab::Rooms).next()),
            },
            Route::Room { env, room, tab } => Route::Room {
                env,
                room,
                tab: Some(tab.unwrap_or(RoomTab::Parameters).next()),
            },
            other => other,
        }
    }

    pub fn previous_tab(&self) -> Route {
        match *self {
            Route::Environment { env, tab } => Route::Environment {
                env,
                tab: Some(tab.unwrap_or(EnvTab::Rooms).previous()),
            },
            Route::Room { env, room, tab } => Route::Room {
                env,
                room,
                tab: Some(tab.unwrap_or(RoomTab::Parameters).previous()),
            },
            other => other,
        }
    }
}

fn parse_id(segment: &str) -> Option<EntityId> {
    segment.parse().ok()
}

/// Where navigation to `route` actually lands.
///
/// Signed-out users are sent to the login screen; signed-in users never see it.
pub fn guard(route: Route, authenticated: bool) -> Route {
    if route.requires_auth() && !authenticated {
        Route::Login
    } else if route.guest_only() && authenticated {
        Route::Dashboard
    } else {
        route
    }
}
