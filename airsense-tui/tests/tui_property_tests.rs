use airsense_cache::PagedLookupCache;
use airsense_core::{
    Device, Environment, EnvironmentRole, FetchError, Page, Pagination, ParameterStatus, Room,
    Sensor,
};
use airsense_test_utils::{
    devices, environment, member, room, sensor, sensors, ScriptedFetcher,
};
use airsense_tui::api_client::RestClient;
use airsense_tui::auth::TokenStore;
use airsense_tui::breadcrumbs::{CrumbState, TrailSources};
use airsense_tui::config::{AuthConfig, PagingConfig, ThemeConfig, TuiConfig};
use airsense_tui::keys::{map_key, Action};
use airsense_tui::management::{Mutation, PromptKind};
use airsense_tui::notifications::NotificationLevel;
use airsense_tui::nav::{EnvTab, Route, RoomTab};
use airsense_tui::persistence::{self, PersistedState};
use airsense_tui::state::App;
use airsense_tui::stores::numbered_page;
use airsense_tui::theme::{parameter_status_color, AirSenseTheme};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use proptest::prelude::*;
use std::sync::Arc;

fn base_config() -> TuiConfig {
    TuiConfig {
        api_base_url: "http://localhost:8080".to_string(),
        request_timeout_ms: 5_000,
        refresh_interval_ms: 1_000,
        persistence_path: "tmp/airsense-tui.json".into(),
        log_path: "tmp/airsense-tui.log".into(),
        log_filter: None,
        auth: AuthConfig {
            token: Some("header.payload.signature".to_string()),
            token_path: None,
            refresh_interval_secs: 3_000,
            notification_token: None,
        },
        paging: PagingConfig {
            environment_page_size: 5,
            room_page_size: 10,
            member_page_size: 10,
        },
        theme: ThemeConfig {
            name: "airsense".to_string(),
        },
    }
}

// ============================================================================
// CONFIG
// ============================================================================

#[test]
fn config_base_is_valid() {
    assert!(base_config().validate().is_ok());
}

#[test]
fn config_requires_exactly_one_token_source() {
    let mut config = base_config();
    config.auth.token = None;
    assert!(config.validate().is_err());

    config.auth.token = Some("t".to_string());
    config.auth.token_path = Some("token.txt".into());
    assert!(config.validate().is_err());
}

#[test]
fn config_rejects_zero_page_size() {
    let mut config = base_config();
    config.paging.room_page_size = 0;
    assert!(config.validate().is_err());
}

#[test]
fn config_requires_known_theme() {
    let mut config = base_config();
    config.theme = ThemeConfig {
        name: "synthwave".to_string(),
    };
    assert!(config.validate().is_err());
}

// ============================================================================
// BREADCRUMBS OVER PAGED CACHES
// ============================================================================

struct Caches {
    environments: PagedLookupCache<ScriptedFetcher<(), Environment>>,
    rooms: PagedLookupCache<ScriptedFetcher<i64, Room>>,
    sensors: PagedLookupCache<ScriptedFetcher<i64, Sensor>>,
    devices: PagedLookupCache<ScriptedFetcher<i64, Device>>,
}

impl Caches {
    fn new() -> Self {
        Self {
            environments: PagedLookupCache::new(
                "environments",
                ScriptedFetcher::new(2).with_collection(
                    (),
                    vec![
                        environment(1, "Office"),
                        environment(2, "Lab"),
                        environment(3, "Home"),
                    ],
                ),
            ),
            rooms: PagedLookupCache::new(
                "rooms",
                ScriptedFetcher::new(2)
                    .with_collection(2, vec![room(10, "Kitchen"), room(11, "Hall")]),
            ),
            sensors: PagedLookupCache::new(
                "sensors",
                ScriptedFetcher::new(5).with_collection(11, sensors(7)),
            ),
            devices: PagedLookupCache::new(
                "devices",
                ScriptedFetcher::new(5).with_collection(11, devices(3)),
            ),
        }
    }

    fn sources(
        &self,
    ) -> TrailSources<
        '_,
        ScriptedFetcher<(), Environment>,
        ScriptedFetcher<i64, Room>,
        ScriptedFetcher<i64, Sensor>,
        ScriptedFetcher<i64, Device>,
    > {
        TrailSources {
            environments: &self.environments,
            rooms: &self.rooms,
            sensors: &self.sensors,
            devices: &self.devices,
        }
    }

    fn total_calls(&self) -> usize {
        self.environments.fetcher().call_count()
            + self.rooms.fetcher().call_count()
            + self.sensors.fetcher().call_count()
            + self.devices.fetcher().call_count()
    }
}

#[tokio::test]
async fn breadcrumbs_resolve_every_level() {
    let caches = Caches::new();
    let route = Route::Sensor {
        env: 2,
        room: 11,
        sensor: 6,
    };

    let crumbs = caches.sources().resolve(&route).await;

    let labels: Vec<String> = crumbs.iter().map(|c| c.label.clone()).collect();
    assert_eq!(labels, vec!["Lab".to_string(), "Hall".to_string(), sensor(6).label()]);
    assert!(crumbs.iter().all(|c| c.state == CrumbState::Resolved));
    assert_eq!(crumbs[2].path, "/env/2/room/11/sensors/6");
}

#[tokio::test]
async fn breadcrumbs_keep_missing_apart_from_failed() {
    let caches = Caches::new();
    let missing_device = Route::Device {
        env: 2,
        room: 11,
        device: 9,
    };
    let crumbs = caches.sources().resolve(&missing_device).await;
    assert_eq!(crumbs[1].state, CrumbState::Resolved);
    assert_eq!(crumbs[2].state, CrumbState::Missing);
    assert_eq!(crumbs[2].label, "Device #9");

    let caches = Caches::new();
    caches
        .rooms
        .fetcher()
        .fail_next(0, FetchError::status(503, "maintenance"));
    let crumbs = caches
        .sources()
        .resolve(&Route::Room {
            env: 2,
            room: 10,
            tab: Some(RoomTab::Sensors),
        })
        .await;
    assert_eq!(crumbs[0].state, CrumbState::Resolved);
    assert!(matches!(&crumbs[1].state, CrumbState::Failed(msg) if msg.contains("503")));
    assert_eq!(crumbs[1].label, "Room 10");
}

#[tokio::test]
async fn breadcrumb_skeleton_reuses_indexed_entities() {
    let caches = Caches::new();
    let route = Route::Device {
        env: 2,
        room: 11,
        device: 2,
    };
    assert!(caches
        .sources()
        .skeleton(&route)
        .iter()
        .all(|c| c.state == CrumbState::Loading));

    caches.sources().resolve(&route).await;
    let calls = caches.total_calls();

    let skeleton = caches.sources().skeleton(&route);
    assert!(skeleton.iter().all(|c| c.state == CrumbState::Resolved));
    assert_eq!(skeleton[2].label, "Device #2");
    assert_eq!(caches.total_calls(), calls);
}

#[tokio::test]
async fn breadcrumb_loading_flag_tracks_lookup() {
    let caches = std::sync::Arc::new(Caches {
        environments: PagedLookupCache::new(
            "environments",
            ScriptedFetcher::new(2)
                .with_collection((), vec![environment(1, "Office")])
                .gated(),
        ),
        ..Caches::new()
    });
    let route = Route::Environment { env: 1, tab: None };
    let crumb = caches.sources().skeleton(&route).remove(0);

    let task = {
        let caches = std::sync::Arc::clone(&caches);
        tokio::spawn(async move { caches.sources().resolve(&route).await })
    };
    while caches.environments.fetcher().call_count() == 0 {
        tokio::task::yield_now().await;
    }
    assert!(caches.sources().is_loading(&crumb));

    caches.environments.fetcher().release();
    let crumbs = task.await.unwrap();
    assert_eq!(crumbs[0].label, "Office");
    assert!(!caches.sources().is_loading(&crumb));
}

// ============================================================================
// APP NAVIGATION
// ============================================================================

fn app(signed_in: bool) -> App {
    let config = base_config();
    let tokens = TokenStore::new();
    if signed_in {
        tokens.set("header.payload.signature");
    }
    let client = RestClient::new(&config, tokens).unwrap();
    App::new(config, client)
}

#[test]
fn navigation_is_guarded() {
    let mut signed_out = app(false);
    let room = Route::Room {
        env: 1,
        room: 2,
        tab: None,
    };
    assert_eq!(signed_out.navigate(room), Route::Login);
    assert!(signed_out.breadcrumbs.is_empty());

    let mut signed_in = app(true);
    assert_eq!(signed_in.navigate(room), room);
    assert_eq!(signed_in.breadcrumbs.len(), 2);
    assert_eq!(signed_in.navigate(Route::Login), Route::Dashboard);
}

#[test]
fn stale_breadcrumbs_are_ignored() {
    let mut app = app(true);
    app.navigate(Route::Environment { env: 1, tab: None });
    let before = app.breadcrumbs.clone();

    assert!(!app.apply_breadcrumbs("/env/2", Vec::new()));
    assert_eq!(app.breadcrumbs, before);
    assert!(app.apply_breadcrumbs("/env/1", Vec::new()));
    assert!(app.breadcrumbs.is_empty());
}

#[test]
fn changing_environment_resets_room_lists() {
    let mut app = app(true);
    app.navigate(Route::Environment {
        env: 1,
        tab: Some(EnvTab::Rooms),
    });
    app.rooms.page = 3;
    app.navigate(Route::Environment {
        env: 1,
        tab: Some(EnvTab::Members),
    });
    assert_eq!(app.rooms.page, 3);

    app.navigate(Route::Environment { env: 2, tab: None });
    assert_eq!(app.rooms.page, 0);
}

#[test]
fn sign_out_lands_on_login() {
    let mut app = app(true);
    app.navigate(Route::Dashboard);
    app.sign_out("Token refresh failed");
    assert_eq!(app.route, Route::Login);
    assert!(!app.is_authenticated());
    assert!(app.notifications.latest().is_some());
}

// ============================================================================
// NUMBERED PAGES
// ============================================================================

#[tokio::test]
async fn numbered_pages_follow_server_page_length() {
    // The server returns two environments per page although five were asked.
    let cache = PagedLookupCache::new(
        "environments",
        ScriptedFetcher::new(2).with_collection(
            (),
            (1..=5).map(|id| environment(id, "Env")).collect::<Vec<_>>(),
        ),
    );

    let mut seen = Vec::new();
    for page_number in 0..3 {
        let page = numbered_page(&cache, &(), page_number, 5).await.unwrap();
        seen.extend(page.data.iter().map(|env| env.id));
    }

    assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    assert_eq!(cache.fetcher().offsets(), vec![0, 2, 4]);
}

// ============================================================================
// MANAGEMENT
// ============================================================================

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        assert_eq!(app.prompt_key(key(KeyCode::Char(c))), None);
    }
}

/// Signed-in app listing environment 2 with `role`.
fn app_with_role(role: EnvironmentRole) -> App {
    let mut app = app(true);
    let mut env = environment(2, "Lab");
    env.role = role;
    app.environments.apply_page(
        0,
        &Page {
            data: vec![env],
            pagination: Pagination {
                total: 1,
                skip: 0,
                count: 5,
            },
        },
        5,
    );
    app
}

fn single_page<T>(item: T) -> Page<T> {
    Page {
        data: vec![item],
        pagination: Pagination {
            total: 1,
            skip: 0,
            count: 10,
        },
    }
}

fn latest_level(app: &App) -> Option<NotificationLevel> {
    app.notifications.latest().map(|note| note.level)
}

#[test]
fn new_environment_prompt_submits_trimmed_name() {
    let mut app = app(true);
    app.navigate(Route::Dashboard);
    app.begin_new();
    assert_eq!(
        app.prompt.as_ref().map(|p| p.kind),
        Some(PromptKind::NewEnvironment)
    );

    type_text(&mut app, " Greenhouse ");
    let submitted = app.prompt_key(key(KeyCode::Enter));

    assert_eq!(
        submitted,
        Some(Mutation::CreateEnvironment {
            name: "Greenhouse".to_string()
        })
    );
    assert!(app.prompt.is_none());
}

#[test]
fn blank_prompt_stays_open_with_warning() {
    let mut app = app_with_role(EnvironmentRole::Admin);
    app.navigate(Route::Environment {
        env: 2,
        tab: Some(EnvTab::Rooms),
    });
    app.begin_new();
    assert_eq!(app.prompt_key(key(KeyCode::Enter)), None);
    assert!(app.prompt.is_some());
    assert_eq!(latest_level(&app), Some(NotificationLevel::Warning));

    app.prompt_key(key(KeyCode::Esc));
    assert!(!app.is_editing());
}

#[test]
fn plain_users_cannot_manage_rooms() {
    let mut app = app_with_role(EnvironmentRole::User);
    app.navigate(Route::Environment {
        env: 2,
        tab: Some(EnvTab::Rooms),
    });
    app.rooms.apply_page(0, &single_page(room(10, "Kitchen")), 10);

    app.begin_new();
    app.begin_delete();

    assert!(!app.is_editing());
    assert_eq!(latest_level(&app), Some(NotificationLevel::Warning));
}

#[test]
fn unknown_role_blocks_writes() {
    let mut app = app(true);
    app.navigate(Route::Environment {
        env: 9,
        tab: Some(EnvTab::Members),
    });
    app.begin_new();
    assert!(app.prompt.is_none());
}

#[test]
fn room_removal_needs_confirmation() {
    let mut app = app_with_role(EnvironmentRole::Owner);
    app.navigate(Route::Environment {
        env: 2,
        tab: Some(EnvTab::Rooms),
    });
    app.rooms.apply_page(0, &single_page(room(10, "Kitchen")), 10);

    app.begin_delete();
    assert_eq!(app.confirm, Some(Mutation::RemoveRoom { env: 2, room: 10 }));
    assert_eq!(app.confirm_key(key(KeyCode::Char('n'))), None);
    assert!(app.confirm.is_none());
    assert_eq!(latest_level(&app), Some(NotificationLevel::Info));

    app.begin_delete();
    assert_eq!(
        app.confirm_key(key(KeyCode::Char('y'))),
        Some(Mutation::RemoveRoom { env: 2, room: 10 })
    );
}

#[test]
fn rename_prompt_starts_from_current_name() {
    let mut app = app_with_role(EnvironmentRole::Admin);
    app.navigate(Route::Environment {
        env: 2,
        tab: Some(EnvTab::Rooms),
    });
    app.rooms.apply_page(0, &single_page(room(10, "Kitchen")), 10);

    app.begin_edit();
    let prompt = app.prompt.clone().unwrap();
    assert_eq!(prompt.kind, PromptKind::RenameRoom { env: 2, room: 10 });
    assert_eq!(prompt.input, "Kitchen");

    type_text(&mut app, "ettx");
    app.prompt_key(key(KeyCode::Backspace));
    type_text(&mut app, "e");
    assert_eq!(
        app.prompt_key(key(KeyCode::Enter)),
        Some(Mutation::RenameRoom {
            env: 2,
            room: 10,
            name: "Kitchenette".to_string()
        })
    );
}

#[test]
fn member_role_toggles_but_owner_is_protected() {
    let mut app = app_with_role(EnvironmentRole::Owner);
    app.navigate(Route::Environment {
        env: 2,
        tab: Some(EnvTab::Members),
    });

    app.members.apply_page(
        0,
        &single_page(member(7, "owner@airsense.io", EnvironmentRole::Owner)),
        10,
    );
    app.begin_role_change();
    assert!(app.confirm.is_none());
    app.begin_delete();
    assert!(app.confirm.is_none());
    assert_eq!(latest_level(&app), Some(NotificationLevel::Warning));

    app.members.apply_page(
        0,
        &single_page(member(8, "ann@airsense.io", EnvironmentRole::Admin)),
        10,
    );
    app.begin_role_change();
    assert_eq!(
        app.confirm,
        Some(Mutation::ChangeMemberRole {
            env: 2,
            member: 8,
            role: EnvironmentRole::User
        })
    );
}

#[test]
fn applied_write_rebuilds_stores_and_leaves_removed_room() {
    let mut app = app_with_role(EnvironmentRole::Owner);
    app.navigate(Route::Room {
        env: 2,
        room: 10,
        tab: Some(RoomTab::Settings),
    });
    let before = Arc::clone(&app.stores);

    let next = app.mutation_applied(&Mutation::RemoveRoom { env: 2, room: 10 });

    assert!(!Arc::ptr_eq(&before, &app.stores));
    assert_eq!(
        next,
        Route::Environment {
            env: 2,
            tab: Some(EnvTab::Rooms)
        }
    );
    assert_eq!(latest_level(&app), Some(NotificationLevel::Success));
}

#[test]
fn sign_out_drops_pending_edits() {
    let mut app = app(true);
    app.begin_new();
    assert!(app.is_editing());
    app.sign_out("Session expired");
    assert!(!app.is_editing());
}

// ============================================================================
// PERSISTENCE
// ============================================================================

#[test]
fn persisted_route_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("airsense-tui.json");
    assert!(persistence::load(&path).unwrap().is_none());

    let state = PersistedState {
        last_route: "/env/3/room/12/devices".to_string(),
        history_interval: None,
    };
    persistence::save(&path, &state).unwrap();

    let loaded = persistence::load(&path).unwrap().unwrap();
    assert_eq!(loaded, state);
    assert_eq!(
        loaded.route(),
        Some(Route::Room {
            env: 3,
            room: 12,
            tab: Some(RoomTab::Devices)
        })
    );
}

#[test]
fn theme_colors_follow_parameter_status() {
    let theme = AirSenseTheme::airsense();
    assert_eq!(parameter_status_color(ParameterStatus::Critical, &theme), theme.error);
    assert_eq!(parameter_status_color(ParameterStatus::Normal, &theme), theme.success);
    assert_eq!(parameter_status_color(ParameterStatus::OutOfRange, &theme), theme.warning);
}

// ============================================================================
// PROPERTIES
// ============================================================================

fn route_strategy() -> impl Strategy<Value = Route> {
    let id = 0i64..10_000;
    prop_oneof![
        Just(Route::Dashboard),
        Just(Route::Login),
        (id.clone(), prop::option::of(prop::sample::select(EnvTab::all().to_vec())))
            .prop_map(|(env, tab)| Route::Environment { env, tab }),
        (
            id.clone(),
            id.clone(),
            prop::option::of(prop::sample::select(RoomTab::all().to_vec()))
        )
            .prop_map(|(env, room, tab)| Route::Room { env, room, tab }),
        (id.clone(), id.clone(), id.clone())
            .prop_map(|(env, room, sensor)| Route::Sensor { env, room, sensor }),
        (id.clone(), id.clone(), id).prop_map(|(env, room, device)| Route::Device {
            env,
            room,
            device
        }),
    ]
}

proptest! {
    #[test]
    fn route_path_parses_back(route in route_strategy()) {
        prop_assert_eq!(Route::parse(&route.path()), Some(route));
    }

    #[test]
    fn guarded_route_respects_auth(route in route_strategy(), authenticated in prop::bool::ANY) {
        let landed = airsense_tui::nav::guard(route, authenticated);
        if authenticated {
            prop_assert!(!landed.guest_only());
        } else {
            prop_assert!(!landed.requires_auth());
        }
    }

    #[test]
    fn navigation_keys_consistent(use_vim in prop::bool::ANY) {
        let key = if use_vim {
            KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE)
        } else {
            KeyEvent::new(KeyCode::Down, KeyModifiers::NONE)
        };
        prop_assert_eq!(map_key(key), Some(Action::MoveDown));
    }

    #[test]
    fn all_action_keys_mapped(key_char in "[qrinp?hjklaedc]") {
        let c = key_char.chars().next().unwrap();
        let event = KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE);
        prop_assert!(map_key(event).is_some(), "Key '{}' should map to an action", c);
    }

    #[test]
    fn unbound_letters_do_nothing(key_char in "[bfgmostuvwxyz]") {
        let c = key_char.chars().next().unwrap();
        let event = KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE);
        prop_assert!(map_key(event).is_none());
    }

    #[test]
    fn route_up_terminates(route in route_strategy()) {
        let mut current = route;
        let mut steps = 0;
        while let Some(parent) = current.up() {
            current = parent;
            steps += 1;
            prop_assert!(steps <= 4);
        }
        prop_assert!(matches!(current, Route::Dashboard | Route::Login));
    }
}
