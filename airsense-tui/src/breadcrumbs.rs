//! Breadcrumb trail for the current route.
//!
//! Every id in the route becomes a crumb: environment, then room, then the
//! sensor or device. A crumb names its entity once the lookup settles and
//! remembers how it settled, so the header can tell "no such room" apart
//! from "the API is down".

use crate::nav::Route;
use airsense_cache::{CacheResult, PageFetcher, PagedLookupCache};
use airsense_core::{Device, EntityId, Environment, EnvironmentId, Room, RoomId, Sensor};
use futures_util::future::join_all;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrumbKind {
    Environment,
    Room,
    Device,
    Sensor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrumbState {
    Loading,
    Resolved,
    /// The collection was scanned and the id is not in it.
    Missing,
    /// The lookup failed; the message is the error.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub kind: CrumbKind,
    pub id: EntityId,
    /// Scope of the lookup: the environment of a room, the room of a sensor
    /// or device.
    pub parent: Option<EntityId>,
    pub label: String,
    pub path: String,
    pub state: CrumbState,
}

impl Crumb {
    fn pending(kind: CrumbKind, id: EntityId, parent: Option<EntityId>, path: String) -> Self {
        Self {
            kind,
            id,
            parent,
            label: fallback_label(kind, id),
            path,
            state: CrumbState::Loading,
        }
    }

    fn settle<T>(
        mut self,
        outcome: CacheResult<Option<T>>,
        label: impl FnOnce(&T) -> String,
    ) -> Self {
        match outcome {
            Ok(Some(entity)) => {
                self.label = label(&entity);
                self.state = CrumbState::Resolved;
            }
            Ok(None) => self.state = CrumbState::Missing,
            Err(err) => self.state = CrumbState::Failed(err.to_string()),
        }
        self
    }
}

/// Label used until (or unless) the entity is known.
pub fn fallback_label(kind: CrumbKind, id: EntityId) -> String {
    match kind {
        CrumbKind::Environment => format!("Environment {}", id),
        CrumbKind::Room => format!("Room {}", id),
        CrumbKind::Device => format!("Device #{}", id),
        CrumbKind::Sensor => format!("Sensor #{}", id),
    }
}

fn named(name: &str, kind: CrumbKind, id: EntityId) -> String {
    if name.trim().is_empty() {
        fallback_label(kind, id)
    } else {
        name.to_string()
    }
}

/// Unresolved crumbs for `route`, outermost first.
pub fn pending_crumbs(route: &Route) -> Vec<Crumb> {
    let params = route.params();
    let mut crumbs = Vec::new();
    let Some(env) = params.env else {
        return crumbs;
    };
    crumbs.push(Crumb::pending(
        CrumbKind::Environment,
        env,
        None,
        format!("/env/{}", env),
    ));

    let Some(room) = params.room else {
        return crumbs;
    };
    let room_path = format!("/env/{}/room/{}", env, room);
    crumbs.push(Crumb::pending(CrumbKind::Room, room, Some(env), room_path.clone()));

    if let Some(device) = params.device {
        crumbs.push(Crumb::pending(
            CrumbKind::Device,
            device,
            Some(room),
            format!("{}/devices/{}", room_path, device),
        ));
    }
    if let Some(sensor) = params.sensor {
        crumbs.push(Crumb::pending(
            CrumbKind::Sensor,
            sensor,
            Some(room),
            format!("{}/sensors/{}", room_path, sensor),
        ));
    }
    crumbs
}

/// The four lookup caches a trail is resolved through.
pub struct TrailSources<'a, E, R, S, D>
where
    E: PageFetcher<Scope = (), Entity = Environment>,
    R: PageFetcher<Scope = EnvironmentId, Entity = Room>,
    S: PageFetcher<Scope = RoomId, Entity = Sensor>,
    D: PageFetcher<Scope = RoomId, Entity = Device>,
{
    pub environments: &'a PagedLookupCache<E>,
    pub rooms: &'a PagedLookupCache<R>,
    pub sensors: &'a PagedLookupCache<S>,
    pub devices: &'a PagedLookupCache<D>,
}

impl<'a, E, R, S, D> TrailSources<'a, E, R, S, D>
where
    E: PageFetcher<Scope = (), Entity = Environment>,
    R: PageFetcher<Scope = EnvironmentId, Entity = Room>,
    S: PageFetcher<Scope = RoomId, Entity = Sensor>,
    D: PageFetcher<Scope = RoomId, Entity = Device>,
{
    /// Crumbs for `route` without any I/O: indexed entities are resolved,
    /// the rest stay loading.
    pub fn skeleton(&self, route: &Route) -> Vec<Crumb> {
        pending_crumbs(route)
            .into_iter()
            .map(|crumb| {
                let cached = match (crumb.kind, crumb.parent) {
                    (CrumbKind::Environment, _) => self
                        .environments
                        .get_cached(&(), crumb.id)
                        .map(|e| named(&e.name, crumb.kind, crumb.id)),
                    (CrumbKind::Room, Some(env)) => self
                        .rooms
                        .get_cached(&env, crumb.id)
                        .map(|r| named(&r.name, crumb.kind, crumb.id)),
                    (CrumbKind::Sensor, Some(room)) => {
                        self.sensors.get_cached(&room, crumb.id).map(|s| s.label())
                    }
                    (CrumbKind::Device, Some(room)) => {
                        self.devices.get_cached(&room, crumb.id).map(|d| d.label())
                    }
                    _ => None,
                };
                match cached {
                    Some(label) => Crumb {
                        label,
                        state: CrumbState::Resolved,
                        ..crumb
                    },
                    None => crumb,
                }
            })
            .collect()
    }

    /// Whether the lookup behind `crumb` is in flight.
    pub fn is_loading(&self, crumb: &Crumb) -> bool {
        match (crumb.kind, crumb.parent) {
            (CrumbKind::Environment, _) => self.environments.is_loading(&(), crumb.id),
            (CrumbKind::Room, Some(env)) => self.rooms.is_loading(&env, crumb.id),
            (CrumbKind::Sensor, Some(room)) => self.sensors.is_loading(&room, crumb.id),
            (CrumbKind::Device, Some(room)) => self.devices.is_loading(&room, crumb.id),
            _ => false,
        }
    }

    /// Resolve every crumb of `route`. Lookups run concurrently.
    pub async fn resolve(&self, route: &Route) -> Vec<Crumb> {
        join_all(pending_crumbs(route).into_iter().map(|c| self.resolve_crumb(c))).await
    }

    async fn resolve_crumb(&self, crumb: Crumb) -> Crumb {
        let (kind, id) = (crumb.kind, crumb.id);
        match (kind, crumb.parent) {
            (CrumbKind::Environment, _) => {
                let outcome = self.environments.find_by_id(&(), id).await;
                crumb.settle(outcome, |e| named(&e.name, kind, id))
            }
            (CrumbKind::Room, Some(env)) => {
                let outcome = self.rooms.find_by_id(&env, id).await;
                crumb.settle(outcome, |r| named(&r.name, kind, id))
            }
            (CrumbKind::Sensor, Some(room)) => {
                let outcome = self.sensors.find_by_id(&room, id).await;
                crumb.settle(outcome, Sensor::label)
            }
            (CrumbKind::Device, Some(room)) => {
                let outcome = self.devices.find_by_id(&room, id).await;
                crumb.settle(outcome, Device::label)
            }
            _ => crumb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_crumbs_follow_route_depth() {
        assert!(pending_crumbs(&Route::Dashboard).is_empty());

        let crumbs = pending_crumbs(&Route::Device {
            env: 1,
            room: 4,
            device: 9,
        });
        let labels: Vec<&str> = crumbs.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Environment 1", "Room 4", "Device #9"]);
        assert_eq!(crumbs[2].path, "/env/1/room/4/devices/9");
        assert_eq!(crumbs[2].parent, Some(4));
        assert!(crumbs.iter().all(|c| c.state == CrumbState::Loading));
    }

    #[test]
    fn test_fallback_labels() {
        assert_eq!(fallback_label(CrumbKind::Sensor, 5), "Sensor #5");
        assert_eq!(named("  ", CrumbKind::Room, 2), "Room 2");
        assert_eq!(named("Lab", CrumbKind::Room, 2), "Lab");
    }
}
