//! One paged lookup cache per collection, sharing a REST client.
//!
//! Stores live for a session. A reload replaces them wholesale; nothing is
//! evicted piecemeal.

use crate::api_client::RestClient;
use crate::breadcrumbs::TrailSources;
use crate::config::PagingConfig;
use crate::fetchers::{DevicePages, EnvironmentPages, MemberPages, RoomPages, SensorPages};
use airsense_cache::{CacheResult, CacheStats, PageFetcher, PageResult, PagedLookupCache};
use airsense_core::{Device, EntityId, Environment, Member, Room, Sensor};

pub struct Stores {
    pub environments: PagedLookupCache<EnvironmentPages>,
    pub rooms: PagedLookupCache<RoomPages>,
    pub members: PagedLookupCache<MemberPages>,
    pub sensors: PagedLookupCache<SensorPages>,
    pub devices: PagedLookupCache<DevicePages>,
    paging: PagingConfig,
}

impl Stores {
    pub fn new(client: &RestClient, paging: &PagingConfig) -> Self {
        Self {
            environments: PagedLookupCache::new(
                "environments",
                EnvironmentPages::new(client.clone(), paging.environment_page_size),
            ),
            rooms: PagedLookupCache::new(
                "rooms",
                RoomPages::new(client.clone(), paging.room_page_size),
            ),
            members: PagedLookupCache::new(
                "members",
                MemberPages::new(client.clone(), paging.member_page_size),
            ),
            sensors: PagedLookupCache::new("sensors", SensorPages::new(client.clone())),
            devices: PagedLookupCache::new("devices", DevicePages::new(client.clone())),
            paging: paging.clone(),
        }
    }

    // ------------------------------------------------------------------------
    // Numbered pages
    // ------------------------------------------------------------------------

    pub async fn environment_page(&self, page_number: u64) -> PageResult<Environment> {
        numbered_page(
            &self.environments,
            &(),
            page_number,
            self.paging.environment_page_size,
        )
        .await
    }

    pub async fn room_page(&self, env_id: EntityId, page_number: u64) -> PageResult<Room> {
        numbered_page(&self.rooms, &env_id, page_number, self.paging.room_page_size).await
    }

    pub async fn member_page(&self, env_id: EntityId, page_number: u64) -> PageResult<Member> {
        numbered_page(&self.members, &env_id, page_number, self.paging.member_page_size).await
    }

    /// Sensor pages are as long as the server makes them; page 0 tells.
    pub async fn sensor_page(&self, room_id: EntityId, page_number: u64) -> PageResult<Sensor> {
        numbered_page(&self.sensors, &room_id, page_number, 0).await
    }

    pub async fn device_page(&self, room_id: EntityId, page_number: u64) -> PageResult<Device> {
        numbered_page(&self.devices, &room_id, page_number, 0).await
    }

    pub fn environment_stride(&self) -> u64 {
        page_stride(
            self.environments.page_size(&()),
            self.paging.environment_page_size,
        )
    }

    pub fn room_stride(&self, env_id: EntityId) -> u64 {
        page_stride(self.rooms.page_size(&env_id), self.paging.room_page_size)
    }

    pub fn member_stride(&self, env_id: EntityId) -> u64 {
        page_stride(self.members.page_size(&env_id), self.paging.member_page_size)
    }

    pub fn sensor_stride(&self, room_id: EntityId) -> u64 {
        page_stride(self.sensors.page_size(&room_id), 0)
    }

    pub fn device_stride(&self, room_id: EntityId) -> u64 {
        page_stride(self.devices.page_size(&room_id), 0)
    }

    // ------------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------------

    pub async fn find_environment(&self, env_id: EntityId) -> CacheResult<Option<Environment>> {
        self.environments.find_by_id(&(), env_id).await
    }

    pub async fn find_room(&self, env_id: EntityId, room_id: EntityId) -> CacheResult<Option<Room>> {
        self.rooms.find_by_id(&env_id, room_id).await
    }

    pub async fn find_sensor(
        &self,
        room_id: EntityId,
        sensor_id: EntityId,
    ) -> CacheResult<Option<Sensor>> {
        self.sensors.find_by_id(&room_id, sensor_id).await
    }

    pub async fn find_device(
        &self,
        room_id: EntityId,
        device_id: EntityId,
    ) -> CacheResult<Option<Device>> {
        self.devices.find_by_id(&room_id, device_id).await
    }

    pub fn trail_sources(
        &self,
    ) -> TrailSources<'_, EnvironmentPages, RoomPages, SensorPages, DevicePages> {
        TrailSources {
            environments: &self.environments,
            rooms: &self.rooms,
            sensors: &self.sensors,
            devices: &self.devices,
        }
    }

    /// Activity of every cache, for the help screen.
    pub fn stats(&self) -> Vec<(&'static str, CacheStats)> {
        vec![
            (self.environments.name(), self.environments.stats()),
            (self.rooms.name(), self.rooms.stats()),
            (self.members.name(), self.members.stats()),
            (self.sensors.name(), self.sensors.stats()),
            (self.devices.name(), self.devices.stats()),
        ]
    }
}

/// Distance between numbered pages: the length the server actually returns
/// once a page has arrived, the requested length before that. A server that
/// caps `count` below the request would otherwise make pages skip entities.
pub fn page_stride(observed: Option<u64>, requested: u64) -> u64 {
    observed.filter(|size| *size > 0).unwrap_or(requested)
}

/// Page `page_number` of `scope`, zero-based.
pub async fn numbered_page<F: PageFetcher>(
    cache: &PagedLookupCache<F>,
    scope: &F::Scope,
    page_number: u64,
    requested: u64,
) -> PageResult<F::Entity> {
    let stride = page_stride(cache.page_size(scope), requested);
    cache
        .fetch_page(scope, page_number.saturating_mul(stride))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride_prefers_observed_size() {
        assert_eq!(page_stride(None, 10), 10);
        assert_eq!(page_stride(Some(4), 10), 4);
        assert_eq!(page_stride(Some(0), 10), 10);
        assert_eq!(page_stride(None, 0), 0);
    }
}
