//! [`PageFetcher`] adapters over the REST client, one per collection.

use crate::api_client::RestClient;
use airsense_cache::PageFetcher;
use airsense_core::{
    Device, Environment, EnvironmentId, FetchError, Member, Page, Room, RoomId, Sensor,
};
use async_trait::async_trait;

/// All environments visible to the user. Global scope.
#[derive(Clone)]
pub struct EnvironmentPages {
    client: RestClient,
    count: u64,
}

impl EnvironmentPages {
    pub fn new(client: RestClient, count: u64) -> Self {
        Self { client, count }
    }
}

#[async_trait]
impl PageFetcher for EnvironmentPages {
    type Scope = ();
    type Entity = Environment;

    async fn fetch_page(&self, _scope: &(), offset: u64) -> Result<Page<Environment>, FetchError> {
        Ok(self.client.list_environments(offset, self.count).await?)
    }
}

/// Rooms of one environment.
#[derive(Clone)]
pub struct RoomPages {
    client: RestClient,
    count: u64,
}

impl RoomPages {
    pub fn new(client: RestClient, count: u64) -> Self {
        Self { client, count }
    }
}

#[async_trait]
impl PageFetcher for RoomPages {
    type Scope = EnvironmentId;
    type Entity = Room;

    async fn fetch_page(&self, env_id: &EnvironmentId, offset: u64) -> Result<Page<Room>, FetchError> {
        Ok(self.client.list_rooms(*env_id, offset, self.count).await?)
    }
}

/// Members of one environment.
#[derive(Clone)]
pub struct MemberPages {
    client: RestClient,
    count: u64,
}

impl MemberPages {
    pub fn new(client: RestClient, count: u64) -> Self {
        Self { client, count }
    }
}

#[async_trait]
impl PageFetcher for MemberPages {
    type Scope = EnvironmentId;
    type Entity = Member;

    async fn fetch_page(&self, env_id: &EnvironmentId, offset: u64) -> Result<Page<Member>, FetchError> {
        Ok(self.client.list_members(*env_id, offset, self.count).await?)
    }
}

/// Sensors of one room. The server picks the page size.
#[derive(Clone)]
pub struct SensorPages {
    client: RestClient,
}

impl SensorPages {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for SensorPages {
    type Scope = RoomId;
    type Entity = Sensor;

    async fn fetch_page(&self, room_id: &RoomId, offset: u64) -> Result<Page<Sensor>, FetchError> {
        Ok(self.client.list_sensors(*room_id, offset).await?)
    }
}

/// Ventilation devices of one room. The server picks the page size.
#[derive(Clone)]
pub struct DevicePages {
    client: RestClient,
}

impl DevicePages {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for DevicePages {
    type Scope = RoomId;
    type Entity = Device;

    async fn fetch_page(&self, room_id: &RoomId, offset: u64) -> Result<Page<Device>, FetchError> {
        Ok(self.client.list_devices(*room_id, offset).await?)
    }
}
