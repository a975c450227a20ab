//! REST client for the AirSense API.
//!
//! Listing endpoints return `{data, pagination}` envelopes and answer
//! `204 No Content` for an empty collection. The bearer token is read from
//! the shared [`TokenStore`] on every request, so a refresh takes effect
//! immediately.

use crate::auth::TokenStore;
use crate::config::TuiConfig;
use crate::history::HistoryQuery;
use airsense_core::{
    Device, EntityId, Environment, EnvironmentRole, FetchError, HistoryEntry, Member, Page, Room,
    Sensor,
};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Not authenticated")]
    Unauthenticated,
}

impl From<ApiClientError> for FetchError {
    fn from(err: ApiClientError) -> Self {
        match err {
            ApiClientError::Http(e) if e.is_decode() => FetchError::Decode {
                reason: e.to_string(),
            },
            ApiClientError::Http(e) => FetchError::transport(e.to_string()),
            ApiClientError::Serde(e) => FetchError::Decode {
                reason: e.to_string(),
            },
            ApiClientError::Status { status, message } => FetchError::status(status, message),
            ApiClientError::Unauthenticated => FetchError::Unauthenticated,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Serialize)]
struct PageQuery {
    skip: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u64>,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    notification_token: &'a str,
}

#[derive(Debug, Serialize)]
struct NameRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct SerialRequest<'a> {
    serial_number: &'a str,
}

#[derive(Debug, Serialize)]
struct RoleRequest {
    role: EnvironmentRole,
}

#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
}

impl RestClient {
    pub fn new(config: &TuiConfig, tokens: TokenStore) -> Result<Self, ApiClientError> {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    // ------------------------------------------------------------------------
    // Environments
    // ------------------------------------------------------------------------

    pub async fn list_environments(
        &self,
        skip: u64,
        count: u64,
    ) -> Result<Page<Environment>, ApiClientError> {
        self.get_page("/env", skip, Some(count)).await
    }

    pub async fn list_members(
        &self,
        env_id: EntityId,
        skip: u64,
        count: u64,
    ) -> Result<Page<Member>, ApiClientError> {
        let path = format!("/env/{}/member", env_id);
        self.get_page(&path, skip, Some(count)).await
    }

    // ------------------------------------------------------------------------
    // Rooms
    // ------------------------------------------------------------------------

    pub async fn list_rooms(
        &self,
        env_id: EntityId,
        skip: u64,
        count: u64,
    ) -> Result<Page<Room>, ApiClientError> {
        let path = format!("/env/{}/room", env_id);
        self.get_page(&path, skip, Some(count)).await
    }

    /// A single room with its live parameters.
    pub async fn get_room(&self, env_id: EntityId, room_id: EntityId) -> Result<Room, ApiClientError> {
        let path = format!("/env/{}/room/{}", env_id, room_id);
        let response = self.request(Method::GET, &path).send().await?;
        parse_response(response).await
    }

    // ------------------------------------------------------------------------
    // Sensors and devices (server-chosen page size)
    // ------------------------------------------------------------------------

    pub async fn list_sensors(
        &self,
        room_id: EntityId,
        skip: u64,
    ) -> Result<Page<Sensor>, ApiClientError> {
        let path = format!("/room/{}/sensor", room_id);
        self.get_page(&path, skip, None).await
    }

    pub async fn list_devices(
        &self,
        room_id: EntityId,
        skip: u64,
    ) -> Result<Page<Device>, ApiClientError> {
        let path = format!("/room/{}/device", room_id);
        self.get_page(&path, skip, None).await
    }

    // ------------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------------

    pub async fn room_history(
        &self,
        room_id: EntityId,
        query: &HistoryQuery,
    ) -> Result<Vec<HistoryEntry>, ApiClientError> {
        let path = format!("/room/{}/history", room_id);
        self.get_list(&path, query).await
    }

    pub async fn device_history(
        &self,
        room_id: EntityId,
        device_id: EntityId,
        query: &HistoryQuery,
    ) -> Result<Vec<HistoryEntry>, ApiClientError> {
        let path = format!("/room/{}/history/{}", room_id, device_id);
        self.get_list(&path, query).await
    }

    // ------------------------------------------------------------------------
    // Account
    // ------------------------------------------------------------------------

    /// Create the API account for the current token's user.
    pub async fn register(&self, notification_token: &str) -> Result<(), ApiClientError> {
        let response = self
            .request(Method::POST, "/auth")
            .json(&RegisterRequest { notification_token })
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Management
    // ------------------------------------------------------------------------

    pub async fn create_environment(&self, name: &str) -> Result<Environment, ApiClientError> {
        let response = self
            .request(Method::POST, "/env")
            .json(&NameRequest { name })
            .send()
            .await?;
        parse_response(response).await
    }

    pub async fn create_room(&self, env_id: EntityId, name: &str) -> Result<Room, ApiClientError> {
        let path = format!("/env/{}/room", env_id);
        let response = self
            .request(Method::POST, &path)
            .json(&NameRequest { name })
            .send()
            .await?;
        parse_response(response).await
    }

    pub async fn rename_room(
        &self,
        env_id: EntityId,
        room_id: EntityId,
        name: &str,
    ) -> Result<(), ApiClientError> {
        let path = format!("/env/{}/room/{}", env_id, room_id);
        self.write(Method::PATCH, &path, &NameRequest { name }).await
    }

    pub async fn remove_room(&self, env_id: EntityId, room_id: EntityId) -> Result<(), ApiClientError> {
        self.delete(&format!("/env/{}/room/{}", env_id, room_id)).await
    }

    /// Invite a user by email. The address travels in the path.
    pub async fn add_member(&self, env_id: EntityId, email: &str) -> Result<(), ApiClientError> {
        let path = format!("/env/{}/member/{}", env_id, email);
        let response = self.request(Method::POST, &path).send().await?;
        check_status(response).await?;
        Ok(())
    }

    pub async fn change_member_role(
        &self,
        env_id: EntityId,
        member_id: EntityId,
        role: EnvironmentRole,
    ) -> Result<(), ApiClientError> {
        let path = format!("/env/{}/member/{}", env_id, member_id);
        self.write(Method::PATCH, &path, &RoleRequest { role }).await
    }

    pub async fn remove_member(&self, env_id: EntityId, member_id: EntityId) -> Result<(), ApiClientError> {
        self.delete(&format!("/env/{}/member/{}", env_id, member_id)).await
    }

    pub async fn add_sensor(&self, room_id: EntityId, serial_number: &str) -> Result<(), ApiClientError> {
        let path = format!("/room/{}/sensor", room_id);
        self.write(Method::POST, &path, &SerialRequest { serial_number }).await
    }

    pub async fn remove_sensor(&self, room_id: EntityId, sensor_id: EntityId) -> Result<(), ApiClientError> {
        self.delete(&format!("/room/{}/sensor/{}", room_id, sensor_id)).await
    }

    pub async fn add_device(&self, room_id: EntityId, serial_number: &str) -> Result<(), ApiClientError> {
        let path = format!("/room/{}/device", room_id);
        self.write(Method::POST, &path, &SerialRequest { serial_number }).await
    }

    pub async fn remove_device(&self, room_id: EntityId, device_id: EntityId) -> Result<(), ApiClientError> {
        self.delete(&format!("/room/{}/device/{}", room_id, device_id)).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request = self.client.request(method, url);
        match self.tokens.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        skip: u64,
        count: Option<u64>,
    ) -> Result<Page<T>, ApiClientError> {
        let response = self
            .request(Method::GET, path)
            .query(&PageQuery { skip, count })
            .send()
            .await?;
        if response.status() == StatusCode::NO_CONTENT {
            debug!(path, skip, "Empty collection");
            return Ok(Page::empty(skip, count.unwrap_or(0)));
        }
        parse_response(response).await
    }

    async fn write<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<(), ApiClientError> {
        let response = self.request(method, path).json(body).send().await?;
        check_status(response).await?;
        debug!(path, "Write accepted");
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), ApiClientError> {
        let response = self.request(Method::DELETE, path).send().await?;
        check_status(response).await?;
        debug!(path, "Delete accepted");
        Ok(())
    }

    async fn get_list<T, Q>(&self, path: &str, query: &Q) -> Result<Vec<T>, ApiClientError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self.request(Method::GET, path).query(query).send().await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        parse_response(response).await
    }
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, ApiClientError> {
    let response = check_status(response).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn check_status(response: Response) -> Result<Response, ApiClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiClientError::Unauthenticated);
    }
    let text = response.text().await?;
    Err(ApiClientError::Status {
        status: status.as_u16(),
        message: server_message(text),
    })
}

/// The `message` of a JSON error body, or the raw body.
fn server_message(text: String) -> String {
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => body.message,
        Err(_) => text,
    }
}
