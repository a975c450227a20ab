//! AirSense Core - Entity Types
//!
//! Pure data structures shared by the lookup cache and the dashboard client.
//! This crate contains ONLY data types and error definitions - no I/O.

pub mod entities;
pub mod error;
pub mod pagination;

pub use entities::{
    Device, Environment, EnvironmentRole, HistoryEntry, Member, Parameter, ParameterStatus, Room,
    Sensor,
};
pub use error::{CacheError, CacheResult, FetchError};
pub use pagination::{Page, Pagination};

/// Integer identifier of an entity, unique within its parent scope.
pub type EntityId = i64;

/// Identifier of an environment (the scope of rooms and members).
pub type EnvironmentId = EntityId;

/// Identifier of a room (the scope of sensors and devices).
pub type RoomId = EntityId;

/// Unix timestamp in seconds, as reported by the API.
pub type UnixSeconds = i64;
