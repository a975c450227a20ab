//! Entity records returned by the AirSense API.

use crate::{EntityId, UnixSeconds};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ENVIRONMENTS
// ============================================================================

/// Role of the current user inside an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentRole {
    Owner,
    Admin,
    #[serde(other)]
    User,
}

impl EnvironmentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentRole::Owner => "owner",
            EnvironmentRole::Admin => "admin",
            EnvironmentRole::User => "user",
        }
    }

    /// Whether this role may manage rooms and members.
    pub fn can_manage(&self) -> bool {
        matches!(self, EnvironmentRole::Owner | EnvironmentRole::Admin)
    }
}

impl fmt::Display for EnvironmentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A monitored environment (a building, an office, a home).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub id: EntityId,
    pub name: String,
    pub role: EnvironmentRole,
}

/// A member of an environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: EntityId,
    pub email: String,
    pub role: EnvironmentRole,
    pub name: String,
}

// ============================================================================
// ROOMS AND PARAMETERS
// ============================================================================

/// Classification of a live parameter value against its thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterStatus {
    /// No reading has been reported yet.
    NoData,
    Normal,
    /// Outside `[min_value, max_value]` but below the critical threshold.
    OutOfRange,
    Critical,
}

/// A live room parameter (temperature, humidity, pressure, co2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: Option<f64>,
    pub unit: String,
    pub min_value: f64,
    pub max_value: f64,
    pub critical_value: f64,
}

impl Parameter {
    pub fn status(&self) -> ParameterStatus {
        let Some(value) = self.value else {
            return ParameterStatus::NoData;
        };
        if value >= self.critical_value {
            ParameterStatus::Critical
        } else if value < self.min_value || value > self.max_value {
            ParameterStatus::OutOfRange
        } else {
            ParameterStatus::Normal
        }
    }

    /// Value with its unit, or a dash when nothing was reported.
    pub fn display_value(&self) -> String {
        match self.value {
            Some(value) => format!("{:.1} {}", value, self.unit),
            None => "-".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub parameters: Option<Vec<Parameter>>,
    #[serde(default)]
    pub device_speed: Option<f64>,
}

impl Room {
    pub fn parameters(&self) -> &[Parameter] {
        self.parameters.as_deref().unwrap_or(&[])
    }
}

// ============================================================================
// SENSORS AND DEVICES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: EntityId,
    pub type_name: String,
    pub serial_number: String,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub parameters: Option<Vec<Parameter>>,
}

impl Sensor {
    /// Label used in breadcrumbs and lists, e.g. `SCD41 #7`.
    pub fn label(&self) -> String {
        format!("{} #{}", self.type_name, self.id)
    }
}

/// A ventilation device installed in a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: EntityId,
    pub serial_number: String,
    pub fan_speed: f64,
    pub active_at: UnixSeconds,
}

impl Device {
    pub fn label(&self) -> String {
        format!("Device #{}", self.id)
    }

    pub fn last_active(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.active_at, 0)
    }
}

/// One point of a room or device history series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub value: f64,
    pub timestamp: UnixSeconds,
}
