//! Device activation records.
//!
//! Creating an activation never consults license validity. Callers decide
//! whether a license may take another device and only then build the record.

use crate::device::DeviceInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for an activation.
/// Uses UUID v7 so activations sort by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivationId(Uuid);

impl ActivationId {
    /// Creates a new activation ID with the current timestamp.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ActivationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActivationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ActivationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// One device bound to one license key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activation {
    pub id: ActivationId,
    /// Key this device is activated under.
    pub license_key: String,
    /// Device fingerprint.
    pub machine_id: String,
    pub activated_at: DateTime<Utc>,
    /// Refreshed on every successful use.
    pub last_seen: DateTime<Utc>,
    /// Host platform description.
    pub os_info: String,
    /// Host application version.
    pub app_version: String,
}

impl Activation {
    /// Records a successful use at `now`. Earlier timestamps are ignored.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_seen {
            self.last_seen = now;
        }
    }
}

/// Builds an activation for the current host at the current time.
#[must_use]
pub fn create_activation(license_key: &str, machine_id: &str, app_version: &str) -> Activation {
    create_activation_at(
        license_key,
        machine_id,
        app_version,
        Utc::now(),
        &DeviceInfo::collect().platform(),
    )
}

/// Builds an activation with an explicit time and platform string.
#[must_use]
pub fn create_activation_at(
    license_key: &str,
    machine_id: &str,
    app_version: &str,
    now: DateTime<Utc>,
    os_info: &str,
) -> Activation {
    Activation {
        id: ActivationId::new(),
        license_key: license_key.to_string(),
        machine_id: machine_id.to_string(),
        activated_at: now,
        last_seen: now,
        os_info: os_info.to_string(),
        app_version: app_version.to_string(),
    }
}
