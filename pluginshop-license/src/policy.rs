//! License types and the static policy table behind them.
//!
//! | type | max activations | duration |
//! |---|---|---|
//! | single | 1 | 365 days |
//! | team | 5 | 365 days |
//! | enterprise | unlimited | perpetual |

use crate::error::LicenseError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire value for "no activation limit" and "no expiry".
pub const UNLIMITED_SENTINEL: i64 = -1;

/// The kind of license a customer bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseType {
    /// One seat, one device.
    Single,
    /// Small team, five devices.
    Team,
    /// Site license without device or time limits.
    Enterprise,
}

impl LicenseType {
    /// Every license type, in catalog order.
    pub const ALL: [LicenseType; 3] = [Self::Single, Self::Team, Self::Enterprise];

    /// Returns how many devices may be activated at once.
    #[must_use]
    pub fn max_activations(&self) -> ActivationLimit {
        match self {
            Self::Single => ActivationLimit::Limited(1),
            Self::Team => ActivationLimit::Limited(5),
            Self::Enterprise => ActivationLimit::Unlimited,
        }
    }

    /// Returns the license duration in days, or None for perpetual.
    #[must_use]
    pub fn duration_days(&self) -> Option<u32> {
        match self {
            Self::Single | Self::Team => Some(365),
            Self::Enterprise => None,
        }
    }

    /// Human-readable name shown in the catalog.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Single => "Single User",
            Self::Team => "Team License",
            Self::Enterprise => "Enterprise",
        }
    }

    /// Features bundled with this license type.
    #[must_use]
    pub fn features(&self) -> &'static [&'static str] {
        match self {
            Self::Single => &["Basic Support", "Updates for 1 Year"],
            Self::Team => &["Priority Support", "Updates for 1 Year", "Team Management"],
            Self::Enterprise => &[
                "24/7 Support",
                "Lifetime Updates",
                "Custom Integration",
                "Training",
            ],
        }
    }

    /// Returns the full policy row for this type.
    #[must_use]
    pub fn policy(&self) -> LicensePolicy {
        LicensePolicy {
            license_type: *self,
            name: self.display_name(),
            max_activations: self.max_activations(),
            duration_days: self
                .duration_days()
                .map_or(UNLIMITED_SENTINEL, i64::from),
            features: self.features(),
        }
    }

    /// Lowercase wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Team => "team",
            Self::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for LicenseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maximum number of simultaneous device activations.
///
/// Serialized as an integer, with `-1` meaning unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum ActivationLimit {
    /// At most this many devices (always at least 1).
    Limited(u32),
    /// No device limit.
    Unlimited,
}

impl ActivationLimit {
    /// Returns true if one more activation fits on top of `current`.
    #[must_use]
    pub fn allows(&self, current: u32) -> bool {
        match self {
            Self::Limited(max) => current < *max,
            Self::Unlimited => true,
        }
    }

    /// Returns the limit, or None when unlimited.
    #[must_use]
    pub fn as_limit(&self) -> Option<u32> {
        match self {
            Self::Limited(max) => Some(*max),
            Self::Unlimited => None,
        }
    }

    #[must_use]
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Self::Unlimited)
    }
}

impl From<ActivationLimit> for i64 {
    fn from(limit: ActivationLimit) -> Self {
        match limit {
            ActivationLimit::Limited(max) => i64::from(max),
            ActivationLimit::Unlimited => UNLIMITED_SENTINEL,
        }
    }
}

impl TryFrom<i64> for ActivationLimit {
    type Error = LicenseError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value == UNLIMITED_SENTINEL {
            return Ok(Self::Unlimited);
        }
        match u32::try_from(value) {
            Ok(max) if max >= 1 => Ok(Self::Limited(max)),
            _ => Err(LicenseError::InvalidActivationLimit(value)),
        }
    }
}

impl fmt::Display for ActivationLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limited(max) => write!(f, "{max}"),
            Self::Unlimited => f.write_str("unlimited"),
        }
    }
}

/// One row of the license type table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LicensePolicy {
    /// The type this row describes.
    #[serde(rename = "type")]
    pub license_type: LicenseType,
    /// Display name.
    pub name: &'static str,
    /// Device limit.
    pub max_activations: ActivationLimit,
    /// Duration in days, `-1` for perpetual.
    pub duration_days: i64,
    /// Bundled features.
    pub features: &'static [&'static str],
}
