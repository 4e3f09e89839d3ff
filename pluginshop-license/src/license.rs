//! The license record and its status rules.
//!
//! A license is usable while it is not expired and has a free activation
//! slot. `check_license` reports which rule failed; `is_license_valid`
//! collapses that to a boolean for callers that only need yes/no.

use crate::error::LicenseResult;
use crate::key::{generate_license_key_with, validate_license_key_format};
use crate::policy::{ActivationLimit, LicenseType};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Request to issue a new license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLicense {
    /// Purchased plugin.
    pub product_id: u32,
    /// Purchaser.
    pub user_id: String,
    /// Purchaser email (descriptive only).
    #[serde(default)]
    pub email: String,
    /// License type; single-user when omitted.
    #[serde(default = "default_license_type")]
    pub license_type: LicenseType,
}

fn default_license_type() -> LicenseType {
    LicenseType::Single
}

/// An issued license key and its activation bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseKey {
    /// The `XXXX-XXXX-XXXX-XXXX` key string.
    pub key: String,
    pub product_id: u32,
    pub user_id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    /// None for perpetual licenses.
    pub expires_at: Option<DateTime<Utc>>,
    pub max_activations: ActivationLimit,
    /// Live device activations, tracked by the owner of the record.
    pub current_activations: u32,
    #[serde(rename = "type")]
    pub license_type: LicenseType,
}

impl LicenseKey {
    /// Issues a license at `now`, deriving expiry and device limit from the
    /// license type.
    ///
    /// # Errors
    ///
    /// Returns an error if the product or user ID is unusable for key
    /// generation.
    pub fn issue<R: Rng + ?Sized>(
        request: NewLicense,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> LicenseResult<Self> {
        let key = generate_license_key_with(request.product_id, &request.user_id, now, rng)?;
        let license_type = request.license_type;

        Ok(Self {
            key,
            product_id: request.product_id,
            user_id: request.user_id,
            email: request.email,
            created_at: now,
            expires_at: license_type
                .duration_days()
                .map(|days| now + Duration::days(i64::from(days))),
            max_activations: license_type.max_activations(),
            current_activations: 0,
            license_type,
        })
    }

    /// Returns true if the license has an expiry strictly before `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp < now)
    }

    /// Free activation slots, or None when unlimited.
    #[must_use]
    pub fn remaining_activations(&self) -> Option<u32> {
        self.max_activations
            .as_limit()
            .map(|max| max.saturating_sub(self.current_activations))
    }
}

/// Why a license can or cannot be used right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum LicenseStatus {
    /// Unexpired with a free activation slot.
    Valid,
    /// Expiry passed.
    #[serde(rename_all = "camelCase")]
    Expired { expired_at: DateTime<Utc> },
    /// Every activation slot is in use.
    #[serde(rename_all = "camelCase")]
    ActivationLimitReached { max_activations: u32 },
}

impl LicenseStatus {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Evaluates expiry first, then the activation limit.
#[must_use]
pub fn check_license(license: &LicenseKey, now: DateTime<Utc>) -> LicenseStatus {
    if let Some(expired_at) = license.expires_at.filter(|exp| *exp < now) {
        return LicenseStatus::Expired { expired_at };
    }

    match license.max_activations {
        ActivationLimit::Limited(max) if license.current_activations >= max => {
            LicenseStatus::ActivationLimitReached {
                max_activations: max,
            }
        }
        _ => LicenseStatus::Valid,
    }
}

/// Returns true if `license` is usable at the current system time.
#[must_use]
pub fn is_license_valid(license: &LicenseKey) -> bool {
    is_license_valid_at(license, Utc::now())
}

/// Returns true if `license` is usable at `now`.
#[must_use]
pub fn is_license_valid_at(license: &LicenseKey, now: DateTime<Utc>) -> bool {
    check_license(license, now).is_valid()
}

/// Lifecycle state shown to customers.
///
/// `Active` moves to `Expired` with time and to `Invalid` when the key
/// cannot be resolved. Neither transition reverses without re-issuing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationalStatus {
    Active,
    Expired,
    Invalid,
}

/// Resolves the customer-facing status of `key` given its stored record.
///
/// A full activation list does not make a license inactive; it only blocks
/// new activations.
#[must_use]
pub fn resolve_status(
    key: &str,
    record: Option<&LicenseKey>,
    now: DateTime<Utc>,
) -> OperationalStatus {
    if !validate_license_key_format(key) {
        return OperationalStatus::Invalid;
    }
    match record {
        Some(license) if license.key != key => OperationalStatus::Invalid,
        Some(license) if license.is_expired_at(now) => OperationalStatus::Expired,
        Some(_) => OperationalStatus::Active,
        None => OperationalStatus::Invalid,
    }
}
