//! In-memory license and activation store.
//!
//! All mutations go through one write lock, so checking a license and
//! bumping its activation count happen atomically. Key generation has no
//! uniqueness guarantee of its own; `issue` retries on collision.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use pluginshop_license::{
    Activation, ActivationId, Clock, LicenseError, LicenseKey, LicenseStatus, NewLicense,
    check_license, create_activation_at, validate_license_key_format,
};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Key candidates tried before giving up on a unique key.
pub const MAX_KEY_ATTEMPTS: usize = 8;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Key string is not `XXXX-XXXX-XXXX-XXXX`.
    #[error("invalid license key format: {0}")]
    InvalidKeyFormat(String),

    /// No license with this key.
    #[error("license not found: {0}")]
    NotFound(String),

    /// License expired before the request.
    #[error("license expired on {0}")]
    Expired(DateTime<Utc>),

    /// No free activation slot.
    #[error("activation limit reached (max {0} devices)")]
    ActivationLimitReached(u32),

    /// No activation with this ID under the key.
    #[error("activation not found: {0}")]
    ActivationNotFound(ActivationId),

    /// Every generated candidate was already taken.
    #[error("no unique license key after {0} attempts")]
    KeyCollision(usize),

    /// Issuance input rejected by the license service.
    #[error(transparent)]
    License(#[from] LicenseError),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
struct LicenseEntry {
    license: LicenseKey,
    activations: Vec<Activation>,
}

#[derive(Debug, Default)]
struct Inner {
    licenses: HashMap<String, LicenseEntry>,
}

impl Inner {
    fn entry(&self, key: &str) -> StoreResult<&LicenseEntry> {
        ensure_key_format(key)?;
        self.licenses
            .get(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn entry_mut(&mut self, key: &str) -> StoreResult<&mut LicenseEntry> {
        ensure_key_format(key)?;
        self.licenses
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }
}

fn ensure_key_format(key: &str) -> StoreResult<()> {
    if validate_license_key_format(key) {
        Ok(())
    } else {
        Err(StoreError::InvalidKeyFormat(key.to_string()))
    }
}

/// Shared license state for the API.
pub struct LicenseStore {
    inner: RwLock<Inner>,
    clock: Arc<dyn Clock>,
}

impl LicenseStore {
    /// Creates an empty store reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            clock,
        }
    }

    /// Current time according to the store's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Issues and stores a new license with a unique key.
    pub async fn issue(&self, request: NewLicense) -> StoreResult<LicenseKey> {
        let mut rng = StdRng::from_entropy();
        self.issue_with_rng(request, &mut rng).await
    }

    /// Issues a license drawing randomness from `rng`.
    pub async fn issue_with_rng<R>(
        &self,
        request: NewLicense,
        rng: &mut R,
    ) -> StoreResult<LicenseKey>
    where
        R: Rng + Send + ?Sized,
    {
        let now = self.clock.now();
        let mut inner = self.inner.write().await;

        for attempt in 1..=MAX_KEY_ATTEMPTS {
            let license = LicenseKey::issue(request.clone(), now, rng)?;
            if inner.licenses.contains_key(&license.key) {
                warn!(
                    "License key collision on attempt {}/{}",
                    attempt, MAX_KEY_ATTEMPTS
                );
                continue;
            }

            info!(
                "Issued {} license {} for product {} (user {})",
                license.license_type, license.key, license.product_id, license.user_id
            );
            inner.licenses.insert(
                license.key.clone(),
                LicenseEntry {
                    license: license.clone(),
                    activations: Vec::new(),
                },
            );
            return Ok(license);
        }

        Err(StoreError::KeyCollision(MAX_KEY_ATTEMPTS))
    }

    /// Returns the stored record for `key`.
    pub async fn get(&self, key: &str) -> StoreResult<LicenseKey> {
        let inner = self.inner.read().await;
        Ok(inner.entry(key)?.license.clone())
    }

    /// Evaluates whether `key` can take a new activation right now.
    pub async fn validate(&self, key: &str) -> StoreResult<LicenseStatus> {
        let now = self.clock.now();
        let inner = self.inner.read().await;
        Ok(check_license(&inner.entry(key)?.license, now))
    }

    /// Activates `machine_id` under `key`.
    ///
    /// A machine that is already activated is refreshed instead of taking
    /// another slot. Otherwise the license must be valid; the check and the
    /// count update happen under the same lock.
    pub async fn activate(
        &self,
        key: &str,
        machine_id: &str,
        app_version: &str,
        os_info: &str,
    ) -> StoreResult<Activation> {
        let now = self.clock.now();
        let mut inner = self.inner.write().await;
        let entry = inner.entry_mut(key)?;

        if let Some(expired_at) = entry.license.expires_at.filter(|exp| *exp < now) {
            warn!("Refused activation on expired license {}", key);
            return Err(StoreError::Expired(expired_at));
        }

        if let Some(existing) = entry
            .activations
            .iter_mut()
            .find(|a| a.machine_id == machine_id)
        {
            existing.touch(now);
            existing.app_version = app_version.to_string();
            info!("Refreshed activation {} on license {}", existing.id, key);
            return Ok(existing.clone());
        }

        match check_license(&entry.license, now) {
            LicenseStatus::Valid => {}
            LicenseStatus::Expired { expired_at } => return Err(StoreError::Expired(expired_at)),
            LicenseStatus::ActivationLimitReached { max_activations } => {
                warn!(
                    "Refused activation on license {}: limit of {} reached",
                    key, max_activations
                );
                return Err(StoreError::ActivationLimitReached(max_activations));
            }
        }

        let activation = create_activation_at(key, machine_id, app_version, now, os_info);
        entry.activations.push(activation.clone());
        entry.license.current_activations += 1;
        info!(
            "Activated machine {} on license {} ({}/{})",
            machine_id, key, entry.license.current_activations, entry.license.max_activations
        );
        Ok(activation)
    }

    /// Removes an activation and frees its slot.
    pub async fn deactivate(&self, key: &str, id: ActivationId) -> StoreResult<Activation> {
        let mut inner = self.inner.write().await;
        let entry = inner.entry_mut(key)?;

        let index = entry
            .activations
            .iter()
            .position(|a| a.id == id)
            .ok_or(StoreError::ActivationNotFound(id))?;
        let removed = entry.activations.remove(index);
        entry.license.current_activations = entry.license.current_activations.saturating_sub(1);

        info!("Deactivated {} on license {}", id, key);
        Ok(removed)
    }

    /// Lists activations for `key`, oldest first.
    pub async fn list_activations(&self, key: &str) -> StoreResult<Vec<Activation>> {
        let inner = self.inner.read().await;
        Ok(inner.entry(key)?.activations.clone())
    }
}
