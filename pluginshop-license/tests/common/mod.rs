//! Shared test helpers for license tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use pluginshop_license::{ActivationLimit, DeviceInfo, LicenseKey, LicenseType, MachineDescriptor};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// 2023-11-14T22:13:20Z, which is `LOYW3V28` in base 36 milliseconds.
pub const FIXED_MILLIS: i64 = 1_700_000_000_000;

/// Returns the fixed instant used across tests.
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(FIXED_MILLIS).unwrap()
}

/// Returns a deterministic RNG.
pub fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(0x5eed)
}

/// Builds a license record directly, bypassing issuance.
pub fn license(
    license_type: LicenseType,
    current_activations: u32,
    expires_at: Option<DateTime<Utc>>,
) -> LicenseKey {
    LicenseKey {
        key: "0001-LOYW-3V28-AB12".to_string(),
        product_id: 1,
        user_id: "user-1".to_string(),
        email: "buyer@example.com".to_string(),
        created_at: fixed_now() - Duration::days(30),
        expires_at,
        max_activations: license_type.max_activations(),
        current_activations,
        license_type,
    }
}

/// A license with an explicit activation limit and no expiry.
pub fn license_with_limit(limit: ActivationLimit, current_activations: u32) -> LicenseKey {
    let mut lic = license(LicenseType::Team, current_activations, None);
    lic.max_activations = limit;
    lic
}

/// A fixed device so fingerprints do not depend on the test host.
pub fn test_device() -> DeviceInfo {
    DeviceInfo {
        os_name: "linux".to_string(),
        os_version: "24.04".to_string(),
        hostname: "workstation-7".to_string(),
        arch: "x86_64".to_string(),
    }
}

/// Descriptor built from `vars` (name, value) pairs over `test_device()`.
pub fn descriptor_from(vars: &[(&str, &str)]) -> MachineDescriptor {
    MachineDescriptor::from_lookup(&test_device(), |name| {
        vars.iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| (*v).to_string())
    })
}
