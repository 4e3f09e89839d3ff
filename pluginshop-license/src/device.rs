//! Device fingerprinting for license activations.
//!
//! The machine ID is a coarse fingerprint of the user agent, screen
//! resolution, timezone and locale: SHA-256 over their concatenation,
//! base64-encoded and cut to 16 characters. It is stable for an unchanged
//! environment, but the inputs are guessable and 96 bits leave room for
//! collisions, so it is an identifier, not a credential.
//! Anything that needs an identity surviving reinstalls or locale changes
//! should use [`crate::InstallationId`].

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::env;

/// Length of a machine ID.
pub const MACHINE_ID_LEN: usize = 16;

/// Env var holding the screen resolution as `WIDTHxHEIGHT`.
pub const SCREEN_ENV_VAR: &str = "PLUGINSHOP_SCREEN";

const DEFAULT_TIMEZONE: &str = "UTC";
const DEFAULT_LOCALE: &str = "en-US";

/// Information about the current device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Operating system name.
    pub os_name: String,
    /// Operating system version.
    pub os_version: String,
    /// Hostname.
    pub hostname: String,
    /// CPU architecture.
    pub arch: String,
}

impl DeviceInfo {
    /// Collects information about the current device.
    #[must_use]
    pub fn collect() -> Self {
        Self {
            os_name: env::consts::OS.to_string(),
            os_version: get_os_version(),
            hostname: get_hostname(),
            arch: env::consts::ARCH.to_string(),
        }
    }

    /// Platform string stored on activations, e.g. `linux 24.04 (x86_64)`.
    #[must_use]
    pub fn platform(&self) -> String {
        format!("{} {} ({})", self.os_name, self.os_version, self.arch)
    }

    /// User agent the host application reports.
    #[must_use]
    pub fn user_agent(&self) -> String {
        format!(
            "pluginshop/{} ({} {}; {}; {})",
            env!("CARGO_PKG_VERSION"),
            self.os_name,
            self.os_version,
            self.arch,
            self.hostname
        )
    }
}

/// The environment attributes a machine ID is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineDescriptor {
    pub user_agent: String,
    pub screen_width: u32,
    pub screen_height: u32,
    /// IANA timezone name.
    pub timezone: String,
    /// BCP 47 language tag.
    pub locale: String,
}

impl MachineDescriptor {
    /// Collects the descriptor for the current host from process env vars.
    #[must_use]
    pub fn collect() -> Self {
        Self::from_lookup(&DeviceInfo::collect(), |name| env::var(name).ok())
    }

    /// Builds a descriptor from `device` and an env var lookup.
    ///
    /// Reads `PLUGINSHOP_SCREEN`, `TZ`, `LC_ALL` and `LANG`. Missing or
    /// unparsable values fall back to `0x0`, `UTC` and `en-US`.
    #[must_use]
    pub fn from_lookup<F>(device: &DeviceInfo, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let (screen_width, screen_height) = lookup(SCREEN_ENV_VAR)
            .as_deref()
            .and_then(parse_resolution)
            .unwrap_or((0, 0));

        let timezone = lookup("TZ")
            .map(|tz| tz.trim_start_matches(':').to_string())
            .filter(|tz| !tz.is_empty())
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());

        let locale = lookup("LC_ALL")
            .filter(|v| !v.is_empty())
            .or_else(|| lookup("LANG"))
            .as_deref()
            .and_then(normalize_locale)
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string());

        Self {
            user_agent: device.user_agent(),
            screen_width,
            screen_height,
            timezone,
            locale,
        }
    }

    /// The string the fingerprint encodes.
    #[must_use]
    pub fn fingerprint_source(&self) -> String {
        format!(
            "{}-{}x{}-{}-{}",
            self.user_agent, self.screen_width, self.screen_height, self.timezone, self.locale
        )
    }
}

/// Computes the machine ID for the current host.
#[must_use]
pub fn generate_machine_id() -> String {
    machine_id_for(&MachineDescriptor::collect())
}

/// Computes the machine ID for `descriptor`.
#[must_use]
pub fn machine_id_for(descriptor: &MachineDescriptor) -> String {
    let digest = Sha256::digest(descriptor.fingerprint_source().as_bytes());
    let encoded = BASE64.encode(digest);
    encoded.chars().take(MACHINE_ID_LEN).collect()
}

/// Parses `1920x1080`.
fn parse_resolution(value: &str) -> Option<(u32, u32)> {
    let (w, h) = value.trim().split_once(['x', 'X'])?;
    Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
}

/// Turns a POSIX locale (`de_DE.UTF-8@euro`) into a language tag (`de-DE`).
fn normalize_locale(value: &str) -> Option<String> {
    let base = value.split(['.', '@']).next()?.trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    Some(base.replace('_', "-"))
}

/// Gets the machine hostname.
fn get_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Gets the OS version string.
fn get_os_version() -> String {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("sw_vers")
            .arg("-productVersion")
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/etc/os-release")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find_map(|l| l.strip_prefix("VERSION_ID="))
                    .map(|v| v.trim_matches('"').to_string())
            })
            .unwrap_or_else(|| "unknown".to_string())
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        "unknown".to_string()
    }
}
