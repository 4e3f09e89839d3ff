//! License payload obfuscation.
//!
//! `encrypt_license_data` is JSON followed by standard base64 and nothing
//! more. It hides payloads from casual inspection but offers no
//! confidentiality or integrity.

use crate::error::LicenseResult;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Serializes `data` to JSON and base64-encodes it.
///
/// # Errors
///
/// Returns an error if `data` cannot be represented as JSON.
pub fn encrypt_license_data<T: Serialize + ?Sized>(data: &T) -> LicenseResult<String> {
    let json = serde_json::to_vec(data)?;
    Ok(BASE64.encode(json))
}

/// Reverses [`encrypt_license_data`].
///
/// Input may come from anywhere, so every failure (bad base64, bad UTF-8,
/// bad JSON, wrong shape) yields `None`.
#[must_use]
pub fn decrypt_license_data<T: DeserializeOwned>(encrypted: &str) -> Option<T> {
    let bytes = match BASE64.decode(encrypted.trim()) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("License data is not base64: {e}");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(data) => Some(data),
        Err(e) => {
            debug!("License data is not valid JSON: {e}");
            None
        }
    }
}
