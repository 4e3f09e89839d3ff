//! License key generation and format validation.
//!
//! Keys look like `XXXX-XXXX-XXXX-XXXX`: four groups of four uppercase
//! alphanumeric characters. A key is assembled from, in order:
//! - the product ID in base 36, zero-padded to four characters
//! - the issue time (milliseconds since epoch) in base 36
//! - six random base-36 characters
//! - the first four characters of the user ID
//!
//! The concatenation is regrouped into blocks of four and cut to 19
//! characters. Generation does not guarantee uniqueness; whoever stores
//! keys has to reject duplicates.

use crate::error::{LicenseError, LicenseResult};
use chrono::{DateTime, Utc};
use rand::Rng;

/// Total length of a formatted key, separators included.
pub const LICENSE_KEY_LEN: usize = 19;

/// Characters per group.
pub const KEY_GROUP_LEN: usize = 4;

/// Number of groups in a key.
pub const KEY_GROUPS: usize = 4;

const KEY_SEPARATOR: char = '-';
const PRODUCT_CODE_LEN: usize = 4;
const RANDOM_LEN: usize = 6;
const USER_CODE_LEN: usize = 4;
const BASE36_DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generates a license key for `product_id` and `user_id` using the system
/// clock and the thread-local RNG.
///
/// # Errors
///
/// Returns an error if `product_id` is 0 or `user_id` is blank.
pub fn generate_license_key(product_id: u32, user_id: &str) -> LicenseResult<String> {
    generate_license_key_with(product_id, user_id, Utc::now(), &mut rand::thread_rng())
}

/// Generates a license key with an explicit clock reading and random source.
///
/// Identical inputs and RNG state produce identical keys.
///
/// # Errors
///
/// Returns an error if `product_id` is 0 or `user_id` is blank.
pub fn generate_license_key_with<R: Rng + ?Sized>(
    product_id: u32,
    user_id: &str,
    now: DateTime<Utc>,
    rng: &mut R,
) -> LicenseResult<String> {
    if product_id == 0 {
        return Err(LicenseError::InvalidProductId(product_id));
    }
    if user_id.trim().is_empty() {
        return Err(LicenseError::InvalidUserId(user_id.to_string()));
    }

    let product_code = format!(
        "{:0>width$}",
        to_base36(u64::from(product_id)),
        width = PRODUCT_CODE_LEN
    );
    let timestamp = to_base36(u64::try_from(now.timestamp_millis()).unwrap_or(0));
    let random: String = (0..RANDOM_LEN)
        .map(|_| char::from(BASE36_DIGITS[rng.gen_range(0..BASE36_DIGITS.len())]))
        .collect();
    // Only ASCII alphanumerics survive so the format invariant holds for any user ID.
    let user_code: String = user_id
        .chars()
        .take(USER_CODE_LEN)
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let mut raw = format!("{product_code}{timestamp}{random}{user_code}");
    let min_len = KEY_GROUP_LEN * KEY_GROUPS;
    if raw.len() < min_len {
        raw.extend(std::iter::repeat_n('0', min_len - raw.len()));
    }

    Ok(group_key(&raw))
}

/// Returns true if `key` is exactly `XXXX-XXXX-XXXX-XXXX` with uppercase
/// ASCII letters and digits.
///
/// This is purely syntactic: it says nothing about whether the key was
/// ever issued. Lowercase letters and surrounding whitespace are rejected.
#[must_use]
pub fn validate_license_key_format(key: &str) -> bool {
    let bytes = key.as_bytes();
    bytes.len() == LICENSE_KEY_LEN
        && bytes.iter().enumerate().all(|(i, b)| {
            if i % (KEY_GROUP_LEN + 1) == KEY_GROUP_LEN {
                *b == KEY_SEPARATOR as u8
            } else {
                b.is_ascii_uppercase() || b.is_ascii_digit()
            }
        })
}

/// Splits `raw` into dash-separated groups and cuts it to key length.
fn group_key(raw: &str) -> String {
    let mut key = String::with_capacity(LICENSE_KEY_LEN);
    for (i, c) in raw.chars().enumerate() {
        if i > 0 && i % KEY_GROUP_LEN == 0 {
            key.push(KEY_SEPARATOR);
        }
        key.push(c);
        if key.len() >= LICENSE_KEY_LEN {
            break;
        }
    }
    key
}

/// Renders `value` in uppercase base 36.
fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}
