//! Licensing and activation for Plugin Shop add-ons.
//!
//! This crate handles:
//! - License key generation and `XXXX-XXXX-XXXX-XXXX` format validation
//! - Expiry and activation-limit evaluation per license type
//! - Device activation records
//! - Machine fingerprinting and durable installation IDs
//! - Obfuscated license payloads
//!
//! Everything here is synchronous and storage-free. Services that persist
//! licenses are responsible for key uniqueness and for updating
//! `current_activations` atomically.
//!
//! # Environment
//!
//! Functions that read the clock, the RNG or the host environment come in
//! two forms: a convenience form using the real environment, and an explicit
//! form (`*_with`, `*_at`, `*_for`) taking those inputs as arguments.

mod activation;
mod clock;
mod codec;
mod device;
mod error;
mod installation;
mod key;
mod license;
mod policy;

pub use activation::{Activation, ActivationId, create_activation, create_activation_at};
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{decrypt_license_data, encrypt_license_data};
pub use device::{
    DeviceInfo, MACHINE_ID_LEN, MachineDescriptor, SCREEN_ENV_VAR, generate_machine_id,
    machine_id_for,
};
pub use error::{LicenseError, LicenseResult};
pub use installation::{InstallationId, default_installation_path};
pub use key::{
    KEY_GROUP_LEN, KEY_GROUPS, LICENSE_KEY_LEN, generate_license_key, generate_license_key_with,
    validate_license_key_format,
};
pub use license::{
    LicenseKey, LicenseStatus, NewLicense, OperationalStatus, check_license, is_license_valid,
    is_license_valid_at, resolve_status,
};
pub use policy::{ActivationLimit, LicensePolicy, LicenseType, UNLIMITED_SENTINEL};
