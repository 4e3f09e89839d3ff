//! Durable per-installation identifier.
//!
//! Unlike the machine ID, this survives locale, timezone and display
//! changes because it is generated once and written to disk.

use crate::error::{LicenseError, LicenseResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

const APP_DIR: &str = "pluginshop";
const FILE_NAME: &str = "installation-id";

/// Random identifier created on first run and persisted thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstallationId(Uuid);

impl InstallationId {
    /// Loads the ID stored at `path`, creating and saving a new one if the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns `LicenseError::Storage` if the file cannot be read or written,
    /// or holds something other than a UUID.
    pub fn load_or_create(path: &Path) -> LicenseResult<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path).map_err(|e| {
                LicenseError::Storage(format!("failed to read {}: {e}", path.display()))
            })?;
            let uuid = Uuid::parse_str(contents.trim()).map_err(|e| {
                LicenseError::Storage(format!("corrupt installation id in {}: {e}", path.display()))
            })?;
            return Ok(Self(uuid));
        }

        let id = Self(Uuid::new_v4());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                LicenseError::Storage(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        fs::write(path, id.to_string()).map_err(|e| {
            LicenseError::Storage(format!("failed to write {}: {e}", path.display()))
        })?;
        info!("Created installation id at {}", path.display());
        Ok(id)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for InstallationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Default location: `<local data dir>/pluginshop/installation-id`.
#[must_use]
pub fn default_installation_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join(APP_DIR).join(FILE_NAME))
}
