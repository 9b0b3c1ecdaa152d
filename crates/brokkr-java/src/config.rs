//! User runtime configuration
//!
//! Two persisted lists drive discovery: executables the user added by hand,
//! and discovered executables the user explicitly disabled. Paths are stored
//! as written; canonicalization happens at scan time.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use brokkr_core::{Error, Result};

/// Persisted user choices about java executables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Executables added by the user, scanned in addition to the system
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_java: Vec<PathBuf>,
    /// Executables the user removed from the runtime list
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub disabled_java: BTreeSet<PathBuf>,
}

impl UserConfig {
    /// Load the config at `path`; a missing file is an empty config, a
    /// malformed one is an error so user data is not silently overwritten
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes).map_err(|e| Error::decode(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec_pretty(self).map_err(|e| Error::decode(e.to_string()))?;
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Mark an executable as user-added, clearing any disable mark.
    /// Returns false when it was already present.
    pub fn add(&mut self, executable: PathBuf) -> bool {
        self.disabled_java.remove(&executable);
        if self.user_java.contains(&executable) {
            return false;
        }
        self.user_java.push(executable);
        true
    }

    /// Remove an executable from the runtime list. User-added entries are
    /// dropped; discovered ones are marked disabled so the next scan skips
    /// them.
    pub fn remove(&mut self, executable: &Path) {
        if let Some(pos) = self.user_java.iter().position(|p| p == executable) {
            self.user_java.remove(pos);
        } else {
            self.disabled_java.insert(executable.to_path_buf());
        }
    }

    pub fn is_disabled(&self, executable: &Path) -> bool {
        self.disabled_java.contains(executable)
    }
}

/// Default location of the runtime config: `~/.brokkr/java-settings.json`
pub fn default_config_path() -> Option<PathBuf> {
    Some(dirs::home_dir()?.join(".brokkr").join("java-settings.json"))
}
