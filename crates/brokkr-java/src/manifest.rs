//! Per-installation manifest codec
//!
//! Every managed runtime `<platform>/<name>` has a sibling `<name>.json`
//! recording the runtime's identity, optional provenance from the source it
//! was downloaded from, and the expected file tree for later verification.
//! File paths preserve their installation order when re-encoded.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use brokkr_core::{Architecture, Error, OperatingSystem, Platform, Result};

use crate::runtime::JavaInfo;

/// One entry of a manifest's file table, keyed by slash-separated
/// relative path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FileEntry {
    /// Regular file with its SHA-1 digest (lowercase hex) and size in bytes
    File { sha1: String, size: u64 },
    Directory,
    /// Symbolic link with its literal, unresolved target
    Link { target: String },
}

/// The manifest of one managed runtime installation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JavaManifest {
    pub os: OperatingSystem,
    pub arch: Architecture,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    /// Provenance of the installation, round-tripped verbatim. Typically the
    /// download descriptor the runtime was installed from.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub update: Map<String, Value>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub files: IndexMap<String, FileEntry>,
}

impl JavaManifest {
    pub fn new(
        info: JavaInfo,
        update: Map<String, Value>,
        files: IndexMap<String, FileEntry>,
    ) -> Self {
        Self {
            os: info.platform.os,
            arch: info.platform.arch,
            version: info.version,
            vendor: info.vendor,
            update,
            files,
        }
    }

    pub fn platform(&self) -> Platform {
        Platform::new(self.os, self.arch)
    }

    pub fn info(&self) -> JavaInfo {
        JavaInfo::new(self.platform(), self.version.clone(), self.vendor.clone())
    }

    /// Decode a manifest from JSON. Unknown file-entry types are a hard
    /// error; absent `update` and `files` decode to empty maps.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::decode(e.to_string()))
    }

    pub fn encode(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::decode(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|_| Error::not_found(path))?;
        Self::decode(&bytes)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.encode()?)?;
        Ok(())
    }
}
