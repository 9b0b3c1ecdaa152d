//! Persisted probe-result cache
//!
//! Subprocess probes are expensive, so scan results are cached on disk keyed
//! by a freshness token derived from the executable's size and mtime plus the
//! digest of the surrounding JDK's `release` file. A stale or unreadable
//! cache is discarded wholesale; the format is versioned for that reason.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use brokkr_core::{Architecture, OperatingSystem, Platform};

use crate::install::sha1_file;
use crate::runtime::JavaInfo;

const CACHE_FORMAT: u32 = 0;

#[derive(Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    entries: Vec<CacheRecord>,
}

#[derive(Serialize, Deserialize)]
struct CacheRecord {
    path: PathBuf,
    key: String,
    os: OperatingSystem,
    arch: Architecture,
    #[serde(rename = "java.version")]
    version: String,
    #[serde(
        rename = "java.vendor",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    vendor: Option<String>,
}

/// In-memory view of the cache file, written back only when modified
pub struct ProbeCache {
    path: PathBuf,
    entries: HashMap<PathBuf, (String, JavaInfo)>,
    dirty: bool,
}

impl ProbeCache {
    /// Load the cache at `path`. A missing, malformed, or incompatible file
    /// yields an empty cache.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<CacheFile>(&bytes) {
                Ok(file) if file.version == CACHE_FORMAT => file
                    .entries
                    .into_iter()
                    .map(|r| {
                        let info =
                            JavaInfo::new(Platform::new(r.os, r.arch), r.version, r.vendor);
                        (r.path, (r.key, info))
                    })
                    .collect(),
                Ok(file) => {
                    debug!(version = file.version, "discarding cache with unknown format");
                    HashMap::new()
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "discarding malformed probe cache");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            entries,
            dirty: false,
        }
    }

    /// Cached identity for `executable`, if its freshness key still matches
    pub fn lookup(&self, executable: &Path, key: &str) -> Option<&JavaInfo> {
        let (cached_key, info) = self.entries.get(executable)?;
        (cached_key == key).then_some(info)
    }

    pub fn insert(&mut self, executable: PathBuf, key: String, info: JavaInfo) {
        self.entries.insert(executable, (key, info));
        self.dirty = true;
    }

    pub fn remove(&mut self, executable: &Path) {
        if self.entries.remove(executable).is_some() {
            self.dirty = true;
        }
    }

    /// Drop every entry, e.g. before a forced re-probe of all runtimes
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.dirty = true;
        }
    }

    /// Write the cache back if any entry changed since loading
    pub fn save(&mut self) {
        if !self.dirty {
            return;
        }
        let file = CacheFile {
            version: CACHE_FORMAT,
            entries: self
                .entries
                .iter()
                .map(|(path, (key, info))| CacheRecord {
                    path: path.clone(),
                    key: key.clone(),
                    os: info.platform.os,
                    arch: info.platform.arch,
                    version: info.version.clone(),
                    vendor: info.vendor.clone(),
                })
                .collect(),
        };
        let result = serde_json::to_vec_pretty(&file)
            .map_err(std::io::Error::other)
            .and_then(|bytes| {
                if let Some(parent) = self.path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&self.path, bytes)
            });
        match result {
            Ok(()) => self.dirty = false,
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to write probe cache"),
        }
    }
}

/// Freshness key of an executable: size, mtime, and the digest of the
/// adjacent `release` file when the executable sits in a JDK image. Legacy
/// images without a `release` file fall back to the size and mtime of
/// `lib/rt.jar`. `None` when the executable cannot be inspected; such paths
/// are never cached.
pub fn cache_key(executable: &Path) -> Option<String> {
    let mut key = size_mtime(executable)?;

    if let Some(bin) = executable.parent() {
        if bin.file_name().is_some_and(|n| n == "bin") {
            if let Some(home) = bin.parent() {
                let release = home.join("release");
                if release.is_file() {
                    key.push(';');
                    key.push_str(&sha1_file(&release).ok()?);
                } else if let Some(token) = size_mtime(&home.join("lib/rt.jar")) {
                    key.push(';');
                    key.push_str(&token);
                }
            }
        }
    }
    Some(key)
}

fn size_mtime(path: &Path) -> Option<String> {
    let metadata = fs::metadata(path).ok()?;
    let mtime = metadata
        .modified()
        .ok()?
        .duration_since(UNIX_EPOCH)
        .ok()?
        .as_millis();
    Some(format!("{};{}", metadata.len(), mtime))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn info() -> JavaInfo {
        JavaInfo::new(
            Platform::new(OperatingSystem::Linux, Architecture::X86_64),
            "21.0.1",
            Some("Temurin".into()),
        )
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("java.cache.json");

        let mut cache = ProbeCache::load(&file);
        cache.insert(PathBuf::from("/opt/jdk/bin/java"), "42;1000".into(), info());
        cache.save();

        let cache = ProbeCache::load(&file);
        let hit = cache
            .lookup(Path::new("/opt/jdk/bin/java"), "42;1000")
            .unwrap();
        assert_eq!(hit.version, "21.0.1");
        assert_eq!(hit.vendor.as_deref(), Some("Temurin"));
    }

    #[test]
    fn test_stale_key_misses() {
        let dir = TempDir::new().unwrap();
        let mut cache = ProbeCache::load(dir.path().join("c.json"));
        cache.insert(PathBuf::from("/opt/jdk/bin/java"), "42;1000".into(), info());
        assert!(cache
            .lookup(Path::new("/opt/jdk/bin/java"), "42;2000")
            .is_none());
    }

    #[test]
    fn test_malformed_file_discarded() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("c.json");
        fs::write(&file, b"not json").unwrap();
        let cache = ProbeCache::load(&file);
        assert!(cache.lookup(Path::new("/x"), "k").is_none());
    }

    #[test]
    fn test_key_changes_when_executable_changes() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("jdk");
        fs::create_dir_all(root.join("bin")).unwrap();
        let exe = root.join("bin/java");
        fs::write(&exe, b"one").unwrap();
        fs::write(root.join("release"), b"JAVA_VERSION=\"21\"\n").unwrap();

        let before = cache_key(&exe).unwrap();
        fs::write(&exe, b"longer contents").unwrap();
        let after = cache_key(&exe).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_key_covers_legacy_rt_jar() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("jre");
        fs::create_dir_all(root.join("bin")).unwrap();
        fs::create_dir_all(root.join("lib")).unwrap();
        let exe = root.join("bin/java");
        fs::write(&exe, b"binary").unwrap();

        let bare = cache_key(&exe).unwrap();
        fs::write(root.join("lib/rt.jar"), b"classes").unwrap();
        let with_rt = cache_key(&exe).unwrap();
        assert_ne!(bare, with_rt);
    }
}
