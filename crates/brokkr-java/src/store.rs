//! Managed runtime store
//!
//! A store root holds one directory per platform, and inside it one
//! directory per installed runtime plus a sibling `<name>.json` manifest:
//!
//! ```text
//! <root>/linux-x86_64/java-runtime-gamma/...
//! <root>/linux-x86_64/java-runtime-gamma.json
//! ```
//!
//! Installation is transactional per runtime: a failed install removes the
//! partial directory before the error propagates. Enumeration is tolerant,
//! skipping broken installations with a warning instead of failing the list.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use brokkr_core::{Error, Platform, Result};

use crate::install::{install_tree, verify_files};
use crate::manifest::JavaManifest;
use crate::probe::JavaProber;
use crate::runtime::{resolve_executable, JavaInfo, JavaRuntime};
use crate::source::{SourceTree, TarGzSource};

/// A managed store of runtime installations under one root directory
pub struct JavaStore {
    root: PathBuf,
    /// Serializes mutations; reads go lock-free
    write_lock: Mutex<()>,
}

impl JavaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn platform_root(&self, platform: Platform) -> PathBuf {
        self.root.join(platform.to_string())
    }

    /// Directory of the installation named `name` for `platform`
    pub fn java_dir(&self, platform: Platform, name: &str) -> PathBuf {
        self.platform_root(platform).join(name)
    }

    /// Manifest path of the installation named `name` for `platform`
    pub fn manifest_path(&self, platform: Platform, name: &str) -> PathBuf {
        self.platform_root(platform).join(format!("{name}.json"))
    }

    /// True when the installation's manifest exists. The manifest alone is
    /// the marker, so an orphaned one can still be uninstalled.
    pub fn is_installed(&self, platform: Platform, name: &str) -> bool {
        self.manifest_path(platform, name).is_file()
    }

    /// Canonical executable of an installed runtime
    pub fn executable(&self, platform: Platform, name: &str) -> Result<PathBuf> {
        resolve_executable(&self.java_dir(platform, name), platform.os)
    }

    /// Enumerate the valid installations for `platform`, skipping and
    /// logging any with a missing directory, unreadable manifest, or
    /// unresolvable executable
    pub fn list(&self, platform: Platform) -> Vec<JavaRuntime> {
        let platform_root = self.platform_root(platform);
        let entries = match fs::read_dir(&platform_root) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut runtimes = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(name) = manifest_name(&path) else {
                continue;
            };
            match self.open(platform, name) {
                Ok(runtime) => runtimes.push(runtime),
                Err(e) if e.is_benign() => {
                    debug!(name, error = %e, "skipping incomplete runtime installation")
                }
                Err(e) => {
                    warn!(name, error = %e, "skipping broken runtime installation")
                }
            }
        }
        runtimes
    }

    /// Load one installation as a runtime record
    pub fn open(&self, platform: Platform, name: &str) -> Result<JavaRuntime> {
        let dir = self.java_dir(platform, name);
        if !dir.is_dir() {
            return Err(Error::not_found(dir));
        }
        let manifest = JavaManifest::load(&self.manifest_path(platform, name))?;
        let executable = self.executable(platform, name)?;
        Ok(JavaRuntime::of(executable, manifest.info(), true))
    }

    /// Check an installation's files against its manifest
    pub fn verify(&self, platform: Platform, name: &str) -> Result<()> {
        let manifest = JavaManifest::load(&self.manifest_path(platform, name))?;
        verify_files(&self.java_dir(platform, name), &manifest.files)
    }

    /// Install a vendor `.tar.gz` archive as `name`. The identity is either
    /// declared by a trusted caller or probed from the extracted tree.
    /// Replaces any existing installation of the same name.
    pub fn install_archive(
        &self,
        platform: Platform,
        name: &str,
        archive: &Path,
        identity: Option<JavaInfo>,
        update: Map<String, Value>,
        prober: &JavaProber,
    ) -> Result<JavaRuntime> {
        let mut source = TarGzSource::new(archive);
        self.install(platform, name, &mut source, identity, update, prober)
    }

    /// Install from any source tree as `name`. Without a declared identity
    /// the extracted runtime is probed; either way the identity must match
    /// `platform`, otherwise the installation is rolled back.
    pub fn install(
        &self,
        platform: Platform,
        name: &str,
        source: &mut dyn SourceTree,
        identity: Option<JavaInfo>,
        update: Map<String, Value>,
        prober: &JavaProber,
    ) -> Result<JavaRuntime> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let dir = self.java_dir(platform, name);
        if dir.exists() {
            remove_tree(&dir);
        }

        let result = self.install_locked(platform, name, source, identity, update, prober);
        if result.is_err() {
            remove_tree(&dir);
        }
        result
    }

    fn install_locked(
        &self,
        platform: Platform,
        name: &str,
        source: &mut dyn SourceTree,
        identity: Option<JavaInfo>,
        update: Map<String, Value>,
        prober: &JavaProber,
    ) -> Result<JavaRuntime> {
        let dir = self.java_dir(platform, name);
        let files = install_tree(source, &dir)?;

        let executable = resolve_executable(&dir, platform.os)?;
        let identity = match identity {
            Some(identity) => identity,
            None => prober.identify(&executable, true)?,
        };
        if identity.platform != platform {
            return Err(Error::incompatible(identity.platform));
        }

        let manifest = JavaManifest::new(identity, update, files);
        manifest.save(&self.manifest_path(platform, name))?;

        info!(name, %platform, version = manifest.version, "installed runtime");
        Ok(JavaRuntime::of(executable, manifest.info(), true))
    }

    /// Remove an installation. Best-effort: partial leftovers are logged,
    /// never fatal, and a later install of the same name cleans them up.
    pub fn uninstall(&self, platform: Platform, name: &str) {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        remove_tree(&self.java_dir(platform, name));
        let manifest = self.manifest_path(platform, name);
        if manifest.exists() {
            if let Err(e) = fs::remove_file(&manifest) {
                warn!(path = %manifest.display(), error = %e, "failed to remove manifest");
            }
        }
        info!(name, %platform, "uninstalled runtime");
    }

    /// Uninstall the installation owning `runtime`, located by walking the
    /// executable path back up to this store's root. Returns `false` when
    /// the runtime does not live in this store.
    pub fn uninstall_runtime(&self, runtime: &JavaRuntime) -> bool {
        // the binary path is canonical, so the root must be resolved too or
        // a store reached through a symlink never matches
        let root = self.root.canonicalize().unwrap_or_else(|_| self.root.clone());
        let Ok(relative) = runtime.binary().strip_prefix(&root) else {
            return false;
        };
        let mut components = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned());
        let (Some(platform_dir), Some(name)) = (components.next(), components.next()) else {
            return false;
        };
        let Some(platform) = parse_platform_dir(&platform_dir) else {
            return false;
        };
        self.uninstall(platform, &name);
        true
    }
}

/// `foo.json` next to a directory `foo` names an installation
fn manifest_name(path: &Path) -> Option<&str> {
    if !path.is_file() {
        return None;
    }
    let file_name = path.file_name()?.to_str()?;
    file_name.strip_suffix(".json")
}

fn parse_platform_dir(name: &str) -> Option<Platform> {
    name.parse::<Platform>().ok()
}

fn remove_tree(dir: &Path) {
    if !dir.exists() {
        return;
    }
    if let Err(e) = fs::remove_dir_all(dir) {
        warn!(path = %dir.display(), error = %e, "failed to remove runtime directory");
    }
}
