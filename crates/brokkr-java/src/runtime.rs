//! Java runtime records
//!
//! A [`JavaRuntime`] is a discovered or installed JVM, keyed by the canonical
//! path of its `java` executable. [`JavaInfo`] is the platform/version/vendor
//! identity produced by probing and recorded in store manifests.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use brokkr_core::{Error, OperatingSystem, Platform, Result, VersionNumber};

/// Relative path of the JRE home inside a macOS runtime bundle
pub const MACOS_BUNDLE_HOME: &str = "jre.bundle/Contents/Home";

/// The identity of a JVM: which platform it runs on, its version string,
/// and optionally who built it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaInfo {
    pub platform: Platform,
    pub version: String,
    pub vendor: Option<String>,
}

impl JavaInfo {
    pub fn new(platform: Platform, version: impl Into<String>, vendor: Option<String>) -> Self {
        Self {
            platform,
            version: version.into(),
            vendor,
        }
    }
}

/// A usable JVM installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaRuntime {
    binary: PathBuf,
    platform: Platform,
    version: String,
    major: Option<u32>,
    vendor: Option<String>,
    managed: bool,
}

impl JavaRuntime {
    /// Build a runtime record from a probed identity. `binary` should already
    /// be canonicalized; it is the runtime's key everywhere.
    pub fn of(binary: PathBuf, info: JavaInfo, managed: bool) -> Self {
        let major = VersionNumber::new(&info.version).major_version();
        Self {
            binary,
            platform: info.platform,
            version: info.version,
            major,
            vendor: info.vendor,
            managed,
        }
    }

    /// Canonical path of the `java` executable
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Full version string as reported by the runtime, e.g. `1.8.0_51`
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn version_number(&self) -> VersionNumber {
        VersionNumber::new(&self.version)
    }

    /// The Java major release (8, 17, 21, ...), `None` when the version
    /// string could not be parsed
    pub fn major_version(&self) -> Option<u32> {
        self.major
    }

    pub fn vendor(&self) -> Option<&str> {
        self.vendor.as_deref()
    }

    /// True for runtimes installed into a managed store
    pub fn is_managed(&self) -> bool {
        self.managed
    }

    pub fn info(&self) -> JavaInfo {
        JavaInfo::new(self.platform, self.version.clone(), self.vendor.clone())
    }
}

impl Ord for JavaRuntime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.version_number()
            .cmp(&other.version_number())
            .then_with(|| self.binary.cmp(&other.binary))
    }
}

impl PartialOrd for JavaRuntime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The conventional executable path under a runtime home: `<home>/bin/java`
/// (`java.exe` on Windows)
pub fn executable_in_home(home: &Path, os: OperatingSystem) -> PathBuf {
    home.join("bin").join(os.java_executable())
}

/// Resolve and canonicalize the executable of a runtime home. On macOS,
/// falls back to the `jre.bundle` layout used by some vendor archives.
pub fn resolve_executable(home: &Path, os: OperatingSystem) -> Result<PathBuf> {
    let conventional = executable_in_home(home, os);
    if let Ok(path) = conventional.canonicalize() {
        return Ok(path);
    }
    if os == OperatingSystem::MacOS {
        let bundled = home.join(MACOS_BUNDLE_HOME).join("bin").join("java");
        if let Ok(path) = bundled.canonicalize() {
            return Ok(path);
        }
    }
    Err(Error::not_found(conventional))
}
