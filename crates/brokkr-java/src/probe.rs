//! Runtime identity probing
//!
//! Given a `java` executable, determine its platform, version, and vendor.
//! The fast path parses the `release` metadata file JDKs ship next to `bin`;
//! when that is missing or incomplete, a short-lived subprocess runs a probe
//! class that dumps the relevant system properties as JSON.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;
use tracing::debug;

use brokkr_core::{Architecture, Error, HostInfo, OperatingSystem, Platform, Result};

use crate::runtime::JavaInfo;

/// What to put on the probe subprocess's classpath and which class to run
#[derive(Debug, Clone)]
pub struct ProbePayload {
    pub classpath: PathBuf,
    pub main_class: String,
}

/// Determines the identity of java executables
#[derive(Debug, Clone)]
pub struct JavaProber {
    payload: ProbePayload,
    host: HostInfo,
}

impl JavaProber {
    pub fn new(payload: ProbePayload, host: HostInfo) -> Self {
        Self { payload, host }
    }

    pub fn host(&self) -> &HostInfo {
        &self.host
    }

    /// Identify the runtime owning `executable`. With `try_fast`, the
    /// `release` metadata file is consulted first and a subprocess is only
    /// spawned when it does not yield a complete identity.
    pub fn identify(&self, executable: &Path, try_fast: bool) -> Result<JavaInfo> {
        if try_fast {
            if let Some(info) = self.from_release_file(executable) {
                return Ok(info);
            }
        }
        self.spawn_probe(executable)
    }

    /// Fast path: `<home>/release` when `executable` lives in `<home>/bin`
    fn from_release_file(&self, executable: &Path) -> Option<JavaInfo> {
        let bin = executable.parent()?;
        if bin.file_name()? != "bin" {
            return None;
        }
        let release = bin.parent()?.join("release");
        let content = std::fs::read_to_string(&release).ok()?;
        let properties = parse_release_file(&content);

        let version = properties.get("JAVA_VERSION")?.clone();
        let os = match properties.get("OS_NAME") {
            Some(name) => OperatingSystem::parse_name(name)?,
            None => self.host.os(),
        };
        let arch = properties
            .get("OS_ARCH")
            .and_then(|name| Architecture::parse_name(name))
            .unwrap_or(self.host.arch());
        let vendor = properties.get("IMPLEMENTOR").cloned();

        debug!(path = %release.display(), version, "identified runtime from release file");
        Some(JavaInfo::new(Platform::new(os, arch), version, vendor))
    }

    /// Slow path: run the probe class and parse the JSON it prints
    fn spawn_probe(&self, executable: &Path) -> Result<JavaInfo> {
        debug!(path = %executable.display(), "probing runtime via subprocess");
        let output = Command::new(executable)
            .arg("-Dfile.encoding=UTF-8")
            .arg("-classpath")
            .arg(&self.payload.classpath)
            .arg(&self.payload.main_class)
            .output()
            .map_err(|e| Error::probe(executable, e.to_string()))?;

        if !output.status.success() {
            return Err(Error::probe(
                executable,
                format!("probe exited with {}", output.status),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let properties = extract_json(&stdout)
            .ok_or_else(|| Error::probe(executable, "no JSON in probe output"))?;

        let version = string_property(&properties, "java.version")
            .ok_or_else(|| Error::probe(executable, "probe output missing java.version"))?;
        let os = match string_property(&properties, "os.name") {
            Some(name) => OperatingSystem::parse_name(&name)
                .ok_or_else(|| Error::probe(executable, format!("unknown os.name {name:?}")))?,
            None => self.host.os(),
        };
        let arch = string_property(&properties, "os.arch")
            .and_then(|name| Architecture::parse_name(&name))
            .unwrap_or(self.host.arch());
        let vendor = string_property(&properties, "java.vendor");

        Ok(JavaInfo::new(Platform::new(os, arch), version, vendor))
    }
}

/// Parse the `KEY="value"` lines of a JDK `release` file
pub fn parse_release_file(content: &str) -> HashMap<String, String> {
    let mut properties = HashMap::new();
    for line in content.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"');
        properties.insert(key.trim().to_owned(), value.to_owned());
    }
    properties
}

/// The probe may print JVM warnings around its JSON; take the outermost braces
fn extract_json(stdout: &str) -> Option<Value> {
    let start = stdout.find('{')?;
    let end = stdout.rfind('}')?;
    serde_json::from_str(&stdout[start..=end]).ok()
}

fn string_property(properties: &Value, key: &str) -> Option<String> {
    properties.get(key)?.as_str().map(str::to_owned)
}
