//! Operating system and architecture model
//!
//! Defines the (os, arch) platform pair attached to every runtime record and
//! the host-compatibility table used by both the discovery scanner and the
//! selection engine. The table is data, not branching: each row says "this
//! host may run binaries of that architecture", optionally gated on a minimum
//! Windows build number (WOW64 x64-on-arm64 emulation shipped in build 21277).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operating system of a runtime or of the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingSystem {
    Windows,
    Linux,
    #[serde(rename = "macos", alias = "osx")]
    MacOS,
}

impl OperatingSystem {
    /// Detect the operating system this process runs on
    pub fn current() -> Option<Self> {
        match std::env::consts::OS {
            "windows" => Some(Self::Windows),
            "linux" => Some(Self::Linux),
            "macos" => Some(Self::MacOS),
            _ => None,
        }
    }

    /// Parse an OS name as reported by a JVM's `os.name` property or a
    /// `release` metadata file
    pub fn parse_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        if lower.contains("windows") {
            Some(Self::Windows)
        } else if lower.contains("mac") || lower.contains("darwin") || lower.contains("osx") {
            Some(Self::MacOS)
        } else if lower.contains("linux") {
            Some(Self::Linux)
        } else {
            None
        }
    }

    /// Stable name used in manifests and store directory names
    pub fn checked_name(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::MacOS => "macos",
        }
    }

    /// Conventional name of the java executable on this OS
    pub fn java_executable(&self) -> &'static str {
        match self {
            Self::Windows => "java.exe",
            Self::Linux | Self::MacOS => "java",
        }
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.checked_name())
    }
}

/// CPU architecture of a runtime or of the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Architecture {
    #[serde(rename = "x86")]
    X86,
    #[serde(rename = "x86_64", alias = "amd64")]
    X86_64,
    #[serde(rename = "arm32")]
    Arm32,
    #[serde(rename = "arm64", alias = "aarch64")]
    Arm64,
    #[serde(rename = "riscv64")]
    Riscv64,
}

impl Architecture {
    /// Detect the architecture this process runs as
    pub fn current() -> Option<Self> {
        match std::env::consts::ARCH {
            "x86" => Some(Self::X86),
            "x86_64" => Some(Self::X86_64),
            "arm" => Some(Self::Arm32),
            "aarch64" => Some(Self::Arm64),
            "riscv64" => Some(Self::Riscv64),
            _ => None,
        }
    }

    /// Normalize an architecture name as reported by `os.arch` or a
    /// `release` metadata file
    pub fn parse_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace(['-', '.', '_'], "").as_str() {
            "x8664" | "amd64" | "x64" | "ia32e" | "em64t" => Some(Self::X86_64),
            "x86" | "x8632" | "i386" | "i486" | "i586" | "i686" | "ia32" | "x32" => Some(Self::X86),
            "arm64" | "aarch64" => Some(Self::Arm64),
            "arm" | "arm32" | "aarch32" => Some(Self::Arm32),
            "riscv64" => Some(Self::Riscv64),
            _ => None,
        }
    }

    /// Stable name used in manifests and store directory names
    pub fn checked_name(&self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::X86_64 => "x86_64",
            Self::Arm32 => "arm32",
            Self::Arm64 => "arm64",
            Self::Riscv64 => "riscv64",
        }
    }

    /// True for both 32-bit and 64-bit x86
    pub fn is_x86(&self) -> bool {
        matches!(self, Self::X86 | Self::X86_64)
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.checked_name())
    }
}

/// An (operating system, architecture) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    pub os: OperatingSystem,
    pub arch: Architecture,
}

impl Platform {
    pub const WINDOWS_X86: Platform = Platform::new(OperatingSystem::Windows, Architecture::X86);
    pub const WINDOWS_X86_64: Platform =
        Platform::new(OperatingSystem::Windows, Architecture::X86_64);
    pub const MACOS_X86_64: Platform = Platform::new(OperatingSystem::MacOS, Architecture::X86_64);

    pub const fn new(os: OperatingSystem, arch: Architecture) -> Self {
        Self { os, arch }
    }
}

impl fmt::Display for Platform {
    /// Store directory name, e.g. `windows-x86_64`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os.checked_name(), self.arch.checked_name())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    /// Parse an `os-arch` pair such as `linux-x86_64` or the legacy
    /// `osx-arm64`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (os, arch) = s
            .split_once('-')
            .ok_or_else(|| format!("invalid platform {s:?}, expected os-arch"))?;
        let os =
            OperatingSystem::parse_name(os).ok_or_else(|| format!("unknown os {os:?}"))?;
        let arch =
            Architecture::parse_name(arch).ok_or_else(|| format!("unknown arch {arch:?}"))?;
        Ok(Platform::new(os, arch))
    }
}

/// One row of the emulation table: a host of `(os, host_arch)` may run
/// binaries built for `guest_arch`
struct EmulationRule {
    os: OperatingSystem,
    host_arch: Architecture,
    guest_arch: Architecture,
    /// Minimum Windows build number required, if any
    min_windows_build: Option<u32>,
}

/// Fixed emulation-compatibility table. Order matters: the discovery scanner
/// enumerates secondary managed stores in this order.
const EMULATION_TABLE: &[EmulationRule] = &[
    EmulationRule {
        os: OperatingSystem::Windows,
        host_arch: Architecture::X86_64,
        guest_arch: Architecture::X86,
        min_windows_build: None,
    },
    EmulationRule {
        os: OperatingSystem::Windows,
        host_arch: Architecture::Arm64,
        guest_arch: Architecture::X86_64,
        min_windows_build: Some(21277),
    },
    EmulationRule {
        os: OperatingSystem::Windows,
        host_arch: Architecture::Arm64,
        guest_arch: Architecture::X86,
        min_windows_build: None,
    },
    EmulationRule {
        os: OperatingSystem::Linux,
        host_arch: Architecture::X86_64,
        guest_arch: Architecture::X86,
        min_windows_build: None,
    },
    EmulationRule {
        os: OperatingSystem::MacOS,
        host_arch: Architecture::Arm64,
        guest_arch: Architecture::X86_64,
        min_windows_build: None,
    },
];

/// Everything about the machine the launcher is running on that discovery and
/// selection need to consult
#[derive(Debug, Clone)]
pub struct HostInfo {
    /// The machine's natural platform
    platform: Platform,
    /// Architecture this process runs as; differs from the natural
    /// architecture when the launcher itself runs under emulation
    process_arch: Architecture,
    /// Windows build number, when known
    windows_build: Option<u32>,
}

impl HostInfo {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            process_arch: platform.arch,
            windows_build: None,
        }
    }

    /// Detect the host. Returns `None` on operating systems or architectures
    /// the launcher does not run on.
    pub fn detect() -> Option<Self> {
        let os = OperatingSystem::current()?;
        let arch = Architecture::current()?;
        Some(Self::new(Platform::new(os, arch)))
    }

    pub fn with_process_arch(mut self, arch: Architecture) -> Self {
        self.process_arch = arch;
        self
    }

    pub fn with_windows_build(mut self, build: u32) -> Self {
        self.windows_build = Some(build);
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn os(&self) -> OperatingSystem {
        self.platform.os
    }

    pub fn arch(&self) -> Architecture {
        self.platform.arch
    }

    pub fn process_arch(&self) -> Architecture {
        self.process_arch
    }

    pub fn windows_build(&self) -> Option<u32> {
        self.windows_build
    }

    fn rule_allows(&self, rule: &EmulationRule) -> bool {
        rule.os == self.platform.os
            && rule.host_arch == self.platform.arch
            && match rule.min_windows_build {
                Some(min) => self.windows_build.is_some_and(|b| b >= min),
                None => true,
            }
    }

    /// Can a runtime built for `candidate` run on this host?
    ///
    /// The OS must match exactly; the architecture must equal the host's
    /// natural or current architecture, or appear in the emulation table.
    pub fn is_compatible(&self, candidate: Platform) -> bool {
        if candidate.os != self.platform.os {
            return false;
        }
        if candidate.arch == self.platform.arch || candidate.arch == self.process_arch {
            return true;
        }
        EMULATION_TABLE
            .iter()
            .any(|rule| self.rule_allows(rule) && rule.guest_arch == candidate.arch)
    }

    /// Platforms whose managed stores should be enumerated on this host:
    /// the natural platform first, then every emulated platform in table
    /// order
    pub fn store_platforms(&self) -> Vec<Platform> {
        let mut platforms = vec![self.platform];
        for rule in EMULATION_TABLE {
            if self.rule_allows(rule) {
                platforms.push(Platform::new(self.platform.os, rule.guest_arch));
            }
        }
        platforms
    }
}
