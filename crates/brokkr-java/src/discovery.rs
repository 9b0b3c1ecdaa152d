//! Runtime discovery
//!
//! One scan walks every place a JVM plausibly lives, in a fixed order:
//! managed stores, OS-specific system locations (Windows registry and vendor
//! directories, `/usr/lib/jvm`, `/Library/Java/JavaVirtualMachines`), runtime
//! bundles left behind by the official game client, the `PATH`, the
//! `BROKKR_JRES` environment override, `~/.jdks`, and finally the executables
//! the user configured by hand. Candidates are deduplicated by canonical
//! executable path; probe failures are logged and skipped, never fatal.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use brokkr_core::{Architecture, HostInfo, OperatingSystem, Platform};

use crate::cache::{cache_key, ProbeCache};
use crate::config::UserConfig;
use crate::probe::JavaProber;
use crate::runtime::{resolve_executable, JavaRuntime};
use crate::store::JavaStore;

/// Environment variable listing extra runtime homes, `PATH`-separated
pub const EXTRA_HOMES_ENV: &str = "BROKKR_JRES";

/// Vendor subdirectories of `Program Files` that contain JDK homes
const KNOWN_VENDOR_DIRECTORIES: &[&str] = &[
    "Java",
    "BellSoft",
    "AdoptOpenJDK",
    "Zulu",
    "Microsoft",
    "Eclipse Foundation",
    "Semeru",
];

/// Registry keys whose subkeys carry a `JavaHome` value
const JAVA_REGISTRY_KEYS: &[&str] = &[
    r"SOFTWARE\JavaSoft\Java Runtime Environment",
    r"SOFTWARE\JavaSoft\Java Development Kit",
    r"SOFTWARE\JavaSoft\JRE",
    r"SOFTWARE\JavaSoft\JDK",
];

/// Directory key the official launcher uses for runtime bundles of a
/// platform, e.g. `windows-x64` or `mac-os-arm64`
pub fn mojang_platform_key(platform: Platform) -> Option<&'static str> {
    match (platform.os, platform.arch) {
        (OperatingSystem::Windows, Architecture::X86) => Some("windows-x86"),
        (OperatingSystem::Windows, Architecture::X86_64) => Some("windows-x64"),
        (OperatingSystem::Windows, Architecture::Arm64) => Some("windows-arm64"),
        (OperatingSystem::Linux, Architecture::X86) => Some("linux-i386"),
        (OperatingSystem::Linux, Architecture::X86_64) => Some("linux"),
        (OperatingSystem::MacOS, Architecture::X86_64) => Some("mac-os"),
        (OperatingSystem::MacOS, Architecture::Arm64) => Some("mac-os-arm64"),
        _ => None,
    }
}

/// Fixed Linux search roots: Oracle RPM installs, the distribution JVM
/// directories, and the SDKMAN candidates directory under the user's home
pub fn linux_search_directories(home: Option<&Path>) -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/usr/java"),
        PathBuf::from("/usr/lib/jvm"),
        PathBuf::from("/usr/lib32/jvm"),
        PathBuf::from("/usr/lib64/jvm"),
    ];
    if let Some(home) = home {
        dirs.push(home.join(".sdkman/candidates/java"));
    }
    dirs
}

/// Read-only access to the Windows registry (`HKEY_LOCAL_MACHINE`).
/// Injected so scans are testable and so non-Windows builds simply pass
/// `None`.
pub trait RegistryQuery: Send + Sync {
    /// Names of the direct subkeys of `path`
    fn sub_keys(&self, path: &str) -> Vec<String>;
    /// A string value under `path`
    fn value(&self, path: &str, name: &str) -> Option<String>;
}

/// User-driven inputs to a scan
#[derive(Debug, Clone, Default)]
pub struct DiscoverySettings {
    /// Executables added by the user
    pub user_java: Vec<PathBuf>,
    /// Executables the user disabled; matched against both the configured
    /// and the canonicalized path
    pub disabled_java: BTreeSet<PathBuf>,
    /// The JVM the launcher itself was started from, when embedded
    pub current_runtime: Option<PathBuf>,
}

impl DiscoverySettings {
    pub fn from_config(config: &UserConfig) -> Self {
        Self {
            user_java: config.user_java.clone(),
            disabled_java: config.disabled_java.clone(),
            current_runtime: None,
        }
    }
}

/// Everything a scan needs, bundled so the registry can re-run scans from
/// background tasks
pub struct ScanContext {
    pub host: HostInfo,
    pub prober: JavaProber,
    /// Store shared by all launcher instances, under the user's home
    pub global_store: JavaStore,
    /// Store private to the current game directory
    pub local_store: JavaStore,
    pub registry: Option<Arc<dyn RegistryQuery>>,
    pub settings: DiscoverySettings,
    /// Probe cache location; `None` disables caching entirely
    pub cache_path: Option<PathBuf>,
    /// The launcher's own runtime-bundle download directory; bundles here
    /// are verified against their listing before being trusted
    pub download_cache: Option<PathBuf>,
}

impl ScanContext {
    /// Run a full scan. `use_cache` controls whether previously probed
    /// identities may be reused; a refresh passes `false` to re-probe
    /// everything.
    pub fn scan(&self, use_cache: bool) -> HashMap<PathBuf, JavaRuntime> {
        let cache = match (&self.cache_path, use_cache) {
            (Some(path), true) => Some(ProbeCache::load(path)),
            (Some(path), false) => {
                // start over but keep writing fresh results
                let mut cache = ProbeCache::load(path);
                cache.clear();
                Some(cache)
            }
            (None, _) => None,
        };
        let mut scanner = Scanner {
            ctx: self,
            cache,
            found: HashMap::new(),
        };
        scanner.run();
        if let Some(cache) = scanner.cache.as_mut() {
            cache.save();
        }
        debug!(count = scanner.found.len(), "runtime scan finished");
        scanner.found
    }
}

struct Scanner<'a> {
    ctx: &'a ScanContext,
    cache: Option<ProbeCache>,
    found: HashMap<PathBuf, JavaRuntime>,
}

impl Scanner<'_> {
    fn run(&mut self) {
        self.search_managed_stores();
        match self.ctx.host.os() {
            OperatingSystem::Windows => {
                self.search_windows_registry();
                self.search_windows_vendors();
            }
            OperatingSystem::Linux => {
                for dir in linux_search_directories(dirs::home_dir().as_deref()) {
                    self.search_directory(&dir);
                }
            }
            OperatingSystem::MacOS => self.search_macos_locations(),
        }
        self.search_game_client_bundles();
        self.search_download_cache();
        self.search_path();
        self.search_extra_homes();
        self.search_user_sdk_dir();
        self.search_user_configured();
    }

    /// Step 1: both managed stores, for the host's natural platform and
    /// every emulated platform in table order
    fn search_managed_stores(&mut self) {
        for store in [&self.ctx.global_store, &self.ctx.local_store] {
            for platform in self.ctx.host.store_platforms() {
                for runtime in store.list(platform) {
                    self.insert(runtime);
                }
                // pre-rename store directories used "osx" on macOS
                if platform.os == OperatingSystem::MacOS {
                    let legacy = store
                        .root()
                        .join(format!("osx-{}", platform.arch.checked_name()));
                    self.search_directory(&legacy);
                }
            }
        }
    }

    fn search_windows_registry(&mut self) {
        let Some(registry) = self.ctx.registry.clone() else {
            return;
        };
        for key in JAVA_REGISTRY_KEYS {
            for sub_key in registry.sub_keys(key) {
                let path = format!("{key}\\{sub_key}");
                // only MSI-installed runtimes; other subkeys are metadata
                // like CurrentVersion
                if !registry.sub_keys(&path).iter().any(|k| k == "MSI") {
                    continue;
                }
                if let Some(home) = registry.value(&path, "JavaHome") {
                    self.try_add_home(Path::new(&home));
                }
            }
        }
    }

    fn search_windows_vendors(&mut self) {
        let roots = [
            ("ProgramFiles", "C:\\Program Files"),
            ("ProgramFiles(x86)", "C:\\Program Files (x86)"),
            ("ProgramFiles(ARM64)", "C:\\Program Files (Arm)"),
        ];
        for (env, default) in roots {
            let base = std::env::var(env).unwrap_or_else(|_| default.to_owned());
            for vendor in KNOWN_VENDOR_DIRECTORIES {
                self.search_directory(&Path::new(&base).join(vendor));
            }
        }
    }

    fn search_macos_locations(&mut self) {
        let mut vm_dirs = vec![PathBuf::from("/Library/Java/JavaVirtualMachines")];
        if let Some(home) = dirs::home_dir() {
            vm_dirs.push(home.join("Library/Java/JavaVirtualMachines"));
        }
        for dir in vm_dirs {
            self.search_virtual_machines(&dir);
        }
        self.try_add_executable(Path::new(
            "/Library/Internet Plug-Ins/JavaAppletPlugin.plugin/Contents/Home/bin/java",
        ));
        self.try_add_executable(Path::new(
            "/Applications/Xcode.app/Contents/Applications/Application Loader.app/Contents/MacOS/itms/java/bin/java",
        ));
        self.try_add_executable(Path::new("/opt/homebrew/opt/java/bin/java"));
        self.search_homebrew_cellar(Path::new("/opt/homebrew/Cellar"));
    }

    /// `*.jdk` bundles keep their home under `Contents/Home`
    fn search_virtual_machines(&mut self, dir: &Path) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            self.try_add_home(&entry.path().join("Contents/Home"));
        }
    }

    /// The unversioned `openjdk` keg plus every versioned `openjdk@*` keg
    fn search_homebrew_cellar(&mut self, cellar: &Path) {
        self.search_directory(&cellar.join("openjdk"));
        let Ok(entries) = std::fs::read_dir(cellar) else {
            return;
        };
        for entry in entries.flatten() {
            if entry.file_name().to_string_lossy().starts_with("openjdk@") {
                self.search_directory(&entry.path());
            }
        }
    }

    /// Runtime bundles installed by the official game client. Skipped on
    /// hosts the client never ships bundles for.
    fn search_game_client_bundles(&mut self) {
        match (self.ctx.host.os(), self.ctx.host.arch()) {
            (OperatingSystem::Windows, arch) if arch.is_x86() => {
                if let Some(local) = std::env::var_os("LOCALAPPDATA") {
                    self.search_official_bundles(
                        &Path::new(&local).join(
                            r"Packages\Microsoft.4297127D64EC6_8wekyb3d8bbwe\LocalCache\Local\runtime",
                        ),
                        false,
                    );
                }
                let base = std::env::var("ProgramFiles(x86)")
                    .unwrap_or_else(|_| "C:\\Program Files (x86)".to_owned());
                self.search_official_bundles(
                    &Path::new(&base).join(r"Minecraft Launcher\runtime"),
                    false,
                );
            }
            (OperatingSystem::Linux, Architecture::X86_64) => {
                if let Some(home) = dirs::home_dir() {
                    self.search_official_bundles(&home.join(".minecraft/runtime"), false);
                }
            }
            (OperatingSystem::MacOS, _) => {
                if let Some(home) = dirs::home_dir() {
                    self.search_official_bundles(
                        &home.join("Library/Application Support/minecraft/runtime"),
                        false,
                    );
                }
            }
            _ => {}
        }
    }

    /// Bundles this launcher downloaded itself. Unlike the game client's
    /// directories, an interrupted download may linger here, so every
    /// listed file is checked.
    fn search_download_cache(&mut self) {
        if let Some(dir) = self.ctx.download_cache.clone() {
            self.search_official_bundles(&dir, true);
        }
    }

    /// Walk a `runtime` directory of component bundles, once per platform
    /// the host can execute
    fn search_official_bundles(&mut self, dir: &Path, verify: bool) {
        for platform in self.ctx.host.store_platforms() {
            let Some(key) = mojang_platform_key(platform) else {
                continue;
            };
            let Ok(entries) = std::fs::read_dir(dir) else {
                return;
            };
            for entry in entries.flatten() {
                self.try_add_component_dir(key, &entry.path(), verify);
            }
        }
    }

    /// A component bundle lays out `<component>/<key>/<component>` with a
    /// sibling `<component>.sha1` listing; the listing's presence marks a
    /// finished download. With `verify`, every path the listing names must
    /// also exist under the installation.
    fn try_add_component_dir(&mut self, key: &str, component: &Path, verify: bool) {
        let Some(name) = component.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            return;
        };
        let platform_dir = component.join(key);
        let home = platform_dir.join(&name);
        let listing = platform_dir.join(format!("{name}.sha1"));
        if !listing.is_file() {
            debug!(path = %component.display(), "component bundle not fully downloaded");
            return;
        }
        if verify && !self.verify_component_listing(&listing, &home) {
            return;
        }
        self.try_add_home(&home);
    }

    /// Check each `path /#// sha1 size` line of a bundle listing for the
    /// named path's existence
    fn verify_component_listing(&self, listing: &Path, home: &Path) -> bool {
        let Ok(contents) = std::fs::read_to_string(listing) else {
            warn!(path = %listing.display(), "unreadable bundle listing");
            return false;
        };
        for line in contents.lines().filter(|l| !l.trim().is_empty()) {
            let Some((path, _)) = line.split_once(" /#//") else {
                warn!(path = %listing.display(), line, "malformed bundle listing");
                return false;
            };
            if !home.join(path).exists() {
                warn!(
                    path = %home.join(path).display(),
                    "listed bundle file missing, skipping component"
                );
                return false;
            }
        }
        true
    }

    fn search_path(&mut self) {
        let Ok(candidates) = which::which_all(self.ctx.host.os().java_executable()) else {
            return;
        };
        for exe in candidates {
            // the Oracle shim in Common Files is a launcher, not a JVM home
            if self.ctx.host.os() == OperatingSystem::Windows
                && exe
                    .to_string_lossy()
                    .to_lowercase()
                    .contains("\\common files\\oracle\\java\\")
            {
                continue;
            }
            self.try_add_executable(&exe);
        }
    }

    fn search_extra_homes(&mut self) {
        let Some(value) = std::env::var_os(EXTRA_HOMES_ENV) else {
            return;
        };
        for home in std::env::split_paths(&value) {
            self.try_add_home(&home);
        }
    }

    fn search_user_sdk_dir(&mut self) {
        if let Some(home) = dirs::home_dir() {
            self.search_directory(&home.join(".jdks"));
        }
    }

    fn search_user_configured(&mut self) {
        for exe in &self.ctx.settings.user_java {
            self.try_add_executable(exe);
        }
        if let Some(exe) = self.ctx.settings.current_runtime.clone() {
            self.try_add_executable(&exe);
        }
    }

    /// Treat every subdirectory of `dir` as a potential runtime home
    fn search_directory(&mut self, dir: &Path) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            self.try_add_home(&entry.path());
        }
    }

    fn try_add_home(&mut self, home: &Path) {
        match resolve_executable(home, self.ctx.host.os()) {
            Ok(exe) => self.try_add_executable(&exe),
            Err(e) => debug!(home = %home.display(), error = %e, "not a runtime home"),
        }
    }

    fn try_add_executable(&mut self, executable: &Path) {
        let Ok(canonical) = executable.canonicalize() else {
            debug!(path = %executable.display(), "executable does not exist");
            return;
        };
        if self.found.contains_key(&canonical)
            || self.ctx.settings.disabled_java.contains(executable)
            || self.ctx.settings.disabled_java.contains(&canonical)
        {
            return;
        }

        let key = cache_key(&canonical);
        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(info) = cache.lookup(&canonical, key) {
                self.insert(JavaRuntime::of(canonical, info.clone(), false));
                return;
            }
        }

        match self.ctx.prober.identify(&canonical, true) {
            Ok(info) => {
                if let (Some(cache), Some(key)) = (self.cache.as_mut(), key) {
                    cache.insert(canonical.clone(), key, info.clone());
                }
                self.insert(JavaRuntime::of(canonical, info, false));
            }
            Err(e) if e.is_benign() => {
                debug!(path = %canonical.display(), error = %e, "skipping unusable candidate")
            }
            Err(e) => {
                warn!(path = %canonical.display(), error = %e, "failed to probe candidate")
            }
        }
    }

    fn insert(&mut self, runtime: JavaRuntime) {
        if !self.ctx.host.is_compatible(runtime.platform()) {
            debug!(
                path = %runtime.binary().display(),
                platform = %runtime.platform(),
                "skipping incompatible runtime"
            );
            return;
        }
        // first source wins: managed stores are scanned first, so their
        // records keep the managed flag when a later step rediscovers the
        // same binary
        self.found.entry(runtime.binary().to_path_buf()).or_insert(runtime);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbePayload;
    use brokkr_core::{Architecture, Platform};
    use std::fs;
    use tempfile::TempDir;

    const PLATFORM: Platform = Platform::new(OperatingSystem::Linux, Architecture::X86_64);

    fn context(root: &Path) -> ScanContext {
        let host = HostInfo::new(PLATFORM);
        ScanContext {
            host: host.clone(),
            prober: JavaProber::new(
                ProbePayload {
                    classpath: PathBuf::from("/nonexistent/probe.jar"),
                    main_class: "org.brokkr.probe.Dump".into(),
                },
                host,
            ),
            global_store: JavaStore::new(root.join("global")),
            local_store: JavaStore::new(root.join("local")),
            registry: None,
            settings: DiscoverySettings::default(),
            cache_path: None,
            download_cache: None,
        }
    }

    fn fake_home(parent: &Path, name: &str, version: &str) -> PathBuf {
        let home = parent.join(name);
        fs::create_dir_all(home.join("bin")).unwrap();
        fs::write(home.join("bin/java"), b"binary").unwrap();
        fs::write(
            home.join("release"),
            format!("JAVA_VERSION=\"{version}\"\nOS_NAME=\"Linux\"\nOS_ARCH=\"x86_64\"\n"),
        )
        .unwrap();
        home
    }

    fn scanner(ctx: &ScanContext) -> Scanner<'_> {
        Scanner {
            ctx,
            cache: None,
            found: HashMap::new(),
        }
    }

    #[test]
    fn test_search_directory_probes_homes() {
        let dir = TempDir::new().unwrap();
        let jvm_dir = dir.path().join("jvm");
        fake_home(&jvm_dir, "jdk-21", "21.0.1");
        fake_home(&jvm_dir, "jdk-17", "17.0.2");
        fs::create_dir_all(jvm_dir.join("not-a-jdk")).unwrap();

        let ctx = context(dir.path());
        let mut scanner = scanner(&ctx);
        scanner.search_directory(&jvm_dir);

        let versions: BTreeSet<_> = scanner
            .found
            .values()
            .map(|r| r.version().to_owned())
            .collect();
        assert_eq!(versions, BTreeSet::from(["17.0.2".into(), "21.0.1".into()]));
        assert!(scanner.found.values().all(|r| !r.is_managed()));
    }

    #[test]
    fn test_duplicates_collapse_on_canonical_path() {
        let dir = TempDir::new().unwrap();
        let home = fake_home(dir.path(), "jdk-21", "21.0.1");

        let ctx = context(dir.path());
        let mut scanner = scanner(&ctx);
        scanner.try_add_home(&home);
        scanner.try_add_home(&home);
        assert_eq!(scanner.found.len(), 1);
    }

    #[test]
    fn test_disabled_executable_skipped() {
        let dir = TempDir::new().unwrap();
        let home = fake_home(dir.path(), "jdk-21", "21.0.1");
        let exe = home.join("bin/java").canonicalize().unwrap();

        let mut ctx = context(dir.path());
        ctx.settings.disabled_java.insert(exe);
        let mut scanner = scanner(&ctx);
        scanner.try_add_home(&home);
        assert!(scanner.found.is_empty());
    }

    #[test]
    fn test_user_configured_executables() {
        let dir = TempDir::new().unwrap();
        let home = fake_home(dir.path(), "custom", "11.0.14");

        let mut ctx = context(dir.path());
        ctx.settings.user_java.push(home.join("bin/java"));
        let mut scanner = scanner(&ctx);
        scanner.search_user_configured();
        assert_eq!(scanner.found.len(), 1);
        assert!(scanner.found.values().any(|r| r.version() == "11.0.14"));
    }

    #[test]
    fn test_managed_store_runtimes_found() {
        use crate::source::DirSource;
        use serde_json::Map;

        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path());
        let fixture = TempDir::new().unwrap();
        fake_home(fixture.path(), "image", "21.0.1");
        ctx.global_store
            .install(
                PLATFORM,
                "java-runtime-gamma",
                &mut DirSource::new(fixture.path().join("image")),
                None,
                Map::new(),
                &ctx.prober,
            )
            .unwrap();

        let mut scanner = scanner(&ctx);
        scanner.search_managed_stores();
        assert_eq!(scanner.found.len(), 1);
        assert!(scanner.found.values().all(|r| r.is_managed()));
    }

    /// Simulates `SOFTWARE\JavaSoft\JDK` with one MSI-installed runtime,
    /// one manually unpacked entry (no MSI marker), and the CurrentVersion
    /// metadata subkey
    struct FakeRegistry {
        msi_home: PathBuf,
        bare_home: PathBuf,
    }

    impl RegistryQuery for FakeRegistry {
        fn sub_keys(&self, path: &str) -> Vec<String> {
            match path {
                r"SOFTWARE\JavaSoft\JDK" => {
                    vec!["21.0.1".into(), "17.0.2".into(), "CurrentVersion".into()]
                }
                r"SOFTWARE\JavaSoft\JDK\21.0.1" => vec!["MSI".into()],
                _ => Vec::new(),
            }
        }
        fn value(&self, path: &str, name: &str) -> Option<String> {
            if name != "JavaHome" {
                return None;
            }
            match path {
                r"SOFTWARE\JavaSoft\JDK\21.0.1" => {
                    Some(self.msi_home.to_string_lossy().into_owned())
                }
                r"SOFTWARE\JavaSoft\JDK\17.0.2" => {
                    Some(self.bare_home.to_string_lossy().into_owned())
                }
                _ => None,
            }
        }
    }

    fn fake_windows_home(parent: &Path, name: &str, version: &str) -> PathBuf {
        let home = parent.join(name);
        fs::create_dir_all(home.join("bin")).unwrap();
        fs::write(home.join("bin/java.exe"), b"binary").unwrap();
        fs::write(
            home.join("release"),
            format!("JAVA_VERSION=\"{version}\"\nOS_NAME=\"Windows\"\nOS_ARCH=\"amd64\"\n"),
        )
        .unwrap();
        home
    }

    #[test]
    fn test_registry_scan_uses_java_home_values() {
        let dir = TempDir::new().unwrap();
        let msi_home = fake_windows_home(dir.path(), "jdk-21", "21.0.1");
        let bare_home = fake_windows_home(dir.path(), "jdk-17", "17.0.2");

        let mut ctx = context(dir.path());
        ctx.host = HostInfo::new(Platform::WINDOWS_X86_64);
        ctx.registry = Some(Arc::new(FakeRegistry { msi_home, bare_home }));
        let mut scanner = scanner(&ctx);
        scanner.search_windows_registry();

        assert_eq!(scanner.found.len(), 1);
        let runtime = scanner.found.values().next().unwrap();
        assert_eq!(runtime.platform(), Platform::WINDOWS_X86_64);
        // only the entry carrying the MSI marker subkey is trusted
        assert_eq!(runtime.version(), "21.0.1");
    }

    #[test]
    fn test_probe_failures_do_not_abort_scan() {
        let dir = TempDir::new().unwrap();
        let jvm_dir = dir.path().join("jvm");
        fake_home(&jvm_dir, "good", "21.0.1");
        // home with an executable but no release file: probe subprocess fails
        let broken = jvm_dir.join("broken");
        fs::create_dir_all(broken.join("bin")).unwrap();
        fs::write(broken.join("bin/java"), b"").unwrap();

        let ctx = context(dir.path());
        let mut scanner = scanner(&ctx);
        scanner.search_directory(&jvm_dir);
        assert_eq!(scanner.found.len(), 1);
    }

    /// `runtime/<component>/<key>/<component>` plus `<component>.sha1`
    fn fake_component(runtime_dir: &Path, name: &str, key: &str, version: &str) -> PathBuf {
        let platform_dir = runtime_dir.join(name).join(key);
        fake_home(&platform_dir, name, version);
        fs::write(
            platform_dir.join(format!("{name}.sha1")),
            "bin/java /#// da39a3ee5e6b4b0d3255bfef95601890afd80709 6\n",
        )
        .unwrap();
        platform_dir
    }

    #[test]
    fn test_official_bundle_components_found() {
        let dir = TempDir::new().unwrap();
        let runtime_dir = dir.path().join("runtime");
        fake_component(&runtime_dir, "java-runtime-gamma", "linux", "17.0.2");
        // download never finished: no .sha1 listing next to the image
        let partial = runtime_dir.join("java-runtime-delta").join("linux");
        fake_home(&partial, "java-runtime-delta", "21.0.1");

        let ctx = context(dir.path());
        let mut scanner = scanner(&ctx);
        scanner.search_official_bundles(&runtime_dir, false);

        assert_eq!(scanner.found.len(), 1);
        assert!(scanner.found.values().any(|r| r.version() == "17.0.2"));
    }

    #[test]
    fn test_official_bundle_verify_rejects_missing_files() {
        let dir = TempDir::new().unwrap();
        let runtime_dir = dir.path().join("runtime");
        let platform_dir = fake_component(&runtime_dir, "java-runtime-gamma", "linux", "17.0.2");
        fs::write(
            platform_dir.join("java-runtime-gamma.sha1"),
            "bin/java /#// da39a3ee5e6b4b0d3255bfef95601890afd80709 6\n\
             lib/modules /#// da39a3ee5e6b4b0d3255bfef95601890afd80709 42\n",
        )
        .unwrap();

        let ctx = context(dir.path());
        let mut scanner = scanner(&ctx);
        scanner.try_add_component_dir("linux", &runtime_dir.join("java-runtime-gamma"), true);
        assert!(scanner.found.is_empty());

        // without verification the listing only has to exist
        scanner.try_add_component_dir("linux", &runtime_dir.join("java-runtime-gamma"), false);
        assert_eq!(scanner.found.len(), 1);
    }

    #[test]
    fn test_incompatible_architecture_filtered() {
        let dir = TempDir::new().unwrap();
        let arm = dir.path().join("jdk-arm");
        fs::create_dir_all(arm.join("bin")).unwrap();
        fs::write(arm.join("bin/java"), b"binary").unwrap();
        fs::write(
            arm.join("release"),
            "JAVA_VERSION=\"21.0.1\"\nOS_NAME=\"Linux\"\nOS_ARCH=\"aarch64\"\n",
        )
        .unwrap();
        let x86 = dir.path().join("jdk-x86");
        fs::create_dir_all(x86.join("bin")).unwrap();
        fs::write(x86.join("bin/java"), b"binary").unwrap();
        fs::write(
            x86.join("release"),
            "JAVA_VERSION=\"17.0.2\"\nOS_NAME=\"Linux\"\nOS_ARCH=\"i386\"\n",
        )
        .unwrap();

        let mut ctx = context(dir.path());
        ctx.settings.user_java = vec![arm.join("bin/java"), x86.join("bin/java")];
        let mut scanner = scanner(&ctx);
        scanner.search_user_configured();

        // arm64 cannot run on an x86_64 host; x86 can, via the emulation
        // table
        assert_eq!(scanner.found.len(), 1);
        assert_eq!(scanner.found.values().next().unwrap().version(), "17.0.2");
    }

    #[test]
    fn test_linux_search_directories_cover_sdkman() {
        let dirs = linux_search_directories(Some(Path::new("/home/user")));
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/usr/java"),
                PathBuf::from("/usr/lib/jvm"),
                PathBuf::from("/usr/lib32/jvm"),
                PathBuf::from("/usr/lib64/jvm"),
                PathBuf::from("/home/user/.sdkman/candidates/java"),
            ]
        );
        assert_eq!(linux_search_directories(None).len(), 4);
    }

    #[test]
    fn test_homebrew_cellar_scans_versioned_kegs() {
        let dir = TempDir::new().unwrap();
        let cellar = dir.path().join("Cellar");
        fake_home(&cellar.join("openjdk"), "21.0.1", "21.0.1");
        fake_home(&cellar.join("openjdk@17"), "17.0.2", "17.0.2");
        fake_home(&cellar.join("python"), "3.12.1", "3.12.1");

        let ctx = context(dir.path());
        let mut scanner = scanner(&ctx);
        scanner.search_homebrew_cellar(&cellar);

        let versions: BTreeSet<_> = scanner
            .found
            .values()
            .map(|r| r.version().to_owned())
            .collect();
        assert_eq!(versions, BTreeSet::from(["17.0.2".into(), "21.0.1".into()]));
    }

    #[test]
    fn test_download_cache_bundles_are_verified() {
        let dir = TempDir::new().unwrap();
        let cache_dir = dir.path().join("cache/java");
        fake_component(&cache_dir, "java-runtime-gamma", "linux", "17.0.2");
        // a listing entry whose file was never downloaded
        let broken = fake_component(&cache_dir, "java-runtime-delta", "linux", "21.0.1");
        fs::write(
            broken.join("java-runtime-delta.sha1"),
            "bin/java /#// da39a3ee5e6b4b0d3255bfef95601890afd80709 6\n\
             lib/modules /#// da39a3ee5e6b4b0d3255bfef95601890afd80709 42\n",
        )
        .unwrap();

        let mut ctx = context(dir.path());
        ctx.download_cache = Some(cache_dir);
        let mut scanner = scanner(&ctx);
        scanner.search_download_cache();

        assert_eq!(scanner.found.len(), 1);
        assert!(scanner.found.values().any(|r| r.version() == "17.0.2"));
    }

    #[test]
    fn test_managed_record_kept_on_rediscovery() {
        use crate::source::DirSource;
        use serde_json::Map;

        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path());
        let fixture = TempDir::new().unwrap();
        fake_home(fixture.path(), "image", "21.0.1");
        let installed = ctx
            .global_store
            .install(
                PLATFORM,
                "jre",
                &mut DirSource::new(fixture.path().join("image")),
                None,
                Map::new(),
                &ctx.prober,
            )
            .unwrap();

        let mut scanner = scanner(&ctx);
        scanner.search_managed_stores();
        // a later source rediscovering the same binary does not demote it
        scanner.try_add_home(&ctx.global_store.java_dir(PLATFORM, "jre"));

        assert_eq!(scanner.found.len(), 1);
        assert!(scanner.found[installed.binary()].is_managed());
    }

    #[test]
    #[serial_test::serial]
    fn test_refresh_ignores_cached_identities() {
        use crate::runtime::JavaInfo;

        let dir = TempDir::new().unwrap();
        let home = fake_home(dir.path(), "jdk-21", "21.0.1");
        let exe = home.join("bin/java").canonicalize().unwrap();

        let mut ctx = context(dir.path());
        ctx.cache_path = Some(dir.path().join("cache.json"));
        ctx.settings.user_java.push(exe.clone());

        // plant a cache entry with a matching freshness key; a cached scan
        // must trust it over the release file
        let mut cache = ProbeCache::load(dir.path().join("cache.json"));
        cache.insert(
            exe.clone(),
            cache_key(&exe).unwrap(),
            JavaInfo::new(PLATFORM, "99.0.0", None),
        );
        cache.save();

        let found = ctx.scan(true);
        assert_eq!(found[&exe].version(), "99.0.0");

        // a refresh discards cached identities and re-probes
        let found = ctx.scan(false);
        assert_eq!(found[&exe].version(), "21.0.1");
    }
}
