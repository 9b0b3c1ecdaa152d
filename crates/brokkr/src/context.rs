//! Assembling the scan context from CLI flags, config, and conventions

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use brokkr_core::HostInfo;
use brokkr_java::probe::{JavaProber, ProbePayload};
use brokkr_java::{DiscoverySettings, JavaStore, ScanContext, UserConfig};

use crate::cli::Cli;

/// Environment variable overriding the probe classpath
const PROBE_CLASSPATH_ENV: &str = "BROKKR_PROBE_CLASSPATH";
/// Main class of the bundled probe program
const PROBE_MAIN_CLASS: &str = "org.brokkr.probe.ProbeMain";

pub struct App {
    pub context: ScanContext,
    pub config: UserConfig,
    pub config_path: PathBuf,
}

impl App {
    pub fn new(cli: &Cli) -> Result<Self> {
        let host = HostInfo::detect().context("unsupported operating system or architecture")?;
        let brokkr_home = brokkr_home()?;

        let config_path = match &cli.config {
            Some(path) => path.clone(),
            None => brokkr_java::config::default_config_path()
                .context("cannot determine the user home directory")?,
        };
        let config = UserConfig::load(&config_path)
            .with_context(|| format!("failed to load {}", config_path.display()))?;

        let game_dir = match &cli.game_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("cannot determine the working directory")?,
        };

        let payload = ProbePayload {
            classpath: match std::env::var_os(PROBE_CLASSPATH_ENV) {
                Some(path) => PathBuf::from(path),
                None => brokkr_home.join("probe.jar"),
            },
            main_class: PROBE_MAIN_CLASS.to_owned(),
        };

        debug!(
            host = %host.platform(),
            config = %config_path.display(),
            game_dir = %game_dir.display(),
            "assembled scan context"
        );

        let context = ScanContext {
            prober: JavaProber::new(payload, host.clone()),
            host,
            global_store: JavaStore::new(brokkr_home.join("java")),
            local_store: JavaStore::new(game_dir.join(".brokkr").join("java")),
            registry: None,
            settings: DiscoverySettings::from_config(&config),
            cache_path: Some(brokkr_home.join("java-cache.json")),
            download_cache: Some(brokkr_home.join("cache").join("java")),
        };

        Ok(Self {
            context,
            config,
            config_path,
        })
    }

    pub fn save_config(&self) -> Result<()> {
        self.config
            .save(&self.config_path)
            .with_context(|| format!("failed to write {}", self.config_path.display()))
    }
}

fn brokkr_home() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .context("cannot determine the user home directory")?
        .join(".brokkr"))
}
