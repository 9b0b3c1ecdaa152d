//! Process-wide runtime registry
//!
//! Holds the current map of known runtimes behind an atomically swapped
//! pointer. Readers never lock: they either get the published snapshot or,
//! before the first scan finishes, wait on a one-shot gate that opens exactly
//! once. Full scans replace the snapshot wholesale (last scan to finish
//! wins); single add/remove operations copy the map, apply the one change,
//! and swap. A watch channel carries a generation counter so interested
//! consumers can react to any published change.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde_json::{Map, Value};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use brokkr_core::{Error, Platform, Result};

use crate::discovery::ScanContext;
use crate::runtime::{JavaInfo, JavaRuntime};

/// Snapshot type published by the registry
pub type RuntimeMap = HashMap<PathBuf, JavaRuntime>;

pub struct JavaRegistry {
    context: Arc<ScanContext>,
    snapshot: ArcSwapOption<RuntimeMap>,
    /// Bumped on every published change; doubles as the ready gate
    generation: watch::Sender<u64>,
    /// Serializes writers; readers never take it
    mutate: Mutex<()>,
}

impl JavaRegistry {
    pub fn new(context: ScanContext) -> Arc<Self> {
        let (generation, _) = watch::channel(0);
        Arc::new(Self {
            context: Arc::new(context),
            snapshot: ArcSwapOption::const_empty(),
            generation,
            mutate: Mutex::new(()),
        })
    }

    pub fn context(&self) -> &ScanContext {
        &self.context
    }

    /// Kick off the initial scan in the background. Readers block in
    /// [`get_all`](Self::get_all) until it completes.
    pub fn initialize(self: &Arc<Self>) -> JoinHandle<()> {
        self.spawn_scan(true)
    }

    /// Re-scan everything, ignoring cached probe results. The new snapshot
    /// replaces the old one atomically when the scan completes.
    pub fn refresh(self: &Arc<Self>) -> JoinHandle<()> {
        self.spawn_scan(false)
    }

    fn spawn_scan(self: &Arc<Self>, use_cache: bool) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let context = Arc::clone(&registry.context);
            match tokio::task::spawn_blocking(move || context.scan(use_cache)).await {
                Ok(map) => {
                    info!(count = map.len(), "publishing runtime snapshot");
                    registry.publish(map).await;
                }
                Err(e) => warn!(error = %e, "runtime scan task failed"),
            }
        })
    }

    async fn publish(&self, map: RuntimeMap) {
        let _guard = self.mutate.lock().await;
        self.snapshot.store(Some(Arc::new(map)));
        self.generation.send_modify(|g| *g += 1);
    }

    /// The current snapshot, waiting for the initial scan when necessary.
    /// The returned map is immutable; later changes publish new maps.
    pub async fn get_all(&self) -> Arc<RuntimeMap> {
        if let Some(map) = self.snapshot.load_full() {
            return map;
        }
        let mut rx = self.generation.subscribe();
        loop {
            if let Some(map) = self.snapshot.load_full() {
                return map;
            }
            if rx.changed().await.is_err() {
                return Arc::new(RuntimeMap::new());
            }
        }
    }

    /// The current snapshot without waiting; `None` before the first scan
    pub fn try_get_all(&self) -> Option<Arc<RuntimeMap>> {
        self.snapshot.load_full()
    }

    pub fn is_ready(&self) -> bool {
        self.snapshot.load().is_some()
    }

    /// Observe published changes; the value is an opaque generation counter
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    /// All known runtimes sorted by version, managed stores' entries
    /// deduplicated by executable path already
    pub async fn sorted(&self) -> Vec<JavaRuntime> {
        let map = self.get_all().await;
        let mut runtimes: Vec<_> = map.values().cloned().collect();
        runtimes.sort();
        runtimes
    }

    /// Copy-on-write insert of a single runtime
    pub async fn add(&self, runtime: JavaRuntime) {
        let _ = self.get_all().await;
        let _guard = self.mutate.lock().await;
        let mut map = match self.snapshot.load_full() {
            Some(map) => (*map).clone(),
            None => RuntimeMap::new(),
        };
        map.insert(runtime.binary().to_path_buf(), runtime);
        self.snapshot.store(Some(Arc::new(map)));
        self.generation.send_modify(|g| *g += 1);
    }

    /// Copy-on-write removal of a single runtime by executable path
    pub async fn remove(&self, executable: &Path) {
        let _ = self.get_all().await;
        let _guard = self.mutate.lock().await;
        let Some(current) = self.snapshot.load_full() else {
            return;
        };
        if !current.contains_key(executable) {
            return;
        }
        let mut map = (*current).clone();
        map.remove(executable);
        self.snapshot.store(Some(Arc::new(map)));
        self.generation.send_modify(|g| *g += 1);
    }

    /// Probe a user-supplied executable, check host compatibility, and
    /// register it. Errors surface to the caller; nothing is swallowed here.
    pub async fn add_executable(&self, executable: &Path) -> Result<JavaRuntime> {
        let context = Arc::clone(&self.context);
        let path = executable.to_path_buf();
        let runtime = tokio::task::spawn_blocking(move || -> Result<JavaRuntime> {
            let canonical = path.canonicalize().map_err(|_| Error::not_found(&path))?;
            let info = context.prober.identify(&canonical, true)?;
            if !context.host.is_compatible(info.platform) {
                return Err(Error::incompatible(info.platform));
            }
            Ok(JavaRuntime::of(canonical, info, false))
        })
        .await
        .map_err(join_error)??;

        self.add(runtime.clone()).await;
        Ok(runtime)
    }

    /// Install an archive into the global managed store and register the
    /// resulting runtime. A caller that already knows the archive's identity
    /// (a download keyed by platform and version) passes it to skip the probe.
    pub async fn install_archive(
        &self,
        platform: Platform,
        name: String,
        archive: PathBuf,
        identity: Option<JavaInfo>,
        update: Map<String, Value>,
    ) -> Result<JavaRuntime> {
        let context = Arc::clone(&self.context);
        let runtime = tokio::task::spawn_blocking(move || {
            context
                .global_store
                .install_archive(platform, &name, &archive, identity, update, &context.prober)
        })
        .await
        .map_err(join_error)??;

        self.add(runtime.clone()).await;
        Ok(runtime)
    }

    /// Uninstall a managed runtime from whichever store owns it and drop it
    /// from the snapshot. Unmanaged runtimes are only dropped.
    pub async fn uninstall(&self, runtime: JavaRuntime) -> Result<()> {
        if runtime.is_managed() {
            let context = Arc::clone(&self.context);
            let record = runtime.clone();
            tokio::task::spawn_blocking(move || {
                if !context.global_store.uninstall_runtime(&record) {
                    context.local_store.uninstall_runtime(&record);
                }
            })
            .await
            .map_err(join_error)?;
        }
        self.remove(runtime.binary()).await;
        Ok(())
    }
}

fn join_error(e: tokio::task::JoinError) -> Error {
    Error::Io(std::io::Error::other(e))
}
