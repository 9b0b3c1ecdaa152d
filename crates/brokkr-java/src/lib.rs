//! # brokkr-java
//!
//! Java runtime management for the Brokkr launcher:
//! - Discovery of installed runtimes across system locations, vendor
//!   directories, the `PATH`, environment overrides, and user configuration
//! - Identity probing via the `release` metadata file or a subprocess probe
//! - Managed runtime stores with per-installation manifests
//! - Version-constraint based selection of a runtime for a given game version
//! - A process-wide registry publishing atomic snapshots of known runtimes

pub mod cache;
pub mod config;
pub mod discovery;
pub mod install;
pub mod manifest;
pub mod probe;
pub mod registry;
pub mod runtime;
pub mod select;
pub mod source;
pub mod store;

pub use config::UserConfig;
pub use discovery::{DiscoverySettings, RegistryQuery, ScanContext};
pub use manifest::{FileEntry, JavaManifest};
pub use probe::{JavaProber, ProbePayload};
pub use registry::JavaRegistry;
pub use runtime::{JavaInfo, JavaRuntime};
pub use select::{select_java, SelectionContext, Workload};
pub use store::JavaStore;
