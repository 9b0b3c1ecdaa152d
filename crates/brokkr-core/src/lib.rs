//! # brokkr-core
//!
//! Core library for the Brokkr launcher providing:
//! - Operating system / architecture model with the emulation-compatibility table
//! - Flexible version-number comparison for JVM and game version strings
//! - The shared error taxonomy

pub mod error;
pub mod platform;
pub mod version;

pub use error::{Error, Result};
pub use platform::{Architecture, HostInfo, OperatingSystem, Platform};
pub use version::VersionNumber;
