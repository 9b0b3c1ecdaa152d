//! End-to-end managed store lifecycle: archive in, runtime out

use std::fs::File;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::Map;
use tempfile::TempDir;

use brokkr_core::{Architecture, HostInfo, OperatingSystem, Platform};
use brokkr_java::probe::{JavaProber, ProbePayload};
use brokkr_java::{JavaManifest, JavaStore};

const PLATFORM: Platform = Platform::new(OperatingSystem::Linux, Architecture::X86_64);

fn prober() -> JavaProber {
    JavaProber::new(
        ProbePayload {
            classpath: PathBuf::from("/nonexistent/probe.jar"),
            main_class: "org.brokkr.probe.Dump".into(),
        },
        HostInfo::new(PLATFORM),
    )
}

/// A minimal runtime image archive: one root directory wrapping bin/java
/// and a release file
fn build_archive(path: &Path, version: &str) {
    let file = File::create(path).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    let release = format!("JAVA_VERSION=\"{version}\"\nOS_NAME=\"Linux\"\nOS_ARCH=\"x86_64\"\n");
    let entries: [(&str, Option<&str>, u32); 4] = [
        ("jdk/", None, 0o755),
        ("jdk/bin/", None, 0o755),
        ("jdk/bin/java", Some("#!ELF fak"), 0o755),
        ("jdk/release", Some(&release), 0o644),
    ];
    for (name, contents, mode) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_mode(mode);
        match contents {
            Some(data) => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_size(data.len() as u64);
                builder
                    .append_data(&mut header, name, data.as_bytes())
                    .unwrap();
            }
            None => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_size(0);
                builder
                    .append_data(&mut header, name, std::io::empty())
                    .unwrap();
            }
        }
    }
    builder.into_inner().unwrap().finish().unwrap();
}

#[test]
fn archive_install_produces_verified_runtime() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("jre.tar.gz");
    build_archive(&archive, "21.0.1");

    let store = JavaStore::new(dir.path().join("store"));
    let runtime = store
        .install_archive(PLATFORM, "java-runtime-gamma", &archive, None, Map::new(), &prober())
        .unwrap();

    assert_eq!(runtime.version(), "21.0.1");
    assert!(runtime.is_managed());
    // the archive root is unwrapped: contents sit directly in the
    // installation directory
    assert!(runtime
        .binary()
        .ends_with("linux-x86_64/java-runtime-gamma/bin/java"));

    store.verify(PLATFORM, "java-runtime-gamma").unwrap();
    assert_eq!(store.list(PLATFORM).len(), 1);
}

#[test]
fn reinstalling_the_same_archive_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("jre.tar.gz");
    build_archive(&archive, "21.0.1");

    let store = JavaStore::new(dir.path().join("store"));
    store
        .install_archive(PLATFORM, "jre", &archive, None, Map::new(), &prober())
        .unwrap();
    let first = JavaManifest::load(&store.manifest_path(PLATFORM, "jre")).unwrap();

    store
        .install_archive(PLATFORM, "jre", &archive, None, Map::new(), &prober())
        .unwrap();
    let second = JavaManifest::load(&store.manifest_path(PLATFORM, "jre")).unwrap();

    assert_eq!(first.files, second.files);
    assert_eq!(first, second);
}

#[test]
fn manifest_file_uses_the_documented_shape() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("jre.tar.gz");
    build_archive(&archive, "17.0.2");

    let store = JavaStore::new(dir.path().join("store"));
    store
        .install_archive(PLATFORM, "jre", &archive, None, Map::new(), &prober())
        .unwrap();

    let raw = std::fs::read(store.manifest_path(PLATFORM, "jre")).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(json["os"], "linux");
    assert_eq!(json["arch"], "x86_64");
    assert_eq!(json["version"], "17.0.2");
    assert_eq!(json["files"]["bin"]["type"], "directory");
    assert_eq!(json["files"]["bin/java"]["type"], "file");
    assert_eq!(json["files"]["bin/java"]["size"], 9);
    let sha1 = json["files"]["bin/java"]["sha1"].as_str().unwrap();
    assert_eq!(sha1.len(), 40);
}
