//! Materializing source trees and verifying installed files

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;
use sha1::{Digest, Sha1};
use tracing::warn;

use brokkr_core::{Error, Result};

use crate::manifest::FileEntry;
use crate::source::{EntryKind, SourceTree};

/// Materialize every entry of `source` under `target`, returning the file
/// table for the installation manifest in visit order.
///
/// Entry paths are rejected if they are absolute or contain `..`, so a
/// hostile archive cannot write outside `target`. On non-Unix hosts links
/// are recorded in the table but not created on disk.
pub fn install_tree(
    source: &mut dyn SourceTree,
    target: &Path,
) -> Result<IndexMap<String, FileEntry>> {
    fs::create_dir_all(target)?;
    let mut files = IndexMap::new();

    source.visit(&mut |entry| {
        let dest = resolve_entry_path(target, &entry.path)?;
        let recorded = match entry.kind {
            EntryKind::Directory => {
                fs::create_dir_all(&dest)?;
                FileEntry::Directory
            }
            EntryKind::File {
                executable,
                mut reader,
            } => {
                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent)?;
                }
                let (sha1, size) = write_hashed(&mut *reader, &dest)?;
                if executable {
                    set_executable(&dest)?;
                }
                FileEntry::File { sha1, size }
            }
            EntryKind::Link { target: link } => {
                materialize_link(&dest, &link)?;
                FileEntry::Link { target: link }
            }
        };
        files.insert(entry.path, recorded);
        Ok(())
    })?;

    Ok(files)
}

/// Check every entry of a manifest's file table against the installed tree.
/// The first mismatching file is deleted before the error is returned, so a
/// later repair pass re-downloads it.
pub fn verify_files(root: &Path, files: &IndexMap<String, FileEntry>) -> Result<()> {
    for (path, entry) in files {
        let on_disk = resolve_entry_path(root, path)?;
        match entry {
            FileEntry::Directory => {
                if !on_disk.is_dir() {
                    return Err(Error::not_found(on_disk));
                }
            }
            FileEntry::Link { .. } => {
                if fs::symlink_metadata(&on_disk).is_err() {
                    return Err(Error::not_found(on_disk));
                }
            }
            FileEntry::File { sha1, size } => {
                let metadata = fs::metadata(&on_disk).map_err(|_| Error::not_found(&on_disk))?;
                let actual = sha1_file(&on_disk)?;
                if metadata.len() != *size || &actual != sha1 {
                    if let Err(e) = fs::remove_file(&on_disk) {
                        warn!(path = %on_disk.display(), error = %e, "failed to remove corrupt file");
                    }
                    return Err(Error::ChecksumMismatch {
                        path: on_disk,
                        expected: sha1.clone(),
                        actual,
                    });
                }
            }
        }
    }
    Ok(())
}

/// SHA-1 digest of a file as lowercase hex
pub fn sha1_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha1::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

fn resolve_entry_path(root: &Path, relative: &str) -> Result<PathBuf> {
    let path = Path::new(relative);
    let safe = path.components().all(|c| matches!(c, Component::Normal(_)));
    if relative.is_empty() || !safe {
        return Err(Error::archive(format!("unsafe entry path {relative:?}")));
    }
    Ok(root.join(path))
}

fn write_hashed(reader: &mut dyn Read, dest: &Path) -> Result<(String, u64)> {
    let mut out = File::create(dest)?;
    let mut hasher = Sha1::new();
    let mut size: u64 = 0;
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        out.write_all(&buf[..n])?;
        size += n as u64;
    }
    Ok((hex::encode(hasher.finalize()), size))
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o755);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn materialize_link(dest: &Path, target: &str) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    if fs::symlink_metadata(dest).is_ok() {
        fs::remove_file(dest)?;
    }
    std::os::unix::fs::symlink(target, dest)?;
    Ok(())
}

#[cfg(not(unix))]
fn materialize_link(_dest: &Path, _target: &str) -> Result<()> {
    Ok(())
}
