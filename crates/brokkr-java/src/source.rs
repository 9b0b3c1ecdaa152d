//! Content sources for runtime installation
//!
//! A source yields a stream of relative entries (files, directories, links)
//! in an order where parents precede children. [`TarGzSource`] reads a
//! vendor `.tar.gz` archive and unwraps its single root directory;
//! [`DirSource`] walks an already-extracted tree.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use walkdir::WalkDir;

use brokkr_core::{Error, Result};

/// What one source entry is
pub enum EntryKind<'a> {
    File {
        executable: bool,
        reader: Box<dyn Read + 'a>,
    },
    Directory,
    Link {
        target: String,
    },
}

/// One entry of a source tree. `path` is relative and slash-separated.
pub struct SourceEntry<'a> {
    pub path: String,
    pub kind: EntryKind<'a>,
}

/// A tree of files to install into a runtime directory
pub trait SourceTree {
    /// Visit every entry in order, parents before children
    fn visit(&mut self, f: &mut dyn FnMut(SourceEntry<'_>) -> Result<()>) -> Result<()>;
}

/// A gzip-compressed tar archive expected to contain exactly one top-level
/// directory, which is stripped from every entry path
pub struct TarGzSource {
    archive: PathBuf,
}

impl TarGzSource {
    pub fn new(archive: impl Into<PathBuf>) -> Self {
        Self {
            archive: archive.into(),
        }
    }
}

impl SourceTree for TarGzSource {
    fn visit(&mut self, f: &mut dyn FnMut(SourceEntry<'_>) -> Result<()>) -> Result<()> {
        let file = File::open(&self.archive).map_err(|_| Error::not_found(&self.archive))?;
        let mut tar = tar::Archive::new(GzDecoder::new(file));
        let mut root: Option<String> = None;

        for entry in tar.entries()? {
            let mut entry = entry?;
            let raw = entry.path()?.into_owned();
            let mut components = raw
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned());
            let Some(first) = components.next() else {
                continue;
            };
            match &root {
                None => root = Some(first),
                Some(existing) if *existing != first => {
                    return Err(Error::archive(format!(
                        "expected a single root directory, found both {existing:?} and {first:?}"
                    )));
                }
                Some(_) => {}
            }
            let relative: String = components.collect::<Vec<_>>().join("/");

            let header = entry.header();
            let kind = if header.entry_type().is_dir() {
                if relative.is_empty() {
                    // the root itself becomes the target directory
                    continue;
                }
                EntryKind::Directory
            } else if header.entry_type().is_symlink() {
                let target = entry
                    .link_name()?
                    .ok_or_else(|| Error::archive(format!("link {raw:?} has no target")))?
                    .to_string_lossy()
                    .into_owned();
                EntryKind::Link { target }
            } else if header.entry_type().is_file() {
                if relative.is_empty() {
                    return Err(Error::archive(format!(
                        "expected a single root directory, found file {raw:?}"
                    )));
                }
                let executable = header.mode().map(|m| m & 0o111 != 0).unwrap_or(false);
                EntryKind::File {
                    executable,
                    reader: Box::new(&mut entry),
                }
            } else {
                // pax headers and other metadata entries
                continue;
            };

            f(SourceEntry {
                path: relative,
                kind,
            })?;
        }

        if root.is_none() {
            return Err(Error::archive("archive is empty"));
        }
        Ok(())
    }
}

/// A directory tree on disk, visited depth-first with sorted names
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn relative(&self, path: &Path) -> Result<String> {
        let rel = path
            .strip_prefix(&self.root)
            .map_err(|_| Error::archive(format!("{path:?} escapes the source root")))?;
        Ok(rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"))
    }
}

impl SourceTree for DirSource {
    fn visit(&mut self, f: &mut dyn FnMut(SourceEntry<'_>) -> Result<()>) -> Result<()> {
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name();
        for entry in walker {
            let entry = entry.map_err(|e| Error::archive(e.to_string()))?;
            let path = self.relative(entry.path())?;
            let file_type = entry.file_type();
            let kind = if file_type.is_symlink() {
                let target = std::fs::read_link(entry.path())?
                    .to_string_lossy()
                    .into_owned();
                EntryKind::Link { target }
            } else if file_type.is_dir() {
                EntryKind::Directory
            } else {
                let executable = is_executable(entry.path())?;
                EntryKind::File {
                    executable,
                    reader: Box::new(File::open(entry.path())?),
                }
            };
            f(SourceEntry { path, kind })?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> Result<bool> {
    use std::os::unix::fs::PermissionsExt;
    let mode = std::fs::symlink_metadata(path)?.permissions().mode();
    Ok(mode & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> Result<bool> {
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_archive(path: &Path, entries: &[(&str, Option<&str>)]) {
        let file = File::create(path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        for (name, contents) in entries {
            let mut header = tar::Header::new_gnu();
            match contents {
                Some(data) => {
                    header.set_entry_type(tar::EntryType::Regular);
                    header.set_size(data.len() as u64);
                    header.set_mode(0o755);
                    header.set_cksum();
                    builder.append_data(&mut header, name, data.as_bytes()).unwrap();
                }
                None => {
                    header.set_entry_type(tar::EntryType::Directory);
                    header.set_size(0);
                    header.set_mode(0o755);
                    header.set_cksum();
                    builder.append_data(&mut header, name, std::io::empty()).unwrap();
                }
            }
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    fn collect(source: &mut dyn SourceTree) -> Result<Vec<String>> {
        let mut paths = Vec::new();
        source.visit(&mut |entry| {
            paths.push(entry.path);
            Ok(())
        })?;
        Ok(paths)
    }

    #[test]
    fn test_targz_unwraps_root() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("jdk.tar.gz");
        write_archive(
            &archive,
            &[
                ("jdk-21/", None),
                ("jdk-21/bin/", None),
                ("jdk-21/bin/java", Some("#!ELF")),
                ("jdk-21/release", Some("JAVA_VERSION=\"21\"\n")),
            ],
        );
        let mut source = TarGzSource::new(&archive);
        let paths = collect(&mut source).unwrap();
        assert_eq!(paths, vec!["bin", "bin/java", "release"]);
    }

    #[test]
    fn test_targz_rejects_two_roots() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("bad.tar.gz");
        write_archive(
            &archive,
            &[("jdk-21/", None), ("other/", None)],
        );
        let mut source = TarGzSource::new(&archive);
        let err = collect(&mut source).unwrap_err();
        assert!(matches!(err, Error::Archive { .. }));
    }

    #[test]
    fn test_targz_rejects_top_level_file() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("bad.tar.gz");
        write_archive(&archive, &[("README", Some("hi"))]);
        let mut source = TarGzSource::new(&archive);
        let err = collect(&mut source).unwrap_err();
        assert!(matches!(err, Error::Archive { .. }));
    }

    #[test]
    fn test_dir_source_parents_first() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("bin")).unwrap();
        std::fs::write(dir.path().join("bin/java"), b"x").unwrap();
        std::fs::write(dir.path().join("release"), b"JAVA_VERSION=\"21\"\n").unwrap();
        let mut source = DirSource::new(dir.path());
        let paths = collect(&mut source).unwrap();
        assert_eq!(paths, vec!["bin", "bin/java", "release"]);
    }
}
