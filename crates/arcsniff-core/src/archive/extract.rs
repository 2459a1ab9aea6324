//! Extraction targets.
//!
//! [`safe_join`] confines member names to the destination. [`ContentDirs`]
//! gives each source key one extraction directory that is populated at most
//! once. A completion marker records which source filled it.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, trace};

use super::Archiver;
use crate::error::{Error, Result};

/// File written into a completed extraction directory.
pub const MARKER: &str = ".arcsniff-complete";

const DIGEST_PREFIX: &str = "blake3:";

/// Join an archive member name onto `dest`, refusing anything that would
/// land outside it.
///
/// Backslashes are treated as separators since DOS archivers store them.
/// Absolute names, drive prefixes and `..` that climbs above `dest` are
/// [`Error::PathTraversal`].
pub(crate) fn safe_join(dest: &Path, rel: &Path) -> Result<PathBuf> {
    let name = rel.to_string_lossy().replace('\\', "/");
    let mut clean = PathBuf::new();
    for component in Path::new(&name).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !clean.pop() {
                    return Err(Error::path_traversal(rel));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::path_traversal(rel));
            }
        }
    }
    Ok(dest.join(clean))
}

/// Result of [`ContentDirs::extract_once`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// The populated directory
    pub dir: PathBuf,
    /// Member files relative to `dir`, in archive order
    pub files: Vec<String>,
    /// True when an earlier extraction of the same source was reused
    pub reused: bool,
}

/// Caller-owned cache of extraction directories under one root.
///
/// Concurrent calls for the same key serialize on a per-key lock. The
/// directory for a key only becomes visible once fully extracted.
#[derive(Debug)]
pub struct ContentDirs {
    root: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ContentDirs {
    /// Use `root` for extraction directories, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| Error::directory_create(&root, e))?;
        Ok(Self {
            root,
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// The cache root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for `key`. The key must be a single plain path component.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let mut components = Path::new(key).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) if !key.starts_with('.') => {
                Ok(self.root.join(part))
            }
            _ => Err(Error::path_traversal(key)),
        }
    }

    fn lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(key.to_string()).or_default())
    }

    /// Drop the map entry for `key` once no other caller holds its lock.
    fn release(&self, key: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        drop(lock);
        if locks.get(key).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(key);
        }
    }

    /// Extract `src` into the directory for `key`, unless a previous call
    /// already did so for the same source content.
    pub fn extract_once(
        &self,
        archiver: &Archiver,
        src: &Path,
        filename: &str,
        key: &str,
    ) -> Result<Extracted> {
        let dir = self.path_for(key)?;
        let lock = self.lock(key);
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.populate(archiver, src, filename, key, dir)
        };
        self.release(key, lock);
        result
    }

    fn populate(
        &self,
        archiver: &Archiver,
        src: &Path,
        filename: &str,
        key: &str,
        dir: PathBuf,
    ) -> Result<Extracted> {
        let digest = digest(src)?;
        if let Some(files) = read_marker(&dir, &digest) {
            debug!(key, dir = %dir.display(), "Reusing completed extraction");
            return Ok(Extracted {
                dir,
                files,
                reused: true,
            });
        }

        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&self.root)
            .map_err(|e| Error::directory_create(&self.root, e))?;
        let contents = archiver.extract_all(src, filename, staging.path())?;
        write_marker(staging.path(), &digest, &contents.files)?;

        if dir.exists() {
            trace!(dir = %dir.display(), "Replacing stale extraction");
            fs::remove_dir_all(&dir).map_err(|e| Error::file_write(&dir, e))?;
        }
        fs::rename(staging.path(), &dir).map_err(|e| Error::file_write(&dir, e))?;
        debug!(key, dir = %dir.display(), files = contents.files.len(), "Extraction complete");

        Ok(Extracted {
            dir,
            files: contents.files,
            reused: false,
        })
    }
}

/// blake3 of the file at `path`, tagged with the algorithm.
fn digest(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| Error::file_read(path, e))?;
    let mut hasher = blake3::Hasher::new();
    hasher
        .update_reader(BufReader::new(file))
        .map_err(|e| Error::file_read(path, e))?;
    Ok(format!("{DIGEST_PREFIX}{}", hasher.finalize().to_hex()))
}

/// Member list from a marker written for `digest`, or `None` when the
/// directory is missing, incomplete or from another source.
fn read_marker(dir: &Path, digest: &str) -> Option<Vec<String>> {
    let text = fs::read_to_string(dir.join(MARKER)).ok()?;
    let mut lines = text.lines();
    if lines.next()? != digest {
        return None;
    }
    Some(lines.map(str::to_owned).collect())
}

fn write_marker(dir: &Path, digest: &str, files: &[String]) -> Result<()> {
    let mut text = String::with_capacity(digest.len() + files.len() * 16);
    text.push_str(digest);
    text.push('\n');
    for file in files {
        text.push_str(file);
        text.push('\n');
    }
    let path = dir.join(MARKER);
    fs::write(&path, text).map_err(|e| Error::file_write(&path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_join_keeps_relative_names() {
        let dest = Path::new("out");
        assert_eq!(
            safe_join(dest, Path::new("docs/readme.txt")).unwrap(),
            dest.join("docs").join("readme.txt")
        );
        assert_eq!(
            safe_join(dest, Path::new("DOCS\\README.TXT")).unwrap(),
            dest.join("DOCS").join("README.TXT")
        );
        assert_eq!(
            safe_join(dest, Path::new("a/../b.txt")).unwrap(),
            dest.join("b.txt")
        );
    }

    #[test]
    fn test_safe_join_rejects_escapes() {
        let dest = Path::new("out");
        for name in ["../evil", "/etc/passwd", "a/../../evil", "..\\..\\AUTOEXEC.BAT"] {
            assert!(
                matches!(
                    safe_join(dest, Path::new(name)),
                    Err(Error::PathTraversal { .. })
                ),
                "{name} was accepted"
            );
        }
    }

    #[test]
    fn test_path_for_rejects_nested_keys() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = ContentDirs::new(dir.path()).unwrap();
        assert_eq!(dirs.path_for("file42").unwrap(), dir.path().join("file42"));
        assert!(dirs.path_for("a/b").is_err());
        assert!(dirs.path_for("..").is_err());
        assert!(dirs.path_for(".staging-x").is_err());
        assert!(dirs.path_for("").is_err());
    }

    #[test]
    fn test_marker_roundtrip_requires_same_digest() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec!["A.TXT".to_string(), "SUB/B.TXT".to_string()];
        write_marker(dir.path(), "blake3:abc", &files).unwrap();
        assert_eq!(read_marker(dir.path(), "blake3:abc"), Some(files));
        assert_eq!(read_marker(dir.path(), "blake3:def"), None);
        assert_eq!(read_marker(&dir.path().join("missing"), "blake3:abc"), None);
    }

    #[test]
    fn test_digest_tracks_content() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, b"one").unwrap();
        fs::write(&b, b"two").unwrap();
        let da = digest(&a).unwrap();
        assert!(da.starts_with(DIGEST_PREFIX));
        assert_ne!(da, digest(&b).unwrap());
        assert_eq!(da, digest(&a).unwrap());
    }

    #[test]
    fn test_lock_entries_are_released() {
        use crate::archive::ArchiveConfig;
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("notes.gz");
        let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(b"hello").unwrap();
        fs::write(&src, enc.finish().unwrap()).unwrap();

        let dirs = ContentDirs::new(dir.path().join("cache")).unwrap();
        let archiver = Archiver::with_config(ArchiveConfig::new().system_tools(false));
        for key in ["one", "two", "one"] {
            dirs.extract_once(&archiver, &src, "notes.gz", key).unwrap();
        }
        let missing = dir.path().join("missing.gz");
        assert!(dirs
            .extract_once(&archiver, &missing, "missing.gz", "three")
            .is_err());
        assert!(dirs.locks.lock().unwrap().is_empty());
    }
}
