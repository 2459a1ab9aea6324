//! Archive listing and extraction.
//!
//! [`Archiver`] reads an archive through the in-process library for its
//! extension first. When the content belongs to a different archive format
//! than the name claims, it retries once under the detected extension. Any
//! remaining library failure, a contained panic included, falls back to the
//! system archiver for that extension (see [`crate::system`]).
//!
//! ```no_run
//! use arcsniff_core::archive::Archiver;
//! use std::path::Path;
//!
//! let archiver = Archiver::new();
//! // The upload was stored under a temporary name; the claimed name decides
//! // which reader is tried first.
//! let contents = archiver.list(Path::new("/tmp/upload-1234"), "GAME.ZIP")?;
//! for file in &contents.files {
//!     println!("{file}");
//! }
//! # Ok::<(), arcsniff_core::Error>(())
//! ```

pub mod charset;
pub mod extract;
mod library;
pub mod pkzip;
pub mod readme;

pub use extract::{ContentDirs, Extracted};
pub use readme::{readme, Finds, Usability};

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::magic::{self, registry, Signature};
use crate::system::{self, SystemTools, ToolRunner};
use library::{Kind, RawEntry};

/// Suffixes that name a compressed tarball as a whole.
const COMPOUND_EXTENSIONS: &[&str] = &[".tar.gz", ".tar.bz2", ".tar.xz", ".tar.zst"];

/// Configuration for an [`Archiver`].
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    /// Deadline for each external program run
    pub tool_timeout: Duration,
    /// Fall back to system archivers when the library fails
    pub system_tools: bool,
    /// Ask `file` when the registry cannot name an archive format
    pub magic_probe: bool,
    /// Maximum number of listed members (0 = unlimited)
    pub max_entries: usize,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            tool_timeout: system::DEFAULT_TIMEOUT,
            system_tools: true,
            magic_probe: true,
            max_entries: 0,
        }
    }
}

impl ArchiveConfig {
    /// Creates a new archive config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the deadline for external programs
    pub fn tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Enables or disables the system archiver fallback
    pub fn system_tools(mut self, enabled: bool) -> Self {
        self.system_tools = enabled;
        self
    }

    /// Enables or disables the `file` probe
    pub fn magic_probe(mut self, enabled: bool) -> Self {
        self.magic_probe = enabled;
        self
    }

    /// Sets the maximum number of listed members
    pub fn max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }
}

/// Which path produced a [`Contents`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// An in-process library
    Library,
    /// The named system program
    Tool(&'static str),
}

/// Members of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contents {
    /// Member file names in archive order. Extraction reports the members
    /// it wrote, as paths relative to the destination.
    pub files: Vec<String>,
    /// Extension the archive was finally read as
    pub ext: String,
    /// Signature detected from the content
    pub format: Signature,
    /// Which path produced the result
    pub backend: Backend,
}

impl Contents {
    /// Number of member files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True when the archive holds no files
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The member that best describes the archive
    pub fn readme(&self, archive_name: &str) -> Option<String> {
        readme::readme(archive_name, &self.files)
    }
}

/// Lists and extracts archives.
#[derive(Debug)]
pub struct Archiver {
    config: ArchiveConfig,
    runner: ToolRunner,
    tools: SystemTools,
}

impl Default for Archiver {
    fn default() -> Self {
        Self::new()
    }
}

impl Archiver {
    /// Creates an archiver with the default configuration and system tools
    pub fn new() -> Self {
        Self::with_config(ArchiveConfig::default())
    }

    /// Creates an archiver with a custom configuration
    pub fn with_config(config: ArchiveConfig) -> Self {
        Self {
            runner: ToolRunner::new(config.tool_timeout),
            tools: SystemTools::default(),
            config,
        }
    }

    /// Replaces the system readers used for fallback
    pub fn with_tools(mut self, tools: SystemTools) -> Self {
        self.tools = tools;
        self
    }

    /// The active configuration
    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// List the member files of `src`, which was uploaded as `filename`.
    pub fn list(&self, src: &Path, filename: &str) -> Result<Contents> {
        check_source(src)?;
        let format = magic::find_path(src)?;
        let ext = self.resolve_ext(src, filename, format)?;

        let library = Kind::from_ext(&ext)
            .ok_or_else(|| Error::unsupported(filename))
            .and_then(|kind| library::list(src, kind, filename));
        self.listing(src, ext, format, library)
    }

    /// Turn the library's listing, or its failure, into [`Contents`].
    fn listing(
        &self,
        src: &Path,
        ext: String,
        format: Signature,
        library: Result<Vec<RawEntry>>,
    ) -> Result<Contents> {
        let (entries, backend) = match library {
            Ok(raw) => (raw.into_iter().map(decode).collect(), Backend::Library),
            Err(e) => {
                let (program, names) = self.fallback(src, &ext, e, |reader| {
                    reader.list(&self.runner, src)
                })?;
                let names = names.into_iter().map(|name| (name, false)).collect();
                (names, Backend::Tool(program))
            }
        };

        let files = self.normalize(entries);
        debug!(
            path = %src.display(),
            ext = %ext,
            backend = ?backend,
            files = files.len(),
            "Listed archive"
        );
        Ok(Contents {
            files,
            ext,
            format,
            backend,
        })
    }

    /// Extract `targets` from `src` into `dest`. An empty target list
    /// extracts everything; named targets are written without their
    /// directories.
    ///
    /// The result lists the member files this call wrote, relative to
    /// `dest`. Files already in `dest` are not reported.
    pub fn extract(
        &self,
        src: &Path,
        filename: &str,
        dest: &Path,
        targets: &[&str],
    ) -> Result<Contents> {
        check_source(src)?;
        prepare_dest(dest)?;
        let format = magic::find_path(src)?;
        let ext = self.resolve_ext(src, filename, format)?;

        let legacy = if ext == ".zip" && self.config.system_tools {
            pkzip::legacy_methods(src)
        } else {
            Vec::new()
        };
        let (files, backend) = if legacy.is_empty() {
            let library = Kind::from_ext(&ext)
                .ok_or_else(|| Error::unsupported(filename))
                .and_then(|kind| library::extract(src, kind, filename, dest, targets));
            match library {
                Ok(files) => (files, Backend::Library),
                Err(e) => {
                    let (program, files) = self.fallback(src, &ext, e, |reader| {
                        self.tool_extract(reader, src, filename, dest, targets)
                    })?;
                    (files, Backend::Tool(program))
                }
            }
        } else {
            debug!(
                path = %src.display(),
                methods = ?legacy,
                "Legacy zip methods, extracting with unzip"
            );
            let names: Vec<_> = legacy.iter().map(|m| pkzip::method_name(*m)).collect();
            let reason = Error::library(
                "zip",
                format!("needs a system tool for {}", names.join(", ")),
            );
            let (program, files) = self.fallback(src, &ext, reason, |reader| {
                self.tool_extract(reader, src, filename, dest, targets)
            })?;
            (files, Backend::Tool(program))
        };

        debug!(
            path = %src.display(),
            dest = %dest.display(),
            backend = ?backend,
            files = files.len(),
            "Extracted archive"
        );
        Ok(Contents {
            files,
            ext,
            format,
            backend,
        })
    }

    /// Extract with a system reader, then report the members it wrote from
    /// the reader's own listing.
    fn tool_extract(
        &self,
        reader: &dyn system::SystemArchiveReader,
        src: &Path,
        filename: &str,
        dest: &Path,
        targets: &[&str],
    ) -> Result<Vec<String>> {
        if !reader.can_extract() {
            return Err(Error::unsupported(filename));
        }
        reader.extract(&self.runner, src, targets, dest)?;
        let names = reader.list(&self.runner, src)?;
        Ok(written_members(names, targets))
    }

    /// Extract every member of `src` into `dest`.
    pub fn extract_all(&self, src: &Path, filename: &str, dest: &Path) -> Result<Contents> {
        self.extract(src, filename, dest, &[])
    }

    /// Extract every member into a fresh temporary directory, removed when
    /// the returned handle drops or when extraction fails.
    pub fn extract_source(&self, src: &Path, filename: &str) -> Result<(TempDir, Contents)> {
        let dir = tempfile::Builder::new()
            .prefix("arcsniff-")
            .tempdir()
            .map_err(|e| Error::directory_create(std::env::temp_dir(), e))?;
        let contents = self.extract_all(src, filename, dir.path())?;
        Ok((dir, contents))
    }

    /// The archive extension the content of `src` actually calls for.
    ///
    /// The registry decides first. When it finds no archive signature and
    /// the probe is enabled, the `file` utility gets a say.
    pub fn magic_ext(&self, src: &Path) -> Option<&'static str> {
        match magic::find_path(src) {
            Ok(format) => self.ext_for(src, format),
            Err(e) => {
                debug!(path = %src.display(), error = %e, "Could not identify source");
                None
            }
        }
    }

    fn ext_for(&self, src: &Path, format: Signature) -> Option<&'static str> {
        if format == Signature::Pksfx {
            return Some(".zip");
        }
        if registry::archives().contains(&format) {
            return format.canonical_ext();
        }
        if !(self.config.magic_probe && self.config.system_tools) {
            return None;
        }
        match system::file::probe(&self.runner, src) {
            Ok(ext) => ext,
            Err(e) => {
                debug!(path = %src.display(), error = %e, "file probe failed");
                None
            }
        }
    }

    /// Extension to read `src` under: the claimed one unless the content
    /// contradicts it, in which case the detected one.
    fn resolve_ext(&self, src: &Path, filename: &str, format: Signature) -> Result<String> {
        // A self-extractor is a zip behind a DOS stub
        if format == Signature::Pksfx {
            return Ok(".zip".to_string());
        }
        let Some(claimed) = archive_ext(filename) else {
            return self
                .ext_for(src, format)
                .map(str::to_owned)
                .ok_or_else(|| Error::unsupported(filename));
        };
        match check_ext(filename, &claimed, format) {
            Ok(()) => Ok(claimed),
            Err(mismatch) => match self.ext_for(src, format) {
                Some(corrected) => {
                    warn!(%mismatch, corrected, "Retrying under the detected extension");
                    Ok(corrected.to_string())
                }
                None => Err(mismatch),
            },
        }
    }

    /// Run the system reader for `ext` after the library failed with
    /// `library`.
    fn fallback<T>(
        &self,
        src: &Path,
        ext: &str,
        library: Error,
        run: impl FnOnce(&dyn system::SystemArchiveReader) -> Result<T>,
    ) -> Result<(&'static str, T)> {
        if !library.triggers_fallback() || !self.config.system_tools {
            return Err(library);
        }
        debug!(path = %src.display(), ext, error = %library, "Library failed, trying system tool");
        let tool = match self.tools.for_ext(ext) {
            Some(reader) => run(reader).map(|value| (reader.program(), value)),
            None => Err(Error::unsupported(ext)),
        };
        tool.map_err(|tool| Error::Fallback {
            path: src.to_path_buf(),
            format: ext.to_string(),
            library: Box::new(library),
            tool: Box::new(tool),
        })
    }

    fn normalize(&self, entries: Vec<(String, bool)>) -> Vec<String> {
        let limit = match self.config.max_entries {
            0 => usize::MAX,
            n => n,
        };
        entries
            .into_iter()
            .filter(|(name, is_dir)| is_member(name, *is_dir))
            .map(|(name, _)| name)
            .take(limit)
            .collect()
    }
}

/// A named file rather than a directory or a blank line.
fn is_member(name: &str, is_dir: bool) -> bool {
    !is_dir && !name.trim().is_empty() && !name.ends_with('/') && !name.ends_with('\\')
}

fn decode(entry: RawEntry) -> (String, bool) {
    (charset::decode(&entry.name), entry.is_dir)
}

/// An archive detected under an extension none of its signatures claim.
fn check_ext(filename: &str, ext: &str, format: Signature) -> Result<()> {
    if !registry::archives().contains(&format) {
        return Ok(());
    }
    // Compound tarball suffixes are judged by their outer compression
    let outer = ext.rsplit('.').next().unwrap_or(ext);
    if registry::extension_candidates(outer).contains(&format) {
        return Ok(());
    }
    Err(Error::ExtensionMismatch {
        filename: filename.to_string(),
        detected: format.name().to_string(),
    })
}

fn check_source(src: &Path) -> Result<()> {
    match fs::metadata(src) {
        Ok(meta) if meta.is_dir() => Err(Error::SourceIsDirectory {
            path: src.to_path_buf(),
        }),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::SourceMissing {
            path: src.to_path_buf(),
        }),
        Err(e) => Err(Error::file_read(src, e)),
    }
}

fn prepare_dest(dest: &Path) -> Result<()> {
    if dest.exists() && !dest.is_dir() {
        return Err(Error::destination(dest, "exists and is not a directory"));
    }
    fs::create_dir_all(dest).map_err(|e| Error::directory_create(dest, e))
}

/// Members a system tool wrote for `targets`, as named in its listing.
/// Targeted extraction junks directories, so only base names remain.
fn written_members(names: Vec<String>, targets: &[&str]) -> Vec<String> {
    let mut files: Vec<String> = Vec::new();
    for name in names {
        let wanted = targets.is_empty() || targets.contains(&name.as_str());
        if !wanted || !is_member(&name, false) {
            continue;
        }
        let name = if targets.is_empty() {
            name.replace('\\', "/")
        } else {
            name.rsplit(|c: char| c == '/' || c == '\\')
                .next()
                .unwrap_or(&name)
                .to_string()
        };
        if !files.contains(&name) {
            files.push(name);
        }
    }
    files
}

/// Lowercase, dotted archive extension of `filename`, treating
/// `.tar.gz` and friends as one extension.
pub fn archive_ext(filename: &str) -> Option<String> {
    let lower = filename.to_ascii_lowercase();
    COMPOUND_EXTENSIONS
        .iter()
        .find(|ext| lower.len() > ext.len() && lower.ends_with(*ext))
        .map(|ext| ext.to_string())
        .or_else(|| registry::extension_of(filename))
}

/// Replace the trailing extension of `filename` with `new_ext`.
///
/// The base name and any directory part are preserved. An empty `new_ext`
/// strips the extension. A name without an extension, a dotfile included,
/// gets `new_ext` appended.
pub fn rename(new_ext: &str, filename: &str) -> String {
    let new_ext = registry::normalize_ext(new_ext);
    let split = filename
        .rfind(|c: char| c == '/' || c == '\\')
        .map_or(0, |i| i + 1);
    let (dir, base) = filename.split_at(split);
    let stem = match base.rfind('.') {
        Some(dot) if dot > 0 => &base[..dot],
        _ => base,
    };
    format!("{dir}{stem}{new_ext}")
}
