//! In-process archive readers.
//!
//! Each backend crate is called inside [`guarded`], which turns a panic in
//! third-party decoding code into [`Error::LibraryPanic`] so the caller can
//! still fall back to a system tool.

use std::any::Any;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use sevenz_rust::{Password, SevenZReader};
use tracing::{debug, trace};

use super::charset;
use super::extract::safe_join;
use crate::error::{Error, Result};

/// Compression wrapped around a tar stream or a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Codec {
    None,
    Gzip,
    Bzip2,
    Xz,
    Zstd,
}

impl Codec {
    fn wrap(self, reader: impl Read + 'static) -> Result<Box<dyn Read>> {
        Ok(match self {
            Codec::None => Box::new(reader),
            Codec::Gzip => Box::new(flate2::read::MultiGzDecoder::new(reader)),
            Codec::Bzip2 => Box::new(bzip2::read::MultiBzDecoder::new(reader)),
            Codec::Xz => Box::new(xz2::read::XzDecoder::new_multi_decoder(reader)),
            Codec::Zstd => Box::new(
                zstd::stream::read::Decoder::new(reader).map_err(|e| Error::library("zstd", e))?,
            ),
        })
    }

    fn name(self) -> &'static str {
        match self {
            Codec::None => "tar",
            Codec::Gzip => "gzip",
            Codec::Bzip2 => "bzip2",
            Codec::Xz => "xz",
            Codec::Zstd => "zstd",
        }
    }
}

/// Which backend reads an extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    Zip,
    Tar(Codec),
    Stream(Codec),
    SevenZip,
}

impl Kind {
    /// Backend for a lowercase, dotted extension as returned by
    /// [`super::archive_ext`].
    pub(crate) fn from_ext(ext: &str) -> Option<Self> {
        Some(match ext {
            ".zip" => Kind::Zip,
            ".7z" => Kind::SevenZip,
            ".tar" => Kind::Tar(Codec::None),
            ".tar.gz" | ".tgz" => Kind::Tar(Codec::Gzip),
            ".tar.bz2" | ".tbz2" | ".tbz" => Kind::Tar(Codec::Bzip2),
            ".tar.xz" | ".txz" => Kind::Tar(Codec::Xz),
            ".tar.zst" | ".tzst" => Kind::Tar(Codec::Zstd),
            ".gz" => Kind::Stream(Codec::Gzip),
            ".bz2" => Kind::Stream(Codec::Bzip2),
            ".xz" => Kind::Stream(Codec::Xz),
            ".zst" => Kind::Stream(Codec::Zstd),
            _ => return None,
        })
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Kind::Zip => "zip",
            Kind::SevenZip => "7z",
            Kind::Tar(codec) | Kind::Stream(codec) => codec.name(),
        }
    }
}

/// A member as the backend reports it, before name repair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawEntry {
    pub(crate) name: Vec<u8>,
    pub(crate) is_dir: bool,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Run a backend call, converting a panic into an error.
pub(crate) fn guarded<T>(format: &str, call: impl FnOnce() -> Result<T>) -> Result<T> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            debug!(format, %message, "Archive library panicked");
            Err(Error::LibraryPanic {
                format: format.to_string(),
                message,
            })
        }
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| Error::file_read(path, e))
}

/// Name of the single member inside a compressed stream: the claimed
/// filename with its compression suffix removed.
pub(crate) fn stream_member(filename: &str) -> String {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    match name.rfind('.') {
        Some(dot) if dot > 0 => name[..dot].to_string(),
        _ => format!("{name}.out"),
    }
}

/// List the members of `path` with the backend for `kind`.
pub(crate) fn list(path: &Path, kind: Kind, filename: &str) -> Result<Vec<RawEntry>> {
    trace!(path = %path.display(), format = kind.name(), "Listing with library");
    guarded(kind.name(), || match kind {
        Kind::Zip => list_zip(path),
        Kind::Tar(codec) => list_tar(path, codec),
        Kind::Stream(codec) => {
            // Decode the first block to prove the stream is what it claims.
            let mut head = codec.wrap(BufReader::new(open(path)?))?.take(512);
            io::copy(&mut head, &mut io::sink()).map_err(|e| Error::library(codec.name(), e))?;
            Ok(vec![RawEntry {
                name: stream_member(filename).into_bytes(),
                is_dir: false,
            }])
        }
        Kind::SevenZip => list_7z(path),
    })
}

fn list_zip(path: &Path) -> Result<Vec<RawEntry>> {
    let mut archive =
        zip::ZipArchive::new(BufReader::new(open(path)?)).map_err(|e| Error::library("zip", e))?;
    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let file = archive
            .by_index_raw(i)
            .map_err(|e| Error::library("zip", e))?;
        entries.push(RawEntry {
            name: file.name_raw().to_vec(),
            is_dir: file.is_dir(),
        });
    }
    Ok(entries)
}

fn list_tar(path: &Path, codec: Codec) -> Result<Vec<RawEntry>> {
    let reader = codec.wrap(BufReader::new(open(path)?))?;
    let mut archive = tar::Archive::new(reader);
    let mut entries = Vec::new();
    for entry in archive.entries().map_err(|e| Error::library("tar", e))? {
        let entry = entry.map_err(|e| Error::library("tar", e))?;
        entries.push(RawEntry {
            name: entry.path_bytes().into_owned(),
            is_dir: entry.header().entry_type().is_dir(),
        });
    }
    Ok(entries)
}

fn list_7z(path: &Path) -> Result<Vec<RawEntry>> {
    let reader = SevenZReader::open(path, Password::empty()).map_err(|e| Error::library("7z", e))?;
    Ok(reader
        .archive()
        .files
        .iter()
        .map(|f| RawEntry {
            name: f.name().as_bytes().to_vec(),
            is_dir: f.is_directory(),
        })
        .collect())
}

/// Output path for a member. Targeted extraction drops directories, full
/// extraction keeps them.
fn member_path(dest: &Path, name: &str, junk_paths: bool) -> Result<PathBuf> {
    if junk_paths {
        let base = Path::new(name)
            .file_name()
            .ok_or_else(|| Error::path_traversal(name))?;
        safe_join(dest, Path::new(base))
    } else {
        safe_join(dest, Path::new(name))
    }
}

fn write_member(out: &Path, reader: &mut dyn Read) -> Result<()> {
    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::directory_create(parent, e))?;
    }
    let mut file = File::create(out).map_err(|e| Error::file_write(out, e))?;
    io::copy(reader, &mut file).map_err(|e| Error::file_write(out, e))?;
    Ok(())
}

fn wanted(targets: &[&str], name: &str) -> bool {
    targets.is_empty() || targets.contains(&name)
}

/// Records `out` as a written member, relative to `dest` with forward
/// slashes. Junked targets that share a base name are recorded once.
fn record(written: &mut Vec<String>, dest: &Path, out: &Path) {
    let rel = out.strip_prefix(dest).unwrap_or(out);
    let name = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    if !written.contains(&name) {
        written.push(name);
    }
}

/// Extract `targets` (or everything, when empty) from `path` into `dest`,
/// returning the written member files in archive order.
pub(crate) fn extract(
    path: &Path,
    kind: Kind,
    filename: &str,
    dest: &Path,
    targets: &[&str],
) -> Result<Vec<String>> {
    debug!(
        path = %path.display(),
        format = kind.name(),
        dest = %dest.display(),
        targets = targets.len(),
        "Extracting with library"
    );
    guarded(kind.name(), || match kind {
        Kind::Zip => extract_zip(path, dest, targets),
        Kind::Tar(codec) => extract_tar(path, codec, dest, targets),
        Kind::Stream(codec) => {
            let member = stream_member(filename);
            if !wanted(targets, &member) {
                return Ok(Vec::new());
            }
            let mut reader = codec.wrap(BufReader::new(open(path)?))?;
            let out = safe_join(dest, Path::new(&member))?;
            write_member(&out, &mut reader)?;
            let mut written = Vec::with_capacity(1);
            record(&mut written, dest, &out);
            Ok(written)
        }
        Kind::SevenZip => extract_7z(path, dest, targets),
    })
}

fn extract_zip(path: &Path, dest: &Path, targets: &[&str]) -> Result<Vec<String>> {
    let mut archive =
        zip::ZipArchive::new(BufReader::new(open(path)?)).map_err(|e| Error::library("zip", e))?;
    let mut written = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(|e| Error::library("zip", e))?;
        let name = charset::decode(file.name_raw());
        if !wanted(targets, &name) {
            continue;
        }
        if file.is_dir() {
            if targets.is_empty() {
                let dir = safe_join(dest, Path::new(&name))?;
                fs::create_dir_all(&dir).map_err(|e| Error::directory_create(&dir, e))?;
            }
            continue;
        }
        let out = member_path(dest, &name, !targets.is_empty())?;
        write_member(&out, &mut file)?;
        record(&mut written, dest, &out);
    }
    Ok(written)
}

fn extract_tar(path: &Path, codec: Codec, dest: &Path, targets: &[&str]) -> Result<Vec<String>> {
    let reader = codec.wrap(BufReader::new(open(path)?))?;
    let mut archive = tar::Archive::new(reader);
    let mut written = Vec::new();
    for entry in archive.entries().map_err(|e| Error::library("tar", e))? {
        let mut entry = entry.map_err(|e| Error::library("tar", e))?;
        let kind = entry.header().entry_type();
        let name = charset::decode(&entry.path_bytes());
        if !wanted(targets, &name) {
            continue;
        }
        if kind.is_dir() {
            if targets.is_empty() {
                let dir = safe_join(dest, Path::new(&name))?;
                fs::create_dir_all(&dir).map_err(|e| Error::directory_create(&dir, e))?;
            }
            continue;
        }
        if !kind.is_file() {
            trace!(member = %name, "Skipping non-regular tar member");
            continue;
        }
        let out = member_path(dest, &name, !targets.is_empty())?;
        write_member(&out, &mut entry)?;
        record(&mut written, dest, &out);
    }
    Ok(written)
}

fn extract_7z(path: &Path, dest: &Path, targets: &[&str]) -> Result<Vec<String>> {
    let junk_paths = !targets.is_empty();
    let mut written = Vec::new();
    let mut failure = None;
    sevenz_rust::decompress_file_with_extract_fn(path, dest, |entry, reader, _| {
        if !wanted(targets, entry.name()) || (junk_paths && entry.is_directory()) {
            return Ok(true);
        }
        let out = match member_path(dest, entry.name(), junk_paths) {
            Ok(out) => out,
            Err(e) => {
                failure = Some(e);
                return Ok(false);
            }
        };
        if !entry.is_directory() {
            record(&mut written, dest, &out);
        }
        sevenz_rust::default_entry_extract_fn(entry, reader, &out)
    })
    .map_err(|e| Error::library("7z", e))?;
    match failure {
        Some(e) => Err(e),
        None => Ok(written),
    }
}
