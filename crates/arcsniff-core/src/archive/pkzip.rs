//! ZIP central directory scan.
//!
//! The first local header only describes the first member. Deciding whether
//! an archive needs a legacy decompressor means looking at every member, and
//! the central directory is the cheap place to do that.

use std::fs::File;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::magic::window::{self, ByteSource};

const EOCD: &[u8] = b"PK\x05\x06";
const CENTRAL: &[u8] = b"PK\x01\x02";
const EOCD_LEN: usize = 22;
const CENTRAL_LEN: u64 = 46;
/// EOCD plus the longest possible archive comment.
const EOCD_SEARCH: usize = EOCD_LEN + 0xffff;

/// Human readable name of a ZIP compression method.
pub fn method_name(method: u16) -> &'static str {
    match method {
        0 => "Stored",
        1 => "Shrunk",
        2 => "Reduced (factor 1)",
        3 => "Reduced (factor 2)",
        4 => "Reduced (factor 3)",
        5 => "Reduced (factor 4)",
        6 => "Imploded",
        8 => "Deflated",
        9 => "Deflate64",
        12 => "BZIP2",
        14 => "LZMA",
        93 => "Zstandard",
        95 => "XZ",
        98 => "PPMd",
        99 => "AES encrypted",
        _ => "Unknown",
    }
}

/// True for Shrink, Reduce and Implode, which modern readers lack.
pub fn is_legacy(method: u16) -> bool {
    (1..=6).contains(&method)
}

/// Distinct compression methods used by the members of a ZIP archive,
/// sorted ascending.
pub fn methods(path: &Path) -> Result<Vec<u16>> {
    let file = File::open(path).map_err(|e| Error::file_read(path, e))?;
    scan(&file).ok_or_else(|| Error::not_an_archive(path, "no readable zip central directory"))
}

/// Legacy compression methods used by any member. An unreadable central
/// directory yields none.
pub fn legacy_methods(path: &Path) -> Vec<u16> {
    match methods(path) {
        Ok(list) => list.into_iter().filter(|m| is_legacy(*m)).collect(),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Central directory scan failed");
            Vec::new()
        }
    }
}

/// Locate the end of central directory record and walk the entries.
pub(crate) fn scan(r: &dyn ByteSource) -> Option<Vec<u16>> {
    let size = r.size();
    let len = (size as usize).min(EOCD_SEARCH);
    let tail = window::up_to(r, size - len as u64, len);
    let at = tail.windows(EOCD.len()).rposition(|w| w == EOCD)?;
    let eocd = tail.get(at..at + EOCD_LEN)?;
    let count = u16::from_le_bytes([eocd[10], eocd[11]]);
    let offset = u32::from_le_bytes([eocd[16], eocd[17], eocd[18], eocd[19]]);
    if offset == u32::MAX {
        // ZIP64: the real offset lives in a separate record
        return None;
    }

    let mut methods = Vec::new();
    let mut pos = u64::from(offset);
    for _ in 0..count {
        let header = window::bytes(r, pos, CENTRAL_LEN as usize)?;
        if &header[..4] != CENTRAL {
            return None;
        }
        let method = u16::from_le_bytes([header[10], header[11]]);
        let name_len = u16::from_le_bytes([header[28], header[29]]);
        let extra_len = u16::from_le_bytes([header[30], header[31]]);
        let comment_len = u16::from_le_bytes([header[32], header[33]]);
        if !methods.contains(&method) {
            methods.push(method);
        }
        pos += CENTRAL_LEN + u64::from(name_len) + u64::from(extra_len) + u64::from(comment_len);
    }
    methods.sort_unstable();
    Some(methods)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn central(method: u16, name: &[u8]) -> Vec<u8> {
        let mut h = vec![0u8; CENTRAL_LEN as usize];
        h[..4].copy_from_slice(CENTRAL);
        h[10..12].copy_from_slice(&method.to_le_bytes());
        h[28..30].copy_from_slice(&(name.len() as u16).to_le_bytes());
        h.extend_from_slice(name);
        h
    }

    fn archive(methods: &[u16]) -> Vec<u8> {
        let mut data = b"local file data goes here".to_vec();
        let offset = data.len() as u32;
        for (i, m) in methods.iter().enumerate() {
            data.extend(central(*m, format!("FILE{i}.TXT").as_bytes()));
        }
        let mut eocd = vec![0u8; EOCD_LEN];
        eocd[..4].copy_from_slice(EOCD);
        eocd[10..12].copy_from_slice(&(methods.len() as u16).to_le_bytes());
        eocd[16..20].copy_from_slice(&offset.to_le_bytes());
        data.extend(eocd);
        data
    }

    #[test]
    fn test_scan_collects_distinct_methods() {
        assert_eq!(scan(&archive(&[8, 1, 8, 6])), Some(vec![1, 6, 8]));
    }

    #[test]
    fn test_scan_rejects_garbage() {
        assert_eq!(scan(&b"not a zip".to_vec()), None);
        let mut broken = archive(&[8]);
        broken[25] = b'X';
        assert_eq!(scan(&broken), None);
    }

    #[test]
    fn test_legacy_methods() {
        assert!(is_legacy(1));
        assert!(is_legacy(5));
        assert!(!is_legacy(8));
        assert_eq!(method_name(6), "Imploded");
    }

    #[test]
    fn test_methods_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.zip");
        std::fs::write(&path, archive(&[1, 0])).unwrap();
        assert_eq!(methods(&path).unwrap(), vec![0, 1]);
        assert_eq!(legacy_methods(&path), vec![1]);
    }
}
