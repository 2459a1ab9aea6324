//! Archive and compressed-stream matchers.
//!
//! ## ZIP disambiguation
//!
//! The first local file header decides the ZIP variant. Its layout:
//!
//! | Offset | Size | Field              |
//! |--------|------|--------------------|
//! | 0      | 4    | `PK\x03\x04`       |
//! | 4      | 2    | version needed     |
//! | 6      | 2    | general flags      |
//! | 8      | 2    | compression method |
//!
//! A version-needed of zero never occurs in a real archive and rejects
//! zero-filled buffers that happen to start with the magic.

use super::window::{self, ByteSource};

const ZIP_LOCAL: &[u8] = b"PK\x03\x04";
const ZIP_EOCD: &[u8] = b"PK\x05\x06";
const ZIP64_LOCATOR: &[u8] = b"PK\x06\x07";
const ZIP64_END: &[u8] = b"PK\x06\x06";
const ZIP_EOCD_LEN: usize = 22;
const ZIP64_LOCATOR_LEN: u64 = 20;
/// The end of central directory may be followed by a comment of up to 64 KiB.
const ZIP_TAIL_SCAN: usize = ZIP_EOCD_LEN + 0xffff;

/// Compression methods the in-process zip reader understands.
const MODERN_METHODS: &[u16] = &[0, 8, 9, 12, 14, 93, 95, 99];

/// The (version needed, method) pair of the first local file header.
fn zip_local_header(r: &dyn ByteSource) -> Option<(u16, u16)> {
    let header = window::array::<30>(r, 0)?;
    if &header[..4] != ZIP_LOCAL {
        return None;
    }
    let version = u16::from_le_bytes([header[4], header[5]]);
    if version == 0 {
        return None;
    }
    let method = u16::from_le_bytes([header[8], header[9]]);
    Some((version, method))
}

fn zip_method(r: &dyn ByteSource) -> Option<u16> {
    if has_zip64_end(r) {
        return None;
    }
    zip_local_header(r).map(|(_, method)| method)
}

/// Absolute offset of the last end of central directory record.
fn zip_eocd(r: &dyn ByteSource) -> Option<u64> {
    let size = r.size();
    let len = (size as usize).min(ZIP_TAIL_SCAN);
    let start = size - len as u64;
    let tail = window::up_to(r, start, len);
    let at = tail
        .windows(ZIP_EOCD.len())
        .enumerate()
        .rev()
        .find(|(at, w)| *w == ZIP_EOCD && at + ZIP_EOCD_LEN <= tail.len())
        .map(|(at, _)| at)?;
    Some(start + at as u64)
}

/// True when the end of central directory is preceded by a ZIP64 locator
/// that points at a ZIP64 end record.
fn has_zip64_end(r: &dyn ByteSource) -> bool {
    let Some(eocd) = zip_eocd(r) else {
        return false;
    };
    let Some(locator) = eocd.checked_sub(ZIP64_LOCATOR_LEN) else {
        return false;
    };
    let Some(record) = window::array::<20>(r, locator) else {
        return false;
    };
    if &record[..4] != ZIP64_LOCATOR {
        return false;
    }
    let mut offset = [0u8; 8];
    offset.copy_from_slice(&record[8..16]);
    window::equals_at(r, u64::from_le_bytes(offset), ZIP64_END)
}

/// ZIP using store, deflate, deflate64 or a modern method.
pub fn pkzip(r: &dyn ByteSource) -> bool {
    zip_method(r).is_some_and(|m| MODERN_METHODS.contains(&m))
}

/// ZIP using the Shrink (LZW) method.
pub fn pkzip_shrink(r: &dyn ByteSource) -> bool {
    zip_method(r) == Some(1)
}

/// ZIP using Reduce with compression factor 1 to 4.
pub fn pkzip_reduce(r: &dyn ByteSource) -> bool {
    zip_method(r).is_some_and(|m| (2..=5).contains(&m))
}

/// ZIP using the Implode method.
pub fn pkzip_implode(r: &dyn ByteSource) -> bool {
    zip_method(r) == Some(6)
}

/// ZIP carrying a ZIP64 end of central directory.
pub fn pkzip64(r: &dyn ByteSource) -> bool {
    zip_local_header(r).is_some() && has_zip64_end(r)
}

/// First volume of a spanned (`PK\x07\x08`) or split (`PK00`) archive.
pub fn pkzip_multi_volume(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"PK\x07\x08") || window::starts_with(r, b"PK00PK")
}

fn mz_with_tag(r: &dyn ByteSource, tag: &[u8]) -> bool {
    window::starts_with(r, b"MZ") && window::equals_at(r, 30, tag)
}

/// PKLITE compressed DOS executable.
pub fn pklite(r: &dyn ByteSource) -> bool {
    mz_with_tag(r, b"PKLITE")
}

/// PKZIP self-extracting DOS executable.
pub fn pksfx(r: &dyn ByteSource) -> bool {
    mz_with_tag(r, b"PKSFX")
}

/// RAR 1.5 to 4.x.
pub fn rar_v4(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"Rar!\x1a\x07\x00")
}

/// RAR 5.
pub fn rar_v5(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"Rar!\x1a\x07\x01\x00")
}

/// 7-Zip.
pub fn seven_zip(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"7z\xbc\xaf\x27\x1c")
}

/// bzip2, requiring a block or end-of-stream marker after the header.
pub fn bzip2(r: &dyn ByteSource) -> bool {
    let Some(head) = window::array::<10>(r, 0) else {
        return false;
    };
    &head[..3] == b"BZh"
        && (b'1'..=b'9').contains(&head[3])
        && (head[4..] == [0x31, 0x41, 0x59, 0x26, 0x53, 0x59]
            || head[4..] == [0x17, 0x72, 0x45, 0x38, 0x50, 0x90])
}

/// gzip at offset 0, or at offset 512 behind a DOS self-extracting stub.
pub fn gzip(r: &dyn ByteSource) -> bool {
    const MAGIC: &[u8] = &[0x1f, 0x8b, 0x08];
    if window::starts_with(r, MAGIC) {
        return true;
    }
    (window::starts_with(r, b"MZ") || window::starts_with(r, b"ZM"))
        && window::equals_at(r, 512, MAGIC)
}

/// XZ.
pub fn xz(r: &dyn ByteSource) -> bool {
    window::starts_with(r, &[0xfd, b'7', b'z', b'X', b'Z', 0x00])
}

/// Zstandard.
pub fn zstd(r: &dyn ByteSource) -> bool {
    window::starts_with(r, &[0x28, 0xb5, 0x2f, 0xfd])
}

/// FreeArc.
pub fn free_arc(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"ArC\x01")
}

/// Highest SEA ARC method byte (crunched with squeeze, type 9).
const ARC_MAX_METHOD: u8 = 9;

/// SEA ARC: a `0x1A` marker, a method byte and the first member's name.
pub fn arc_sea(r: &dyn ByteSource) -> bool {
    let Some(head) = window::array::<3>(r, 0) else {
        return false;
    };
    head[0] == 0x1a
        && (1..=ARC_MAX_METHOD).contains(&head[1])
        && head[2].is_ascii_graphic()
}

/// LHA: a method id such as `-lh5-` or `-lzs-` at offset 2.
pub fn lha(r: &dyn ByteSource) -> bool {
    let Some(id) = window::array::<5>(r, 2) else {
        return false;
    };
    id[0] == b'-'
        && id[1] == b'l'
        && (id[2] == b'h' || id[2] == b'z')
        && (id[3].is_ascii_digit() || id[3].is_ascii_lowercase())
        && id[4] == b'-'
}

/// ARJ: the main header's two magic bytes, its size and the comment file type.
pub fn arj(r: &dyn ByteSource) -> bool {
    const MAX_HEADER: u16 = 2600;
    const MAIN_HEADER_TYPE: u8 = 2;
    let Some(head) = window::array::<11>(r, 0) else {
        return false;
    };
    let size = u16::from_le_bytes([head[2], head[3]]);
    head[0] == 0x60
        && head[1] == 0xea
        && (1..=MAX_HEADER).contains(&size)
        && head[10] == MAIN_HEADER_TYPE
}

/// Microsoft cabinet.
pub fn microsoft_cab(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"MSCF\x00\x00\x00\x00")
}

/// Zoo, by its text banner and the tag at offset 20.
pub fn zoo(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"ZOO ") && window::equals_at(r, 20, &[0xdc, 0xa7, 0xc4, 0xfd])
}

/// POSIX or GNU tar.
pub fn tar(r: &dyn ByteSource) -> bool {
    window::equals_at(r, 257, b"ustar")
}

/// MS-DOS KWAJ compressed file.
pub fn kwaj(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"KWAJ\x88\xf0\x27\xd1")
}

/// MS-DOS SZDD compressed file from `COMPRESS.EXE`.
pub fn szdd(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"SZDD\x88\xf0\x27\x33")
}
