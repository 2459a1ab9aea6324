//! Random-access byte windows.
//!
//! Every matcher reads a handful of bytes at a fixed offset. [`ByteSource`]
//! abstracts over in-memory buffers and open files so the same predicate works
//! on both. Reads are positional and take `&self`, which keeps the matchers
//! pure and safe to call from several threads at once.
//!
//! The helpers in this module turn short reads into "no match" rather than
//! errors: a truncated or empty input simply does not look like anything.

use std::fs::File;
use std::io;

/// A seekable source of bytes that supports positional reads.
pub trait ByteSource {
    /// Total length of the source in bytes
    fn size(&self) -> u64;

    /// Read up to `buf.len()` bytes starting at `offset`.
    ///
    /// Returns the number of bytes read, which is `0` at or past the end.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;
}

impl ByteSource for [u8] {
    fn size(&self) -> u64 {
        self.len() as u64
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let Ok(start) = usize::try_from(offset) else {
            return Ok(0);
        };
        if start >= self.len() {
            return Ok(0);
        }
        let n = buf.len().min(self.len() - start);
        buf[..n].copy_from_slice(&self[start..start + n]);
        Ok(n)
    }
}

impl ByteSource for Vec<u8> {
    fn size(&self) -> u64 {
        self.as_slice().size()
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.as_slice().read_at(offset, buf)
    }
}

impl<const N: usize> ByteSource for [u8; N] {
    fn size(&self) -> u64 {
        N as u64
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.as_slice().read_at(offset, buf)
    }
}

impl<T: ByteSource + ?Sized> ByteSource for &T {
    fn size(&self) -> u64 {
        (**self).size()
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_at(offset, buf)
    }
}

impl ByteSource for File {
    fn size(&self) -> u64 {
        self.metadata().map(|m| m.len()).unwrap_or(0)
    }

    #[cfg(unix)]
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        use std::os::unix::fs::FileExt;
        FileExt::read_at(self, buf, offset)
    }

    #[cfg(windows)]
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        use std::os::windows::fs::FileExt;
        self.seek_read(buf, offset)
    }
}

/// Fill `buf` from `offset`, returning false on a short read or I/O error.
pub fn read_exact_at(src: &dyn ByteSource, offset: u64, buf: &mut [u8]) -> bool {
    let mut filled = 0;
    while filled < buf.len() {
        match src.read_at(offset + filled as u64, &mut buf[filled..]) {
            Ok(0) => return false,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => return false,
        }
    }
    true
}

/// Read exactly `N` bytes at `offset` into an array.
pub fn array<const N: usize>(src: &dyn ByteSource, offset: u64) -> Option<[u8; N]> {
    let mut buf = [0u8; N];
    read_exact_at(src, offset, &mut buf).then_some(buf)
}

/// Read exactly `len` bytes at `offset`.
pub fn bytes(src: &dyn ByteSource, offset: u64, len: usize) -> Option<Vec<u8>> {
    let mut buf = vec![0u8; len];
    read_exact_at(src, offset, &mut buf).then_some(buf)
}

/// Read up to `len` bytes at `offset`, accepting a short read.
pub fn up_to(src: &dyn ByteSource, offset: u64, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    let mut filled = 0;
    while filled < len {
        match src.read_at(offset + filled as u64, &mut buf[filled..]) {
            Ok(0) | Err(_) => break,
            Ok(n) => filled += n,
        }
    }
    buf.truncate(filled);
    buf
}

/// True when the bytes at `offset` equal `pattern`.
pub fn equals_at(src: &dyn ByteSource, offset: u64, pattern: &[u8]) -> bool {
    bytes(src, offset, pattern.len()).is_some_and(|b| b == pattern)
}

/// True when the source begins with `pattern`.
pub fn starts_with(src: &dyn ByteSource, pattern: &[u8]) -> bool {
    equals_at(src, 0, pattern)
}

/// The final `len` bytes of the source, or `None` if it is shorter.
pub fn tail(src: &dyn ByteSource, len: usize) -> Option<Vec<u8>> {
    let size = src.size();
    let offset = size.checked_sub(len as u64)?;
    bytes(src, offset, len)
}

/// Little-endian `u16` at `offset`.
pub fn u16_le(src: &dyn ByteSource, offset: u64) -> Option<u16> {
    array::<2>(src, offset).map(u16::from_le_bytes)
}

/// Little-endian `u32` at `offset`.
pub fn u32_le(src: &dyn ByteSource, offset: u64) -> Option<u32> {
    array::<4>(src, offset).map(u32::from_le_bytes)
}

/// Byte offset of the first occurrence of `needle` in `haystack`.
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_short_read() {
        let data = b"abc".as_slice();
        let mut buf = [0u8; 8];
        assert_eq!(data.read_at(1, &mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"bc");
        assert_eq!(data.read_at(10, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_helpers_reject_short_reads() {
        let data = b"PK\x03".to_vec();
        assert!(!starts_with(&data, b"PK\x03\x04"));
        assert!(starts_with(&data, b"PK"));
        assert_eq!(array::<4>(&data, 0), None);
        assert_eq!(tail(&data, 4), None);
        assert_eq!(tail(&data, 2), Some(b"K\x03".to_vec()));
    }

    #[test]
    fn test_empty_source() {
        let data: &[u8] = &[];
        assert_eq!(data.size(), 0);
        assert!(!equals_at(&data, 0, b"x"));
        assert!(up_to(&data, 0, 16).is_empty());
    }

    #[test]
    fn test_integers() {
        let data = [0x34, 0x12, 0x78, 0x56, 0x34, 0x12];
        assert_eq!(u16_le(&data, 0), Some(0x1234));
        assert_eq!(u32_le(&data, 2), Some(0x1234_5678));
        assert_eq!(u32_le(&data, 4), None);
    }

    #[test]
    fn test_file_source() {
        use std::io::Write;
        let mut tmp = tempfile::tempfile().unwrap();
        tmp.write_all(b"hello world").unwrap();
        assert_eq!(tmp.size(), 11);
        assert!(equals_at(&tmp, 6, b"world"));
        assert_eq!(tail(&tmp, 5), Some(b"world".to_vec()));
    }

    #[test]
    fn test_find_subsequence() {
        let data = b"hello.arj.world";
        assert_eq!(find_subsequence(data, b".arj"), Some(5));
        assert_eq!(find_subsequence(data, b"missing"), None);
        assert_eq!(find_subsequence(b"ab", b"abc"), None);
    }
}
