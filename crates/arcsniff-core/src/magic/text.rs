//! Text detection.
//!
//! Text has no magic number, so these matchers inspect every byte. Files are
//! read in fixed chunks rather than loaded whole.
//!
//! ## Tiers
//!
//! | Tier         | Accepts on top of printable ASCII and text controls |
//! |--------------|-----------------------------------------------------|
//! | ASCII        | nothing                                             |
//! | ISO-8859-1   | `0xA0..=0xFF`                                       |
//! | Windows-1252 | `0x80..=0xFF` except the five undefined code points |
//! | Plain        | `0x80..=0xFF`                                       |
//!
//! [`classify`] reports the narrowest tier that accepts the whole file.

use super::signature::Signature;
use super::window::{self, ByteSource};

const CHUNK: usize = 4096;

/// Escape sequences that mark ANSI art. Searching for these is cheaper and
/// more forgiving than parsing the escape grammar.
const ANSI_SEQUENCES: &[&[u8]] = &[b"\x1b[0m", b"\x1b[2J", b"\x1b[1;", b"\x1b[0;"];
/// Bytes shared between consecutive chunks so a sequence split across a
/// chunk boundary is still found.
const ANSI_OVERLAP: usize = 3;

/// Code points left undefined by Windows-1252.
const CP1252_UNDEFINED: &[u8] = &[0x81, 0x8d, 0x8f, 0x90, 0x9d];

/// Control characters that regularly appear in text files: tab, line feed,
/// vertical tab, form feed, carriage return, bell, backspace, escape and the
/// DOS end-of-file marker.
const fn is_text_control(b: u8) -> bool {
    matches!(b, 0x09 | 0x0a | 0x0b | 0x0c | 0x0d | 0x07 | 0x08 | 0x1b | 0x1a)
}

const fn is_ascii_text(b: u8) -> bool {
    matches!(b, 0x20..=0x7e) || is_text_control(b)
}

/// Which tiers still accept everything seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tiers {
    ascii: bool,
    iso88591: bool,
    windows1252: bool,
    plain: bool,
}

impl Tiers {
    fn all() -> Self {
        Self {
            ascii: true,
            iso88591: true,
            windows1252: true,
            plain: true,
        }
    }

    fn any(&self) -> bool {
        self.ascii || self.iso88591 || self.windows1252 || self.plain
    }

    fn feed(&mut self, chunk: &[u8]) {
        for &b in chunk {
            if is_ascii_text(b) {
                continue;
            }
            self.ascii = false;
            if b < 0x80 {
                *self = Self {
                    ascii: false,
                    iso88591: false,
                    windows1252: false,
                    plain: false,
                };
                return;
            }
            if b < 0xa0 {
                self.iso88591 = false;
            }
            if CP1252_UNDEFINED.contains(&b) {
                self.windows1252 = false;
            }
        }
    }
}

/// Scan the whole source once. An empty source is not text.
fn scan(r: &dyn ByteSource) -> Option<Tiers> {
    let size = r.size();
    if size == 0 {
        return None;
    }
    let mut tiers = Tiers::all();
    let mut offset = 0u64;
    while offset < size && tiers.any() {
        let chunk = window::up_to(r, offset, CHUNK);
        if chunk.is_empty() {
            break;
        }
        tiers.feed(&chunk);
        offset += chunk.len() as u64;
    }
    tiers.any().then_some(tiers)
}

/// UTF-8 byte order mark.
pub fn utf8(r: &dyn ByteSource) -> bool {
    window::starts_with(r, &[0xef, 0xbb, 0xbf])
}

/// UTF-16 byte order mark in either byte order.
pub fn utf16(r: &dyn ByteSource) -> bool {
    (window::starts_with(r, &[0xff, 0xfe]) && !utf32(r)) || window::starts_with(r, &[0xfe, 0xff])
}

/// UTF-32 byte order mark in either byte order.
pub fn utf32(r: &dyn ByteSource) -> bool {
    window::starts_with(r, &[0xff, 0xfe, 0x00, 0x00])
        || window::starts_with(r, &[0x00, 0x00, 0xfe, 0xff])
}

/// Contains at least one common ANSI escape sequence anywhere in the file.
pub fn ansi(r: &dyn ByteSource) -> bool {
    let size = r.size();
    let mut offset = 0u64;
    while offset < size {
        let chunk = window::up_to(r, offset, CHUNK);
        if chunk.is_empty() {
            break;
        }
        if ANSI_SEQUENCES
            .iter()
            .any(|seq| window::find_subsequence(&chunk, seq).is_some())
        {
            return true;
        }
        if chunk.len() < CHUNK {
            break;
        }
        offset += (CHUNK - ANSI_OVERLAP) as u64;
    }
    false
}

/// Strict 7-bit ASCII text.
pub fn ascii(r: &dyn ByteSource) -> bool {
    scan(r).is_some_and(|t| t.ascii)
}

/// ISO-8859-1 text.
pub fn iso88591(r: &dyn ByteSource) -> bool {
    scan(r).is_some_and(|t| t.iso88591)
}

/// Windows-1252 text.
pub fn windows1252(r: &dyn ByteSource) -> bool {
    scan(r).is_some_and(|t| t.windows1252)
}

/// Text in any 8-bit code page.
pub fn plain(r: &dyn ByteSource) -> bool {
    scan(r).is_some_and(|t| t.plain)
}

/// Classify a source that matched no binary signature.
///
/// Byte order marks win, then ANSI escapes, then the narrowest text tier.
/// Returns [`Signature::Unknown`] for binary content.
pub fn classify(r: &dyn ByteSource) -> Signature {
    if utf32(r) {
        return Signature::Utf32Text;
    }
    if utf16(r) {
        return Signature::Utf16Text;
    }
    if utf8(r) {
        return Signature::Utf8Text;
    }
    if ansi(r) {
        return Signature::AnsiEscape;
    }
    match scan(r) {
        Some(t) if t.ascii => Signature::AsciiText,
        Some(t) if t.iso88591 => Signature::Iso88591Text,
        Some(t) if t.windows1252 => Signature::Windows1252Text,
        Some(t) if t.plain => Signature::PlainText,
        _ => Signature::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_order() {
        assert_eq!(classify(&b"hello\r\n\x1a".to_vec()), Signature::AsciiText);
        assert_eq!(classify(&b"caf\xe9".to_vec()), Signature::Iso88591Text);
        assert_eq!(classify(&b"\x93quoted\x94".to_vec()), Signature::Windows1252Text);
        assert_eq!(classify(&b"\x81\xb0\xb1\xb2".to_vec()), Signature::PlainText);
        assert_eq!(classify(&b"bin\x00ary".to_vec()), Signature::Unknown);
    }

    #[test]
    fn test_tiers_nest() {
        let latin = b"caf\xe9".to_vec();
        assert!(!ascii(&latin));
        assert!(iso88591(&latin));
        assert!(windows1252(&latin));
        assert!(plain(&latin));
    }

    #[test]
    fn test_del_is_not_text() {
        assert!(!plain(&b"abc\x7f".to_vec()));
    }

    #[test]
    fn test_empty_is_not_text() {
        assert!(!ascii(&Vec::new()));
        assert_eq!(classify(&Vec::new()), Signature::Unknown);
    }

    #[test]
    fn test_boms() {
        assert_eq!(classify(&vec![0xff, 0xfe, 0x00, 0x00, b'a']), Signature::Utf32Text);
        assert_eq!(classify(&vec![0xff, 0xfe, b'a', 0x00]), Signature::Utf16Text);
        assert_eq!(classify(&vec![0xfe, 0xff, 0x00, b'a']), Signature::Utf16Text);
        assert_eq!(classify(&vec![0xef, 0xbb, 0xbf, b'a']), Signature::Utf8Text);
    }

    #[test]
    fn test_ansi_split_across_chunks() {
        let mut data = vec![b' '; CHUNK * 2];
        let split = CHUNK - 2;
        data[split..split + 4].copy_from_slice(b"\x1b[0m");
        assert!(ansi(&data));
        assert_eq!(classify(&data), Signature::AnsiEscape);
    }

    #[test]
    fn test_ansi_late_in_file() {
        let mut data = vec![b'x'; CHUNK * 5];
        let at = CHUNK * 4 + 100;
        data[at..at + 4].copy_from_slice(b"\x1b[2J");
        assert!(ansi(&data));
        assert!(!ansi(&vec![b'x'; CHUNK * 3]));
    }
}
