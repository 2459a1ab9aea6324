//! Document and disc image matchers.

use super::window::{self, ByteSource};

/// Portable Document Format.
pub fn pdf(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"%PDF-")
}

/// Rich Text Format.
pub fn rtf(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"{\\rtf")
}

/// PostScript, including encapsulated PostScript.
pub fn postscript(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"%!PS") || window::starts_with(r, &[0xc5, 0xd0, 0xd3, 0xc6])
}

/// OLE2 compound file, the container behind legacy Office documents.
pub fn ole_compound(r: &dyn ByteSource) -> bool {
    window::starts_with(r, &[0xd0, 0xcf, 0x11, 0xe0, 0xa1, 0xb1, 0x1a, 0xe1])
}

/// WinHelp 3.x and 4.x.
pub fn windows_help(r: &dyn ByteSource) -> bool {
    window::starts_with(r, &[0x3f, 0x5f, 0x03, 0x00])
}

/// Compiled HTML help.
pub fn html_help(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"ITSF\x03\x00\x00\x00")
}

// Disc images

/// Offsets of the primary volume descriptor identifier for 2048, 2336 and
/// 2352 byte sector layouts.
const ISO_DESCRIPTOR_OFFSETS: &[u64] = &[0x8001, 0x8801, 0x9001];

/// ISO 9660 filesystem image.
pub fn iso9660(r: &dyn ByteSource) -> bool {
    ISO_DESCRIPTOR_OFFSETS
        .iter()
        .any(|&offset| window::equals_at(r, offset, b"CD001"))
}

/// Nero image, identified by its footer (`NER5` for v2, `NERO` for v1).
pub fn nero_image(r: &dyn ByteSource) -> bool {
    let size = r.size();
    let at = |back: u64, tag: &[u8]| {
        size.checked_sub(back)
            .is_some_and(|offset| window::equals_at(r, offset, tag))
    };
    at(12, b"NER5") || at(8, b"NERO")
}

/// PowerISO direct access archive.
pub fn power_iso(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"DAA\x00\x00\x00\x00\x00")
}

/// Alcohol 120% media descriptor sidecar.
pub fn alcohol_mds(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"MEDIA DESCRIPTOR")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_any_sector_layout() {
        for offset in ISO_DESCRIPTOR_OFFSETS {
            let mut data = vec![0u8; 0x9800];
            let at = *offset as usize;
            data[at..at + 5].copy_from_slice(b"CD001");
            assert!(iso9660(&data), "offset {offset:#x}");
        }
        assert!(!iso9660(&vec![0u8; 0x9800]));
        assert!(!iso9660(&b"CD001".to_vec()));
    }

    #[test]
    fn test_nero_footer() {
        let mut v2 = vec![0u8; 64];
        v2[52..56].copy_from_slice(b"NER5");
        assert!(nero_image(&v2));
        let mut v1 = vec![0u8; 64];
        v1[56..60].copy_from_slice(b"NERO");
        assert!(nero_image(&v1));
        assert!(!nero_image(&b"NER".to_vec()));
    }

    #[test]
    fn test_documents() {
        assert!(pdf(&b"%PDF-1.4\n".to_vec()));
        assert!(rtf(&b"{\\rtf1\\ansi".to_vec()));
        assert!(windows_help(&vec![0x3f, 0x5f, 0x03, 0x00, 0x10]));
        assert!(!html_help(&b"ITSF\x02\x00\x00\x00".to_vec()));
    }
}
