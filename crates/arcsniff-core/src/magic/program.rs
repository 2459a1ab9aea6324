//! Executable matchers.
//!
//! [`ms_exe`] only answers "is this an MZ executable that is not something
//! more specific". Telling DOS, NE and PE apart is the job of
//! [`crate::exe::parse`].

use super::archive;
use super::window::{self, ByteSource};

/// MZ executable that is not PKLITE, a PKZIP SFX or a gzip SFX stub.
pub fn ms_exe(r: &dyn ByteSource) -> bool {
    (window::starts_with(r, b"MZ") || window::starts_with(r, b"ZM"))
        && !archive::pklite(r)
        && !archive::pksfx(r)
        && !window::equals_at(r, 512, &[0x1f, 0x8b, 0x08])
}

/// Executable and Linkable Format.
pub fn elf(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"\x7fELF")
}

/// Mach-O, thin binaries in either byte order and word size.
pub fn macho(r: &dyn ByteSource) -> bool {
    let Some(magic) = window::array::<4>(r, 0) else {
        return false;
    };
    matches!(
        magic,
        [0xfe, 0xed, 0xfa, 0xce]
            | [0xfe, 0xed, 0xfa, 0xcf]
            | [0xce, 0xfa, 0xed, 0xfe]
            | [0xcf, 0xfa, 0xed, 0xfe]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ms_exe_excludes_compressed_variants() {
        let mut data = vec![0u8; 600];
        data[..2].copy_from_slice(b"MZ");
        assert!(ms_exe(&data));

        data[30..36].copy_from_slice(b"PKLITE");
        assert!(!ms_exe(&data));

        data[30..36].fill(0);
        data[512..515].copy_from_slice(&[0x1f, 0x8b, 0x08]);
        assert!(!ms_exe(&data));
    }

    #[test]
    fn test_macho_magics() {
        assert!(macho(&vec![0xcf, 0xfa, 0xed, 0xfe, 0x07]));
        assert!(macho(&vec![0xfe, 0xed, 0xfa, 0xce]));
        assert!(!macho(&vec![0xca, 0xfe, 0xba, 0xbe]));
    }
}
