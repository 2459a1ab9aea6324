//! Image matchers.

use super::window::{self, ByteSource};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";
/// Chunks inspected while looking for an animation control chunk.
const PNG_CHUNK_LIMIT: usize = 64;

/// Walk the PNG chunk list until `IDAT`, reporting whether `acTL` came first.
fn png_animated(r: &dyn ByteSource) -> bool {
    let mut offset = PNG.len() as u64;
    for _ in 0..PNG_CHUNK_LIMIT {
        let Some(head) = window::array::<8>(r, offset) else {
            return false;
        };
        let len = u32::from_be_bytes([head[0], head[1], head[2], head[3]]) as u64;
        match &head[4..] {
            b"acTL" => return true,
            b"IDAT" | b"IEND" => return false,
            _ => offset += 12 + len,
        }
    }
    false
}

/// Portable Network Graphics without an animation control chunk.
pub fn png(r: &dyn ByteSource) -> bool {
    window::starts_with(r, PNG) && !png_animated(r)
}

/// Animated PNG.
pub fn apng(r: &dyn ByteSource) -> bool {
    window::starts_with(r, PNG) && png_animated(r)
}

/// GIF 87a or 89a.
pub fn gif(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"GIF87a") || window::starts_with(r, b"GIF89a")
}

/// JPEG with any APPn/DQT marker after the SOI.
pub fn jpeg(r: &dyn ByteSource) -> bool {
    window::starts_with(r, &[0xff, 0xd8, 0xff])
}

/// JPEG 2000, either the JP2 box or a raw codestream.
pub fn jpeg2000(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"\x00\x00\x00\x0cjP  \r\n\x87\n")
        || window::starts_with(r, &[0xff, 0x4f, 0xff, 0x51])
}

/// Windows bitmap with zeroed reserved fields.
pub fn bmp(r: &dyn ByteSource) -> bool {
    let Some(head) = window::array::<14>(r, 0) else {
        return false;
    };
    &head[..2] == b"BM" && head[6..10] == [0, 0, 0, 0]
}

/// ZSoft PCX: manufacturer 10, a known version, RLE encoding and a bit depth.
pub fn pcx(r: &dyn ByteSource) -> bool {
    let Some(head) = window::array::<4>(r, 0) else {
        return false;
    };
    head[0] == 0x0a
        && matches!(head[1], 0 | 2 | 3 | 4 | 5)
        && head[2] == 1
        && matches!(head[3], 1 | 2 | 4 | 8)
}

/// TIFF in Intel or Motorola byte order.
pub fn tiff(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"II*\x00") || window::starts_with(r, b"MM\x00*")
}

fn riff_form(r: &dyn ByteSource, form: &[u8]) -> bool {
    window::starts_with(r, b"RIFF") && window::equals_at(r, 8, form)
}

fn iff_form(r: &dyn ByteSource, form: &[u8]) -> bool {
    window::starts_with(r, b"FORM") && window::equals_at(r, 8, form)
}

pub(crate) fn ftyp_brand(r: &dyn ByteSource) -> Option<[u8; 4]> {
    if !window::equals_at(r, 4, b"ftyp") {
        return None;
    }
    window::array::<4>(r, 8)
}

/// Google WebP.
pub fn webp(r: &dyn ByteSource) -> bool {
    riff_form(r, b"WEBP")
}

/// Electronic Arts IFF interleaved bitmap, including the PBM variant.
pub fn ilbm(r: &dyn ByteSource) -> bool {
    iff_form(r, b"ILBM") || iff_form(r, b"PBM ")
}

/// Windows icon: reserved zero, type 1 and at least one image.
pub fn ico(r: &dyn ByteSource) -> bool {
    let Some(head) = window::array::<6>(r, 0) else {
        return false;
    };
    head[..4] == [0, 0, 1, 0] && u16::from_le_bytes([head[4], head[5]]) > 0
}

/// AV1 image file.
pub fn avif(r: &dyn ByteSource) -> bool {
    matches!(ftyp_brand(r), Some(brand) if &brand == b"avif" || &brand == b"avis")
}

/// Adobe Photoshop.
pub fn photoshop(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"8BPS\x00\x01") || window::starts_with(r, b"8BPS\x00\x02")
}
