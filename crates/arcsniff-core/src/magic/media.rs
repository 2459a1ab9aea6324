//! Audio, video and tracker music matchers.
//!
//! Tracker modules are the odd ones out: ProTracker and its clones carry no
//! leading magic at all. The only marker is a four byte tag that follows the
//! song title and the 31 sample headers, 1080 bytes into the file.

use super::image::ftyp_brand;
use super::window::{self, ByteSource};

/// Absolute offset of the ProTracker sample-count tag.
pub const MOD_TAG_OFFSET: u64 = 1080;

/// Number of channels implied by a MOD tag.
pub fn mod_tag_channels(tag: &[u8; 4]) -> Option<u8> {
    match tag {
        b"M.K." | b"M!K!" | b"4CHN" | b"FLT4" => Some(4),
        b"6CHN" => Some(6),
        b"FLT8" | b"OCTA" | b"8CHN" => Some(8),
        b"2CHN" => Some(2),
        _ => None,
    }
}

/// Channel count of a ProTracker family module, from the tag at offset 1080.
pub fn mod_channels(r: &dyn ByteSource) -> Option<u8> {
    let tag = window::array::<4>(r, MOD_TAG_OFFSET)?;
    mod_tag_channels(&tag)
}

/// ProTracker family module.
pub fn mod_tracker(r: &dyn ByteSource) -> bool {
    mod_channels(r).is_some()
}

/// FastTracker 2 extended module.
pub fn extended_module(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"Extended Module: ")
}

/// Scream Tracker 3 module.
pub fn scream_tracker3(r: &dyn ByteSource) -> bool {
    window::equals_at(r, 44, b"SCRM")
}

/// Impulse Tracker module.
pub fn impulse_tracker(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"IMPM")
}

/// MultiTracker module, version 1.0.
pub fn multitrack_module(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"MTM\x10")
}

/// MP3, either behind an ID3v2 tag or starting on a layer III frame sync.
pub fn mp3(r: &dyn ByteSource) -> bool {
    if window::starts_with(r, b"ID3") {
        return true;
    }
    let Some(head) = window::array::<3>(r, 0) else {
        return false;
    };
    let sync = head[0] == 0xff && head[1] & 0xe0 == 0xe0;
    let version_ok = head[1] & 0x18 != 0x08;
    let layer3 = head[1] & 0x06 == 0x02;
    let bitrate_ok = head[2] >> 4 != 0x0f;
    sync && version_ok && layer3 && bitrate_ok
}

/// Ogg container.
pub fn ogg(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"OggS\x00")
}

/// Free Lossless Audio Codec.
pub fn flac(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"fLaC")
}

/// RIFF wave.
pub fn wave(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"RIFF") && window::equals_at(r, 8, b"WAVE")
}

/// AIFF or AIFF-C.
pub fn aiff(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"FORM")
        && (window::equals_at(r, 8, b"AIFF") || window::equals_at(r, 8, b"AIFC"))
}

/// Standard MIDI file.
pub fn midi(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"MThd\x00\x00\x00\x06")
}

/// Audio Video Interleave.
pub fn avi(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"RIFF") && window::equals_at(r, 8, b"AVI ")
}

/// Flash Video.
pub fn flash_video(r: &dyn ByteSource) -> bool {
    window::starts_with(r, b"FLV\x01")
}

/// MP4 and related ISO base media brands.
pub fn mp4(r: &dyn ByteSource) -> bool {
    const BRANDS: &[&[u8; 4]] = &[
        b"isom", b"iso2", b"iso4", b"iso5", b"mp41", b"mp42", b"avc1", b"M4V ", b"M4A ", b"dash",
        b"3gp4", b"3gp5", b"MSNV",
    ];
    matches!(ftyp_brand(r), Some(brand) if BRANDS.contains(&&brand))
}

/// Apple QuickTime, by brand or by a leading `moov`/`mdat`/`wide` atom.
pub fn quicktime(r: &dyn ByteSource) -> bool {
    if let Some(brand) = ftyp_brand(r) {
        return &brand == b"qt  ";
    }
    let Some(atom) = window::array::<4>(r, 4) else {
        return false;
    };
    matches!(&atom, b"moov" | b"mdat" | b"wide" | b"free" | b"pnot")
        && window::starts_with(r, &[0x00])
}

const EBML: &[u8] = &[0x1a, 0x45, 0xdf, 0xa3];

fn ebml_doc_type_is_webm(r: &dyn ByteSource) -> bool {
    let head = window::up_to(r, 0, 64);
    window::find_subsequence(&head, b"webm").is_some()
}

/// Matroska other than WebM.
pub fn matroska(r: &dyn ByteSource) -> bool {
    window::starts_with(r, EBML) && !ebml_doc_type_is_webm(r)
}

/// WebM.
pub fn webm(r: &dyn ByteSource) -> bool {
    window::starts_with(r, EBML) && ebml_doc_type_is_webm(r)
}

/// Advanced Systems Format header object.
pub fn windows_media(r: &dyn ByteSource) -> bool {
    window::starts_with(
        r,
        &[
            0x30, 0x26, 0xb2, 0x75, 0x8e, 0x66, 0xcf, 0x11, 0xa6, 0xd9, 0x00, 0xaa, 0x00, 0x62,
            0xce, 0x6c,
        ],
    )
}

/// MPEG program stream pack or video sequence header.
pub fn mpeg(r: &dyn ByteSource) -> bool {
    window::starts_with(r, &[0x00, 0x00, 0x01, 0xba])
        || window::starts_with(r, &[0x00, 0x00, 0x01, 0xb3])
}

/// Shockwave Flash, uncompressed or zlib/LZMA compressed.
pub fn shockwave_flash(r: &dyn ByteSource) -> bool {
    let Some(head) = window::array::<4>(r, 0) else {
        return false;
    };
    matches!(&head[..3], b"FWS" | b"CWS" | b"ZWS") && (1..=50).contains(&head[3])
}
