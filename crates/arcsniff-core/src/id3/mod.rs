//! ID3 tag reader for MP3 files.
//!
//! Reads just enough of a tag to describe a song as `Title by Artist (Year)`.
//! Both the fixed v1 trailer and the v2.2, v2.3 and v2.4 frame headers are
//! supported.

use std::fmt;

use crate::magic::window::{self, ByteSource};

const V1_LEN: usize = 128;
const V2_HEADER_LEN: u64 = 10;
const V2_FLAG_EXTENDED: u8 = 0x40;

/// Which tag layout a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Id3Version {
    /// 128-byte trailer
    V1,
    /// ID3v2.2
    V2_2,
    /// ID3v2.3
    V2_3,
    /// ID3v2.4
    V2_4,
}

/// The song description fields of a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Id3 {
    /// Source layout
    pub version: Id3Version,
    /// Song title, or the album when no title frame exists
    pub title: String,
    /// Lead artist, or the band when no lead artist frame exists
    pub artist: String,
    /// Album title
    pub album: String,
    /// Release year
    pub year: String,
}

impl Id3 {
    fn is_empty(&self) -> bool {
        self.title.is_empty() && self.artist.is_empty()
    }
}

impl fmt::Display for Id3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)?;
        if !self.artist.is_empty() {
            if !self.title.is_empty() {
                f.write_str(" by ")?;
            }
            f.write_str(&self.artist)?;
        }
        if !self.year.is_empty() {
            write!(f, " ({})", self.year)?;
        }
        Ok(())
    }
}

/// Decode a synch-safe integer: seven bits per byte, big-endian.
///
/// A byte with its high bit set is not synch-safe and makes the whole value
/// zero.
pub fn synch_safe(bytes: &[u8]) -> u32 {
    if bytes.iter().any(|b| b & 0x80 != 0) {
        return 0;
    }
    bytes.iter().fold(0u32, |acc, &b| (acc << 7) | u32::from(b))
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Trim a fixed-width v1 field at its first NUL and strip spaces.
fn v1_field(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    latin1(&bytes[..end]).trim().to_string()
}

/// Read the ID3v1 trailer.
pub fn v1(r: &dyn ByteSource) -> Option<Id3> {
    let tag = window::tail(r, V1_LEN)?;
    if &tag[..3] != b"TAG" {
        return None;
    }
    let mut id3 = Id3 {
        version: Id3Version::V1,
        title: v1_field(&tag[3..33]),
        artist: v1_field(&tag[33..63]),
        album: v1_field(&tag[63..93]),
        year: v1_field(&tag[93..97]),
    };
    if id3.title.is_empty() {
        id3.title = id3.album.clone();
    }
    (!id3.is_empty()).then_some(id3)
}

fn utf16(bytes: &[u8], big_endian: bool) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .collect();
    String::from_utf16_lossy(&units)
}

/// Decode a text frame body: an encoding byte followed by the text.
fn text_frame(body: &[u8]) -> String {
    let Some((&encoding, text)) = body.split_first() else {
        return String::new();
    };
    let decoded = match encoding {
        1 => match text {
            [0xff, 0xfe, rest @ ..] => utf16(rest, false),
            [0xfe, 0xff, rest @ ..] => utf16(rest, true),
            _ => utf16(text, false),
        },
        2 => utf16(text, true),
        3 => String::from_utf8_lossy(text).into_owned(),
        _ => latin1(text),
    };
    // v2.4 separates multiple values with NUL; the first one is enough.
    decoded
        .split('\0')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

#[derive(Default)]
struct Frames {
    title: Option<String>,
    album: Option<String>,
    artist: Option<String>,
    band: Option<String>,
    year: Option<String>,
}

impl Frames {
    fn store(&mut self, id: &[u8], body: &[u8]) {
        let slot = match id {
            b"TIT2" | b"TT2" => &mut self.title,
            b"TALB" | b"TAL" => &mut self.album,
            b"TPE1" | b"TP1" => &mut self.artist,
            b"TPE2" | b"TP2" => &mut self.band,
            b"TYER" | b"TYE" | b"TDRC" => &mut self.year,
            _ => return,
        };
        if slot.is_none() {
            let text = text_frame(body);
            if !text.is_empty() {
                *slot = Some(text);
            }
        }
    }

    fn into_id3(self, version: Id3Version) -> Option<Id3> {
        let album = self.album.unwrap_or_default();
        let mut year = self.year.unwrap_or_default();
        // TDRC is a timestamp such as 2003-05-01.
        if year.len() > 4 && year.as_bytes()[..4].iter().all(u8::is_ascii_digit) {
            year.truncate(4);
        }
        let id3 = Id3 {
            version,
            title: self.title.unwrap_or_else(|| album.clone()),
            artist: self.artist.or(self.band).unwrap_or_default(),
            album,
            year,
        };
        (!id3.is_empty()).then_some(id3)
    }
}

/// Read an ID3v2 tag from the start of the source.
pub fn v2(r: &dyn ByteSource) -> Option<Id3> {
    let header = window::array::<10>(r, 0)?;
    if &header[..3] != b"ID3" {
        return None;
    }
    let version = match header[3] {
        2 => Id3Version::V2_2,
        3 => Id3Version::V2_3,
        4 => Id3Version::V2_4,
        _ => return None,
    };
    let flags = header[5];
    let size = u64::from(synch_safe(&header[6..10]));
    let available = r.size().saturating_sub(V2_HEADER_LEN);
    let tag = window::up_to(r, V2_HEADER_LEN, size.min(available) as usize);

    let mut pos = 0usize;
    if flags & V2_FLAG_EXTENDED != 0 && version != Id3Version::V2_2 {
        let ext = tag.get(..4)?;
        pos = match version {
            Id3Version::V2_4 => synch_safe(ext) as usize,
            _ => u32::from_be_bytes([ext[0], ext[1], ext[2], ext[3]]) as usize + 4,
        };
    }

    let (id_len, header_len) = match version {
        Id3Version::V2_2 => (3, 6),
        _ => (4, 10),
    };
    let mut frames = Frames::default();
    while pos + header_len <= tag.len() {
        let frame = &tag[pos..pos + header_len];
        if frame[0] == 0 {
            break;
        }
        let id = &frame[..id_len];
        let size = &frame[id_len..id_len + id_len];
        let size = match version {
            Id3Version::V2_2 => u32::from_be_bytes([0, size[0], size[1], size[2]]),
            Id3Version::V2_3 => u32::from_be_bytes([size[0], size[1], size[2], size[3]]),
            _ => synch_safe(size),
        } as usize;
        let start = pos + header_len;
        let Some(body) = start.checked_add(size).and_then(|end| tag.get(start..end)) else {
            break;
        };
        frames.store(id, body);
        pos = start + size;
    }
    frames.into_id3(version)
}

/// Describe the song, preferring the richer v2 tag.
pub fn song(r: &dyn ByteSource) -> Option<String> {
    v2(r).or_else(|| v1(r)).map(|id3| id3.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v1_trailer(title: &str, artist: &str, year: &str) -> Vec<u8> {
        let mut tag = vec![0u8; V1_LEN];
        tag[..3].copy_from_slice(b"TAG");
        tag[3..3 + title.len()].copy_from_slice(title.as_bytes());
        tag[33..33 + artist.len()].copy_from_slice(artist.as_bytes());
        tag[93..93 + year.len()].copy_from_slice(year.as_bytes());
        let mut file = vec![0xffu8, 0xfb, 0x90, 0x64];
        file.extend(vec![0u8; 256]);
        file.extend(tag);
        file
    }

    fn frame(id: &[u8], text: &[u8], version: u8) -> Vec<u8> {
        let mut body = vec![0u8];
        body.extend_from_slice(text);
        let mut out = id.to_vec();
        match version {
            2 => out.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]),
            3 => out.extend_from_slice(&(body.len() as u32).to_be_bytes()),
            _ => out.extend_from_slice(&[0, 0, 0, body.len() as u8]),
        }
        if version != 2 {
            out.extend_from_slice(&[0, 0]);
        }
        out.extend(body);
        out
    }

    fn v2_tag(version: u8, frames: &[Vec<u8>]) -> Vec<u8> {
        let body: Vec<u8> = frames.concat();
        let size = body.len() as u32 + 16;
        let mut out = b"ID3".to_vec();
        out.extend_from_slice(&[version, 0, 0]);
        out.extend_from_slice(&[
            ((size >> 21) & 0x7f) as u8,
            ((size >> 14) & 0x7f) as u8,
            ((size >> 7) & 0x7f) as u8,
            (size & 0x7f) as u8,
        ]);
        out.extend(body);
        out.extend(vec![0u8; 16]);
        out
    }

    #[test]
    fn test_v1_song() {
        let file = v1_trailer("Title", "Artist", "2003");
        assert_eq!(v1(&file).unwrap().to_string(), "Title by Artist (2003)");
        assert_eq!(song(&file).as_deref(), Some("Title by Artist (2003)"));
    }

    #[test]
    fn test_v1_trims_padding() {
        let file = v1_trailer("  Spaced  ", "Who", "");
        assert_eq!(v1(&file).unwrap().to_string(), "Spaced by Who");
    }

    #[test]
    fn test_v1_missing() {
        assert!(v1(&vec![0u8; 64]).is_none());
        assert!(v1(&vec![0u8; 200]).is_none());
    }

    #[test]
    fn test_synch_safe() {
        assert_eq!(synch_safe(&[0x00, 0x00, 0x02, 0x01]), 257);
        assert_eq!(synch_safe(&[0x7f, 0x7f, 0x7f, 0x7f]), 0x0fff_ffff);
        assert_eq!(synch_safe(&[0x00, 0x80, 0x00, 0x01]), 0);
    }

    #[test]
    fn test_v23_frames() {
        let tag = v2_tag(
            3,
            &[
                frame(b"TIT2", b"Second Reality", 3),
                frame(b"TPE1", b"Purple Motion", 3),
                frame(b"TYER", b"1993", 3),
            ],
        );
        let id3 = v2(&tag).unwrap();
        assert_eq!(id3.version, Id3Version::V2_3);
        assert_eq!(id3.to_string(), "Second Reality by Purple Motion (1993)");
    }

    #[test]
    fn test_v22_three_byte_frames() {
        let tag = v2_tag(2, &[frame(b"TT2", b"Tune", 2), frame(b"TP1", b"Band", 2)]);
        assert_eq!(v2(&tag).unwrap().to_string(), "Tune by Band");
    }

    #[test]
    fn test_v24_fallbacks() {
        let tag = v2_tag(
            4,
            &[
                frame(b"TALB", b"Album", 4),
                frame(b"TPE2", b"Band", 4),
                frame(b"TDRC", b"2004-02-01", 4),
            ],
        );
        let id3 = v2(&tag).unwrap();
        assert_eq!(id3.title, "Album");
        assert_eq!(id3.to_string(), "Album by Band (2004)");
    }

    #[test]
    fn test_text_encodings() {
        assert_eq!(text_frame(b"\x00caf\xe9"), "caf\u{e9}");
        assert_eq!(text_frame(b"\x01\xff\xfeH\x00i\x00"), "Hi");
        assert_eq!(text_frame(b"\x02\x00H\x00i"), "Hi");
        assert_eq!(text_frame("\x03Zoë".as_bytes()), "Zoë");
        assert_eq!(text_frame(b"\x00one\x00two"), "one");
        assert_eq!(text_frame(b""), "");
    }

    #[test]
    fn test_song_prefers_v2() {
        let mut file = v2_tag(3, &[frame(b"TIT2", b"New", 3)]);
        file.extend(v1_trailer("Old", "Artist", "1990"));
        assert_eq!(song(&file).as_deref(), Some("New"));
    }

    #[test]
    fn test_truncated_v2_frame() {
        let mut tag = v2_tag(3, &[frame(b"TIT2", b"Cut", 3)]);
        tag.truncate(15);
        assert!(v2(&tag).is_none());
    }
}
