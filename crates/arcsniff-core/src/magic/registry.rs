//! The format registry.
//!
//! Maps each [`Signature`] to the predicate that recognises it and keeps the
//! derived lookup tables: extension to candidate signatures, and the fixed
//! category lists. All tables are built on first use and never change.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;

use super::signature::Signature;
use super::window::ByteSource;
use super::{archive, document, image, media, program, text};

/// A signature predicate.
pub type Matcher = fn(&dyn ByteSource) -> bool;

/// Binary matchers in detection priority order.
///
/// Strong multi-byte magic at offset 0 comes first. Weak or far-offset
/// checks (MOD tags at 1080, ISO descriptors at 32 KiB, single byte PCX and
/// ARC markers, MP3 frame sync) come last.
const BINARY: &[(Signature, Matcher)] = &[
    (Signature::Pkzip64, archive::pkzip64),
    (Signature::Pkzip, archive::pkzip),
    (Signature::PkzipShrink, archive::pkzip_shrink),
    (Signature::PkzipReduce, archive::pkzip_reduce),
    (Signature::PkzipImplode, archive::pkzip_implode),
    (Signature::PkzipMultiVolume, archive::pkzip_multi_volume),
    (Signature::Pklite, archive::pklite),
    (Signature::Pksfx, archive::pksfx),
    (Signature::RarV4, archive::rar_v4),
    (Signature::RarV5, archive::rar_v5),
    (Signature::SevenZip, archive::seven_zip),
    (Signature::Bzip2, archive::bzip2),
    (Signature::Xz, archive::xz),
    (Signature::Zstd, archive::zstd),
    (Signature::FreeArc, archive::free_arc),
    (Signature::MicrosoftCab, archive::microsoft_cab),
    (Signature::Zoo, archive::zoo),
    (Signature::MsDosKwaj, archive::kwaj),
    (Signature::MsDosSzdd, archive::szdd),
    (Signature::Lha, archive::lha),
    (Signature::Arj, archive::arj),
    (Signature::Tar, archive::tar),
    (Signature::Gzip, archive::gzip),
    (Signature::Apng, image::apng),
    (Signature::Png, image::png),
    (Signature::Gif, image::gif),
    (Signature::Jpeg2000, image::jpeg2000),
    (Signature::Jpeg, image::jpeg),
    (Signature::Tiff, image::tiff),
    (Signature::WebP, image::webp),
    (Signature::Ilbm, image::ilbm),
    (Signature::Avif, image::avif),
    (Signature::Photoshop, image::photoshop),
    (Signature::Bmp, image::bmp),
    (Signature::Pdf, document::pdf),
    (Signature::Rtf, document::rtf),
    (Signature::PostScript, document::postscript),
    (Signature::OleCompound, document::ole_compound),
    (Signature::HtmlHelp, document::html_help),
    (Signature::WindowsHelp, document::windows_help),
    (Signature::Elf, program::elf),
    (Signature::MachO, program::macho),
    (Signature::MsExe, program::ms_exe),
    (Signature::Flac, media::flac),
    (Signature::Ogg, media::ogg),
    (Signature::Wave, media::wave),
    (Signature::Aiff, media::aiff),
    (Signature::Midi, media::midi),
    (Signature::Avi, media::avi),
    (Signature::FlashVideo, media::flash_video),
    (Signature::Mp4, media::mp4),
    (Signature::QuickTime, media::quicktime),
    (Signature::WebM, media::webm),
    (Signature::Matroska, media::matroska),
    (Signature::WindowsMedia, media::windows_media),
    (Signature::Mpeg, media::mpeg),
    (Signature::ShockwaveFlash, media::shockwave_flash),
    (Signature::ExtendedModule, media::extended_module),
    (Signature::ImpulseTracker, media::impulse_tracker),
    (Signature::MultiTrackModule, media::multitrack_module),
    (Signature::PowerIso, document::power_iso),
    (Signature::AlcoholMds, document::alcohol_mds),
    (Signature::Iso9660, document::iso9660),
    (Signature::NeroImage, document::nero_image),
    (Signature::ScreamTracker3, media::scream_tracker3),
    (Signature::ModTracker, media::mod_tracker),
    (Signature::Mp3, media::mp3),
    (Signature::Ico, image::ico),
    (Signature::Pcx, image::pcx),
    (Signature::ArcSea, archive::arc_sea),
];

/// Text matchers, narrowest first. These only run once every binary
/// matcher has declined.
const TEXT: &[(Signature, Matcher)] = &[
    (Signature::Utf32Text, text::utf32),
    (Signature::Utf16Text, text::utf16),
    (Signature::Utf8Text, text::utf8),
    (Signature::AnsiEscape, text::ansi),
    (Signature::AsciiText, text::ascii),
    (Signature::Iso88591Text, text::iso88591),
    (Signature::Windows1252Text, text::windows1252),
    (Signature::PlainText, text::plain),
];

fn zero_byte(r: &dyn ByteSource) -> bool {
    r.size() == 0
}

/// Signature to matcher lookup.
pub struct Finder {
    index: HashMap<Signature, Matcher>,
}

impl std::fmt::Debug for Finder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Finder")
            .field("matchers", &self.index.len())
            .finish()
    }
}

impl Finder {
    fn build() -> Self {
        let mut index: HashMap<Signature, Matcher> = BINARY.iter().chain(TEXT).copied().collect();
        index.insert(Signature::ZeroByte, zero_byte);
        Self { index }
    }

    /// The matcher for `sig`. Only [`Signature::Unknown`] has none.
    pub fn get(&self, sig: Signature) -> Option<Matcher> {
        self.index.get(&sig).copied()
    }

    /// Binary matchers in priority order.
    pub fn binary(&self) -> impl Iterator<Item = (Signature, Matcher)> + '_ {
        BINARY.iter().copied()
    }

    /// Text matchers, narrowest first.
    pub fn text(&self) -> impl Iterator<Item = (Signature, Matcher)> + '_ {
        TEXT.iter().copied()
    }

    /// Every registered matcher: binary ones in priority order, then text.
    pub fn iter(&self) -> impl Iterator<Item = (Signature, Matcher)> + '_ {
        self.binary().chain(self.text())
    }

    /// Absolute priority of `sig` in detection order, lower runs first.
    pub fn priority(&self, sig: Signature) -> Option<usize> {
        self.iter().position(|(s, _)| s == sig)
    }
}

static FINDER: Lazy<Finder> = Lazy::new(Finder::build);

static EXTENSIONS: Lazy<HashMap<&'static str, Vec<Signature>>> = Lazy::new(|| {
    let mut table: HashMap<&'static str, Vec<Signature>> = HashMap::new();
    for &sig in Signature::ALL {
        for ext in sig.extensions() {
            table.entry(*ext).or_default().push(sig);
        }
    }
    table
});

/// The process-wide registry.
pub fn finder() -> &'static Finder {
    &FINDER
}

/// Normalise an extension to lowercase with a leading dot.
pub fn normalize_ext(ext: &str) -> String {
    let ext = ext.trim().to_ascii_lowercase();
    if ext.is_empty() || ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

/// Lowercase, dotted extension of `filename`, if it has one.
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(normalize_ext)
}

/// Signatures claiming `ext`, in declaration order. Accepts `zip`, `.zip`
/// or `.ZIP`.
pub fn extension_candidates(ext: &str) -> &'static [Signature] {
    EXTENSIONS
        .get(normalize_ext(ext).as_str())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Every extension the registry knows, sorted.
pub fn known_extensions() -> Vec<&'static str> {
    let mut exts: Vec<_> = EXTENSIONS.keys().copied().collect();
    exts.sort_unstable();
    exts
}

/// Archive formats.
pub fn archives() -> &'static [Signature] {
    &[
        Signature::Pkzip64,
        Signature::Pkzip,
        Signature::PkzipShrink,
        Signature::PkzipReduce,
        Signature::PkzipImplode,
        Signature::PkzipMultiVolume,
        Signature::Pksfx,
        Signature::RarV4,
        Signature::RarV5,
        Signature::SevenZip,
        Signature::Bzip2,
        Signature::Xz,
        Signature::Zstd,
        Signature::FreeArc,
        Signature::MicrosoftCab,
        Signature::Zoo,
        Signature::MsDosKwaj,
        Signature::MsDosSzdd,
        Signature::Lha,
        Signature::Arj,
        Signature::Tar,
        Signature::Gzip,
        Signature::ArcSea,
    ]
}

/// Image formats.
pub fn images() -> &'static [Signature] {
    &[
        Signature::Apng,
        Signature::Png,
        Signature::Gif,
        Signature::Jpeg2000,
        Signature::Jpeg,
        Signature::Tiff,
        Signature::WebP,
        Signature::Ilbm,
        Signature::Avif,
        Signature::Photoshop,
        Signature::Bmp,
        Signature::Ico,
        Signature::Pcx,
    ]
}

/// Executables, including compressed and self-extracting ones.
pub fn programs() -> &'static [Signature] {
    &[
        Signature::Pklite,
        Signature::Pksfx,
        Signature::Elf,
        Signature::MachO,
        Signature::MsExe,
    ]
}

/// Documents.
pub fn documents() -> &'static [Signature] {
    &[
        Signature::Pdf,
        Signature::Rtf,
        Signature::PostScript,
        Signature::OleCompound,
        Signature::HtmlHelp,
        Signature::WindowsHelp,
    ]
}

/// Video and animation formats.
pub fn videos() -> &'static [Signature] {
    &[
        Signature::Avi,
        Signature::FlashVideo,
        Signature::Mp4,
        Signature::QuickTime,
        Signature::WebM,
        Signature::Matroska,
        Signature::WindowsMedia,
        Signature::Mpeg,
        Signature::ShockwaveFlash,
    ]
}

/// Audio and tracker music.
pub fn audio() -> &'static [Signature] {
    &[
        Signature::Flac,
        Signature::Ogg,
        Signature::Wave,
        Signature::Aiff,
        Signature::Midi,
        Signature::ExtendedModule,
        Signature::ImpulseTracker,
        Signature::MultiTrackModule,
        Signature::ScreamTracker3,
        Signature::ModTracker,
        Signature::Mp3,
    ]
}

/// CD and DVD images.
pub fn disc_images() -> &'static [Signature] {
    &[
        Signature::PowerIso,
        Signature::AlcoholMds,
        Signature::Iso9660,
        Signature::NeroImage,
    ]
}

/// Text encodings, narrowest first.
pub fn texts() -> &'static [Signature] {
    &[
        Signature::Utf32Text,
        Signature::Utf16Text,
        Signature::Utf8Text,
        Signature::AnsiEscape,
        Signature::AsciiText,
        Signature::Iso88591Text,
        Signature::Windows1252Text,
        Signature::PlainText,
    ]
}

/// Formats typical of DOS and BBS era releases. Overlaps the other views.
pub fn legacy() -> &'static [Signature] {
    &[
        Signature::PkzipShrink,
        Signature::PkzipReduce,
        Signature::PkzipImplode,
        Signature::Pklite,
        Signature::Pksfx,
        Signature::ArcSea,
        Signature::Lha,
        Signature::Arj,
        Signature::Zoo,
        Signature::MsDosKwaj,
        Signature::MsDosSzdd,
        Signature::Pcx,
        Signature::Ilbm,
        Signature::ModTracker,
        Signature::ExtendedModule,
        Signature::ScreamTracker3,
        Signature::ImpulseTracker,
        Signature::MultiTrackModule,
        Signature::WindowsHelp,
        Signature::AnsiEscape,
        Signature::PlainText,
    ]
}

type View = fn() -> &'static [Signature];

const CATEGORIES: &[(&str, View)] = &[
    ("archive", archives),
    ("image", images),
    ("program", programs),
    ("document", documents),
    ("video", videos),
    ("audio", audio),
    ("disc", disc_images),
    ("text", texts),
    ("legacy", legacy),
];

/// Named category views, used by the CLI format tables.
pub fn categories() -> &'static [(&'static str, View)] {
    CATEGORIES
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_signature_but_unknown_has_a_matcher() {
        for &sig in Signature::ALL {
            match sig {
                Signature::Unknown => assert!(finder().get(sig).is_none()),
                _ => assert!(finder().get(sig).is_some(), "{sig:?} has no matcher"),
            }
        }
    }

    #[test]
    fn test_priority_lists_have_no_duplicates() {
        let seen: HashSet<_> = finder().iter().map(|(s, _)| s).collect();
        assert_eq!(seen.len(), BINARY.len() + TEXT.len());
    }

    #[test]
    fn test_extension_candidates() {
        let zips = extension_candidates("ZIP");
        assert!(zips.contains(&Signature::Pkzip));
        assert!(zips.contains(&Signature::PkzipShrink));
        assert_eq!(extension_candidates(".arj"), &[Signature::Arj]);
        assert!(extension_candidates(".nope").is_empty());
        assert!(extension_candidates("").is_empty());
    }

    #[test]
    fn test_arc_is_shared_by_two_formats() {
        let arc = extension_candidates(".arc");
        assert!(arc.contains(&Signature::FreeArc));
        assert!(arc.contains(&Signature::ArcSea));
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("FILE.ZIP").as_deref(), Some(".zip"));
        assert_eq!(extension_of("archive.tar.gz").as_deref(), Some(".gz"));
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of(".hidden"), None);
    }

    #[test]
    fn test_categories_only_hold_registered_signatures() {
        for (name, view) in categories() {
            for sig in view() {
                assert!(finder().get(*sig).is_some(), "{name}: {sig:?}");
            }
        }
        assert!(legacy().contains(&Signature::Arj));
        assert!(archives().contains(&Signature::Arj));
    }

    #[test]
    fn test_mz_after_pklite() {
        let f = finder();
        assert!(f.priority(Signature::Pklite) < f.priority(Signature::MsExe));
        assert!(f.priority(Signature::Pkzip64) < f.priority(Signature::Pkzip));
    }
}
