//! The closed set of recognised format variants.

use std::fmt;

/// One recognised, specific file-format variant.
///
/// Variants are deliberately fine grained: a ZIP archive that uses the
/// Shrink method is a different signature from one that uses Deflate, and
/// RAR v4 is distinct from RAR v5. Broad groupings are provided by the
/// category views in [`registry`](super::registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum Signature {
    /// The input contained no bytes at all
    ZeroByte,
    /// Nothing recognised the content
    Unknown,

    // Archives
    /// ZIP using store, deflate, deflate64 or a modern method
    Pkzip,
    /// ZIP using the legacy Shrink method
    PkzipShrink,
    /// ZIP using one of the four legacy Reduce factors
    PkzipReduce,
    /// ZIP using the legacy Implode method
    PkzipImplode,
    /// ZIP with a ZIP64 end of central directory
    Pkzip64,
    /// First volume of a spanned or split ZIP
    PkzipMultiVolume,
    /// PKLITE compressed executable
    Pklite,
    /// PKZIP self-extracting executable
    Pksfx,
    /// RAR format 1.5 to 4.x
    RarV4,
    /// RAR format 5
    RarV5,
    /// 7-Zip
    SevenZip,
    /// bzip2 stream
    Bzip2,
    /// gzip stream
    Gzip,
    /// XZ stream
    Xz,
    /// Zstandard frame
    Zstd,
    /// FreeArc
    FreeArc,
    /// SEA ARC and compatible dialects
    ArcSea,
    /// LHA / LHarc / LArc
    Lha,
    /// ARJ
    Arj,
    /// Microsoft cabinet
    MicrosoftCab,
    /// Zoo
    Zoo,
    /// POSIX tar
    Tar,
    /// MS-DOS KWAJ compressed file
    MsDosKwaj,
    /// MS-DOS SZDD compressed file
    MsDosSzdd,

    // Images
    /// Portable Network Graphics
    Png,
    /// Animated PNG
    Apng,
    /// GIF 87a or 89a
    Gif,
    /// JPEG / JFIF / Exif
    Jpeg,
    /// JPEG 2000
    Jpeg2000,
    /// Windows bitmap
    Bmp,
    /// ZSoft PC Paintbrush
    Pcx,
    /// TIFF, either byte order
    Tiff,
    /// WebP
    WebP,
    /// IFF interleaved bitmap
    Ilbm,
    /// Windows icon
    Ico,
    /// AV1 image format
    Avif,
    /// Adobe Photoshop
    Photoshop,

    // Audio
    /// MPEG-1 audio layer III
    Mp3,
    /// Ogg container
    Ogg,
    /// FLAC
    Flac,
    /// RIFF wave
    Wave,
    /// Audio Interchange File Format
    Aiff,
    /// Standard MIDI file
    Midi,
    /// ProTracker family module
    ModTracker,
    /// FastTracker 2 module
    ExtendedModule,
    /// Scream Tracker 3 module
    ScreamTracker3,
    /// Impulse Tracker module
    ImpulseTracker,
    /// MultiTracker module
    MultiTrackModule,

    // Video
    /// Audio Video Interleave
    Avi,
    /// Flash Video
    FlashVideo,
    /// ISO base media MP4
    Mp4,
    /// Apple QuickTime
    QuickTime,
    /// Matroska
    Matroska,
    /// WebM
    WebM,
    /// Advanced Systems Format (WMV/WMA)
    WindowsMedia,
    /// MPEG program or video stream
    Mpeg,
    /// Shockwave Flash
    ShockwaveFlash,

    // Documents
    /// Portable Document Format
    Pdf,
    /// Rich Text Format
    Rtf,
    /// PostScript
    PostScript,
    /// OLE2 compound file
    OleCompound,
    /// WinHelp
    WindowsHelp,
    /// Compiled HTML help
    HtmlHelp,

    // Programs
    /// MZ executable (DOS, NE or PE)
    MsExe,
    /// ELF binary
    Elf,
    /// Mach-O binary
    MachO,

    // Disc images
    /// ISO 9660 image
    Iso9660,
    /// Nero image
    NeroImage,
    /// PowerISO image
    PowerIso,
    /// Alcohol 120% descriptor
    AlcoholMds,

    // Text
    /// UTF-8 text with a byte order mark
    Utf8Text,
    /// UTF-16 text with a byte order mark
    Utf16Text,
    /// UTF-32 text with a byte order mark
    Utf32Text,
    /// Text containing ANSI escape sequences
    AnsiEscape,
    /// Strict 7-bit ASCII text
    AsciiText,
    /// ISO-8859-1 text
    Iso88591Text,
    /// Windows-1252 text
    Windows1252Text,
    /// Text using the full 8-bit range, typically CP437
    PlainText,
}

impl Signature {
    /// Every signature, in declaration order.
    pub const ALL: &'static [Signature] = &[
        Signature::ZeroByte,
        Signature::Unknown,
        Signature::Pkzip,
        Signature::PkzipShrink,
        Signature::PkzipReduce,
        Signature::PkzipImplode,
        Signature::Pkzip64,
        Signature::PkzipMultiVolume,
        Signature::Pklite,
        Signature::Pksfx,
        Signature::RarV4,
        Signature::RarV5,
        Signature::SevenZip,
        Signature::Bzip2,
        Signature::Gzip,
        Signature::Xz,
        Signature::Zstd,
        Signature::FreeArc,
        Signature::ArcSea,
        Signature::Lha,
        Signature::Arj,
        Signature::MicrosoftCab,
        Signature::Zoo,
        Signature::Tar,
        Signature::MsDosKwaj,
        Signature::MsDosSzdd,
        Signature::Png,
        Signature::Apng,
        Signature::Gif,
        Signature::Jpeg,
        Signature::Jpeg2000,
        Signature::Bmp,
        Signature::Pcx,
        Signature::Tiff,
        Signature::WebP,
        Signature::Ilbm,
        Signature::Ico,
        Signature::Avif,
        Signature::Photoshop,
        Signature::Mp3,
        Signature::Ogg,
        Signature::Flac,
        Signature::Wave,
        Signature::Aiff,
        Signature::Midi,
        Signature::ModTracker,
        Signature::ExtendedModule,
        Signature::ScreamTracker3,
        Signature::ImpulseTracker,
        Signature::MultiTrackModule,
        Signature::Avi,
        Signature::FlashVideo,
        Signature::Mp4,
        Signature::QuickTime,
        Signature::Matroska,
        Signature::WebM,
        Signature::WindowsMedia,
        Signature::Mpeg,
        Signature::ShockwaveFlash,
        Signature::Pdf,
        Signature::Rtf,
        Signature::PostScript,
        Signature::OleCompound,
        Signature::WindowsHelp,
        Signature::HtmlHelp,
        Signature::MsExe,
        Signature::Elf,
        Signature::MachO,
        Signature::Iso9660,
        Signature::NeroImage,
        Signature::PowerIso,
        Signature::AlcoholMds,
        Signature::Utf8Text,
        Signature::Utf16Text,
        Signature::Utf32Text,
        Signature::AnsiEscape,
        Signature::AsciiText,
        Signature::Iso88591Text,
        Signature::Windows1252Text,
        Signature::PlainText,
    ];

    /// Canonical short name
    pub fn name(&self) -> &'static str {
        use Signature::*;
        match self {
            ZeroByte => "Empty",
            Unknown => "Unknown",
            Pkzip => "ZIP",
            PkzipShrink => "ZIP shrink",
            PkzipReduce => "ZIP reduce",
            PkzipImplode => "ZIP implode",
            Pkzip64 => "ZIP64",
            PkzipMultiVolume => "ZIP multi-volume",
            Pklite => "PKLITE",
            Pksfx => "PKSFX",
            RarV4 => "RAR",
            RarV5 => "RARv5",
            SevenZip => "7z",
            Bzip2 => "bzip2",
            Gzip => "gzip",
            Xz => "xz",
            Zstd => "zstd",
            FreeArc => "FreeArc",
            ArcSea => "ARC",
            Lha => "LHA",
            Arj => "ARJ",
            MicrosoftCab => "CAB",
            Zoo => "ZOO",
            Tar => "TAR",
            MsDosKwaj => "KWAJ",
            MsDosSzdd => "SZDD",
            Png => "PNG",
            Apng => "APNG",
            Gif => "GIF",
            Jpeg => "JPEG",
            Jpeg2000 => "JPEG 2000",
            Bmp => "BMP",
            Pcx => "PCX",
            Tiff => "TIFF",
            WebP => "WebP",
            Ilbm => "ILBM",
            Ico => "ICO",
            Avif => "AVIF",
            Photoshop => "PSD",
            Mp3 => "MP3",
            Ogg => "Ogg",
            Flac => "FLAC",
            Wave => "WAV",
            Aiff => "AIFF",
            Midi => "MIDI",
            ModTracker => "MOD",
            ExtendedModule => "XM",
            ScreamTracker3 => "S3M",
            ImpulseTracker => "IT",
            MultiTrackModule => "MTM",
            Avi => "AVI",
            FlashVideo => "FLV",
            Mp4 => "MP4",
            QuickTime => "MOV",
            Matroska => "MKV",
            WebM => "WebM",
            WindowsMedia => "WMV",
            Mpeg => "MPEG",
            ShockwaveFlash => "SWF",
            Pdf => "PDF",
            Rtf => "RTF",
            PostScript => "PS",
            OleCompound => "OLE",
            WindowsHelp => "HLP",
            HtmlHelp => "CHM",
            MsExe => "MZ",
            Elf => "ELF",
            MachO => "Mach-O",
            Iso9660 => "ISO",
            NeroImage => "NRG",
            PowerIso => "DAA",
            AlcoholMds => "MDS",
            Utf8Text => "UTF-8",
            Utf16Text => "UTF-16",
            Utf32Text => "UTF-32",
            AnsiEscape => "ANSI",
            AsciiText => "ASCII",
            Iso88591Text => "ISO-8859-1",
            Windows1252Text => "Windows-1252",
            PlainText => "Text",
        }
    }

    /// Descriptive title
    pub fn title(&self) -> &'static str {
        use Signature::*;
        match self {
            ZeroByte => "zero byte file",
            Unknown => "binary data",
            Pkzip => "PKWARE zip archive",
            PkzipShrink => "PKWARE zip shrink archive",
            PkzipReduce => "PKWARE zip reduce archive",
            PkzipImplode => "PKWARE zip implode archive",
            Pkzip64 => "PKWARE zip64 archive",
            PkzipMultiVolume => "PKWARE multi-volume zip archive",
            Pklite => "PKLITE compressed executable",
            Pksfx => "PKZIP self-extracting archive",
            RarV4 => "Roshal archive",
            RarV5 => "Roshal archive v5",
            SevenZip => "7-Zip compressed archive",
            Bzip2 => "bzip2 compressed archive",
            Gzip => "gzip compressed archive",
            Xz => "XZ compressed archive",
            Zstd => "Zstandard compressed archive",
            FreeArc => "FreeArc compressed archive",
            ArcSea => "SEA ARC compressed archive",
            Lha => "Yoshi LHA compressed archive",
            Arj => "Robert Jung ARJ compressed archive",
            MicrosoftCab => "Microsoft cabinet archive",
            Zoo => "Rahul Dhesi Zoo archive",
            Tar => "tape archive",
            MsDosKwaj => "MS-DOS KWAJ compressed file",
            MsDosSzdd => "MS-DOS SZDD compressed file",
            Png => "Portable Network Graphics",
            Apng => "Animated Portable Network Graphics",
            Gif => "Graphics Interchange Format",
            Jpeg => "JPEG File Interchange Format",
            Jpeg2000 => "JPEG 2000 image",
            Bmp => "Microsoft Windows bitmap",
            Pcx => "ZSoft PC Paintbrush image",
            Tiff => "Tagged Image File Format",
            WebP => "Google WebP image",
            Ilbm => "Electronic Arts IFF interleaved bitmap",
            Ico => "Microsoft Windows icon",
            Avif => "AV1 Image File Format",
            Photoshop => "Adobe Photoshop image",
            Mp3 => "MPEG-1 audio layer III",
            Ogg => "Ogg Vorbis audio",
            Flac => "Free Lossless Audio Codec",
            Wave => "Waveform audio",
            Aiff => "Audio Interchange File Format",
            Midi => "Musical Instrument Digital Interface",
            ModTracker => "ProTracker music module",
            ExtendedModule => "FastTracker 2 extended module",
            ScreamTracker3 => "Scream Tracker 3 module",
            ImpulseTracker => "Impulse Tracker module",
            MultiTrackModule => "MultiTracker module",
            Avi => "Audio Video Interleave",
            FlashVideo => "Flash Video",
            Mp4 => "MPEG-4 Part 14 video",
            QuickTime => "Apple QuickTime movie",
            Matroska => "Matroska video",
            WebM => "WebM video",
            WindowsMedia => "Windows Media video",
            Mpeg => "MPEG-1/2 video",
            ShockwaveFlash => "Shockwave Flash",
            Pdf => "Portable Document Format",
            Rtf => "Rich Text Format",
            PostScript => "PostScript document",
            OleCompound => "Microsoft compound document",
            WindowsHelp => "Windows help file",
            HtmlHelp => "Microsoft compiled HTML help",
            MsExe => "Microsoft executable",
            Elf => "Executable and Linkable Format",
            MachO => "Mach object executable",
            Iso9660 => "ISO 9660 CD disc image",
            NeroImage => "Nero CD disc image",
            PowerIso => "PowerISO direct access archive",
            AlcoholMds => "Alcohol 120% media descriptor",
            Utf8Text => "Unicode text (UTF-8)",
            Utf16Text => "Unicode text (UTF-16)",
            Utf32Text => "Unicode text (UTF-32)",
            AnsiEscape => "ANSI escaped text",
            AsciiText => "ASCII text",
            Iso88591Text => "ISO-8859-1 text",
            Windows1252Text => "Windows-1252 text",
            PlainText => "plain text",
        }
    }

    /// File extensions associated with this signature, lowercase with dot.
    pub fn extensions(&self) -> &'static [&'static str] {
        use Signature::*;
        const TEXT: &[&str] = &[".txt", ".nfo", ".diz", ".asc", ".1st", ".me"];
        match self {
            ZeroByte | Unknown => &[],
            Pkzip | PkzipShrink | PkzipReduce | PkzipImplode | Pkzip64 => &[".zip"],
            PkzipMultiVolume => &[".zip", ".z01"],
            Pklite | Pksfx => &[".exe", ".com"],
            RarV4 | RarV5 => &[".rar"],
            SevenZip => &[".7z"],
            Bzip2 => &[".bz2", ".tbz2", ".tbz"],
            Gzip => &[".gz", ".tgz"],
            Xz => &[".xz", ".txz"],
            Zstd => &[".zst", ".tzst"],
            FreeArc => &[".arc"],
            ArcSea => &[".arc", ".ark"],
            Lha => &[".lha", ".lzh"],
            Arj => &[".arj"],
            MicrosoftCab => &[".cab"],
            Zoo => &[".zoo"],
            Tar => &[".tar"],
            MsDosKwaj | MsDosSzdd => &[".ex_", ".dl_", ".sy_"],
            Png => &[".png"],
            Apng => &[".png", ".apng"],
            Gif => &[".gif"],
            Jpeg => &[".jpg", ".jpeg", ".jfif"],
            Jpeg2000 => &[".jp2", ".j2k", ".jpf"],
            Bmp => &[".bmp"],
            Pcx => &[".pcx"],
            Tiff => &[".tif", ".tiff"],
            WebP => &[".webp"],
            Ilbm => &[".iff", ".ilbm", ".lbm"],
            Ico => &[".ico"],
            Avif => &[".avif"],
            Photoshop => &[".psd"],
            Mp3 => &[".mp3"],
            Ogg => &[".ogg", ".oga"],
            Flac => &[".flac"],
            Wave => &[".wav"],
            Aiff => &[".aif", ".aiff"],
            Midi => &[".mid", ".midi"],
            ModTracker => &[".mod"],
            ExtendedModule => &[".xm"],
            ScreamTracker3 => &[".s3m"],
            ImpulseTracker => &[".it"],
            MultiTrackModule => &[".mtm"],
            Avi => &[".avi"],
            FlashVideo => &[".flv"],
            Mp4 => &[".mp4", ".m4v", ".m4a"],
            QuickTime => &[".mov", ".qt"],
            Matroska => &[".mkv"],
            WebM => &[".webm"],
            WindowsMedia => &[".wmv", ".asf", ".wma"],
            Mpeg => &[".mpg", ".mpeg"],
            ShockwaveFlash => &[".swf"],
            Pdf => &[".pdf"],
            Rtf => &[".rtf"],
            PostScript => &[".ps", ".eps"],
            OleCompound => &[".doc", ".xls", ".ppt", ".msi"],
            WindowsHelp => &[".hlp"],
            HtmlHelp => &[".chm"],
            MsExe => &[".exe", ".com", ".dll"],
            Elf => &[".elf", ".so"],
            MachO => &[".dylib"],
            Iso9660 => &[".iso"],
            NeroImage => &[".nrg"],
            PowerIso => &[".daa"],
            AlcoholMds => &[".mds"],
            Utf8Text | Utf16Text | Utf32Text | AsciiText | Iso88591Text | Windows1252Text
            | PlainText => TEXT,
            AnsiEscape => &[".ans", ".txt", ".nfo", ".diz", ".asc"],
        }
    }

    /// The extension used when a misnamed file is renamed to match this
    /// signature, if it has one.
    pub fn canonical_ext(&self) -> Option<&'static str> {
        self.extensions().first().copied()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
