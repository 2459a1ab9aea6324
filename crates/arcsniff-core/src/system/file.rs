//! Second opinion from the `file` utility.

use std::ffi::OsStr;
use std::path::Path;

use tracing::debug;

use super::ToolRunner;
use crate::error::Result;

/// Description prefixes printed by `file --brief`, with the extension the
/// lister should retry under. Checked in order.
const DESCRIPTIONS: &[(&str, &str)] = &[
    ("zip archive", ".zip"),
    ("lharc", ".lha"),
    ("lha", ".lha"),
    ("arj archive", ".arj"),
    ("rar archive", ".rar"),
    ("7-zip archive", ".7z"),
    ("gzip compressed", ".gz"),
    ("bzip2 compressed", ".bz2"),
    ("xz compressed", ".xz"),
    ("zstandard compressed", ".zst"),
    ("posix tar archive", ".tar"),
    ("tar archive", ".tar"),
    ("microsoft cabinet", ".cab"),
];

/// Map a `file --brief` description to an archive extension.
pub fn parse_magic(description: &str) -> Option<&'static str> {
    let description = description.trim().to_ascii_lowercase();
    DESCRIPTIONS
        .iter()
        .find(|(prefix, _)| description.starts_with(prefix))
        .map(|(_, ext)| *ext)
}

/// Ask `file` what `path` contains.
pub fn probe(runner: &ToolRunner, path: &Path) -> Result<Option<&'static str>> {
    let out = runner.run("file", [OsStr::new("--brief"), path.as_os_str()])?;
    let description = String::from_utf8_lossy(&out.stdout);
    let ext = parse_magic(&description);
    debug!(path = %path.display(), description = %description.trim(), ext = ?ext, "file probe");
    Ok(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_magic() {
        assert_eq!(
            parse_magic("Zip archive data, at least v1.0 to extract\n"),
            Some(".zip")
        );
        assert_eq!(
            parse_magic("LHarc 1.x/ARX archive data  [lh5], 0x0 OS"),
            Some(".lha")
        );
        assert_eq!(
            parse_magic("LHa 2.x? archive data  [lh5] [NSRL|LHA2]"),
            Some(".lha")
        );
        assert_eq!(
            parse_magic("ARJ archive data, v11, slash-switched, original name: GAME.ARJ"),
            Some(".arj")
        );
        assert_eq!(parse_magic("RAR archive data, v1d, os: Win32"), Some(".rar"));
        assert_eq!(parse_magic("7-zip archive data, version 0.4"), Some(".7z"));
        assert_eq!(
            parse_magic("gzip compressed data, was \"a.tar\", from Unix"),
            Some(".gz")
        );
        assert_eq!(parse_magic("POSIX tar archive (GNU)"), Some(".tar"));
    }

    #[test]
    fn test_parse_magic_non_archives() {
        assert_eq!(parse_magic("ASCII text"), None);
        assert_eq!(parse_magic("PE32 executable (GUI) Intel 80386"), None);
        assert_eq!(parse_magic(""), None);
    }
}
