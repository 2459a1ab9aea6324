//! ARJ archives through `arj`.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use super::{lines, member_name, SystemArchiveReader, ToolRunner};
use crate::error::{Error, Result};

/// Byte column where a sequence line of `arj v` starts the member name.
pub const NAME_COLUMN: usize = 5;

/// True for the `NNN) ` sequence lines that open each entry in a verbose
/// listing.
fn is_sequence_line(line: &[u8]) -> bool {
    matches!(line, [d0, d1, d2, b')', ..] if [d0, d1, d2].iter().all(|d| d.is_ascii_digit()))
}

/// Member names from `arj v` output.
pub fn parse_listing(stdout: &[u8]) -> Vec<String> {
    lines(stdout)
        .filter(|line| is_sequence_line(line))
        .filter_map(|line| line.get(NAME_COLUMN..).and_then(member_name))
        .collect()
}

/// A path `arj` will accept: the source itself when it already ends in
/// `.arj`, otherwise a copy under that name in a scratch directory.
struct ArjName {
    path: PathBuf,
    _scratch: Option<TempDir>,
}

impl ArjName {
    fn for_source(path: &Path) -> Result<Self> {
        let named = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("arj"));
        if named {
            return Ok(Self {
                path: path.to_path_buf(),
                _scratch: None,
            });
        }

        let scratch = tempfile::Builder::new()
            .prefix("arcsniff-arj-")
            .tempdir()
            .map_err(|e| Error::directory_create(std::env::temp_dir(), e))?;
        let copy = scratch.path().join("source.arj");
        debug!(path = %path.display(), copy = %copy.display(), "Renaming source for arj");
        fs::copy(path, &copy).map_err(|e| Error::file_write(&copy, e))?;
        Ok(Self {
            path: copy,
            _scratch: Some(scratch),
        })
    }
}

/// arj treats a destination ending in a separator as a directory.
fn dest_dir(dest: &Path) -> OsString {
    let mut dir = dest.as_os_str().to_owned();
    if !dest.to_string_lossy().ends_with(std::path::MAIN_SEPARATOR) {
        dir.push(std::path::MAIN_SEPARATOR_STR);
    }
    dir
}

/// Reader backed by the `arj` program.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArjReader;

impl SystemArchiveReader for ArjReader {
    fn program(&self) -> &'static str {
        "arj"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".arj"]
    }

    fn list(&self, runner: &ToolRunner, path: &Path) -> Result<Vec<String>> {
        let source = ArjName::for_source(path)?;
        let out = runner.run(self.program(), [OsStr::new("v"), source.path.as_os_str()])?;
        Ok(parse_listing(&out.stdout))
    }

    fn extract(
        &self,
        runner: &ToolRunner,
        path: &Path,
        targets: &[&str],
        dest: &Path,
    ) -> Result<()> {
        let source = ArjName::for_source(path)?;
        // `e` extracts without stored paths, `x` keeps them
        let command = if targets.is_empty() { "x" } else { "e" };
        let mut args: Vec<OsString> = vec![
            command.into(),
            "-y".into(),
            source.path.as_os_str().to_owned(),
            dest_dir(dest),
        ];
        args.extend(targets.iter().map(OsString::from));
        runner.run(self.program(), args).map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
ARJ32 v 3.10, Copyright (c) 1998-2004, ARJ Software Russia. [08 Oct 2004]

Processing archive: DOOM.ARJ
Archive created: 1994-01-12 18:30:02, modified: 1994-01-12 18:30:04
Sequence/Pathname/Comment/Chapters
Rev/Host OS    Original Compressed Ratio DateTime modified Attributes/GUA BPMGS
------------ ---------- ---------- ----- ----------------- -------------- -----
001) DOOM.NFO
 11 MS-DOS          2816       1290 0.458 94-01-12 18:29:40                  1
002) FILE_ID.DIZ
 11 MS-DOS           420        311 0.740 94-01-12 18:29:52                  1
003) SETUP/INSTALL.EXE
 11 MS-DOS         48640      26212 0.539 94-01-12 18:30:00                  1
------------ ---------- ---------- ----- -----------------
     3 files       51876      27813 0.536
";

    #[test]
    fn test_parse_listing() {
        assert_eq!(
            parse_listing(SAMPLE.as_bytes()),
            vec!["DOOM.NFO", "FILE_ID.DIZ", "SETUP/INSTALL.EXE"]
        );
    }

    #[test]
    fn test_sequence_lines() {
        assert!(is_sequence_line(b"001) A.TXT"));
        assert!(is_sequence_line(b"123)"));
        assert!(!is_sequence_line(b" 11 MS-DOS   2816"));
        assert!(!is_sequence_line(b"12) SHORT"));
        assert!(!is_sequence_line(b"abc) NOPE"));
    }

    #[test]
    fn test_misnamed_source_is_copied() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("upload.bin");
        fs::write(&src, b"dummy").unwrap();
        let named = ArjName::for_source(&src).unwrap();
        assert_eq!(named.path.extension().unwrap(), "arj");
        assert_eq!(fs::read(&named.path).unwrap(), b"dummy");

        let already = dir.path().join("GAME.ARJ");
        fs::write(&already, b"dummy").unwrap();
        assert_eq!(ArjName::for_source(&already).unwrap().path, already);
    }

    #[test]
    fn test_dest_dir_has_trailing_separator() {
        let dir = dest_dir(Path::new("out"));
        assert!(dir.to_string_lossy().ends_with(std::path::MAIN_SEPARATOR));
    }
}
