//! RAR listing through `unrar`.

use std::ffi::OsStr;
use std::path::Path;

use super::{lines, member_name, SystemArchiveReader, ToolRunner};
use crate::error::{Error, Result};

/// Member names from `unrar lb` output, one per line.
pub fn parse_listing(stdout: &[u8]) -> Vec<String> {
    lines(stdout).filter_map(member_name).collect()
}

/// Reader backed by `unrar`. It lists only.
#[derive(Debug, Clone, Copy, Default)]
pub struct RarReader;

impl SystemArchiveReader for RarReader {
    fn program(&self) -> &'static str {
        "unrar"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".rar"]
    }

    fn list(&self, runner: &ToolRunner, path: &Path) -> Result<Vec<String>> {
        // -p- keeps unrar from prompting for a password
        let args = [OsStr::new("lb"), OsStr::new("-p-"), path.as_os_str()];
        let out = runner.run(self.program(), args)?;
        Ok(parse_listing(&out.stdout))
    }

    fn extract(&self, _: &ToolRunner, path: &Path, _: &[&str], _: &Path) -> Result<()> {
        Err(Error::unsupported(path.to_string_lossy()))
    }

    fn can_extract(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listing() {
        let sample = b"release.nfo\nsetup.exe\ndata\\level1.dat\n";
        assert_eq!(
            parse_listing(sample),
            vec!["release.nfo", "setup.exe", "data\\level1.dat"]
        );
    }

    #[test]
    fn test_extract_is_unsupported() {
        let err = RarReader
            .extract(
                &ToolRunner::default(),
                Path::new("x.rar"),
                &[],
                Path::new("out"),
            )
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
        assert!(!RarReader.can_extract());
    }
}
