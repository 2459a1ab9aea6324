//! ZIP through Info-ZIP's `zipinfo` and `unzip`.
//!
//! This is the path for archives the `zip` crate cannot decompress,
//! Shrink, Reduce and Implode in particular.

use std::ffi::{OsStr, OsString};
use std::path::Path;

use super::{lines, member_name, SystemArchiveReader, ToolRunner};
use crate::error::Result;

/// Member names from `zipinfo -1` output, one per line.
pub fn parse_listing(stdout: &[u8]) -> Vec<String> {
    lines(stdout).filter_map(member_name).collect()
}

/// Reader backed by `zipinfo` for listing and `unzip` for extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipReader;

impl SystemArchiveReader for ZipReader {
    fn program(&self) -> &'static str {
        "unzip"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".zip"]
    }

    fn list(&self, runner: &ToolRunner, path: &Path) -> Result<Vec<String>> {
        let out = runner.run("zipinfo", [OsStr::new("-1"), path.as_os_str()])?;
        Ok(parse_listing(&out.stdout))
    }

    fn extract(
        &self,
        runner: &ToolRunner,
        path: &Path,
        targets: &[&str],
        dest: &Path,
    ) -> Result<()> {
        let mut args: Vec<OsString> = vec!["-o".into()];
        if !targets.is_empty() {
            args.push("-j".into());
        }
        args.push(path.as_os_str().to_owned());
        args.extend(targets.iter().map(OsString::from));
        args.push("-d".into());
        args.push(dest.as_os_str().to_owned());
        runner.run(self.program(), args).map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listing() {
        let sample = b"FILE_ID.DIZ\r\nDESCRIPT.ION\r\nSOURCE/\r\nSOURCE/MAIN.PAS\r\n\r\n";
        assert_eq!(
            parse_listing(sample),
            vec!["FILE_ID.DIZ", "DESCRIPT.ION", "SOURCE/", "SOURCE/MAIN.PAS"]
        );
    }

    #[test]
    fn test_parse_listing_oem_names() {
        assert_eq!(parse_listing(b"M\x81SLI.TXT\n"), vec!["MüSLI.TXT"]);
    }
}
