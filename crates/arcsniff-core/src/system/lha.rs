//! LHA / LZH archives through `lha`.

use std::ffi::{OsStr, OsString};
use std::path::Path;

use super::{lines, member_name, SystemArchiveReader, ToolRunner};
use crate::error::Result;

/// Byte column where `lha -l` starts the member name, after the fixed-width
/// permission, owner, size, ratio and stamp fields.
pub const NAME_COLUMN: usize = 51;

const RULE: &[u8] = b"----------";

/// Member names from `lha -l` output.
///
/// Rows sit between the first and second rule lines. Anything shorter
/// than [`NAME_COLUMN`] is ignored.
pub fn parse_listing(stdout: &[u8]) -> Vec<String> {
    let mut inside = false;
    let mut names = Vec::new();
    for line in lines(stdout) {
        if line.starts_with(RULE) {
            if inside {
                break;
            }
            inside = true;
            continue;
        }
        if !inside {
            continue;
        }
        if let Some(name) = line.get(NAME_COLUMN..).and_then(member_name) {
            names.push(name);
        }
    }
    names
}

/// Reader backed by the `lha` program.
#[derive(Debug, Clone, Copy, Default)]
pub struct LhaReader;

impl SystemArchiveReader for LhaReader {
    fn program(&self) -> &'static str {
        "lha"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".lha", ".lzh"]
    }

    fn list(&self, runner: &ToolRunner, path: &Path) -> Result<Vec<String>> {
        let out = runner.run(self.program(), [OsStr::new("-l"), path.as_os_str()])?;
        Ok(parse_listing(&out.stdout))
    }

    fn extract(
        &self,
        runner: &ToolRunner,
        path: &Path,
        targets: &[&str],
        dest: &Path,
    ) -> Result<()> {
        // `i` drops stored directories, `f` overwrites without asking
        let mode = if targets.is_empty() { "-ef" } else { "-eif" };
        let mut args: Vec<OsString> = vec![
            format!("{mode}w={}", dest.display()).into(),
            path.as_os_str().to_owned(),
        ];
        args.extend(targets.iter().map(OsString::from));
        runner.run(self.program(), args).map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
PERMISSION  UID  GID      SIZE  RATIO     STAMP           NAME
---------- ----------- ------- ------ ------------ --------------------
[generic]                 4150  41.3% Mar 14  1994 FILE_ID.DIZ
[generic]               123904  57.9% Mar 14  1994 TETRIS.EXE
-rw-r--r--  1000/1000     2048 100.0% Jan  2 10:30 docs/READ ME.TXT
---------- ----------- ------- ------ ------------ --------------------
 Total         3 files  130102  57.4% Jan  2 10:30
";

    #[test]
    fn test_parse_listing() {
        assert_eq!(
            parse_listing(SAMPLE.as_bytes()),
            vec!["FILE_ID.DIZ", "TETRIS.EXE", "docs/READ ME.TXT"]
        );
    }

    #[test]
    fn test_parse_listing_crlf_and_short_rows() {
        let sample = SAMPLE.replace('\n', "\r\n").replace(
            "[generic]                 4150",
            "broken row\r\n[generic]                 4150",
        );
        assert_eq!(parse_listing(sample.as_bytes()).len(), 3);
    }

    #[test]
    fn test_parse_listing_without_rules() {
        assert!(parse_listing(b"LHa: Error: not an archive\n").is_empty());
    }

    #[test]
    fn test_cp437_names() {
        let mut sample = SAMPLE.as_bytes().to_vec();
        let at = sample
            .windows(6)
            .position(|w| w == b"TETRIS")
            .unwrap();
        sample[at] = 0x8e;
        let names = parse_listing(&sample);
        assert_eq!(names[1], "\u{c4}ETRIS.EXE");
    }
}
