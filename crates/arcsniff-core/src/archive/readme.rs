//! Picking the text file that best describes a release.
//!
//! A BBS release usually ships an NFO named after the archive, a
//! `FILE_ID.DIZ` for the board's file listing, and assorted readmes. Each
//! candidate gets a [`Usability`] rank and the lowest rank wins.

use std::path::Path;

/// How useful a member is as the release description. Lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Usability {
    /// `.nfo` sharing the archive's base name
    SameBaseNfo = 1,
    /// `.txt` sharing the archive's base name
    SameBaseTxt,
    /// Any other `.nfo`
    Nfo,
    /// `FILE_ID.DIZ`
    FileIdDiz,
    /// Any other `.diz`, or a `readme` with an extension other than `.txt`
    Diz,
    /// Any other `.txt`
    Txt,
    /// `README.TXT`, usually generic installer boilerplate
    ReadmeTxt,
}

impl Usability {
    /// Rank `member` against the archive base name, or `None` if it is not a
    /// description file at all.
    pub fn rank(member: &str, archive_base: &str) -> Option<Self> {
        let file = Path::new(member).file_name()?.to_str()?.to_ascii_lowercase();
        let path = Path::new(&file);
        let stem = path.file_stem()?.to_str()?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let same_base = !archive_base.is_empty() && stem == archive_base;

        Some(match ext {
            "nfo" if same_base => Usability::SameBaseNfo,
            "txt" if same_base => Usability::SameBaseTxt,
            "nfo" => Usability::Nfo,
            "diz" if stem == "file_id" => Usability::FileIdDiz,
            "diz" => Usability::Diz,
            "txt" if stem == "readme" => Usability::ReadmeTxt,
            "txt" => Usability::Txt,
            _ if stem == "readme" => Usability::Diz,
            _ => return None,
        })
    }
}

/// Ranked description candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Finds {
    ranked: Vec<(Usability, String)>,
}

impl Finds {
    /// Rank every member of an archive.
    pub fn new(archive_name: &str, files: &[String]) -> Self {
        let base = archive_base(archive_name);
        let ranked = files
            .iter()
            .filter_map(|f| Usability::rank(f, &base).map(|u| (u, f.clone())))
            .collect();
        Self { ranked }
    }

    /// Candidates in rank order.
    pub fn ranked(&self) -> Vec<(Usability, &str)> {
        let mut out: Vec<_> = self.ranked.iter().map(|(u, f)| (*u, f.as_str())).collect();
        out.sort();
        out
    }

    /// The single best candidate. Ties within a rank go to the
    /// lexicographically smallest name, so member order never matters.
    pub fn best_match(&self) -> Option<&str> {
        self.ranked
            .iter()
            .min_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
            .map(|(_, f)| f.as_str())
    }

    /// True when nothing qualified.
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

/// Lowercase archive name without directory and extension.
fn archive_base(archive_name: &str) -> String {
    Path::new(archive_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// Choose the member that best describes the archive.
pub fn readme(archive_name: &str, files: &[String]) -> Option<String> {
    Finds::new(archive_name, files).best_match().map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_same_base_nfo_wins() {
        let files = names(&["README.TXT", "FILE_ID.DIZ", "other.nfo", "RZR-GAME.NFO"]);
        assert_eq!(readme("rzr-game.zip", &files).as_deref(), Some("RZR-GAME.NFO"));
    }

    #[test]
    fn test_rank_order() {
        let files = names(&["README.TXT", "notes.txt", "FILE_ID.DIZ"]);
        assert_eq!(readme("release.zip", &files).as_deref(), Some("FILE_ID.DIZ"));
        let files = names(&["README.TXT", "notes.txt"]);
        assert_eq!(readme("release.zip", &files).as_deref(), Some("notes.txt"));
        let files = names(&["README.TXT", "readme.doc"]);
        assert_eq!(readme("release.zip", &files).as_deref(), Some("readme.doc"));
    }

    #[test]
    fn test_iteration_order_does_not_decide() {
        let forward = names(&["b.nfo", "a.nfo"]);
        let backward = names(&["a.nfo", "b.nfo"]);
        assert_eq!(readme("x.zip", &forward), readme("x.zip", &backward));
        assert_eq!(readme("x.zip", &forward).as_deref(), Some("a.nfo"));
    }

    #[test]
    fn test_nested_members_use_file_name() {
        let files = names(&["docs/GAME.TXT", "bin/game.exe"]);
        assert_eq!(readme("game.lzh", &files).as_deref(), Some("docs/GAME.TXT"));
        assert_eq!(
            Usability::rank("docs/GAME.TXT", "game"),
            Some(Usability::SameBaseTxt)
        );
    }

    #[test]
    fn test_no_candidates() {
        assert_eq!(readme("x.zip", &names(&["game.exe", "data.dat"])), None);
        assert!(Finds::new("x.zip", &[]).is_empty());
    }
}
