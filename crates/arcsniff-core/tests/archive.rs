//! Listing and extraction against archives built at test time.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use arcsniff_core::archive::{ArchiveConfig, Archiver, Backend, ContentDirs};
use arcsniff_core::system::{lha, zip::ZipReader, SystemArchiveReader, SystemTools, ToolRunner};
use arcsniff_core::{Error, Result, Signature};
use pretty_assertions::assert_eq;
use zip::write::SimpleFileOptions;

fn build_zip(path: &Path, members: &[(&str, &[u8])]) {
    let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    for (name, data) in members {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
    }
    writer.finish().unwrap();
}

fn release_zip(dir: &Path) -> PathBuf {
    let path = dir.join("upload-0001");
    build_zip(
        &path,
        &[
            ("FILE_ID.DIZ", b"Tetris clone, 1994"),
            ("TETRIS.NFO", b"cracked and packed"),
            ("DOCS/", b""),
            ("DOCS/README.TXT", b"press any key"),
            ("TETRIS.EXE", b"MZ not really"),
        ],
    );
    path
}

fn offline() -> Archiver {
    Archiver::with_config(ArchiveConfig::new().system_tools(false))
}

/// Stands in for `lha`, replaying a captured listing.
struct CapturedLha;

const LHA_LISTING: &str = "\
PERMISSION  UID  GID      SIZE  RATIO     STAMP           NAME
---------- ----------- ------- ------ ------------ --------------------
[generic]                 4150  41.3% Mar 14  1994 FILE_ID.DIZ
[generic]               123904  57.9% Mar 14  1994 TETRIS.EXE
---------- ----------- ------- ------ ------------ --------------------
 Total         2 files  128054  57.4% Mar 14  1994
";

impl SystemArchiveReader for CapturedLha {
    fn program(&self) -> &'static str {
        "lha"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".lha", ".lzh"]
    }

    fn list(&self, _: &ToolRunner, _: &Path) -> Result<Vec<String>> {
        Ok(lha::parse_listing(LHA_LISTING.as_bytes()))
    }

    fn extract(&self, _: &ToolRunner, _: &Path, _: &[&str], dest: &Path) -> Result<()> {
        fs::write(dest.join("FILE_ID.DIZ"), b"desc").map_err(|e| Error::file_write(dest, e))
    }
}

/// A zip tool that never produces output.
struct SilentZip;

impl SystemArchiveReader for SilentZip {
    fn program(&self) -> &'static str {
        "unzip"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".zip"]
    }

    fn list(&self, _: &ToolRunner, _: &Path) -> Result<Vec<String>> {
        Err(Error::ToolSilentFailure {
            program: "zipinfo".into(),
        })
    }

    fn extract(&self, _: &ToolRunner, _: &Path, _: &[&str], _: &Path) -> Result<()> {
        Err(Error::ToolSilentFailure {
            program: "unzip".into(),
        })
    }
}

fn lha_bytes() -> Vec<u8> {
    let mut data = vec![0x24, 0x3a];
    data.extend_from_slice(b"-lh5-");
    data.resize(64, 0);
    data
}

#[test]
fn lists_zip_without_directories() {
    let dir = tempfile::tempdir().unwrap();
    let src = release_zip(dir.path());

    let contents = offline().list(&src, "TETRIS.ZIP").unwrap();
    assert_eq!(
        contents.files,
        vec!["FILE_ID.DIZ", "TETRIS.NFO", "DOCS/README.TXT", "TETRIS.EXE"]
    );
    assert_eq!(contents.ext, ".zip");
    assert_eq!(contents.format, Signature::Pkzip);
    assert_eq!(contents.backend, Backend::Library);
    assert_eq!(contents.readme("TETRIS.ZIP").as_deref(), Some("TETRIS.NFO"));
}

#[test]
fn extracting_twice_yields_the_same_files() {
    let dir = tempfile::tempdir().unwrap();
    let src = release_zip(dir.path());
    let dest = dir.path().join("out");
    let archiver = offline();

    let first = archiver.extract_all(&src, "TETRIS.ZIP", &dest).unwrap();
    let second = archiver.extract_all(&src, "TETRIS.ZIP", &dest).unwrap();
    assert_eq!(first.files, second.files);
    assert_eq!(
        first.files,
        vec!["FILE_ID.DIZ", "TETRIS.NFO", "DOCS/README.TXT", "TETRIS.EXE"]
    );
    assert_eq!(
        fs::read(dest.join("DOCS").join("README.TXT")).unwrap(),
        b"press any key"
    );
}

#[test]
fn targeted_extraction_drops_directories() {
    let dir = tempfile::tempdir().unwrap();
    let src = release_zip(dir.path());
    let dest = dir.path().join("out");

    let contents = offline()
        .extract(&src, "TETRIS.ZIP", &dest, &["DOCS/README.TXT"])
        .unwrap();
    assert_eq!(contents.files, vec!["README.TXT"]);
}

#[test]
fn extraction_reports_only_the_archives_own_members() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.zip");
    let b = dir.path().join("b.zip");
    build_zip(&a, &[("A.TXT", b"a")]);
    build_zip(&b, &[("B.TXT", b"b"), ("SUB/C.TXT", b"c")]);
    let dest = dir.path().join("out");
    let archiver = offline();

    assert_eq!(archiver.extract_all(&a, "A.ZIP", &dest).unwrap().files, vec!["A.TXT"]);
    let second = archiver.extract_all(&b, "B.ZIP", &dest).unwrap();
    assert_eq!(second.files, vec!["B.TXT", "SUB/C.TXT"]);
    let targeted = archiver.extract(&b, "B.ZIP", &dest, &["B.TXT"]).unwrap();
    assert_eq!(targeted.files, vec!["B.TXT"]);
    assert!(dest.join("A.TXT").is_file());
}

#[test]
fn zip_slip_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("evil.zip");
    build_zip(&src, &[("../escaped.txt", b"gotcha")]);
    let dest = dir.path().join("out");

    let err = Archiver::new().extract_all(&src, "evil.zip", &dest).unwrap_err();
    assert!(matches!(err, Error::PathTraversal { .. }), "{err}");
    assert!(!dir.path().join("escaped.txt").exists());
}

#[test]
fn lha_named_zip_is_retried_as_lha() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("upload-0002");
    fs::write(&src, lha_bytes()).unwrap();

    let archiver = Archiver::with_config(ArchiveConfig::new().magic_probe(false))
        .with_tools(SystemTools::empty().with_reader(CapturedLha));
    assert_eq!(archiver.magic_ext(&src), Some(".lha"));

    let contents = archiver.list(&src, "TETRIS.ZIP").unwrap();
    assert_eq!(contents.files, vec!["FILE_ID.DIZ", "TETRIS.EXE"]);
    assert_eq!(contents.ext, ".lha");
    assert_eq!(contents.format, Signature::Lha);
    assert_eq!(contents.backend, Backend::Tool("lha"));
}

#[test]
fn both_paths_failing_reports_both_causes() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("broken.zip");
    fs::write(&src, b"PK\x03\x04\x14\x00\x00\x00\x08\x00 and then nothing").unwrap();

    let archiver = Archiver::new().with_tools(SystemTools::empty().with_reader(SilentZip));
    match archiver.list(&src, "broken.zip").unwrap_err() {
        Error::Fallback {
            format,
            library,
            tool,
            ..
        } => {
            assert_eq!(format, ".zip");
            assert!(matches!(*library, Error::Library { .. }));
            assert!(matches!(*tool, Error::ToolSilentFailure { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn content_dirs_reuse_completed_extractions() {
    let dir = tempfile::tempdir().unwrap();
    let src = release_zip(dir.path());
    let dirs = ContentDirs::new(dir.path().join("cache")).unwrap();
    let archiver = offline();

    let first = dirs.extract_once(&archiver, &src, "TETRIS.ZIP", "file-1").unwrap();
    assert!(!first.reused);
    assert_eq!(first.dir, dirs.root().join("file-1"));
    assert!(first.dir.join("TETRIS.NFO").is_file());

    let second = dirs.extract_once(&archiver, &src, "TETRIS.ZIP", "file-1").unwrap();
    assert!(second.reused);
    assert_eq!(second.files, first.files);

    // New content under the same key replaces the old directory
    build_zip(&src, &[("NEW.TXT", b"v2")]);
    let third = dirs.extract_once(&archiver, &src, "TETRIS.ZIP", "file-1").unwrap();
    assert!(!third.reused);
    assert_eq!(third.files, vec!["NEW.TXT"]);
    assert!(!third.dir.join("TETRIS.NFO").exists());

    let leftovers: Vec<_> = fs::read_dir(dirs.root())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, vec!["file-1"]);
}

#[test]
fn content_dirs_leave_nothing_behind_on_failure() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("broken.zip");
    fs::write(&src, b"PK\x03\x04 broken").unwrap();
    let dirs = ContentDirs::new(dir.path().join("cache")).unwrap();

    assert!(dirs
        .extract_once(&offline(), &src, "broken.zip", "file-2")
        .is_err());
    assert_eq!(fs::read_dir(dirs.root()).unwrap().count(), 0);
}

#[test]
fn concurrent_extract_once_populates_a_single_directory() {
    let dir = tempfile::tempdir().unwrap();
    let src = release_zip(dir.path());
    let dirs = ContentDirs::new(dir.path().join("cache")).unwrap();
    let archiver = offline();

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| dirs.extract_once(&archiver, &src, "TETRIS.ZIP", "shared")))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    let fresh = results
        .iter()
        .filter(|r| !r.as_ref().unwrap().reused)
        .count();
    assert_eq!(fresh, 1);
}

#[test]
fn system_unzip_lists_and_extracts() {
    let runner = ToolRunner::default();
    if !runner.available("zipinfo") || !runner.available("unzip") {
        eprintln!("skipping: zipinfo/unzip not installed");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let src = release_zip(dir.path());

    let names = ZipReader.list(&runner, &src).unwrap();
    assert!(names.contains(&"DOCS/README.TXT".to_string()));

    let dest = dir.path().join("out");
    fs::create_dir_all(&dest).unwrap();
    ZipReader.extract(&runner, &src, &[], &dest).unwrap();
    assert!(dest.join("DOCS").join("README.TXT").is_file());
}
