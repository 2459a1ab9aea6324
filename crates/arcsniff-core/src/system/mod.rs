//! System archiver fallback.
//!
//! Formats the Rust ecosystem has no reader for (ARJ, LHA, legacy ZIP
//! methods, RAR) are handed to the archivers installed on the host. Each
//! program gets a [`SystemArchiveReader`] that knows its command line and how
//! to parse its listing. [`ToolRunner`] owns process handling: lookup,
//! output capture, the deadline and failure classification.

pub mod arj;
pub mod file;
pub mod lha;
pub mod rar;
pub mod zip;

use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::archive::charset;
use crate::error::{Error, Result};

/// Default deadline for one external program run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Captured result of a successful program run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Raw standard output
    pub stdout: Vec<u8>,
}

/// Runs external programs with a deadline.
#[derive(Debug, Clone)]
pub struct ToolRunner {
    timeout: Duration,
}

impl Default for ToolRunner {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl ToolRunner {
    /// Creates a runner that kills programs running longer than `timeout`
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Resolve `program` on the PATH.
    pub fn locate(&self, program: &str) -> Result<PathBuf> {
        which::which(program).map_err(|_| Error::tool_not_found(program))
    }

    /// True when `program` is installed.
    pub fn available(&self, program: &str) -> bool {
        self.locate(program).is_ok()
    }

    /// Run `program` with `args`.
    ///
    /// A clean exit with no output at all is [`Error::ToolSilentFailure`].
    /// A non-zero exit or anything on stderr is
    /// [`Error::ToolReportedFailure`].
    pub fn run<I, S>(&self, program: &str, args: I) -> Result<ToolOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let exe = self.locate(program)?;
        debug!(program, args = ?args, "Running system tool");

        let mut child = Command::new(&exe)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::ToolReportedFailure {
                program: program.to_string(),
                status: None,
                stderr: e.to_string(),
            })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        let status = self.wait(program, &mut child)?;
        let stdout = stdout.join().unwrap_or_default();
        let stderr = String::from_utf8_lossy(&stderr.join().unwrap_or_default())
            .trim()
            .to_string();
        trace!(program, status = ?status.code(), stdout = stdout.len(), "System tool finished");

        classify(program, status, stdout, stderr)
    }

    fn wait(&self, program: &str, child: &mut Child) -> Result<ExitStatus> {
        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) if Instant::now() >= deadline => {
                    warn!(program, timeout = ?self.timeout, "System tool timed out, killing it");
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(Error::ToolTimeout {
                        program: program.to_string(),
                        timeout: self.timeout,
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    return Err(Error::ToolReportedFailure {
                        program: program.to_string(),
                        status: None,
                        stderr: e.to_string(),
                    })
                }
            }
        }
    }
}

/// Read a pipe to the end on its own thread so a chatty child never blocks
/// on a full pipe while we wait for it.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

fn classify(
    program: &str,
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: String,
) -> Result<ToolOutput> {
    if !status.success() || !stderr.is_empty() {
        return Err(Error::ToolReportedFailure {
            program: program.to_string(),
            status: status.code(),
            stderr,
        });
    }
    if stdout.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::ToolSilentFailure {
            program: program.to_string(),
        });
    }
    Ok(ToolOutput { stdout })
}

/// Split tool output into lines with line endings removed.
pub(crate) fn lines(stdout: &[u8]) -> impl Iterator<Item = &[u8]> {
    stdout.split(|&b| b == b'\n').map(|line| match line {
        [rest @ .., b'\r'] => rest,
        _ => line,
    })
}

/// Decode a member name from tool output and trim trailing padding.
pub(crate) fn member_name(raw: &[u8]) -> Option<String> {
    let name = charset::decode(raw);
    let name = name.trim_end();
    (!name.trim().is_empty()).then(|| name.to_string())
}

/// An archiver installed on the host.
pub trait SystemArchiveReader: Send + Sync {
    /// Program name looked up on the PATH
    fn program(&self) -> &'static str;

    /// Lowercase dotted extensions the program handles
    fn extensions(&self) -> &'static [&'static str];

    /// Member names, as printed by the program
    fn list(&self, runner: &ToolRunner, path: &Path) -> Result<Vec<String>>;

    /// Extract `targets`, or everything when empty, into `dest`.
    fn extract(&self, runner: &ToolRunner, path: &Path, targets: &[&str], dest: &Path)
        -> Result<()>;

    /// Whether [`SystemArchiveReader::extract`] is supported at all
    fn can_extract(&self) -> bool {
        true
    }
}

/// The set of system readers an [`Archiver`](crate::archive::Archiver)
/// may fall back to.
pub struct SystemTools {
    readers: Vec<Box<dyn SystemArchiveReader>>,
}

impl std::fmt::Debug for SystemTools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let programs: Vec<_> = self.readers.iter().map(|r| r.program()).collect();
        f.debug_struct("SystemTools")
            .field("readers", &programs)
            .finish()
    }
}

impl Default for SystemTools {
    fn default() -> Self {
        Self {
            readers: vec![
                Box::new(arj::ArjReader),
                Box::new(lha::LhaReader),
                Box::new(zip::ZipReader),
                Box::new(rar::RarReader),
            ],
        }
    }
}

impl SystemTools {
    /// No readers at all
    pub fn empty() -> Self {
        Self {
            readers: Vec::new(),
        }
    }

    /// Add a reader that takes precedence over the existing ones for its
    /// extensions
    pub fn with_reader(mut self, reader: impl SystemArchiveReader + 'static) -> Self {
        self.readers.insert(0, Box::new(reader));
        self
    }

    /// The reader for a lowercase dotted extension.
    pub fn for_ext(&self, ext: &str) -> Option<&dyn SystemArchiveReader> {
        self.readers
            .iter()
            .find(|r| r.extensions().contains(&ext))
            .map(|r| r.as_ref())
    }

    /// Programs of every registered reader
    pub fn programs(&self) -> Vec<&'static str> {
        self.readers.iter().map(|r| r.program()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn status(code: i32) -> ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus::from_raw(code << 8)
    }

    #[cfg(unix)]
    #[test]
    fn test_classify() {
        assert!(classify("unzip", status(0), b"a.txt\n".to_vec(), String::new()).is_ok());
        assert!(matches!(
            classify("unzip", status(0), b"\n".to_vec(), String::new()),
            Err(Error::ToolSilentFailure { .. })
        ));
        assert!(matches!(
            classify("unzip", status(9), Vec::new(), "bad zipfile".into()),
            Err(Error::ToolReportedFailure {
                status: Some(9),
                ..
            })
        ));
        assert!(matches!(
            classify("unzip", status(0), b"x".to_vec(), "warning".into()),
            Err(Error::ToolReportedFailure { .. })
        ));
    }

    #[test]
    fn test_missing_program() {
        let runner = ToolRunner::default();
        let err = runner
            .run("arcsniff-no-such-program", ["--help"])
            .unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_child() {
        let runner = ToolRunner::new(Duration::from_millis(100));
        if !runner.available("sleep") {
            return;
        }
        let started = Instant::now();
        let err = runner.run("sleep", ["5"]).unwrap_err();
        assert!(matches!(err, Error::ToolTimeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_stdout() {
        let runner = ToolRunner::default();
        if !runner.available("echo") {
            return;
        }
        let out = runner.run("echo", ["hello"]).unwrap();
        assert_eq!(out.stdout, b"hello\n");
    }

    #[test]
    fn test_lines_strip_crlf() {
        let got: Vec<&[u8]> = lines(b"one\r\ntwo\nthree").collect();
        assert_eq!(got, vec![&b"one"[..], b"two", b"three"]);
    }

    #[test]
    fn test_registry_lookup() {
        let tools = SystemTools::default();
        assert_eq!(tools.for_ext(".arj").map(|r| r.program()), Some("arj"));
        assert_eq!(tools.for_ext(".lzh").map(|r| r.program()), Some("lha"));
        assert_eq!(tools.for_ext(".zip").map(|r| r.program()), Some("unzip"));
        assert_eq!(tools.for_ext(".rar").map(|r| r.program()), Some("unrar"));
        assert!(tools.for_ext(".7z").is_none());
        assert!(SystemTools::empty().for_ext(".arj").is_none());
    }
}
