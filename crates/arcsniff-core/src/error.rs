//! Error types for the arcsniff-core library.
//!
//! Every failure the archive layer can produce is a variant of [`Error`].
//! The in-process library path and the system-tool path share the type so
//! that the lister can decide, per variant, whether a fallback is worth trying
//! (see [`Error::triggers_fallback`]).

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for arcsniff operations
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all arcsniff operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write output file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        /// Path to the file that failed to write
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to create output directory
    #[error("failed to create directory '{path}': {source}")]
    DirectoryCreate {
        /// Path to the directory that failed to create
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Path traversal attempt detected (security error)
    #[error("path traversal detected: '{path}' would escape output directory")]
    PathTraversal {
        /// The suspicious path
        path: PathBuf,
    },

    /// The filename extension maps to no known archive handler
    #[error("unsupported archive format: '{filename}'")]
    UnsupportedFormat {
        /// The claimed filename
        filename: String,
    },

    /// The content cannot be walked as a container
    #[error("'{path}' is not a readable archive: {details}")]
    NotAnArchive {
        /// The archive path
        path: PathBuf,
        /// Why the content was rejected
        details: String,
    },

    /// The extraction target is unusable
    #[error("invalid destination '{path}': {details}")]
    DestinationInvalid {
        /// The destination path
        path: PathBuf,
        /// Why the destination was rejected
        details: String,
    },

    /// The archive source does not exist
    #[error("archive source '{path}' does not exist")]
    SourceMissing {
        /// The missing path
        path: PathBuf,
    },

    /// The archive source is a directory
    #[error("archive source '{path}' is a directory")]
    SourceIsDirectory {
        /// The directory path
        path: PathBuf,
    },

    /// The claimed extension contradicts the content
    #[error("'{filename}' is named as one format but the content is {detected}")]
    ExtensionMismatch {
        /// The claimed filename
        filename: String,
        /// Short name of the detected signature
        detected: String,
    },

    /// The external program is not on the execution path
    #[error("program '{program}' was not found on the PATH")]
    ToolNotFound {
        /// Program name
        program: String,
    },

    /// The program exited cleanly but printed nothing
    #[error("program '{program}' exited without output or diagnostics")]
    ToolSilentFailure {
        /// Program name
        program: String,
    },

    /// The program reported an error
    #[error("program '{program}' failed (exit status {status:?}): {stderr}")]
    ToolReportedFailure {
        /// Program name
        program: String,
        /// Exit code, `None` when terminated by a signal
        status: Option<i32>,
        /// Captured standard error
        stderr: String,
    },

    /// The program did not finish in time and was killed
    #[error("program '{program}' timed out after {timeout:?}")]
    ToolTimeout {
        /// Program name
        program: String,
        /// The deadline that was exceeded
        timeout: Duration,
    },

    /// A third-party archive library panicked
    #[error("{format} library panicked: {message}")]
    LibraryPanic {
        /// Archive format being read
        format: String,
        /// Panic payload, when it was a string
        message: String,
    },

    /// A third-party archive library returned an error
    #[error("{format} library failed: {details}")]
    Library {
        /// Archive format being read
        format: String,
        /// Library error text
        details: String,
    },

    /// Both the library and the system tool failed
    #[error("could not read '{path}' as {format}: {library}; fallback: {tool}")]
    Fallback {
        /// The archive path
        path: PathBuf,
        /// Extension that was attempted
        format: String,
        /// Error from the in-process library
        library: Box<Error>,
        /// Error from the system tool
        #[source]
        tool: Box<Error>,
    },
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new file write error
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a new directory creation error
    pub fn directory_create(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryCreate {
            path: path.into(),
            source,
        }
    }

    /// Creates a new path traversal error
    pub fn path_traversal(path: impl Into<PathBuf>) -> Self {
        Self::PathTraversal { path: path.into() }
    }

    /// Creates a new unsupported format error
    pub fn unsupported(filename: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            filename: filename.into(),
        }
    }

    /// Creates a new not-an-archive error
    pub fn not_an_archive(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        Self::NotAnArchive {
            path: path.into(),
            details: details.into(),
        }
    }

    /// Creates a new destination error
    pub fn destination(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        Self::DestinationInvalid {
            path: path.into(),
            details: details.into(),
        }
    }

    /// Creates a new library error
    pub fn library(format: impl Into<String>, details: impl ToString) -> Self {
        Self::Library {
            format: format.into(),
            details: details.to_string(),
        }
    }

    /// Creates a new tool-not-found error
    pub fn tool_not_found(program: impl Into<String>) -> Self {
        Self::ToolNotFound {
            program: program.into(),
        }
    }

    /// Returns true if a failure on the in-process path should be retried
    /// through the system tools.
    ///
    /// An extension mismatch is handled by the lister with one retry under the
    /// corrected name and so is excluded, as are caller mistakes that no tool
    /// could fix.
    pub fn triggers_fallback(&self) -> bool {
        !matches!(
            self,
            Self::ExtensionMismatch { .. }
                | Self::SourceMissing { .. }
                | Self::SourceIsDirectory { .. }
                | Self::DestinationInvalid { .. }
                | Self::PathTraversal { .. }
                | Self::Fallback { .. }
        )
    }
}
