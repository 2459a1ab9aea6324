//! # arcsniff-core
//!
//! A library for identifying files by their content and for listing and
//! extracting archives from the DOS and BBS era, whatever they were named.
//!
//! This crate provides the core functionality for:
//! - Detecting dozens of archive, image, audio, video, document, executable
//!   and disc image formats from their bytes, down to legacy sub-variants
//! - Reading Windows NE/PE headers and ID3 tags
//! - Listing and extracting archives in-process, with a fallback to the
//!   archivers installed on the host
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`magic`]: Signature matchers, the format registry and the classifier
//! - [`exe`]: DOS/NE/PE executable headers
//! - [`id3`]: ID3v1 and ID3v2 song titles
//! - [`archive`]: Archive listing and extraction
//! - [`system`]: External archiver programs
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use arcsniff_core::{magic, Archiver};
//! use std::path::Path;
//!
//! let path = Path::new("./uploads/GAME.ZIP");
//! let signature = magic::find_path(path)?;
//! println!("{}: {}", signature.name(), signature.title());
//!
//! let contents = Archiver::new().list(path, "GAME.ZIP")?;
//! if let Some(readme) = contents.readme("GAME.ZIP") {
//!     println!("description in {readme}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Extensibility
//!
//! - [`ByteSource`]: Classify any positional byte container
//! - [`SystemArchiveReader`]: Plug in another external archiver
//!

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod archive;
pub mod error;
pub mod exe;
pub mod id3;
pub mod magic;
pub mod system;

// Re-export primary types for convenience
pub use archive::{rename, ArchiveConfig, Archiver, Backend, ContentDirs, Contents, Extracted};
pub use error::{Error, Result};
pub use exe::{ExeKind, WindowsHeader};
pub use magic::{find, match_ext, ByteSource, ExtMatch, Signature};
pub use system::{SystemArchiveReader, SystemTools, ToolRunner};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
