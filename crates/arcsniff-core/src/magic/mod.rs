//! Content-based file identification.
//!
//! [`find`] answers "what is this, really?" by running every registered
//! matcher against the bytes. [`match_ext`] answers the narrower question
//! "is this what its name claims?", which is how misnamed uploads are caught
//! before an archive reader is chosen.
//!
//! # Example
//!
//! ```rust
//! use arcsniff_core::magic::{self, ExtMatch, Signature};
//!
//! let flv = b"FLV\x01\x05\x00\x00\x00\x09".to_vec();
//! assert_eq!(magic::find(&flv), Signature::FlashVideo);
//! assert!(magic::match_ext("intro.flv", &flv).is_match());
//! assert!(matches!(
//!     magic::match_ext("intro.zip", &flv),
//!     ExtMatch::Contradicts { detected: Signature::FlashVideo }
//! ));
//! ```

pub mod archive;
pub mod document;
pub mod image;
pub mod media;
pub mod program;
pub mod registry;
mod signature;
pub mod text;
pub mod window;

use std::fs::File;
use std::path::Path;

use tracing::trace;

use crate::error::{Error, Result};

pub use registry::{extension_candidates, finder, Finder, Matcher};
pub use signature::Signature;
pub use window::ByteSource;

/// Outcome of checking a filename's extension against its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtMatch {
    /// The content is one of the formats the extension claims
    Matches(Signature),
    /// The content is recognisably something else
    Contradicts {
        /// What the content actually is
        detected: Signature,
    },
    /// Nothing can be said: the extension is unknown or the content is
    Undetermined,
}

impl ExtMatch {
    /// True only for [`ExtMatch::Matches`].
    pub fn is_match(&self) -> bool {
        matches!(self, ExtMatch::Matches(_))
    }
}

/// Identify `r` by content alone.
///
/// Binary matchers run first in registry priority order, then ANSI
/// detection and the text tiers.
pub fn find(r: &dyn ByteSource) -> Signature {
    if r.size() == 0 {
        return Signature::ZeroByte;
    }
    for (sig, matcher) in finder().binary() {
        if matcher(r) {
            trace!(signature = sig.name(), "Matched binary signature");
            return sig;
        }
    }
    let sig = text::classify(r);
    trace!(signature = sig.name(), "Classified as text or unknown");
    sig
}

/// Identify the file at `path`.
pub fn find_path(path: &Path) -> Result<Signature> {
    let file = File::open(path).map_err(|e| Error::file_read(path, e))?;
    Ok(find(&file))
}

/// Check whether the extension of `filename` agrees with the content of `r`.
pub fn match_ext(filename: &str, r: &dyn ByteSource) -> ExtMatch {
    let Some(ext) = registry::extension_of(filename) else {
        return ExtMatch::Undetermined;
    };
    let candidates = registry::extension_candidates(&ext);
    if candidates.is_empty() {
        return ExtMatch::Undetermined;
    }

    let detected = find(r);
    if candidates.contains(&detected) {
        return ExtMatch::Matches(detected);
    }
    // Text tiers nest, so a .txt that classifies as ANSI can still satisfy a
    // plain text candidate.
    let accepted = candidates
        .iter()
        .filter(|sig| is_text(**sig))
        .find(|sig| finder().get(**sig).is_some_and(|m| m(r)));
    if let Some(&sig) = accepted {
        if is_text(detected) {
            return ExtMatch::Matches(sig);
        }
    }

    match detected {
        Signature::Unknown => ExtMatch::Undetermined,
        detected => ExtMatch::Contradicts { detected },
    }
}

fn is_text(sig: Signature) -> bool {
    registry::texts().contains(&sig)
}

fn first_of(view: &[Signature], r: &dyn ByteSource) -> Signature {
    view.iter()
        .copied()
        .find(|sig| finder().get(*sig).is_some_and(|m| m(r)))
        .unwrap_or(Signature::Unknown)
}

/// First matching archive signature, or [`Signature::Unknown`].
pub fn archive(r: &dyn ByteSource) -> Signature {
    first_of(registry::archives(), r)
}

/// First matching image signature, or [`Signature::Unknown`].
pub fn image(r: &dyn ByteSource) -> Signature {
    first_of(registry::images(), r)
}

/// First matching executable signature, or [`Signature::Unknown`].
pub fn program(r: &dyn ByteSource) -> Signature {
    first_of(registry::programs(), r)
}

/// First matching document signature, or [`Signature::Unknown`].
pub fn document(r: &dyn ByteSource) -> Signature {
    first_of(registry::documents(), r)
}

/// First matching video signature, or [`Signature::Unknown`].
pub fn video(r: &dyn ByteSource) -> Signature {
    first_of(registry::videos(), r)
}

/// First matching audio signature, or [`Signature::Unknown`].
pub fn audio(r: &dyn ByteSource) -> Signature {
    first_of(registry::audio(), r)
}

/// First matching disc image signature, or [`Signature::Unknown`].
pub fn disc_image(r: &dyn ByteSource) -> Signature {
    first_of(registry::disc_images(), r)
}

/// Narrowest matching text signature, or [`Signature::Unknown`].
pub fn text(r: &dyn ByteSource) -> Signature {
    first_of(registry::texts(), r)
}
