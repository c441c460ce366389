//! Rich-text document model and JSON envelope.
//!
//! This module defines the **contract** between the codecs:
//! 1) parsing wikitext or HTML -> `Document`, and
//! 2) rendering `Document` -> wikitext or HTML.
//!
//! Design goals:
//! - A small, closed set of block and inline kinds (exactly what the
//!   editor surface can produce).
//! - Stable JSON representation for inspection and for the CLI `ast` output.
//! - Documents are built fresh on every conversion; nothing here is cached.

mod diagnostic;
mod document;
mod envelope;
mod span;

pub use diagnostic::*;
pub use document::*;
pub use envelope::*;
pub use span::*;

/// JSON schema version for the document envelope.
///
/// Bump this when making non-backwards-compatible changes to the JSON structure.
pub const SCHEMA_VERSION: u32 = 1;

/// The generator name stored in the JSON envelope.
pub const GENERATOR_NAME: &str = "wikicodec";

/// The generator version stored in the JSON envelope.
pub const GENERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");
