//! Bundle assembly — pure transformation from a pack + sessions snapshot
//! into the document published to the backend.

pub mod assemble;
pub mod model;

pub use assemble::{BUNDLE_TAGS, BundleAssembler, assemble_markdown, card_parts};
pub use model::{Bundle, BundlePart, PartKind, SourceSession};
