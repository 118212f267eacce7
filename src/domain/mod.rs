//! Domain types for contentfile.
//!
//! This module contains the core data structures:
//! - ContentReference: Opaque provider-issued identifiers
//! - ProviderKind: Which provider answers a reference
//! - ResolvedFile / Thumbnail: What resolution hands back

pub mod artifact;
pub mod provider;
pub mod reference;

// Re-export commonly used types
pub use artifact::{ResolvedFile, Thumbnail, ThumbnailKind, ThumbnailRequest};
pub use provider::{is_media_indexed, ProviderKind};
pub use reference::{ContentReference, ReferenceError};
