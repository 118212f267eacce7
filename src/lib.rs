//! contentfile - content references into local files and thumbnails
//!
//! Takes opaque, provider-issued content references (URIs such as
//! `content://...` or `file://...`) and turns them into files in a local
//! scratch cache, or into decoded preview images.
//!
//! # Architecture
//!
//! The core is synchronous and executor-agnostic:
//! - Providers are reached only through collaborator traits
//! - Materialization copies bytes into the cache root, atomically
//! - Thumbnails come from a media-index store or a subsampled decode
//!
//! # Modules
//!
//! - `adapters`: Collaborator traits and the local filesystem/SQLite provider
//! - `core`: MIME resolution, copying, materialization, thumbnails, cache
//! - `domain`: Data structures (ContentReference, ProviderKind, ResolvedFile)
//! - `runtime`: Tokio helpers running the core on the blocking pool
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Copy a file into the cache
//! contentfile materialize file:///tmp/report.pdf
//!
//! # Register a photo and write a thumbnail for it
//! contentfile index ~/Pictures/beach.png
//! contentfile thumbnail content://media/external/images/media/1 -o thumb.png --kind micro
//!
//! # Empty the cache
//! contentfile cache clear
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod runtime;

// Re-export main types at crate root for convenience
pub use adapters::{ContentResolver, LocalResolver, MediaIndex, ProviderError, ThumbnailStore};
pub use config::Settings;
pub use core::{
    calculate_in_sample_size, CacheDirectoryManager, ClearReport, FileMaterializer,
    MaterializeError, MimeStrategy, ThumbnailError, ThumbnailGenerator,
};
pub use domain::{
    is_media_indexed, ContentReference, ProviderKind, ResolvedFile, Thumbnail, ThumbnailKind,
    ThumbnailRequest,
};
