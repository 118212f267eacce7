//! Core content resolution logic.
//!
//! This module contains:
//! - Mime: file name to MIME type, two interchangeable strategies
//! - Copier: buffered stream-to-stream copy
//! - Materializer: references into local files in the cache root
//! - Thumbnail: preview images, with power-of-two subsampling
//! - Cache: scratch directory lifecycle
//! - Lookup: on-disk paths through the `_data` column

pub mod cache;
pub mod copier;
pub mod lookup;
pub mod materializer;
pub mod mime;
pub mod sampling;
pub mod thumbnail;

// Re-export commonly used types
pub use cache::{CacheDirectoryManager, CacheEntry, CacheError, ClearReport};
pub use materializer::{FileMaterializer, MaterializeError};
pub use mime::MimeStrategy;
pub use sampling::calculate_in_sample_size;
pub use thumbnail::{ThumbnailError, ThumbnailGenerator};
