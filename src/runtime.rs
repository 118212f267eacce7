//! Async helpers that run the blocking core on Tokio's blocking pool.
//!
//! The core stays synchronous; callers on an async runtime use these to
//! keep file and decode work off the reactor threads.

use anyhow::{Context, Result};
use tokio::task::spawn_blocking;

use crate::core::{CacheDirectoryManager, ClearReport, FileMaterializer, ThumbnailGenerator};
use crate::domain::{ContentReference, ResolvedFile, Thumbnail, ThumbnailRequest};

/// Materialize a batch of references (all-or-nothing)
pub async fn materialize(
    materializer: FileMaterializer,
    references: Vec<ContentReference>,
) -> Result<Vec<ResolvedFile>> {
    spawn_blocking(move || materializer.materialize_all(&references))
        .await
        .context("Materialize task failed to complete")?
        .context("Failed to materialize content")
}

/// Thumbnail for one reference
pub async fn thumbnail(
    generator: ThumbnailGenerator,
    reference: ContentReference,
    request: ThumbnailRequest,
) -> Result<Option<Thumbnail>> {
    let target = reference.to_string();
    spawn_blocking(move || generator.get_thumbnail(&reference, &request))
        .await
        .context("Thumbnail task failed to complete")?
        .with_context(|| format!("Failed to create thumbnail for {}", target))
}

/// Sweep the cache root
pub async fn clear(cache: CacheDirectoryManager) -> Result<ClearReport> {
    spawn_blocking(move || cache.sweep())
        .await
        .context("Cache sweep task failed to complete")
}
