//! Materialization of content references into the cache root.
//!
//! For each reference:
//! 1. Ask the provider for the display name and reported MIME type
//! 2. Build `<cacheRoot>/<fileName>`, appending `.pdf` when the provider
//!    says PDF but the name resolves to no MIME type
//! 3. Return an existing file at that path untouched (caching by path)
//! 4. Otherwise stream the provider's bytes into a temporary file and
//!    rename it into place once the copy is complete

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::adapters::{ContentResolver, OpenMode, ProviderError};
use crate::config::Settings;
use crate::domain::{ContentReference, ResolvedFile};

use super::cache::{CacheDirectoryManager, CacheError};
use super::copier;
use super::mime::{self, MimeStrategy};

/// MIME type that triggers the extension fallback
pub const APPLICATION_PDF: &str = "application/pdf";

/// Extension appended by the fallback
pub const PDF_EXTENSION: &str = "pdf";

/// Errors that fail a materialization
#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("No display name reported for {0}")]
    MetadataNotFound(String),

    #[error("Metadata lookup failed for {reference}: {source}")]
    Metadata {
        reference: String,
        #[source]
        source: ProviderError,
    },

    #[error("Failed to open {reference}: {source}")]
    Open {
        reference: String,
        #[source]
        source: ProviderError,
    },

    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl MaterializeError {
    /// Whether this failure came from byte I/O (open, read or write)
    pub fn is_io_failure(&self) -> bool {
        matches!(self, MaterializeError::Open { .. } | MaterializeError::Io { .. })
    }
}

/// Compute the destination for `file_name` inside `cache_root`.
///
/// Some providers report `application/pdf` for a display name without an
/// extension; such names get a `.pdf` suffix so consumers never receive an
/// extension-less PDF.
pub fn destination_path(
    cache_root: &Path,
    file_name: &str,
    reported_type: Option<&str>,
    strategy: MimeStrategy,
) -> PathBuf {
    let guessed = strategy.resolve(file_name);

    if reported_type == Some(APPLICATION_PDF) && guessed.is_none() {
        cache_root.join(format!("{}.{}", file_name, PDF_EXTENSION))
    } else {
        cache_root.join(file_name)
    }
}

/// Make a provider display name safe to use as a single path component
fn sanitize_file_name(name: &str) -> Option<String> {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => None,
        _ => Some(cleaned),
    }
}

/// Copies referenced content into the cache root
#[derive(Clone)]
pub struct FileMaterializer {
    resolver: Arc<dyn ContentResolver>,
    cache: CacheDirectoryManager,
    settings: Settings,
}

impl FileMaterializer {
    /// Create a materializer writing into `settings.cache_root`
    pub fn new(resolver: Arc<dyn ContentResolver>, settings: Settings) -> Self {
        Self {
            resolver,
            cache: CacheDirectoryManager::from_settings(&settings),
            settings,
        }
    }

    /// Materialize a single reference
    #[instrument(skip_all, fields(reference = %reference))]
    pub fn materialize(&self, reference: &ContentReference) -> Result<ResolvedFile, MaterializeError> {
        let metadata_err = |source| MaterializeError::Metadata {
            reference: reference.to_string(),
            source,
        };

        let reported_type = self.resolver.reported_type(reference).map_err(metadata_err)?;
        let display_name = self.resolver.display_name(reference).map_err(metadata_err)?;

        let file_name = match display_name.as_deref().and_then(sanitize_file_name) {
            Some(name) => name,
            None if self.settings.generate_missing_names => Uuid::new_v4().to_string(),
            None => return Err(MaterializeError::MetadataNotFound(reference.to_string())),
        };

        let strategy = self.settings.mime_strategy;
        let guessed_type = mime::resolve(&file_name, strategy);
        let file_path = destination_path(
            self.cache.root(),
            &file_name,
            reported_type.as_deref(),
            strategy,
        );

        if self.settings.verbose {
            debug!(
                file_name = %file_name,
                extension = mime::file_extension(&file_name),
                reported_type = ?reported_type,
                guessed_type = ?guessed_type,
                %strategy,
                "Resolved destination {}",
                file_path.display()
            );
        }

        let mime_type = reported_type.or(guessed_type);

        if file_path.is_file() {
            if self.settings.verbose {
                debug!(path = %file_path.display(), "File already cached, skipping copy");
            }
            return Ok(ResolvedFile::new(file_path, mime_type));
        }
        if file_path.exists() {
            return Err(MaterializeError::Io {
                path: file_path,
                source: io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "destination is not a regular file",
                ),
            });
        }

        let bytes = self.copy_into_place(reference, &file_path)?;
        info!(path = %file_path.display(), bytes, "Materialized content");

        Ok(ResolvedFile::new(file_path, mime_type))
    }

    /// Materialize every reference, or fail on the first error
    pub fn materialize_all(
        &self,
        references: &[ContentReference],
    ) -> Result<Vec<ResolvedFile>, MaterializeError> {
        references.iter().map(|r| self.materialize(r)).collect()
    }

    /// Materialize a multi-selection where some entries may carry no reference.
    /// Empty entries are skipped; any failure aborts the whole selection.
    pub fn materialize_clip(
        &self,
        items: &[Option<ContentReference>],
    ) -> Result<Vec<ResolvedFile>, MaterializeError> {
        items
            .iter()
            .flatten()
            .map(|r| self.materialize(r))
            .collect()
    }

    /// Stream the reference into a temp file in the cache root, then rename it
    /// onto `file_path`. A failed copy leaves nothing behind at `file_path`.
    fn copy_into_place(
        &self,
        reference: &ContentReference,
        file_path: &Path,
    ) -> Result<u64, MaterializeError> {
        let root = self.cache.ensure()?;

        let mut source = self
            .resolver
            .open_readable(reference, OpenMode::Read)
            .map_err(|source| MaterializeError::Open {
                reference: reference.to_string(),
                source,
            })?;

        let io_err = |source| MaterializeError::Io {
            path: file_path.to_path_buf(),
            source,
        };

        let mut partial = tempfile::Builder::new()
            .prefix(".contentfile-")
            .suffix(".partial")
            .tempfile_in(root)
            .map_err(io_err)?;

        let bytes = copier::copy(&mut source, partial.as_file_mut()).map_err(io_err)?;

        persist(partial, file_path).map_err(io_err)?;
        Ok(bytes)
    }
}

/// Move a completed temp file onto `path` without clobbering.
/// Losing a race to a concurrent writer of the same path is not an error.
fn persist(partial: NamedTempFile, path: &Path) -> io::Result<()> {
    match partial.persist_noclobber(path) {
        Ok(_) => Ok(()),
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
            debug!(path = %path.display(), "Destination appeared during copy, keeping it");
            Ok(())
        }
        Err(e) => Err(e.error),
    }
}
