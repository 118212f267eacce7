//! Thumbnail generation.
//!
//! Entry is decided by [`is_media_indexed`]:
//! - media-indexed references are served by the [`ThumbnailStore`] at the
//!   requested size class, with no further downsampling
//! - everything else is decoded from the provider's byte stream, subsampled
//!   when the request carries target dimensions
//!
//! Google Photos references that wrap a media-index reference are
//! redirected to the store before falling back to a plain decode.

use std::io::{self, Read};
use std::path::Path;
use std::sync::{Arc, OnceLock};

use image::{DynamicImage, ImageError};
use regex::Regex;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::adapters::{ContentResolver, OpenMode, ProviderError, Query, ThumbnailStore};
use crate::config::Settings;
use crate::domain::provider::{GOOGLE_PHOTOS_AUTHORITY, IMAGE, VIDEO};
use crate::domain::{
    is_media_indexed, ContentReference, ProviderKind, Thumbnail, ThumbnailKind, ThumbnailRequest,
};

use super::mime::{self, MimeStrategy};
use super::sampling;

const PHOTOS_WRAPPER_PATTERN: &str =
    r"^content://com\.google\.android\.apps\.photos\.contentprovider/-*\d/-*\d/(.*)";

const MEDIA_REFERENCE_PATTERN: &str = r"content://media/external/(video|images)/media/(\d+)";

/// Errors from a single thumbnail request
#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("Failed to decode image from {target}: {source}")]
    Decode {
        target: String,
        #[source]
        source: ImageError,
    },

    #[error("Invalid media id in {0}")]
    InvalidMediaId(String),

    #[error("IO error reading {target}: {source}")]
    Io {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("Provider error for {target}: {source}")]
    Provider {
        target: String,
        #[source]
        source: ProviderError,
    },
}

/// Which media-index store serves a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaType {
    Image,
    Video,
}

impl MediaType {
    /// Detect from the last path segment, then from the whole reference
    fn detect(reference: &ContentReference) -> Option<Self> {
        let candidates = [
            reference.last_path_segment().to_string(),
            reference.to_string(),
        ];

        candidates.iter().find_map(|haystack| {
            if haystack.contains(VIDEO) {
                Some(MediaType::Video)
            } else if haystack.contains(IMAGE) {
                Some(MediaType::Image)
            } else {
                None
            }
        })
    }
}

/// Numeric media id from a `<kind>:<id>` segment, or a bare numeric segment
fn media_id(reference: &ContentReference) -> Result<Option<i64>, ThumbnailError> {
    let segment = reference.last_path_segment();

    let raw = match segment.split_once(':') {
        Some((_, id)) => id,
        None if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) => segment,
        None => return Ok(None),
    };

    raw.parse::<i64>()
        .map(Some)
        .map_err(|_| ThumbnailError::InvalidMediaId(reference.to_string()))
}

fn photos_wrapper() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(PHOTOS_WRAPPER_PATTERN).ok())
        .as_ref()
}

fn media_reference() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(MEDIA_REFERENCE_PATTERN).ok())
        .as_ref()
}

/// Media type and id wrapped inside a Google Photos reference
fn unwrap_photos_reference(reference: &ContentReference) -> Option<(MediaType, i64)> {
    let text = reference.to_string();
    let inner = photos_wrapper()?.captures(&text)?.get(1)?.as_str();
    let captures = media_reference()?.captures(inner)?;

    let media_type = match captures.get(1)?.as_str() {
        "video" => MediaType::Video,
        _ => MediaType::Image,
    };
    let id = captures.get(2)?.as_str().parse().ok()?;
    Some((media_type, id))
}

/// Produces preview images for content references and local files
#[derive(Clone)]
pub struct ThumbnailGenerator {
    resolver: Arc<dyn ContentResolver>,
    store: Arc<dyn ThumbnailStore>,
    settings: Settings,
}

impl ThumbnailGenerator {
    pub fn new(
        resolver: Arc<dyn ContentResolver>,
        store: Arc<dyn ThumbnailStore>,
        settings: Settings,
    ) -> Self {
        Self {
            resolver,
            store,
            settings,
        }
    }

    /// Thumbnail for one reference.
    ///
    /// `Ok(None)` means the reference has no preview (unsupported type, no
    /// media row, or the store has nothing).
    #[instrument(skip_all, fields(reference = %reference))]
    pub fn get_thumbnail(
        &self,
        reference: &ContentReference,
        request: &ThumbnailRequest,
    ) -> Result<Option<Thumbnail>, ThumbnailError> {
        if is_media_indexed(reference) {
            return self.from_media_index(reference, request.kind);
        }

        match ProviderKind::classify(reference) {
            ProviderKind::GoogleDriveDocument => {
                let reported = self
                    .resolver
                    .reported_type(reference)
                    .map_err(|source| provider_err(reference, source))?;

                match reported.as_deref() {
                    Some(t) if t.starts_with("image/") || t.starts_with("video/") => {
                        self.decode_reference(reference, request).map(Some)
                    }
                    _ => {
                        self.trace(|| debug!(reported_type = ?reported, "No preview for document type"));
                        Ok(None)
                    }
                }
            }
            _ if reference.authority() == GOOGLE_PHOTOS_AUTHORITY => {
                match unwrap_photos_reference(reference) {
                    Some((media_type, id)) => {
                        self.trace(|| debug!(id, ?media_type, "Redirecting to media thumbnail store"));
                        self.from_store(reference, media_type, id, request.kind)
                    }
                    None => self.decode_reference(reference, request).map(Some),
                }
            }
            _ => self.decode_reference(reference, request).map(Some),
        }
    }

    /// Best-effort batch: one entry per reference, failures become `None`
    pub fn thumbnails(
        &self,
        references: &[ContentReference],
        request: &ThumbnailRequest,
    ) -> Vec<Option<Thumbnail>> {
        references
            .iter()
            .map(|reference| match self.get_thumbnail(reference, request) {
                Ok(thumbnail) => thumbnail,
                Err(e) => {
                    warn!(reference = %reference, error = %e, "Thumbnail unavailable");
                    None
                }
            })
            .collect()
    }

    /// Decode a local image file and extract a thumbnail at its natural size
    pub fn thumbnail_from_path(&self, path: &Path) -> Result<Thumbnail, ThumbnailError> {
        let source = sampling::decode_file(path).map_err(|source| match source {
            ImageError::IoError(e) => ThumbnailError::Io {
                target: path.display().to_string(),
                source: e,
            },
            source => ThumbnailError::Decode {
                target: path.display().to_string(),
                source,
            },
        })?;

        let (width, height) = (source.width(), source.height());
        Ok(Thumbnail::new(sampling::extract_thumbnail(source, width, height)))
    }

    /// Representative frame of a local video file, if the store can extract one
    pub fn video_thumbnail_from_path(
        &self,
        path: &Path,
        kind: ThumbnailKind,
    ) -> Result<Option<Thumbnail>, ThumbnailError> {
        let frame = self
            .store
            .video_frame(path, kind)
            .map_err(|source| ThumbnailError::Provider {
                target: path.display().to_string(),
                source,
            })?;
        Ok(frame.map(Thumbnail::new))
    }

    /// Route a local file to the image or video path by its guessed type
    pub fn thumbnail_for_file(&self, path: &Path) -> Result<Option<Thumbnail>, ThumbnailError> {
        let file_type = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| mime::resolve(name, MimeStrategy::NameGuess));

        match file_type.as_deref() {
            Some(t) if t.starts_with("video/") => {
                self.video_thumbnail_from_path(path, self.settings.thumbnail_kind)
            }
            Some(t) if t.starts_with("image/") => self.thumbnail_from_path(path).map(Some),
            _ => Ok(None),
        }
    }

    fn from_media_index(
        &self,
        reference: &ContentReference,
        kind: ThumbnailKind,
    ) -> Result<Option<Thumbnail>, ThumbnailError> {
        let Some(id) = media_id(reference)? else {
            self.trace(|| debug!("No media id in reference"));
            return Ok(None);
        };

        let rows = self
            .resolver
            .query(reference, &Query::by_id(id.to_string()))
            .map_err(|source| provider_err(reference, source))?;

        if rows.is_empty() {
            self.trace(|| debug!(id, "No media index row"));
            return Ok(None);
        }

        match MediaType::detect(reference) {
            Some(media_type) => self.from_store(reference, media_type, id, kind),
            None => Ok(None),
        }
    }

    fn from_store(
        &self,
        reference: &ContentReference,
        media_type: MediaType,
        id: i64,
        kind: ThumbnailKind,
    ) -> Result<Option<Thumbnail>, ThumbnailError> {
        let image = match media_type {
            MediaType::Video => self.store.video_thumbnail(id, kind),
            MediaType::Image => self.store.image_thumbnail(id, kind),
        }
        .map_err(|source| provider_err(reference, source))?;

        Ok(image.map(Thumbnail::new))
    }

    fn decode_reference(
        &self,
        reference: &ContentReference,
        request: &ThumbnailRequest,
    ) -> Result<Thumbnail, ThumbnailError> {
        let mut source = self
            .resolver
            .open_readable(reference, OpenMode::Read)
            .map_err(|source| provider_err(reference, source))?;

        let mut bytes = Vec::new();
        source
            .read_to_end(&mut bytes)
            .map_err(|source| ThumbnailError::Io {
                target: reference.to_string(),
                source,
            })?;

        let image: DynamicImage =
            sampling::decode(&bytes, request.target_size()).map_err(|source| {
                ThumbnailError::Decode {
                    target: reference.to_string(),
                    source,
                }
            })?;

        self.trace(|| {
            debug!(
                width = image.width(),
                height = image.height(),
                "Decoded thumbnail"
            )
        });

        Ok(Thumbnail::new(image))
    }

    fn trace(&self, event: impl FnOnce()) {
        if self.settings.verbose {
            event();
        }
    }
}

fn provider_err(reference: &ContentReference, source: ProviderError) -> ThumbnailError {
    ThumbnailError::Provider {
        target: reference.to_string(),
        source,
    }
}
