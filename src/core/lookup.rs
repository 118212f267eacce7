//! On-disk path lookups through a provider's `_data` column, plus a few
//! small file helpers.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::adapters::{ContentResolver, ProviderError, Query, Row, DATA_COLUMN};
use crate::domain::provider::{IMAGE, MEDIA_AUTHORITY, VIDEO};
use crate::domain::{ContentReference, ProviderKind};

use super::mime::{self, MimeStrategy};

/// Collection reference of the external image index
pub fn images_collection() -> ContentReference {
    media_collection("images")
}

/// Collection reference of the external video index
pub fn videos_collection() -> ContentReference {
    media_collection("video")
}

fn media_collection(kind: &str) -> ContentReference {
    ContentReference::new(
        "content",
        MEDIA_AUTHORITY,
        vec!["external".to_string(), kind.to_string(), "media".to_string()],
    )
}

/// `_data` of the first row, if any row came back
fn first_data(rows: &[Row]) -> Result<Option<PathBuf>, ProviderError> {
    let Some(row) = rows.first() else {
        return Ok(None);
    };

    row.get(DATA_COLUMN)
        .map(|data| Some(PathBuf::from(data)))
        .ok_or_else(|| ProviderError::Query(format!("row has no {} column", DATA_COLUMN)))
}

/// Path of a document reference, read from its own row
pub fn path_for_file_document(
    resolver: &dyn ContentResolver,
    reference: &ContentReference,
) -> Result<Option<PathBuf>, ProviderError> {
    let rows = resolver.query(reference, &Query::all())?;
    let path = first_data(&rows)?;
    debug!(reference = %reference, path = ?path, "File document lookup");
    Ok(path)
}

/// Path of the row with `_id = id` in `collection`
pub fn path_for_media_document(
    resolver: &dyn ContentResolver,
    collection: &ContentReference,
    id: &str,
) -> Result<Option<PathBuf>, ProviderError> {
    let rows = resolver.query(collection, &Query::by_id(id))?;
    let path = first_data(&rows)?;
    debug!(collection = %collection, id, path = ?path, "Media document lookup");
    Ok(path)
}

/// Path of image `id` in the external image index
pub fn path_for_image_document(
    resolver: &dyn ContentResolver,
    id: &str,
) -> Result<Option<PathBuf>, ProviderError> {
    path_for_media_document(resolver, &images_collection(), id)
}

/// Path of video `id` in the external video index
pub fn path_for_video_document(
    resolver: &dyn ContentResolver,
    id: &str,
) -> Result<Option<PathBuf>, ProviderError> {
    path_for_media_document(resolver, &videos_collection(), id)
}

/// Route a reference to the matching lookup by provider kind
pub fn path_for_reference(
    resolver: &dyn ContentResolver,
    reference: &ContentReference,
) -> Result<Option<PathBuf>, ProviderError> {
    match ProviderKind::classify(reference) {
        ProviderKind::RawFile => Ok(Some(PathBuf::from(reference.path()))),
        ProviderKind::MediaDocument => {
            let segment = reference.last_path_segment();
            match segment.split_once(':') {
                Some((kind, id)) if kind.contains(VIDEO) => path_for_video_document(resolver, id),
                Some((kind, id)) if kind.contains(IMAGE) => path_for_image_document(resolver, id),
                _ => path_for_file_document(resolver, reference),
            }
        }
        _ => path_for_file_document(resolver, reference),
    }
}

/// Whether anything exists at `path`
pub fn exists(path: &Path) -> bool {
    path.exists()
}

/// Name-guessed MIME type of the final path component
pub fn file_type(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    mime::resolve(name, MimeStrategy::NameGuess)
}
