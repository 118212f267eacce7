//! Provider classification.
//!
//! Every reference maps to exactly one [`ProviderKind`], decided purely by
//! its authority (and scheme for raw files). `Generic` is the total fallback.

use serde::{Deserialize, Serialize};

use super::reference::ContentReference;

/// Authority of the external-storage documents provider
pub const EXTERNAL_STORAGE_AUTHORITY: &str = "com.android.externalstorage.documents";

/// Authority of the downloads documents provider
pub const DOWNLOADS_AUTHORITY: &str = "com.android.providers.downloads.documents";

/// Authority of the media documents provider (`image:<id>`, `video:<id>`, ...)
pub const MEDIA_DOCUMENTS_AUTHORITY: &str = "com.android.providers.media.documents";

/// Authority of the cloud-drive documents provider
pub const GOOGLE_DRIVE_AUTHORITY: &str = "com.google.android.apps.docs.storage";

/// Authority of the cloud photo library provider
pub const GOOGLE_PHOTOS_AUTHORITY: &str = "com.google.android.apps.photos.contentprovider";

/// Authority of the system media index
pub const MEDIA_AUTHORITY: &str = "media";

/// Scheme of raw filesystem references
pub const FILE_SCHEME: &str = "file";

/// Scheme of provider-backed references
pub const CONTENT_SCHEME: &str = "content";

/// Marker for image rows in a media-document segment
pub const IMAGE: &str = "image";

/// Marker for video rows in a media-document segment
pub const VIDEO: &str = "video";

/// Which kind of provider answers a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    ExternalStorageDocument,
    DownloadsDocument,
    MediaDocument,
    GoogleDriveDocument,
    RawFile,
    Generic,
}

impl ProviderKind {
    /// Classify a reference. Total: unknown authorities yield `Generic`.
    pub fn classify(reference: &ContentReference) -> Self {
        match reference.authority() {
            EXTERNAL_STORAGE_AUTHORITY => Self::ExternalStorageDocument,
            DOWNLOADS_AUTHORITY => Self::DownloadsDocument,
            MEDIA_DOCUMENTS_AUTHORITY => Self::MediaDocument,
            GOOGLE_DRIVE_AUTHORITY => Self::GoogleDriveDocument,
            _ if reference.scheme() == FILE_SCHEME => Self::RawFile,
            _ => Self::Generic,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::ExternalStorageDocument => write!(f, "external_storage_document"),
            ProviderKind::DownloadsDocument => write!(f, "downloads_document"),
            ProviderKind::MediaDocument => write!(f, "media_document"),
            ProviderKind::GoogleDriveDocument => write!(f, "google_drive_document"),
            ProviderKind::RawFile => write!(f, "raw_file"),
            ProviderKind::Generic => write!(f, "generic"),
        }
    }
}

/// Whether a reference is backed by a row in the system media index.
///
/// Media-document references carry the row kind inside the last segment
/// (`image:<id>`, `video:<id>`), so the authority alone is not enough there.
pub fn is_media_indexed(reference: &ContentReference) -> bool {
    match reference.authority() {
        MEDIA_DOCUMENTS_AUTHORITY => {
            let segment = reference.last_path_segment();
            segment.contains(IMAGE) || segment.contains(VIDEO)
        }
        authority => authority == MEDIA_AUTHORITY,
    }
}
