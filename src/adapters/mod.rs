//! Collaborator interfaces for content providers.
//!
//! The core never talks to a provider directly. It goes through these
//! traits, which a host implements for its platform (or uses the bundled
//! [`LocalResolver`] for plain files plus a SQLite media index).

pub mod local;
pub mod media_index;

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use image::DynamicImage;
use thiserror::Error;

use crate::domain::{ContentReference, ThumbnailKind};

// Re-export the local provider
pub use local::LocalResolver;
pub use media_index::MediaIndex;

/// Column holding a media row's numeric id
pub const ID_COLUMN: &str = "_id";

/// Column holding a media row's on-disk path
pub const DATA_COLUMN: &str = "_data";

/// Column holding a row's display name
pub const DISPLAY_NAME_COLUMN: &str = "_display_name";

/// Column holding a row's MIME type
pub const MIME_TYPE_COLUMN: &str = "mime_type";

/// Errors raised by provider collaborators
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Content not found: {0}")]
    NotFound(String),

    #[error("Unsupported reference: {0}")]
    Unsupported(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Mode used to open a byte source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    #[default]
    Read,
}

impl OpenMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpenMode::Read => "r",
        }
    }
}

/// A metadata query against a provider's tabular view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Columns to return (all when `None`)
    pub projection: Option<Vec<String>>,

    /// Selection clause with `?` placeholders, e.g. `_id = ?`
    pub selection: Option<String>,

    /// Values bound to the placeholders, in order
    pub selection_args: Vec<String>,
}

impl Query {
    /// Query every row the reference addresses
    pub fn all() -> Self {
        Self::default()
    }

    /// Select rows whose `_id` equals `id`
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            projection: None,
            selection: Some(format!("{} = ?", ID_COLUMN)),
            selection_args: vec![id.into()],
        }
    }
}

/// One row of a provider query result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: HashMap<String, String>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column setter
    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.columns.insert(column.into(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(String::as_str)
    }
}

/// Metadata and byte access for content references
pub trait ContentResolver: Send + Sync {
    /// Provider-reported display name (`None` when the provider has no row)
    fn display_name(&self, reference: &ContentReference) -> Result<Option<String>, ProviderError>;

    /// Provider-reported MIME type
    fn reported_type(&self, reference: &ContentReference) -> Result<Option<String>, ProviderError>;

    /// Open a readable byte source for the reference
    fn open_readable(
        &self,
        reference: &ContentReference,
        mode: OpenMode,
    ) -> Result<Box<dyn Read + Send>, ProviderError>;

    /// Query the provider's tabular view of the reference
    fn query(&self, reference: &ContentReference, query: &Query) -> Result<Vec<Row>, ProviderError>;
}

/// Pre-sized previews served by a media index
pub trait ThumbnailStore: Send + Sync {
    /// Thumbnail for an image row
    fn image_thumbnail(
        &self,
        id: i64,
        kind: ThumbnailKind,
    ) -> Result<Option<DynamicImage>, ProviderError>;

    /// Thumbnail for a video row
    fn video_thumbnail(
        &self,
        id: i64,
        kind: ThumbnailKind,
    ) -> Result<Option<DynamicImage>, ProviderError>;

    /// Representative frame of a local video file
    fn video_frame(
        &self,
        _path: &Path,
        _kind: ThumbnailKind,
    ) -> Result<Option<DynamicImage>, ProviderError> {
        Ok(None)
    }
}
