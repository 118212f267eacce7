//! Filesystem-backed provider.
//!
//! Answers:
//! - `file://` references straight from disk
//! - `content://media/...` and media-document references through a
//!   [`MediaIndex`]
//! - external-storage documents (`primary:<relative path>`) under a
//!   configurable storage root
//! - downloads documents carrying a `raw:<absolute path>` id
//!
//! Everything else is reported as unsupported.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use tracing::debug;

use crate::core::mime::{self, MimeStrategy};
use crate::core::sampling;
use crate::domain::provider::MEDIA_AUTHORITY;
use crate::domain::{ContentReference, ProviderKind, ThumbnailKind};

use super::media_index::{MediaCollection, MediaIndex, MediaRecord};
use super::{
    ContentResolver, OpenMode, ProviderError, Query, Row, ThumbnailStore, DATA_COLUMN,
    DISPLAY_NAME_COLUMN, ID_COLUMN, MIME_TYPE_COLUMN,
};

/// What a reference points at once resolved locally
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    /// A single file, optionally backed by an index row
    File {
        path: PathBuf,
        record: Option<MediaRecord>,
    },
    /// A media collection (`content://media/external/images/media`)
    Collection(MediaCollection),
    /// A media id with no row in the index
    Missing,
}

/// Provider over the local filesystem and a SQLite media index
#[derive(Clone, Default)]
pub struct LocalResolver {
    index: Option<Arc<MediaIndex>>,
    storage_root: Option<PathBuf>,
    verbose: bool,
}

impl LocalResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve media references from `index`
    pub fn with_index(mut self, index: Arc<MediaIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Root that `primary:` external-storage document ids resolve against
    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage_root = Some(root.into());
        self
    }

    /// Emit per-step debug events
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn index(&self) -> Option<&MediaIndex> {
        self.index.as_deref()
    }

    fn require_index(&self) -> Result<&MediaIndex, ProviderError> {
        self.index()
            .ok_or_else(|| ProviderError::Unsupported("no media index configured".to_string()))
    }

    fn indexed(&self, id: i64) -> Result<Target, ProviderError> {
        Ok(match self.require_index()?.get(id)? {
            Some(record) => Target::File {
                path: record.path.clone(),
                record: Some(record),
            },
            None => Target::Missing,
        })
    }

    fn resolve(&self, reference: &ContentReference) -> Result<Target, ProviderError> {
        let segment = reference.last_path_segment();

        match ProviderKind::classify(reference) {
            ProviderKind::RawFile => Ok(Target::File {
                path: PathBuf::from(reference.path()),
                record: None,
            }),
            ProviderKind::MediaDocument => match segment.split_once(':') {
                Some((_, id)) => self.indexed(parse_id(reference, id)?),
                None => Err(unsupported(reference)),
            },
            ProviderKind::ExternalStorageDocument => {
                let root = self.storage_root.as_ref().ok_or_else(|| unsupported(reference))?;
                match segment.split_once(':') {
                    Some(("primary", relative)) => Ok(Target::File {
                        path: root.join(relative),
                        record: None,
                    }),
                    _ => Err(unsupported(reference)),
                }
            }
            ProviderKind::DownloadsDocument => match segment.strip_prefix("raw:") {
                Some(path) => Ok(Target::File {
                    path: PathBuf::from(path),
                    record: None,
                }),
                None => Err(unsupported(reference)),
            },
            _ if reference.authority() == MEDIA_AUTHORITY => {
                let segments = reference.path_segments();
                match segments {
                    [_, collection, media] if media == "media" => {
                        MediaCollection::from_segment(collection)
                            .map(Target::Collection)
                            .ok_or_else(|| unsupported(reference))
                    }
                    [_, _, media, id] if media == "media" => {
                        self.indexed(parse_id(reference, id)?)
                    }
                    _ => Err(unsupported(reference)),
                }
            }
            _ => Err(unsupported(reference)),
        }
    }

    fn resolve_file(
        &self,
        reference: &ContentReference,
    ) -> Result<Option<(PathBuf, Option<MediaRecord>)>, ProviderError> {
        match self.resolve(reference)? {
            Target::File { path, record } => Ok(Some((path, record))),
            Target::Missing => Ok(None),
            Target::Collection(_) => Err(unsupported(reference)),
        }
    }

    fn file_row(path: &Path, record: Option<&MediaRecord>) -> Row {
        if let Some(record) = record {
            return record.to_row();
        }

        let mut row = Row::new().with(DATA_COLUMN, path.to_string_lossy());
        if let Some(name) = file_name(path) {
            if let Some(mime_type) = mime::resolve(&name, MimeStrategy::NameGuess) {
                row = row.with(MIME_TYPE_COLUMN, mime_type);
            }
            row = row.with(DISPLAY_NAME_COLUMN, name);
        }
        row
    }

    fn decode_scaled(
        &self,
        record: &MediaRecord,
        kind: ThumbnailKind,
    ) -> Result<DynamicImage, ProviderError> {
        let (width, height) = kind.bounds();
        let image = sampling::decode_file(&record.path)?;
        Ok(image.thumbnail(width, height))
    }
}

fn parse_id(reference: &ContentReference, raw: &str) -> Result<i64, ProviderError> {
    raw.parse()
        .map_err(|_| ProviderError::NotFound(format!("invalid media id in {}", reference)))
}

fn unsupported(reference: &ContentReference) -> ProviderError {
    ProviderError::Unsupported(reference.to_string())
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

/// Apply an `_id = ?` selection and a projection to rows
fn apply_query(rows: Vec<Row>, query: &Query) -> Result<Vec<Row>, ProviderError> {
    let wanted_id = match query.selection.as_deref() {
        None => None,
        Some(selection) if selection.replace(' ', "") == format!("{}=?", ID_COLUMN) => {
            query.selection_args.first().map(String::as_str)
        }
        Some(selection) => {
            return Err(ProviderError::Query(format!("unsupported selection: {}", selection)))
        }
    };

    let selected = rows
        .into_iter()
        .filter(|row| wanted_id.map_or(true, |id| row.get(ID_COLUMN) == Some(id)));

    let projected = match query.projection {
        None => selected.collect(),
        Some(ref columns) => selected
            .map(|row| {
                columns.iter().fold(Row::new(), |acc, column| match row.get(column) {
                    Some(value) => acc.with(column.as_str(), value),
                    None => acc,
                })
            })
            .collect(),
    };

    Ok(projected)
}

impl ContentResolver for LocalResolver {
    fn display_name(&self, reference: &ContentReference) -> Result<Option<String>, ProviderError> {
        Ok(self.resolve_file(reference)?.and_then(|(path, record)| {
            record
                .and_then(|r| r.display_name)
                .or_else(|| file_name(&path))
        }))
    }

    fn reported_type(&self, reference: &ContentReference) -> Result<Option<String>, ProviderError> {
        Ok(self.resolve_file(reference)?.and_then(|(path, record)| {
            record.and_then(|r| r.mime_type).or_else(|| {
                file_name(&path).and_then(|name| mime::resolve(&name, MimeStrategy::NameGuess))
            })
        }))
    }

    fn open_readable(
        &self,
        reference: &ContentReference,
        mode: OpenMode,
    ) -> Result<Box<dyn Read + Send>, ProviderError> {
        let (path, _) = self
            .resolve_file(reference)?
            .ok_or_else(|| ProviderError::NotFound(reference.to_string()))?;

        if self.verbose {
            debug!(path = %path.display(), mode = mode.as_str(), "Opening local content");
        }
        let file = File::open(&path)?;
        Ok(Box::new(file))
    }

    fn query(&self, reference: &ContentReference, query: &Query) -> Result<Vec<Row>, ProviderError> {
        let rows = match self.resolve(reference)? {
            Target::File { path, record } => vec![Self::file_row(&path, record.as_ref())],
            Target::Missing => Vec::new(),
            Target::Collection(collection) => self
                .require_index()?
                .list(collection)?
                .iter()
                .map(MediaRecord::to_row)
                .collect(),
        };

        apply_query(rows, query)
    }
}

impl ThumbnailStore for LocalResolver {
    fn image_thumbnail(
        &self,
        id: i64,
        kind: ThumbnailKind,
    ) -> Result<Option<DynamicImage>, ProviderError> {
        let Some(record) = self.require_index()?.get_in(MediaCollection::Images, id)? else {
            return Ok(None);
        };
        self.decode_scaled(&record, kind).map(Some)
    }

    fn video_thumbnail(
        &self,
        id: i64,
        _kind: ThumbnailKind,
    ) -> Result<Option<DynamicImage>, ProviderError> {
        if self.verbose {
            debug!(id, "No video frame extractor for local media");
        }
        Ok(None)
    }
}
