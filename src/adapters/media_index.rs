//! SQLite-backed media index.
//!
//! A small local stand-in for a system media catalog: each registered file
//! gets a numeric `_id` and lands in one collection (`images`, `video` or
//! `file`) chosen from its guessed MIME type.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::info;

use crate::core::mime::{self, MimeStrategy};
use crate::domain::provider::{CONTENT_SCHEME, MEDIA_AUTHORITY};
use crate::domain::ContentReference;

use super::{ProviderError, Row, DATA_COLUMN, DISPLAY_NAME_COLUMN, ID_COLUMN, MIME_TYPE_COLUMN};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS media (
    _id           INTEGER PRIMARY KEY AUTOINCREMENT,
    _data         TEXT NOT NULL UNIQUE,
    _display_name TEXT,
    mime_type     TEXT,
    collection    TEXT NOT NULL
);
";

/// Volume name used in generated references
pub const EXTERNAL_VOLUME: &str = "external";

/// Collection a media row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaCollection {
    Images,
    Video,
    File,
}

impl MediaCollection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaCollection::Images => "images",
            MediaCollection::Video => "video",
            MediaCollection::File => "file",
        }
    }

    /// Collection for a MIME type (`file` when unknown)
    pub fn for_mime_type(mime_type: Option<&str>) -> Self {
        match mime_type {
            Some(t) if t.starts_with("image/") => MediaCollection::Images,
            Some(t) if t.starts_with("video/") => MediaCollection::Video,
            _ => MediaCollection::File,
        }
    }

    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "images" | "image" => Some(MediaCollection::Images),
            "video" => Some(MediaCollection::Video),
            "file" | "files" => Some(MediaCollection::File),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the media index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaRecord {
    pub id: i64,
    pub path: PathBuf,
    pub display_name: Option<String>,
    pub mime_type: Option<String>,
    pub collection: MediaCollection,
}

impl MediaRecord {
    /// `content://media/external/<collection>/media/<id>`
    pub fn reference(&self) -> ContentReference {
        ContentReference::new(
            CONTENT_SCHEME,
            MEDIA_AUTHORITY,
            vec![
                EXTERNAL_VOLUME.to_string(),
                self.collection.as_str().to_string(),
                "media".to_string(),
                self.id.to_string(),
            ],
        )
    }

    /// Provider-style row with the well-known column names
    pub fn to_row(&self) -> Row {
        let mut row = Row::new()
            .with(ID_COLUMN, self.id.to_string())
            .with(DATA_COLUMN, self.path.to_string_lossy());
        if let Some(ref name) = self.display_name {
            row = row.with(DISPLAY_NAME_COLUMN, name.as_str());
        }
        if let Some(ref mime_type) = self.mime_type {
            row = row.with(MIME_TYPE_COLUMN, mime_type.as_str());
        }
        row
    }

    fn from_sql(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        let data: String = row.get(1)?;
        let collection: String = row.get(4)?;
        Ok(Self {
            id: row.get(0)?,
            path: PathBuf::from(data),
            display_name: row.get(2)?,
            mime_type: row.get(3)?,
            collection: MediaCollection::from_segment(&collection).unwrap_or(MediaCollection::File),
        })
    }
}

/// Local media catalog stored in SQLite
pub struct MediaIndex {
    conn: Mutex<Connection>,
}

impl MediaIndex {
    /// Open (or create) the index at `path`
    pub fn open(path: &Path) -> Result<Self, ProviderError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Transient index, mostly for tests
    pub fn open_in_memory() -> Result<Self, ProviderError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, ProviderError> {
        self.conn
            .lock()
            .map_err(|_| ProviderError::Query("media index lock poisoned".to_string()))
    }

    /// Register a local file, returning its row (existing rows are reused)
    pub fn add(&self, path: &Path) -> Result<MediaRecord, ProviderError> {
        let path = path.canonicalize()?;
        if !path.is_file() {
            return Err(ProviderError::Unsupported(format!(
                "not a regular file: {}",
                path.display()
            )));
        }

        let data = path.to_string_lossy().into_owned();
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        let mime_type = display_name
            .as_deref()
            .and_then(|name| mime::resolve(name, MimeStrategy::NameGuess));
        let collection = MediaCollection::for_mime_type(mime_type.as_deref());

        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO media (_data, _display_name, mime_type, collection)
             VALUES (?1, ?2, ?3, ?4)",
            params![data, display_name, mime_type, collection.as_str()],
        )?;

        let record = conn.query_row(
            "SELECT _id, _data, _display_name, mime_type, collection FROM media WHERE _data = ?1",
            params![data],
            MediaRecord::from_sql,
        )?;

        if inserted > 0 {
            info!(id = record.id, collection = %record.collection, path = %data, "Indexed media");
        }

        Ok(record)
    }

    /// Row with the given id, in any collection
    pub fn get(&self, id: i64) -> Result<Option<MediaRecord>, ProviderError> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                "SELECT _id, _data, _display_name, mime_type, collection FROM media WHERE _id = ?1",
                params![id],
                MediaRecord::from_sql,
            )
            .optional()?;
        Ok(record)
    }

    /// Row with the given id, only if it belongs to `collection`
    pub fn get_in(
        &self,
        collection: MediaCollection,
        id: i64,
    ) -> Result<Option<MediaRecord>, ProviderError> {
        Ok(self.get(id)?.filter(|record| record.collection == collection))
    }

    /// Every row of a collection, ordered by id
    pub fn list(&self, collection: MediaCollection) -> Result<Vec<MediaRecord>, ProviderError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT _id, _data, _display_name, mime_type, collection FROM media
             WHERE collection = ?1 ORDER BY _id",
        )?;
        let records = stmt
            .query_map(params![collection.as_str()], MediaRecord::from_sql)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}
