//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{self, Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use contentfile::adapters::{ContentResolver, OpenMode, ProviderError, Query, Row, ThumbnailStore};
use contentfile::domain::{ContentReference, ThumbnailKind};
use image::{DynamicImage, ImageFormat, RgbImage};

/// Encode a blank RGB image as PNG bytes
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::new(width, height));
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}

pub fn reference(uri: &str) -> ContentReference {
    ContentReference::parse(uri).unwrap()
}

/// One piece of fake provider content
#[derive(Debug, Clone, Default)]
pub struct FakeEntry {
    pub name: Option<String>,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
    /// Fail reads after this many bytes
    pub fail_after: Option<usize>,
    /// Fail the open itself
    pub fail_open: bool,
    pub rows: Vec<Row>,
}

impl FakeEntry {
    pub fn file(name: &str, mime_type: Option<&str>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: Some(name.to_string()),
            mime_type: mime_type.map(str::to_string),
            bytes: bytes.into(),
            ..Self::default()
        }
    }
}

/// Reader that errors once `fail_after` bytes have been handed out
struct FailingReader {
    inner: Cursor<Vec<u8>>,
    remaining: usize,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "connection reset"));
        }
        let limit = buf.len().min(self.remaining);
        let n = self.inner.read(&mut buf[..limit])?;
        self.remaining -= n;
        Ok(n)
    }
}

/// In-memory provider keyed by the reference's string form
#[derive(Default)]
pub struct FakeResolver {
    entries: HashMap<String, FakeEntry>,
    opens: AtomicUsize,
    queries: Mutex<Vec<(String, Query)>>,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, uri: &str, entry: FakeEntry) -> Self {
        self.entries.insert(reference(uri).to_string(), entry);
        self
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<(String, Query)> {
        self.queries.lock().unwrap().clone()
    }

    fn entry(&self, reference: &ContentReference) -> Result<&FakeEntry, ProviderError> {
        self.entries
            .get(&reference.to_string())
            .ok_or_else(|| ProviderError::NotFound(reference.to_string()))
    }
}

impl ContentResolver for FakeResolver {
    fn display_name(&self, reference: &ContentReference) -> Result<Option<String>, ProviderError> {
        Ok(self.entry(reference)?.name.clone())
    }

    fn reported_type(&self, reference: &ContentReference) -> Result<Option<String>, ProviderError> {
        Ok(self.entry(reference)?.mime_type.clone())
    }

    fn open_readable(
        &self,
        reference: &ContentReference,
        _mode: OpenMode,
    ) -> Result<Box<dyn Read + Send>, ProviderError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let entry = self.entry(reference)?;

        if entry.fail_open {
            return Err(ProviderError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "descriptor refused",
            )));
        }

        let inner = Cursor::new(entry.bytes.clone());
        match entry.fail_after {
            Some(remaining) => Ok(Box::new(FailingReader { inner, remaining })),
            None => Ok(Box::new(inner)),
        }
    }

    fn query(&self, reference: &ContentReference, query: &Query) -> Result<Vec<Row>, ProviderError> {
        self.queries
            .lock()
            .unwrap()
            .push((reference.to_string(), query.clone()));

        let Some(entry) = self.entries.get(&reference.to_string()) else {
            return Ok(Vec::new());
        };

        let wanted = query.selection_args.first();
        Ok(entry
            .rows
            .iter()
            .filter(|row| wanted.map_or(true, |id| row.get("_id") == Some(id.as_str())))
            .cloned()
            .collect())
    }
}

/// Store that answers every id with a blank image sized to the kind
#[derive(Default)]
pub struct FakeStore {
    calls: Mutex<Vec<(&'static str, i64, ThumbnailKind)>>,
    pub frames: bool,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frames() -> Self {
        Self {
            frames: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(&'static str, i64, ThumbnailKind)> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, store: &'static str, id: i64, kind: ThumbnailKind) -> DynamicImage {
        self.calls.lock().unwrap().push((store, id, kind));
        let (width, height) = kind.bounds();
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
    }
}

impl ThumbnailStore for FakeStore {
    fn image_thumbnail(
        &self,
        id: i64,
        kind: ThumbnailKind,
    ) -> Result<Option<DynamicImage>, ProviderError> {
        Ok(Some(self.answer("image", id, kind)))
    }

    fn video_thumbnail(
        &self,
        id: i64,
        kind: ThumbnailKind,
    ) -> Result<Option<DynamicImage>, ProviderError> {
        Ok(Some(self.answer("video", id, kind)))
    }

    fn video_frame(
        &self,
        _path: &std::path::Path,
        kind: ThumbnailKind,
    ) -> Result<Option<DynamicImage>, ProviderError> {
        if !self.frames {
            return Ok(None);
        }
        Ok(Some(self.answer("frame", 0, kind)))
    }
}
