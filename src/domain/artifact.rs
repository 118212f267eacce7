//! Artifacts produced by resolution.
//!
//! A [`ResolvedFile`] is a local, byte-for-byte copy of a reference's content.
//! A [`Thumbnail`] is a decoded preview image. Both are handed to the caller
//! and never touched by the core again.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// A reference materialized into the cache root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedFile {
    /// `<cacheRoot>/<fileName>`, possibly with a `.pdf` fallback suffix
    pub path: PathBuf,

    /// MIME type reported by the provider, or guessed from the name
    pub mime_type: Option<String>,
}

impl ResolvedFile {
    /// Create a new resolved file
    pub fn new(path: impl Into<PathBuf>, mime_type: Option<String>) -> Self {
        Self {
            path: path.into(),
            mime_type,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name component of the path
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

/// Size class of a media-index thumbnail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThumbnailKind {
    /// 96x96 preview
    Micro,

    /// 512x384 preview
    #[default]
    Mini,
}

impl ThumbnailKind {
    /// Bounding box (width, height) a store should fit this kind into
    pub fn bounds(&self) -> (u32, u32) {
        match self {
            ThumbnailKind::Micro => (96, 96),
            ThumbnailKind::Mini => (512, 384),
        }
    }
}

impl std::fmt::Display for ThumbnailKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThumbnailKind::Micro => write!(f, "micro"),
            ThumbnailKind::Mini => write!(f, "mini"),
        }
    }
}

impl std::str::FromStr for ThumbnailKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "micro" => Ok(ThumbnailKind::Micro),
            "mini" => Ok(ThumbnailKind::Mini),
            _ => anyhow::bail!("Unknown thumbnail kind: {}", s),
        }
    }
}

/// What the caller wants back from the thumbnail generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ThumbnailRequest {
    /// Requested width; subsampling applies only when both bounds are set
    #[serde(default)]
    pub target_width: Option<u32>,

    /// Requested height
    #[serde(default)]
    pub target_height: Option<u32>,

    /// Size class used for media-index thumbnails
    #[serde(default)]
    pub kind: ThumbnailKind,
}

impl ThumbnailRequest {
    /// Request with target bounds and the default kind
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            target_width: Some(width),
            target_height: Some(height),
            kind: ThumbnailKind::default(),
        }
    }

    pub fn with_kind(mut self, kind: ThumbnailKind) -> Self {
        self.kind = kind;
        self
    }

    /// Both target bounds, when present and non-zero
    pub fn target_size(&self) -> Option<(u32, u32)> {
        match (self.target_width, self.target_height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }
}

/// A decoded preview image
#[derive(Debug, Clone)]
pub struct Thumbnail {
    image: DynamicImage,
}

impl Thumbnail {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }
}

impl From<DynamicImage> for Thumbnail {
    fn from(image: DynamicImage) -> Self {
        Self::new(image)
    }
}
