//! MIME type resolution from file names.
//!
//! Two interchangeable strategies, picked per call:
//! - `ExtensionTable`: the text after the last `.` looked up in a static table
//! - `NameGuess`: a content-type guesser driven by the trailing name component
//!
//! An unresolvable name is an expected case and yields `None`.

use serde::{Deserialize, Serialize};

/// How to derive a MIME type from a file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MimeStrategy {
    /// Static extension -> MIME table
    ExtensionTable,

    /// Heuristic guess from the trailing name component
    #[default]
    NameGuess,
}

impl MimeStrategy {
    /// Resolve `file_name` with this strategy
    pub fn resolve(&self, file_name: &str) -> Option<String> {
        resolve(file_name, *self)
    }
}

impl std::fmt::Display for MimeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MimeStrategy::ExtensionTable => write!(f, "extension_table"),
            MimeStrategy::NameGuess => write!(f, "name_guess"),
        }
    }
}

impl std::str::FromStr for MimeStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "extension_table" | "extension" | "table" => Ok(MimeStrategy::ExtensionTable),
            "name_guess" | "guess" => Ok(MimeStrategy::NameGuess),
            _ => anyhow::bail!("Unknown MIME strategy: {}", s),
        }
    }
}

/// Extension -> MIME table, sorted by extension
const EXTENSION_TABLE: &[(&str, &str)] = &[
    ("3gp", "video/3gpp"),
    ("7z", "application/x-7z-compressed"),
    ("aac", "audio/aac"),
    ("amr", "audio/amr"),
    ("apk", "application/vnd.android.package-archive"),
    ("avi", "video/x-msvideo"),
    ("bmp", "image/bmp"),
    ("css", "text/css"),
    ("csv", "text/csv"),
    ("doc", "application/msword"),
    ("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
    ("epub", "application/epub+zip"),
    ("flac", "audio/flac"),
    ("gif", "image/gif"),
    ("gz", "application/gzip"),
    ("heic", "image/heic"),
    ("heif", "image/heif"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("ico", "image/x-icon"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("js", "text/javascript"),
    ("json", "application/json"),
    ("m4a", "audio/mp4"),
    ("m4v", "video/mp4"),
    ("md", "text/markdown"),
    ("mkv", "video/x-matroska"),
    ("mov", "video/quicktime"),
    ("mp3", "audio/mpeg"),
    ("mp4", "video/mp4"),
    ("odp", "application/vnd.oasis.opendocument.presentation"),
    ("ods", "application/vnd.oasis.opendocument.spreadsheet"),
    ("odt", "application/vnd.oasis.opendocument.text"),
    ("ogg", "audio/ogg"),
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("ppt", "application/vnd.ms-powerpoint"),
    ("pptx", "application/vnd.openxmlformats-officedocument.presentationml.presentation"),
    ("rar", "application/vnd.rar"),
    ("rtf", "application/rtf"),
    ("svg", "image/svg+xml"),
    ("tar", "application/x-tar"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("txt", "text/plain"),
    ("wav", "audio/wav"),
    ("webm", "video/webm"),
    ("webp", "image/webp"),
    ("xls", "application/vnd.ms-excel"),
    ("xlsx", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
    ("xml", "text/xml"),
    ("zip", "application/zip"),
];

/// Resolve a MIME type for `file_name` using `strategy`
pub fn resolve(file_name: &str, strategy: MimeStrategy) -> Option<String> {
    match strategy {
        MimeStrategy::ExtensionTable => from_extension_table(file_name),
        MimeStrategy::NameGuess => guess_from_name(file_name),
    }
}

/// Text after the last `.`, empty when there is no dot
pub fn file_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) => &file_name[idx + 1..],
        None => "",
    }
}

fn from_extension_table(file_name: &str) -> Option<String> {
    let idx = file_name.rfind('.')?;
    let extension = file_name[idx + 1..].to_ascii_lowercase();
    if extension.is_empty() {
        return None;
    }

    EXTENSION_TABLE
        .binary_search_by(|(ext, _)| (*ext).cmp(extension.as_str()))
        .ok()
        .map(|i| EXTENSION_TABLE[i].1.to_string())
}

fn guess_from_name(file_name: &str) -> Option<String> {
    // Only the trailing component counts; fragments never carry a type.
    let name = file_name.rsplit('/').next().unwrap_or(file_name);
    let name = name.split('#').next().unwrap_or(name);
    if !name.contains('.') {
        return None;
    }

    mime_guess::from_path(name).first_raw().map(str::to_string)
}
