//! Content references.
//!
//! A content reference is an opaque, provider-issued identifier for a unit
//! of content (`content://authority/path/...`, `file:///...`). The core never
//! mints references; it only inspects the parts handed to it.

use std::fmt;
use std::str::FromStr;

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Errors produced while parsing a reference string
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("Invalid content reference '{input}': {source}")]
    Invalid {
        input: String,
        #[source]
        source: url::ParseError,
    },
}

/// An immutable reference to content held by some provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentReference {
    /// URI scheme (`content`, `file`, ...)
    scheme: String,

    /// Provider authority (empty for `file:///` references)
    authority: String,

    /// Percent-decoded path segments
    path_segments: Vec<String>,
}

impl ContentReference {
    /// Build a reference from its parts
    pub fn new(
        scheme: impl Into<String>,
        authority: impl Into<String>,
        path_segments: Vec<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            authority: authority.into(),
            path_segments,
        }
    }

    /// Parse a URI string into a reference
    pub fn parse(input: &str) -> Result<Self, ReferenceError> {
        let url = Url::parse(input).map_err(|source| ReferenceError::Invalid {
            input: input.to_string(),
            source,
        })?;

        let authority = url.host_str().unwrap_or_default().to_string();
        let path_segments = url
            .path_segments()
            .map(|segments| {
                segments
                    .filter(|s| !s.is_empty())
                    .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            scheme: url.scheme().to_string(),
            authority,
            path_segments,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn path_segments(&self) -> &[String] {
        &self.path_segments
    }

    /// Last decoded path segment, empty when the path is empty
    pub fn last_path_segment(&self) -> &str {
        self.path_segments
            .last()
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Decoded path joined with `/`, with a leading slash
    pub fn path(&self) -> String {
        format!("/{}", self.path_segments.join("/"))
    }
}

impl fmt::Display for ContentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority, self.path())
    }
}

impl FromStr for ContentReference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
