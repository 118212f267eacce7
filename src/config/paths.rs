//! Canonical paths for contentfile.
//!
//! Single source of truth - import this instead of hardcoding paths.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use contentfile::config::paths;
//!
//! let cache = paths::default_cache_root()?;
//! ```
//!
//! ## Layout
//!
//! | Location | Purpose |
//! |----------|---------|
//! | `<cache dir>/ContentFile/` | Materialized files (flat, named after display names) |
//! | `~/.contentfile/media_index.db` | Local media index |

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Library-scoped folder segment under the platform cache directory
pub const DEFAULT_CACHE_DIRECTORY_NAME: &str = "ContentFile";

/// Name of the state directory under the user's home
pub const HOME_DIRECTORY_NAME: &str = ".contentfile";

/// Default home directory (~/.contentfile)
pub fn default_home() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Failed to determine home directory")?;
    Ok(home.join(HOME_DIRECTORY_NAME))
}

/// Default cache root (<platform cache dir>/ContentFile).
/// Falls back to ~/.contentfile/cache when the platform has no cache dir.
pub fn default_cache_root() -> Result<PathBuf> {
    match dirs::cache_dir() {
        Some(dir) => Ok(dir.join(DEFAULT_CACHE_DIRECTORY_NAME)),
        None => Ok(default_home()?.join("cache")),
    }
}
