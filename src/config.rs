//! Configuration for contentfile.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (CONTENTFILE_HOME, CONTENTFILE_CACHE_DIR, CONTENTFILE_VERBOSE)
//! 2. Config file (.contentfile/config.yaml)
//! 3. Defaults (~/.contentfile, platform cache dir)
//!
//! Config file discovery:
//! - Searches current directory and parents for .contentfile/config.yaml
//! - Paths in config file are relative to the project root (parent of .contentfile/)

pub mod paths;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::MimeStrategy;
use crate::domain::ThumbnailKind;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub resolver: Option<ResolverConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory holding the media index (relative to project root)
    pub home: Option<String>,
    /// Scratch cache root (relative to project root)
    pub cache: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolverConfig {
    pub mime_strategy: Option<MimeStrategy>,
    pub thumbnail_kind: Option<ThumbnailKind>,
    pub verbose: Option<bool>,
    pub generate_missing_names: Option<bool>,
}

/// Settings handed to each component at construction
#[derive(Debug, Clone)]
pub struct Settings {
    /// Scratch cache root; all materialized files land directly inside it
    pub cache_root: PathBuf,

    /// MIME strategy used for the extension-fallback decision
    pub mime_strategy: MimeStrategy,

    /// Default size class for media-index thumbnails
    pub thumbnail_kind: ThumbnailKind,

    /// Emit per-step debug events
    pub verbose: bool,

    /// Name files with a random UUID when the provider reports no name
    pub generate_missing_names: bool,
}

impl Settings {
    /// Defaults for a given cache root
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
            mime_strategy: MimeStrategy::default(),
            thumbnail_kind: ThumbnailKind::default(),
            verbose: false,
            generate_missing_names: false,
        }
    }

    pub fn with_mime_strategy(mut self, strategy: MimeStrategy) -> Self {
        self.mime_strategy = strategy;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_generated_names(mut self, enabled: bool) -> Self {
        self.generate_missing_names = enabled;
        self
    }
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to contentfile home (media index, state)
    pub home: PathBuf,
    /// Component settings, including the cache root
    pub settings: Settings,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Path of the local SQLite media index
    pub fn media_index_path(&self) -> PathBuf {
        self.home.join("media_index.db")
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".contentfile").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Parse a boolean-ish environment value
fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let config_file = find_config_file();

    let file = match config_file {
        Some(ref path) => Some(load_config_file(path)?),
        None => None,
    };

    // Base directory is the parent of .contentfile/ (i.e., grandparent of config.yaml)
    let base_dir = config_file
        .as_deref()
        .and_then(|p| p.parent())
        .and_then(|p| p.parent())
        .unwrap_or(Path::new("."))
        .to_path_buf();

    let paths = file.as_ref().map(|f| f.paths.clone()).unwrap_or_default();
    let resolver = file
        .as_ref()
        .and_then(|f| f.resolver.clone())
        .unwrap_or_default();

    let home = if let Ok(env_home) = std::env::var("CONTENTFILE_HOME") {
        PathBuf::from(env_home)
    } else if let Some(ref home_path) = paths.home {
        resolve_path(&base_dir, home_path)
    } else {
        paths::default_home()?
    };

    let cache_root = if let Ok(env_cache) = std::env::var("CONTENTFILE_CACHE_DIR") {
        PathBuf::from(env_cache)
    } else if let Some(ref cache_path) = paths.cache {
        resolve_path(&base_dir, cache_path)
    } else {
        paths::default_cache_root()?
    };

    let settings = Settings {
        cache_root,
        mime_strategy: resolver.mime_strategy.unwrap_or_default(),
        thumbnail_kind: resolver.thumbnail_kind.unwrap_or_default(),
        verbose: env_flag("CONTENTFILE_VERBOSE")
            .or(resolver.verbose)
            .unwrap_or(false),
        generate_missing_names: resolver.generate_missing_names.unwrap_or(false),
    };

    Ok(ResolvedConfig {
        home,
        settings,
        config_file,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let config_dir = temp.path().join(".contentfile");
        std::fs::create_dir_all(&config_dir).unwrap();

        let config_path = config_dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
paths:
  home: ./state
  cache: ./cache
resolver:
  mime_strategy: extension_table
  thumbnail_kind: micro
  verbose: true
"#
        )
        .unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.paths.home, Some("./state".to_string()));
        assert_eq!(config.paths.cache, Some("./cache".to_string()));

        let resolver = config.resolver.unwrap();
        assert_eq!(resolver.mime_strategy, Some(MimeStrategy::ExtensionTable));
        assert_eq!(resolver.thumbnail_kind, Some(ThumbnailKind::Micro));
        assert_eq!(resolver.verbose, Some(true));
        assert_eq!(resolver.generate_missing_names, None);
    }

    #[test]
    fn test_minimal_config_file() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.yaml");
        std::fs::write(&config_path, "version: \"1.0\"\n").unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert!(config.paths.cache.is_none());
        assert!(config.resolver.is_none());
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::new("/tmp/cache");
        assert_eq!(settings.cache_root, PathBuf::from("/tmp/cache"));
        assert_eq!(settings.mime_strategy, MimeStrategy::NameGuess);
        assert_eq!(settings.thumbnail_kind, ThumbnailKind::Mini);
        assert!(!settings.verbose);
        assert!(!settings.generate_missing_names);
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./subdir"),
            PathBuf::from("/home/user/project/./subdir")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}
