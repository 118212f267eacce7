//! Command-line interface for contentfile.
//!
//! Provides commands for materializing references into the cache,
//! producing thumbnails, inspecting references, and managing the cache
//! and the local media index.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;

use crate::adapters::{LocalResolver, MediaIndex};
use crate::config::{self, ResolvedConfig};
use crate::core::{lookup, mime, CacheDirectoryManager, FileMaterializer, MimeStrategy, ThumbnailGenerator};
use crate::domain::{is_media_indexed, ContentReference, ProviderKind, ThumbnailKind, ThumbnailRequest};
use crate::runtime;

/// contentfile - turn content references into local files and thumbnails
#[derive(Parser, Debug)]
#[command(name = "contentfile")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Copy referenced content into the cache root
    Materialize {
        /// Content references (URIs); all must succeed
        #[arg(required = true)]
        uris: Vec<String>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a thumbnail for a reference to an image file
    Thumbnail {
        /// Content reference (URI)
        uri: String,

        /// Output image path (format from extension)
        #[arg(short, long)]
        output: PathBuf,

        /// Target width for subsampled decodes
        #[arg(long, requires = "height")]
        width: Option<u32>,

        /// Target height for subsampled decodes
        #[arg(long, requires = "width")]
        height: Option<u32>,

        /// Media-index size class (defaults to the configured kind)
        #[arg(short, long, value_enum)]
        kind: Option<KindArg>,
    },

    /// Show how a reference is classified
    Classify {
        /// Content reference (URI)
        uri: String,
    },

    /// Resolve the MIME type of a file name
    Mime {
        /// File name
        name: String,

        /// Strategy (defaults to the configured one)
        #[arg(short, long, value_enum)]
        strategy: Option<StrategyArg>,
    },

    /// Look up the on-disk path behind a reference
    Lookup {
        /// Content reference (URI)
        uri: String,
    },

    /// Register a local file in the media index and print its reference
    Index {
        /// File to register
        path: PathBuf,
    },

    /// Manage the cache root
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Show resolved configuration (debug)
    Config,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// List cached files, oldest first
    List {
        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete every cached file
    Clear,
}

/// Thumbnail size class for CLI (maps to ThumbnailKind)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    /// 96x96
    Micro,

    /// 512x384
    Mini,
}

impl From<KindArg> for ThumbnailKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Micro => ThumbnailKind::Micro,
            KindArg::Mini => ThumbnailKind::Mini,
        }
    }
}

/// MIME strategy for CLI (maps to MimeStrategy)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    /// Fixed extension table
    ExtensionTable,

    /// Name-guessing heuristic
    NameGuess,
}

impl From<StrategyArg> for MimeStrategy {
    fn from(s: StrategyArg) -> Self {
        match s {
            StrategyArg::ExtensionTable => MimeStrategy::ExtensionTable,
            StrategyArg::NameGuess => MimeStrategy::NameGuess,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Materialize { uris, json } => materialize(&uris, json).await,
            Commands::Thumbnail {
                uri,
                output,
                width,
                height,
                kind,
            } => thumbnail(&uri, &output, width.zip(height), kind).await,
            Commands::Classify { uri } => classify(&uri),
            Commands::Mime { name, strategy } => resolve_mime(&name, strategy),
            Commands::Lookup { uri } => lookup_path(&uri),
            Commands::Index { path } => index_file(&path),
            Commands::Cache { command } => match command {
                CacheCommands::List { json } => list_cache(json),
                CacheCommands::Clear => clear_cache().await,
            },
            Commands::Config => show_config(),
        }
    }
}

fn parse_reference(uri: &str) -> Result<ContentReference> {
    ContentReference::parse(uri).with_context(|| format!("Invalid content reference: {}", uri))
}

fn open_index(cfg: &ResolvedConfig) -> Result<Arc<MediaIndex>> {
    let path = cfg.media_index_path();
    let index = MediaIndex::open(&path)
        .with_context(|| format!("Failed to open media index: {}", path.display()))?;
    if cfg.settings.verbose {
        debug!(path = %path.display(), "Opened media index");
    }
    Ok(Arc::new(index))
}

/// Local provider wired to the configured media index
fn local_resolver(cfg: &ResolvedConfig) -> Result<Arc<LocalResolver>> {
    let mut resolver = LocalResolver::new()
        .with_index(open_index(cfg)?)
        .with_verbose(cfg.settings.verbose);
    if let Some(home) = dirs::home_dir() {
        resolver = resolver.with_storage_root(home);
    }
    Ok(Arc::new(resolver))
}

/// Materialize references and print where they landed
async fn materialize(uris: &[String], json: bool) -> Result<()> {
    let cfg = config::config()?;
    let references = uris
        .iter()
        .map(|uri| parse_reference(uri))
        .collect::<Result<Vec<_>>>()?;

    let materializer = FileMaterializer::new(local_resolver(cfg)?, cfg.settings.clone());
    let files = runtime::materialize(materializer, references).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&files)?);
        return Ok(());
    }

    for file in &files {
        println!(
            "{}\t{}",
            file.path.display(),
            file.mime_type.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

/// Generate a thumbnail and save it
async fn thumbnail(
    uri: &str,
    output: &Path,
    size: Option<(u32, u32)>,
    kind: Option<KindArg>,
) -> Result<()> {
    let cfg = config::config()?;
    let reference = parse_reference(uri)?;

    let kind = kind.map(ThumbnailKind::from).unwrap_or(cfg.settings.thumbnail_kind);
    let request = match size {
        Some((width, height)) => ThumbnailRequest::sized(width, height),
        None => ThumbnailRequest::default(),
    }
    .with_kind(kind);

    let resolver = local_resolver(cfg)?;
    let generator = ThumbnailGenerator::new(resolver.clone(), resolver, cfg.settings.clone());

    let Some(thumbnail) = runtime::thumbnail(generator, reference, request).await? else {
        anyhow::bail!("No thumbnail available for {}", uri);
    };

    thumbnail
        .image()
        .save(output)
        .with_context(|| format!("Failed to write thumbnail: {}", output.display()))?;

    println!(
        "{} ({}x{})",
        output.display(),
        thumbnail.width(),
        thumbnail.height()
    );
    Ok(())
}

/// Print the classification of a reference
fn classify(uri: &str) -> Result<()> {
    let reference = parse_reference(uri)?;

    println!("Reference:     {}", reference);
    println!("Scheme:        {}", reference.scheme());
    println!("Authority:     {}", reference.authority());
    println!("Last segment:  {}", reference.last_path_segment());
    println!("Provider kind: {}", ProviderKind::classify(&reference));
    println!("Media indexed: {}", is_media_indexed(&reference));

    Ok(())
}

/// Print the MIME type for a file name
fn resolve_mime(name: &str, strategy: Option<StrategyArg>) -> Result<()> {
    let strategy = match strategy {
        Some(s) => s.into(),
        None => config::config()?.settings.mime_strategy,
    };

    match mime::resolve(name, strategy) {
        Some(mime_type) => println!("{}", mime_type),
        None => println!("(unknown, extension '{}')", mime::file_extension(name)),
    }

    Ok(())
}

/// Print the on-disk path behind a reference
fn lookup_path(uri: &str) -> Result<()> {
    let cfg = config::config()?;
    let reference = parse_reference(uri)?;
    let resolver = local_resolver(cfg)?;

    let path = lookup::path_for_reference(&*resolver, &reference)
        .with_context(|| format!("Lookup failed for {}", reference))?;

    match path {
        Some(path) => {
            let marker = if lookup::exists(&path) { "" } else { " (missing)" };
            println!("{}{}", path.display(), marker);
            if let Some(file_type) = lookup::file_type(&path) {
                println!("Type: {}", file_type);
            }
        }
        None => println!("No path found for {}", reference),
    }

    Ok(())
}

/// Register a file in the media index
fn index_file(path: &Path) -> Result<()> {
    let cfg = config::config()?;
    let index = open_index(cfg)?;

    let record = index
        .add(path)
        .with_context(|| format!("Failed to index {}", path.display()))?;

    println!("{}", record.reference());
    Ok(())
}

/// List cached files
fn list_cache(json: bool) -> Result<()> {
    let cfg = config::config()?;
    let cache = CacheDirectoryManager::from_settings(&cfg.settings);
    let entries = cache.entries()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("Cache is empty ({})", cache.root().display());
        return Ok(());
    }

    println!("{:<40} {:>12} {:<20}", "NAME", "SIZE", "MODIFIED");
    println!("{}", "-".repeat(74));

    for entry in &entries {
        println!(
            "{:<40} {:>12} {:<20}",
            entry.name,
            entry.size,
            entry.modified.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}

/// Sweep the cache root
async fn clear_cache() -> Result<()> {
    let cfg = config::config()?;
    let cache = CacheDirectoryManager::from_settings(&cfg.settings);
    let root = cache.root().to_path_buf();

    let report = runtime::clear(cache).await?;

    if !report.cleared() {
        println!("Nothing to clear in {}", root.display());
        return Ok(());
    }

    println!(
        "Cleared {}: {} deleted, {} failed",
        root.display(),
        report.deleted,
        report.failed
    );
    Ok(())
}

/// Show resolved configuration
fn show_config() -> Result<()> {
    let cfg = config::config()?;
    let settings = &cfg.settings;

    println!("contentfile configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:        {}", cfg.home.display());
    println!("  Cache root:  {}", settings.cache_root.display());
    println!("  Media index: {}", cfg.media_index_path().display());
    println!();
    println!("Resolver:");
    println!("  MIME strategy:          {}", settings.mime_strategy);
    println!("  Thumbnail kind:         {}", settings.thumbnail_kind);
    println!("  Verbose:                {}", settings.verbose);
    println!("  Generate missing names: {}", settings.generate_missing_names);

    Ok(())
}
