//! folio: post repository and metadata cache for a Markdown/MDX blog
//!
//! Posts are loaded from a content directory once per process, validated
//! against a front-matter schema and kept in an in-memory snapshot. The
//! snapshot backs listings, tag pages, fuzzy search, syndication feeds and a
//! small JSON API.

pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod feed;
pub mod helpers;
pub mod repository;
pub mod search;
pub mod server;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::MetadataCache;
use crate::content::ContentLoader;
use crate::repository::PostRepository;

/// A site on disk: its configuration, resolved directories and post cache
#[derive(Clone)]
pub struct Folio {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Content root holding the post sources
    pub content_dir: PathBuf,
    /// Feed output directory
    pub public_dir: PathBuf,
    /// Location of the JSON export
    pub snapshot_path: PathBuf,
    cache: Arc<MetadataCache>,
}

impl Folio {
    /// Open a site from a directory, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let content_dir = base_dir.join(&config.content_dir);
        let public_dir = base_dir.join(&config.public_dir);
        let snapshot_path = base_dir.join(&config.snapshot_path);
        let cache = Arc::new(MetadataCache::new(ContentLoader::new(
            &content_dir,
            config.words_per_minute,
        )));

        Ok(Self {
            config,
            base_dir,
            content_dir,
            public_dir,
            snapshot_path,
            cache,
        })
    }

    /// Repository over this site's cache.
    ///
    /// Every repository handed out shares the one cache, so the corpus is
    /// loaded at most once per process.
    pub fn repository(&self) -> PostRepository {
        PostRepository::with_cache(Arc::clone(&self.cache), self.config.search.clone())
    }
}
