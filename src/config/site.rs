//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,
    pub email: Option<String>,
    pub language: String,

    // URL
    pub url: String,
    /// Path segment posts are served under (`{url}/{post_dir}/{slug}`)
    pub post_dir: String,

    // Directory
    pub content_dir: String,
    pub public_dir: String,
    pub snapshot_path: String,

    // Writing
    pub words_per_minute: usize,

    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Folio".to_string(),
            description: String::new(),
            author: "Anonymous".to_string(),
            email: None,
            language: "en".to_string(),

            url: "http://example.com".to_string(),
            post_dir: "blog".to_string(),

            content_dir: "content/posts".to_string(),
            public_dir: "public".to_string(),
            snapshot_path: ".folio-cache/posts.json".to_string(),

            words_per_minute: 200,

            feed: FeedConfig::default(),
            search: SearchConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Absolute URL of a post
    pub fn post_url(&self, slug: &str) -> String {
        let base = self.url.trim_end_matches('/');
        let dir = self.post_dir.trim_matches('/');
        if dir.is_empty() {
            format!("{}/{}", base, slug)
        } else {
            format!("{}/{}/{}", base, dir, slug)
        }
    }

    /// Absolute URL of a site-relative path
    pub fn full_url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Feed generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Number of most recent posts included in each feed
    pub limit: usize,
    pub rss: String,
    pub atom: String,
    pub json: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            limit: 20,
            rss: "feed.xml".to_string(),
            atom: "atom.xml".to_string(),
            json: "feed.json".to_string(),
        }
    }
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Highest distance (0 = perfect, 1 = unrelated) still returned
    pub threshold: f64,
    pub limit: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            limit: None,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub ip: String,
    pub port: u16,
    /// Shared-cache freshness window in seconds
    pub max_age: u64,
    pub stale_while_revalidate: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: "127.0.0.1".to_string(),
            port: 4000,
            max_age: 3600,
            stale_while_revalidate: 21600,
        }
    }
}

impl ServerConfig {
    /// `Cache-Control` value sent on every read endpoint
    pub fn cache_control(&self) -> String {
        format!(
            "public, s-maxage={}, stale-while-revalidate={}",
            self.max_age, self.stale_while_revalidate
        )
    }
}
