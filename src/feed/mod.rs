//! Syndication feeds (RSS 2.0, Atom 1.0, JSON Feed 1.1)
//!
//! All three formats are rendered from the same list of [`FeedEntry`]s, so
//! they always agree on which posts are published and in what order.

mod atom;
mod json;
mod rss;

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::SiteConfig;
use crate::content::{MarkdownRenderer, Post};
use crate::helpers::{convert_relative_urls_to_absolute, strip_invalid_xml_chars};

/// A post prepared for syndication
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub title: String,
    /// Absolute URL of the post, also used as its id
    pub link: String,
    pub summary: String,
    /// Cleaned HTML body
    pub content_html: String,
    pub published: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub tags: Vec<String>,
    pub image: Option<String>,
}

impl FeedEntry {
    fn from_post(post: &Post, config: &SiteConfig, renderer: &MarkdownRenderer) -> Self {
        let base_url = config.url.trim_end_matches('/');
        let html = renderer.render_mdx(&post.content);
        let html = convert_relative_urls_to_absolute(&html, base_url);

        Self {
            title: post.meta.title.clone(),
            link: config.post_url(&post.meta.slug),
            summary: post.meta.summary.clone(),
            content_html: strip_invalid_xml_chars(&html),
            published: post.meta.created,
            updated: post.meta.updated,
            tags: post.meta.tags.clone(),
            image: post
                .meta
                .image
                .as_deref()
                .map(|image| absolute_url(config, image)),
        }
    }
}

/// Feed over the most recent posts of a corpus
pub struct Feed<'a> {
    config: &'a SiteConfig,
    entries: Vec<FeedEntry>,
}

impl<'a> Feed<'a> {
    /// Build a feed from posts already in corpus order (newest first)
    pub fn new(config: &'a SiteConfig, posts: &[Post]) -> Self {
        let renderer = MarkdownRenderer::new();
        let entries = posts
            .iter()
            .take(config.feed.limit)
            .map(|post| FeedEntry::from_post(post, config, &renderer))
            .collect();
        Self { config, entries }
    }

    pub fn entries(&self) -> &[FeedEntry] {
        &self.entries
    }

    /// Last modification across the entries, or now for an empty feed
    pub fn updated(&self) -> DateTime<Utc> {
        self.entries
            .iter()
            .map(|e| e.updated)
            .max()
            .unwrap_or_else(Utc::now)
    }

    pub fn to_rss(&self) -> Result<String> {
        rss::render(self)
    }

    pub fn to_atom(&self) -> String {
        atom::render(self)
    }

    pub fn to_json(&self) -> Result<String> {
        json::render(self)
    }
}

/// Write the RSS, Atom and JSON feeds into `out_dir`
pub fn write_feeds(config: &SiteConfig, posts: &[Post], out_dir: &Path) -> Result<Vec<PathBuf>> {
    let feed = Feed::new(config, posts);
    fs::create_dir_all(out_dir)?;

    let outputs = [
        (&config.feed.rss, feed.to_rss()?),
        (&config.feed.atom, feed.to_atom()),
        (&config.feed.json, feed.to_json()?),
    ];

    let mut written = Vec::with_capacity(outputs.len());
    for (name, content) in outputs {
        let path = out_dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        tracing::info!("Generated {}", name);
        written.push(path);
    }

    Ok(written)
}

fn absolute_url(config: &SiteConfig, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        config.full_url_for(url)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::content::PostMetadata;
    use chrono::TimeZone;
    use tempfile::TempDir;

    pub(crate) fn config() -> SiteConfig {
        SiteConfig {
            title: "Folio & Friends".to_string(),
            description: "Writing about Rust".to_string(),
            author: "Jane Doe".to_string(),
            email: Some("jane@example.com".to_string()),
            url: "https://example.com/".to_string(),
            ..SiteConfig::default()
        }
    }

    pub(crate) fn post(slug: &str, day: u32, content: &str) -> Post {
        let created = Utc.with_ymd_and_hms(2024, 2, day, 8, 30, 0).unwrap();
        Post {
            meta: PostMetadata {
                slug: slug.to_string(),
                title: format!("Post <{}>", slug),
                summary: format!("About {}", slug),
                created,
                updated: created,
                tags: vec!["rust".to_string(), "web".to_string()],
                image: Some("/images/cover.png".to_string()),
                caption: None,
                reading_time: "1 min read".to_string(),
                word_count: 2,
            },
            content: content.to_string(),
        }
    }

    #[test]
    fn test_entries_are_limited_and_cleaned() {
        let mut config = config();
        config.feed.limit = 2;
        let posts = vec![
            post("c", 3, "import X from \"x\"\n\n<Note>Hello **world**</Note>\n"),
            post("b", 2, "[link](/blog/a)\u{0001}"),
            post("a", 1, "old"),
        ];

        let feed = Feed::new(&config, &posts);
        assert_eq!(feed.entries().len(), 2);

        let first = &feed.entries()[0];
        assert_eq!(first.link, "https://example.com/blog/c");
        assert!(first.content_html.contains("<strong>world</strong>"));
        assert!(!first.content_html.contains("import"));
        assert!(!first.content_html.contains("Note"));
        assert_eq!(
            first.image.as_deref(),
            Some("https://example.com/images/cover.png")
        );

        let second = &feed.entries()[1];
        assert!(second
            .content_html
            .contains("href=\"https://example.com/blog/a\""));
        assert!(!second.content_html.contains('\u{0001}'));

        assert_eq!(feed.updated(), posts[0].meta.updated);
    }

    #[test]
    fn test_write_feeds() {
        let dir = TempDir::new().unwrap();
        let config = config();
        let posts = vec![post("hello", 1, "Hello")];

        let written = write_feeds(&config, &posts, dir.path()).unwrap();
        assert_eq!(written.len(), 3);
        for name in ["feed.xml", "atom.xml", "feed.json"] {
            let content = fs::read_to_string(dir.path().join(name)).unwrap();
            assert!(content.contains("https://example.com/blog/hello"));
        }
    }

    #[test]
    fn test_empty_feed() {
        let config = config();
        let feed = Feed::new(&config, &[]);
        assert!(feed.entries().is_empty());
        assert!(feed.to_rss().is_ok());
        assert!(feed.to_atom().contains("</feed>"));
    }
}
