//! Immutable, fully materialized view of the corpus

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::content::{tag_cmp, AdjacentPosts, LoadOutcome, Post, PostMetadata, TagCount};
use crate::error::LoadError;
use crate::search::SearchIndex;

/// Format version of the JSON export
const EXPORT_VERSION: u32 = 1;

/// One built corpus. Never mutated after construction.
pub struct Snapshot {
    /// Newest first, ties by slug
    posts: Vec<Post>,
    positions: HashMap<String, usize>,
    errors: Vec<LoadError>,
    generation: u64,
    built_at: DateTime<Utc>,
    search: OnceLock<SearchIndex>,
}

impl Snapshot {
    /// Order a load outcome into a snapshot for the given cache generation
    pub fn new(outcome: LoadOutcome, generation: u64) -> Self {
        let LoadOutcome { mut posts, errors } = outcome;
        posts.sort_by(|a, b| a.meta.chronological_cmp(&b.meta));

        let positions = posts
            .iter()
            .enumerate()
            .map(|(i, p)| (p.meta.slug.clone(), i))
            .collect();

        Self {
            posts,
            positions,
            errors,
            generation,
            built_at: Utc::now(),
            search: OnceLock::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Sources excluded during the build
    pub fn errors(&self) -> &[LoadError] {
        &self.errors
    }

    /// Posts in corpus order
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn all_posts(&self) -> Vec<PostMetadata> {
        self.posts.iter().map(|p| p.meta.clone()).collect()
    }

    pub fn post(&self, slug: &str) -> Option<&Post> {
        self.positions.get(slug).map(|&i| &self.posts[i])
    }

    /// Older neighbour as `prev`, newer as `next`
    pub fn adjacent_posts(&self, slug: &str) -> AdjacentPosts {
        let Some(&pos) = self.positions.get(slug) else {
            return AdjacentPosts::default();
        };

        AdjacentPosts {
            prev: self.posts.get(pos + 1).map(|p| p.meta.as_adjacent()),
            next: pos
                .checked_sub(1)
                .and_then(|i| self.posts.get(i))
                .map(|p| p.meta.as_adjacent()),
        }
    }

    pub fn tags(&self) -> Vec<String> {
        self.tag_counts().into_iter().map(|t| t.name).collect()
    }

    /// Every tag with its post count, sorted case-insensitively
    pub fn tag_counts(&self) -> Vec<TagCount> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for post in &self.posts {
            for tag in &post.meta.tags {
                *counts.entry(tag.as_str()).or_insert(0) += 1;
            }
        }

        let mut tags: Vec<TagCount> = counts
            .into_iter()
            .map(|(name, count)| TagCount {
                name: name.to_string(),
                count,
            })
            .collect();
        tags.sort_by(|a, b| tag_cmp(&a.name, &b.name));
        tags
    }

    pub fn posts_by_tag(&self, tag: &str) -> Vec<PostMetadata> {
        self.posts
            .iter()
            .filter(|p| p.meta.has_tag(tag))
            .map(|p| p.meta.clone())
            .collect()
    }

    /// Search index for this snapshot, built on first use
    pub fn search_index(&self) -> &SearchIndex {
        self.search.get_or_init(|| {
            tracing::debug!("Building search index over {} posts", self.posts.len());
            SearchIndex::build(self.posts.iter().map(|p| &p.meta))
        })
    }

    /// Write the metadata of this snapshot as JSON.
    ///
    /// The export is for external tooling; the cache never reads it back.
    pub fn export(&self, path: &Path) -> Result<()> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Export<'a> {
            version: u32,
            built_at: DateTime<Utc>,
            posts: Vec<&'a PostMetadata>,
            tags: Vec<TagCount>,
            errors: Vec<String>,
        }

        let export = Export {
            version: EXPORT_VERSION,
            built_at: self.built_at,
            posts: self.posts.iter().map(|p| &p.meta).collect(),
            tags: self.tag_counts(),
            errors: self.errors.iter().map(|e| e.to_string()).collect(),
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&export)?;
        fs::write(path, content)?;
        Ok(())
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("posts", &self.posts.len())
            .field("errors", &self.errors.len())
            .field("generation", &self.generation)
            .field("built_at", &self.built_at)
            .finish()
    }
}
