//! Post models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Everything known about a post except its body.
///
/// This is what listings, tag pages, search results and the snapshot export
/// carry around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMetadata {
    /// URL-safe identifier derived from the source path
    pub slug: String,

    pub title: String,

    pub summary: String,

    /// Publication date, the canonical sort key
    pub created: DateTime<Utc>,

    /// Last update, equal to `created` when the source does not set one
    pub updated: DateTime<Utc>,

    /// Tags in source order, without duplicates
    pub tags: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    /// e.g. "4 min read"
    pub reading_time: String,

    pub word_count: usize,
}

impl PostMetadata {
    /// Canonical corpus ordering: newest first, then slug ascending
    pub fn chronological_cmp(&self, other: &Self) -> Ordering {
        other
            .created
            .cmp(&self.created)
            .then_with(|| self.slug.cmp(&other.slug))
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn as_adjacent(&self) -> AdjacentPost {
        AdjacentPost {
            slug: self.slug.clone(),
            title: self.title.clone(),
        }
    }
}

/// A blog post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(flatten)]
    pub meta: PostMetadata,

    /// Raw body text (Markdown/MDX), without front-matter
    pub content: String,
}

impl Post {
    pub fn slug(&self) -> &str {
        &self.meta.slug
    }
}

/// Lightweight reference to a neighbouring post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacentPost {
    pub slug: String,
    pub title: String,
}

/// Chronological neighbours of a post.
///
/// `prev` is the older post, `next` the newer one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacentPosts {
    pub prev: Option<AdjacentPost>,
    pub next: Option<AdjacentPost>,
}

/// A tag and how many posts carry it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub name: String,
    pub count: usize,
}

/// Whitespace-delimited token count
pub fn count_words(body: &str) -> usize {
    body.split_whitespace().count()
}

/// Reading time label, rounded up to whole minutes and never below one
pub fn reading_time(word_count: usize, words_per_minute: usize) -> String {
    let wpm = words_per_minute.max(1);
    let minutes = word_count.div_ceil(wpm).max(1);
    format!("{} min read", minutes)
}

/// Case-insensitive tag ordering, original casing kept as tie-breaker
pub fn tag_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
