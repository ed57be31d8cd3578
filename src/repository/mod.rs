//! Read-only query surface over the metadata cache
//!
//! Every query waits for the cache to be built and then reads one snapshot,
//! so a single call never mixes two builds.

use std::sync::Arc;

use crate::cache::{MetadataCache, PostSource, Snapshot};
use crate::config::SearchConfig;
use crate::content::{AdjacentPosts, Post, PostMetadata, TagCount};
use crate::error::BuildError;
use crate::search::ScoredResult;

/// Post repository shared by the API, feeds and commands
#[derive(Clone)]
pub struct PostRepository {
    cache: Arc<MetadataCache>,
    search: SearchConfig,
}

impl PostRepository {
    pub fn new<S: PostSource>(source: S, search: SearchConfig) -> Self {
        Self::with_cache(Arc::new(MetadataCache::new(source)), search)
    }

    pub fn with_cache(cache: Arc<MetadataCache>, search: SearchConfig) -> Self {
        Self { cache, search }
    }

    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }

    pub async fn snapshot(&self) -> Result<Arc<Snapshot>, BuildError> {
        self.cache.ensure_built().await
    }

    /// All posts, newest first
    pub async fn all_posts(&self) -> Result<Vec<PostMetadata>, BuildError> {
        Ok(self.snapshot().await?.all_posts())
    }

    /// The most recent `limit` posts, with content
    pub async fn recent_posts(&self, limit: usize) -> Result<Vec<Post>, BuildError> {
        let snapshot = self.snapshot().await?;
        Ok(snapshot.posts().iter().take(limit).cloned().collect())
    }

    pub async fn post(&self, slug: &str) -> Result<Option<Post>, BuildError> {
        Ok(self.snapshot().await?.post(slug).cloned())
    }

    pub async fn adjacent_posts(&self, slug: &str) -> Result<AdjacentPosts, BuildError> {
        Ok(self.snapshot().await?.adjacent_posts(slug))
    }

    pub async fn tags(&self) -> Result<Vec<String>, BuildError> {
        Ok(self.snapshot().await?.tags())
    }

    pub async fn tag_counts(&self) -> Result<Vec<TagCount>, BuildError> {
        Ok(self.snapshot().await?.tag_counts())
    }

    pub async fn posts_by_tag(&self, tag: &str) -> Result<Vec<PostMetadata>, BuildError> {
        Ok(self.snapshot().await?.posts_by_tag(tag))
    }

    pub async fn search(&self, query: &str) -> Result<Vec<ScoredResult>, BuildError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let snapshot = self.snapshot().await?;
        Ok(snapshot.search_index().search(query, &self.search))
    }
}
