//! Content loader - turns the content directory into validated posts

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::frontmatter::{FrontMatter, FrontMatterError};
use super::post::{count_words, reading_time, Post, PostMetadata};
use crate::cache::PostSource;
use crate::error::{BuildError, LoadError};
use crate::helpers::parse_date_string;

/// File extensions treated as post sources
const POST_EXTENSIONS: [&str; 3] = ["md", "mdx", "markdown"];

/// Result of one pass over the content directory
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Valid posts, in discovery order
    pub posts: Vec<Post>,
    /// Sources that were excluded, with the reason
    pub errors: Vec<LoadError>,
}

/// Loads posts from a content directory
#[derive(Debug, Clone)]
pub struct ContentLoader {
    root: PathBuf,
    words_per_minute: usize,
}

impl ContentLoader {
    /// Create a new content loader
    pub fn new<P: Into<PathBuf>>(root: P, words_per_minute: usize) -> Self {
        Self {
            root: root.into(),
            words_per_minute,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load every post under the content root.
    ///
    /// Only a missing or unreadable root is fatal. Problems with individual
    /// sources end up in [`LoadOutcome::errors`].
    pub fn load_posts(&self) -> Result<LoadOutcome, BuildError> {
        if !self.root.exists() {
            return Err(BuildError::ContentRootMissing(self.root.clone()));
        }
        if !self.root.is_dir() {
            return Err(BuildError::ContentRootNotDir(self.root.clone()));
        }

        let mut outcome = LoadOutcome::default();
        let mut seen: HashMap<String, PathBuf> = HashMap::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name().to_str()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(BuildError::Unreadable {
                        path: self.root.clone(),
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    tracing::warn!("Failed to read {:?}: {}", path, e);
                    outcome.errors.push(LoadError::Io {
                        path,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_file() || !is_post_file(path) {
                continue;
            }

            tracing::debug!("Loading post source {:?}", path);
            let result = self.load_post(path).and_then(|post| {
                if let Some(existing) = seen.get(&post.meta.slug) {
                    return Err(LoadError::DuplicateSlug {
                        path: path.to_path_buf(),
                        slug: post.meta.slug.clone(),
                        existing: existing.clone(),
                    });
                }
                Ok(post)
            });

            match result {
                Ok(post) => {
                    seen.insert(post.meta.slug.clone(), path.to_path_buf());
                    outcome.posts.push(post);
                }
                Err(e) => {
                    tracing::warn!("Skipping post: {}", e);
                    outcome.errors.push(e);
                }
            }
        }

        tracing::info!(
            "Loaded {} posts from {:?} ({} skipped)",
            outcome.posts.len(),
            self.root,
            outcome.errors.len()
        );

        Ok(outcome)
    }

    /// Load and validate a single post source
    pub fn load_post(&self, path: &Path) -> Result<Post, LoadError> {
        let content = fs::read_to_string(path).map_err(|e| LoadError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let (fm, body) = FrontMatter::parse(&content).map_err(|e| match e {
            FrontMatterError::Missing => LoadError::MissingFrontMatter {
                path: path.to_path_buf(),
            },
            FrontMatterError::Malformed(message) => LoadError::MalformedFrontMatter {
                path: path.to_path_buf(),
                message,
            },
        })?;

        let slug = slug_for_path(&self.root, path).ok_or_else(|| LoadError::InvalidSlug {
            path: path.to_path_buf(),
        })?;

        build_post(path, slug, fm, body, self.words_per_minute)
    }
}

impl PostSource for ContentLoader {
    fn load(&self) -> Result<LoadOutcome, BuildError> {
        self.load_posts()
    }
}

/// Validate front-matter against the post schema and assemble the post
fn build_post(
    path: &Path,
    slug: String,
    fm: FrontMatter,
    body: &str,
    words_per_minute: usize,
) -> Result<Post, LoadError> {
    let required = |value: Option<String>, field: &'static str| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| LoadError::MissingField {
                path: path.to_path_buf(),
                field,
            })
    };
    let date = |value: &str, field: &'static str| {
        parse_date_string(value).ok_or_else(|| LoadError::InvalidDate {
            path: path.to_path_buf(),
            field,
            value: value.to_string(),
        })
    };

    let title = required(fm.title, "title")?;
    let summary = required(fm.summary, "summary")?;
    let created = date(&required(fm.created, "created")?, "created")?;

    let updated = match fm.updated.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => date(value, "updated")?,
        _ => created,
    };
    if updated < created {
        return Err(LoadError::UpdatedBeforeCreated {
            path: path.to_path_buf(),
        });
    }

    let raw_tags = fm.tags.ok_or_else(|| LoadError::MissingField {
        path: path.to_path_buf(),
        field: "tags",
    })?;
    let mut tags: Vec<String> = Vec::with_capacity(raw_tags.len());
    for tag in raw_tags {
        let tag = tag.trim();
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }

    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    let word_count = count_words(body);

    Ok(Post {
        meta: PostMetadata {
            slug,
            title,
            summary,
            created,
            updated,
            tags,
            image: non_empty(fm.image),
            caption: non_empty(fm.caption),
            reading_time: reading_time(word_count, words_per_minute),
            word_count,
        },
        content: body.to_string(),
    })
}

/// Derive a slug from a source path relative to the content root.
///
/// `hello.mdx` becomes `hello`, `hello/index.md` becomes `hello`. Nested
/// directories are joined with `-` so a slug is always a single URL segment:
/// `series/part-1.md` becomes `series-part-1`.
pub fn slug_for_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let stem = relative.file_stem()?.to_str()?;
    let parent = relative.parent().filter(|p| !p.as_os_str().is_empty());

    let mut components: Vec<String> = parent
        .map(|p| {
            p.components()
                .filter_map(|c| c.as_os_str().to_str())
                .map(slug::slugify)
                .collect()
        })
        .unwrap_or_default();

    if stem != "index" || components.is_empty() {
        components.push(slug::slugify(stem));
    }

    if components.iter().any(|c| c.is_empty()) {
        return None;
    }
    Some(components.join("-"))
}

/// Check if a file is a post source
fn is_post_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| POST_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

/// Drafts/partials (`_name`) and dotfiles are not posts
fn is_hidden(name: Option<&str>) -> bool {
    name.map(|n| n.starts_with('_') || n.starts_with('.'))
        .unwrap_or(false)
}
