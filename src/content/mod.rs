//! Content module - post models, front-matter parsing and loading

mod frontmatter;
pub mod loader;
mod markdown;
mod post;

pub use frontmatter::{FrontMatter, FrontMatterError};
pub use loader::{ContentLoader, LoadOutcome};
pub use markdown::MarkdownRenderer;
pub use post::{
    count_words, reading_time, tag_cmp, AdjacentPost, AdjacentPosts, Post, PostMetadata,
    TagCount,
};
