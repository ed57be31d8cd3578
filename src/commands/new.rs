//! Scaffold a new post

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::content::FrontMatter;
use crate::Folio;

/// Create `<content_dir>/<slug>.mdx` with a complete front-matter block.
///
/// The summary starts out as the title so the new post loads right away.
pub fn create_post(folio: &Folio, title: &str, slug: Option<&str>) -> Result<PathBuf> {
    let slug = slug::slugify(slug.unwrap_or(title));
    if slug.is_empty() {
        anyhow::bail!("Cannot derive a slug from {:?}", title);
    }

    let file_path = folio.content_dir.join(format!("{}.mdx", slug));
    let existing = ["md", "mdx", "markdown"]
        .iter()
        .map(|ext| folio.content_dir.join(format!("{}.{}", slug, ext)))
        .chain(std::iter::once(folio.content_dir.join(&slug)))
        .find(|path| path.exists());
    if let Some(path) = existing {
        anyhow::bail!("Post already exists: {:?}", path);
    }

    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    let front_matter = FrontMatter {
        title: Some(title.to_string()),
        summary: Some(title.to_string()),
        created: Some(today.clone()),
        updated: Some(today),
        tags: Some(Vec::new()),
        ..FrontMatter::default()
    };
    let yaml = serde_yaml::to_string(&front_matter).context("Failed to serialize front-matter")?;
    let content = format!("---\n{}---\n\n", yaml);

    fs::create_dir_all(&folio.content_dir)?;
    fs::write(&file_path, content)?;

    println!("Created: {:?}", file_path);
    Ok(file_path)
}
