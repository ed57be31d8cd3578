//! List site content

use anyhow::Result;
use std::fmt::Write;

use crate::helpers::short_date;
use crate::Folio;

/// List posts, tags or load errors
pub async fn run(folio: &Folio, content_type: &str) -> Result<()> {
    print!("{}", render(folio, content_type).await?);
    Ok(())
}

async fn render(folio: &Folio, content_type: &str) -> Result<String> {
    let repo = folio.repository();
    let snapshot = repo.snapshot().await?;
    let mut out = String::new();

    match content_type {
        "post" | "posts" => {
            writeln!(out, "Posts ({}):", snapshot.len())?;
            for post in snapshot.posts() {
                writeln!(
                    out,
                    "  {} - {} [{}]",
                    short_date(&post.meta.created),
                    post.meta.title,
                    post.meta.slug
                )?;
            }
        }
        "tag" | "tags" => {
            let tags = snapshot.tag_counts();
            writeln!(out, "Tags ({}):", tags.len())?;
            for tag in tags {
                writeln!(out, "  {} ({})", tag.name, tag.count)?;
            }
        }
        "error" | "errors" => {
            writeln!(out, "Errors ({}):", snapshot.errors().len())?;
            for error in snapshot.errors() {
                writeln!(out, "  {}", error)?;
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, tag, error",
                content_type
            );
        }
    }

    Ok(out)
}
