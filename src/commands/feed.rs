//! Write syndication feeds

use anyhow::Result;
use std::path::PathBuf;

use crate::feed::write_feeds;
use crate::Folio;

/// Write RSS, Atom and JSON feeds into the public directory
pub async fn run(folio: &Folio) -> Result<Vec<PathBuf>> {
    let snapshot = folio.repository().snapshot().await?;
    let written = write_feeds(&folio.config, snapshot.posts(), &folio.public_dir)?;
    tracing::info!(
        "Wrote {} feeds covering {} posts",
        written.len(),
        snapshot.len().min(folio.config.feed.limit)
    );
    Ok(written)
}
