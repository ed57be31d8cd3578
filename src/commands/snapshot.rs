//! Export the metadata cache as JSON

use anyhow::Result;
use std::path::PathBuf;

use crate::Folio;

/// Build the cache and write its JSON export to the configured path
pub async fn run(folio: &Folio) -> Result<PathBuf> {
    let snapshot = folio.repository().snapshot().await?;
    snapshot.export(&folio.snapshot_path)?;
    tracing::info!(
        "Exported {} posts to {:?}",
        snapshot.len(),
        folio.snapshot_path
    );
    Ok(folio.snapshot_path.clone())
}
