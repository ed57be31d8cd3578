//! Clean generated output

use anyhow::Result;
use std::fs;

use crate::Folio;

/// Remove the feed output directory and the snapshot export
pub fn run(folio: &Folio) -> Result<()> {
    if folio.public_dir.exists() {
        fs::remove_dir_all(&folio.public_dir)?;
        tracing::info!("Deleted: {:?}", folio.public_dir);
    }

    if folio.snapshot_path.is_file() {
        fs::remove_file(&folio.snapshot_path)?;
        tracing::info!("Deleted: {:?}", folio.snapshot_path);
    }

    // The export may share a directory with posts; only an emptied one goes
    if let Some(export_dir) = folio
        .snapshot_path
        .parent()
        .filter(|dir| *dir != folio.base_dir && dir.is_dir())
    {
        if fs::read_dir(export_dir)?.next().is_none() {
            fs::remove_dir(export_dir)?;
            tracing::info!("Deleted: {:?}", export_dir);
        }
    }

    Ok(())
}
