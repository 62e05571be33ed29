use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use cas_store_local::LocalCasStore;

use crate::helpers;

use super::Outcome;

/// Creates an empty backup root at `backup_dir`: a `LocalCasStore` directory
/// layout plus an empty commit log. A no-op if the root is already
/// initialized.
pub fn run_init(backup_dir: &Path) -> Result<Outcome> {
    if helpers::is_initialized(backup_dir) {
        tracing::info!(backup_dir = %backup_dir.display(), "backup root already initialized");
        return Ok(Outcome::NoOp);
    }

    LocalCasStore::open(helpers::blobs_dir(backup_dir))
        .with_context(|| format!("failed to create CAS at {}", backup_dir.display()))?;
    fs::write(helpers::log_path(backup_dir), b"")
        .with_context(|| format!("failed to create log file in {}", backup_dir.display()))?;

    tracing::info!(backup_dir = %backup_dir.display(), "initialized backup root");
    Ok(Outcome::Success)
}
