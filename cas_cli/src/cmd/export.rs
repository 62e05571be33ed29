use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use cas_base::Digest;
use cas_fs::{CasFs, DirEntry};
use cas_scan::extract_dir;
use cas_store_local::LocalCasStore;

use crate::helpers;

use super::util::open_fs;
use super::Outcome;

/// Resolves `name` against the most recently committed root (or the root
/// named by `snapshot`, if given) and extracts it to `dest`.
pub fn run_export(
    backup_dir: &Path,
    name: &str,
    dest: &Path,
    snapshot: Option<String>,
) -> Result<Outcome> {
    let fs = match snapshot {
        Some(digest_str) => {
            let digest: Digest = digest_str
                .parse()
                .with_context(|| format!("invalid snapshot digest {digest_str:?}"))?;
            let cas = Arc::new(
                LocalCasStore::open(helpers::blobs_dir(backup_dir))
                    .with_context(|| format!("failed to open CAS at {}", backup_dir.display()))?,
            );
            CasFs::open(cas, false, DirEntry::dir(Vec::new(), digest))
                .context("failed to open filesystem at requested snapshot")?
        }
        None => open_fs(backup_dir)?,
    };

    let names = helpers::split_path(name);
    extract_dir(&fs, &names, dest)
        .with_context(|| format!("failed to export {name:?} to {}", dest.display()))?;

    tracing::info!(name, dest = %dest.display(), "exported snapshot");
    Ok(Outcome::Success)
}
