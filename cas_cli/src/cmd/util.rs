use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use cas_fs::{CasFs, DirEntry};
use cas_store_local::LocalCasStore;

use crate::helpers;

/// Opens the on-disk CAS rooted at `<backup-dir>/blobs` and reconstructs a
/// [`CasFs`] pointed at the most recently committed root recorded in the
/// backup dir's log, or an empty tree if nothing has been committed yet.
pub fn open_fs(backup_dir: &Path) -> Result<CasFs> {
    let cas = Arc::new(
        LocalCasStore::open(helpers::blobs_dir(backup_dir))
            .with_context(|| format!("failed to open CAS at {}", backup_dir.display()))?,
    );
    let log = helpers::read_log(backup_dir)?;
    match log.last() {
        Some(entry) => {
            let root = DirEntry::dir(Vec::new(), entry.digest);
            CasFs::open(cas, false, root).context("failed to open filesystem")
        }
        None => CasFs::new(cas, false).context("failed to initialize filesystem"),
    }
}
