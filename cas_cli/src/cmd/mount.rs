use std::path::Path;

use anyhow::{bail, Result};

use super::Outcome;

/// Documented stub: mounting a backup root as a live filesystem requires an
/// external FUSE integration this crate does not ship.
pub fn run_mount(_backup_dir: &Path, _dest: &Path) -> Result<Outcome> {
    bail!("mount requires an external FUSE integration not shipped by this crate")
}
