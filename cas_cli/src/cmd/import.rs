use std::path::Path;

use anyhow::{Context, Result};
use cas_fs::{PathFlags, PathValue};
use cas_scan::scan_dir;

use crate::helpers;

use super::util::open_fs;
use super::Outcome;

/// Scans the real directory at `path` and installs it at `name` (default:
/// `path`'s basename) under the backup root, committing the result and
/// appending the new root digest to the log.
///
/// A no-op (exit 1 unless `--allow-noop`) if the scanned tree is bit-for-bit
/// identical to what `name` already names.
pub fn run_import(backup_dir: &Path, path: &Path, name: Option<String>) -> Result<Outcome> {
    let fs = open_fs(backup_dir)?;

    let name = match name {
        Some(n) => n,
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("import path has no basename; pass an explicit NAME")?,
    };
    let names = helpers::split_path(&name);

    let existing = fs
        .resolve_path(&names, &PathFlags::default())
        .ok()
        .and_then(|entries| entries.last().cloned());
    let dir_hint = existing
        .as_ref()
        .and_then(|e| e.reference.as_digest())
        .and_then(|d| fs.get_dir(d).ok().flatten());

    tracing::debug!(path = %path.display(), name, "scanning directory for import");
    let scanned = scan_dir(&fs, path, dir_hint.as_deref())
        .with_context(|| format!("failed to scan {}", path.display()))?;

    let unchanged = existing
        .as_ref()
        .is_some_and(|e| e.reference == scanned.reference);

    fs.set_path(&names, PathValue::Entry(scanned))?;
    let digest = fs.commit().context("failed to commit imported tree")?;
    helpers::append_log(backup_dir, digest, &name)?;

    if unchanged {
        tracing::info!(name, digest = %digest.fmt_short(), "import produced no changes");
        Ok(Outcome::NoOp)
    } else {
        tracing::info!(name, digest = %digest.fmt_short(), "import committed");
        Ok(Outcome::Success)
    }
}
