use std::path::Path;

use anyhow::{Context, Result};
use cas_fs::{EntryKind, PathFlags};

use crate::helpers;

use super::util::open_fs;
use super::Outcome;

/// Resolves `path` and prints the resolved directory's entries (name, type,
/// size) to stdout; a non-directory resolution prints that single entry.
pub fn run_ls(backup_dir: &Path, path: &str) -> Result<Outcome> {
    let fs = open_fs(backup_dir)?;
    let names = helpers::split_path(path);
    let resolved = fs.resolve_path(&names, &PathFlags::default())?;
    let last = resolved.last().context("path resolved to nothing")?;

    if last.kind == EntryKind::Dir {
        let dir = last
            .reference
            .as_digest()
            .map(|d| fs.get_dir(d))
            .transpose()?
            .flatten();
        if let Some(dir) = dir {
            for entry in dir.entries() {
                print_entry(entry);
            }
        }
    } else {
        print_entry(last);
    }
    Ok(Outcome::Success)
}

fn print_entry(entry: &cas_fs::DirEntry) {
    println!(
        "{}\t{}\t{}",
        String::from_utf8_lossy(&entry.name),
        entry.kind.as_str(),
        entry
            .metadata
            .size
            .map(|s| s.to_string())
            .unwrap_or_default(),
    );
}
