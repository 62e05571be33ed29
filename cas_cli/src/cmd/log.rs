use std::path::Path;

use anyhow::Result;

use crate::helpers;

use super::Outcome;

/// Prints the recorded root digests, newest first, one per line.
pub fn run_log(backup_dir: &Path) -> Result<Outcome> {
    let entries = helpers::read_log(backup_dir)?;
    for entry in entries.iter().rev() {
        println!("{}", entry.digest);
    }
    Ok(Outcome::Success)
}
