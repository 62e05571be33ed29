use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use cas_base::Digest;
use cas_fs::Name;

/// One line of the backup root's commit log: the wall-clock time of the
/// commit, the resulting root digest, and the name the import/export ran
/// under (empty for commits not tied to a single top-level name).
pub struct LogEntry {
    pub unix_secs: u64,
    pub digest: Digest,
    pub name: String,
}

pub fn blobs_dir(backup_dir: &Path) -> PathBuf {
    backup_dir.join("blobs")
}

pub fn log_path(backup_dir: &Path) -> PathBuf {
    backup_dir.join("log")
}

pub fn is_initialized(backup_dir: &Path) -> bool {
    log_path(backup_dir).is_file()
}

pub fn read_log(backup_dir: &Path) -> Result<Vec<LogEntry>> {
    let path = log_path(backup_dir);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read log file {}", path.display()))?;
    let mut entries = Vec::new();
    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let mut parts = line.splitn(3, '\t');
        let unix_secs: u64 = parts
            .next()
            .context("malformed log line: missing timestamp")?
            .parse()
            .context("malformed log line: timestamp is not a number")?;
        let digest: Digest = parts
            .next()
            .context("malformed log line: missing digest")?
            .parse()
            .context("malformed log line: invalid digest")?;
        let name = parts.next().unwrap_or("").to_string();
        entries.push(LogEntry {
            unix_secs,
            digest,
            name,
        });
    }
    Ok(entries)
}

pub fn append_log(backup_dir: &Path, digest: Digest, name: &str) -> Result<()> {
    let path = log_path(backup_dir);
    let unix_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    writeln!(file, "{unix_secs}\t{digest}\t{name}")
        .with_context(|| format!("failed to append to log file {}", path.display()))?;
    Ok(())
}

/// Splits a CLI-supplied `a/b/c`-style path string into the name-component
/// sequence `resolve_path` expects, with the leading volume component
/// (conventionally empty) prepended.
pub fn split_path(path: &str) -> Vec<Name> {
    let mut names = vec![Vec::new()];
    names.extend(
        path.split('/')
            .filter(|s| !s.is_empty())
            .map(|s| s.as_bytes().to_vec()),
    );
    names
}
