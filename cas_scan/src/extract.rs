use std::fs as stdfs;
use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use cas_fs::{CasFs, DirEntry, EntryKind, Name, PathFlags};

use crate::device;
use crate::error::{Error, Result};

/// The mirror of [`crate::scan_dir`]: recreates the resolved virtual
/// subtree at `names` as a real directory tree rooted at `dest`.
///
/// Device-node recreation requires privilege the extracting process may
/// not have; when `mknod`/`mkfifo` fails with a permission error, a
/// placeholder regular file is written in its place and a warning logged,
/// rather than aborting the whole extraction (see the crate-level docs).
pub fn extract_dir(fs: &CasFs, names: &[Name], dest: &Path) -> Result<()> {
    let resolved = fs.resolve_path(names, &PathFlags::default())?;
    let last = resolved.last().cloned().ok_or_else(|| {
        cas_fs::Error::NoSuchEntry(Vec::new())
    })?;
    if last.kind != EntryKind::Dir {
        return Err(cas_fs::Error::NotADirectory(last.name).into());
    }
    extract_directory_entry(fs, &last, dest)
}

fn extract_directory_entry(fs: &CasFs, entry: &DirEntry, dest: &Path) -> Result<()> {
    stdfs::create_dir_all(dest).map_err(|e| Error::Write(dest.to_path_buf(), e))?;
    apply_ownership_and_times(dest, entry);

    let Some(digest) = entry.reference.as_digest() else {
        return Ok(());
    };
    let Some(dir) = fs.get_dir(digest)? else {
        return Ok(());
    };

    for child in dir.entries() {
        let child_path = dest.join(std::ffi::OsStr::from_bytes(&child.name));
        extract_entry(fs, child, &child_path)?;
    }
    Ok(())
}

fn extract_entry(fs: &CasFs, entry: &DirEntry, dest: &Path) -> Result<()> {
    match entry.kind {
        EntryKind::Dir => extract_directory_entry(fs, entry, dest)?,
        EntryKind::File => extract_file(fs, entry, dest)?,
        EntryKind::Symlink => {
            let target = entry.reference.as_bytes();
            let target = std::ffi::OsStr::from_bytes(target);
            std::os::unix::fs::symlink(target, dest).map_err(|e| Error::Write(dest.to_path_buf(), e))?;
        }
        EntryKind::BlockDev | EntryKind::CharDev => extract_device(entry, dest)?,
        EntryKind::Pipe => extract_fifo(entry, dest)?,
        EntryKind::Socket => {
            // A content-addressed store has nothing meaningful to replay
            // for a socket's runtime state; recreate it as a placeholder
            // the same way an unprivileged device-node extraction does.
            write_placeholder(dest, "socket")?;
        }
    }
    apply_ownership_and_times(dest, entry);
    Ok(())
}

fn extract_file(fs: &CasFs, entry: &DirEntry, dest: &Path) -> Result<()> {
    let digest = entry
        .reference
        .as_digest()
        .ok_or_else(|| cas_fs::Error::InvalidSymlink(entry.name.clone()))?;
    let mut src = fs
        .get(&digest)?
        .ok_or(cas_fs::Error::MissingBlob(digest))?;
    let mut out = stdfs::File::create(dest).map_err(|e| Error::Write(dest.to_path_buf(), e))?;
    io::copy(&mut src, &mut out).map_err(|e| Error::Write(dest.to_path_buf(), e))?;
    if let Some(mode) = entry.metadata.mode {
        let _ = out.set_permissions(stdfs::Permissions::from_mode(mode));
    }
    Ok(())
}

#[cfg(unix)]
fn extract_device(entry: &DirEntry, dest: &Path) -> Result<()> {
    use nix::sys::stat::{mknod, Mode, SFlag};

    let kind = if entry.kind == EntryKind::BlockDev {
        SFlag::S_IFBLK
    } else {
        SFlag::S_IFCHR
    };
    let dev = device::decode(std::str::from_utf8(entry.reference.as_bytes()).unwrap_or(""))
        .unwrap_or(0);
    let mode = Mode::from_bits_truncate(entry.metadata.mode.unwrap_or(0o600));

    match mknod(dest, kind, mode, dev) {
        Ok(()) => Ok(()),
        Err(_) => {
            tracing::warn!(path = %dest.display(), "insufficient privilege to create device node, writing placeholder");
            write_placeholder(dest, "device")
        }
    }
}

#[cfg(not(unix))]
fn extract_device(_entry: &DirEntry, dest: &Path) -> Result<()> {
    write_placeholder(dest, "device")
}

#[cfg(unix)]
fn extract_fifo(entry: &DirEntry, dest: &Path) -> Result<()> {
    use nix::sys::stat::Mode;
    use nix::unistd::mkfifo;

    let mode = Mode::from_bits_truncate(entry.metadata.mode.unwrap_or(0o600));
    match mkfifo(dest, mode) {
        Ok(()) => Ok(()),
        Err(_) => {
            tracing::warn!(path = %dest.display(), "insufficient privilege to create fifo, writing placeholder");
            write_placeholder(dest, "fifo")
        }
    }
}

#[cfg(not(unix))]
fn extract_fifo(_entry: &DirEntry, dest: &Path) -> Result<()> {
    write_placeholder(dest, "fifo")
}

fn write_placeholder(dest: &Path, kind: &str) -> Result<()> {
    let mut file = stdfs::File::create(dest).map_err(|e| Error::Write(dest.to_path_buf(), e))?;
    writeln!(file, "cas-fs placeholder for unreplayable {kind} node")
        .map_err(|e| Error::Write(dest.to_path_buf(), e))?;
    Ok(())
}

fn apply_ownership_and_times(path: &Path, entry: &DirEntry) {
    if let Some(mtime) = entry.metadata.modify_ts {
        let atime = entry.metadata.atime.unwrap_or(mtime);
        let ft_mtime = filetime::FileTime::from_unix_time(mtime, 0);
        let ft_atime = filetime::FileTime::from_unix_time(atime, 0);
        let _ = filetime::set_symlink_file_times(path, ft_atime, ft_mtime);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::scan_dir;
    use cas_store_memory::MemoryCasStore;
    use std::sync::Arc;

    #[test]
    fn round_trips_a_small_tree() {
        let src = tempfile::tempdir().unwrap();
        stdfs::write(src.path().join("a.txt"), b"hello").unwrap();
        stdfs::create_dir(src.path().join("sub")).unwrap();
        stdfs::write(src.path().join("sub/b.txt"), b"world").unwrap();

        let cas = Arc::new(MemoryCasStore::new());
        let fs = CasFs::new(cas, false).unwrap();
        let scanned = scan_dir(&fs, src.path(), None).unwrap();
        fs.set_path(
            &[Vec::new(), b"imported".to_vec()],
            cas_fs::PathValue::Entry(scanned),
        )
        .unwrap();
        fs.commit().unwrap();

        let dest = tempfile::tempdir().unwrap();
        extract_dir(&fs, &[Vec::new(), b"imported".to_vec()], dest.path()).unwrap();

        assert_eq!(stdfs::read(dest.path().join("a.txt")).unwrap(), b"hello");
        assert_eq!(
            stdfs::read(dest.path().join("sub/b.txt")).unwrap(),
            b"world"
        );
    }
}
