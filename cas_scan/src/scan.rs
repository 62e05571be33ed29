use std::collections::BTreeMap;
use std::fs as stdfs;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::Path;

use cas_fs::{CasFs, DirEntry, Directory, EntryKind, EntryRef, Metadata, Registry};

use crate::device;
use crate::error::{Error, Result};

/// Walks the real directory tree at `path` depth-first and stores it into
/// `fs`'s CAS, returning a `DirEntry` (of kind `dir`) naming the freshly
/// written (or reused) directory blob.
///
/// `dir_hint` is a previously scanned `Directory` for this same path, used
/// for the incremental-import fast path: a regular-file child whose name,
/// size, and modification time match the hint's corresponding entry has
/// its digest reused verbatim, without re-reading or re-hashing the file.
pub fn scan_dir(fs: &CasFs, path: &Path, dir_hint: Option<&Directory>) -> Result<DirEntry> {
    let name = path
        .file_name()
        .map(|n| n.as_bytes().to_vec())
        .unwrap_or_default();

    let mut children: Vec<(Vec<u8>, std::path::PathBuf, stdfs::Metadata)> = Vec::new();
    for entry in stdfs::read_dir(path).map_err(|e| Error::Read(path.to_path_buf(), e))? {
        let entry = entry.map_err(|e| Error::Read(path.to_path_buf(), e))?;
        let child_path = entry.path();
        let meta = stdfs::symlink_metadata(&child_path)
            .map_err(|e| Error::Stat(child_path.clone(), e))?;
        children.push((entry.file_name().as_bytes().to_vec(), child_path, meta));
    }
    children.sort_by(|a, b| a.0.cmp(&b.0));

    let mut entries = Vec::with_capacity(children.len());
    for (child_name, child_path, meta) in children {
        let hint_child = dir_hint.and_then(|d| d.get(&child_name, false));
        entries.push(scan_entry(fs, &child_path, &meta, hint_child)?);
    }

    let digest = Directory::store(
        fs.cas(),
        &Registry::with_default_codecs(),
        "",
        &entries,
        &BTreeMap::new(),
        fs.hash_of_empty_dir(),
    )?;

    let mut root = DirEntry::dir(name, digest);
    let own_meta =
        stdfs::symlink_metadata(path).map_err(|e| Error::Stat(path.to_path_buf(), e))?;
    root.metadata = stat_metadata(&own_meta);
    Ok(root)
}

fn scan_entry(
    fs: &CasFs,
    path: &Path,
    meta: &stdfs::Metadata,
    hint: Option<&DirEntry>,
) -> Result<DirEntry> {
    let name = path
        .file_name()
        .map(|n| n.as_bytes().to_vec())
        .unwrap_or_default();
    let ft = meta.file_type();

    let mut entry = if ft.is_dir() {
        let hint_dir = match hint {
            Some(h) if h.kind == EntryKind::Dir => h
                .reference
                .as_digest()
                .map(|d| fs.get_dir(d))
                .transpose()?
                .flatten(),
            _ => None,
        };
        scan_dir(fs, path, hint_dir.as_deref())?
    } else if ft.is_symlink() {
        let target = stdfs::read_link(path).map_err(|e| Error::Read(path.to_path_buf(), e))?;
        DirEntry::symlink(name, target.as_os_str().as_bytes().to_vec())
    } else if ft.is_file() {
        // Incremental import fast path: trust the previous digest when
        // name, size, and mtime all still match the hint.
        let reused = hint.and_then(|h| {
            if h.kind != EntryKind::File {
                return None;
            }
            let size_matches = h.metadata.size == Some(meta.size());
            let mtime_matches = h.metadata.modify_ts == Some(meta.mtime());
            if size_matches && mtime_matches {
                h.reference.as_digest()
            } else {
                None
            }
        });
        let digest = match reused {
            Some(d) => d,
            None => fs.put_file(path)?,
        };
        DirEntry::file(name, digest)
    } else if ft.is_block_device() {
        DirEntry::new(
            name,
            EntryKind::BlockDev,
            EntryRef::Bytes(device::encode(meta.rdev()).into_bytes()),
        )
    } else if ft.is_char_device() {
        DirEntry::new(
            name,
            EntryKind::CharDev,
            EntryRef::Bytes(device::encode(meta.rdev()).into_bytes()),
        )
    } else if ft.is_fifo() {
        DirEntry::new(name, EntryKind::Pipe, EntryRef::None)
    } else if ft.is_socket() {
        DirEntry::new(name, EntryKind::Socket, EntryRef::None)
    } else {
        return Err(Error::UnsupportedFileType(path.to_path_buf()));
    };

    entry.metadata = stat_metadata(meta);
    Ok(entry)
}

fn stat_metadata(meta: &stdfs::Metadata) -> Metadata {
    Metadata {
        size: Some(meta.size()),
        create_ts: None,
        modify_ts: Some(meta.mtime()),
        uid: Some(meta.uid()),
        gid: Some(meta.gid()),
        user: None,
        group: None,
        mode: Some(meta.mode()),
        atime: Some(meta.atime()),
        ctime: Some(meta.ctime()),
        dev: Some(meta.dev()),
        inode: Some(meta.ino()),
        nlink: Some(meta.nlink()),
        blocksize: Some(meta.blksize()),
        blocks: Some(meta.blocks()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cas_base::Cas;
    use cas_store_memory::MemoryCasStore;
    use std::sync::Arc;

    #[test]
    fn scans_nested_files_and_symlinks() {
        let tmp = tempfile::tempdir().unwrap();
        stdfs::write(tmp.path().join("a.txt"), b"hello").unwrap();
        stdfs::create_dir(tmp.path().join("sub")).unwrap();
        stdfs::write(tmp.path().join("sub/b.txt"), b"world").unwrap();
        std::os::unix::fs::symlink("a.txt", tmp.path().join("link")).unwrap();

        let cas = Arc::new(MemoryCasStore::new());
        let fs = CasFs::new(cas, false).unwrap();
        let root = scan_dir(&fs, tmp.path(), None).unwrap();
        assert_eq!(root.kind, EntryKind::Dir);

        let digest = root.reference.as_digest().unwrap();
        let dir = fs.get_dir(digest).unwrap().unwrap();
        assert_eq!(dir.entries().len(), 3);
        let link = dir.get(b"link", false).unwrap();
        assert_eq!(link.kind, EntryKind::Symlink);
        assert_eq!(link.reference.as_bytes(), b"a.txt");
    }

    #[test]
    fn incremental_scan_reuses_unchanged_file_digest() {
        let tmp = tempfile::tempdir().unwrap();
        stdfs::write(tmp.path().join("a.txt"), b"hello").unwrap();

        let cas = Arc::new(MemoryCasStore::new());
        let fs = CasFs::new(cas.clone(), false).unwrap();
        let first = scan_dir(&fs, tmp.path(), None).unwrap();
        let first_dir = fs.get_dir(first.reference.as_digest().unwrap()).unwrap().unwrap();

        let second = scan_dir(&fs, tmp.path(), Some(&first_dir)).unwrap();
        assert_eq!(second.reference, first.reference);
    }
}
