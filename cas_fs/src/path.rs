use cas_base::CasFile;

use crate::entry::{DirEntry, EntryKind, Name};
use crate::error::{Error, Result};
use crate::kernel::CasFs;
use crate::resolver::PathFlags;

/// A curried, immutable pair of a filesystem and an unresolved name
/// sequence.
///
/// `PathRef` carries no state of its own beyond the borrow and the names;
/// every operation re-resolves against whatever the filesystem's current
/// committed root and overlay happen to be at call time. It exists purely
/// so callers that pass a path around don't have to keep re-threading the
/// filesystem reference and the name list as separate arguments.
#[derive(Clone, Copy)]
pub struct PathRef<'fs> {
    fs: &'fs CasFs,
    names: &'fs [Name],
}

impl<'fs> PathRef<'fs> {
    pub fn new(fs: &'fs CasFs, names: &'fs [Name]) -> Self {
        Self { fs, names }
    }

    /// Resolves this path with the default flags, returning the full
    /// chain of entries from the root.
    pub fn resolve(&self) -> Result<Vec<DirEntry>> {
        self.fs.resolve_path(self.names, &PathFlags::default())
    }

    /// Resolves with caller-supplied flags (e.g. `partial`, `mkdir`).
    pub fn resolve_with(&self, flags: &PathFlags) -> Result<Vec<DirEntry>> {
        self.fs.resolve_path(self.names, flags)
    }

    /// Returns the resolved final entry's type, without allocating the
    /// whole entry chain twice for callers that only want to branch on it.
    pub fn kind(&self) -> Result<EntryKind> {
        Ok(self.last_entry()?.kind)
    }

    /// Opens the underlying CAS file handle for this path's final entry.
    /// Fails with [`Error::NotADirectory`]-shaped context if the entry
    /// isn't a plain file — there is nothing to open for a directory,
    /// symlink, or device node.
    pub fn open(&self) -> Result<Box<dyn CasFile>> {
        let entry = self.last_entry()?;
        if entry.kind != EntryKind::File {
            return Err(Error::NoSuchEntry(entry.name.clone()));
        }
        let digest = entry
            .reference
            .as_digest()
            .ok_or_else(|| Error::NoSuchEntry(entry.name.clone()))?;
        self.fs
            .get(&digest)?
            .ok_or(Error::MissingBlob(digest))
    }

    fn last_entry(&self) -> Result<DirEntry> {
        let resolved = self.resolve()?;
        resolved
            .last()
            .cloned()
            .ok_or_else(|| Error::NoSuchEntry(Vec::new()))
    }
}

/// An owned variant of [`PathRef`] for callers that need to build up a
/// path incrementally (e.g. appending a component at a time) rather than
/// borrowing a caller-owned slice.
#[derive(Clone)]
pub struct OwnedPath<'fs> {
    fs: &'fs CasFs,
    names: Vec<Name>,
}

impl<'fs> OwnedPath<'fs> {
    pub fn new(fs: &'fs CasFs, names: Vec<Name>) -> Self {
        Self { fs, names }
    }

    pub fn as_ref(&self) -> PathRef<'_> {
        PathRef::new(self.fs, &self.names)
    }

    /// Returns a new `OwnedPath` with `more` appended, leaving `self`
    /// untouched.
    pub fn subpath(&self, more: impl IntoIterator<Item = Name>) -> OwnedPath<'fs> {
        let mut names = self.names.clone();
        names.extend(more);
        OwnedPath::new(self.fs, names)
    }

    pub fn resolve(&self) -> Result<Vec<DirEntry>> {
        self.as_ref().resolve()
    }

    pub fn kind(&self) -> Result<EntryKind> {
        self.as_ref().kind()
    }

    pub fn open(&self) -> Result<Box<dyn CasFile>> {
        self.as_ref().open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryRef;
    use cas_base::Cas;
    use cas_store_memory::MemoryCasStore;
    use std::sync::Arc;

    #[test]
    fn resolve_reports_final_entry_kind() {
        let cas = Arc::new(MemoryCasStore::new());
        let fs = CasFs::new(cas.clone(), false).unwrap();
        let digest = cas.put_scalar(b"hello").unwrap();
        fs.set_path(
            &[Vec::new(), b"a".to_vec()],
            crate::kernel::PathValue::Entry(DirEntry::new(
                b"a".to_vec(),
                EntryKind::File,
                EntryRef::Digest(digest),
            )),
        )
        .unwrap();
        fs.commit().unwrap();

        let names = vec![Vec::new(), b"a".to_vec()];
        let path = PathRef::new(&fs, &names);
        assert_eq!(path.kind().unwrap(), EntryKind::File);
    }

    #[test]
    fn open_streams_file_contents() {
        let cas = Arc::new(MemoryCasStore::new());
        let fs = CasFs::new(cas.clone(), false).unwrap();
        let digest = cas.put_scalar(b"hello").unwrap();
        fs.set_path(
            &[Vec::new(), b"a".to_vec()],
            crate::kernel::PathValue::Entry(DirEntry::new(
                b"a".to_vec(),
                EntryKind::File,
                EntryRef::Digest(digest),
            )),
        )
        .unwrap();
        fs.commit().unwrap();

        let owned = OwnedPath::new(&fs, vec![Vec::new(), b"a".to_vec()]);
        let mut file = owned.open().unwrap();
        let mut buf = Vec::new();
        std::io::Read::read_to_end(&mut file, &mut buf).unwrap();
        assert_eq!(buf, b"hello");
    }

    #[test]
    fn subpath_extends_without_mutating_original() {
        let cas = Arc::new(MemoryCasStore::new());
        let fs = CasFs::new(cas, false).unwrap();
        let base = OwnedPath::new(&fs, vec![Vec::new()]);
        let extended = base.subpath(vec![b"child".to_vec()]);
        assert_eq!(base.names.len(), 1);
        assert_eq!(extended.names.len(), 2);
    }
}
