use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use cas_base::{Cas, CasFile, Digest};

use crate::cache::DirectoryCache;
use crate::codec::{self, Registry};
use crate::directory::Directory;
use crate::entry::{DirEntry, EntryKind, EntryRef};
use crate::error::{Error, Result};
use crate::overlay::{OverlayChild, OverlayNode};
use crate::resolver::{MkdirMode, PathFlags};

/// What to install at a path via [`CasFs::set_path`].
pub enum PathValue {
    Entry(DirEntry),
    Deleted,
}

/// The directory-tree kernel: owns the CAS handle, the directory cache,
/// the current committed root, and the pending overlay.
///
/// Per the crate's single-threaded cooperative concurrency model (see the
/// crate-level docs), mutable state is held in `RefCell`s rather than
/// `Mutex`/`RwLock`: those would imply a multi-threaded synchronization
/// story this kernel deliberately does not provide. An embedder that wants
/// to share one `CasFs` across threads must serialize access itself.
pub struct CasFs {
    cas: Arc<dyn Cas>,
    case_insensitive: bool,
    hash_of_empty_dir: Digest,
    registry: Registry,
    cache: RefCell<DirectoryCache>,
    root_entry: RefCell<DirEntry>,
    overlay: RefCell<Option<OverlayNode>>,
}

impl CasFs {
    /// Builds an empty tree. The digest of an empty directory is the
    /// digest of its serialization under the default codec, not the
    /// digest of zero bytes — that blob is computed and stored here so
    /// reads of `hash_of_empty_dir` never need to round-trip through the
    /// CAS to find it.
    pub fn new(cas: Arc<dyn Cas>, case_insensitive: bool) -> Result<Self> {
        let registry = Registry::with_default_codecs();
        let empty_blob = codec::encode_blob(registry.default_codec().as_ref(), &[], &BTreeMap::new())?;
        let hash_of_empty_dir = cas.put_scalar(&empty_blob)?;
        let root_entry = DirEntry::dir(Vec::new(), hash_of_empty_dir);
        Ok(Self {
            cas,
            case_insensitive,
            hash_of_empty_dir,
            registry,
            cache: RefCell::new(DirectoryCache::default()),
            root_entry: RefCell::new(root_entry),
            overlay: RefCell::new(None),
        })
    }

    /// Opens an existing tree whose most recently committed root is
    /// `root`, rather than starting from an empty directory.
    pub fn open(cas: Arc<dyn Cas>, case_insensitive: bool, root: DirEntry) -> Result<Self> {
        let fs = Self::new(cas, case_insensitive)?;
        *fs.root_entry.borrow_mut() = root;
        Ok(fs)
    }

    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn hash_of_empty_dir(&self) -> Digest {
        self.hash_of_empty_dir
    }

    pub fn root_entry(&self) -> DirEntry {
        self.root_entry.borrow().clone()
    }

    pub fn cas(&self) -> &dyn Cas {
        self.cas.as_ref()
    }

    // -- CAS passthroughs -------------------------------------------------

    pub fn get(&self, digest: &Digest) -> Result<Option<Box<dyn CasFile>>> {
        Ok(self.cas.get(digest)?)
    }

    pub fn put_scalar(&self, bytes: &[u8]) -> Result<Digest> {
        Ok(self.cas.put_scalar(bytes)?)
    }

    pub fn put_file(&self, path: &Path) -> Result<Digest> {
        Ok(self.cas.put_file(path)?)
    }

    pub fn put_handle(&self, reader: &mut dyn Read) -> Result<Digest> {
        Ok(self.cas.put_handle(reader)?)
    }

    /// Cache-aware directory decode: returns the cached `Directory` if
    /// present, else decodes it, caches it, and returns it. `Ok(None)`
    /// means the CAS has no blob at `digest`; a blob that fails to decode
    /// is `Err(Error::BadDirectoryBlob)`.
    pub fn get_dir(&self, digest: Digest) -> Result<Option<Arc<Directory>>> {
        if let Some(cached) = self.cache.borrow_mut().get(&digest) {
            tracing::trace!(digest = %digest.fmt_short(), "directory cache hit");
            return Ok(Some(cached));
        }
        tracing::trace!(digest = %digest.fmt_short(), "directory cache miss");
        let Some(dir) = Directory::load(self.cas.as_ref(), digest, &self.registry)? else {
            return Ok(None);
        };
        let dir = self.cache.borrow_mut().put(Arc::new(dir));
        Ok(Some(dir))
    }

    // -- overlay lookups ----------------------------------------------------

    fn overlay_lookup_child(&self, ancestors: &[Vec<u8>], name: &[u8]) -> OverlayLookup {
        let overlay = self.overlay.borrow();
        let Some(root) = overlay.as_ref() else {
            return OverlayLookup::Absent;
        };
        let mut node = root;
        for anc in ancestors {
            match node.child(anc, self.case_insensitive) {
                Some(OverlayChild::Node(n)) => node = n,
                _ => return OverlayLookup::Absent,
            }
        }
        match node.child(name, self.case_insensitive) {
            None => OverlayLookup::Absent,
            Some(OverlayChild::Deleted) => OverlayLookup::Deleted,
            Some(OverlayChild::Node(n)) => OverlayLookup::Present(n.entry.clone()),
        }
    }

    fn decode_committed_child(
        &self,
        committed_dir: Option<&Arc<Directory>>,
        name: &[u8],
    ) -> Result<Option<DirEntry>> {
        let Some(dir) = committed_dir else {
            return Ok(None);
        };
        Ok(dir.get(name, self.case_insensitive).cloned())
    }

    // -- path resolution ------------------------------------------------

    /// Resolves `names` against the committed tree overlaid with pending
    /// edits, returning the path's entries in order (`result[0]` is the
    /// root). See the crate-level docs for the full algorithm.
    pub fn resolve_path(&self, names: &[Vec<u8>], flags: &PathFlags) -> Result<Vec<DirEntry>> {
        self.resolve_internal(names, flags)
    }

    fn resolve_internal(&self, names: &[Vec<u8>], flags: &PathFlags) -> Result<Vec<DirEntry>> {
        let root_entry = self.root_entry.borrow().clone();
        let mut canonical: Vec<Vec<u8>> = vec![root_entry.name.clone()];
        let mut entries: Vec<DirEntry> = vec![root_entry];
        let mut committed_dirs: Vec<Option<Arc<Directory>>> = vec![self.decode_if_dir(&entries[0])?];

        let mut remaining: VecDeque<Vec<u8>> = names.iter().skip(1).cloned().collect();

        let result = self.resolve_loop(
            &mut canonical,
            &mut entries,
            &mut committed_dirs,
            &mut remaining,
            flags,
        );

        match result {
            Ok(()) => Ok(entries),
            Err(e) if flags.effective_no_die() => {
                tracing::trace!(error = %e, "resolve_path: suppressing error via no_die");
                Ok(entries)
            }
            Err(e) => Err(e),
        }
    }

    fn decode_if_dir(&self, entry: &DirEntry) -> Result<Option<Arc<Directory>>> {
        if entry.kind != EntryKind::Dir {
            return Ok(None);
        }
        match &entry.reference {
            // The empty-directory shortcut never needs a round trip
            // through the CAS: its digest is a known constant, not
            // necessarily a blob anyone ever stored.
            EntryRef::Digest(d) if *d == self.hash_of_empty_dir => {
                Ok(Some(Arc::new(Directory::empty(*d))))
            }
            EntryRef::Digest(d) => self.get_dir(*d),
            EntryRef::Bytes(_) | EntryRef::None => Ok(None),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn resolve_loop(
        &self,
        canonical: &mut Vec<Vec<u8>>,
        entries: &mut Vec<DirEntry>,
        committed_dirs: &mut Vec<Option<Arc<Directory>>>,
        remaining: &mut VecDeque<Vec<u8>>,
        flags: &PathFlags,
    ) -> Result<()> {
        loop {
            let current = entries.last().unwrap().clone();

            if flags.follow_symlinks && current.kind == EntryKind::Symlink {
                let target = current.reference.as_bytes().to_vec();
                if target.is_empty() {
                    return Err(Error::InvalidSymlink(current.name.clone()));
                }
                let is_absolute = target.first() == Some(&b'/');
                let parts: Vec<Vec<u8>> =
                    target.split(|&b| b == b'/').map(|s| s.to_vec()).collect();

                if is_absolute {
                    canonical.truncate(1);
                    entries.truncate(1);
                    committed_dirs.truncate(1);
                } else {
                    canonical.pop();
                    entries.pop();
                    committed_dirs.pop();
                }
                for p in parts.into_iter().rev() {
                    remaining.push_front(p);
                }
                continue;
            }

            let Some(name) = remaining.pop_front() else {
                return Ok(());
            };

            if name.is_empty() || name == b"." {
                continue;
            }

            if name == b".." {
                if canonical.len() <= 1 {
                    return Err(Error::EscapesRoot);
                }
                canonical.pop();
                entries.pop();
                committed_dirs.pop();
                continue;
            }

            let current = entries.last().unwrap().clone();
            if current.kind != EntryKind::Dir {
                if flags.effective_mkdir() == MkdirMode::FabricateAndOverwrite {
                    let fabricated = self.fabricated_dir_entry(&current.name, flags);
                    self.promote_and_replace(canonical, &fabricated)?;
                    *entries.last_mut().unwrap() = fabricated;
                    *committed_dirs.last_mut().unwrap() = None;
                } else {
                    return Err(Error::NotADirectory(current.name.clone()));
                }
            }

            let ancestors = &canonical[1..];
            let found = match self.overlay_lookup_child(ancestors, &name) {
                OverlayLookup::Present(entry) => Some(entry),
                OverlayLookup::Deleted => None,
                OverlayLookup::Absent => {
                    self.decode_committed_child(committed_dirs.last().unwrap().as_ref(), &name)?
                }
            };

            match found {
                Some(entry) => {
                    let next_committed = self.decode_if_dir(&entry)?;
                    canonical.push(name.clone());
                    entries.push(entry);
                    committed_dirs.push(next_committed);
                }
                None => {
                    let mkdir_mode = flags.effective_mkdir();
                    let will_fabricate = mkdir_mode != MkdirMode::Off || flags.effective_partial();
                    if !will_fabricate {
                        let parent = entries.last().unwrap();
                        if parent.kind == EntryKind::Dir
                            && matches!(parent.reference, EntryRef::None)
                        {
                            return Err(Error::DirectoryNotInStorage(name));
                        }
                        return Err(Error::NoSuchEntry(name));
                    }
                    let is_last = remaining.is_empty();
                    // Trailing component fabricated under `partial` alone
                    // (not `mkdir`) is a leaf placeholder and never
                    // persisted; every other fabrication is a directory
                    // (it has to be, to keep descending) and is persisted
                    // whenever `mkdir` requested it.
                    let fabricated = if is_last && mkdir_mode == MkdirMode::Off {
                        self.fabricated_leaf_entry(&name, flags)
                    } else {
                        self.fabricated_dir_entry(&name, flags)
                    };

                    if mkdir_mode != MkdirMode::Off {
                        let mut path_so_far = canonical.clone();
                        path_so_far.push(name.clone());
                        self.promote_with_entry(&path_so_far, &fabricated)?;
                    }

                    canonical.push(name);
                    entries.push(fabricated);
                    committed_dirs.push(None);
                }
            }
        }
    }

    fn fabricated_dir_entry(&self, name: &[u8], flags: &PathFlags) -> DirEntry {
        let mut entry = DirEntry::dir(name.to_vec(), self.hash_of_empty_dir);
        entry.metadata = flags.mkdir_defaults.clone();
        entry
    }

    fn fabricated_leaf_entry(&self, name: &[u8], flags: &PathFlags) -> DirEntry {
        let mut entry = DirEntry::new(name.to_vec(), EntryKind::File, EntryRef::None);
        entry.metadata = flags.mkdir_defaults.clone();
        entry
    }

    /// Materializes an overlay node at `path` (names from the root,
    /// inclusive of the root's own placeholder at index 0) with `entry`
    /// installed as its effective entry, promoting any still-committed-only
    /// ancestors into the overlay along the way.
    fn promote_with_entry(&self, path: &[Vec<u8>], entry: &DirEntry) -> Result<()> {
        let mut overlay = self.overlay.borrow_mut();
        let root_entry = self.root_entry.borrow().clone();
        let root = overlay.get_or_insert_with(|| OverlayNode::new(root_entry));
        if path.len() <= 1 {
            root.entry = entry.clone();
            return Ok(());
        }
        let mut node = root;
        for name in &path[1..path.len() - 1] {
            let committed_entry_name = name.clone();
            let case_insensitive = self.case_insensitive;
            let fallback = DirEntry::dir(committed_entry_name, self.hash_of_empty_dir);
            node = node.ensure_child(name, case_insensitive, || fallback);
        }
        let last_name = path.last().unwrap().clone();
        node.set_child(last_name, OverlayChild::Node(OverlayNode::new(entry.clone())));
        Ok(())
    }

    fn promote_and_replace(&self, path: &[Vec<u8>], entry: &DirEntry) -> Result<()> {
        self.promote_with_entry(path, entry)
    }

    // -- edits ------------------------------------------------------------

    /// Installs `value` at `names`, creating intermediate directories in
    /// the overlay as needed (equivalent to resolving the parent with
    /// `MkdirMode::FabricateMissing`).
    pub fn set_path(&self, names: &[Vec<u8>], value: PathValue) -> Result<()> {
        if names.len() < 2 {
            return Err(Error::NoSuchEntry(Vec::new()));
        }
        let parent_names = &names[..names.len() - 1];
        let flags = PathFlags::mkdir(MkdirMode::FabricateMissing);
        // Resolving first both validates the parent path and, under
        // `mkdir`, fabricates any missing directories into the overlay.
        // The entries it returns are what we graft into the overlay below
        // for any ancestor that resolved purely from the committed tree.
        let resolved_parents = self.resolve_path(parent_names, &flags)?;
        let final_name = names.last().unwrap().clone();

        let mut overlay = self.overlay.borrow_mut();
        let root = overlay.get_or_insert_with(|| OverlayNode::new(resolved_parents[0].clone()));
        let mut node = root;
        for (name, entry) in parent_names.iter().skip(1).zip(resolved_parents.iter().skip(1)) {
            let case_insensitive = self.case_insensitive;
            let entry = entry.clone();
            node = node.ensure_child(name, case_insensitive, move || entry);
        }

        match value {
            PathValue::Entry(entry) => {
                node.set_child(final_name, OverlayChild::Node(OverlayNode::new(entry)));
            }
            PathValue::Deleted => {
                node.set_child(final_name, OverlayChild::Deleted);
            }
        }
        Ok(())
    }

    /// Clones the effective entry at `names` with `changes` applied and
    /// installs it via [`Self::set_path`]. `flags` governs the lookup of
    /// the current entry (e.g. whether to follow a trailing symlink
    /// before applying `changes`).
    pub fn update_path(
        &self,
        names: &[Vec<u8>],
        flags: &PathFlags,
        changes: impl FnOnce(&mut DirEntry),
    ) -> Result<()> {
        let resolved = self.resolve_path(names, flags)?;
        let current = resolved.last().cloned().ok_or_else(|| Error::NoSuchEntry(Vec::new()))?;
        let updated = current.clone_with(changes);
        self.set_path(names, PathValue::Entry(updated))
    }

    pub fn mkdir(&self, names: &[Vec<u8>]) -> Result<()> {
        let flags = PathFlags::mkdir(MkdirMode::FabricateMissing);
        self.resolve_path(names, &flags)?;
        Ok(())
    }

    pub fn touch(&self, names: &[Vec<u8>]) -> Result<()> {
        let name = names.last().cloned().unwrap_or_default();
        let entry = DirEntry::new(name, EntryKind::File, EntryRef::Digest(self.hash_of_empty_dir));
        self.set_path(names, PathValue::Entry(entry))
    }

    pub fn unlink(&self, names: &[Vec<u8>]) -> Result<()> {
        self.set_path(names, PathValue::Deleted)
    }

    pub fn rollback(&self) {
        *self.overlay.borrow_mut() = None;
    }

    /// Folds the overlay into new directory blobs via a post-order
    /// traversal, updates `root_entry`, and clears the overlay. Leaves the
    /// overlay untouched if any step fails.
    pub fn commit(&self) -> Result<Digest> {
        let overlay_taken = self.overlay.borrow_mut().take();
        let Some(root_node) = overlay_taken else {
            return Ok(self.root_entry.borrow().digest_or_empty(self.hash_of_empty_dir));
        };

        tracing::debug!("commit: folding overlay");
        match self.fold_node(&root_node) {
            Ok(new_root_entry) => {
                *self.root_entry.borrow_mut() = new_root_entry.clone();
                tracing::debug!(digest = %new_root_entry.reference.as_digest().map(|d| d.fmt_short()).unwrap_or_default(), "commit: done");
                Ok(new_root_entry
                    .reference
                    .as_digest()
                    .unwrap_or(self.hash_of_empty_dir))
            }
            Err(e) => {
                *self.overlay.borrow_mut() = Some(root_node);
                Err(e)
            }
        }
    }

    fn fold_node(&self, node: &OverlayNode) -> Result<DirEntry> {
        if node.is_empty_subtree() {
            return Ok(node.entry.clone());
        }

        let committed: Vec<DirEntry> = match &node.entry.reference {
            EntryRef::Digest(d) => match self.get_dir(*d)? {
                Some(dir) => dir.entries().to_vec(),
                None => Vec::new(),
            },
            _ => Vec::new(),
        };

        let mut new_entries: Vec<DirEntry> = Vec::new();
        for entry in &committed {
            if node.child(&entry.name, self.case_insensitive).is_some() {
                continue;
            }
            new_entries.push(entry.clone());
        }

        for (name, child) in &node.subtree {
            match child {
                OverlayChild::Deleted => continue,
                OverlayChild::Node(child_node) => {
                    if child_node.entry.kind == EntryKind::Dir && !child_node.is_empty_subtree() {
                        let folded = self.fold_node(child_node)?;
                        new_entries.push(folded.clone_with(|e| e.name = name.clone()));
                    } else {
                        new_entries.push(child_node.entry.clone_with(|e| e.name = name.clone()));
                    }
                }
            }
        }

        let format_tag = "";
        let metadata = BTreeMap::new();
        let digest = Directory::store(
            self.cas.as_ref(),
            &self.registry,
            format_tag,
            &new_entries,
            &metadata,
            self.hash_of_empty_dir,
        )?;

        Ok(node.entry.clone_with(|e| e.reference = EntryRef::Digest(digest)))
    }
}

#[derive(PartialEq)]
enum OverlayLookup {
    Absent,
    Deleted,
    Present(DirEntry),
}

trait RootEntryDigestExt {
    fn digest_or_empty(&self, empty: Digest) -> Digest;
}

impl RootEntryDigestExt for DirEntry {
    fn digest_or_empty(&self, empty: Digest) -> Digest {
        self.reference.as_digest().unwrap_or(empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cas_store_memory::MemoryCasStore;

    fn fs() -> CasFs {
        CasFs::new(Arc::new(MemoryCasStore::new()), false).unwrap()
    }

    fn n(s: &str) -> Vec<u8> {
        s.as_bytes().to_vec()
    }

    fn root_and(names: &[&str]) -> Vec<Vec<u8>> {
        let mut v = vec![Vec::new()];
        v.extend(names.iter().map(|s| n(s)));
        v
    }

    #[test]
    fn empty_filesystem_resolves_to_hash_of_empty_dir() {
        let fs = fs();
        let registry = Registry::with_default_codecs();
        let empty_blob =
            codec::encode_blob(registry.default_codec().as_ref(), &[], &BTreeMap::new()).unwrap();
        assert_eq!(fs.hash_of_empty_dir(), fs.put_scalar(&empty_blob).unwrap());
        let resolved = fs.resolve_path(&root_and(&[]), &PathFlags::default()).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].kind, EntryKind::Dir);
        assert_eq!(resolved[0].reference.as_digest(), Some(fs.hash_of_empty_dir()));
    }

    #[test]
    fn commit_creates_a_file() {
        let fs = fs();
        let digest = fs.put_scalar(b"hello").unwrap();
        fs.set_path(&root_and(&["a"]), PathValue::Entry(DirEntry::file(n("a"), digest)))
            .unwrap();
        fs.commit().unwrap();

        let resolved = fs.resolve_path(&root_and(&["a"]), &PathFlags::default()).unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[1].name, b"a");
        assert_eq!(resolved[1].reference.as_digest(), Some(digest));

        let root_dir = fs.get_dir(resolved[0].reference.as_digest().unwrap()).unwrap().unwrap();
        assert_eq!(root_dir.entries().len(), 1);
        assert_eq!(root_dir.entries()[0].name, b"a");
    }

    #[test]
    fn symlink_resolution_through_absolute_target() {
        let fs = fs();
        let x_digest = fs.put_scalar(b"x contents").unwrap();
        fs.set_path(
            &root_and(&["target", "x"]),
            PathValue::Entry(DirEntry::file(n("x"), x_digest)),
        )
        .unwrap();
        fs.set_path(
            &root_and(&["link"]),
            PathValue::Entry(DirEntry::symlink(n("link"), b"/target".to_vec())),
        )
        .unwrap();
        fs.commit().unwrap();

        let resolved = fs
            .resolve_path(&root_and(&["link", "x"]), &PathFlags::default())
            .unwrap();
        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[1].kind, EntryKind::Dir);
        assert_eq!(resolved[1].name, b"target");
        assert_eq!(resolved[2].name, b"x");
        assert_eq!(resolved[2].reference.as_digest(), Some(x_digest));

        let trailing_empty = fs
            .resolve_path(&root_and(&["link", ""]), &PathFlags::default())
            .unwrap();
        assert_eq!(trailing_empty.len(), 2);
        assert_eq!(trailing_empty[1].name, b"target");
    }

    #[test]
    fn dotdot_through_a_symlink_acts_on_the_resolved_ancestor() {
        let fs = fs();
        fs.mkdir(&root_and(&["b", "c"])).unwrap();
        fs.set_path(
            &root_and(&["a"]),
            PathValue::Entry(DirEntry::symlink(n("a"), b"/b/c".to_vec())),
        )
        .unwrap();
        fs.commit().unwrap();

        let resolved = fs
            .resolve_path(&root_and(&["a", ".."]), &PathFlags::default())
            .unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[1].name, b"b");
    }

    #[test]
    fn unlink_leaves_empty_directory_at_hash_of_empty_dir() {
        let fs = fs();
        let digest = fs.put_scalar(b"hello").unwrap();
        fs.set_path(&root_and(&["a"]), PathValue::Entry(DirEntry::file(n("a"), digest)))
            .unwrap();
        fs.commit().unwrap();

        fs.set_path(&root_and(&["a"]), PathValue::Deleted).unwrap();
        fs.commit().unwrap();

        let resolved = fs.resolve_path(&root_and(&[]), &PathFlags::default()).unwrap();
        assert_eq!(resolved[0].reference.as_digest(), Some(fs.hash_of_empty_dir()));
        assert!(matches!(
            fs.resolve_path(&root_and(&["a"]), &PathFlags::default()),
            Err(Error::NoSuchEntry(_))
        ));
    }

    #[test]
    fn case_insensitive_lookup_preserves_stored_name() {
        let fs = CasFs::new(Arc::new(MemoryCasStore::new()), true).unwrap();
        let digest = fs.put_scalar(b"contents").unwrap();
        fs.set_path(
            &root_and(&["Foo"]),
            PathValue::Entry(DirEntry::file(n("Foo"), digest)),
        )
        .unwrap();
        fs.commit().unwrap();

        let resolved = fs
            .resolve_path(&root_and(&["foo"]), &PathFlags::default())
            .unwrap();
        assert_eq!(resolved[1].name, b"Foo");
    }

    #[test]
    fn rollback_discards_pending_edits() {
        let fs = fs();
        let digest = fs.put_scalar(b"hello").unwrap();
        fs.set_path(&root_and(&["a"]), PathValue::Entry(DirEntry::file(n("a"), digest)))
            .unwrap();
        fs.rollback();

        assert!(matches!(
            fs.resolve_path(&root_and(&["a"]), &PathFlags::default()),
            Err(Error::NoSuchEntry(_))
        ));
        assert_eq!(fs.root_entry().reference.as_digest(), Some(fs.hash_of_empty_dir()));
    }

    #[test]
    fn dotdot_at_root_escapes() {
        let fs = fs();
        assert!(matches!(
            fs.resolve_path(&root_and(&[".."]), &PathFlags::default()),
            Err(Error::EscapesRoot)
        ));
    }

    #[test]
    fn descending_into_a_file_fails_not_a_directory() {
        let fs = fs();
        let digest = fs.put_scalar(b"hello").unwrap();
        fs.set_path(&root_and(&["a"]), PathValue::Entry(DirEntry::file(n("a"), digest)))
            .unwrap();
        fs.commit().unwrap();

        assert!(matches!(
            fs.resolve_path(&root_and(&["a", "b"]), &PathFlags::default()),
            Err(Error::NotADirectory(_))
        ));
    }

    #[test]
    fn mkdir_overwrite_mode_replaces_non_directory_mid_path() {
        let fs = fs();
        let digest = fs.put_scalar(b"hello").unwrap();
        fs.set_path(&root_and(&["a"]), PathValue::Entry(DirEntry::file(n("a"), digest)))
            .unwrap();
        fs.commit().unwrap();

        let flags = PathFlags::mkdir(MkdirMode::FabricateAndOverwrite);
        fs.resolve_path(&root_and(&["a", "b"]), &flags).unwrap();
    }

    #[test]
    fn update_path_applies_changes_under_the_given_flags() {
        let fs = fs();
        let digest = fs.put_scalar(b"hello").unwrap();
        fs.set_path(&root_and(&["a"]), PathValue::Entry(DirEntry::file(n("a"), digest)))
            .unwrap();
        fs.commit().unwrap();

        fs.update_path(&root_and(&["a"]), &PathFlags::default(), |e| {
            e.metadata.mode = Some(0o644);
        })
        .unwrap();
        fs.commit().unwrap();

        let resolved = fs.resolve_path(&root_and(&["a"]), &PathFlags::default()).unwrap();
        assert_eq!(resolved[1].metadata.mode, Some(0o644));
    }
}
