use std::collections::HashMap;

use crate::entry::DirEntry;

/// A pending child of an [`OverlayNode`]: either a live override, or a
/// tombstone recording that a same-named entry from the underlying
/// committed directory has been unlinked.
pub enum OverlayChild {
    Node(OverlayNode),
    Deleted,
}

/// One node of the in-memory edit tree superimposed on the committed,
/// CAS-backed tree. `entry` is the effective `DirEntry` at this position
/// (what `resolve_path` should report); `subtree` holds overrides for this
/// node's children, keyed by name.
pub struct OverlayNode {
    pub entry: DirEntry,
    pub subtree: HashMap<Vec<u8>, OverlayChild>,
}

impl OverlayNode {
    pub fn new(entry: DirEntry) -> Self {
        Self {
            entry,
            subtree: HashMap::new(),
        }
    }

    fn find_key(&self, name: &[u8], case_insensitive: bool) -> Option<Vec<u8>> {
        if case_insensitive {
            self.subtree
                .keys()
                .find(|k| k.eq_ignore_ascii_case(name))
                .cloned()
        } else if self.subtree.contains_key(name) {
            Some(name.to_vec())
        } else {
            None
        }
    }

    pub fn child(&self, name: &[u8], case_insensitive: bool) -> Option<&OverlayChild> {
        let key = self.find_key(name, case_insensitive)?;
        self.subtree.get(&key)
    }

    pub fn child_mut(&mut self, name: &[u8], case_insensitive: bool) -> Option<&mut OverlayChild> {
        let key = self.find_key(name, case_insensitive)?;
        self.subtree.get_mut(&key)
    }

    /// Returns the existing live child node at `name`, materializing one
    /// from `make_entry` if no override exists yet (or the existing
    /// override is a tombstone).
    pub fn ensure_child(
        &mut self,
        name: &[u8],
        case_insensitive: bool,
        make_entry: impl FnOnce() -> DirEntry,
    ) -> &mut OverlayNode {
        let key = self
            .find_key(name, case_insensitive)
            .unwrap_or_else(|| name.to_vec());
        let needs_init = !matches!(self.subtree.get(&key), Some(OverlayChild::Node(_)));
        if needs_init {
            self.subtree
                .insert(key.clone(), OverlayChild::Node(OverlayNode::new(make_entry())));
        }
        match self.subtree.get_mut(&key) {
            Some(OverlayChild::Node(node)) => node,
            _ => unreachable!("just inserted a Node variant"),
        }
    }

    pub fn set_child(&mut self, name: Vec<u8>, child: OverlayChild) {
        self.subtree.insert(name, child);
    }

    pub fn is_empty_subtree(&self) -> bool {
        self.subtree.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryRef;
    use cas_base::Digest;

    fn leaf(name: &str) -> DirEntry {
        DirEntry::new(name.as_bytes().to_vec(), crate::entry::EntryKind::File, EntryRef::Digest(Digest::new(name.as_bytes())))
    }

    #[test]
    fn case_sensitive_lookup_does_not_fold() {
        let mut root = OverlayNode::new(leaf("root"));
        root.set_child(b"Foo".to_vec(), OverlayChild::Node(OverlayNode::new(leaf("Foo"))));
        assert!(root.child(b"foo", false).is_none());
        assert!(root.child(b"Foo", false).is_some());
    }

    #[test]
    fn case_insensitive_lookup_folds_but_key_stays_original() {
        let mut root = OverlayNode::new(leaf("root"));
        root.set_child(b"Foo".to_vec(), OverlayChild::Node(OverlayNode::new(leaf("Foo"))));
        assert!(root.child(b"foo", true).is_some());
        assert!(root.subtree.contains_key(b"Foo".as_slice()));
    }

    #[test]
    fn ensure_child_reuses_existing_node_instead_of_resetting_it() {
        let mut root = OverlayNode::new(leaf("root"));
        root.ensure_child(b"a", false, || leaf("a"))
            .set_child(b"b".to_vec(), OverlayChild::Node(OverlayNode::new(leaf("b"))));
        // A second call for the same name must not wipe out the child
        // installed above.
        let a = root.ensure_child(b"a", false, || leaf("a-should-not-be-used"));
        assert!(a.child(b"b", false).is_some());
    }

    #[test]
    fn ensure_child_replaces_a_deleted_tombstone() {
        let mut root = OverlayNode::new(leaf("root"));
        root.set_child(b"a".to_vec(), OverlayChild::Deleted);
        let a = root.ensure_child(b"a", false, || leaf("a"));
        assert_eq!(a.entry.name, b"a");
    }
}
