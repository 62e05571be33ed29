use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Weak};

use cas_base::Digest;

use crate::directory::Directory;

/// Retention window size for the strong-reference ring. The spec's range
/// is 32-64; 48 sits in the middle and is small enough that a single
/// kernel's cache stays cheap even when every decoded directory is large.
pub const DEFAULT_CAPACITY: usize = 48;

/// Weakly-indexed pool of decoded [`Directory`] objects, plus a small ring
/// of strong references that keeps the most recently touched directories
/// alive regardless of whether any caller still holds one.
///
/// Rust's `Weak` has no destructor hook back into the owning map, so unlike
/// a language with finalizers this cache prunes expired entries lazily, on
/// `get`/`put`, rather than eagerly on drop. The two approaches are
/// behaviorally equivalent: a pruned entry and an unpruned-but-expired one
/// both report as absent.
pub struct DirectoryCache {
    index: HashMap<Digest, Weak<Directory>>,
    ring: VecDeque<Arc<Directory>>,
    capacity: usize,
}

impl DirectoryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            index: HashMap::new(),
            ring: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Returns a live `Directory` for `digest`, if the weak index still has
    /// one (because the ring, or some other owner, keeps it alive).
    pub fn get(&mut self, digest: &Digest) -> Option<Arc<Directory>> {
        self.prune();
        self.index.get(digest).and_then(Weak::upgrade)
    }

    /// Inserts `dir` into the cache, protecting it from reclamation for at
    /// least the next `capacity - 1` `put` calls. Returns the canonical
    /// `Arc` for this digest — if an equal, still-live directory was
    /// already indexed, that one is returned instead of `dir`, so callers
    /// never end up with two distinct `Arc`s for the same digest while one
    /// is still referenced through the cache.
    pub fn put(&mut self, dir: Arc<Directory>) -> Arc<Directory> {
        self.prune();
        let digest = dir.digest();
        let canonical = match self.index.get(&digest).and_then(Weak::upgrade) {
            Some(existing) => existing,
            None => {
                self.index.insert(digest, Arc::downgrade(&dir));
                dir
            }
        };
        self.push_ring(canonical.clone());
        canonical
    }

    fn push_ring(&mut self, dir: Arc<Directory>) {
        self.ring.push_back(dir);
        while self.ring.len() > self.capacity {
            self.ring.pop_front();
        }
    }

    fn prune(&mut self) {
        self.index.retain(|_, w| w.strong_count() > 0);
    }
}

impl Default for DirectoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir(seed: &[u8]) -> Arc<Directory> {
        Arc::new(Directory::empty(Digest::new(seed)))
    }

    #[test]
    fn put_then_get_hits_while_in_ring() {
        let mut cache = DirectoryCache::new(4);
        let d = dir(b"a");
        let digest = d.digest();
        cache.put(d);
        assert!(cache.get(&digest).is_some());
    }

    #[test]
    fn eviction_from_ring_without_other_owners_drops_entry() {
        let mut cache = DirectoryCache::new(2);
        let first = dir(b"first");
        let first_digest = first.digest();
        cache.put(first);
        cache.put(dir(b"second"));
        cache.put(dir(b"third"));
        assert!(cache.get(&first_digest).is_none());
    }

    #[test]
    fn external_owner_keeps_entry_alive_past_eviction() {
        let mut cache = DirectoryCache::new(1);
        let kept = dir(b"kept");
        let kept_digest = kept.digest();
        cache.put(kept.clone());
        cache.put(dir(b"evicts-kept-from-ring"));
        // `kept` is gone from the ring but the caller's Arc keeps it alive.
        assert!(cache.get(&kept_digest).is_some());
        drop(kept);
        assert!(cache.get(&kept_digest).is_none());
    }

    #[test]
    fn put_with_existing_live_entry_returns_canonical_arc() {
        let mut cache = DirectoryCache::new(4);
        let a = dir(b"same");
        let digest = a.digest();
        let returned_a = cache.put(a);
        let b = dir(b"same");
        let returned_b = cache.put(b);
        assert!(Arc::ptr_eq(&returned_a, &returned_b));
        assert_eq!(returned_b.digest(), digest);
    }
}
