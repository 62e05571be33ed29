use cas_base::Digest;

pub type Name = Vec<u8>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    BlockDev,
    CharDev,
    Pipe,
    Socket,
}

impl EntryKind {
    pub fn type_code(&self) -> u8 {
        match self {
            EntryKind::File => b'f',
            EntryKind::Dir => b'd',
            EntryKind::Symlink => b'l',
            EntryKind::CharDev => b'c',
            EntryKind::BlockDev => b'b',
            EntryKind::Pipe => b'p',
            EntryKind::Socket => b's',
        }
    }

    pub fn from_type_code(code: u8) -> Option<Self> {
        Some(match code {
            b'f' => EntryKind::File,
            b'd' => EntryKind::Dir,
            b'l' => EntryKind::Symlink,
            b'c' => EntryKind::CharDev,
            b'b' => EntryKind::BlockDev,
            b'p' => EntryKind::Pipe,
            b's' => EntryKind::Socket,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Dir => "dir",
            EntryKind::Symlink => "symlink",
            EntryKind::BlockDev => "blockdev",
            EntryKind::CharDev => "chardev",
            EntryKind::Pipe => "pipe",
            EntryKind::Socket => "socket",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "file" => EntryKind::File,
            "dir" => EntryKind::Dir,
            "symlink" => EntryKind::Symlink,
            "blockdev" => EntryKind::BlockDev,
            "chardev" => EntryKind::CharDev,
            "pipe" => EntryKind::Pipe,
            "socket" => EntryKind::Socket,
            _ => return None,
        })
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, EntryKind::Dir)
    }
}

/// The `ref` field of a [`DirEntry`]. Its meaning depends on the entry's
/// [`EntryKind`]: a CAS digest for `file`/`dir`, a raw target for
/// `symlink`, a device identifier for `blockdev`/`chardev`, and empty for
/// `pipe`/`socket`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryRef {
    Digest(Digest),
    Bytes(Vec<u8>),
    None,
}

impl EntryRef {
    pub fn as_digest(&self) -> Option<Digest> {
        match self {
            EntryRef::Digest(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            EntryRef::Bytes(b) => b,
            _ => &[],
        }
    }
}

/// Unix metadata carried alongside an entry. All fields are optional:
/// absence is distinguishable from zero, and a codec may choose not to
/// preserve any of them (see the compact codec).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub size: Option<u64>,
    pub create_ts: Option<i64>,
    pub modify_ts: Option<i64>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub user: Option<String>,
    pub group: Option<String>,
    pub mode: Option<u32>,
    pub atime: Option<i64>,
    pub ctime: Option<i64>,
    pub dev: Option<u64>,
    pub inode: Option<u64>,
    pub nlink: Option<u64>,
    pub blocksize: Option<u64>,
    pub blocks: Option<u64>,
}

/// One child of a [`Directory`](crate::Directory). Immutable; edits go
/// through [`DirEntry::clone_with`], never in-place mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct DirEntry {
    pub name: Name,
    pub kind: EntryKind,
    pub reference: EntryRef,
    pub metadata: Metadata,
}

impl DirEntry {
    pub fn new(name: Name, kind: EntryKind, reference: EntryRef) -> Self {
        Self {
            name,
            kind,
            reference,
            metadata: Metadata::default(),
        }
    }

    pub fn dir(name: Name, digest: Digest) -> Self {
        Self::new(name, EntryKind::Dir, EntryRef::Digest(digest))
    }

    pub fn file(name: Name, digest: Digest) -> Self {
        Self::new(name, EntryKind::File, EntryRef::Digest(digest))
    }

    pub fn symlink(name: Name, target: Vec<u8>) -> Self {
        Self::new(name, EntryKind::Symlink, EntryRef::Bytes(target))
    }

    /// Returns a clone of this entry with `f` applied to a mutable copy.
    /// This is the generalized `clone(overrides)` operation: callers pass a
    /// closure rather than a fixed overrides struct, so any subset of
    /// fields can be replaced without a combinatorial API.
    pub fn clone_with(&self, f: impl FnOnce(&mut DirEntry)) -> DirEntry {
        let mut copy = self.clone();
        f(&mut copy);
        copy
    }

    /// A flat field/value view of this entry: name, type, ref, and every
    /// metadata field that's present. Each [`crate::codec::Codec`] has its
    /// own wire-format-specific encoding of a `DirEntry` and does not go
    /// through this; it exists for callers that want one codec-agnostic
    /// representation, e.g. debug output or a CLI `describe` command.
    pub fn as_map(&self) -> Vec<(&'static str, String)> {
        let mut out = vec![
            ("name", String::from_utf8_lossy(&self.name).into_owned()),
            ("type", self.kind.as_str().to_string()),
        ];
        match &self.reference {
            EntryRef::Digest(d) => out.push(("ref", d.to_hex())),
            EntryRef::Bytes(b) => out.push(("ref", String::from_utf8_lossy(b).into_owned())),
            EntryRef::None => {}
        }
        let m = &self.metadata;
        macro_rules! opt {
            ($field:ident) => {
                if let Some(v) = &m.$field {
                    out.push((stringify!($field), v.to_string()));
                }
            };
        }
        opt!(size);
        opt!(create_ts);
        opt!(modify_ts);
        opt!(uid);
        opt!(gid);
        opt!(user);
        opt!(group);
        opt!(mode);
        opt!(atime);
        opt!(ctime);
        opt!(dev);
        opt!(inode);
        opt!(nlink);
        opt!(blocksize);
        opt!(blocks);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_with_replaces_only_touched_fields() {
        let original = DirEntry::file(b"a".to_vec(), Digest::new(b"a"));
        let renamed = original.clone_with(|e| e.name = b"b".to_vec());
        assert_eq!(renamed.name, b"b");
        assert_eq!(renamed.kind, original.kind);
        assert_eq!(renamed.reference, original.reference);
    }

    #[test]
    fn as_map_omits_ref_for_pipe_and_socket() {
        let pipe = DirEntry::new(b"p".to_vec(), EntryKind::Pipe, EntryRef::None);
        let map = pipe.as_map();
        assert!(!map.iter().any(|(k, _)| *k == "ref"));
    }

    #[test]
    fn as_map_includes_size_only_when_present() {
        let mut entry = DirEntry::file(b"a".to_vec(), Digest::new(b"a"));
        assert!(!entry.as_map().iter().any(|(k, _)| *k == "size"));
        entry.metadata.size = Some(42);
        let map = entry.as_map();
        assert!(map.iter().any(|(k, v)| *k == "size" && v == "42"));
    }

    #[test]
    fn as_map_includes_string_and_numeric_metadata_fields() {
        let mut entry = DirEntry::file(b"a".to_vec(), Digest::new(b"a"));
        entry.metadata.mode = Some(0o644);
        entry.metadata.user = Some("alice".to_string());
        let map = entry.as_map();
        assert!(map.iter().any(|(k, v)| *k == "mode" && v == "420"));
        assert!(map.iter().any(|(k, v)| *k == "user" && v == "alice"));
    }
}
