//! Directory-tree layer over a content-addressable store.
//!
//! A [`CasFs`] overlays a traditional filesystem hierarchy — directories,
//! files, symlinks, device nodes — onto a [`cas_base::Cas`]. Each directory
//! is serialized into a CAS blob through a pluggable [`codec`]; the blob's
//! digest transitively names the entire subtree rooted at it, so a snapshot
//! is a single digest and unchanged subtrees are shared automatically
//! across snapshots.
//!
//! The three pieces that make this work live here, tightly coupled because
//! path resolution has to walk through both committed (CAS-backed) and
//! pending (in-memory overlay) state:
//!
//! - [`codec`] — the binary container format directory blobs are
//!   serialized into, with more than one codec registered by format tag.
//! - [`kernel::CasFs`] — owns the CAS handle, the root entry, the
//!   directory [`cache`], and the pending [`overlay`]; resolves paths and
//!   folds edits back through the codec on [`kernel::CasFs::commit`].
//! - [`resolver`] — the path-walking algorithm `CasFs` drives, including
//!   symlink following, `..`, and the `mkdir`/`partial` fabrication modes.
//!
//! [`path`] is a thin convenience facade bundling a `CasFs` reference with
//! an unresolved name sequence; it carries no state of its own.
//!
//! Concurrency model: single-threaded cooperative, per the crate's design
//! notes. `CasFs`'s mutable state is held in `RefCell`s, not
//! `Mutex`/`RwLock` — sharing one instance across threads is the
//! embedder's job, not this crate's.

mod cache;
mod codec;
mod directory;
mod entry;
mod error;
mod kernel;
mod overlay;
mod path;
mod resolver;

pub use cache::{DirectoryCache, DEFAULT_CAPACITY};
pub use codec::{Codec, JsonCodec, MinimalCodec, Registry, MAGIC, MINIMAL_FORMAT_TAG};
pub use directory::Directory;
pub use entry::{DirEntry, EntryKind, EntryRef, Metadata, Name};
pub use error::{Error, Result};
pub use kernel::{CasFs, PathValue};
pub use overlay::{OverlayChild, OverlayNode};
pub use path::PathRef;
pub use resolver::{MkdirMode, PathFlags};
