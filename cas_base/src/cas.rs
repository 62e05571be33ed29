use std::io::{self, Read, Seek};
use std::path::Path;

use crate::Digest;

/// A seekable handle onto a blob already stored in a [`Cas`].
///
/// Implementations back this with whatever makes sense for the store: a
/// file descriptor for an on-disk backend, a `Cursor<Vec<u8>>` for an
/// in-memory one. Readers must see the blob's full, immutable contents;
/// content-addressed blobs never change underneath an open handle.
pub trait CasFile: Read + Seek + Send {
    fn length(&self) -> io::Result<u64>;
    fn digest(&self) -> Digest;
}

#[derive(thiserror::Error, Debug)]
pub enum CasError {
    #[error("blob not found: {0}")]
    NotFound(Digest),
    #[error("i/o error talking to the content-addressable store: {0}")]
    Io(#[from] io::Error),
}

pub type CasResult<T> = Result<T, CasError>;

/// The contract a directory-blob codec and the CAS-FS kernel require of a
/// content-addressable store.
///
/// Every method is blocking: the only suspension points in the whole crate
/// are CAS calls (see the crate-level docs on the concurrency model), so
/// there is no `async` here and no runtime is pulled in to support it.
pub trait Cas: Send + Sync {
    /// Opens a handle to the blob named by `digest`, or `None` if the store
    /// has no such blob.
    fn get(&self, digest: &Digest) -> CasResult<Option<Box<dyn CasFile>>>;

    /// Stores `bytes` as a blob and returns its digest. Storing the same
    /// bytes twice is a no-op that returns the same digest both times.
    fn put_scalar(&self, bytes: &[u8]) -> CasResult<Digest>;

    /// Streams the file at `path` into the store and returns its digest.
    fn put_file(&self, path: &Path) -> CasResult<Digest>;

    /// Streams an arbitrary reader into the store and returns its digest.
    fn put_handle(&self, reader: &mut dyn Read) -> CasResult<Digest>;

    /// Returns whether a blob with this digest is present in the store.
    fn validate(&self, digest: &Digest) -> CasResult<bool>;

    /// The digest of the empty blob, precomputed so callers never need to
    /// hash zero bytes to obtain it.
    fn hash_of_null(&self) -> Digest {
        Digest::EMPTY
    }
}
