use cas_base::{CasError, Digest};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("bad directory blob: {0}")]
    BadDirectoryBlob(String),

    #[error("no such entry: {0:?}")]
    NoSuchEntry(Vec<u8>),

    #[error("directory not in storage for entry {0:?}")]
    DirectoryNotInStorage(Vec<u8>),

    #[error("not a directory: {0:?}")]
    NotADirectory(Vec<u8>),

    #[error("path escapes root")]
    EscapesRoot,

    #[error("invalid symlink: {0:?}")]
    InvalidSymlink(Vec<u8>),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("directory blob missing from storage: {0}")]
    MissingBlob(Digest),

    #[error(transparent)]
    CasIoError(#[from] CasError),
}

pub type Result<T> = std::result::Result<T, Error>;
