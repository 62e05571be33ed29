use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("unable to stat {0:?}: {1}")]
    Stat(PathBuf, std::io::Error),

    #[error("unable to read {0:?}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("unable to write {0:?}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("unsupported file type at {0:?}")]
    UnsupportedFileType(PathBuf),

    #[error(transparent)]
    CasFs(#[from] cas_fs::Error),

    #[error(transparent)]
    Cas(#[from] cas_base::CasError),
}

pub type Result<T> = std::result::Result<T, Error>;
