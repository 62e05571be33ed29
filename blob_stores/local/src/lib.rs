//! Disk-backed [`Cas`] implementation.
//!
//! Blobs are laid out as `<root>/<first two hex digits>/<full hex digest>`
//! to bound the fan-out of any single directory, a layout conventional for
//! content-addressed stores on a local filesystem. Writes go through a
//! temp file renamed into place, so a concurrent reader never observes a
//! partially written blob.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use cas_base::{Cas, CasError, CasFile, CasResult, Digest};

#[derive(Debug, Clone)]
pub struct LocalCasStore {
    root: PathBuf,
}

impl LocalCasStore {
    /// Opens a store rooted at `root`, creating the directory if absent.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn blob_path(&self, digest: &Digest) -> PathBuf {
        let hex = digest.to_hex();
        self.root.join(&hex[..2]).join(hex)
    }
}

struct LocalCasFile {
    digest: Digest,
    file: File,
    len: u64,
}

impl Read for LocalCasFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl io::Seek for LocalCasFile {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

impl CasFile for LocalCasFile {
    fn length(&self) -> io::Result<u64> {
        Ok(self.len)
    }

    fn digest(&self) -> Digest {
        self.digest
    }
}

impl Cas for LocalCasStore {
    fn get(&self, digest: &Digest) -> CasResult<Option<Box<dyn CasFile>>> {
        let path = self.blob_path(digest);
        match File::open(&path) {
            Ok(file) => {
                let len = file.metadata().map_err(CasError::Io)?.len();
                Ok(Some(Box::new(LocalCasFile {
                    digest: *digest,
                    file,
                    len,
                }) as Box<dyn CasFile>))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CasError::Io(e)),
        }
    }

    fn put_scalar(&self, bytes: &[u8]) -> CasResult<Digest> {
        let digest = Digest::new(bytes);
        let path = self.blob_path(&digest);
        if path.exists() {
            return Ok(digest);
        }
        let dir = path.parent().expect("blob path always has a parent");
        fs::create_dir_all(dir).map_err(CasError::Io)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(CasError::Io)?;
        use io::Write;
        tmp.write_all(bytes).map_err(CasError::Io)?;
        tmp.persist(&path)
            .map_err(|e| CasError::Io(e.error))?;
        Ok(digest)
    }

    fn put_file(&self, path: &Path) -> CasResult<Digest> {
        let bytes = fs::read(path).map_err(CasError::Io)?;
        self.put_scalar(&bytes)
    }

    fn put_handle(&self, reader: &mut dyn Read) -> CasResult<Digest> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).map_err(CasError::Io)?;
        self.put_scalar(&bytes)
    }

    fn validate(&self, digest: &Digest) -> CasResult<bool> {
        Ok(self.blob_path(digest).exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalCasStore::open(dir.path()).unwrap();
        let digest = store.put_scalar(b"hello").unwrap();
        let mut file = store.get(&digest).unwrap().unwrap();
        let mut out = Vec::new();
        file.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"hello");
    }

    #[test]
    fn shards_by_two_hex_digits() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalCasStore::open(dir.path()).unwrap();
        let digest = store.put_scalar(b"shard me").unwrap();
        let hex = digest.to_hex();
        assert!(dir.path().join(&hex[..2]).join(&hex).exists());
    }

    #[test]
    fn missing_digest_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalCasStore::open(dir.path()).unwrap();
        assert!(store.get(&Digest::new(b"nope")).unwrap().is_none());
    }
}
