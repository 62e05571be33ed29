//! In-memory [`Cas`] implementation.
//!
//! Not a production storage backend — it exists so the directory-tree core
//! and its tests can run without a disk or network dependency.

use std::collections::HashMap;
use std::io::{self, Cursor, Read};
use std::path::Path;
use std::sync::Mutex;

use cas_base::{Cas, CasError, CasFile, CasResult, Digest};

#[derive(Debug, Default)]
pub struct MemoryCasStore {
    blobs: Mutex<HashMap<Digest, Vec<u8>>>,
}

impl MemoryCasStore {
    pub fn new() -> Self {
        Self::default()
    }
}

struct MemoryCasFile {
    digest: Digest,
    cursor: Cursor<Vec<u8>>,
}

impl Read for MemoryCasFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl io::Seek for MemoryCasFile {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}

impl CasFile for MemoryCasFile {
    fn length(&self) -> io::Result<u64> {
        Ok(self.cursor.get_ref().len() as u64)
    }

    fn digest(&self) -> Digest {
        self.digest
    }
}

impl Cas for MemoryCasStore {
    fn get(&self, digest: &Digest) -> CasResult<Option<Box<dyn CasFile>>> {
        let blobs = self.blobs.lock().unwrap();
        Ok(blobs.get(digest).map(|bytes| {
            Box::new(MemoryCasFile {
                digest: *digest,
                cursor: Cursor::new(bytes.clone()),
            }) as Box<dyn CasFile>
        }))
    }

    fn put_scalar(&self, bytes: &[u8]) -> CasResult<Digest> {
        let digest = Digest::new(bytes);
        self.blobs
            .lock()
            .unwrap()
            .entry(digest)
            .or_insert_with(|| bytes.to_vec());
        Ok(digest)
    }

    fn put_file(&self, path: &Path) -> CasResult<Digest> {
        let bytes = std::fs::read(path).map_err(CasError::Io)?;
        self.put_scalar(&bytes)
    }

    fn put_handle(&self, reader: &mut dyn Read) -> CasResult<Digest> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).map_err(CasError::Io)?;
        self.put_scalar(&bytes)
    }

    fn validate(&self, digest: &Digest) -> CasResult<bool> {
        Ok(self.blobs.lock().unwrap().contains_key(digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_bytes() {
        let store = MemoryCasStore::new();
        let digest = store.put_scalar(b"hello").unwrap();
        let mut file = store.get(&digest).unwrap().unwrap();
        let mut out = Vec::new();
        file.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"hello");
    }

    #[test]
    fn validate_reflects_presence() {
        let store = MemoryCasStore::new();
        let digest = store.put_scalar(b"data").unwrap();
        assert!(store.validate(&digest).unwrap());
        assert!(!store.validate(&Digest::new(b"absent")).unwrap());
    }

    #[test]
    fn missing_digest_returns_none() {
        let store = MemoryCasStore::new();
        assert!(store.get(&Digest::new(b"nope")).unwrap().is_none());
    }
}
