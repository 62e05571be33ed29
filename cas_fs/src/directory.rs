use std::collections::BTreeMap;

use cas_base::{Cas, Digest};

use crate::codec::{self, Registry};
use crate::entry::DirEntry;
use crate::error::{Error, Result};

/// A decoded, immutable directory. Digest-addressed: two `Directory`
/// values with the same `digest` are guaranteed (by the codec's
/// canonical-serialization contract) to carry the same entries.
#[derive(Debug, Clone)]
pub struct Directory {
    digest: Digest,
    format_tag: String,
    metadata: BTreeMap<String, String>,
    entries: Vec<DirEntry>,
}

impl Directory {
    pub fn empty(digest: Digest) -> Self {
        Self {
            digest,
            format_tag: String::new(),
            metadata: BTreeMap::new(),
            entries: Vec::new(),
        }
    }

    /// Reads the blob named by `digest` out of `cas` and decodes it
    /// through `registry`. Returns `Ok(None)` when the CAS has no such
    /// blob (distinct from a blob that fails to decode, which is an
    /// `Err(Error::BadDirectoryBlob)`).
    pub fn load(cas: &dyn Cas, digest: Digest, registry: &Registry) -> Result<Option<Self>> {
        let Some(mut file) = cas.get(&digest)? else {
            return Ok(None);
        };
        let mut blob = Vec::new();
        std::io::Read::read_to_end(&mut file, &mut blob).map_err(cas_base::CasError::Io)?;
        let (format_tag, entries, metadata) = codec::decode_blob(&blob, registry)?;
        Ok(Some(Self {
            digest,
            format_tag,
            metadata,
            entries,
        }))
    }

    pub fn digest(&self) -> Digest {
        self.digest
    }

    pub fn format_tag(&self) -> &str {
        &self.format_tag
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    pub fn get(&self, name: &[u8], case_insensitive: bool) -> Option<&DirEntry> {
        self.entries.iter().find(|e| {
            if case_insensitive {
                e.name.eq_ignore_ascii_case(name)
            } else {
                e.name == name
            }
        })
    }

    /// Serializes `entries`/`metadata` with `registry`'s codec for
    /// `format_tag` (the empty tag falling back to the default codec when
    /// there is no underlying directory to match), storing the result in
    /// `cas` and returning the new digest. An empty directory short-circuits
    /// to `hash_of_empty_dir` — the digest of the configured codec's
    /// encoding of `([], {})`, which the caller is expected to have already
    /// stored — instead of re-serializing it on every write. Returns
    /// `Error::UnsupportedFormat` if `format_tag` is not registered.
    pub fn store(
        cas: &dyn Cas,
        registry: &Registry,
        format_tag: &str,
        entries: &[DirEntry],
        metadata: &BTreeMap<String, String>,
        hash_of_empty_dir: Digest,
    ) -> Result<Digest> {
        if entries.is_empty() && metadata.is_empty() {
            return Ok(hash_of_empty_dir);
        }
        let codec = registry
            .get(format_tag)
            .ok_or_else(|| Error::UnsupportedFormat(format_tag.to_string()))?;
        let blob = codec::encode_blob(codec.as_ref(), entries, metadata)?;
        Ok(cas.put_scalar(&blob)?)
    }
}
