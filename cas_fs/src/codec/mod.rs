//! Directory-blob wire format: a small fixed header identifying which
//! codec produced the payload, dispatched through a static [`Registry`].
//!
//! Dynamic loading of a codec named by a blob's own header is deliberately
//! not supported — see the crate-level design notes on why format dispatch
//! must never double as code loading.

mod json;
mod minimal;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::entry::DirEntry;
use crate::error::{Error, Result};

pub use json::JsonCodec;
pub use minimal::MinimalCodec;

/// `"CAS_Dir "` — 8 bytes, trailing space included.
pub const MAGIC: &[u8; 8] = b"CAS_Dir ";

/// Format tag under which the compact codec is registered, kept for
/// compatibility with blobs written by the tag's original name.
pub const MINIMAL_FORMAT_TAG: &str = "File::CAS::Dir::Minimal";

/// A pluggable directory serializer. `format_tag` identifies the codec in
/// the blob header; the empty tag is reserved for the default codec.
pub trait Codec: Send + Sync {
    fn format_tag(&self) -> &'static str;

    fn encode(&self, entries: &[DirEntry], metadata: &BTreeMap<String, String>) -> Result<Vec<u8>>;

    fn decode(&self, payload: &[u8]) -> Result<(Vec<DirEntry>, BTreeMap<String, String>)>;
}

/// The set of codecs a [`crate::CasFs`] knows how to dispatch to, built once
/// at construction from a fixed list — never populated from blob content.
pub struct Registry {
    codecs: HashMap<String, Arc<dyn Codec>>,
}

impl Registry {
    pub fn with_default_codecs() -> Self {
        let mut codecs: HashMap<String, Arc<dyn Codec>> = HashMap::new();
        codecs.insert(String::new(), Arc::new(JsonCodec));
        codecs.insert(MINIMAL_FORMAT_TAG.to_string(), Arc::new(MinimalCodec));
        Self { codecs }
    }

    pub fn register(&mut self, codec: Arc<dyn Codec>) {
        self.codecs.insert(codec.format_tag().to_string(), codec);
    }

    pub fn get(&self, format_tag: &str) -> Option<Arc<dyn Codec>> {
        self.codecs.get(format_tag).cloned()
    }

    pub fn default_codec(&self) -> Arc<dyn Codec> {
        self.get("").expect("default codec always registered")
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_default_codecs()
    }
}

/// Writes the common header (`MAGIC` + tag length + tag + `\n`) followed by
/// `codec`'s encoding of `entries`/`metadata`.
pub fn encode_blob(
    codec: &dyn Codec,
    entries: &[DirEntry],
    metadata: &BTreeMap<String, String>,
) -> Result<Vec<u8>> {
    let tag = codec.format_tag();
    if tag.len() > 255 {
        return Err(Error::UnsupportedFormat(format!(
            "format tag {tag:?} exceeds 255 bytes"
        )));
    }
    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(format!("{:02X}", tag.len()).as_bytes());
    out.push(b' ');
    out.extend_from_slice(tag.as_bytes());
    out.push(b'\n');
    out.extend(codec.encode(entries, metadata)?);
    Ok(out)
}

/// Reads the header off `blob`, looks the tag up in `registry`, and decodes
/// the remainder. Any malformed header or payload becomes
/// [`Error::BadDirectoryBlob`]; this function never panics on untrusted
/// input.
pub fn decode_blob(
    blob: &[u8],
    registry: &Registry,
) -> Result<(String, Vec<DirEntry>, BTreeMap<String, String>)> {
    if blob.len() < MAGIC.len() + 3 {
        return Err(Error::BadDirectoryBlob("blob shorter than header".into()));
    }
    if &blob[..MAGIC.len()] != MAGIC {
        return Err(Error::BadDirectoryBlob("bad magic".into()));
    }
    let len_field = &blob[MAGIC.len()..MAGIC.len() + 2];
    let tag_len = std::str::from_utf8(len_field)
        .ok()
        .and_then(|s| u8::from_str_radix(s, 16).ok())
        .ok_or_else(|| Error::BadDirectoryBlob("bad format-tag length".into()))? as usize;

    let after_len = MAGIC.len() + 2;
    if blob.len() < after_len + 1 + tag_len + 1 {
        return Err(Error::BadDirectoryBlob("blob truncated in header".into()));
    }
    if blob[after_len] != b' ' {
        return Err(Error::BadDirectoryBlob("missing space after tag length".into()));
    }
    let tag_start = after_len + 1;
    let tag_end = tag_start + tag_len;
    let tag = std::str::from_utf8(&blob[tag_start..tag_end])
        .map_err(|_| Error::BadDirectoryBlob("format tag is not valid utf-8".into()))?;
    if blob[tag_end] != b'\n' {
        return Err(Error::BadDirectoryBlob("missing newline after format tag".into()));
    }
    let payload = &blob[tag_end + 1..];

    let codec = registry
        .get(tag)
        .ok_or_else(|| Error::BadDirectoryBlob(format!("unknown format tag {tag:?}")))?;
    let (entries, metadata) = codec.decode(payload)?;
    Ok((tag.to_string(), entries, metadata))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let registry = Registry::with_default_codecs();
        let codec = registry.default_codec();
        let entries = vec![];
        let meta = BTreeMap::new();
        let blob = encode_blob(codec.as_ref(), &entries, &meta).unwrap();
        assert!(blob.starts_with(MAGIC));
        let (tag, decoded, _) = decode_blob(&blob, &registry).unwrap();
        assert!(tag.is_empty());
        assert!(decoded.is_empty());
    }

    #[test]
    fn rejects_bad_magic() {
        let registry = Registry::with_default_codecs();
        let err = decode_blob(b"NOT_A_DIR_MAGIC!", &registry).unwrap_err();
        assert!(matches!(err, Error::BadDirectoryBlob(_)));
    }

    #[test]
    fn rejects_unknown_format_tag() {
        let registry = Registry::with_default_codecs();
        let mut blob = Vec::new();
        blob.extend_from_slice(MAGIC);
        blob.extend_from_slice(b"07 unknown\n");
        let err = decode_blob(&blob, &registry).unwrap_err();
        assert!(matches!(err, Error::BadDirectoryBlob(_)));
    }
}
