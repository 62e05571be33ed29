use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use cas_base::Digest;
use serde_json::{Map, Value};

use super::Codec;
use crate::entry::{DirEntry, EntryKind, EntryRef, Metadata};
use crate::error::{Error, Result};

/// Default directory codec. Canonical UTF-8 JSON:
/// `{"metadata": {...}, "entries": [...]}`, entries sorted by name
/// (bytewise), object keys sorted (via [`serde_json::Map`]'s `BTreeMap`
/// backing — this crate does not enable the `preserve_order` feature, so
/// this falls out of the default rather than needing manual re-sorting).
/// Names and byte-valued refs that are not valid UTF-8 fall back to
/// `{"bytes": "<base64>"}`.
pub struct JsonCodec;

fn bytes_to_json(bytes: &[u8]) -> Value {
    match std::str::from_utf8(bytes) {
        Ok(s) => Value::String(s.to_string()),
        Err(_) => {
            let mut obj = Map::new();
            obj.insert("bytes".to_string(), Value::String(B64.encode(bytes)));
            Value::Object(obj)
        }
    }
}

fn json_to_bytes(value: &Value) -> Result<Vec<u8>> {
    match value {
        Value::String(s) => Ok(s.as_bytes().to_vec()),
        Value::Object(obj) => {
            let b64 = obj
                .get("bytes")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::BadDirectoryBlob("expected {\"bytes\": ...}".into()))?;
            B64.decode(b64)
                .map_err(|e| Error::BadDirectoryBlob(format!("invalid base64 name: {e}")))
        }
        _ => Err(Error::BadDirectoryBlob(
            "expected string or {\"bytes\": ...} object".into(),
        )),
    }
}

fn entry_to_json(entry: &DirEntry) -> Value {
    let mut obj = Map::new();
    obj.insert("name".to_string(), bytes_to_json(&entry.name));
    obj.insert(
        "type".to_string(),
        Value::String(entry.kind.as_str().to_string()),
    );
    match &entry.reference {
        EntryRef::Digest(d) => {
            obj.insert("ref".to_string(), Value::String(d.to_hex()));
        }
        EntryRef::Bytes(b) => {
            obj.insert("ref".to_string(), bytes_to_json(b));
        }
        EntryRef::None => {}
    }
    let m = &entry.metadata;
    macro_rules! opt_num {
        ($field:ident) => {
            if let Some(v) = m.$field {
                obj.insert(stringify!($field).to_string(), Value::from(v));
            }
        };
    }
    opt_num!(size);
    opt_num!(create_ts);
    opt_num!(modify_ts);
    opt_num!(uid);
    opt_num!(gid);
    opt_num!(mode);
    opt_num!(atime);
    opt_num!(ctime);
    opt_num!(dev);
    opt_num!(inode);
    opt_num!(nlink);
    opt_num!(blocksize);
    opt_num!(blocks);
    if let Some(u) = &m.user {
        obj.insert("user".to_string(), Value::String(u.clone()));
    }
    if let Some(g) = &m.group {
        obj.insert("group".to_string(), Value::String(g.clone()));
    }
    Value::Object(obj)
}

fn json_to_entry(value: &Value) -> Result<DirEntry> {
    let obj = value
        .as_object()
        .ok_or_else(|| Error::BadDirectoryBlob("entry is not an object".into()))?;
    let name_field = obj
        .get("name")
        .ok_or_else(|| Error::BadDirectoryBlob("entry missing name".into()))?;
    let name = json_to_bytes(name_field)?;
    let type_str = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::BadDirectoryBlob("entry missing type".into()))?;
    let kind = EntryKind::from_str(type_str)
        .ok_or_else(|| Error::BadDirectoryBlob(format!("unknown entry type {type_str:?}")))?;

    let reference = match kind {
        EntryKind::File | EntryKind::Dir => {
            let r = obj
                .get("ref")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::BadDirectoryBlob("entry missing ref".into()))?;
            let digest: Digest = r
                .parse()
                .map_err(|_| Error::BadDirectoryBlob(format!("invalid digest {r:?}")))?;
            EntryRef::Digest(digest)
        }
        EntryKind::Symlink => {
            let r = obj
                .get("ref")
                .ok_or_else(|| Error::BadDirectoryBlob("symlink missing ref".into()))?;
            let bytes = json_to_bytes(r)?;
            if bytes.is_empty() {
                return Err(Error::BadDirectoryBlob("symlink target is empty".into()));
            }
            EntryRef::Bytes(bytes)
        }
        EntryKind::BlockDev | EntryKind::CharDev => {
            let r = obj
                .get("ref")
                .ok_or_else(|| Error::BadDirectoryBlob("device entry missing ref".into()))?;
            EntryRef::Bytes(json_to_bytes(r)?)
        }
        EntryKind::Pipe | EntryKind::Socket => EntryRef::None,
    };

    let mut metadata = Metadata::default();
    macro_rules! opt_num {
        ($field:ident, $ty:ty) => {
            metadata.$field = obj.get(stringify!($field)).and_then(Value::as_i64).map(|v| v as $ty);
        };
    }
    opt_num!(size, u64);
    opt_num!(create_ts, i64);
    opt_num!(modify_ts, i64);
    opt_num!(uid, u32);
    opt_num!(gid, u32);
    opt_num!(mode, u32);
    opt_num!(atime, i64);
    opt_num!(ctime, i64);
    opt_num!(dev, u64);
    opt_num!(inode, u64);
    opt_num!(nlink, u64);
    opt_num!(blocksize, u64);
    opt_num!(blocks, u64);
    metadata.user = obj.get("user").and_then(Value::as_str).map(str::to_string);
    metadata.group = obj.get("group").and_then(Value::as_str).map(str::to_string);

    Ok(DirEntry {
        name,
        kind,
        reference,
        metadata,
    })
}

impl Codec for JsonCodec {
    fn format_tag(&self) -> &'static str {
        ""
    }

    fn encode(&self, entries: &[DirEntry], metadata: &BTreeMap<String, String>) -> Result<Vec<u8>> {
        let mut sorted: Vec<&DirEntry> = entries.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));

        let mut meta_obj = Map::new();
        for (k, v) in metadata {
            meta_obj.insert(k.clone(), Value::String(v.clone()));
        }

        let mut root = Map::new();
        root.insert("metadata".to_string(), Value::Object(meta_obj));
        root.insert(
            "entries".to_string(),
            Value::Array(sorted.iter().map(|e| entry_to_json(e)).collect()),
        );

        serde_json::to_vec(&Value::Object(root))
            .map_err(|e| Error::UnsupportedFormat(format!("json encode failed: {e}")))
    }

    fn decode(&self, payload: &[u8]) -> Result<(Vec<DirEntry>, BTreeMap<String, String>)> {
        let root: Value = serde_json::from_slice(payload)
            .map_err(|e| Error::BadDirectoryBlob(format!("invalid json: {e}")))?;
        let obj = root
            .as_object()
            .ok_or_else(|| Error::BadDirectoryBlob("root is not an object".into()))?;

        let mut metadata = BTreeMap::new();
        if let Some(Value::Object(m)) = obj.get("metadata") {
            for (k, v) in m {
                if let Some(s) = v.as_str() {
                    metadata.insert(k.clone(), s.to_string());
                }
            }
        }

        let entries_val = obj
            .get("entries")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::BadDirectoryBlob("missing entries array".into()))?;
        let mut entries = Vec::with_capacity(entries_val.len());
        for v in entries_val {
            entries.push(json_to_entry(v)?);
        }
        Ok((entries, metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_entries() {
        let codec = JsonCodec;
        let entries = vec![
            DirEntry::file(b"b.txt".to_vec(), Digest::new(b"b")),
            DirEntry::dir(b"a".to_vec(), Digest::new(b"a")),
        ];
        let blob = codec.encode(&entries, &BTreeMap::new()).unwrap();
        let (decoded, _) = codec.decode(&blob).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].name, b"a");
        assert_eq!(decoded[1].name, b"b.txt");
    }

    #[test]
    fn canonical_serialization_is_deterministic() {
        let codec = JsonCodec;
        let entries = vec![
            DirEntry::dir(b"z".to_vec(), Digest::new(b"z")),
            DirEntry::file(b"a".to_vec(), Digest::new(b"a")),
        ];
        let blob1 = codec.encode(&entries, &BTreeMap::new()).unwrap();
        let blob2 = codec.encode(&entries, &BTreeMap::new()).unwrap();
        assert_eq!(blob1, blob2);
    }

    #[test]
    fn non_utf8_name_round_trips_via_base64() {
        let codec = JsonCodec;
        let bad_name = vec![0xff, 0xfe, b'x'];
        let entries = vec![DirEntry::file(bad_name.clone(), Digest::new(b"x"))];
        let blob = codec.encode(&entries, &BTreeMap::new()).unwrap();
        let (decoded, _) = codec.decode(&blob).unwrap();
        assert_eq!(decoded[0].name, bad_name);
    }

    #[test]
    fn rejects_truncated_json() {
        let codec = JsonCodec;
        let err = codec.decode(b"{not json").unwrap_err();
        assert!(matches!(err, Error::BadDirectoryBlob(_)));
    }
}
