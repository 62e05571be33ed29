use std::collections::BTreeMap;

use cas_base::Digest;

use super::Codec;
use crate::entry::{DirEntry, EntryKind, EntryRef};
use crate::error::{Error, Result};

/// Compact binary codec, registered under the historical format tag
/// `File::CAS::Dir::Minimal`. Each entry is
/// `nameLen(1) valLen(1) typeCode(1) name NUL val NUL`, entries sorted by
/// name. No directory-level or per-entry metadata beyond `ref` survives a
/// round trip through this codec — callers that need the optional stat
/// fields must use [`super::JsonCodec`].
pub struct MinimalCodec;

fn value_bytes(entry: &DirEntry) -> Vec<u8> {
    match &entry.reference {
        EntryRef::Digest(d) => d.as_bytes().to_vec(),
        EntryRef::Bytes(b) => b.clone(),
        EntryRef::None => Vec::new(),
    }
}

impl Codec for MinimalCodec {
    fn format_tag(&self) -> &'static str {
        super::MINIMAL_FORMAT_TAG
    }

    fn encode(&self, entries: &[DirEntry], _metadata: &BTreeMap<String, String>) -> Result<Vec<u8>> {
        let mut sorted: Vec<&DirEntry> = entries.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));

        let mut out = Vec::new();
        for entry in sorted {
            let val = value_bytes(entry);
            if entry.name.len() > 255 {
                return Err(Error::UnsupportedFormat(format!(
                    "name {:?} exceeds 255 bytes for the compact codec",
                    String::from_utf8_lossy(&entry.name)
                )));
            }
            if val.len() > 255 {
                return Err(Error::UnsupportedFormat(
                    "value exceeds 255 bytes for the compact codec".into(),
                ));
            }
            out.push(entry.name.len() as u8);
            out.push(val.len() as u8);
            out.push(entry.kind.type_code());
            out.extend_from_slice(&entry.name);
            out.push(0);
            out.extend_from_slice(&val);
            out.push(0);
        }
        Ok(out)
    }

    fn decode(&self, payload: &[u8]) -> Result<(Vec<DirEntry>, BTreeMap<String, String>)> {
        let mut entries = Vec::new();
        let mut cursor = 0usize;
        while cursor < payload.len() {
            if cursor + 3 > payload.len() {
                return Err(Error::BadDirectoryBlob("truncated entry header".into()));
            }
            let name_len = payload[cursor] as usize;
            let val_len = payload[cursor + 1] as usize;
            let type_code = payload[cursor + 2];
            cursor += 3;

            if cursor + name_len + 1 + val_len + 1 > payload.len() {
                return Err(Error::BadDirectoryBlob("truncated entry body".into()));
            }
            let name = payload[cursor..cursor + name_len].to_vec();
            cursor += name_len;
            if payload[cursor] != 0 {
                return Err(Error::BadDirectoryBlob("missing NUL after name".into()));
            }
            cursor += 1;

            let val = payload[cursor..cursor + val_len].to_vec();
            cursor += val_len;
            if payload[cursor] != 0 {
                return Err(Error::BadDirectoryBlob("missing NUL after value".into()));
            }
            cursor += 1;

            let kind = EntryKind::from_type_code(type_code)
                .ok_or_else(|| Error::BadDirectoryBlob(format!("unknown type code {type_code:#x}")))?;

            let reference = match kind {
                EntryKind::File | EntryKind::Dir => {
                    let bytes: [u8; 32] = val.as_slice().try_into().map_err(|_| {
                        Error::BadDirectoryBlob("digest value is not 32 bytes".into())
                    })?;
                    EntryRef::Digest(Digest::from_bytes(bytes))
                }
                EntryKind::Symlink | EntryKind::BlockDev | EntryKind::CharDev => {
                    EntryRef::Bytes(val)
                }
                EntryKind::Pipe | EntryKind::Socket => EntryRef::None,
            };

            entries.push(DirEntry::new(name, kind, reference));
        }
        Ok((entries, BTreeMap::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_entries() {
        let codec = MinimalCodec;
        let entries = vec![
            DirEntry::file(b"b".to_vec(), Digest::new(b"b")),
            DirEntry::dir(b"a".to_vec(), Digest::new(b"a")),
            DirEntry::symlink(b"c".to_vec(), b"/target".to_vec()),
        ];
        let blob = codec.encode(&entries, &BTreeMap::new()).unwrap();
        let (decoded, _) = codec.decode(&blob).unwrap();
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0].name, b"a");
        assert_eq!(decoded[2].name, b"c");
        assert_eq!(decoded[2].reference.as_bytes(), b"/target");
    }

    #[test]
    fn rejects_name_over_255_bytes() {
        let codec = MinimalCodec;
        let entries = vec![DirEntry::file(vec![b'x'; 256], Digest::new(b"x"))];
        assert!(matches!(
            codec.encode(&entries, &BTreeMap::new()),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn rejects_truncated_payload() {
        let codec = MinimalCodec;
        let err = codec.decode(&[1, 1, b'f', b'a']).unwrap_err();
        assert!(matches!(err, Error::BadDirectoryBlob(_)));
    }
}
