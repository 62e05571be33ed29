use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// A BLAKE3 content digest.
///
/// This is the identifier under which every blob in a [`Cas`](crate::Cas) is
/// addressed: two blobs with the same bytes always produce the same
/// `Digest`, and a `Digest` never identifies more than one set of bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest(blake3::Hash);

impl Digest {
    /// Digest of the empty byte string. Every codec's "empty directory"
    /// shortcut is keyed off this constant rather than re-hashing `&[]`.
    pub const EMPTY: Digest = Digest(blake3::Hash::from_bytes([
        175, 19, 73, 185, 245, 249, 161, 166, 160, 64, 77, 234, 54, 220, 201, 159, 28, 155, 69,
        59, 151, 232, 31, 213, 76, 197, 112, 192, 34, 108, 54, 229,
    ]));

    pub fn new(bytes: &[u8]) -> Self {
        Digest(blake3::hash(bytes))
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Digest(blake3::Hash::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }

    /// First 5 bytes, hex-encoded. Used in log lines where the full digest
    /// would dominate the output.
    pub fn fmt_short(&self) -> String {
        self.to_hex()[..10].to_string()
    }
}

impl Borrow<[u8]> for Digest {
    fn borrow(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl Borrow<[u8; 32]> for Digest {
    fn borrow(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.fmt_short())
    }
}

#[derive(thiserror::Error, Debug)]
#[error("invalid digest string: {0}")]
pub struct ParseDigestError(String);

impl FromStr for Digest {
    type Err = ParseDigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hash = blake3::Hash::from_hex(s).map_err(|_| ParseDigestError(s.to_string()))?;
        Ok(Digest(hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_matches_blake3_of_empty_slice() {
        assert_eq!(Digest::EMPTY, Digest::new(b""));
    }

    #[test]
    fn hex_round_trips() {
        let d = Digest::new(b"hello world");
        let parsed: Digest = d.to_hex().parse().unwrap();
        assert_eq!(d, parsed);
    }

    #[test]
    fn distinct_content_distinct_digest() {
        assert_ne!(Digest::new(b"a"), Digest::new(b"b"));
    }
}
