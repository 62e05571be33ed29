//! Encoding of a Unix device number as the opaque `val` string the codec
//! stores for `blockdev`/`chardev` entries (see `cas_fs`'s directory-entry
//! model). The encoding follows glibc's `gnu_dev_major`/`gnu_dev_minor`/
//! `gnu_dev_makedev` bit layout so it round-trips exactly through scan and
//! extract regardless of which libc the two sides happen to link.

pub fn major(dev: u64) -> u64 {
    ((dev >> 8) & 0xfff) | ((dev >> 32) & !0xfff)
}

pub fn minor(dev: u64) -> u64 {
    (dev & 0xff) | ((dev >> 12) & !0xff)
}

pub fn encode(dev: u64) -> String {
    format!("{}:{}", major(dev), minor(dev))
}

pub fn decode(s: &str) -> Option<u64> {
    let (maj, min) = s.split_once(':')?;
    let maj: u64 = maj.parse().ok()?;
    let min: u64 = min.parse().ok()?;
    Some(((maj & 0xfff) << 8) | (min & 0xff) | ((maj & !0xfff) << 32) | ((min & !0xff) << 12))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_encode_decode() {
        let dev = 0x0000_0801u64; // major 8, minor 1: a common /dev/sda1-style value
        let encoded = encode(dev);
        assert_eq!(decode(&encoded).unwrap(), dev);
    }
}
