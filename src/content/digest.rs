//! Digest accumulators and fingerprints
//!
//! A `Digest` folds a byte stream into a fixed-length `Fingerprint`. The
//! accumulator is reusable: `finalize` hands back the result and leaves the
//! state reset, so one instance can hash any number of files in turn.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Fingerprint length in bytes (MD5)
pub const FINGERPRINT_LEN: usize = 16;

/// Fixed-length content fingerprint
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    pub fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    /// Lowercase hex rendering (32 characters)
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl FromStr for Fingerprint {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = <[u8; FINGERPRINT_LEN] as hex::FromHex>::from_hex(s)?;
        Ok(Self(bytes))
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Streaming digest accumulator
pub trait Digest {
    /// Clear internal state for reuse
    fn reset(&mut self);

    /// Fold a chunk of input
    fn update(&mut self, bytes: &[u8]);

    /// Digest of every byte fed since the last reset
    ///
    /// The accumulator is reset afterwards.
    fn finalize(&mut self) -> Fingerprint;
}

/// MD5 accumulator backed by the `md5` crate
#[derive(Clone)]
pub struct Md5Digest {
    context: md5::Context,
}

impl Md5Digest {
    pub fn new() -> Self {
        Self {
            context: md5::Context::new(),
        }
    }
}

impl Default for Md5Digest {
    fn default() -> Self {
        Self::new()
    }
}

impl Digest for Md5Digest {
    fn reset(&mut self) {
        self.context = md5::Context::new();
    }

    fn update(&mut self, bytes: &[u8]) {
        self.context.consume(bytes);
    }

    fn finalize(&mut self) -> Fingerprint {
        let context = std::mem::replace(&mut self.context, md5::Context::new());
        Fingerprint(context.compute().0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn md5_hex(data: &[u8]) -> String {
        let mut digest = Md5Digest::new();
        digest.update(data);
        digest.finalize().to_hex()
    }

    #[test]
    fn test_known_vectors() {
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(md5_hex(b"hello"), "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(md5_hex(b"world"), "7d793037a0760186574b0282f2f435e7");
    }

    #[test]
    fn test_split_updates_match_single_update() {
        let mut digest = Md5Digest::new();
        digest.update(b"hel");
        digest.update(b"");
        digest.update(b"lo");
        assert_eq!(digest.finalize().to_hex(), md5_hex(b"hello"));
    }

    #[test]
    fn test_reset_discards_pending_input() {
        let mut digest = Md5Digest::new();
        digest.update(b"garbage");
        digest.reset();
        digest.update(b"world");
        assert_eq!(digest.finalize().to_hex(), md5_hex(b"world"));
    }

    #[test]
    fn test_finalize_leaves_accumulator_reset() {
        let mut digest = Md5Digest::new();
        digest.update(b"hello");
        let _ = digest.finalize();
        assert_eq!(digest.finalize().to_hex(), md5_hex(b""));
    }

    #[test]
    fn test_fingerprint_parse() {
        let fp: Fingerprint = "5d41402abc4b2a76b9719d911017c592".parse().unwrap();
        assert_eq!(fp.to_string(), "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(fp.as_bytes()[0], 0x5d);

        assert!("5d41".parse::<Fingerprint>().is_err());
        assert!("zz41402abc4b2a76b9719d911017c592".parse::<Fingerprint>().is_err());
    }
}
