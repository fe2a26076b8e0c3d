//! Content hashing
//!
//! This module provides:
//! - The `Digest` accumulator contract and its MD5 implementation
//! - `FileHasher`, which streams one file through a private digest

pub mod digest;
pub mod hasher;

pub use digest::{Digest, Fingerprint, Md5Digest, FINGERPRINT_LEN};
pub use hasher::{Digested, FileHasher, StreamHasher, DEFAULT_CHUNK_SIZE};
