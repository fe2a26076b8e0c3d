//! Single-path file hashing
//!
//! `StreamHasher` opens one file and streams it through its own digest in
//! fixed-size chunks. The chunk size only tunes throughput; any positive size
//! yields the same fingerprint.

use crate::content::digest::{Digest, Fingerprint, Md5Digest};
use crate::error::{FileError, FileResult};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Default read buffer (matches the classic 32 KiB copy buffer)
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;

/// Fingerprint of one file plus the number of bytes digested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Digested {
    pub fingerprint: Fingerprint,
    pub bytes: u64,
}

/// Hashes one file at a time
///
/// Implementations own their accumulator. The pipeline gives every worker
/// its own clone, so no hashing state is ever shared between threads.
pub trait FileHasher: Send {
    fn hash(&mut self, path: &Path) -> FileResult<Digested>;
}

/// Streams file content through a digest in `chunk_size` reads
#[derive(Clone)]
pub struct StreamHasher<D = Md5Digest> {
    digest: D,
    buffer: Vec<u8>,
}

impl StreamHasher<Md5Digest> {
    /// MD5 hasher with the given chunk size (at least 1)
    pub fn new(chunk_size: usize) -> Self {
        Self::with_digest(Md5Digest::new(), chunk_size)
    }
}

impl Default for StreamHasher<Md5Digest> {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl<D: Digest> StreamHasher<D> {
    pub fn with_digest(digest: D, chunk_size: usize) -> Self {
        Self {
            digest,
            buffer: vec![0; chunk_size.max(1)],
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.buffer.len()
    }

    /// Digest everything `reader` yields
    ///
    /// The accumulator is reset first, so a previous failed file cannot leak
    /// bytes into this one.
    pub fn hash_reader<R: Read>(&mut self, mut reader: R) -> io::Result<Digested> {
        self.digest.reset();
        let mut total = 0u64;

        loop {
            let count = match reader.read(&mut self.buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            self.digest.update(&self.buffer[..count]);
            total += count as u64;
        }

        Ok(Digested {
            fingerprint: self.digest.finalize(),
            bytes: total,
        })
    }
}

impl<D: Digest + Send> FileHasher for StreamHasher<D> {
    fn hash(&mut self, path: &Path) -> FileResult<Digested> {
        let file = File::open(path).map_err(|source| FileError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        // `file` is dropped on every return path below
        self.hash_reader(file).map_err(|source| FileError::Read {
            path: path.to_path_buf(),
            source,
        })
    }
}
