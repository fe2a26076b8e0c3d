//! JSON artifacts for hash mappings
//!
//! An artifact is a single JSON object mapping each canonical path to its
//! lowercase hex fingerprint. Keys are written in sorted order with a
//! one-space indent and a trailing newline, so repeated runs over the same
//! tree produce byte-identical files.
//!
//! Writes go to a temp file in the target directory and are renamed into
//! place, so a failed write never leaves a truncated artifact behind.

use crate::content::Fingerprint;
use crate::error::{SinkError, SinkResult};
use crate::hashes::FileHashes;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Render a mapping as artifact JSON
pub fn to_json(hashes: &FileHashes) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    encode(hashes, &mut buf)?;
    // serde_json only ever emits UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn encode<W: Write>(hashes: &FileHashes, writer: W) -> serde_json::Result<()> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
    let mut ser = serde_json::Serializer::with_formatter(writer, formatter);
    hashes.sorted().serialize(&mut ser)?;

    let mut writer = ser.into_inner();
    writer.write_all(b"\n").map_err(serde_json::Error::io)?;
    Ok(())
}

/// Write `hashes` to `path`, replacing any existing file
pub fn write_artifact(path: &Path, hashes: &FileHashes) -> SinkResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let io_err = |source: std::io::Error| SinkError::Io {
        path: path.to_path_buf(),
        source,
    };

    let tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        encode(hashes, &mut writer).map_err(|source| SinkError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        writer.flush().map_err(io_err)?;
    }
    tmp.as_file().sync_all().map_err(io_err)?;

    tmp.persist(path).map_err(|e| SinkError::Persist {
        path: path.to_path_buf(),
        reason: e.error.to_string(),
    })?;

    debug!(path = %path.display(), entries = hashes.len(), "Artifact written");
    Ok(())
}

/// Load an artifact back into a mapping
pub fn read_artifact(path: &Path) -> SinkResult<FileHashes> {
    let text = fs::read_to_string(path).map_err(|source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let entries: BTreeMap<String, Fingerprint> =
        serde_json::from_str(&text).map_err(|source| SinkError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(entries.into_iter().collect())
}

/// Remove an artifact left by an earlier run
///
/// Called when the run that would have replaced it failed, so a stale file
/// is never mistaken for this run's result. Returns true if a file was removed.
pub fn discard_artifact(path: &Path) -> SinkResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Discarded stale artifact");
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(SinkError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Remove stale artifacts left at each of `paths`
///
/// A path that cannot be removed is logged and skipped. Returns how many
/// artifacts were removed.
pub fn discard_stale<P: AsRef<Path>>(paths: &[P]) -> usize {
    let mut removed = 0;
    for path in paths {
        let path = path.as_ref();
        match discard_artifact(path) {
            Ok(true) => {
                warn!(path = %path.display(), "Removed stale artifact from a previous run");
                removed += 1;
            }
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Stale artifact could not be removed"),
        }
    }
    removed
}
