//! Depth-first discovery of regular files
//!
//! Both strategies enumerate the tree through `RegularFiles`, so they agree
//! on which entries count as files:
//! - symlinks are not followed and are skipped
//! - sockets, FIFOs and device nodes are skipped
//! - directories are descended into, never yielded

use crate::error::TraversalError;
use crate::walker::stats::RunStats;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::trace;
use walkdir::WalkDir;

/// Iterator over the regular files under a root
pub struct RegularFiles {
    root: PathBuf,
    inner: walkdir::IntoIter,
    stats: Arc<RunStats>,
}

impl RegularFiles {
    pub fn new(root: &Path, stats: Arc<RunStats>) -> Self {
        let inner = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        Self {
            root: root.to_path_buf(),
            inner,
            stats,
        }
    }
}

impl Iterator for RegularFiles {
    type Item = Result<PathBuf, TraversalError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(TraversalError::from_walkdir(&self.root, e))),
            };

            let file_type = entry.file_type();
            if file_type.is_file() {
                self.stats.record_discovered();
                return Some(Ok(entry.into_path()));
            }

            if !file_type.is_dir() {
                trace!(path = %entry.path().display(), "Skipping non-regular entry");
                self.stats.record_skip();
            }
        }
    }
}
