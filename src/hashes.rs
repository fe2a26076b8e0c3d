//! Path to fingerprint mapping
//!
//! `FileHashes` is the result of a run: one entry per hashed file, keyed by
//! the file's path relative to the root with `/` separators. Iteration order
//! is unspecified; `sorted` gives the canonical order used for output.

use crate::content::Fingerprint;
use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path};

/// Mapping from canonical path key to fingerprint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileHashes {
    entries: HashMap<String, Fingerprint>,
}

impl FileHashes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning the previous fingerprint for the key
    pub fn insert(&mut self, key: String, fingerprint: Fingerprint) -> Option<Fingerprint> {
        self.entries.insert(key, fingerprint)
    }

    pub fn get(&self, key: &str) -> Option<&Fingerprint> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Fingerprint)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries in lexicographic key order
    pub fn sorted(&self) -> BTreeMap<&str, Fingerprint> {
        self.iter().map(|(k, v)| (k, *v)).collect()
    }

    /// Set comparison against another mapping
    pub fn diff(&self, other: &FileHashes) -> HashDiff {
        let mut diff = HashDiff::default();

        for (key, fingerprint) in &self.entries {
            match other.entries.get(key) {
                None => diff.only_left.push(key.clone()),
                Some(theirs) if theirs != fingerprint => diff.mismatched.push(key.clone()),
                Some(_) => {}
            }
        }

        diff.only_right = other
            .entries
            .keys()
            .filter(|key| !self.entries.contains_key(*key))
            .cloned()
            .collect();

        diff.only_left.sort();
        diff.only_right.sort();
        diff.mismatched.sort();
        diff
    }
}

impl FromIterator<(String, Fingerprint)> for FileHashes {
    fn from_iter<I: IntoIterator<Item = (String, Fingerprint)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for FileHashes {
    type Item = (String, Fingerprint);
    type IntoIter = std::collections::hash_map::IntoIter<String, Fingerprint>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Keys that differ between two mappings (each list sorted)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashDiff {
    pub only_left: Vec<String>,
    pub only_right: Vec<String>,
    pub mismatched: Vec<String>,
}

impl HashDiff {
    /// True when both mappings are set-equal
    pub fn is_empty(&self) -> bool {
        self.only_left.is_empty() && self.only_right.is_empty() && self.mismatched.is_empty()
    }
}

/// Canonical mapping key for `path` found under `root`
///
/// The key is relative to `root` and joined with `/` on every platform. When
/// `path` is the root itself (a root that is a regular file) the file name is
/// used.
pub fn canonical_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);

    let parts: Vec<_> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        return path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
    }

    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(byte: u8) -> Fingerprint {
        Fingerprint::from_bytes([byte; 16])
    }

    #[test]
    fn test_canonical_key() {
        let root = Path::new("data");
        assert_eq!(canonical_key(root, &root.join("a.txt")), "a.txt");
        assert_eq!(canonical_key(root, &root.join("sub").join("b.txt")), "sub/b.txt");
        assert_eq!(canonical_key(root, Path::new("data/x/./y.txt")), "x/y.txt");
    }

    #[test]
    fn test_canonical_key_for_file_root() {
        let root = Path::new("/tmp/single.txt");
        assert_eq!(canonical_key(root, root), "single.txt");
    }

    #[test]
    fn test_sorted_order() {
        let hashes: FileHashes = [
            ("sub/b.txt".to_string(), fp(2)),
            ("a.txt".to_string(), fp(1)),
            ("Z.txt".to_string(), fp(3)),
        ]
        .into_iter()
        .collect();

        let keys: Vec<_> = hashes.sorted().into_keys().collect();
        assert_eq!(keys, vec!["Z.txt", "a.txt", "sub/b.txt"]);
    }

    #[test]
    fn test_diff() {
        let left: FileHashes = [
            ("same".to_string(), fp(1)),
            ("changed".to_string(), fp(2)),
            ("left".to_string(), fp(3)),
        ]
        .into_iter()
        .collect();
        let right: FileHashes = [
            ("same".to_string(), fp(1)),
            ("changed".to_string(), fp(9)),
            ("right".to_string(), fp(4)),
        ]
        .into_iter()
        .collect();

        let diff = left.diff(&right);
        assert_eq!(diff.only_left, vec!["left"]);
        assert_eq!(diff.only_right, vec!["right"]);
        assert_eq!(diff.mismatched, vec!["changed"]);
        assert!(!diff.is_empty());

        assert!(left.diff(&left.clone()).is_empty());
    }
}
