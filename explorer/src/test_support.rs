//! Test-only in-memory results tree.

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::error::TreeError;
use crate::tree::{TreeAccessor, display_prefix, normalize_children, validate_segments};

/// Mutable in-memory tree standing in for the pipeline's output directory.
///
/// Paths are `/`-separated strings relative to the root. Tests mutate the tree
/// between queries to simulate the pipeline writing or removing outputs.
#[derive(Debug, Clone)]
pub struct MemoryTree {
    root_exists: bool,
    dirs: BTreeSet<Vec<String>>,
    files: BTreeSet<Vec<String>>,
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTree {
    /// Empty tree whose root exists.
    pub fn new() -> Self {
        Self {
            root_exists: true,
            dirs: BTreeSet::new(),
            files: BTreeSet::new(),
        }
    }

    /// Tree whose configured root is absent.
    pub fn missing_root() -> Self {
        Self {
            root_exists: false,
            ..Self::new()
        }
    }

    /// Create a directory and all its ancestors.
    pub fn add_dir(&mut self, path: &str) {
        self.root_exists = true;
        let segments = split(path);
        for depth in 1..=segments.len() {
            self.dirs.insert(segments[..depth].to_vec());
        }
    }

    /// Create a file, creating its parent directories.
    pub fn add_file(&mut self, path: &str) {
        let segments = split(path);
        if let Some((_, parent)) = segments.split_last() {
            self.add_dir(&parent.join("/"));
        }
        self.files.insert(segments);
    }

    /// Remove a directory or file and everything below it.
    pub fn remove(&mut self, path: &str) {
        let segments = split(path);
        self.dirs.retain(|dir| !dir.starts_with(&segments));
        self.files.retain(|file| !file.starts_with(&segments));
    }

    fn has_dir(&self, prefix: &[&str]) -> bool {
        if prefix.is_empty() {
            return self.root_exists;
        }
        self.dirs
            .iter()
            .any(|dir| dir.len() == prefix.len() && dir.iter().zip(prefix).all(|(a, b)| a == b))
    }
}

impl TreeAccessor for MemoryTree {
    fn list_children(&self, prefix: &[&str]) -> Result<Vec<String>, TreeError> {
        validate_segments(prefix)?;
        if !self.has_dir(prefix) {
            return Err(TreeError::not_found(display_prefix(prefix)));
        }
        let children = self
            .dirs
            .iter()
            .filter(|dir| {
                dir.len() == prefix.len() + 1 && dir.iter().zip(prefix).all(|(a, b)| a == b)
            })
            .filter_map(|dir| dir.last().cloned())
            .collect();
        Ok(normalize_children(children))
    }

    fn exists(&self, prefix: &[&str]) -> bool {
        validate_segments(prefix).is_ok() && self.has_dir(prefix)
    }

    fn leaf_exists(&self, prefix: &[&str], file_name: &str) -> bool {
        if validate_segments(prefix).is_err() || validate_segments(&[file_name]).is_err() {
            return false;
        }
        self.files.iter().any(|file| {
            file.len() == prefix.len() + 1
                && file.iter().zip(prefix).all(|(a, b)| a == b)
                && file.last().is_some_and(|name| name == file_name)
        })
    }

    fn locate(&self, prefix: &[&str], file_name: &str) -> PathBuf {
        prefix.iter().chain([&file_name]).collect()
    }
}

fn split(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_children_of_missing_prefix_is_not_found() {
        let tree = MemoryTree::new();
        let err = tree.list_children(&["sub-01"]).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn files_are_not_listed_as_children() {
        let mut tree = MemoryTree::new();
        tree.add_file("sub-01/notes.txt");
        tree.add_dir("sub-01/methodA");
        assert_eq!(tree.list_children(&["sub-01"]).expect("list"), vec!["methodA"]);
        assert!(tree.leaf_exists(&["sub-01"], "notes.txt"));
        assert!(!tree.exists(&["sub-01", "notes.txt"]));
    }

    #[test]
    fn missing_root_has_no_children() {
        let tree = MemoryTree::missing_root();
        assert!(!tree.exists(&[]));
        assert!(tree.list_children(&[]).unwrap_err().is_not_found());
    }
}
