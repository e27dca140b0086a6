//! Filesystem-backed [`TreeAccessor`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::TreeError;
use crate::tree::{TreeAccessor, normalize_children, validate_segment, validate_segments};

/// Results tree rooted at a directory on disk.
///
/// Every call goes to the filesystem; nothing is cached, since the pipeline
/// keeps writing while the tree is browsed.
#[derive(Debug, Clone)]
pub struct FsTree {
    root: PathBuf,
}

impl FsTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn node_path(&self, prefix: &[&str]) -> PathBuf {
        let mut path = self.root.clone();
        path.extend(prefix);
        path
    }
}

impl TreeAccessor for FsTree {
    fn list_children(&self, prefix: &[&str]) -> Result<Vec<String>, TreeError> {
        validate_segments(prefix)?;
        let path = self.node_path(prefix);
        if !path.is_dir() {
            return Err(TreeError::not_found(path.display().to_string()));
        }
        let entries = fs::read_dir(&path).map_err(|source| match source.kind() {
            // Removed between the is_dir check and the read.
            io::ErrorKind::NotFound => TreeError::not_found(path.display().to_string()),
            _ => TreeError::Io {
                path: path.display().to_string(),
                source,
            },
        })?;

        let mut children = Vec::new();
        for entry in entries.flatten() {
            let entry_path = entry.path();
            if !entry_path.is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => children.push(name),
                Err(raw) => debug!(name = ?raw, "skipping non-UTF-8 directory name"),
            }
        }
        debug!(path = %path.display(), count = children.len(), "listed children");
        Ok(normalize_children(children))
    }

    fn exists(&self, prefix: &[&str]) -> bool {
        validate_segments(prefix).is_ok() && self.node_path(prefix).is_dir()
    }

    fn leaf_exists(&self, prefix: &[&str], file_name: &str) -> bool {
        if validate_segments(prefix).is_err() || validate_segment(file_name).is_err() {
            return false;
        }
        self.node_path(prefix).join(file_name).is_file()
    }

    fn locate(&self, prefix: &[&str], file_name: &str) -> PathBuf {
        self.node_path(prefix).join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_only_directories_sorted() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        fs::create_dir_all(root.join("sub-02")).expect("mkdir");
        fs::create_dir_all(root.join("sub-01")).expect("mkdir");
        fs::create_dir_all(root.join("Sub-03")).expect("mkdir");
        fs::write(root.join("README.txt"), "notes").expect("write");

        let tree = FsTree::new(root);
        assert_eq!(
            tree.list_children(&[]).expect("list"),
            vec!["Sub-03", "sub-01", "sub-02"]
        );
    }

    #[test]
    fn missing_prefix_is_not_found() {
        let temp = tempfile::tempdir().expect("tempdir");
        let tree = FsTree::new(temp.path());
        let err = tree.list_children(&["sub-01"]).unwrap_err();
        assert!(err.is_not_found());
        assert!(!tree.exists(&["sub-01"]));
    }

    #[test]
    fn file_prefix_is_not_found() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("sub-01"), "not a dir").expect("write");
        let tree = FsTree::new(temp.path());
        assert!(tree.list_children(&["sub-01"]).unwrap_err().is_not_found());
    }

    #[test]
    fn leaf_exists_requires_a_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join("sub-01").join("combined_total");
        fs::create_dir_all(dir.join("nested.png")).expect("mkdir");
        fs::write(dir.join("TOTAL_01_beta.png"), b"\x89PNG").expect("write");

        let tree = FsTree::new(temp.path());
        let prefix = ["sub-01", "combined_total"];
        assert!(tree.leaf_exists(&prefix, "TOTAL_01_beta.png"));
        assert!(!tree.leaf_exists(&prefix, "nested.png"));
        assert!(!tree.leaf_exists(&prefix, "../sub-01"));
        assert_eq!(
            tree.locate(&prefix, "TOTAL_01_beta.png"),
            dir.join("TOTAL_01_beta.png")
        );
    }

    #[test]
    fn traversal_segments_are_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let tree = FsTree::new(temp.path().join("results"));
        assert!(matches!(
            tree.list_children(&[".."]),
            Err(TreeError::InvalidSegment { .. })
        ));
        assert!(!tree.exists(&[".."]));
    }
}
