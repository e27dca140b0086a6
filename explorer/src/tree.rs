//! Read-only access to a hierarchical results store.

use std::path::PathBuf;

use crate::error::TreeError;

/// Read abstraction over the results tree.
///
/// Implementations hold no cache: every call re-reads the backing store, and
/// two consecutive calls may observe different states while the pipeline
/// writes. Prefixes are sequences of path segments below the root; the empty
/// prefix is the root itself.
pub trait TreeAccessor {
    /// Child directory names of `prefix`, sorted ascending by byte value.
    ///
    /// Fails with [`TreeError::NotFound`] if `prefix` is not an existing
    /// directory-like node.
    fn list_children(&self, prefix: &[&str]) -> Result<Vec<String>, TreeError>;

    fn exists(&self, prefix: &[&str]) -> bool;

    fn leaf_exists(&self, prefix: &[&str], file_name: &str) -> bool;

    /// Locator for a leaf, as handed back to the presentation layer.
    fn locate(&self, prefix: &[&str], file_name: &str) -> PathBuf;
}

impl<T: TreeAccessor + ?Sized> TreeAccessor for &T {
    fn list_children(&self, prefix: &[&str]) -> Result<Vec<String>, TreeError> {
        (**self).list_children(prefix)
    }

    fn exists(&self, prefix: &[&str]) -> bool {
        (**self).exists(prefix)
    }

    fn leaf_exists(&self, prefix: &[&str], file_name: &str) -> bool {
        (**self).leaf_exists(prefix, file_name)
    }

    fn locate(&self, prefix: &[&str], file_name: &str) -> PathBuf {
        (**self).locate(prefix, file_name)
    }
}

/// Reject segments that are empty or would escape their parent.
pub fn validate_segment(segment: &str) -> Result<(), TreeError> {
    let invalid = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0']);
    if invalid {
        return Err(TreeError::InvalidSegment {
            segment: segment.to_string(),
        });
    }
    Ok(())
}

pub fn validate_segments(prefix: &[&str]) -> Result<(), TreeError> {
    prefix.iter().try_for_each(|segment| validate_segment(segment))
}

/// Sort ascending by byte value and drop duplicates.
pub fn normalize_children(mut children: Vec<String>) -> Vec<String> {
    children.sort_unstable();
    children.dedup();
    children
}

/// `/`-joined display form of a prefix, used in errors and logs.
pub fn display_prefix(prefix: &[&str]) -> String {
    if prefix.is_empty() {
        return "/".to_string();
    }
    prefix.join("/")
}
