//! I/O adapters for the explorer.

pub mod config;
pub mod fs_tree;
