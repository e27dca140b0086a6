//! Deterministic, pure logic shared by the explorer.
//!
//! Core modules never touch storage directly. They read through a
//! [`crate::tree::TreeAccessor`], so every rule here can be exercised against
//! an in-memory tree.

pub mod artifact;
pub mod level;
pub mod resolver;
pub mod selection;
