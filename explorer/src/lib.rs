//! Option discovery and artifact resolution over a pipeline results tree.
//!
//! The results tree is laid out as
//! `root/<subject>/<method>/<contrast>/<run group>/<artifact>` and is written
//! by an external pipeline that may still be running while it is browsed.
//! The crate keeps a strict separation:
//!
//! - **[`tree`]**: the read-only [`tree::TreeAccessor`] seam over a store.
//! - **[`core`]**: pure logic (levels, selection state machine, artifact
//!   naming and resolution). Everything goes through the accessor.
//! - **[`io`]**: filesystem-backed accessor and configuration.
//!
//! [`explorer`] ties them together into the facade consumed by the CLI and
//! the web UI.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod explorer;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tree;
