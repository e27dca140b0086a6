//! Stable exit codes for explorer CLI commands.

/// Command succeeded, or the resolved artifact is ready.
pub const OK: i32 = 0;
/// Invalid arguments, config, or selection.
pub const INVALID: i32 = 1;
/// The artifact's directory exists but the file does not.
pub const MISSING: i32 = 2;
/// The artifact's directory does not exist yet.
pub const PENDING: i32 = 3;
/// The configured results root does not exist.
pub const ROOT_NOT_FOUND: i32 = 4;
