//! Stable exit codes for farmer CLI commands.

/// Command succeeded or a zone was selected.
pub const OK: i32 = 0;
/// Invalid accounts/config or another startup error.
pub const INVALID: i32 = 1;
/// `farmer select` found no zone worth joining.
pub const NO_ZONE: i32 = 2;
/// `farmer run` ended because every agent stopped.
pub const STOPPED: i32 = 3;
