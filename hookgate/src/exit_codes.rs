//! Stable exit codes for hookgate commands.

/// Every blocking task passed (or nothing had to run).
pub const OK: i32 = 0;
/// At least one blocking task failed.
pub const FAILED: i32 = 1;
/// Hookgate itself could not complete: bad configuration, a task that could
/// not start, or any other error.
pub const FAULT: i32 = 2;
