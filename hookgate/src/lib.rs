//! Quality-gate runner for git hooks.
//!
//! Hookgate works out which files a commit or push touches, then runs a
//! configured list of checks against them and reports whether the hook may
//! proceed. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (paths, file sets, diff parsing,
//!   contexts, results). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config files, git, process
//!   execution). External commands go through one injectable invoker.
//!
//! [`hooks`] builds the run context for each trigger, [`task`] defines the
//! checks and [`runner`] sequences them.

pub mod core;
pub mod exit_codes;
pub mod hooks;
pub mod io;
pub mod logging;
pub mod report;
pub mod runner;
pub mod task;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
