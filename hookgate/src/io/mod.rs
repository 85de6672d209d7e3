//! I/O for hookgate: configuration, processes, git and the changed-files locator.

pub mod config;
pub mod formatter;
pub mod git;
pub mod locator;
pub mod process;
