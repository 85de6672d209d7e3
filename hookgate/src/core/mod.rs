//! Deterministic, pure logic shared by hookgate.
//!
//! Core modules are free of I/O side effects: paths, file collections, diff
//! parsing, run contexts and results are plain in-memory data.

pub mod context;
pub mod diff;
pub mod files;
pub mod path;
pub mod types;
