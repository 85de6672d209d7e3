//! Git adapter for hookgate.
//!
//! Only read-only commands are issued. Each method returns the raw command
//! output; callers decide whether a failure is fatal or absorbed.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use tracing::{debug, trace};

use crate::io::process::{ProcessCommand, ProcessInvoker, ProcessOutput};

/// Wrapper for executing git commands in a working directory.
#[derive(Clone)]
pub struct Git {
    workdir: PathBuf,
    invoker: Arc<dyn ProcessInvoker>,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git").field("workdir", &self.workdir).finish()
    }
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>, invoker: Arc<dyn ProcessInvoker>) -> Self {
        Self {
            workdir: workdir.into(),
            invoker,
        }
    }

    /// Absolute path of the repository's top-level directory.
    pub fn top_level(&self) -> Result<PathBuf> {
        let out = self.run_capture(&["rev-parse", "--show-toplevel"])?;
        Ok(PathBuf::from(out.trim()))
    }

    /// `git symbolic-ref HEAD` (fails on detached HEAD).
    pub fn symbolic_ref_head(&self) -> Result<String> {
        Ok(self.run_capture(&["symbolic-ref", "HEAD"])?.trim().to_string())
    }

    /// `git rev-parse HEAD`.
    pub fn rev_parse_head(&self) -> Result<String> {
        Ok(self.run_capture(&["rev-parse", "HEAD"])?.trim().to_string())
    }

    /// Upstream of the current branch, e.g. `origin/main` (fails without one).
    pub fn upstream_ref(&self) -> Result<String> {
        let out = self.run_capture(&[
            "rev-parse",
            "--abbrev-ref",
            "--symbolic-full-name",
            "@{u}",
        ])?;
        Ok(out.trim().to_string())
    }

    /// `git ls-remote <remote> <branch>` raw output.
    pub fn ls_remote(&self, remote: &str, branch: &str) -> Result<String> {
        self.run_capture(&["ls-remote", remote, branch])
    }

    /// Names of files changed in `range`, one per line.
    pub fn diff_name_only(&self, range: &str) -> Result<String> {
        self.run_capture(&["diff", "--name-only", range, "--oneline"])
    }

    /// Unified diff of the index against HEAD.
    pub fn diff_staged(&self) -> Result<String> {
        self.run_capture(&[
            "diff",
            "--cached",
            "--no-color",
            "--no-ext-diff",
            "-M",
            "--full-index",
        ])
    }

    /// Unified diff of the working tree against `revision`.
    pub fn diff_against(&self, revision: &str) -> Result<String> {
        self.run_capture(&[
            "diff",
            "--no-color",
            "--no-ext-diff",
            "-M",
            "--full-index",
            revision,
        ])
    }

    /// Tracked files, one per line, relative to the top level.
    pub fn ls_files(&self) -> Result<String> {
        self.run_capture(&["ls-files", "--full-name"])
    }

    fn run_capture(&self, args: &[&str]) -> Result<String> {
        let output = self.run_checked(args)?;
        Ok(output.stdout)
    }

    fn run_checked(&self, args: &[&str]) -> Result<ProcessOutput> {
        let output = self.run(args)?;
        if !output.success() {
            return Err(anyhow!(
                "git {} failed: {}",
                args.join(" "),
                output.stderr.trim()
            ));
        }
        Ok(output)
    }

    fn run(&self, args: &[&str]) -> Result<ProcessOutput> {
        debug!(args = %args.join(" "), "running git");
        let command = ProcessCommand::new("git")
            .args(args.iter().copied())
            .current_dir(&self.workdir);
        let output = self.invoker.execute(&command)?;
        trace!(exit_code = ?output.exit_code, stdout = %output.stdout, "git finished");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeInvoker, FakeResponse};
    use std::path::Path;

    #[test]
    fn commands_run_in_workdir_with_exact_arguments() {
        let fake = Arc::new(FakeInvoker::new().on(
            "git",
            &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"],
            FakeResponse::ok("origin/main\n"),
        ));
        let git = Git::new("/repo", fake.clone());
        assert_eq!(git.upstream_ref().expect("upstream"), "origin/main");

        let calls = fake.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].workdir.as_deref(), Some(Path::new("/repo")));
    }

    #[test]
    fn non_zero_exit_becomes_error_with_stderr() {
        let fake = Arc::new(FakeInvoker::new().on(
            "git",
            &["symbolic-ref", "HEAD"],
            FakeResponse::fail(128, "fatal: ref HEAD is not a symbolic ref"),
        ));
        let git = Git::new("/repo", fake);
        let err = git.symbolic_ref_head().unwrap_err();
        assert!(err.to_string().contains("git symbolic-ref HEAD failed"));
        assert!(err.to_string().contains("not a symbolic ref"));
    }

    #[test]
    fn diff_name_only_uses_range_and_oneline() {
        let fake = Arc::new(FakeInvoker::new().on(
            "git",
            &["diff", "--name-only", "abc..HEAD", "--oneline"],
            FakeResponse::ok("a.js\n"),
        ));
        let git = Git::new("/repo", fake);
        assert_eq!(git.diff_name_only("abc..HEAD").expect("diff"), "a.js\n");
    }
}
