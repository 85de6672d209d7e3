//! Entry points that turn a git hook trigger into a [`RunContext`].

use std::path::Path;

use tracing::{debug, info};

use crate::core::context::{PushRefs, RunContext};
use crate::io::locator::ChangedFiles;

/// Staged changes about to be committed.
pub fn pre_commit_context(locator: &ChangedFiles) -> RunContext {
    let files = locator.files_from_staged_changes();
    info!(files = files.len(), "pre-commit files located");
    RunContext::PreCommit { files }
}

/// Files the current branch would publish, from the local and remote revisions.
pub fn pre_push_context(locator: &ChangedFiles) -> RunContext {
    let refs = PushRefs {
        local_ref: locator.local_ref().map(|r| r.trim().to_string()),
        local_sha: locator.local_revision().map(|r| r.trim().to_string()),
        remote_sha: locator.remote_revision(),
    };
    debug!(?refs, "resolved push refs");
    let files = locator.pushed_files(
        refs.local_ref.as_deref(),
        refs.local_sha.as_deref(),
        refs.remote_sha.as_deref(),
    );
    info!(files = files.len(), "pre-push files located");
    RunContext::PrePush { files, refs }
}

/// Files named in a unified diff supplied by the caller.
pub fn raw_diff_context(locator: &ChangedFiles, diff_text: &str) -> RunContext {
    let files = locator.files_from_raw_diff_text(diff_text);
    info!(files = files.len(), "raw diff files located");
    RunContext::RawDiff { files }
}

/// A manual run over explicit paths, or every tracked file when none are given.
pub fn run_context<P: AsRef<Path>>(locator: &ChangedFiles, paths: &[P]) -> RunContext {
    let files = if paths.is_empty() {
        locator.tracked_files()
    } else {
        locator.files_from_paths(paths)
    };
    info!(files = files.len(), "run files located");
    RunContext::Run { files }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::ContextKind;
    use crate::io::git::Git;
    use crate::test_support::{FakeInvoker, FakeResponse};
    use std::fs;
    use std::sync::Arc;

    fn locator(fake: FakeInvoker, root: &Path) -> ChangedFiles {
        ChangedFiles::new(Git::new(root, Arc::new(fake)), root, root)
    }

    #[test]
    fn pre_push_of_deleted_ref_has_no_files() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("a.js"), "x").expect("write");
        let fake = FakeInvoker::new()
            .on("git", &["symbolic-ref", "HEAD"], FakeResponse::ok("(delete)\n"))
            .on("git", &["rev-parse", "HEAD"], FakeResponse::ok("abc\n"))
            .on(
                "git",
                &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"],
                FakeResponse::ok("origin/main\n"),
            )
            .on(
                "git",
                &["ls-remote", "origin", "main"],
                FakeResponse::ok("def\trefs/heads/main\n"),
            );
        let ctx = pre_push_context(&locator(fake, temp.path()));
        assert_eq!(ctx.kind(), ContextKind::PrePush);
        assert!(ctx.files().is_empty());
        let refs = ctx.push_refs().expect("refs");
        assert_eq!(refs.local_ref.as_deref(), Some("(delete)"));
        assert_eq!(refs.remote_sha.as_deref(), Some("def"));
    }

    #[test]
    fn pre_push_uses_commit_range_when_remote_is_known() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("a.js"), "x").expect("write");
        let fake = FakeInvoker::new()
            .on("git", &["symbolic-ref", "HEAD"], FakeResponse::ok("refs/heads/main\n"))
            .on("git", &["rev-parse", "HEAD"], FakeResponse::ok("abc\n"))
            .on(
                "git",
                &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"],
                FakeResponse::ok("origin/main\n"),
            )
            .on(
                "git",
                &["ls-remote", "origin", "main"],
                FakeResponse::ok("def\trefs/heads/main\n"),
            )
            .on(
                "git",
                &["diff", "--name-only", "def..abc", "--oneline"],
                FakeResponse::ok("a.js\nmissing.js\n"),
            );
        let ctx = pre_push_context(&locator(fake, temp.path()));
        let names: Vec<String> = ctx.files().iter().map(|f| f.to_slash()).collect();
        assert_eq!(names, vec!["a.js"]);
    }

    #[test]
    fn run_without_paths_uses_tracked_files() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("tracked.rs"), "x").expect("write");
        let fake = FakeInvoker::new().on(
            "git",
            &["ls-files", "--full-name"],
            FakeResponse::ok("tracked.rs\nremoved.rs\n"),
        );
        let ctx = run_context::<&str>(&locator(fake, temp.path()), &[]);
        assert_eq!(ctx.kind(), ContextKind::Run);
        assert_eq!(ctx.files().len(), 1);
    }

    #[test]
    fn run_with_paths_keeps_existing_ones() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("here.rs"), "x").expect("write");
        let ctx = run_context(
            &locator(FakeInvoker::new(), temp.path()),
            &["here.rs", "nowhere.rs"],
        );
        let names: Vec<String> = ctx.files().iter().map(|f| f.to_slash()).collect();
        assert_eq!(names, vec!["here.rs"]);
    }

    #[test]
    fn raw_diff_context_parses_text() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("b.rs"), "x").expect("write");
        let diff = "diff --git a/b.rs b/b.rs\n--- a/b.rs\n+++ b/b.rs\n@@ -1 +1 @@\n-a\n+x\n";
        let ctx = raw_diff_context(&locator(FakeInvoker::new(), temp.path()), diff);
        assert_eq!(ctx.kind(), ContextKind::RawDiff);
        assert_eq!(ctx.files().len(), 1);
    }
}
