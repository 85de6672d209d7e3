//! Changed-files locator: turns "what changed" triggers into a file set.
//!
//! Repository-state queries fail open. Any git failure here (no upstream,
//! detached HEAD, unrelated histories, unknown revision) is logged and turned
//! into an empty collection or a `None` sentinel, so a broken git state never
//! prevents the hook from at least attempting its tasks.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use crate::core::context::DELETE_MARKER;
use crate::core::diff::{DiffRecord, parse_unified_diff, unquote};
use crate::core::files::{FileEntry, FilesCollection};
use crate::core::path::relative_to;
use crate::io::git::Git;

/// Revision used when a range has no explicit end and for the no-upstream fallback.
pub const HEAD: &str = "HEAD";

/// Locates changed files from git state or raw diff text.
#[derive(Debug, Clone)]
pub struct ChangedFiles {
    git: Git,
    /// Directory git reports paths relative to.
    repo_root: PathBuf,
    /// Directory all returned paths are relative to.
    project_dir: PathBuf,
}

impl ChangedFiles {
    pub fn new(git: Git, repo_root: impl Into<PathBuf>, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            git,
            repo_root: repo_root.into(),
            project_dir: project_dir.into(),
        }
    }

    /// Build a locator for `project_dir`, asking git for the repository root.
    ///
    /// Falls back to `project_dir` itself when git cannot tell.
    pub fn discover(git: Git, project_dir: impl Into<PathBuf>) -> Self {
        let project_dir = project_dir.into();
        let repo_root = match git.top_level() {
            Ok(root) => root,
            Err(err) => {
                warn!(err = %err, "cannot resolve repository root, using project dir");
                project_dir.clone()
            }
        };
        Self::new(git, repo_root, project_dir)
    }

    /// Files with staged changes (pre-commit).
    #[instrument(skip_all)]
    pub fn files_from_staged_changes(&self) -> FilesCollection {
        match self.git.diff_staged() {
            Ok(text) => self.files_from_diff(&parse_unified_diff(&text)),
            Err(err) => {
                warn!(err = %err, "staged diff failed, treating as no changes");
                FilesCollection::new()
            }
        }
    }

    /// Files changed between `from` and `to`; a missing or empty `to` means `HEAD`.
    #[instrument(skip_all, fields(from, to))]
    pub fn files_from_commit_range(&self, from: &str, to: Option<&str>) -> FilesCollection {
        let to = match to.map(str::trim) {
            Some(to) if !to.is_empty() => to,
            _ => HEAD,
        };
        let range = format!("{}..{}", from.trim(), to);
        let names = match self.git.diff_name_only(&range) {
            Ok(names) => names,
            Err(err) => {
                warn!(range = %range, err = %err, "commit range diff failed, treating as no changes");
                return FilesCollection::new();
            }
        };
        let files = names
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|name| self.existing_entry(&unquote(name)))
            .collect::<FilesCollection>();
        debug!(range = %range, count = files.len(), "located files from commit range");
        files
    }

    /// Files named by a unified diff given as text (e.g. read from stdin).
    pub fn files_from_raw_diff_text(&self, diff_text: &str) -> FilesCollection {
        self.files_from_diff(&parse_unified_diff(diff_text))
    }

    /// Files differing between the working tree and `revision`, routed through
    /// the raw-diff path.
    #[instrument(skip_all, fields(revision))]
    pub fn files_against_revision(&self, revision: &str) -> FilesCollection {
        match self.git.diff_against(revision) {
            Ok(text) => self.files_from_raw_diff_text(&text),
            Err(err) => {
                warn!(revision, err = %err, "diff against revision failed, treating as no changes");
                FilesCollection::new()
            }
        }
    }

    /// All tracked files that exist on disk.
    pub fn tracked_files(&self) -> FilesCollection {
        match self.git.ls_files() {
            Ok(names) => names
                .lines()
                .filter(|line| !line.is_empty())
                .filter_map(|name| self.existing_entry(&unquote(name)))
                .collect(),
            Err(err) => {
                warn!(err = %err, "ls-files failed, treating as no files");
                FilesCollection::new()
            }
        }
    }

    /// Explicit paths relative to the project directory, keeping those that exist.
    pub fn files_from_paths<P: AsRef<Path>>(&self, paths: &[P]) -> FilesCollection {
        paths
            .iter()
            .filter_map(|path| {
                let path = path.as_ref();
                let absolute = if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    self.project_dir.join(path)
                };
                self.keep_if_exists(relative_to(&absolute, &self.project_dir))
            })
            .collect()
    }

    /// Current symbolic ref, `None` on detached HEAD or git failure.
    pub fn local_ref(&self) -> Option<String> {
        absorb("symbolic-ref HEAD", self.git.symbolic_ref_head())
    }

    /// Current commit hash.
    pub fn local_revision(&self) -> Option<String> {
        absorb("rev-parse HEAD", self.git.rev_parse_head())
    }

    /// Commit hash of the upstream branch on its remote.
    ///
    /// `None` is the "no remote" sentinel: no tracking branch, unreachable
    /// remote, or a branch the remote does not have yet.
    #[instrument(skip_all)]
    pub fn remote_revision(&self) -> Option<String> {
        let upstream = absorb("upstream lookup", self.git.upstream_ref())?;
        let Some((remote, branch)) = upstream.split_once('/') else {
            warn!(upstream = %upstream, "upstream ref has no remote prefix");
            return None;
        };
        let listing = absorb("ls-remote", self.git.ls_remote(remote, branch))?;
        let sha = listing
            .lines()
            .next()
            .and_then(|line| line.split('\t').next())
            .map(str::trim)
            .filter(|sha| !sha.is_empty())
            .map(str::to_string);
        debug!(remote, branch, found = sha.is_some(), "resolved remote revision");
        sha
    }

    /// Files a push would publish.
    ///
    /// A deleted ref has nothing to lint. Without a remote revision (new branch,
    /// no upstream) the working tree is diffed against `HEAD`; otherwise the
    /// commit range `remote..local` is used.
    #[instrument(skip_all)]
    pub fn pushed_files(
        &self,
        local_ref: Option<&str>,
        local_sha: Option<&str>,
        remote_sha: Option<&str>,
    ) -> FilesCollection {
        if local_ref == Some(DELETE_MARKER) {
            debug!("pushed ref is a deletion, nothing to check");
            return FilesCollection::new();
        }
        match remote_sha.map(str::trim).filter(|sha| !sha.is_empty()) {
            None => {
                debug!("no remote revision, falling back to diff against HEAD");
                self.files_against_revision(HEAD)
            }
            Some(remote_sha) => self.files_from_commit_range(remote_sha, local_sha),
        }
    }

    /// Apply the diff filtering rule: skip deletions, take new names of
    /// renames, make paths project-relative, and keep only files on disk.
    fn files_from_diff(&self, diff: &DiffRecord) -> FilesCollection {
        let mut files = FilesCollection::new();
        for change in &diff.files {
            if change.is_deletion() {
                continue;
            }
            let Some(name) = change.current_name() else {
                continue;
            };
            if let Some(entry) = self.existing_entry(name) {
                files.insert(entry);
            }
        }
        debug!(changes = diff.files.len(), kept = files.len(), "filtered diff");
        files
    }

    /// Rewrite a git-reported path relative to the project dir and keep it if it exists.
    fn existing_entry(&self, git_path: &str) -> Option<FileEntry> {
        let git_path = Path::new(git_path);
        let absolute = if git_path.is_absolute() {
            git_path.to_path_buf()
        } else {
            self.repo_root.join(git_path)
        };
        self.keep_if_exists(relative_to(&absolute, &self.project_dir))
    }

    fn keep_if_exists(&self, relative: PathBuf) -> Option<FileEntry> {
        if self.project_dir.join(&relative).is_file() {
            Some(FileEntry::new(relative))
        } else {
            debug!(path = %relative.display(), "skipping path missing on disk");
            None
        }
    }
}

fn absorb(what: &str, result: anyhow::Result<String>) -> Option<String> {
    match result {
        Ok(value) if !value.trim().is_empty() => Some(value),
        Ok(_) => None,
        Err(err) => {
            debug!(what, err = %err, "git query failed, using sentinel");
            None
        }
    }
}
