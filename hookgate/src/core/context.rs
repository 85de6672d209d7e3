//! The immutable description of why the pipeline runs and which files apply.

use serde::Serialize;

use crate::core::files::FilesCollection;

/// Local ref reported by git for a ref that is being deleted by the push.
pub const DELETE_MARKER: &str = "(delete)";

/// Discriminant of a [`RunContext`], used for predicates and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    PreCommit,
    PrePush,
    Run,
    RawDiff,
}

impl ContextKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ContextKind::PreCommit => "pre_commit",
            ContextKind::PrePush => "pre_push",
            ContextKind::Run => "run",
            ContextKind::RawDiff => "raw_diff",
        }
    }
}

impl std::fmt::Display for ContextKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Push metadata for the pre-push context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushRefs {
    pub local_ref: Option<String>,
    pub local_sha: Option<String>,
    /// `None` when the branch has no upstream.
    pub remote_sha: Option<String>,
}

/// Why the pipeline is running, plus the file set that applies.
///
/// Built once per invocation and shared read-only with every task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunContext {
    PreCommit { files: FilesCollection },
    PrePush { files: FilesCollection, refs: PushRefs },
    Run { files: FilesCollection },
    RawDiff { files: FilesCollection },
}

impl RunContext {
    pub fn files(&self) -> &FilesCollection {
        match self {
            RunContext::PreCommit { files }
            | RunContext::PrePush { files, .. }
            | RunContext::Run { files }
            | RunContext::RawDiff { files } => files,
        }
    }

    pub fn kind(&self) -> ContextKind {
        match self {
            RunContext::PreCommit { .. } => ContextKind::PreCommit,
            RunContext::PrePush { .. } => ContextKind::PrePush,
            RunContext::Run { .. } => ContextKind::Run,
            RunContext::RawDiff { .. } => ContextKind::RawDiff,
        }
    }

    pub fn push_refs(&self) -> Option<&PushRefs> {
        match self {
            RunContext::PrePush { refs, .. } => Some(refs),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::files::FileEntry;

    #[test]
    fn files_and_kind_follow_variant() {
        let files: FilesCollection = [FileEntry::new("a.js")].into_iter().collect();
        let ctx = RunContext::PrePush {
            files: files.clone(),
            refs: PushRefs {
                local_ref: Some("refs/heads/main".to_string()),
                local_sha: Some("abc".to_string()),
                remote_sha: None,
            },
        };
        assert_eq!(ctx.kind(), ContextKind::PrePush);
        assert_eq!(ctx.files(), &files);
        assert_eq!(ctx.push_refs().and_then(|r| r.remote_sha.as_deref()), None);

        let run = RunContext::Run { files };
        assert!(run.push_refs().is_none());
        assert_eq!(run.kind().to_string(), "run");
    }
}
