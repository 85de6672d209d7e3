//! Task and run outcomes.
//!
//! Results are plain data: a lint failure is a [`TaskStatus::Failed`] value,
//! never an error. Once created a result is not mutated.

use std::time::Duration;

use serde::Serialize;

use crate::core::context::{ContextKind, RunContext};

/// Outcome of one task execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Passed,
    Skipped,
    Failed,
    /// The task failed but is configured as non-blocking.
    NonBlockingFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskResult {
    /// Name of the task that produced this result.
    pub task: String,
    pub context: ContextKind,
    pub status: TaskStatus,
    /// Diagnostic output, usually the formatted process output of a failure.
    pub message: Option<String>,
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl TaskResult {
    fn new(task: &str, context: &RunContext, status: TaskStatus, message: Option<String>) -> Self {
        Self {
            task: task.to_string(),
            context: context.kind(),
            status,
            message,
            duration: Duration::ZERO,
        }
    }

    pub fn passed(task: &str, context: &RunContext) -> Self {
        Self::new(task, context, TaskStatus::Passed, None)
    }

    pub fn skipped(task: &str, context: &RunContext) -> Self {
        Self::new(task, context, TaskStatus::Skipped, None)
    }

    pub fn failed(task: &str, context: &RunContext, message: impl Into<String>) -> Self {
        Self::new(task, context, TaskStatus::Failed, Some(message.into()))
    }

    pub fn non_blocking_failed(task: &str, context: &RunContext, message: impl Into<String>) -> Self {
        Self::new(task, context, TaskStatus::NonBlockingFailed, Some(message.into()))
    }

    /// Re-tag a failure as non-blocking; other statuses are returned unchanged.
    pub fn into_non_blocking(self) -> Self {
        if self.status != TaskStatus::Failed {
            return self;
        }
        Self {
            status: TaskStatus::NonBlockingFailed,
            ..self
        }
    }

    pub fn with_duration(self, duration: Duration) -> Self {
        Self { duration, ..self }
    }

    pub fn is_passed(&self) -> bool {
        self.status == TaskStatus::Passed
    }

    pub fn is_blocking_failure(&self) -> bool {
        self.status == TaskStatus::Failed
    }
}

/// Ordered task results for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub results: Vec<TaskResult>,
    /// True when the runner stopped after a blocking failure.
    pub stopped_early: bool,
}

impl RunResult {
    pub fn push(&mut self, result: TaskResult) {
        self.results.push(result);
    }

    /// Failed iff any blocking failure was recorded.
    pub fn is_failed(&self) -> bool {
        self.results.iter().any(TaskResult::is_blocking_failure)
    }

    /// Passed otherwise, including the trivial case of no applicable task.
    pub fn is_passed(&self) -> bool {
        !self.is_failed()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn task_names(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.task.as_str()).collect()
    }

    pub fn count(&self, status: TaskStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}

fn serialize_millis<S: serde::Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::files::FilesCollection;

    fn ctx() -> RunContext {
        RunContext::Run {
            files: FilesCollection::new(),
        }
    }

    #[test]
    fn empty_run_is_trivially_passed() {
        let result = RunResult::default();
        assert!(result.is_passed());
        assert!(!result.is_failed());
    }

    #[test]
    fn non_blocking_failure_does_not_fail_run() {
        let ctx = ctx();
        let mut result = RunResult::default();
        result.push(TaskResult::failed("lint", &ctx, "boom").into_non_blocking());
        result.push(TaskResult::skipped("test", &ctx));
        assert!(result.is_passed());
        assert_eq!(result.count(TaskStatus::NonBlockingFailed), 1);
    }

    #[test]
    fn blocking_failure_fails_run() {
        let ctx = ctx();
        let mut result = RunResult::default();
        result.push(TaskResult::passed("fmt", &ctx));
        result.push(TaskResult::failed("lint", &ctx, "boom"));
        assert!(result.is_failed());
        assert_eq!(result.task_names(), vec!["fmt", "lint"]);
    }

    #[test]
    fn into_non_blocking_leaves_passes_alone() {
        let ctx = ctx();
        let passed = TaskResult::passed("fmt", &ctx).into_non_blocking();
        assert_eq!(passed.status, TaskStatus::Passed);
    }

    #[test]
    fn results_serialize_with_snake_case_tags() {
        let ctx = ctx();
        let json = serde_json::to_value(TaskResult::skipped("gulp", &ctx)).expect("json");
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["context"], "run");
        assert_eq!(json["duration"], 0);
    }
}
