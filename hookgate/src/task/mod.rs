//! The task capability and the built-in task wrappers.
//!
//! A [`Task`] is one pluggable check. Concrete tasks are independent types,
//! selected by name through the [`registry::TaskRegistry`] when the
//! configuration is loaded.
//!
//! Failures of the checked code are data ([`TaskStatus::Failed`](crate::core::types::TaskStatus)).
//! An `Err` from [`Task::run`] means the check itself could not execute and
//! aborts the whole invocation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::context::{ContextKind, RunContext};
use crate::core::types::TaskResult;
use crate::io::formatter::{ProcessFormatter, RawProcessFormatter};
use crate::io::process::{ProcessInvoker, SystemInvoker};

pub mod args;
pub mod eslint;
pub mod gherkin_lint;
pub mod gulp;
pub mod options;
pub mod registry;
pub mod shell;

use args::ProcessArguments;
use options::OptionsSchema;

/// One pluggable check.
pub trait Task: Send + Sync {
    /// Unique identifier used for configuration lookup and reporting.
    fn name(&self) -> &str;

    fn configurable_options(&self) -> OptionsSchema;

    fn can_run_in_context(&self, context: &RunContext) -> bool;

    fn run(&self, context: &RunContext) -> Result<TaskResult>;
}

/// Collaborators handed to every task.
#[derive(Clone)]
pub struct TaskServices {
    pub invoker: Arc<dyn ProcessInvoker>,
    pub formatter: Arc<dyn ProcessFormatter>,
    /// Directory tools run in; file paths in the context are relative to it.
    pub workdir: PathBuf,
}

impl TaskServices {
    pub fn new(
        invoker: Arc<dyn ProcessInvoker>,
        formatter: Arc<dyn ProcessFormatter>,
        workdir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            invoker,
            formatter,
            workdir: workdir.into(),
        }
    }

    /// Real processes with the raw formatter.
    pub fn system(invoker: SystemInvoker, workdir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(invoker), Arc::new(RawProcessFormatter), workdir)
    }

    /// Execute `arguments` and map the exit status onto a result for `task`.
    ///
    /// Success passes; any other exit (including a timeout) fails with the
    /// formatter's rendering of the output. Failing to start the tool is an error.
    pub fn run_external(
        &self,
        task: &str,
        context: &RunContext,
        arguments: ProcessArguments,
    ) -> Result<TaskResult> {
        let command = arguments.into_command(&self.workdir);
        debug!(task, command = %command.display(), "running external tool");
        let output = self
            .invoker
            .execute(&command)
            .with_context(|| format!("task {task} could not start {}", command.program))?;
        if output.success() {
            return Ok(TaskResult::passed(task, context));
        }
        Ok(TaskResult::failed(
            task,
            context,
            self.formatter.format(&output),
        ))
    }
}

/// Context kinds most tasks accept.
pub fn is_commit_or_run(context: &RunContext) -> bool {
    matches!(context.kind(), ContextKind::PreCommit | ContextKind::Run)
}
