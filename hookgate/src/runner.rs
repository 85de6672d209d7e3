//! The task runner: executes configured tasks against one run context.

use std::collections::BTreeMap;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::core::context::RunContext;
use crate::core::types::{RunResult, TaskStatus};
use crate::io::config::HookgateConfig;
use crate::task::registry::TaskRegistry;
use crate::task::{Task, TaskServices};

/// Per-task runner settings taken from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskMetadata {
    /// A failure of a blocking task fails the run (and stops it when
    /// `stop_on_failure` is set). Non-blocking failures are only reported.
    pub blocking: bool,
    pub priority: i64,
    pub label: Option<String>,
}

impl Default for TaskMetadata {
    fn default() -> Self {
        Self {
            blocking: true,
            priority: 0,
            label: None,
        }
    }
}

/// A task together with its runner settings.
pub struct ConfiguredTask {
    pub task: Box<dyn Task>,
    pub metadata: TaskMetadata,
}

impl ConfiguredTask {
    pub fn new(task: Box<dyn Task>, metadata: TaskMetadata) -> Self {
        Self { task, metadata }
    }

    pub fn blocking(task: Box<dyn Task>) -> Self {
        Self::new(task, TaskMetadata::default())
    }

    pub fn non_blocking(task: Box<dyn Task>) -> Self {
        Self::new(
            task,
            TaskMetadata {
                blocking: false,
                ..TaskMetadata::default()
            },
        )
    }

    /// Label for reports, falling back to the task name.
    pub fn display_name(&self) -> &str {
        self.metadata
            .label
            .as_deref()
            .unwrap_or_else(|| self.task.name())
    }
}

/// Sequences tasks and aggregates their results.
pub struct TaskRunner {
    tasks: Vec<ConfiguredTask>,
    stop_on_failure: bool,
}

impl TaskRunner {
    /// Tasks run by descending priority; equal priorities keep the given order.
    pub fn new(mut tasks: Vec<ConfiguredTask>) -> Self {
        tasks.sort_by(|a, b| b.metadata.priority.cmp(&a.metadata.priority));
        Self {
            tasks,
            stop_on_failure: true,
        }
    }

    pub fn with_stop_on_failure(mut self, stop_on_failure: bool) -> Self {
        self.stop_on_failure = stop_on_failure;
        self
    }

    /// Build every configured task through `registry`.
    ///
    /// Unknown task names and invalid options are rejected here, before any
    /// task runs.
    pub fn from_config(
        config: &HookgateConfig,
        registry: &TaskRegistry,
        services: &TaskServices,
    ) -> Result<Self> {
        let mut tasks = Vec::with_capacity(config.tasks.len());
        for task_config in &config.tasks {
            let raw = task_config.options_json()?;
            let task = registry.build(&task_config.name, &raw, services)?;
            tasks.push(ConfiguredTask::new(
                task,
                TaskMetadata {
                    blocking: task_config.blocking,
                    priority: task_config.priority,
                    label: task_config.label.clone(),
                },
            ));
        }
        Ok(Self::new(tasks).with_stop_on_failure(config.stop_on_failure))
    }

    pub fn tasks(&self) -> &[ConfiguredTask] {
        &self.tasks
    }

    /// Report labels keyed by task name.
    pub fn labels(&self) -> BTreeMap<String, String> {
        self.tasks
            .iter()
            .map(|t| (t.task.name().to_string(), t.display_name().to_string()))
            .collect()
    }

    /// Run every applicable task against `context`.
    ///
    /// Tasks that cannot run in this context are left out of the result
    /// entirely. An `Err` from a task aborts the run.
    #[instrument(skip_all, fields(context = %context.kind(), files = context.files().len()))]
    pub fn run(&self, context: &RunContext) -> Result<RunResult> {
        let mut run = RunResult::default();

        for configured in &self.tasks {
            let task = configured.task.as_ref();
            if !task.can_run_in_context(context) {
                debug!(task = task.name(), "not applicable in this context");
                continue;
            }

            info!(task = task.name(), "running task");
            let started = Instant::now();
            let result = task
                .run(context)
                .with_context(|| format!("task '{}' aborted", task.name()))?
                .with_duration(started.elapsed());

            let result = if configured.metadata.blocking {
                result
            } else {
                result.into_non_blocking()
            };
            let status = result.status;
            debug!(task = task.name(), status = ?status, "task finished");
            run.push(result);

            if status == TaskStatus::Failed && self.stop_on_failure {
                warn!(task = task.name(), "blocking task failed, stopping");
                run.stopped_early = true;
                break;
            }
        }

        info!(
            tasks = run.results.len(),
            failed = run.is_failed(),
            "run finished"
        );
        Ok(run)
    }
}
