//! Arbitrary shell scripts as a task.
//!
//! Each configured script is run with `sh -c`. All scripts run even when an
//! earlier one fails; the diagnostics of every failing script are collected.

use anyhow::Result;

use crate::core::context::RunContext;
use crate::core::types::{TaskResult, TaskStatus};
use crate::task::args::ProcessArguments;
use crate::task::options::{OptionsSchema, TaskOptions};
use crate::task::{Task, TaskServices};

pub const NAME: &str = "shell";

pub fn schema() -> OptionsSchema {
    OptionsSchema::new()
        .string_list("scripts", &[])
        .string_list("triggered_by", &[])
        .string_list("whitelist_patterns", &[])
        .string_list("ignore_patterns", &[])
}

pub struct Shell {
    name: String,
    options: TaskOptions,
    services: TaskServices,
}

impl Shell {
    pub fn new(name: &str, options: TaskOptions, services: TaskServices) -> Self {
        Self {
            name: name.to_string(),
            options,
            services,
        }
    }
}

impl Task for Shell {
    fn name(&self) -> &str {
        &self.name
    }

    fn configurable_options(&self) -> OptionsSchema {
        schema()
    }

    fn can_run_in_context(&self, _context: &RunContext) -> bool {
        true
    }

    fn run(&self, context: &RunContext) -> Result<TaskResult> {
        let triggered_by = self.options.get_string_list("triggered_by");
        let whitelist = self.options.get_string_list("whitelist_patterns");
        let mut files = context
            .files()
            .ignore_patterns(&self.options.get_string_list("ignore_patterns"))?;
        if !whitelist.is_empty() {
            files = files.names_matching(&whitelist)?;
        }
        if !triggered_by.is_empty() {
            files = files.extensions(&triggered_by);
        }
        let scripts = self.options.get_string_list("scripts");
        if files.is_empty() || scripts.is_empty() {
            return Ok(TaskResult::skipped(&self.name, context));
        }

        let mut failures = Vec::new();
        for script in &scripts {
            let mut arguments = ProcessArguments::for_command("sh");
            arguments.add("-c").add(script.as_str());
            let result = self.services.run_external(&self.name, context, arguments)?;
            if result.status == TaskStatus::Failed {
                let message = result.message.unwrap_or_default();
                failures.push(format!("$ {script}\n{message}"));
            }
        }

        if failures.is_empty() {
            return Ok(TaskResult::passed(&self.name, context));
        }
        Ok(TaskResult::failed(&self.name, context, failures.join("\n\n")))
    }
}
