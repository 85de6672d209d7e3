//! `gulp` wrapper.

use anyhow::Result;

use crate::core::context::RunContext;
use crate::core::types::TaskResult;
use crate::task::args::ProcessArguments;
use crate::task::options::{OptionsSchema, TaskOptions};
use crate::task::{Task, TaskServices, is_commit_or_run};

pub const NAME: &str = "gulp";

pub fn schema() -> OptionsSchema {
    OptionsSchema::new()
        .optional_string("gulp_file")
        .optional_string("task")
        .string_list(
            "triggered_by",
            &["js", "jsx", "coffee", "ts", "less", "sass", "scss"],
        )
}

pub struct Gulp {
    name: String,
    options: TaskOptions,
    services: TaskServices,
}

impl Gulp {
    pub fn new(name: &str, options: TaskOptions, services: TaskServices) -> Self {
        Self {
            name: name.to_string(),
            options,
            services,
        }
    }
}

impl Task for Gulp {
    fn name(&self) -> &str {
        &self.name
    }

    fn configurable_options(&self) -> OptionsSchema {
        schema()
    }

    fn can_run_in_context(&self, context: &RunContext) -> bool {
        is_commit_or_run(context)
    }

    fn run(&self, context: &RunContext) -> Result<TaskResult> {
        let triggered_by = self.options.get_string_list("triggered_by");
        if context.files().extensions(&triggered_by).is_empty() {
            return Ok(TaskResult::skipped(&self.name, context));
        }

        let mut arguments = ProcessArguments::for_command("gulp");
        arguments
            .add_optional_argument("--gulpfile=%s", self.options.get_str("gulp_file"))
            .add_optional_argument("%s", self.options.get_str("task"));

        self.services.run_external(&self.name, context, arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::files::{FileEntry, FilesCollection};
    use crate::core::types::TaskStatus;
    use crate::test_support::{FakeInvoker, FakeResponse, services_with};
    use serde_json::{Map, Value, json};
    use std::sync::Arc;

    fn task(fake: &Arc<FakeInvoker>, raw: Value) -> Gulp {
        let options = schema()
            .resolve(raw.as_object().unwrap_or(&Map::new()))
            .expect("options");
        Gulp::new(NAME, options, services_with(fake.clone()))
    }

    fn pre_commit(paths: &[&str]) -> RunContext {
        RunContext::PreCommit {
            files: paths.iter().map(FileEntry::new).collect(),
        }
    }

    #[test]
    fn has_a_name_and_options() {
        let fake = Arc::new(FakeInvoker::new());
        let task = task(&fake, json!({}));
        assert_eq!(task.name(), "gulp");
        let names = task.configurable_options().names();
        assert!(names.contains(&"gulp_file"));
        assert!(names.contains(&"task"));
        assert!(names.contains(&"triggered_by"));
    }

    #[test]
    fn does_not_run_in_pre_push() {
        let fake = Arc::new(FakeInvoker::new());
        let task = task(&fake, json!({}));
        let ctx = RunContext::PrePush {
            files: FilesCollection::new(),
            refs: Default::default(),
        };
        assert!(!task.can_run_in_context(&ctx));
    }

    #[test]
    fn does_nothing_without_files() {
        let fake = Arc::new(FakeInvoker::new());
        let result = task(&fake, json!({})).run(&pre_commit(&[])).expect("run");
        assert_eq!(result.status, TaskStatus::Skipped);
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn passes_when_gulp_succeeds() {
        let fake = Arc::new(FakeInvoker::new().on(
            "gulp",
            &["--gulpfile=build/gulpfile.js", "lint"],
            FakeResponse::ok("done"),
        ));
        let result = task(&fake, json!({"gulp_file": "build/gulpfile.js", "task": "lint"}))
            .run(&pre_commit(&["test.js"]))
            .expect("run");
        assert!(result.is_passed());
    }

    #[test]
    fn fails_with_formatted_output_when_gulp_fails() {
        let fake = Arc::new(FakeInvoker::new().on(
            "gulp",
            &[],
            FakeResponse::fail(1, "lint errors"),
        ));
        let result = task(&fake, json!({})).run(&pre_commit(&["test.js"])).expect("run");
        assert_eq!(result.status, TaskStatus::Failed);
        assert_eq!(result.message.as_deref(), Some("lint errors"));
    }
}
