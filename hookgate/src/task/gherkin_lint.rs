//! `gherkinlint` wrapper for `.feature` files.

use std::path::Path;

use anyhow::Result;
use serde_json::{Value, json};

use crate::core::context::RunContext;
use crate::core::path::normalize;
use crate::core::types::TaskResult;
use crate::task::args::ProcessArguments;
use crate::task::options::{OptionsSchema, TaskOptions};
use crate::task::{Task, TaskServices, is_commit_or_run};

pub const NAME: &str = "gherkin_lint";

pub fn schema() -> OptionsSchema {
    OptionsSchema::new()
        .string("directory", "features")
        .optional_string("config")
        .allowed_values("config", vec![Value::Null, json!("text")])
}

pub struct GherkinLint {
    name: String,
    options: TaskOptions,
    services: TaskServices,
}

impl GherkinLint {
    pub fn new(name: &str, options: TaskOptions, services: TaskServices) -> Self {
        Self {
            name: name.to_string(),
            options,
            services,
        }
    }
}

impl Task for GherkinLint {
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
        let directory = self.options.get_str("directory").unwrap_or("features");
        // Only features inside the linted directory can change its verdict.
        let root = normalize(Path::new(directory));
        let features = context
            .files()
            .extensions(&["feature"])
            .filter(|entry| entry.directory().starts_with(&root));
        if features.is_empty() {
            return Ok(TaskResult::skipped(&self.name, context));
        }

        let mut arguments = ProcessArguments::for_command("gherkinlint");
        arguments
            .add("lint")
            .add_optional_argument("--config=%s", self.options.get_str("config"))
            .add(directory);

        self.services.run_external(&self.name, context, arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::files::{FileEntry, FilesCollection};
    use crate::core::types::TaskStatus;
    use crate::test_support::{FakeInvoker, FakeResponse, services_with};
    use serde_json::Map;
    use std::sync::Arc;

    fn task(fake: &Arc<FakeInvoker>, raw: Value) -> GherkinLint {
        let options = schema()
            .resolve(raw.as_object().unwrap_or(&Map::new()))
            .expect("options");
        GherkinLint::new(NAME, options, services_with(fake.clone()))
    }

    fn run_ctx(paths: &[&str]) -> RunContext {
        RunContext::Run {
            files: paths.iter().map(FileEntry::new).collect(),
        }
    }

    #[test]
    fn runs_only_in_pre_commit_and_run() {
        let fake = Arc::new(FakeInvoker::new());
        let task = task(&fake, json!({}));
        let files = FilesCollection::new();
        assert!(task.can_run_in_context(&RunContext::PreCommit { files: files.clone() }));
        assert!(task.can_run_in_context(&RunContext::Run { files: files.clone() }));
        assert!(!task.can_run_in_context(&RunContext::RawDiff { files }));
    }

    #[test]
    fn skips_without_feature_files() {
        let fake = Arc::new(FakeInvoker::new());
        let result = task(&fake, json!({})).run(&run_ctx(&["app.js"])).expect("run");
        assert_eq!(result.status, TaskStatus::Skipped);
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn features_outside_the_directory_do_not_trigger() {
        let fake = Arc::new(FakeInvoker::new());
        let result = task(&fake, json!({"directory": "specs"}))
            .run(&run_ctx(&["features/login.feature", "specsheet.feature"]))
            .expect("run");
        assert_eq!(result.status, TaskStatus::Skipped);
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn builds_lint_command_with_config() {
        let fake = Arc::new(FakeInvoker::new().on(
            "gherkinlint",
            &["lint", "--config=text", "specs"],
            FakeResponse::ok(""),
        ));
        let result = task(&fake, json!({"directory": "specs", "config": "text"}))
            .run(&run_ctx(&["specs/auth/login.feature"]))
            .expect("run");
        assert_eq!(result.status, TaskStatus::Passed);
        assert_eq!(fake.calls().len(), 1);
    }
}
