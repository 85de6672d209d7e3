//! `eslint` wrapper for JavaScript and TypeScript sources.

use anyhow::Result;

use crate::core::context::RunContext;
use crate::core::types::TaskResult;
use crate::task::args::ProcessArguments;
use crate::task::options::{OptionsSchema, TaskOptions};
use crate::task::{Task, TaskServices, is_commit_or_run};

pub const NAME: &str = "eslint";

pub fn schema() -> OptionsSchema {
    OptionsSchema::new()
        .optional_string("config")
        .optional_string("format")
        // Negative means eslint's own default (no warning limit).
        .integer("max_warnings", -1)
        .bool("quiet", false)
        .bool("no_eslintrc", false)
        .string_list("plugins", &[])
        .string_list("triggered_by", &["js", "jsx", "ts", "tsx", "vue"])
        .string_list("ignore_patterns", &[])
}

pub struct Eslint {
    name: String,
    options: TaskOptions,
    services: TaskServices,
}

impl Eslint {
    pub fn new(name: &str, options: TaskOptions, services: TaskServices) -> Self {
        Self {
            name: name.to_string(),
            options,
            services,
        }
    }
}

impl Task for Eslint {
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
        let files = context
            .files()
            .extensions(&triggered_by)
            .ignore_patterns(&self.options.get_string_list("ignore_patterns"))?;
        if files.is_empty() {
            return Ok(TaskResult::skipped(&self.name, context));
        }

        let extensions: Vec<String> = triggered_by.iter().map(|ext| format!(".{ext}")).collect();
        let max_warnings = self
            .options
            .get_i64("max_warnings")
            .filter(|limit| *limit >= 0)
            .map(|limit| limit.to_string());

        let mut arguments = ProcessArguments::for_command("eslint");
        arguments
            .add_optional_argument("--config=%s", self.options.get_str("config"))
            .add_optional_argument("--format=%s", self.options.get_str("format"))
            .add_optional_argument("--max-warnings=%s", max_warnings.as_deref())
            .add_optional_flag("--quiet", self.options.get_bool("quiet"))
            .add_optional_flag("--no-eslintrc", self.options.get_bool("no_eslintrc"))
            .add_argument_array("--plugin=%s", &self.options.get_string_list("plugins"))
            .add_optional_comma_separated_argument("--ext=%s", &extensions)
            .add_files(&files);

        self.services.run_external(&self.name, context, arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::files::FileEntry;
    use crate::core::types::TaskStatus;
    use crate::test_support::{FakeInvoker, FakeResponse, services_with};
    use serde_json::{Map, Value, json};
    use std::sync::Arc;

    fn task(fake: &Arc<FakeInvoker>, raw: Value) -> Eslint {
        let options = schema()
            .resolve(raw.as_object().unwrap_or(&Map::new()))
            .expect("options");
        Eslint::new(NAME, options, services_with(fake.clone()))
    }

    fn run_ctx(paths: &[&str]) -> RunContext {
        RunContext::Run {
            files: paths.iter().map(FileEntry::new).collect(),
        }
    }

    #[test]
    fn skips_when_only_ignored_or_foreign_files_changed() {
        let fake = Arc::new(FakeInvoker::new());
        let result = task(&fake, json!({"ignore_patterns": ["dist/**"]}))
            .run(&run_ctx(&["dist/bundle.js", "README.md"]))
            .expect("run");
        assert_eq!(result.status, TaskStatus::Skipped);
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn builds_full_command_line() {
        let fake = Arc::new(FakeInvoker::new().on(
            "eslint",
            &[
                "--config=.eslintrc.json",
                "--max-warnings=0",
                "--quiet",
                "--plugin=react",
                "--plugin=import",
                "--ext=.js,.ts",
                "src/app.js",
                "src/lib.ts",
            ],
            FakeResponse::ok(""),
        ));
        let result = task(
            &fake,
            json!({
                "config": ".eslintrc.json",
                "max_warnings": 0,
                "quiet": true,
                "plugins": ["react", "import"],
                "triggered_by": ["js", "ts"],
            }),
        )
        .run(&run_ctx(&["src/app.js", "src/lib.ts", "styles.css"]))
        .expect("run");
        assert_eq!(result.status, TaskStatus::Passed);
        assert_eq!(fake.calls().len(), 1);
    }

    #[test]
    fn negative_warning_limit_is_left_out() {
        let fake = Arc::new(FakeInvoker::new().on(
            "eslint",
            &["--ext=.js", "a.js"],
            FakeResponse::fail(1, "1 problem"),
        ));
        let result = task(&fake, json!({"triggered_by": ["js"]}))
            .run(&run_ctx(&["a.js"]))
            .expect("run");
        assert_eq!(result.status, TaskStatus::Failed);
        assert_eq!(result.message.as_deref(), Some("1 problem"));
    }

    #[test]
    fn max_warnings_must_be_an_integer() {
        let err = schema()
            .resolve(json!({"max_warnings": "ten"}).as_object().expect("object"))
            .unwrap_err();
        assert!(err.to_string().contains("option 'max_warnings' must be an integer"));
    }
}
