//! Name-based lookup of task implementations.

use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow};
use serde_json::{Map, Value};

use crate::task::options::{OptionsSchema, TaskOptions};
use crate::task::{Task, TaskServices, eslint, gherkin_lint, gulp, shell};

/// Constructor for a task from its configured name and resolved options.
pub type TaskBuilder = fn(&str, TaskOptions, TaskServices) -> Box<dyn Task>;

/// How to describe and build one kind of task.
#[derive(Clone, Copy)]
pub struct TaskDefinition {
    pub name: &'static str,
    pub schema: fn() -> OptionsSchema,
    pub build: TaskBuilder,
}

/// Known task kinds, keyed by name.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    definitions: BTreeMap<&'static str, TaskDefinition>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every task shipped in this crate.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(TaskDefinition {
            name: eslint::NAME,
            schema: eslint::schema,
            build: |name, options, services| Box::new(eslint::Eslint::new(name, options, services)),
        });
        registry.register(TaskDefinition {
            name: gherkin_lint::NAME,
            schema: gherkin_lint::schema,
            build: |name, options, services| {
                Box::new(gherkin_lint::GherkinLint::new(name, options, services))
            },
        });
        registry.register(TaskDefinition {
            name: gulp::NAME,
            schema: gulp::schema,
            build: |name, options, services| Box::new(gulp::Gulp::new(name, options, services)),
        });
        registry.register(TaskDefinition {
            name: shell::NAME,
            schema: shell::schema,
            build: |name, options, services| Box::new(shell::Shell::new(name, options, services)),
        });
        registry
    }

    pub fn register(&mut self, definition: TaskDefinition) {
        self.definitions.insert(definition.name, definition);
    }

    pub fn get(&self, name: &str) -> Option<&TaskDefinition> {
        self.definitions.get(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.definitions.keys().copied().collect()
    }

    /// Resolve `raw` options for `name` without building the task.
    pub fn resolve_options(&self, name: &str, raw: &Map<String, Value>) -> Result<TaskOptions> {
        let definition = self.lookup(name)?;
        (definition.schema)()
            .resolve(raw)
            .with_context(|| format!("invalid options for task '{name}'"))
    }

    /// Resolve options and build the task named `name`.
    pub fn build(
        &self,
        name: &str,
        raw: &Map<String, Value>,
        services: &TaskServices,
    ) -> Result<Box<dyn Task>> {
        let definition = self.lookup(name)?;
        let options = self.resolve_options(name, raw)?;
        Ok((definition.build)(name, options, services.clone()))
    }

    fn lookup(&self, name: &str) -> Result<&TaskDefinition> {
        self.get(name).ok_or_else(|| {
            anyhow!(
                "unknown task '{name}'; available tasks: {}",
                self.names().join(", ")
            )
        })
    }
}
