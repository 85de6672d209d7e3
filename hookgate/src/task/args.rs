//! Argument list builder for external tool invocations.

use std::path::Path;

use crate::core::files::FilesCollection;
use crate::io::process::ProcessCommand;

const PLACEHOLDER: &str = "%s";

/// Program plus arguments, built up the way tool wrappers need them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessArguments {
    program: String,
    args: Vec<String>,
}

impl ProcessArguments {
    pub fn for_command(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn add(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    /// Add `format` with `%s` replaced by `value`, if a value is present.
    pub fn add_optional_argument(&mut self, format: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.args.push(format.replace(PLACEHOLDER, value));
        }
        self
    }

    /// Add `flag` only when `enabled`.
    pub fn add_optional_flag(&mut self, flag: &str, enabled: bool) -> &mut Self {
        if enabled {
            self.args.push(flag.to_string());
        }
        self
    }

    /// Add `format` once per value, e.g. `--ext=%s` for each extension.
    pub fn add_argument_array<S: AsRef<str>>(&mut self, format: &str, values: &[S]) -> &mut Self {
        for value in values {
            self.args.push(format.replace(PLACEHOLDER, value.as_ref()));
        }
        self
    }

    /// Add `format` with `%s` replaced by the comma-joined values, if any.
    pub fn add_optional_comma_separated_argument<S: AsRef<str>>(
        &mut self,
        format: &str,
        values: &[S],
    ) -> &mut Self {
        if values.is_empty() {
            return self;
        }
        let joined: Vec<&str> = values.iter().map(AsRef::as_ref).collect();
        self.args.push(format.replace(PLACEHOLDER, &joined.join(",")));
        self
    }

    /// Add every file path as its own argument.
    pub fn add_files(&mut self, files: &FilesCollection) -> &mut Self {
        self.args.extend(files.iter().map(|f| f.to_slash()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn into_command(self, workdir: &Path) -> ProcessCommand {
        ProcessCommand::new(self.program)
            .args(self.args)
            .current_dir(workdir)
    }
}
