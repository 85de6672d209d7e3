//! Test-only doubles: scripted process invoker, stub tasks and scratch git repos.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow, bail};

use crate::core::context::{ContextKind, RunContext};
use crate::core::types::TaskResult;
use crate::io::formatter::RawProcessFormatter;
use crate::io::process::{ProcessCommand, ProcessInvoker, ProcessOutput};
use crate::task::options::OptionsSchema;
use crate::task::{Task, TaskServices};

/// Scripted reply for one command.
#[derive(Debug, Clone)]
pub enum FakeResponse {
    Output(ProcessOutput),
    SpawnError(String),
}

impl FakeResponse {
    pub fn ok(stdout: &str) -> Self {
        Self::Output(ProcessOutput {
            exit_code: Some(0),
            stdout: stdout.to_string(),
            ..ProcessOutput::default()
        })
    }

    pub fn fail(code: i32, stderr: &str) -> Self {
        Self::Output(ProcessOutput {
            exit_code: Some(code),
            stderr: stderr.to_string(),
            ..ProcessOutput::default()
        })
    }

    pub fn spawn_error(message: &str) -> Self {
        Self::SpawnError(message.to_string())
    }
}

struct Expectation {
    program: String,
    args: Vec<String>,
    responses: VecDeque<FakeResponse>,
}

/// Invoker that answers from a script and records every call.
///
/// Commands are matched on program and exact arguments. Registering the same
/// command twice queues responses; the last one repeats. Unscripted commands
/// behave like a missing binary (exit 127).
#[derive(Default)]
pub struct FakeInvoker {
    expectations: Mutex<Vec<Expectation>>,
    calls: Mutex<Vec<ProcessCommand>>,
}

impl FakeInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, program: &str, args: &[&str], response: FakeResponse) -> Self {
        {
            let mut expectations = self
                .expectations
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let args: Vec<String> = args.iter().map(|arg| (*arg).to_string()).collect();
            match expectations
                .iter_mut()
                .find(|e| e.program == program && e.args == args)
            {
                Some(existing) => existing.responses.push_back(response),
                None => expectations.push(Expectation {
                    program: program.to_string(),
                    args,
                    responses: VecDeque::from([response]),
                }),
            }
        }
        self
    }

    pub fn calls(&self) -> Vec<ProcessCommand> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ProcessInvoker for FakeInvoker {
    fn execute(&self, command: &ProcessCommand) -> Result<ProcessOutput> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(command.clone());

        let mut expectations = self
            .expectations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let response = expectations
            .iter_mut()
            .find(|e| e.program == command.program && e.args == command.args)
            .and_then(|e| {
                if e.responses.len() > 1 {
                    e.responses.pop_front()
                } else {
                    e.responses.front().cloned()
                }
            });

        match response {
            Some(FakeResponse::Output(output)) => Ok(output),
            Some(FakeResponse::SpawnError(message)) => Err(anyhow!(message)),
            None => Ok(ProcessOutput {
                exit_code: Some(127),
                stderr: format!("unscripted command: {}", command.display()),
                ..ProcessOutput::default()
            }),
        }
    }
}

/// Task services backed by `invoker` and the raw formatter.
pub fn services_with(invoker: Arc<FakeInvoker>) -> TaskServices {
    TaskServices::new(invoker, Arc::new(RawProcessFormatter), "/project")
}

#[derive(Debug, Clone, Copy)]
enum StubOutcome {
    Pass,
    Fail,
    Skip,
    Fault,
}

/// Shared counter of how often a stub task ran.
#[derive(Debug, Clone, Default)]
pub struct CallCount(Arc<AtomicUsize>);

impl CallCount {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Task with a fixed outcome.
pub struct StubTask {
    name: String,
    outcome: StubOutcome,
    message: String,
    contexts: Option<Vec<ContextKind>>,
    calls: CallCount,
}

impl StubTask {
    fn with(name: &str, outcome: StubOutcome, message: &str) -> Self {
        Self {
            name: name.to_string(),
            outcome,
            message: message.to_string(),
            contexts: None,
            calls: CallCount::default(),
        }
    }

    pub fn passing(name: &str) -> Self {
        Self::with(name, StubOutcome::Pass, "")
    }

    pub fn failing(name: &str, message: &str) -> Self {
        Self::with(name, StubOutcome::Fail, message)
    }

    pub fn skipping(name: &str) -> Self {
        Self::with(name, StubOutcome::Skip, "")
    }

    /// Returns `Err` from `run`, like a tool that cannot be started.
    pub fn faulting(name: &str) -> Self {
        Self::with(name, StubOutcome::Fault, "stub fault")
    }

    /// Restrict the task to the given context kinds (default: all).
    pub fn only_in(mut self, kinds: &[ContextKind]) -> Self {
        self.contexts = Some(kinds.to_vec());
        self
    }

    pub fn calls(&self) -> CallCount {
        self.calls.clone()
    }
}

impl Task for StubTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn configurable_options(&self) -> OptionsSchema {
        OptionsSchema::new()
    }

    fn can_run_in_context(&self, context: &RunContext) -> bool {
        self.contexts
            .as_ref()
            .is_none_or(|kinds| kinds.contains(&context.kind()))
    }

    fn run(&self, context: &RunContext) -> Result<TaskResult> {
        self.calls.0.fetch_add(1, Ordering::SeqCst);
        match self.outcome {
            StubOutcome::Pass => Ok(TaskResult::passed(&self.name, context)),
            StubOutcome::Fail => Ok(TaskResult::failed(
                &self.name,
                context,
                self.message.clone(),
            )),
            StubOutcome::Skip => Ok(TaskResult::skipped(&self.name, context)),
            StubOutcome::Fault => Err(anyhow!(self.message.clone())),
        }
    }
}

/// Scratch git repository in a temp directory, driven by the real `git`.
pub struct TestRepo {
    dir: tempfile::TempDir,
}

impl TestRepo {
    /// `git init` with a local identity and `main` as the initial branch.
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp repo dir")?;
        let repo = Self { dir };
        repo.git(&["init", "--quiet"])?;
        repo.git(&["symbolic-ref", "HEAD", "refs/heads/main"])?;
        repo.git(&["config", "user.name", "Hookgate Test"])?;
        repo.git(&["config", "user.email", "hookgate@example.invalid"])?;
        repo.git(&["config", "commit.gpgsign", "false"])?;
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, rel: &str, contents: &str) -> Result<PathBuf> {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    pub fn remove(&self, rel: &str) -> Result<()> {
        let path = self.path().join(rel);
        fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))
    }

    /// Stage everything (including deletions).
    pub fn stage_all(&self) -> Result<()> {
        self.git(&["add", "--all"]).map(|_| ())
    }

    /// Stage everything and commit; returns the new HEAD sha.
    pub fn commit_all(&self, message: &str) -> Result<String> {
        self.stage_all()?;
        self.git(&["commit", "--quiet", "--allow-empty", "-m", message])?;
        Ok(self.git(&["rev-parse", "HEAD"])?.trim().to_string())
    }

    /// Run git in the repo, failing on non-zero exit.
    pub fn git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        if !output.status.success() {
            bail!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_invoker_queues_responses_and_repeats_the_last() {
        let fake = FakeInvoker::new()
            .on("git", &["status"], FakeResponse::fail(1, "first"))
            .on("git", &["status"], FakeResponse::ok("second"));
        let cmd = ProcessCommand::new("git").arg("status");
        assert_eq!(fake.execute(&cmd).expect("first").stderr, "first");
        assert_eq!(fake.execute(&cmd).expect("second").stdout, "second");
        assert_eq!(fake.execute(&cmd).expect("third").stdout, "second");
        assert_eq!(fake.calls().len(), 3);
    }

    #[test]
    fn unscripted_commands_look_like_missing_binaries() {
        let fake = FakeInvoker::new();
        let output = fake
            .execute(&ProcessCommand::new("eslint").arg("."))
            .expect("output");
        assert_eq!(output.exit_code, Some(127));
        assert!(output.stderr.contains("eslint ."));
    }
}
