//! Rendering of run results for the terminal.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::context::{ContextKind, RunContext};
use crate::core::types::{RunResult, TaskResult, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    context: ContextKind,
    passed: bool,
    files: Vec<String>,
    #[serde(flatten)]
    run: &'a RunResult,
}

/// Human-readable report.
///
/// With `skip_success_output`, a passing run renders as an empty string.
pub fn render_text(
    context: &RunContext,
    run: &RunResult,
    labels: &BTreeMap<String, String>,
    skip_success_output: bool,
) -> String {
    if skip_success_output && run.is_passed() {
        return String::new();
    }

    let mut out = String::new();
    if run.is_empty() {
        let _ = writeln!(
            out,
            "No tasks to run for {} ({} file(s)).",
            context.kind(),
            context.files().len()
        );
        return out;
    }

    for result in &run.results {
        write_result(&mut out, result, labels);
    }

    let failed = run.count(TaskStatus::Failed);
    let warned = run.count(TaskStatus::NonBlockingFailed);
    if run.is_passed() {
        let _ = write!(out, "All {} task(s) passed", run.results.len());
        if warned > 0 {
            let _ = write!(out, " ({warned} non-blocking failure(s))");
        }
        out.push_str(".\n");
    } else {
        let _ = writeln!(out, "{failed} blocking task(s) failed.");
        if run.stopped_early {
            out.push_str("Remaining tasks were not run.\n");
        }
    }
    out
}

fn write_result(out: &mut String, result: &TaskResult, labels: &BTreeMap<String, String>) {
    let label = labels
        .get(&result.task)
        .map_or(result.task.as_str(), String::as_str);
    let (symbol, suffix) = match result.status {
        TaskStatus::Passed => ("✔", ""),
        TaskStatus::Failed => ("✘", ""),
        TaskStatus::Skipped => ("-", " (skipped)"),
        TaskStatus::NonBlockingFailed => ("!", " (non-blocking)"),
    };
    let _ = writeln!(
        out,
        "{symbol} {label}{suffix} [{} ms]",
        result.duration.as_millis()
    );
    if let Some(message) = result.message.as_deref().filter(|m| !m.trim().is_empty()) {
        for line in message.lines() {
            let _ = writeln!(out, "    {line}");
        }
    }
}

/// Machine-readable report.
pub fn render_json(context: &RunContext, run: &RunResult) -> Result<String> {
    let report = JsonReport {
        context: context.kind(),
        passed: run.is_passed(),
        files: context.files().iter().map(|f| f.to_slash()).collect(),
        run,
    };
    serde_json::to_string_pretty(&report).context("serialize run report")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::files::FileEntry;

    fn ctx() -> RunContext {
        RunContext::PreCommit {
            files: ["src/app.js"].iter().map(FileEntry::new).collect(),
        }
    }

    fn run(results: Vec<TaskResult>) -> RunResult {
        RunResult {
            results,
            stopped_early: false,
        }
    }

    #[test]
    fn text_lists_each_task_with_status_and_message() {
        let ctx = ctx();
        let mut labels = BTreeMap::new();
        labels.insert("gulp".to_string(), "frontend build".to_string());
        let run = RunResult {
            results: vec![
                TaskResult::passed("shell", &ctx),
                TaskResult::failed("gulp", &ctx, "line 1\nline 2"),
            ],
            stopped_early: true,
        };

        let text = render_text(&ctx, &run, &labels, false);
        assert!(text.contains("✔ shell"));
        assert!(text.contains("✘ frontend build"));
        assert!(text.contains("    line 1\n    line 2\n"));
        assert!(text.contains("1 blocking task(s) failed."));
        assert!(text.contains("Remaining tasks were not run."));
    }

    #[test]
    fn non_blocking_failures_are_marked_but_pass() {
        let ctx = ctx();
        let run = run(vec![
            TaskResult::non_blocking_failed("shell", &ctx, "warning"),
            TaskResult::skipped("gulp", &ctx),
        ]);
        let text = render_text(&ctx, &run, &BTreeMap::new(), false);
        assert!(text.contains("! shell (non-blocking)"));
        assert!(text.contains("- gulp (skipped)"));
        assert!(text.contains("All 2 task(s) passed (1 non-blocking failure(s))."));
    }

    #[test]
    fn skip_success_output_silences_passing_runs_only() {
        let ctx = ctx();
        let passing = run(vec![TaskResult::passed("shell", &ctx)]);
        assert_eq!(render_text(&ctx, &passing, &BTreeMap::new(), true), "");

        let failing = run(vec![TaskResult::failed("shell", &ctx, "boom")]);
        assert!(render_text(&ctx, &failing, &BTreeMap::new(), true).contains("boom"));
    }

    #[test]
    fn empty_run_says_so() {
        let text = render_text(&ctx(), &RunResult::default(), &BTreeMap::new(), false);
        assert_eq!(text, "No tasks to run for pre_commit (1 file(s)).\n");
    }

    #[test]
    fn json_report_carries_context_files_and_results() {
        let ctx = ctx();
        let run = run(vec![TaskResult::failed("gulp", &ctx, "bad")]);
        let json = render_json(&ctx, &run).expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(value["context"], "pre_commit");
        assert_eq!(value["passed"], false);
        assert_eq!(value["files"][0], "src/app.js");
        assert_eq!(value["results"][0]["status"], "failed");
        assert_eq!(value["results"][0]["message"], "bad");
        assert_eq!(value["stopped_early"], false);
    }
}
