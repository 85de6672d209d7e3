//! Quality-gate runner for git hooks.
//!
//! Locates the files a commit or push touches, runs the tasks configured in
//! `hookgate.toml` against them and exits non-zero when a blocking task fails.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;

use hookgate::core::context::RunContext;
use hookgate::exit_codes;
use hookgate::hooks;
use hookgate::io::config::{DEFAULT_CONFIG_FILE, HookgateConfig, load_config, write_config};
use hookgate::io::git::Git;
use hookgate::io::locator::ChangedFiles;
use hookgate::io::process::SystemInvoker;
use hookgate::logging;
use hookgate::report::{self, ReportFormat};
use hookgate::runner::TaskRunner;
use hookgate::task::TaskServices;
use hookgate::task::options::TaskOptions;
use hookgate::task::registry::TaskRegistry;

#[derive(Parser)]
#[command(name = "hookgate", version, about = "Quality-gate runner for git hooks")]
struct Cli {
    /// Config file (default: `hookgate.toml` in the project directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Project root all reported paths are relative to (default: current directory).
    #[arg(long, global = true)]
    project_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text, global = true)]
    format: ReportFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config file.
    Init {
        /// Overwrite an existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Check staged changes.
    PreCommit,
    /// Check the commits the current branch would push.
    PrePush {
        /// Print nothing when every blocking task passes.
        #[arg(long)]
        skip_success_output: bool,
    },
    /// Check the files named in a unified diff read from stdin.
    Diff,
    /// Check explicit files, or every tracked file when none are given.
    Run { files: Vec<PathBuf> },
    /// List configured tasks with their resolved options.
    Tasks,
}

fn main() {
    logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            exit_codes::FAULT
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let project_dir = resolve_project_dir(cli.project_dir.as_deref())?;
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| project_dir.join(DEFAULT_CONFIG_FILE));

    match cli.command {
        Command::Init { force } => cmd_init(&config_path, force),
        Command::Tasks => cmd_tasks(&config_path, cli.format),
        Command::PreCommit => run_hook(&cli, &config_path, &project_dir, false, |locator| {
            Ok(hooks::pre_commit_context(locator))
        }),
        Command::PrePush {
            skip_success_output,
        } => run_hook(
            &cli,
            &config_path,
            &project_dir,
            skip_success_output,
            |locator| Ok(hooks::pre_push_context(locator)),
        ),
        Command::Diff => run_hook(&cli, &config_path, &project_dir, false, |locator| {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("read diff from stdin")?;
            Ok(hooks::raw_diff_context(locator, &text))
        }),
        Command::Run { ref files } => {
            let files = absolute_paths(files)?;
            run_hook(&cli, &config_path, &project_dir, false, |locator| {
                Ok(hooks::run_context(locator, files.as_slice()))
            })
        }
    }
}

/// Anchor relative command-line paths at the directory hookgate was started in.
fn absolute_paths(files: &[PathBuf]) -> Result<Vec<PathBuf>> {
    if files.iter().all(|file| file.is_absolute()) {
        return Ok(files.to_vec());
    }
    let cwd = std::env::current_dir().context("resolve current directory")?;
    let cwd = fs::canonicalize(&cwd).with_context(|| format!("resolve {}", cwd.display()))?;
    Ok(files.iter().map(|file| cwd.join(file)).collect())
}

fn resolve_project_dir(dir: Option<&Path>) -> Result<PathBuf> {
    let dir = match dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().context("resolve current directory")?,
    };
    fs::canonicalize(&dir).with_context(|| format!("resolve project dir {}", dir.display()))
}

fn cmd_init(config_path: &Path, force: bool) -> Result<i32> {
    if config_path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }
    write_config(config_path, &HookgateConfig::default())?;
    println!("wrote {}", config_path.display());
    Ok(exit_codes::OK)
}

#[derive(Serialize)]
struct TaskListing {
    name: String,
    label: Option<String>,
    blocking: bool,
    priority: i64,
    options: TaskOptions,
}

fn cmd_tasks(config_path: &Path, format: ReportFormat) -> Result<i32> {
    let config = load_config(config_path)?;
    let registry = TaskRegistry::builtin();
    let mut listings = Vec::with_capacity(config.tasks.len());
    for task in &config.tasks {
        let options = registry.resolve_options(&task.name, &task.options_json()?)?;
        listings.push(TaskListing {
            name: task.name.clone(),
            label: task.label.clone(),
            blocking: task.blocking,
            priority: task.priority,
            options,
        });
    }

    match format {
        ReportFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&listings).context("serialize task list")?
            );
        }
        ReportFormat::Text => {
            if listings.is_empty() {
                println!("No tasks configured in {}.", config_path.display());
            }
            for listing in &listings {
                let mode = if listing.blocking { "blocking" } else { "non-blocking" };
                println!(
                    "{} ({mode}, priority {})",
                    listing.label.as_deref().unwrap_or(&listing.name),
                    listing.priority
                );
                let options =
                    serde_json::to_string(&listing.options).context("serialize options")?;
                println!("    {} {options}", listing.name);
            }
        }
    }
    Ok(exit_codes::OK)
}

fn run_hook<F>(
    cli: &Cli,
    config_path: &Path,
    project_dir: &Path,
    skip_success_output: bool,
    build_context: F,
) -> Result<i32>
where
    F: FnOnce(&ChangedFiles) -> Result<RunContext>,
{
    let config = load_config(config_path)?;
    let invoker = SystemInvoker::new(
        Duration::from_secs(config.process_timeout_secs),
        config.output_limit_bytes,
    );
    let services = TaskServices::system(invoker.clone(), project_dir);
    let runner = TaskRunner::from_config(&config, &TaskRegistry::builtin(), &services)?;

    let git = Git::new(project_dir, Arc::new(invoker));
    let locator = ChangedFiles::discover(git, project_dir);
    let context = build_context(&locator)?;

    let result = runner.run(&context)?;
    match cli.format {
        ReportFormat::Json => println!("{}", report::render_json(&context, &result)?),
        ReportFormat::Text => print!(
            "{}",
            report::render_text(&context, &result, &runner.labels(), skip_success_output)
        ),
    }

    if result.is_failed() {
        Ok(exit_codes::FAILED)
    } else {
        Ok(exit_codes::OK)
    }
}
