//! Hookgate configuration stored in `hookgate.toml`.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_CONFIG_FILE: &str = "hookgate.toml";

/// Hookgate configuration (TOML).
///
/// Missing fields default to sensible values; a missing file means no tasks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HookgateConfig {
    /// Stop running further tasks after a blocking task fails.
    pub stop_on_failure: bool,

    /// Wall-clock limit for every external process, in seconds.
    pub process_timeout_secs: u64,

    /// Truncate captured stdout/stderr beyond this many bytes per stream.
    pub output_limit_bytes: usize,

    /// Tasks in execution order (before priority sorting).
    pub tasks: Vec<TaskConfig>,
}

impl Default for HookgateConfig {
    fn default() -> Self {
        Self {
            stop_on_failure: true,
            process_timeout_secs: 5 * 60,
            output_limit_bytes: 1_000_000,
            tasks: Vec::new(),
        }
    }
}

/// One `[[tasks]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    /// Registered task name, e.g. `gulp`.
    pub name: String,

    /// A failure of a blocking task fails the run.
    #[serde(default = "default_blocking")]
    pub blocking: bool,

    /// Higher priorities run first; equal priorities keep file order.
    #[serde(default)]
    pub priority: i64,

    /// Display name used in reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Task-specific options, validated against the task's schema.
    #[serde(default)]
    pub options: toml::Table,
}

fn default_blocking() -> bool {
    true
}

impl TaskConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blocking: true,
            priority: 0,
            label: None,
            options: toml::Table::new(),
        }
    }

    /// Options as JSON values, the form task schemas validate.
    pub fn options_json(&self) -> Result<Map<String, Value>> {
        let value = serde_json::to_value(&self.options)
            .with_context(|| format!("convert options of task '{}'", self.name))?;
        match value {
            Value::Object(map) => Ok(map),
            other => Err(anyhow!(
                "options of task '{}' must be a table, got {other}",
                self.name
            )),
        }
    }
}

impl HookgateConfig {
    pub fn validate(&self) -> Result<()> {
        if self.process_timeout_secs == 0 {
            return Err(anyhow!("process_timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        let mut seen = HashSet::new();
        for task in &self.tasks {
            if task.name.trim().is_empty() {
                return Err(anyhow!("task name must be non-empty"));
            }
            if !seen.insert(task.name.as_str()) {
                return Err(anyhow!("task '{}' is configured more than once", task.name));
            }
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `HookgateConfig::default()`.
pub fn load_config(path: &Path) -> Result<HookgateConfig> {
    if !path.exists() {
        let cfg = HookgateConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: HookgateConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &HookgateConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
