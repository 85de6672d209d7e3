//! Declared task options and their resolution against user configuration.
//!
//! Each task publishes an [`OptionsSchema`]. Resolving a raw option table
//! rejects unknown keys, wrong types and disallowed values, then fills in
//! defaults, yielding [`TaskOptions`].

use std::collections::BTreeMap;

use anyhow::{Result, anyhow, bail};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    /// A string or null.
    OptionalString,
    Bool,
    Integer,
    StringList,
}

impl OptionKind {
    fn describe(self) -> &'static str {
        match self {
            OptionKind::String => "a string",
            OptionKind::OptionalString => "a string or null",
            OptionKind::Bool => "a boolean",
            OptionKind::Integer => "an integer",
            OptionKind::StringList => "a list of strings",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            OptionKind::String => value.is_string(),
            OptionKind::OptionalString => value.is_string() || value.is_null(),
            OptionKind::Bool => value.is_boolean(),
            OptionKind::Integer => value.is_i64(),
            OptionKind::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionSpec {
    pub name: &'static str,
    pub kind: OptionKind,
    pub default: Value,
    /// Allowed values; empty means any value of the right kind.
    pub allowed: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionsSchema {
    specs: Vec<OptionSpec>,
}

impl OptionsSchema {
    pub fn new() -> Self {
        Self::default()
    }

    fn with(mut self, name: &'static str, kind: OptionKind, default: Value) -> Self {
        self.specs.retain(|spec| spec.name != name);
        self.specs.push(OptionSpec {
            name,
            kind,
            default,
            allowed: Vec::new(),
        });
        self
    }

    pub fn string(self, name: &'static str, default: &str) -> Self {
        self.with(name, OptionKind::String, Value::from(default))
    }

    pub fn optional_string(self, name: &'static str) -> Self {
        self.with(name, OptionKind::OptionalString, Value::Null)
    }

    pub fn bool(self, name: &'static str, default: bool) -> Self {
        self.with(name, OptionKind::Bool, Value::from(default))
    }

    pub fn integer(self, name: &'static str, default: i64) -> Self {
        self.with(name, OptionKind::Integer, Value::from(default))
    }

    pub fn string_list(self, name: &'static str, default: &[&str]) -> Self {
        self.with(name, OptionKind::StringList, Value::from(default.to_vec()))
    }

    /// Restrict `name` to the given values.
    pub fn allowed_values(mut self, name: &'static str, values: Vec<Value>) -> Self {
        if let Some(spec) = self.specs.iter_mut().find(|spec| spec.name == name) {
            spec.allowed = values;
        }
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.specs.iter().map(|spec| spec.name).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.specs.iter().any(|spec| spec.name == name)
    }

    /// Validate `raw` against the schema and fill in defaults.
    pub fn resolve(&self, raw: &Map<String, Value>) -> Result<TaskOptions> {
        let mut unknown: Vec<&str> = raw
            .keys()
            .map(String::as_str)
            .filter(|key| !self.contains(key))
            .collect();
        if !unknown.is_empty() {
            unknown.sort_unstable();
            bail!(
                "unknown option(s) {}; expected one of: {}",
                unknown.join(", "),
                self.names().join(", ")
            );
        }

        let mut values = BTreeMap::new();
        for spec in &self.specs {
            let value = raw.get(spec.name).cloned().unwrap_or_else(|| spec.default.clone());
            if !spec.kind.accepts(&value) {
                return Err(anyhow!(
                    "option '{}' must be {}, got {}",
                    spec.name,
                    spec.kind.describe(),
                    value
                ));
            }
            if !spec.allowed.is_empty() && !spec.allowed.contains(&value) {
                let allowed: Vec<String> = spec.allowed.iter().map(Value::to_string).collect();
                return Err(anyhow!(
                    "option '{}' has value {}, allowed: {}",
                    spec.name,
                    value,
                    allowed.join(", ")
                ));
            }
            values.insert(spec.name.to_string(), value);
        }
        Ok(TaskOptions { values })
    }
}

/// Resolved, validated options for one configured task.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TaskOptions {
    values: BTreeMap<String, Value>,
}

impl TaskOptions {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// String value, `None` when unset or null.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn get_bool(&self, name: &str) -> bool {
        self.values.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(Value::as_i64)
    }

    pub fn get_string_list(&self, name: &str) -> Vec<String> {
        self.values
            .get(name)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> OptionsSchema {
        OptionsSchema::new()
            .string("directory", "features")
            .optional_string("config")
            .allowed_values("config", vec![Value::Null, json!("text")])
            .string_list("triggered_by", &["feature"])
            .bool("verbose", false)
    }

    fn raw(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn defaults_fill_missing_keys() {
        let options = schema().resolve(&Map::new()).expect("resolve");
        assert_eq!(options.get_str("directory"), Some("features"));
        assert_eq!(options.get_str("config"), None);
        assert_eq!(options.get_string_list("triggered_by"), vec!["feature"]);
        assert!(!options.get_bool("verbose"));
    }

    #[test]
    fn explicit_values_override_defaults() {
        let options = schema()
            .resolve(&raw(json!({"directory": "specs", "config": "text", "verbose": true})))
            .expect("resolve");
        assert_eq!(options.get_str("directory"), Some("specs"));
        assert_eq!(options.get_str("config"), Some("text"));
        assert!(options.get_bool("verbose"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = schema()
            .resolve(&raw(json!({"directroy": "x"})))
            .unwrap_err();
        assert!(err.to_string().contains("unknown option(s) directroy"));
    }

    #[test]
    fn wrong_type_is_rejected() {
        let err = schema()
            .resolve(&raw(json!({"triggered_by": "feature"})))
            .unwrap_err();
        assert!(err.to_string().contains("must be a list of strings"));
    }

    #[test]
    fn disallowed_value_is_rejected() {
        let err = schema()
            .resolve(&raw(json!({"config": "yaml"})))
            .unwrap_err();
        assert!(err.to_string().contains("allowed"));
    }

    #[test]
    fn redeclaring_an_option_replaces_it() {
        let schema = OptionsSchema::new().string("task", "a").string("task", "b");
        assert_eq!(schema.names(), vec!["task"]);
        let options = schema.resolve(&Map::new()).expect("resolve");
        assert_eq!(options.get_str("task"), Some("b"));
    }
}
