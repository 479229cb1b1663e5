//! Ruleset descriptor loading and validation.
//!
//! The descriptor is a small JSON file at the project root naming a rule
//! source and a selection of subtrees and files to merge. Validation runs
//! over the raw JSON value before typed deserialization so every violated
//! field is reported at once, with its instance path.

use crate::errors::ComposeError;
use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Default descriptor filename searched for under the project root.
pub const DEFAULT_RULESET_NAME: &str = "agent-ruleset.json";

/// Default output path, relative to the descriptor's directory.
pub const DEFAULT_OUTPUT: &str = "AGENTS.md";

fn default_true() -> bool {
    true
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

/// A project's ruleset descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RulesetDescriptor {
    /// Rule corpus location: a local path (relative to this file's
    /// directory) or a `github:owner/repo@ref` locator.
    pub source: String,

    /// Include the `global/` subtree.
    #[serde(default = "default_true")]
    pub global: bool,

    /// Domain subtrees under `domains/`, merged in this order.
    #[serde(default)]
    pub domains: Vec<String>,

    /// Additional rule files, relative to this file's directory, merged
    /// after all subtrees.
    #[serde(default)]
    pub extra: Vec<String>,

    /// Output file path, relative to this file's directory.
    #[serde(default = "default_output")]
    pub output: String,
}

/// Load and validate a descriptor, applying defaults for absent fields.
pub fn load_ruleset(path: &Path) -> Result<RulesetDescriptor> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read ruleset file: {}", path.display()))?;

    let value: Value = serde_json::from_str(&raw).map_err(|source| ComposeError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let violations = validate_descriptor(&value);
    if !violations.is_empty() {
        return Err(ComposeError::Schema {
            path: path.to_path_buf(),
            violations,
        }
        .into());
    }

    let descriptor = serde_json::from_value(value).map_err(|source| ComposeError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(descriptor)
}

/// Check a parsed descriptor against the schema, returning every violation.
/// Unknown fields are ignored.
pub fn validate_descriptor(value: &Value) -> Vec<String> {
    let mut violations = Vec::new();

    let Some(object) = value.as_object() else {
        violations.push("(root) must be an object".to_string());
        return violations;
    };

    match object.get("source") {
        None => violations.push("(root) must have required property 'source'".to_string()),
        Some(source) => check_non_empty_string("/source", source, &mut violations),
    }

    if let Some(global) = object.get("global") {
        if !global.is_boolean() {
            violations.push("/global must be a boolean".to_string());
        }
    }

    check_string_array("/domains", object.get("domains"), &mut violations);
    check_string_array("/extra", object.get("extra"), &mut violations);

    if let Some(output) = object.get("output") {
        check_non_empty_string("/output", output, &mut violations);
    }

    violations
}

fn check_non_empty_string(path: &str, value: &Value, violations: &mut Vec<String>) {
    match value.as_str() {
        None => violations.push(format!("{} must be a string", path)),
        Some(text) if text.trim().is_empty() => {
            violations.push(format!("{} must be a non-empty string", path));
        }
        Some(_) => {}
    }
}

fn check_string_array(path: &str, value: Option<&Value>, violations: &mut Vec<String>) {
    let Some(value) = value else {
        return;
    };
    let Some(items) = value.as_array() else {
        violations.push(format!("{} must be an array of strings", path));
        return;
    };
    for (index, item) in items.iter().enumerate() {
        check_non_empty_string(&format!("{}/{}", path, index), item, violations);
    }
}
