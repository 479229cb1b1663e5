//! JSON Schema export for the ruleset descriptor.
//!
//! `agentsmd --schema` prints the schema so editors and agents can validate
//! descriptors without running a composition.

use crate::ruleset::RulesetDescriptor;
use anyhow::Result;
use schemars::{schema_for, schema::RootSchema};

/// Schema describing `agent-ruleset.json`.
pub fn descriptor_schema() -> RootSchema {
    schema_for!(RulesetDescriptor)
}

/// Pretty-printed schema JSON.
pub fn descriptor_schema_json() -> Result<String> {
    Ok(serde_json::to_string_pretty(&descriptor_schema())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_source_is_required() {
        let schema = serde_json::to_value(descriptor_schema()).unwrap();
        let required = schema["required"]
            .as_array()
            .expect("schema should list required properties");
        assert_eq!(required, &[serde_json::json!("source")]);
    }

    #[test]
    fn schema_names_every_descriptor_field() {
        let schema = serde_json::to_value(descriptor_schema()).unwrap();
        let properties = schema["properties"].as_object().unwrap();
        for field in ["source", "global", "domains", "extra", "output"] {
            assert!(properties.contains_key(field), "missing {field}");
        }
    }
}
