//! Embedded JSON Schema for layout configs.

use std::sync::OnceLock;

use jsonschema::Validator;
use serde_json::Value;

use crate::error::{LayoutError, Result};

/// JSON Schema (2020-12) every layout config must satisfy.
pub const LAYOUT_SCHEMA: &str = r##"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "padrelay byte layout",
  "type": "object",
  "required": ["output_size"],
  "properties": {
    "output_size": { "type": "integer", "minimum": 1, "maximum": 65536 },
    "legacy_sentinels": { "type": "boolean" },
    "bytes": { "type": "array", "items": { "$ref": "#/$defs/mapping" } }
  },
  "$defs": {
    "mapping": {
      "type": "object",
      "required": ["type"],
      "properties": {
        "type": { "enum": ["const", "field", "bits"] }
      },
      "allOf": [
        {
          "if": { "properties": { "type": { "const": "const" } } },
          "then": {
            "properties": { "value": { "type": "integer", "minimum": 0, "maximum": 255 } }
          }
        },
        {
          "if": { "properties": { "type": { "const": "field" } } },
          "then": {
            "required": ["field"],
            "properties": { "field": { "type": "string" } }
          }
        },
        {
          "if": { "properties": { "type": { "const": "bits" } } },
          "then": {
            "properties": { "bits": { "type": "array", "items": { "$ref": "#/$defs/bit" } } }
          }
        }
      ]
    },
    "bit": {
      "type": "object",
      "required": ["pos", "field"],
      "properties": {
        "pos": { "type": "integer", "minimum": 0, "maximum": 7 },
        "field": { "type": "string" }
      }
    }
  }
}"##;

/// Maximum number of schema violations reported in one error.
const MAX_REPORTED_ERRORS: usize = 4;

fn validator() -> Result<&'static Validator> {
    static VALIDATOR: OnceLock<std::result::Result<Validator, String>> = OnceLock::new();

    VALIDATOR
        .get_or_init(|| {
            let schema: Value = serde_json::from_str(LAYOUT_SCHEMA).map_err(|e| e.to_string())?;
            jsonschema::validator_for(&schema).map_err(|e| e.to_string())
        })
        .as_ref()
        .map_err(|err| LayoutError::Schema(format!("embedded schema failed to compile: {err}")))
}

/// Validate a parsed config document against [`LAYOUT_SCHEMA`].
pub fn validate(value: &Value) -> Result<()> {
    let validator = validator()?;

    let mut errors = validator.iter_errors(value);
    if let Some(first) = errors.next() {
        let mut message = first.to_string();
        for err in errors.take(MAX_REPORTED_ERRORS - 1) {
            message.push_str("; ");
            message.push_str(&err.to_string());
        }
        return Err(LayoutError::Schema(message));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn embedded_schema_compiles() {
        assert!(validator().is_ok());
    }

    #[test]
    fn accepts_all_mapping_kinds() {
        let config = json!({
            "output_size": 3,
            "bytes": [
                {"type": "const", "value": 255},
                {"type": "field", "field": "LjoyX"},
                {"type": "bits", "bits": [{"pos": 7, "field": "N"}]}
            ]
        });
        validate(&config).unwrap();
    }

    #[test]
    fn rejects_unknown_mapping_type() {
        let config = json!({"output_size": 1, "bytes": [{"type": "nibble"}]});
        assert!(matches!(validate(&config), Err(LayoutError::Schema(_))));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let bad_const = json!({"output_size": 1, "bytes": [{"type": "const", "value": 256}]});
        let bad_pos = json!({"output_size": 1, "bytes": [{"type": "bits", "bits": [{"pos": 8, "field": "N"}]}]});
        let bad_size = json!({"output_size": 0, "bytes": []});
        let too_wide = json!({"output_size": 65537, "bytes": []});

        assert!(validate(&bad_const).is_err());
        assert!(validate(&bad_pos).is_err());
        assert!(validate(&bad_size).is_err());
        assert!(validate(&too_wide).is_err());
        assert!(validate(&json!({"output_size": 65536})).is_ok());
    }

    #[test]
    fn rejects_missing_output_size() {
        let err = validate(&json!({"bytes": []})).unwrap_err();
        assert!(err.to_string().contains("output_size"));
    }

    #[test]
    fn field_mapping_requires_field_name() {
        let config = json!({"output_size": 1, "bytes": [{"type": "field"}]});
        assert!(validate(&config).is_err());
    }
}
