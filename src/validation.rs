//! Configuration validation.
//!
//! This module validates a `serde_json::Value` configuration against a
//! [`Schema`]: structural checks (presence, types, nesting constraints) plus
//! the semantic [`Validator`]s attached to each attribute. All findings are
//! attribute-path-scoped diagnostics, reported during plan so that invalid
//! configurations never reach the HTTP client.
//!
//! # Example
//!
//! ```
//! use zentral_provider::schema::{Schema, Attribute};
//! use zentral_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::required_string())
//!     .with_attribute("batch_size", Attribute::optional_int64().between(5, 100));
//!
//! assert!(validate(&schema, &json!({"name": "t", "batch_size": 50})).is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"name": "t", "batch_size": 250}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("batch_size".to_string()));
//! ```

use crate::schema::{
    Attribute, AttributeType, Block, BlockNestingMode, Diagnostic, DiagnosticSeverity, NestedBlock,
    Schema, Validator,
};
use serde_json::Value;
use std::collections::HashMap;

/// Validate a configuration value against a schema.
///
/// Returns a list of diagnostics for any validation errors found; an empty
/// list means the configuration is valid.
///
/// # Validation Rules
///
/// - Required attributes must be present and non-null
/// - Optional attributes may be absent or null
/// - Computed-only attributes are skipped (the backend sets these)
/// - Attribute types must match the schema
/// - Semantic validators run on present values
/// - Nested blocks are validated recursively with min/max item constraints
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_block(&schema.block, value, "", &mut diagnostics);
    diagnostics
}

/// Validate a configuration, returning `Ok` if valid or `Err` with diagnostics.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a configuration is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

fn validate_block(block: &Block, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let obj = match value {
        Value::Object(map) => map,
        Value::Null => {
            // Null is valid for optional blocks, nothing further to check.
            return;
        }
        _ => {
            diagnostics.push(
                Diagnostic::error("Expected object")
                    .with_detail(format!("Got {}", value_type_name(value)))
                    .with_attribute_if_not_empty(path),
            );
            return;
        }
    };

    for (name, attr) in &block.attributes {
        let attr_path = join_path(path, name);
        let attr_value = obj.get(name);
        validate_attribute(attr, attr_value, &attr_path, diagnostics);
    }

    for (name, nested_block) in &block.blocks {
        let block_path = join_path(path, name);
        let block_value = obj.get(name);
        validate_nested_block(nested_block, block_value, &block_path, diagnostics);
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    // Computed-only attributes belong to the backend.
    if attr.flags.computed && !attr.flags.optional && !attr.flags.required {
        return;
    }

    match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(path),
                );
            }
        }
        Some(v) => {
            let before = diagnostics.len();
            validate_attribute_type(&attr.attr_type, v, path, diagnostics);
            // Semantic validators only make sense on well-typed values.
            if diagnostics.len() == before {
                for validator in &attr.validators {
                    run_validator(validator, v, path, diagnostics);
                }
            }
        }
    }
}

fn run_validator(validator: &Validator, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    match validator {
        Validator::IntBetween { min, max } => {
            if let Some(n) = value.as_i64() {
                if n < *min || n > *max {
                    diagnostics.push(
                        Diagnostic::error(format!("Invalid value for attribute '{}'", path))
                            .with_detail(format!("value must be within {}..{}", min, max))
                            .with_attribute(path),
                    );
                }
            }
        }
        Validator::OneOf(values) => {
            if let Some(s) = value.as_str() {
                if !values.iter().any(|v| v == s) {
                    diagnostics.push(
                        Diagnostic::error(format!("Invalid value for attribute '{}'", path))
                            .with_detail(format!("value must be one of: {}", values.join(", ")))
                            .with_attribute(path),
                    );
                }
            }
        }
        Validator::NonEmpty => {
            if let Some(s) = value.as_str() {
                if s.is_empty() {
                    diagnostics.push(
                        Diagnostic::error(format!("Invalid value for attribute '{}'", path))
                            .with_detail("value must not be empty")
                            .with_attribute(path),
                    );
                }
            }
        }
        Validator::ExactLength(len) => {
            if let Some(s) = value.as_str() {
                if s.chars().count() != *len {
                    diagnostics.push(
                        Diagnostic::error(format!("Invalid value for attribute '{}'", path))
                            .with_detail(format!("value must be exactly {} characters long", len))
                            .with_attribute(path),
                    );
                }
            }
        }
    }
}

fn validate_attribute_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match attr_type {
        AttributeType::String => {
            if !value.is_string() {
                diagnostics.push(type_error(path, "string", value));
            }
        }
        AttributeType::Int64 => {
            if !is_int64(value) {
                diagnostics.push(type_error(path, "int64", value));
            }
        }
        AttributeType::Float64 => {
            if !value.is_number() {
                diagnostics.push(type_error(path, "float64", value));
            }
        }
        AttributeType::Bool => {
            if !value.is_boolean() {
                diagnostics.push(type_error(path, "bool", value));
            }
        }
        AttributeType::List(element_type) | AttributeType::Set(element_type) => {
            // Sets are arrays on the wire; uniqueness and ordering are
            // handled by the plan engine, not here.
            if let Some(arr) = value.as_array() {
                for (i, elem) in arr.iter().enumerate() {
                    let elem_path = format!("{}.{}", path, i);
                    validate_attribute_type(element_type, elem, &elem_path, diagnostics);
                }
            } else {
                let expected = if matches!(attr_type, AttributeType::List(_)) {
                    "list"
                } else {
                    "set"
                };
                diagnostics.push(type_error(path, expected, value));
            }
        }
        AttributeType::Map(value_type) => {
            if let Some(obj) = value.as_object() {
                for (key, val) in obj {
                    let key_path = format!("{}.{}", path, key);
                    validate_attribute_type(value_type, val, &key_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "map", value));
            }
        }
        AttributeType::Object(attrs) => {
            if let Some(obj) = value.as_object() {
                validate_object_type(attrs, obj, path, diagnostics);
            } else {
                diagnostics.push(type_error(path, "object", value));
            }
        }
    }
}

fn validate_object_type(
    attrs: &HashMap<String, AttributeType>,
    obj: &serde_json::Map<String, Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (name, attr_type) in attrs {
        let attr_path = join_path(path, name);
        if let Some(value) = obj.get(name) {
            validate_attribute_type(attr_type, value, &attr_path, diagnostics);
        }
        // Attribute-type maps carry no required/optional flags, so presence
        // is not enforced here.
    }
}

fn validate_nested_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match nested.nesting_mode {
        BlockNestingMode::Single => {
            validate_single_block(nested, value, path, diagnostics);
        }
        BlockNestingMode::List | BlockNestingMode::Set => {
            validate_list_block(nested, value, path, diagnostics);
        }
    }
}

fn validate_single_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match value {
        None | Some(Value::Null) => {
            if nested.min_items > 0 {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required block '{}'", path))
                        .with_detail("At least one block is required")
                        .with_attribute(path),
                );
            }
        }
        Some(v) => {
            validate_block(&nested.block, v, path, diagnostics);
        }
    }
}

fn validate_list_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match value {
        None | Some(Value::Null) => {
            if nested.min_items > 0 {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' requires at least {} item(s)",
                        path, nested.min_items
                    ))
                    .with_attribute(path),
                );
            }
        }
        Some(Value::Array(arr)) => {
            let len = arr.len() as u32;

            if len < nested.min_items {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' requires at least {} item(s), got {}",
                        path, nested.min_items, len
                    ))
                    .with_attribute(path),
                );
            }

            // max_items of 0 means unlimited.
            if nested.max_items > 0 && len > nested.max_items {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' allows at most {} item(s), got {}",
                        path, nested.max_items, len
                    ))
                    .with_attribute(path),
                );
            }

            for (i, item) in arr.iter().enumerate() {
                let item_path = format!("{}.{}", path, i);
                validate_block(&nested.block, item, &item_path, diagnostics);
            }
        }
        Some(v) => {
            diagnostics.push(
                Diagnostic::error(format!("Expected list for block '{}'", path))
                    .with_detail(format!("Got {}", value_type_name(v)))
                    .with_attribute(path),
            );
        }
    }
}

// Helper functions

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            if n.as_i64().is_some() {
                true
            } else if let Some(f) = n.as_f64() {
                f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64
            } else {
                false
            }
        }
        _ => false,
    }
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic {
        severity: DiagnosticSeverity::Error,
        summary: format!("Invalid type for attribute '{}'", path),
        detail: Some(format!(
            "Expected {}, got {}",
            expected,
            value_type_name(got)
        )),
        attribute: Some(path.to_string()),
    }
}

trait DiagnosticExt {
    fn with_attribute_if_not_empty(self, path: &str) -> Self;
}

impl DiagnosticExt for Diagnostic {
    fn with_attribute_if_not_empty(self, path: &str) -> Self {
        if path.is_empty() {
            self
        } else {
            self.with_attribute(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, AttributeFlags, Block, NestedBlock, Schema};
    use serde_json::json;

    #[test]
    fn test_validate_required_string() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        let diagnostics = validate(&schema, &json!({"name": "test"}));
        assert!(diagnostics.is_empty());

        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("name".to_string()));

        let diagnostics = validate(&schema, &json!({"name": null}));
        assert_eq!(diagnostics.len(), 1);

        let diagnostics = validate(&schema, &json!({"name": 123}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Invalid type"));
    }

    #[test]
    fn test_validate_optional_attribute() {
        let schema = Schema::v0().with_attribute("count", Attribute::optional_int64());

        assert!(validate(&schema, &json!({"count": 42})).is_empty());
        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"count": null})).is_empty());
        assert_eq!(validate(&schema, &json!({"count": "nope"})).len(), 1);
    }

    #[test]
    fn test_validate_computed_attribute_skipped() {
        let schema = Schema::v0().with_attribute("id", Attribute::id_int64());

        assert!(validate(&schema, &json!({})).is_empty());
        // Computed-only attributes are never validated against config.
        assert!(validate(&schema, &json!({"id": "abc"})).is_empty());
    }

    #[test]
    fn test_validate_int_between() {
        let schema =
            Schema::v0().with_attribute("batch_size", Attribute::optional_int64().between(5, 100));

        assert!(validate(&schema, &json!({"batch_size": 5})).is_empty());
        assert!(validate(&schema, &json!({"batch_size": 100})).is_empty());

        let diagnostics = validate(&schema, &json!({"batch_size": 4}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].detail.as_deref(),
            Some("value must be within 5..100")
        );
        assert_eq!(diagnostics[0].attribute, Some("batch_size".to_string()));

        let diagnostics = validate(&schema, &json!({"batch_size": 101}));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_validate_one_of() {
        let schema = Schema::v0().with_attribute(
            "client_mode",
            Attribute::required_string().one_of(&["MONITOR", "LOCKDOWN"]),
        );

        assert!(validate(&schema, &json!({"client_mode": "MONITOR"})).is_empty());

        let diagnostics = validate(&schema, &json!({"client_mode": "AUDIT"}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].detail.as_deref(),
            Some("value must be one of: MONITOR, LOCKDOWN")
        );
    }

    #[test]
    fn test_validate_exact_length() {
        let schema = Schema::v0().with_attribute(
            "color",
            Attribute::optional_string().with_validator(crate::schema::Validator::ExactLength(6)),
        );

        assert!(validate(&schema, &json!({"color": "110000"})).is_empty());
        assert_eq!(validate(&schema, &json!({"color": "red"})).len(), 1);
    }

    #[test]
    fn test_validators_skipped_on_type_mismatch() {
        let schema =
            Schema::v0().with_attribute("batch_size", Attribute::optional_int64().between(5, 100));

        // Only the type error fires, not the range validator.
        let diagnostics = validate(&schema, &json!({"batch_size": "five"}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Invalid type"));
    }

    #[test]
    fn test_validate_set() {
        let schema = Schema::v0().with_attribute(
            "tag_ids",
            Attribute::new(
                AttributeType::set(AttributeType::Int64),
                AttributeFlags::optional(),
            ),
        );

        assert!(validate(&schema, &json!({"tag_ids": [1, 2, 3]})).is_empty());
        assert!(validate(&schema, &json!({"tag_ids": []})).is_empty());

        let diagnostics = validate(&schema, &json!({"tag_ids": [1, "two"]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("tag_ids.1".to_string()));

        assert_eq!(validate(&schema, &json!({"tag_ids": "nope"})).len(), 1);
    }

    #[test]
    fn test_validate_nested_block_single() {
        let schema = Schema::v0().with_block(
            "static_challenge",
            NestedBlock::single(
                Block::new().with_attribute("challenge", Attribute::required_string()),
            ),
        );

        assert!(validate(&schema, &json!({"static_challenge": {"challenge": "Yolo"}})).is_empty());
        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"static_challenge": null})).is_empty());

        let diagnostics = validate(&schema, &json!({"static_challenge": {"challenge": 5}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute,
            Some("static_challenge.challenge".to_string())
        );
    }

    #[test]
    fn test_validate_nested_block_set() {
        let schema = Schema::v0().with_block(
            "tag_shards",
            NestedBlock::set(
                Block::new()
                    .with_attribute("tag_id", Attribute::required_int64())
                    .with_attribute("shard", Attribute::required_int64()),
            ),
        );

        assert!(validate(
            &schema,
            &json!({"tag_shards": [{"tag_id": 1, "shard": 4}]})
        )
        .is_empty());

        let diagnostics = validate(&schema, &json!({"tag_shards": [{"tag_id": 1}]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute,
            Some("tag_shards.0.shard".to_string())
        );
    }

    #[test]
    fn test_validate_block_item_limits() {
        let schema = Schema::v0().with_block(
            "entries",
            NestedBlock::list(Block::new().with_attribute("port", Attribute::required_int64()))
                .with_min_items(1)
                .with_max_items(2),
        );

        let diagnostics = validate(&schema, &json!({"entries": []}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("at least 1"));

        let diagnostics = validate(
            &schema,
            &json!({"entries": [{"port": 1}, {"port": 2}, {"port": 3}]}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("at most 2"));
    }

    #[test]
    fn test_validate_multiple_errors() {
        let schema = Schema::v0()
            .with_attribute("name", Attribute::required_string())
            .with_attribute("count", Attribute::required_int64())
            .with_attribute("enabled", Attribute::required_bool());

        let diagnostics = validate(
            &schema,
            &json!({"name": 123, "count": "not a number", "enabled": "yes"}),
        );
        assert_eq!(diagnostics.len(), 3);
    }

    #[test]
    fn test_validate_root_not_object() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        let diagnostics = validate(&schema, &json!("not an object"));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Expected object"));
    }

    #[test]
    fn test_is_valid_and_result_helpers() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        assert!(is_valid(&schema, &json!({"name": "test"})));
        assert!(!is_valid(&schema, &json!({})));
        assert!(validate_result(&schema, &json!({"name": "t"})).is_ok());
        assert_eq!(validate_result(&schema, &json!({})).unwrap_err().len(), 1);
    }
}
