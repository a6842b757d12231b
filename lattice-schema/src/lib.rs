//! LATTICE Schema - Structural Validation
//!
//! Validates instance payloads against a definition's schema tree. Pure
//! functions over their inputs: no I/O, no state, deterministic. The
//! validator collects ALL errors instead of short-circuiting, so callers
//! get one complete report per round trip.

use lattice_core::path::{join_path, json_type_name};
use lattice_core::result::ValidationResult;
use lattice_core::schema::SchemaNode;
use serde_json::Value;

/// How to treat payload properties not declared in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Undeclared properties are permitted (the schema is additive).
    #[default]
    Additive,
    /// Undeclared properties are errors.
    Strict,
}

/// Validate a payload against a schema in additive mode.
pub fn validate(schema: &SchemaNode, payload: &Value) -> ValidationResult {
    validate_with_mode(schema, payload, ValidationMode::Additive)
}

/// Validate a payload against a schema with an explicit unknown-property policy.
pub fn validate_with_mode(
    schema: &SchemaNode,
    payload: &Value,
    mode: ValidationMode,
) -> ValidationResult {
    let mut result = ValidationResult::valid();
    check_node(schema, payload, "", mode, &mut result);
    result
}

/// Recursively validate one node, appending issues to `result`.
fn check_node(
    schema: &SchemaNode,
    value: &Value,
    path: &str,
    mode: ValidationMode,
    result: &mut ValidationResult,
) {
    match schema {
        // Open shape: accepts everything, including null.
        SchemaNode::Any => {}

        SchemaNode::String => {
            if !value.is_string() {
                add_type_mismatch(result, path, "string", value);
            }
        }

        SchemaNode::Number => {
            if !value.is_number() {
                add_type_mismatch(result, path, "number", value);
            }
        }

        SchemaNode::Integer => {
            let is_integer = value
                .as_number()
                .is_some_and(|n| n.is_i64() || n.is_u64());
            if !is_integer {
                add_type_mismatch(result, path, "integer", value);
            }
        }

        SchemaNode::Boolean => {
            if !value.is_boolean() {
                add_type_mismatch(result, path, "boolean", value);
            }
        }

        SchemaNode::Array { items } => match value.as_array() {
            Some(elements) => {
                for (index, element) in elements.iter().enumerate() {
                    check_node(items, element, &join_path(path, &index.to_string()), mode, result);
                }
            }
            None => add_type_mismatch(result, path, "array", value),
        },

        SchemaNode::Object {
            properties,
            required,
        } => match value.as_object() {
            Some(map) => {
                for name in required {
                    if !map.contains_key(name) {
                        result.add_error(join_path(path, name), "missing required field");
                    }
                }

                for (name, child) in map {
                    match properties.get(name) {
                        Some(node) => {
                            check_node(node, child, &join_path(path, name), mode, result)
                        }
                        // A required name with no declared property node is
                        // presence-only: any shape passes.
                        None => {
                            if mode == ValidationMode::Strict && !required.contains(name) {
                                result.add_error(
                                    join_path(path, name),
                                    "unknown property not declared in schema",
                                );
                            }
                        }
                    }
                }
            }
            None => add_type_mismatch(result, path, "object", value),
        },
    }
}

fn add_type_mismatch(result: &mut ValidationResult, path: &str, expected: &str, actual: &Value) {
    result.add_error(
        path,
        format!(
            "type mismatch: expected {}, got {}",
            expected,
            json_type_name(actual)
        ),
    );
}

// =============================================================================
// TESTS
// =============================================================================
