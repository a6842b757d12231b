//! Structural schema nodes for dynamic object types.
//!
//! A schema is a recursive tree of tagged nodes rather than an untyped JSON
//! blob, so validators stay exhaustive and type-checked. Object nodes are
//! additive by default: properties not declared in the schema are permitted
//! unless the caller asks for strict validation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A node in a structural schema tree.
///
/// `Any` is the explicit open-shape escape hatch: it accepts every payload
/// value, including `null`. Required-ness is still enforced for `Any`
/// properties - the key must be present, the value is unconstrained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaNode {
    /// Object with named properties and a required-property set.
    Object {
        #[serde(default)]
        properties: BTreeMap<String, SchemaNode>,
        #[serde(default)]
        required: Vec<String>,
    },
    /// UTF-8 string.
    String,
    /// Any JSON number.
    Number,
    /// JSON number with no fractional part.
    Integer,
    /// Boolean.
    Boolean,
    /// Homogeneous array.
    Array { items: Box<SchemaNode> },
    /// Accepts any value, including null.
    Any,
}

impl SchemaNode {
    /// Create an empty object node.
    pub fn object() -> Self {
        SchemaNode::Object {
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    /// Add a named property. Has no effect on non-object nodes.
    pub fn with_property(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        if let SchemaNode::Object { properties, .. } = &mut self {
            properties.insert(name.into(), node);
        }
        self
    }

    /// Mark a property as required. Has no effect on non-object nodes.
    pub fn with_required(mut self, name: impl Into<String>) -> Self {
        if let SchemaNode::Object { required, .. } = &mut self {
            required.push(name.into());
        }
        self
    }

    /// Declared type name, as used in validation error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            SchemaNode::Object { .. } => "object",
            SchemaNode::String => "string",
            SchemaNode::Number => "number",
            SchemaNode::Integer => "integer",
            SchemaNode::Boolean => "boolean",
            SchemaNode::Array { .. } => "array",
            SchemaNode::Any => "any",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_builder() {
        let schema = SchemaNode::object()
            .with_property("email", SchemaNode::String)
            .with_property("age", SchemaNode::Integer)
            .with_required("email");

        match &schema {
            SchemaNode::Object {
                properties,
                required,
            } => {
                assert_eq!(properties.len(), 2);
                assert_eq!(required, &vec!["email".to_string()]);
            }
            _ => panic!("expected object node"),
        }
    }

    #[test]
    fn test_builder_is_noop_on_scalar() {
        let node = SchemaNode::String.with_property("x", SchemaNode::Any);
        assert_eq!(node, SchemaNode::String);
    }

    #[test]
    fn test_serde_tagged_representation() {
        let schema = SchemaNode::object()
            .with_property("tags", SchemaNode::Array {
                items: Box::new(SchemaNode::String),
            })
            .with_required("tags");

        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["kind"], "object");
        assert_eq!(json["properties"]["tags"]["kind"], "array");
        assert_eq!(json["properties"]["tags"]["items"]["kind"], "string");

        let back: SchemaNode = serde_json::from_value(json).unwrap();
        assert_eq!(back, schema);
    }

    #[test]
    fn test_object_defaults_when_fields_absent() {
        let schema: SchemaNode = serde_json::from_value(serde_json::json!({
            "kind": "object"
        }))
        .unwrap();
        assert_eq!(schema, SchemaNode::object());
    }

    #[test]
    fn test_type_names() {
        assert_eq!(SchemaNode::object().type_name(), "object");
        assert_eq!(SchemaNode::Any.type_name(), "any");
        assert_eq!(
            SchemaNode::Array {
                items: Box::new(SchemaNode::Number)
            }
            .type_name(),
            "array"
        );
    }
}
