//! Versioned object-type definitions.
//!
//! A definition row is immutable once written. Mutation happens by writing a
//! new row with `version + 1`; prior versions stay resolvable for audit.
//! Soft delete sets `deleted_at` and freezes the name without removing rows.

use crate::error::DefinitionError;
use crate::fsm::FsmDefinition;
use crate::rule::ValidationRule;
use crate::schema::SchemaNode;
use crate::{new_definition_id, EntityId, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One stored version of an object-type definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ObjectDefinition {
    /// Row identity (unique per version).
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub definition_id: EntityId,
    /// Logical identity; storage key is `(name, version)`.
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    /// Monotonically increasing, starting at 1.
    pub version: i32,
    pub schema: SchemaNode,
    /// Ordered; evaluated in declaration order.
    #[serde(default)]
    pub rules: Vec<ValidationRule>,
    /// Lifecycle state graph, if this type has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub states: Option<FsmDefinition>,
    /// Opaque rendering metadata; never interpreted by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub ui_hints: Option<serde_json::Value>,
    /// Names of other object types this type may reference.
    #[serde(default)]
    pub relationships: Vec<String>,
    pub is_active: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
    /// Soft-delete marker; once set, the name is excluded from active lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub deleted_at: Option<Timestamp>,
}

impl ObjectDefinition {
    /// Create version 1 of a definition.
    pub fn new(name: impl Into<String>, display_name: impl Into<String>, schema: SchemaNode) -> Self {
        let now = Utc::now();
        Self {
            definition_id: new_definition_id(),
            name: name.into(),
            display_name: display_name.into(),
            description: None,
            version: 1,
            schema,
            rules: Vec::new(),
            states: None,
            ui_hints: None,
            relationships: Vec::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Set the rules.
    pub fn with_rules(mut self, rules: Vec<ValidationRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Set the state graph.
    pub fn with_states(mut self, fsm: FsmDefinition) -> Self {
        self.states = Some(fsm);
        self
    }

    /// Set the relationship declarations.
    pub fn with_relationships(mut self, relationships: Vec<String>) -> Self {
        self.relationships = relationships;
        self
    }

    /// Whether this definition has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Check the definition invariants. Fatal at save time.
    ///
    /// Rule names must be unique and each rule config well-formed; the FSM,
    /// when present, must satisfy its own invariants.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.name.as_str()) {
                return Err(DefinitionError::DuplicateRule {
                    rule: rule.name.clone(),
                });
            }
            rule.validate()?;
        }

        if let Some(fsm) = &self.states {
            fsm.validate()?;
        }

        Ok(())
    }
}

/// Copy-forward patch for creating the next definition version.
///
/// Unspecified fields are carried over from the previous version, so a
/// caller updating only the rules cannot accidentally drop the schema.
/// Full-replace is opt-in: specify every field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DefinitionPatch {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub schema: Option<SchemaNode>,
    pub rules: Option<Vec<ValidationRule>>,
    pub states: Option<FsmDefinition>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub ui_hints: Option<serde_json::Value>,
    pub relationships: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

impl DefinitionPatch {
    /// Patch that replaces only the schema.
    pub fn schema(schema: SchemaNode) -> Self {
        Self {
            schema: Some(schema),
            ..Self::default()
        }
    }

    /// Set the rules on this patch.
    pub fn with_rules(mut self, rules: Vec<ValidationRule>) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Set the state graph on this patch.
    pub fn with_states(mut self, fsm: FsmDefinition) -> Self {
        self.states = Some(fsm);
        self
    }

    /// Build the next version row from the previous one.
    ///
    /// The new row gets a fresh `definition_id`, `version + 1`, and fresh
    /// timestamps; every unspecified field is copied forward.
    pub fn apply(self, previous: &ObjectDefinition) -> ObjectDefinition {
        let now = Utc::now();
        ObjectDefinition {
            definition_id: new_definition_id(),
            name: previous.name.clone(),
            display_name: self.display_name.unwrap_or_else(|| previous.display_name.clone()),
            description: self.description.or_else(|| previous.description.clone()),
            version: previous.version + 1,
            schema: self.schema.unwrap_or_else(|| previous.schema.clone()),
            rules: self.rules.unwrap_or_else(|| previous.rules.clone()),
            states: self.states.or_else(|| previous.states.clone()),
            ui_hints: self.ui_hints.or_else(|| previous.ui_hints.clone()),
            relationships: self
                .relationships
                .unwrap_or_else(|| previous.relationships.clone()),
            is_active: self.is_active.unwrap_or(previous.is_active),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Build version 1 for a name with no prior versions.
    ///
    /// A schema is the one mandatory field; `display_name` falls back to the
    /// type name.
    pub fn into_initial(self, name: &str) -> Result<ObjectDefinition, DefinitionError> {
        let schema = self.schema.ok_or_else(|| DefinitionError::MissingSchema {
            name: name.to_string(),
        })?;

        let mut definition = ObjectDefinition::new(
            name,
            self.display_name.unwrap_or_else(|| name.to_string()),
            schema,
        );
        definition.description = self.description;
        definition.rules = self.rules.unwrap_or_default();
        definition.states = self.states;
        definition.ui_hints = self.ui_hints;
        definition.relationships = self.relationships.unwrap_or_default();
        definition.is_active = self.is_active.unwrap_or(true);
        Ok(definition)
    }
}

// =============================================================================
// TESTS
// =============================================================================
