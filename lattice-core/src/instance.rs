//! Concrete object instances.
//!
//! An instance is always validated against exactly one immutable
//! `(name, version)` pair. Rebinding to a different version is an explicit
//! migration step on the orchestrator, never implicit reinterpretation.

use crate::{new_instance_id, EntityId, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A data record bound to one object-definition version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Instance {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub instance_id: EntityId,
    /// Definition this instance was validated against.
    pub definition_name: String,
    pub definition_version: i32,
    /// Arbitrary payload conforming to the bound version's schema.
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub data: serde_json::Value,
    /// Current lifecycle state; `None` when the type declares no FSM.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_state: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Instance {
    /// Create a new instance bound to a definition version.
    pub fn new(
        definition_name: impl Into<String>,
        definition_version: i32,
        data: serde_json::Value,
        current_state: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            instance_id: new_instance_id(),
            definition_name: definition_name.into(),
            definition_version,
            data,
            current_state,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the payload, refreshing `updated_at`.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self.updated_at = Utc::now();
        self
    }

    /// Move to a new lifecycle state, refreshing `updated_at`.
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.current_state = Some(state.into());
        self.updated_at = Utc::now();
        self
    }
}
