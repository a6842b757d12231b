//! LATTICE Test Utilities
//!
//! Centralized test infrastructure for the LATTICE workspace:
//! - Definition fixtures for common scenarios
//! - Scripted capabilities (re-exported from lattice-rules)
//! - Proptest generators for schema trees

// Re-export the deterministic capability double from its source crate
pub use lattice_rules::ScriptedCapabilities;

// Re-export core types for convenience
pub use lattice_core::{
    ApiDescriptor, CapabilityError, DefinitionError, DefinitionPatch, FsmDefinition,
    FsmTransition, Instance, LatticeError, LatticeResult, ObjectDefinition, RejectionReason,
    RuleConfig, SchemaNode, StoreError, TransitionRejection, TransitionResult, ValidationIssue,
    ValidationResult, ValidationRule,
};
pub use lattice_fsm::{decide, initial_state, TransitionDecision};
pub use lattice_registry::{DefinitionStore, InMemoryDefinitionStore, Registry};
pub use lattice_schema::{validate, validate_with_mode, ValidationMode};

use proptest::prelude::*;

// ============================================================================
// DEFINITION FIXTURES
// ============================================================================

/// Contact type: required email with a regex format rule.
pub fn contact_patch() -> DefinitionPatch {
    DefinitionPatch::schema(
        SchemaNode::object()
            .with_property("email", SchemaNode::String)
            .with_property("name", SchemaNode::String)
            .with_required("email"),
    )
    .with_rules(vec![ValidationRule::regex(
        "email_format",
        "email",
        r"^[^@\s]+@[^@\s]+\.[^@\s]+$",
    )])
}

/// Ticket type: required email plus a draft/active lifecycle.
///
/// Matches the canonical end-to-end scenario: schema requires "email"; FSM
/// starts in "draft" and moves to "active" on "activate".
pub fn ticket_patch() -> DefinitionPatch {
    DefinitionPatch::schema(
        SchemaNode::object()
            .with_property("email", SchemaNode::String)
            .with_required("email"),
    )
    .with_states(
        FsmDefinition::new("draft", vec!["draft".to_string(), "active".to_string()])
            .with_transition(FsmTransition::new("draft", "active", "activate")),
    )
}

/// Approval type: guarded review lifecycle exercising function rules and
/// guard conditions together.
pub fn approval_patch() -> DefinitionPatch {
    DefinitionPatch::schema(
        SchemaNode::object()
            .with_property("amount", SchemaNode::Number)
            .with_required("amount"),
    )
    .with_rules(vec![ValidationRule::function(
        "amount_in_budget",
        "check_budget",
    )])
    .with_states(
        FsmDefinition::new(
            "submitted",
            vec![
                "submitted".to_string(),
                "approved".to_string(),
                "rejected".to_string(),
            ],
        )
        .with_transition(
            FsmTransition::new("submitted", "approved", "review").with_condition("is_manager"),
        )
        .with_transition(FsmTransition::new("submitted", "rejected", "review")),
    )
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

/// Strategy producing arbitrary scalar schema nodes.
pub fn arb_scalar_node() -> impl Strategy<Value = SchemaNode> {
    prop_oneof![
        Just(SchemaNode::String),
        Just(SchemaNode::Number),
        Just(SchemaNode::Integer),
        Just(SchemaNode::Boolean),
        Just(SchemaNode::Any),
    ]
}

/// Strategy producing arbitrary schema trees of bounded depth.
pub fn arb_schema_node(depth: u32) -> impl Strategy<Value = SchemaNode> {
    arb_scalar_node().prop_recursive(depth, 24, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(|items| SchemaNode::Array {
                items: Box::new(items)
            }),
            proptest::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(|properties| {
                let required = properties.keys().take(1).cloned().collect();
                SchemaNode::Object {
                    properties,
                    required,
                }
            }),
        ]
    })
}

// =============================================================================
// TESTS
// =============================================================================
