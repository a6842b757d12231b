//! Declared finite-state machines for object lifecycles.
//!
//! An `FsmDefinition` is data, not a running machine: it names the legal
//! states and the event-triggered transitions between them. The engine crate
//! answers transition questions against it generically.

use crate::error::DefinitionError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One declared transition. `conditions` are guard function names, ANDed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FsmTransition {
    pub from: String,
    pub to: String,
    pub event: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,
}

impl FsmTransition {
    /// Create an unguarded transition.
    pub fn new(from: impl Into<String>, to: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            event: event.into(),
            conditions: Vec::new(),
        }
    }

    /// Add a guard condition (function name).
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }
}

/// A declared state graph: initial state, state set, ordered transitions.
///
/// Transition order is significant: when several transitions share the same
/// `from` and `event`, the first declared one wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FsmDefinition {
    pub initial: String,
    pub states: Vec<String>,
    #[serde(default)]
    pub transitions: Vec<FsmTransition>,
}

impl FsmDefinition {
    /// Create an FSM with no transitions yet.
    pub fn new(initial: impl Into<String>, states: Vec<String>) -> Self {
        Self {
            initial: initial.into(),
            states,
            transitions: Vec::new(),
        }
    }

    /// Append a transition, preserving declaration order.
    pub fn with_transition(mut self, transition: FsmTransition) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Whether `state` is a declared state.
    pub fn has_state(&self, state: &str) -> bool {
        self.states.iter().any(|s| s == state)
    }

    /// Terminal states have zero outgoing transitions.
    pub fn is_terminal(&self, state: &str) -> bool {
        !self.transitions.iter().any(|t| t.from == state)
    }

    /// Check the FSM invariants. Called at definition-save time; fatal.
    ///
    /// States must be non-empty and unique, `initial` must be a member, and
    /// every transition endpoint must be a member.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.states.is_empty() {
            return Err(DefinitionError::EmptyStates);
        }

        let mut seen = HashSet::new();
        for state in &self.states {
            if !seen.insert(state.as_str()) {
                return Err(DefinitionError::DuplicateState {
                    state: state.clone(),
                });
            }
        }

        if !self.has_state(&self.initial) {
            return Err(DefinitionError::InitialStateUnknown {
                initial: self.initial.clone(),
            });
        }

        for transition in &self.transitions {
            for endpoint in [&transition.from, &transition.to] {
                if !self.has_state(endpoint) {
                    return Err(DefinitionError::TransitionEndpointUnknown {
                        event: transition.event.clone(),
                        state: endpoint.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
