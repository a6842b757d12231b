//! LATTICE FSM - Transition Decisions
//!
//! Answers transition questions generically for any declared state graph;
//! it never holds per-instance state. Guard conditions run through the same
//! injected `Capabilities` interface as rule evaluation, so lifecycle logic
//! stays deterministic to test.

use lattice_core::fsm::FsmDefinition;
use lattice_core::result::TransitionRejection;
use lattice_rules::Capabilities;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of asking whether a transition is legal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionDecision {
    /// The transition is legal; move to this state.
    Allowed { to: String },
    /// No legal transition; the rejection names the reason.
    Rejected(TransitionRejection),
}

/// The state a freshly created instance of this type starts in.
pub fn initial_state(fsm: &FsmDefinition) -> &str {
    &fsm.initial
}

/// Decide whether `event` may fire from `from_state`.
///
/// Scans transitions in declaration order and takes the FIRST entry whose
/// `from` and `event` match - later duplicates never win, keeping lifecycle
/// behavior deterministic. The winner's conditions are ANDed guard function
/// names, short-circuiting on the first that does not hold. A guard that
/// cannot run (capability fault) has not held: the decision is
/// `condition_failed`, never a fatal error.
pub async fn decide(
    fsm: &FsmDefinition,
    from_state: &str,
    event: &str,
    payload: &Value,
    capabilities: &dyn Capabilities,
) -> TransitionDecision {
    let transition = fsm
        .transitions
        .iter()
        .find(|t| t.from == from_state && t.event == event);

    let Some(transition) = transition else {
        return TransitionDecision::Rejected(TransitionRejection::no_match());
    };

    for condition in &transition.conditions {
        match capabilities.run_function(condition, payload).await {
            Ok(Value::Bool(true)) => {}
            Ok(_) => {
                return TransitionDecision::Rejected(TransitionRejection::condition_failed(
                    format!("condition '{}' did not hold", condition),
                ));
            }
            Err(err) => {
                return TransitionDecision::Rejected(TransitionRejection::condition_failed(
                    format!("condition '{}' could not run: {}", condition, err),
                ));
            }
        }
    }

    TransitionDecision::Allowed {
        to: transition.to.clone(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
