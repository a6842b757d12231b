//! Wire-facing result types.
//!
//! These are the shapes the engine exposes to transport layers: plain data,
//! JSON-serializable, with no engine-internal types leaking. Rejection
//! reasons serialize in snake_case (`no_matching_transition`,
//! `condition_failed`).

use serde::{Deserialize, Serialize};

/// A single validation failure, located by dot-notation path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ValidationIssue {
    /// Dot-notation path to the offending value ("" for payload-level issues).
    pub path: String,
    /// Human-readable message.
    pub message: String,
}

impl ValidationIssue {
    /// Create a new issue.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of structural or rule validation.
///
/// Validators collect ALL errors rather than short-circuiting, so callers
/// get a single round-trip error report. `errors` is empty iff `valid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ValidationResult {
    /// Whether validation passed.
    pub valid: bool,
    /// Ordered list of failures.
    pub errors: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Create a passing result with no errors.
    pub fn valid() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    /// Create a failing result from a non-empty error list.
    pub fn invalid(errors: Vec<ValidationIssue>) -> Self {
        Self {
            valid: false,
            errors,
        }
    }

    /// Record a failure. Marks the result invalid.
    pub fn add_error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationIssue::new(path, message));
    }

    /// Fold another result into this one, preserving error order.
    pub fn merge(&mut self, other: ValidationResult) {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::valid()
    }
}

/// Why a transition request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// No declared transition matches the current state and event.
    NoMatchingTransition,
    /// A matching transition exists but a guard condition did not hold.
    ConditionFailed,
}

/// A rejected transition, with the failing detail when available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TransitionRejection {
    pub reason: RejectionReason,
    /// Failing guard name or capability error text, if any.
    pub detail: Option<String>,
}

impl TransitionRejection {
    /// Rejection with no matching transition.
    pub fn no_match() -> Self {
        Self {
            reason: RejectionReason::NoMatchingTransition,
            detail: None,
        }
    }

    /// Rejection because a guard condition failed.
    pub fn condition_failed(detail: impl Into<String>) -> Self {
        Self {
            reason: RejectionReason::ConditionFailed,
            detail: Some(detail.into()),
        }
    }
}

/// Wire shape for transition outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TransitionResult {
    /// Whether the transition was accepted.
    pub accepted: bool,
    /// Target state, present iff accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_state: Option<String>,
    /// Rejection reason, present iff rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectionReason>,
}

impl TransitionResult {
    /// Accepted transition into `to_state`.
    pub fn accepted(to_state: impl Into<String>) -> Self {
        Self {
            accepted: true,
            to_state: Some(to_state.into()),
            reason: None,
        }
    }

    /// Rejected transition.
    pub fn rejected(reason: RejectionReason) -> Self {
        Self {
            accepted: false,
            to_state: None,
            reason: Some(reason),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
