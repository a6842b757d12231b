//! Error types for LATTICE operations.
//!
//! Validation, rule, and transition failures are aggregated into result
//! values and never surface here. Only definition invariant violations,
//! storage faults, and capability faults are typed errors - and capability
//! faults are downgraded to rule failures before they cross the engine
//! boundary.

use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("No active definition named '{name}'")]
    NotFound { name: String },

    #[error("Definition '{name}' has no version {version}")]
    VersionNotFound { name: String, version: i32 },

    #[error("Version conflict for {name}: version {version} already exists")]
    VersionConflict { name: String, version: i32 },

    #[error("Insert failed for {name}: {reason}")]
    InsertFailed { name: String, reason: String },

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Definition invariant violations.
///
/// Fatal at definition-save time: `create_version` must refuse the write.
/// Never deferred to evaluation time.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("Initial state '{initial}' is not a declared state")]
    InitialStateUnknown { initial: String },

    #[error("Transition for event '{event}' references undeclared state '{state}'")]
    TransitionEndpointUnknown { event: String, state: String },

    #[error("Duplicate state name '{state}'")]
    DuplicateState { state: String },

    #[error("FSM declares no states")]
    EmptyStates,

    #[error("Duplicate rule name '{rule}'")]
    DuplicateRule { rule: String },

    #[error("Invalid config for rule '{rule}': {reason}")]
    InvalidRuleConfig { rule: String, reason: String },

    #[error("New definition '{name}' has no schema")]
    MissingSchema { name: String },
}

/// Failures from the injected capability interface.
///
/// The engine never assumes capability reliability and never retries on the
/// caller's behalf; retry policy, if any, belongs to the capability.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("Function not registered: {name}")]
    FunctionNotRegistered { name: String },

    #[error("Capability call failed: {reason}")]
    CallFailed { reason: String },

    #[error("Capability call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: i64 },
}

/// Master error type for all LATTICE operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LatticeError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Definition error: {0}")]
    Definition(#[from] DefinitionError),

    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),
}

/// Result type alias for LATTICE operations.
pub type LatticeResult<T> = Result<T, LatticeError>;

// =============================================================================
// TESTS
// =============================================================================
