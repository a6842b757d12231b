//! LATTICE Core - Definition and Instance Types
//!
//! Pure data structures for the dynamic object runtime. All other crates
//! depend on this. This crate contains the data model, the error taxonomy,
//! and the wire-facing result types - no evaluation logic.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod definition;
pub mod error;
pub mod fsm;
pub mod instance;
pub mod path;
pub mod result;
pub mod rule;
pub mod schema;

pub use definition::{DefinitionPatch, ObjectDefinition};
pub use error::{
    CapabilityError, DefinitionError, LatticeError, LatticeResult, StoreError,
};
pub use fsm::{FsmDefinition, FsmTransition};
pub use instance::Instance;
pub use path::{json_type_name, join_path, lookup_path};
pub use result::{
    RejectionReason, TransitionRejection, TransitionResult, ValidationIssue, ValidationResult,
};
pub use rule::{ApiDescriptor, RuleConfig, ValidationRule};
pub use schema::SchemaNode;

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Entity identifier using UUIDv7 for timestamp-sortable IDs.
pub type EntityId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 identifier for a definition row.
pub fn new_definition_id() -> EntityId {
    Uuid::now_v7()
}

/// Generate a new UUIDv7 identifier for an instance.
pub fn new_instance_id() -> EntityId {
    Uuid::now_v7()
}
