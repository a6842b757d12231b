//! LATTICE Engine - Instance Lifecycle Orchestration
//!
//! Composes the registry, schema validator, rule evaluator, and FSM engine
//! to serve create/update/transition requests. Validation and transition
//! failures come back as outcome data; only definition invariants and
//! storage faults are `Err`. Callers can always distinguish "bad data" from
//! "illegal lifecycle move".

use lattice_core::result::{
    RejectionReason, TransitionRejection, TransitionResult, ValidationResult,
};
use lattice_core::{Instance, LatticeResult, ObjectDefinition, StoreError};
use lattice_fsm::TransitionDecision;
use lattice_registry::Registry;
use lattice_rules::Capabilities;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

// ============================================================================
// OUTCOMES
// ============================================================================

/// Outcome of a create request.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    /// Payload passed schema and rule validation; instance created.
    Created(Instance),
    /// Aggregated schema and rule failures; nothing was created.
    Rejected(ValidationResult),
}

/// Outcome of an update request.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Updated(Instance),
    Rejected(ValidationResult),
}

/// Outcome of a transition request, by failing stage.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// Data valid and transition legal; state updated.
    Transitioned(Instance),
    /// Data failed schema or rule validation; the FSM was never consulted.
    ValidationFailed(ValidationResult),
    /// Data valid but the lifecycle move is illegal.
    Rejected(TransitionRejection),
}

impl TransitionOutcome {
    /// Wire shape for transport layers.
    ///
    /// `None` for validation failures - those go out as the
    /// `ValidationResult` itself, which is already wire-shaped.
    pub fn wire(&self) -> Option<TransitionResult> {
        match self {
            TransitionOutcome::Transitioned(instance) => {
                // A transitioned instance always carries a state.
                Some(TransitionResult::accepted(
                    instance.current_state.clone().unwrap_or_default(),
                ))
            }
            TransitionOutcome::ValidationFailed(_) => None,
            TransitionOutcome::Rejected(rejection) => {
                Some(TransitionResult::rejected(rejection.reason))
            }
        }
    }
}

/// Outcome of an explicit migration to another definition version.
#[derive(Debug, Clone, PartialEq)]
pub enum MigrateOutcome {
    /// Data conforms to the target version; instance rebound.
    Migrated(Instance),
    /// Data does not conform to the target version; binding unchanged.
    Rejected(ValidationResult),
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

/// Instance lifecycle orchestrator.
///
/// Holds the registry and the injected capability interface; each call is
/// independent, stateless, and may run in parallel with others.
pub struct Orchestrator {
    registry: Arc<Registry>,
    capabilities: Arc<dyn Capabilities>,
}

impl Orchestrator {
    /// Create an orchestrator over a registry and capability interface.
    pub fn new(registry: Arc<Registry>, capabilities: Arc<dyn Capabilities>) -> Self {
        Self {
            registry,
            capabilities,
        }
    }

    /// Run schema validation then rule evaluation, aggregating both reports.
    async fn validate_payload(
        &self,
        definition: &ObjectDefinition,
        payload: &Value,
    ) -> ValidationResult {
        let mut result = lattice_schema::validate(&definition.schema, payload);
        let rules =
            lattice_rules::evaluate(&definition.rules, payload, self.capabilities.as_ref()).await;
        result.merge(rules);
        result
    }

    /// Resolve the pinned version an instance was validated against.
    ///
    /// Soft delete freezes all future validation, so a deleted definition
    /// fails the call outright.
    async fn resolve_bound(&self, instance: &Instance) -> LatticeResult<ObjectDefinition> {
        let definition = self
            .registry
            .resolve_version(&instance.definition_name, instance.definition_version)
            .await?;
        if definition.is_deleted() {
            return Err(StoreError::NotFound {
                name: instance.definition_name.clone(),
            }
            .into());
        }
        Ok(definition)
    }

    /// Create an instance of the named type from a payload.
    ///
    /// Resolves the active definition, validates, and on success binds
    /// `current_state` to the FSM's initial state when one is declared.
    pub async fn create_instance(
        &self,
        definition_name: &str,
        payload: Value,
    ) -> LatticeResult<CreateOutcome> {
        let definition = self.registry.resolve_active(definition_name).await?;

        let result = self.validate_payload(&definition, &payload).await;
        if !result.valid {
            debug!(
                name = definition_name,
                errors = result.errors.len(),
                "create rejected by validation"
            );
            return Ok(CreateOutcome::Rejected(result));
        }

        let initial = definition
            .states
            .as_ref()
            .map(|fsm| lattice_fsm::initial_state(fsm).to_string());

        let instance = Instance::new(definition.name, definition.version, payload, initial);
        debug!(
            name = definition_name,
            version = instance.definition_version,
            state = instance.current_state.as_deref().unwrap_or("-"),
            "instance created"
        );
        Ok(CreateOutcome::Created(instance))
    }

    /// Replace an instance's payload, re-validating against its pinned
    /// definition version - never the latest.
    pub async fn update_instance(
        &self,
        instance: &Instance,
        payload: Value,
    ) -> LatticeResult<UpdateOutcome> {
        let definition = self.resolve_bound(instance).await?;

        let result = self.validate_payload(&definition, &payload).await;
        if !result.valid {
            return Ok(UpdateOutcome::Rejected(result));
        }
        Ok(UpdateOutcome::Updated(instance.clone().with_data(payload)))
    }

    /// Drive a lifecycle event against an instance.
    ///
    /// Re-validates the (merged) payload exactly as in create, then asks the
    /// FSM engine for the new state. Only when both stages succeed is
    /// `current_state` updated.
    pub async fn transition(
        &self,
        instance: &Instance,
        event: &str,
        extra_payload: Option<Value>,
    ) -> LatticeResult<TransitionOutcome> {
        let definition = self.resolve_bound(instance).await?;

        let merged = match merge_payload(&instance.data, extra_payload) {
            Ok(merged) => merged,
            Err(result) => return Ok(TransitionOutcome::ValidationFailed(result)),
        };

        let result = self.validate_payload(&definition, &merged).await;
        if !result.valid {
            return Ok(TransitionOutcome::ValidationFailed(result));
        }

        let Some(fsm) = &definition.states else {
            return Ok(TransitionOutcome::Rejected(TransitionRejection {
                reason: RejectionReason::NoMatchingTransition,
                detail: Some("definition declares no state graph".to_string()),
            }));
        };

        let Some(current) = instance.current_state.as_deref() else {
            return Ok(TransitionOutcome::Rejected(TransitionRejection {
                reason: RejectionReason::NoMatchingTransition,
                detail: Some("instance carries no current state".to_string()),
            }));
        };

        match lattice_fsm::decide(fsm, current, event, &merged, self.capabilities.as_ref()).await {
            TransitionDecision::Allowed { to } => {
                debug!(
                    name = instance.definition_name.as_str(),
                    from = current,
                    to = to.as_str(),
                    event,
                    "transition accepted"
                );
                Ok(TransitionOutcome::Transitioned(
                    instance.clone().with_data(merged).with_state(to),
                ))
            }
            TransitionDecision::Rejected(rejection) => {
                debug!(
                    name = instance.definition_name.as_str(),
                    from = current,
                    event,
                    reason = ?rejection.reason,
                    "transition rejected"
                );
                Ok(TransitionOutcome::Rejected(rejection))
            }
        }
    }

    /// Explicitly rebind an instance to another definition version.
    ///
    /// The instance's data is re-validated against the target version; on
    /// success the binding moves. A state kept from the old version survives
    /// only if the target FSM declares it, otherwise the instance restarts
    /// at the target's initial state (or loses its state if the target has
    /// no FSM).
    pub async fn migrate_instance(
        &self,
        instance: &Instance,
        target_version: i32,
    ) -> LatticeResult<MigrateOutcome> {
        let definition = self
            .registry
            .resolve_version(&instance.definition_name, target_version)
            .await?;
        if definition.is_deleted() {
            return Err(StoreError::NotFound {
                name: instance.definition_name.clone(),
            }
            .into());
        }

        let result = self.validate_payload(&definition, &instance.data).await;
        if !result.valid {
            return Ok(MigrateOutcome::Rejected(result));
        }

        let mut migrated = instance.clone();
        migrated.definition_version = target_version;
        migrated.current_state = match &definition.states {
            Some(fsm) => match instance.current_state.as_deref() {
                Some(state) if fsm.has_state(state) => Some(state.to_string()),
                _ => Some(lattice_fsm::initial_state(fsm).to_string()),
            },
            None => None,
        };
        migrated.updated_at = chrono::Utc::now();

        debug!(
            name = instance.definition_name.as_str(),
            from_version = instance.definition_version,
            to_version = target_version,
            "instance migrated"
        );
        Ok(MigrateOutcome::Migrated(migrated))
    }
}

/// Shallow-merge an extra payload over the instance data.
///
/// `None` keeps the data as is. A non-object extra (or extra over non-object
/// data) is a validation error, not a silent replacement.
fn merge_payload(base: &Value, extra: Option<Value>) -> Result<Value, ValidationResult> {
    let Some(extra) = extra else {
        return Ok(base.clone());
    };

    match (base.as_object(), extra.as_object()) {
        (Some(base_map), Some(extra_map)) => {
            let mut merged = base_map.clone();
            for (key, value) in extra_map {
                merged.insert(key.clone(), value.clone());
            }
            Ok(Value::Object(merged))
        }
        (_, None) => {
            let mut result = ValidationResult::valid();
            result.add_error("", "transition payload must be a JSON object");
            Err(result)
        }
        (None, Some(_)) => {
            let mut result = ValidationResult::valid();
            result.add_error("", "instance data is not a JSON object, cannot merge payload");
            Err(result)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
