//! LATTICE Registry - Versioned Definition Storage and Resolution
//!
//! Owns the versioned object-type definitions and resolves the active
//! version for validation and transition requests. Definitions are immutable
//! once written: every mutation is a new row with `version + 1`, serialized
//! per name so the version sequence has no gaps or duplicates. Reads need no
//! locking.

mod store;

pub use store::{DefinitionStore, InMemoryDefinitionStore};

use chrono::Utc;
use lattice_core::{
    DefinitionPatch, LatticeResult, ObjectDefinition, StoreError,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tracing::debug;

// ============================================================================
// INDEX RECORDS (read-only export for external indexing)
// ============================================================================

/// Read-only structured record of one definition version.
///
/// This is what the engine exposes to search/indexing collaborators; it does
/// not index or embed anything itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub name: String,
    pub version: i32,
    pub display_name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub is_deleted: bool,
    pub schema: serde_json::Value,
}

impl IndexRecord {
    fn from_definition(definition: &ObjectDefinition) -> Self {
        Self {
            name: definition.name.clone(),
            version: definition.version,
            display_name: definition.display_name.clone(),
            description: definition.description.clone(),
            is_active: definition.is_active,
            is_deleted: definition.is_deleted(),
            // Schema trees serialize cleanly; a serialization failure would
            // mean a malformed node, which save-time validation excludes.
            schema: serde_json::to_value(&definition.schema).unwrap_or_default(),
        }
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Registry over an injected definition store.
///
/// Constructed once per process and passed by reference to the orchestrator;
/// no ambient singletons.
pub struct Registry {
    store: Arc<dyn DefinitionStore>,
    /// Per-name write locks. Concurrent `create_version` calls for the same
    /// name serialize here; different names proceed in parallel.
    name_locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Registry {
    /// Create a registry over the given store.
    pub fn new(store: Arc<dyn DefinitionStore>) -> Self {
        Self {
            store,
            name_locks: StdMutex::new(HashMap::new()),
        }
    }

    /// Convenience constructor over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryDefinitionStore::new()))
    }

    fn name_lock(&self, name: &str) -> Result<Arc<Mutex<()>>, StoreError> {
        let mut locks = self.name_locks.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    /// Resolve the active definition for a name.
    ///
    /// Excludes soft-deleted names and definitions explicitly deactivated.
    pub async fn resolve_active(&self, name: &str) -> LatticeResult<ObjectDefinition> {
        match self.store.latest(name).await? {
            Some(definition) if !definition.is_deleted() && definition.is_active => Ok(definition),
            _ => Err(StoreError::NotFound {
                name: name.to_string(),
            }
            .into()),
        }
    }

    /// Resolve a specific version, including soft-deleted ones.
    ///
    /// Prior versions are retained for audit and stay resolvable even when
    /// superseded or deleted.
    pub async fn resolve_version(&self, name: &str, version: i32) -> LatticeResult<ObjectDefinition> {
        self.store.get(name, version).await?.ok_or_else(|| {
            StoreError::VersionNotFound {
                name: name.to_string(),
                version,
            }
            .into()
        })
    }

    /// Write the next version of a definition.
    ///
    /// Unspecified patch fields are copied forward from the previous version.
    /// The read-patch-validate-insert sequence holds the per-name lock, so
    /// two concurrent callers cannot both compute `version = N + 1`.
    /// Invariant violations block the write; soft-deleted names refuse new
    /// versions.
    pub async fn create_version(
        &self,
        name: &str,
        patch: DefinitionPatch,
    ) -> LatticeResult<ObjectDefinition> {
        let lock = self.name_lock(name)?;
        let _guard = lock.lock().await;

        let next = match self.store.latest(name).await? {
            Some(previous) => {
                if previous.is_deleted() {
                    return Err(StoreError::NotFound {
                        name: name.to_string(),
                    }
                    .into());
                }
                patch.apply(&previous)
            }
            None => patch.into_initial(name)?,
        };

        next.validate()?;
        self.store.insert(&next).await?;
        debug!(name, version = next.version, "definition version created");
        Ok(next)
    }

    /// Deactivate a name: `resolve_active` stops returning it, versions stay
    /// resolvable. A flag flip on the latest row, not a row mutation.
    pub async fn deactivate(&self, name: &str) -> LatticeResult<()> {
        self.set_active(name, false).await
    }

    /// Reactivate a previously deactivated name.
    pub async fn activate(&self, name: &str) -> LatticeResult<()> {
        self.set_active(name, true).await
    }

    async fn set_active(&self, name: &str, active: bool) -> LatticeResult<()> {
        let lock = self.name_lock(name)?;
        let _guard = lock.lock().await;

        match self.store.latest(name).await? {
            Some(definition) if !definition.is_deleted() => {
                self.store.set_active(name, active).await?;
                debug!(name, active, "definition active flag flipped");
                Ok(())
            }
            _ => Err(StoreError::NotFound {
                name: name.to_string(),
            }
            .into()),
        }
    }

    /// Soft-delete a name: sets `deleted_at` on every version, freezing all
    /// future validation against it. Rows are never physically removed.
    pub async fn delete(&self, name: &str) -> LatticeResult<()> {
        let lock = self.name_lock(name)?;
        let _guard = lock.lock().await;

        if self.store.latest(name).await?.is_none() {
            return Err(StoreError::NotFound {
                name: name.to_string(),
            }
            .into());
        }
        self.store.soft_delete(name, Utc::now()).await?;
        // The name refuses new versions from here on; its write lock
        // entry goes with it.
        self.name_locks
            .lock()
            .map_err(|_| StoreError::LockPoisoned)?
            .remove(name);
        debug!(name, "definition soft-deleted");
        Ok(())
    }

    /// Export every definition version as read-only index records.
    pub async fn export_records(&self) -> LatticeResult<Vec<IndexRecord>> {
        let mut records = Vec::new();
        for name in self.store.list_names().await? {
            for definition in self.store.list_versions(&name).await? {
                records.push(IndexRecord::from_definition(&definition));
            }
        }
        Ok(records)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_core::fsm::{FsmDefinition, FsmTransition};
    use lattice_core::rule::ValidationRule;
    use lattice_core::schema::SchemaNode;
    use lattice_core::{DefinitionError, LatticeError};

    fn contact_patch() -> DefinitionPatch {
        DefinitionPatch::schema(
            SchemaNode::object()
                .with_property("email", SchemaNode::String)
                .with_required("email"),
        )
    }

    #[tokio::test]
    async fn test_create_first_version() {
        let registry = Registry::in_memory();
        let def = registry.create_version("contact", contact_patch()).await.unwrap();
        assert_eq!(def.version, 1);
        assert_eq!(def.name, "contact");
    }

    #[tokio::test]
    async fn test_create_version_without_schema_fails_for_new_name() {
        let registry = Registry::in_memory();
        let err = registry
            .create_version("contact", DefinitionPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LatticeError::Definition(DefinitionError::MissingSchema { .. })
        ));
    }

    #[tokio::test]
    async fn test_versions_increment_by_one() {
        let registry = Registry::in_memory();
        registry.create_version("contact", contact_patch()).await.unwrap();
        let v2 = registry
            .create_version("contact", DefinitionPatch::default())
            .await
            .unwrap();
        let v3 = registry
            .create_version("contact", DefinitionPatch::default())
            .await
            .unwrap();
        assert_eq!(v2.version, 2);
        assert_eq!(v3.version, 3);
    }

    #[tokio::test]
    async fn test_resolve_active_returns_latest() {
        let registry = Registry::in_memory();
        registry.create_version("contact", contact_patch()).await.unwrap();
        registry
            .create_version(
                "contact",
                DefinitionPatch {
                    display_name: Some("Contact v2".to_string()),
                    ..DefinitionPatch::default()
                },
            )
            .await
            .unwrap();

        let active = registry.resolve_active("contact").await.unwrap();
        assert_eq!(active.version, 2);
        assert_eq!(active.display_name, "Contact v2");
    }

    #[tokio::test]
    async fn test_resolve_unknown_name_not_found() {
        let registry = Registry::in_memory();
        let err = registry.resolve_active("ghost").await.unwrap_err();
        assert!(matches!(
            err,
            LatticeError::Store(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_prior_versions_stay_resolvable() {
        let registry = Registry::in_memory();
        registry.create_version("contact", contact_patch()).await.unwrap();
        registry
            .create_version("contact", DefinitionPatch::default())
            .await
            .unwrap();

        let v1 = registry.resolve_version("contact", 1).await.unwrap();
        assert_eq!(v1.version, 1);

        let err = registry.resolve_version("contact", 9).await.unwrap_err();
        assert!(matches!(
            err,
            LatticeError::Store(StoreError::VersionNotFound { version: 9, .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_fsm_blocks_create_version() {
        let registry = Registry::in_memory();
        let patch = contact_patch().with_states(FsmDefinition::new(
            "nowhere",
            vec!["draft".to_string()],
        ));
        let err = registry.create_version("contact", patch).await.unwrap_err();
        assert!(matches!(
            err,
            LatticeError::Definition(DefinitionError::InitialStateUnknown { .. })
        ));
        // Nothing was written.
        assert!(registry.resolve_active("contact").await.is_err());
    }

    #[tokio::test]
    async fn test_bad_rule_config_blocks_create_version() {
        let registry = Registry::in_memory();
        let patch = contact_patch()
            .with_rules(vec![ValidationRule::regex("broken", "email", "([unclosed")]);
        let err = registry.create_version("contact", patch).await.unwrap_err();
        assert!(matches!(
            err,
            LatticeError::Definition(DefinitionError::InvalidRuleConfig { .. })
        ));
    }

    #[tokio::test]
    async fn test_soft_delete_excludes_from_active_keeps_versions() {
        let registry = Registry::in_memory();
        registry.create_version("contact", contact_patch()).await.unwrap();
        registry.delete("contact").await.unwrap();

        assert!(registry.resolve_active("contact").await.is_err());

        let v1 = registry.resolve_version("contact", 1).await.unwrap();
        assert!(v1.is_deleted());
    }

    #[tokio::test]
    async fn test_soft_deleted_name_refuses_new_versions() {
        let registry = Registry::in_memory();
        registry.create_version("contact", contact_patch()).await.unwrap();
        registry.delete("contact").await.unwrap();

        let err = registry
            .create_version("contact", DefinitionPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LatticeError::Store(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_drops_per_name_lock_entry() {
        let registry = Registry::in_memory();
        registry.create_version("contact", contact_patch()).await.unwrap();
        assert!(registry.name_locks.lock().unwrap().contains_key("contact"));

        registry.delete("contact").await.unwrap();
        assert!(!registry.name_locks.lock().unwrap().contains_key("contact"));
    }

    #[tokio::test]
    async fn test_deactivate_and_reactivate() {
        let registry = Registry::in_memory();
        registry.create_version("contact", contact_patch()).await.unwrap();

        registry.deactivate("contact").await.unwrap();
        assert!(registry.resolve_active("contact").await.is_err());
        // Still resolvable by version.
        assert!(registry.resolve_version("contact", 1).await.is_ok());

        registry.activate("contact").await.unwrap();
        assert!(registry.resolve_active("contact").await.is_ok());
    }

    #[tokio::test]
    async fn test_export_records_covers_all_versions() {
        let registry = Registry::in_memory();
        registry.create_version("contact", contact_patch()).await.unwrap();
        registry
            .create_version("contact", DefinitionPatch::default())
            .await
            .unwrap();
        let ticket_patch = DefinitionPatch::schema(SchemaNode::object()).with_states(
            FsmDefinition::new("open", vec!["open".to_string(), "closed".to_string()])
                .with_transition(FsmTransition::new("open", "closed", "close")),
        );
        registry.create_version("ticket", ticket_patch).await.unwrap();

        let mut records = registry.export_records().await.unwrap();
        records.sort_by(|a, b| (&a.name, a.version).cmp(&(&b.name, b.version)));
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name, "contact");
        assert_eq!(records[0].version, 1);
        assert_eq!(records[2].name, "ticket");
        assert_eq!(records[2].schema["kind"], "object");
    }
}
