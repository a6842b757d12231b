//! Definition storage interface and in-memory implementation.
//!
//! The store is keyed by `(name, version)` with a latest-version index and
//! atomic insert-next-version semantics. Persistent backends implement the
//! same trait; the engine does not choose a persistence technology.

use async_trait::async_trait;
use lattice_core::{ObjectDefinition, StoreError, Timestamp};
use std::collections::HashMap;
use std::sync::RwLock;

/// Persistent store for definition rows.
#[async_trait]
pub trait DefinitionStore: Send + Sync {
    /// Fetch one version, soft-deleted rows included.
    async fn get(&self, name: &str, version: i32) -> Result<Option<ObjectDefinition>, StoreError>;

    /// Fetch the highest version for a name, soft-deleted rows included.
    async fn latest(&self, name: &str) -> Result<Option<ObjectDefinition>, StoreError>;

    /// Insert the next version row.
    ///
    /// Must be atomic: the write fails with `VersionConflict` unless
    /// `definition.version` is exactly the current latest + 1 (or 1 for a
    /// new name).
    async fn insert(&self, definition: &ObjectDefinition) -> Result<(), StoreError>;

    /// Flip the active flag on the latest row.
    async fn set_active(&self, name: &str, active: bool) -> Result<(), StoreError>;

    /// Mark every version of a name deleted at the given time.
    async fn soft_delete(&self, name: &str, at: Timestamp) -> Result<(), StoreError>;

    /// All known definition names, soft-deleted ones included.
    async fn list_names(&self) -> Result<Vec<String>, StoreError>;

    /// All versions of a name in ascending version order.
    async fn list_versions(&self, name: &str) -> Result<Vec<ObjectDefinition>, StoreError>;
}

/// In-memory definition store.
///
/// Rows per name are kept in ascending version order; the write lock makes
/// insert-next-version atomic.
#[derive(Debug, Default)]
pub struct InMemoryDefinitionStore {
    rows: RwLock<HashMap<String, Vec<ObjectDefinition>>>,
}

impl InMemoryDefinitionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DefinitionStore for InMemoryDefinitionStore {
    async fn get(&self, name: &str, version: i32) -> Result<Option<ObjectDefinition>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(rows
            .get(name)
            .and_then(|versions| versions.iter().find(|d| d.version == version))
            .cloned())
    }

    async fn latest(&self, name: &str) -> Result<Option<ObjectDefinition>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(rows.get(name).and_then(|versions| versions.last()).cloned())
    }

    async fn insert(&self, definition: &ObjectDefinition) -> Result<(), StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::LockPoisoned)?;
        let versions = rows.entry(definition.name.clone()).or_default();

        let expected = versions.last().map_or(1, |d| d.version + 1);
        if definition.version != expected {
            return Err(StoreError::VersionConflict {
                name: definition.name.clone(),
                version: definition.version,
            });
        }

        versions.push(definition.clone());
        Ok(())
    }

    async fn set_active(&self, name: &str, active: bool) -> Result<(), StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::LockPoisoned)?;
        let row = rows
            .get_mut(name)
            .and_then(|versions| versions.last_mut())
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
            })?;
        row.is_active = active;
        Ok(())
    }

    async fn soft_delete(&self, name: &str, at: Timestamp) -> Result<(), StoreError> {
        let mut rows = self.rows.write().map_err(|_| StoreError::LockPoisoned)?;
        let versions = rows.get_mut(name).ok_or_else(|| StoreError::NotFound {
            name: name.to_string(),
        })?;
        for row in versions.iter_mut() {
            row.deleted_at = Some(at);
        }
        Ok(())
    }

    async fn list_names(&self) -> Result<Vec<String>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut names: Vec<String> = rows.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn list_versions(&self, name: &str) -> Result<Vec<ObjectDefinition>, StoreError> {
        let rows = self.rows.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(rows.get(name).cloned().unwrap_or_default())
    }
}

// =============================================================================
// TESTS
// =============================================================================
