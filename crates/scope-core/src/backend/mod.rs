//! Backend client abstraction
//!
//! The engine only ever talks to the policy API through
//! [`OverrideBackend`]. HTTP transport, authentication, retries and timeouts
//! all belong to the implementor; the engine treats every call as a
//! fallible remote operation.

mod memory;

pub use memory::{BackendCall, MemoryBackend, OwnerState};

use async_trait::async_trait;
use scope_model::{EntityRef, OverrideMap, OverrideRecord};

use crate::Result;

/// Remote store of owner-wide state plus per-entity override records.
#[async_trait]
pub trait OverrideBackend<R: OverrideRecord>: Send + Sync {
    /// Fetch the current record of one entity.
    ///
    /// Returns `Ok(None)` when the entity only inherits owner-wide state.
    async fn get_config(&self, owner: &str, entity: &EntityRef) -> Result<Option<R>>;

    /// Write owner-wide state and upsert the given per-entity records.
    ///
    /// Entities absent from `overrides` are left untouched.
    async fn put_config(
        &self,
        owner: &str,
        overrides: &OverrideMap<R>,
        global: &R::Global,
    ) -> Result<()>;

    /// Remove the per-entity records of the given entities.
    async fn delete_config(&self, owner: &str, entities: &[EntityRef]) -> Result<()>;

    /// Read owner-wide state and every per-entity record.
    async fn list_config(&self, owner: &str) -> Result<(R::Global, OverrideMap<R>)>;
}
