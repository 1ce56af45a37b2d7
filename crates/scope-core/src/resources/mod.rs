//! Resource handlers
//!
//! Each handler owns the create/read/update/delete flow of one declarative
//! resource on top of an [`OverrideBackend`]. Handlers hold the owner and a
//! shared backend client; they keep no other state between calls.

mod attachment;
mod checks;
mod pr;

pub use attachment::{PolicyAttachmentConfig, PolicyStoreAttachmentResource};
pub use checks::{ChecksConfig, ChecksPlan, ChecksResource};
pub use pr::{PolicyDrivenPrResource, PrPolicyConfig};

use scope_model::{EntityRef, OverrideMap, OverrideRecord};

use crate::Result;
use crate::backend::OverrideBackend;

/// Entities holding a record in `current` that `desired` no longer has.
fn stale_entities<R>(current: &OverrideMap<R>, desired: &OverrideMap<R>) -> Vec<EntityRef> {
    current
        .keys()
        .filter(|entity| !desired.contains_key(*entity))
        .cloned()
        .collect()
}

/// Delete `entities` unless there are none.
async fn delete_if_any<R: OverrideRecord>(
    backend: &dyn OverrideBackend<R>,
    owner: &str,
    entities: &[EntityRef],
) -> Result<()> {
    if entities.is_empty() {
        return Ok(());
    }
    tracing::info!(owner, entities = entities.len(), "Removing stale overrides");
    backend.delete_config(owner, entities).await
}
