//! Exclusion preservation for owner-wide writes
//!
//! When an owner-wide configuration is written with an omit-list, the
//! omitted entities must keep whatever configuration they owned before the
//! write rather than inherit the new owner-wide one. The preserver:
//!
//! 1. fetches the current record of every omitted entity, one at a time
//! 2. writes the new owner-wide configuration
//! 3. re-writes every non-trivial snapshot as a per-entity override
//! 4. deletes the record of every omitted entity that had none
//!
//! A backend that copies owner-wide writes onto every entity makes such a
//! copy indistinguishable from an entity's own record. Callers that can tell
//! the two apart pass [`ExclusionPreserver::with_inherited`]; a snapshot it
//! matches counts as "had none".
//!
//! Step 1 failures follow [`SnapshotFailurePolicy`]. Failures in steps 2 to
//! 4 are always returned to the caller; once step 2 has succeeded they are
//! reported as [`Error::ExclusionIncomplete`], and nothing is rolled back.

use std::collections::{BTreeMap, BTreeSet};

use scope_model::{EntityRef, OverrideMap, OverrideRecord};
use serde::{Deserialize, Serialize};

use crate::backend::OverrideBackend;
use crate::{Error, Result};

/// What to do when fetching an omitted entity's configuration fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotFailurePolicy {
    /// Log the failure and treat the entity as having no prior
    /// configuration, so its record is deleted after the write.
    #[default]
    BestEffort,
    /// Abort before the owner-wide write.
    Fatal,
}

/// Outcome of an exclusion-preserving write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExclusionReport {
    /// Entities whose prior configuration was written back.
    pub restored: Vec<EntityRef>,
    /// Entities whose record was deleted after the write.
    pub removed: Vec<EntityRef>,
    /// Entities whose snapshot failed under [`SnapshotFailurePolicy::BestEffort`].
    pub snapshot_failures: Vec<EntityRef>,
}

type InheritedFn<'a, R> = Box<dyn Fn(&EntityRef, &R) -> bool + Send + Sync + 'a>;

/// Wraps an owner-wide write so omitted entities keep their own
/// configuration.
pub struct ExclusionPreserver<'a, R: OverrideRecord> {
    backend: &'a dyn OverrideBackend<R>,
    policy: SnapshotFailurePolicy,
    inherited: Option<InheritedFn<'a, R>>,
}

impl<'a, R: OverrideRecord> ExclusionPreserver<'a, R> {
    pub fn new(backend: &'a dyn OverrideBackend<R>) -> Self {
        Self {
            backend,
            policy: SnapshotFailurePolicy::default(),
            inherited: None,
        }
    }

    pub fn with_policy(mut self, policy: SnapshotFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Treat a snapshot for which `f` returns true as a copy of owner-wide
    /// state rather than the entity's own configuration.
    pub fn with_inherited<F>(mut self, f: F) -> Self
    where
        F: Fn(&EntityRef, &R) -> bool + Send + Sync + 'a,
    {
        self.inherited = Some(Box::new(f));
        self
    }

    fn owns(&self, entity: &EntityRef, record: &R) -> bool {
        !record.is_inherited()
            && !self
                .inherited
                .as_ref()
                .is_some_and(|inherited| inherited(entity, record))
    }

    /// Fetch the current record of every entity in `omit`, sequentially.
    ///
    /// Returns the snapshots and the entities whose fetch failed and were
    /// skipped.
    pub async fn snapshot(
        &self,
        owner: &str,
        omit: &BTreeSet<EntityRef>,
    ) -> Result<(BTreeMap<EntityRef, Option<R>>, Vec<EntityRef>)> {
        let mut snapshots = BTreeMap::new();
        let mut failures = Vec::new();

        for entity in omit {
            match self.backend.get_config(owner, entity).await {
                Ok(record) => {
                    snapshots.insert(entity.clone(), record);
                }
                Err(e) => match self.policy {
                    SnapshotFailurePolicy::Fatal => {
                        return Err(Error::SnapshotFailed {
                            entity: entity.to_string(),
                            source: Box::new(e),
                        });
                    }
                    SnapshotFailurePolicy::BestEffort => {
                        tracing::warn!(
                            owner,
                            entity = %entity,
                            error = %e,
                            "Failed to snapshot omitted entity; treating it as unconfigured"
                        );
                        snapshots.insert(entity.clone(), None);
                        failures.push(entity.clone());
                    }
                },
            }
        }

        Ok((snapshots, failures))
    }

    /// Write `global` for `owner` while keeping every entity in `omit` on
    /// its prior configuration.
    pub async fn apply(
        &self,
        owner: &str,
        global: &R::Global,
        omit: &BTreeSet<EntityRef>,
    ) -> Result<ExclusionReport> {
        let (snapshots, snapshot_failures) = self.snapshot(owner, omit).await?;

        tracing::info!(owner, omitted = omit.len(), "Writing owner-wide configuration");
        self.backend
            .put_config(owner, &OverrideMap::new(), global)
            .await?;

        let mut restore: OverrideMap<R> = OverrideMap::new();
        let mut remove: Vec<EntityRef> = Vec::new();
        for (entity, snapshot) in snapshots {
            match snapshot {
                Some(record) if self.owns(&entity, &record) => {
                    restore.insert(entity, record);
                }
                _ => remove.push(entity),
            }
        }

        if !restore.is_empty() {
            tracing::info!(owner, entities = restore.len(), "Restoring omitted entities");
            if let Err(e) = self.backend.put_config(owner, &restore, global).await {
                return Err(Error::ExclusionIncomplete {
                    owner: owner.to_string(),
                    stage: "restore".to_string(),
                    entities: restore.keys().map(EntityRef::to_string).collect(),
                    source: Box::new(e),
                });
            }
        }

        if !remove.is_empty() {
            tracing::info!(owner, entities = remove.len(), "Removing omitted entities");
            if let Err(e) = self.backend.delete_config(owner, &remove).await {
                return Err(Error::ExclusionIncomplete {
                    owner: owner.to_string(),
                    stage: "delete".to_string(),
                    entities: remove.iter().map(EntityRef::to_string).collect(),
                    source: Box::new(e),
                });
            }
        }

        Ok(ExclusionReport {
            restored: restore.into_keys().collect(),
            removed: remove,
            snapshot_failures,
        })
    }
}
