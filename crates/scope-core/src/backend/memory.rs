//! In-memory backend
//!
//! Keeps owner state in process memory and records every call, so the
//! reconciliation and exclusion logic can be exercised without a network.
//! Faults can be injected per operation.
//!
//! Some policy APIs copy an owner-wide write onto every known entity. That
//! behaviour is opt-in via [`MemoryBackend::with_fan_out`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use scope_model::{EntityRef, OverrideMap, OverrideRecord};

use super::OverrideBackend;
use crate::{Error, Result};

type FanOut<R> = Box<dyn Fn(&<R as OverrideRecord>::Global) -> Option<R> + Send + Sync>;

/// Stored state of one owner.
#[derive(Debug, Clone)]
pub struct OwnerState<R: OverrideRecord> {
    pub global: R::Global,
    pub overrides: OverrideMap<R>,
    /// Every entity the backend knows about, with or without a record.
    pub entities: BTreeSet<EntityRef>,
}

impl<R: OverrideRecord> Default for OwnerState<R> {
    fn default() -> Self {
        Self {
            global: R::Global::default(),
            overrides: OverrideMap::new(),
            entities: BTreeSet::new(),
        }
    }
}

/// A call received by a [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Get { owner: String, entity: EntityRef },
    Put { owner: String, entities: Vec<EntityRef> },
    Delete { owner: String, entities: Vec<EntityRef> },
    List { owner: String },
}

#[derive(Debug, Default)]
struct Faults {
    get: BTreeSet<EntityRef>,
    /// Number of puts allowed to succeed before every further put fails.
    put_after: Option<usize>,
    puts_seen: usize,
    delete: bool,
    list: bool,
}

/// Backend holding all state in memory.
pub struct MemoryBackend<R: OverrideRecord> {
    owners: Mutex<BTreeMap<String, OwnerState<R>>>,
    fan_out: Option<FanOut<R>>,
    faults: Mutex<Faults>,
    calls: Mutex<Vec<BackendCall>>,
}

impl<R: OverrideRecord> Default for MemoryBackend<R> {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<R: OverrideRecord> MemoryBackend<R> {
    pub fn new() -> Self {
        Self {
            owners: Mutex::new(BTreeMap::new()),
            fan_out: None,
            faults: Mutex::new(Faults::default()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Copy every owner-wide write onto all known entities, using `f` to
    /// turn the global state into a per-entity record.
    pub fn with_fan_out<F>(mut self, f: F) -> Self
    where
        F: Fn(&R::Global) -> Option<R> + Send + Sync + 'static,
    {
        self.fan_out = Some(Box::new(f));
        self
    }

    /// Make entities known to the backend without giving them a record.
    pub fn register_entities<I, E>(&self, owner: &str, entities: I)
    where
        I: IntoIterator<Item = E>,
        E: Into<EntityRef>,
    {
        let mut owners = lock(&self.owners);
        let state = owners.entry(owner.to_string()).or_default();
        state.entities.extend(entities.into_iter().map(Into::into));
    }

    /// Store a record directly, bypassing call recording and faults.
    pub fn seed(&self, owner: &str, entity: impl Into<EntityRef>, record: R) {
        let entity = entity.into();
        let mut owners = lock(&self.owners);
        let state = owners.entry(owner.to_string()).or_default();
        state.entities.insert(entity.clone());
        state.overrides.insert(entity, record);
    }

    /// Set owner-wide state directly, bypassing call recording and faults.
    pub fn seed_global(&self, owner: &str, global: R::Global) {
        let mut owners = lock(&self.owners);
        owners.entry(owner.to_string()).or_default().global = global;
    }

    pub fn state(&self, owner: &str) -> OwnerState<R> {
        lock(&self.owners).get(owner).cloned().unwrap_or_default()
    }

    pub fn record(&self, owner: &str, entity: &str) -> Option<R> {
        lock(&self.owners)
            .get(owner)
            .and_then(|state| state.overrides.get(entity).cloned())
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        lock(&self.calls).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    /// Fail every `get_config` for `entity`.
    pub fn fail_get(&self, entity: impl Into<EntityRef>) {
        lock(&self.faults).get.insert(entity.into());
    }

    /// Let `n` further puts succeed, then fail every put after that.
    pub fn fail_puts_after(&self, n: usize) {
        let mut faults = lock(&self.faults);
        faults.put_after = Some(n);
        faults.puts_seen = 0;
    }

    pub fn fail_deletes(&self) {
        lock(&self.faults).delete = true;
    }

    pub fn fail_lists(&self) {
        lock(&self.faults).list = true;
    }

    fn record_call(&self, call: BackendCall) {
        lock(&self.calls).push(call);
    }
}

#[async_trait]
impl<R: OverrideRecord> OverrideBackend<R> for MemoryBackend<R> {
    async fn get_config(&self, owner: &str, entity: &EntityRef) -> Result<Option<R>> {
        self.record_call(BackendCall::Get {
            owner: owner.to_string(),
            entity: entity.clone(),
        });
        if lock(&self.faults).get.contains(entity) {
            return Err(Error::backend(
                "get_config",
                owner,
                format!("injected failure for {entity}"),
            ));
        }
        Ok(self.record(owner, entity.as_str()))
    }

    async fn put_config(
        &self,
        owner: &str,
        overrides: &OverrideMap<R>,
        global: &R::Global,
    ) -> Result<()> {
        self.record_call(BackendCall::Put {
            owner: owner.to_string(),
            entities: overrides.keys().cloned().collect(),
        });
        {
            let mut faults = lock(&self.faults);
            if let Some(limit) = faults.put_after {
                if faults.puts_seen >= limit {
                    return Err(Error::backend("put_config", owner, "injected failure"));
                }
                faults.puts_seen += 1;
            }
        }

        let mut owners = lock(&self.owners);
        let state = owners.entry(owner.to_string()).or_default();
        state.global = global.clone();

        if let Some(fan_out) = &self.fan_out
            && let Some(record) = fan_out(global)
        {
            for entity in &state.entities {
                state.overrides.insert(entity.clone(), record.clone());
            }
        }

        for (entity, record) in overrides {
            state.entities.insert(entity.clone());
            state.overrides.insert(entity.clone(), record.clone());
        }
        Ok(())
    }

    async fn delete_config(&self, owner: &str, entities: &[EntityRef]) -> Result<()> {
        self.record_call(BackendCall::Delete {
            owner: owner.to_string(),
            entities: entities.to_vec(),
        });
        if lock(&self.faults).delete {
            return Err(Error::backend("delete_config", owner, "injected failure"));
        }

        let mut owners = lock(&self.owners);
        if let Some(state) = owners.get_mut(owner) {
            for entity in entities {
                state.overrides.remove(entity);
            }
        }
        Ok(())
    }

    async fn list_config(&self, owner: &str) -> Result<(R::Global, OverrideMap<R>)> {
        self.record_call(BackendCall::List {
            owner: owner.to_string(),
        });
        if lock(&self.faults).list {
            return Err(Error::backend("list_config", owner, "injected failure"));
        }
        let state = self.state(owner);
        Ok((state.global, state.overrides))
    }
}
