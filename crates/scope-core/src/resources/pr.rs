//! Policy-driven pull request resource
//!
//! Remediation options are set either owner-wide (`repos = ["*"]`) or per
//! repository. An owner-wide write with `omit_repos` goes through the
//! [`ExclusionPreserver`] so omitted repositories keep whatever options they
//! had before.
//!
//! The backend copies owner-wide options onto every repository record, so a
//! record equal to the current owner-wide options, or to options this
//! resource wrote for that repository, is not the repository's own. Such a
//! repository is deleted when it becomes omitted. A repository leaving the
//! omit set keeps its own record.
//!
//! Omitted repositories are read back from the prior state. Without prior
//! state, any record that differs from the owner-wide options counts as an
//! omission.

use std::collections::BTreeSet;
use std::sync::Arc;

use scope_model::{EntityRef, OverrideMap, PrPolicyRecord, RepoSelection, ScopeModel};
use serde::{Deserialize, Serialize};

use super::delete_if_any;
use crate::Result;
use crate::backend::OverrideBackend;
use crate::exclusion::{ExclusionPreserver, ExclusionReport, SnapshotFailurePolicy};

const ATTRIBUTE: &str = "policy_driven_pr";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrPolicyConfig {
    #[serde(default)]
    pub auto_remediation_options: PrPolicyRecord,
    #[serde(default)]
    pub repos: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub omit_repos: Vec<String>,
}

impl PrPolicyConfig {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn selection(&self) -> RepoSelection {
        RepoSelection {
            repos: self.repos.clone(),
            omit_repos: self.omit_repos.clone(),
        }
    }

    pub fn scope(&self) -> Result<ScopeModel> {
        Ok(self.selection().to_scope(ATTRIBUTE)?)
    }

    /// Options with an empty exemption list collapsed to absent.
    pub fn options(&self) -> PrPolicyRecord {
        let mut options = self.auto_remediation_options.clone();
        if options
            .actions_to_exempt_while_pinning
            .as_ref()
            .is_some_and(BTreeSet::is_empty)
        {
            options.actions_to_exempt_while_pinning = None;
        }
        options
    }

    fn with_scope(options: PrPolicyRecord, scope: &ScopeModel) -> Self {
        let selection = RepoSelection::from_scope(scope);
        Self {
            auto_remediation_options: options,
            repos: selection.repos,
            omit_repos: selection.omit_repos,
        }
    }
}

pub struct PolicyDrivenPrResource {
    owner: String,
    backend: Arc<dyn OverrideBackend<PrPolicyRecord>>,
    snapshot_policy: SnapshotFailurePolicy,
}

impl PolicyDrivenPrResource {
    pub fn new(owner: impl Into<String>, backend: Arc<dyn OverrideBackend<PrPolicyRecord>>) -> Self {
        Self {
            owner: owner.into(),
            backend,
            snapshot_policy: SnapshotFailurePolicy::default(),
        }
    }

    pub fn with_snapshot_policy(mut self, policy: SnapshotFailurePolicy) -> Self {
        self.snapshot_policy = policy;
        self
    }

    pub async fn create(&self, config: &PrPolicyConfig) -> Result<ExclusionReport> {
        self.apply(config, None).await
    }

    pub async fn update(
        &self,
        prior: &PrPolicyConfig,
        config: &PrPolicyConfig,
    ) -> Result<ExclusionReport> {
        self.apply(config, Some(prior)).await
    }

    async fn apply(
        &self,
        config: &PrPolicyConfig,
        prior: Option<&PrPolicyConfig>,
    ) -> Result<ExclusionReport> {
        let scope = config.scope()?;
        let options = config.options();
        if scope.applies_to_all {
            return self.apply_owner_wide(&scope, options, prior).await;
        }

        let mut managed = vec![options.clone()];
        managed.extend(prior.map(PrPolicyConfig::options));

        let (_, current) = self.backend.list_config(&self.owner).await?;
        let records: OverrideMap<PrPolicyRecord> = scope
            .include
            .iter()
            .map(|entity| (entity.clone(), options.clone()))
            .collect();

        tracing::info!(
            owner = %self.owner,
            repos = records.len(),
            "Writing per-repository remediation options"
        );
        self.backend.put_config(&self.owner, &records, &None).await?;

        let stale: Vec<EntityRef> = current
            .iter()
            .filter(|(entity, record)| !records.contains_key(*entity) && managed.contains(*record))
            .map(|(entity, _)| entity.clone())
            .collect();
        delete_if_any(self.backend.as_ref(), &self.owner, &stale).await?;
        Ok(ExclusionReport::default())
    }

    async fn apply_owner_wide(
        &self,
        scope: &ScopeModel,
        options: PrPolicyRecord,
        prior: Option<&PrPolicyConfig>,
    ) -> Result<ExclusionReport> {
        let (current_global, current) = self.backend.list_config(&self.owner).await?;
        let prior_scope = prior
            .and_then(|prior| prior.scope().ok())
            .unwrap_or_else(ScopeModel::none);
        let prior_options = prior.map(PrPolicyConfig::options);

        let leaving: OverrideMap<PrPolicyRecord> = prior_scope
            .omit
            .difference(&scope.omit)
            .filter_map(|entity| {
                current
                    .get(entity)
                    .map(|record| (entity.clone(), record.clone()))
            })
            .collect();

        let global = Some(options.clone());
        let mut report = ExclusionPreserver::new(self.backend.as_ref())
            .with_policy(self.snapshot_policy)
            .with_inherited(|entity, record| {
                !prior_scope.omit.contains(entity)
                    && (current_global.as_ref() == Some(record)
                        || (prior_scope.include.contains(entity)
                            && prior_options.as_ref() == Some(record)))
            })
            .apply(&self.owner, &global, &scope.omit)
            .await?;

        if !leaving.is_empty() {
            tracing::info!(
                owner = %self.owner,
                repos = leaving.len(),
                "Keeping own options of repositories no longer omitted"
            );
            self.backend.put_config(&self.owner, &leaving, &global).await?;
            report.restored.extend(leaving.keys().cloned());
        }

        // Records holding options this resource wrote are ours to clean up.
        let mut managed = vec![options.clone()];
        managed.extend(prior_options);

        let (_, current) = self.backend.list_config(&self.owner).await?;
        let stale: Vec<EntityRef> = current
            .iter()
            .filter(|(entity, record)| {
                !scope.omit.contains(*entity)
                    && !leaving.contains_key(*entity)
                    && **record != options
                    && managed.contains(*record)
            })
            .map(|(entity, _)| entity.clone())
            .collect();
        delete_if_any(self.backend.as_ref(), &self.owner, &stale).await?;
        Ok(report)
    }

    /// Rebuild the declarative form from backend state.
    ///
    /// `prior` supplies the options for per-repository mode and the omitted
    /// repositories in owner-wide mode. Returns `None` when nothing
    /// is configured and there is no prior state.
    pub async fn read(&self, prior: Option<&PrPolicyConfig>) -> Result<Option<PrPolicyConfig>> {
        let (global, records) = self.backend.list_config(&self.owner).await?;

        if let Some(options) = global {
            let mut scope = ScopeModel::all();
            match prior {
                Some(prior) => scope.omit.extend(
                    prior
                        .omit_repos
                        .iter()
                        .map(|name| EntityRef::new(name.as_str())),
                ),
                None => scope.omit.extend(
                    records
                        .iter()
                        .filter(|(_, record)| **record != options)
                        .map(|(entity, _)| entity.clone()),
                ),
            }
            return Ok(Some(PrPolicyConfig::with_scope(options, &scope)));
        }

        let options = prior
            .map(PrPolicyConfig::options)
            .or_else(|| records.values().next().cloned());
        let Some(options) = options else {
            return Ok(None);
        };

        let include: BTreeSet<EntityRef> = records
            .iter()
            .filter(|(_, record)| **record == options)
            .map(|(entity, _)| entity.clone())
            .collect();
        if include.is_empty() && prior.is_none() {
            return Ok(None);
        }

        let scope = ScopeModel {
            include,
            ..ScopeModel::none()
        };
        Ok(Some(PrPolicyConfig::with_scope(options, &scope)))
    }

    /// Remove the owner-wide options and every record carrying them.
    pub async fn delete(&self, config: &PrPolicyConfig) -> Result<()> {
        let options = config.options();
        let (_, current) = self.backend.list_config(&self.owner).await?;
        let entities: Vec<EntityRef> = current
            .iter()
            .filter(|(_, record)| **record == options)
            .map(|(entity, _)| entity.clone())
            .collect();

        tracing::info!(owner = %self.owner, "Removing remediation options");
        self.backend
            .put_config(&self.owner, &OverrideMap::new(), &None)
            .await?;
        delete_if_any(self.backend.as_ref(), &self.owner, &entities).await
    }
}
