//! Checks resource: required, optional and baseline check scopes

use std::collections::BTreeMap;
use std::sync::Arc;

use scope_model::{
    Axis, CheckOverride, ChecksGlobal, ControlConfig, OverrideMap, RepoSelection, ScopeModel,
    resolve_controls,
};
use serde::{Deserialize, Serialize};

use super::{delete_if_any, stale_entities};
use crate::backend::OverrideBackend;
use crate::Result;
use crate::reconcile::{global_flags, invert, reconcile};

/// Declarative form of the checks resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChecksConfig {
    #[serde(default)]
    pub controls: Vec<ControlConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_checks: Option<RepoSelection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional_checks: Option<RepoSelection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_check: Option<RepoSelection>,
}

impl ChecksConfig {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load state persisted as JSON by the provider host.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn selection(&self, axis: Axis) -> Option<&RepoSelection> {
        match axis {
            Axis::Required => self.required_checks.as_ref(),
            Axis::Optional => self.optional_checks.as_ref(),
            Axis::Baseline => self.baseline_check.as_ref(),
        }
    }

    fn selection_mut(&mut self, axis: Axis) -> &mut Option<RepoSelection> {
        match axis {
            Axis::Required => &mut self.required_checks,
            Axis::Optional => &mut self.optional_checks,
            Axis::Baseline => &mut self.baseline_check,
        }
    }

    /// Scope of every axis; an absent block is a disabled scope.
    pub fn scopes(&self) -> Result<BTreeMap<Axis, ScopeModel>> {
        let mut scopes = BTreeMap::new();
        for axis in Axis::ALL {
            let scope = match self.selection(axis) {
                Some(selection) => selection.to_scope(axis.attribute())?,
                None => ScopeModel::none(),
            };
            scopes.insert(axis, scope);
        }
        Ok(scopes)
    }
}

/// Backend writes computed from a [`ChecksConfig`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecksPlan {
    pub global: ChecksGlobal,
    pub overrides: OverrideMap<CheckOverride>,
}

pub struct ChecksResource {
    owner: String,
    backend: Arc<dyn OverrideBackend<CheckOverride>>,
}

impl ChecksResource {
    pub fn new(owner: impl Into<String>, backend: Arc<dyn OverrideBackend<CheckOverride>>) -> Self {
        Self {
            owner: owner.into(),
            backend,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Validate `config` and compute the writes it needs. Makes no backend
    /// call, so every configuration error surfaces here.
    pub fn plan(config: &ChecksConfig) -> Result<ChecksPlan> {
        let controls = resolve_controls(&config.controls)?;
        let scopes = config.scopes()?;
        let overrides = reconcile(&scopes)?;

        Ok(ChecksPlan {
            global: ChecksGlobal {
                axes: global_flags(&scopes),
                controls,
            },
            overrides,
        })
    }

    pub async fn create(&self, config: &ChecksConfig) -> Result<ChecksPlan> {
        self.apply(config).await
    }

    pub async fn update(&self, config: &ChecksConfig) -> Result<ChecksPlan> {
        self.apply(config).await
    }

    async fn apply(&self, config: &ChecksConfig) -> Result<ChecksPlan> {
        let plan = Self::plan(config)?;
        let (_, current) = self.backend.list_config(&self.owner).await?;

        tracing::info!(
            owner = %self.owner,
            overrides = plan.overrides.len(),
            "Writing checks configuration"
        );
        self.backend
            .put_config(&self.owner, &plan.overrides, &plan.global)
            .await?;

        let stale = stale_entities(&current, &plan.overrides);
        delete_if_any(self.backend.as_ref(), &self.owner, &stale).await?;
        Ok(plan)
    }

    /// Rebuild the declarative form from backend state.
    ///
    /// A disabled axis reads back as an absent block. Controls come back
    /// sorted, with their settings defaults filled in.
    pub async fn read(&self) -> Result<ChecksConfig> {
        let (global, records) = self.backend.list_config(&self.owner).await?;

        let globals = Axis::ALL
            .iter()
            .map(|axis| (*axis, global.axes.get(axis).copied().unwrap_or(false)))
            .collect();
        let scopes = invert(&records, &globals);

        let mut config = ChecksConfig {
            controls: global
                .controls
                .iter()
                .map(|(kind, control)| control.to_config(*kind))
                .collect(),
            ..ChecksConfig::default()
        };
        for (axis, scope) in &scopes {
            if !scope.is_disabled() {
                *config.selection_mut(*axis) = Some(RepoSelection::from_scope(scope));
            }
        }
        Ok(config)
    }

    /// Remove every override and switch all axes off.
    pub async fn delete(&self) -> Result<()> {
        let (_, current) = self.backend.list_config(&self.owner).await?;
        let entities: Vec<_> = current.into_keys().collect();
        delete_if_any(self.backend.as_ref(), &self.owner, &entities).await?;

        let global = ChecksGlobal {
            axes: Axis::ALL.iter().map(|axis| (*axis, false)).collect(),
            controls: BTreeMap::new(),
        };
        tracing::info!(owner = %self.owner, "Disabling checks");
        self.backend
            .put_config(&self.owner, &OverrideMap::new(), &global)
            .await
    }
}
