//! Backend override records
//!
//! The backend stores one flat record per entity and knows nothing about
//! wildcards or omissions. Maps are `BTreeMap`s so every serialisation of an
//! [`OverrideMap`] is sorted by entity name.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::entity::EntityRef;
use crate::scope::Axis;
use crate::settings::{ControlKind, EffectiveControl};

/// Per-entity records keyed by entity name.
pub type OverrideMap<R> = BTreeMap<EntityRef, R>;

/// Global (owner-wide) flag per axis.
pub type AxisFlags = BTreeMap<Axis, bool>;

/// A record the backend stores per entity.
pub trait OverrideRecord: Clone + Debug + PartialEq + Send + Sync + 'static {
    /// Owner-wide state written alongside the per-entity map.
    type Global: Clone + Debug + PartialEq + Default + Send + Sync + 'static;

    /// True when the record carries nothing beyond what the entity inherits;
    /// such records are never persisted.
    fn is_inherited(&self) -> bool;
}

/// Per-entity flags of the checks resource. `None` inherits the axis's
/// global flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<bool>,
}

impl CheckOverride {
    pub fn get(&self, axis: Axis) -> Option<bool> {
        match axis {
            Axis::Required => self.required,
            Axis::Optional => self.optional,
            Axis::Baseline => self.baseline,
        }
    }

    pub fn set(&mut self, axis: Axis, flag: Option<bool>) {
        match axis {
            Axis::Required => self.required = flag,
            Axis::Optional => self.optional = flag,
            Axis::Baseline => self.baseline = flag,
        }
    }

    pub fn with(mut self, axis: Axis, flag: bool) -> Self {
        self.set(axis, Some(flag));
        self
    }
}

/// Owner-wide state of the checks resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksGlobal {
    #[serde(default)]
    pub axes: AxisFlags,
    #[serde(default)]
    pub controls: BTreeMap<ControlKind, EffectiveControl>,
}

impl OverrideRecord for CheckOverride {
    type Global = ChecksGlobal;

    fn is_inherited(&self) -> bool {
        Axis::ALL.iter().all(|axis| self.get(*axis).is_none())
    }
}

/// Per-entity record of a policy-store attachment.
///
/// `apply_to_whole_entity` is stored for the backend's benefit but always
/// derived from `sub_entities`; see [`AttachmentOverride::derived`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentOverride {
    pub apply_to_whole_entity: bool,
    #[serde(default)]
    pub sub_entities: BTreeSet<String>,
}

impl AttachmentOverride {
    pub fn from_sub_entities(sub_entities: BTreeSet<String>) -> Self {
        Self {
            apply_to_whole_entity: sub_entities.is_empty(),
            sub_entities,
        }
    }

    /// Copy with the whole-entity flag recomputed.
    pub fn derived(&self) -> Self {
        Self::from_sub_entities(self.sub_entities.clone())
    }
}

impl OverrideRecord for AttachmentOverride {
    /// Whether the policy is attached owner-wide.
    type Global = bool;

    fn is_inherited(&self) -> bool {
        false
    }
}

/// Remediation options of the policy-driven pull request resource, stored
/// owner-wide and per entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrPolicyRecord {
    #[serde(default)]
    pub create_pr: bool,
    #[serde(default)]
    pub create_issue: bool,
    #[serde(default)]
    pub create_github_advanced_security_alert: bool,
    #[serde(default)]
    pub harden_github_hosted_runner: bool,
    #[serde(default)]
    pub pin_actions_to_sha: bool,
    #[serde(default)]
    pub restrict_github_token_permissions: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions_to_exempt_while_pinning: Option<BTreeSet<String>>,
}

impl OverrideRecord for PrPolicyRecord {
    /// Owner-wide options; `None` when no owner-wide policy is set.
    type Global = Option<PrPolicyRecord>;

    fn is_inherited(&self) -> bool {
        let no_exemptions = self
            .actions_to_exempt_while_pinning
            .as_ref()
            .is_none_or(BTreeSet::is_empty);
        no_exemptions
            && PrPolicyRecord {
                actions_to_exempt_while_pinning: None,
                ..self.clone()
            } == PrPolicyRecord::default()
    }
}
