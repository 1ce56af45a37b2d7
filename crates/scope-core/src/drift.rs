//! Drift detection between declared and observed scopes
//!
//! Compares the scopes a caller declared with the scopes rebuilt from the
//! backend by inverse reconciliation. Both sides are normalized first, so
//! spellings that mean the same thing (a lone `"*"` include versus
//! `applies_to_all`) never count as drift.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use scope_model::{Axis, EntityRef, ScopeModel};
use serde::{Deserialize, Serialize};

/// Overall result of a drift check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriftStatus {
    /// Observed state matches the declaration
    Healthy,
    /// At least one difference was found
    Drifted,
}

/// Kind of difference found for a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeDriftKind {
    /// The owner-wide flag differs
    GlobalFlag,
    /// Declared as included, not included in the observed state
    MissingInclude,
    /// Included in the observed state, not declared
    ExtraInclude,
    /// Declared as omitted, not omitted in the observed state
    MissingOmit,
    /// Omitted in the observed state, not declared
    ExtraOmit,
    /// An entity's sub-entity selection differs
    NestedMismatch,
}

impl fmt::Display for ScopeDriftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GlobalFlag => "global flag",
            Self::MissingInclude => "missing include",
            Self::ExtraInclude => "extra include",
            Self::MissingOmit => "missing omit",
            Self::ExtraOmit => "extra omit",
            Self::NestedMismatch => "nested mismatch",
        };
        f.write_str(name)
    }
}

/// A single difference between declared and observed scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeDrift {
    /// Label of the scope, usually the attribute name
    pub scope: String,
    pub kind: ScopeDriftKind,
    /// Entity involved, absent for global flag flips
    pub entity: Option<EntityRef>,
    /// Human-readable description
    pub description: String,
}

/// Report from a drift check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftReport {
    pub status: DriftStatus,
    pub items: Vec<ScopeDrift>,
}

impl DriftReport {
    pub fn healthy() -> Self {
        Self {
            status: DriftStatus::Healthy,
            items: Vec::new(),
        }
    }

    /// Build a report from drift items; no items means healthy.
    pub fn from_items(items: Vec<ScopeDrift>) -> Self {
        let status = if items.is_empty() {
            DriftStatus::Healthy
        } else {
            DriftStatus::Drifted
        };
        Self { status, items }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == DriftStatus::Healthy
    }

    /// Combine two reports; drifted wins.
    pub fn merge(mut self, other: DriftReport) -> Self {
        self.items.extend(other.items);
        Self::from_items(self.items)
    }
}

/// Compare declared and observed scopes axis by axis.
///
/// An axis present on one side only is compared against a disabled scope.
pub fn check_drift(
    declared: &BTreeMap<Axis, ScopeModel>,
    observed: &BTreeMap<Axis, ScopeModel>,
) -> DriftReport {
    let axes: BTreeSet<Axis> = declared.keys().chain(observed.keys()).copied().collect();
    let disabled = ScopeModel::none();

    let report = axes.into_iter().fold(DriftReport::healthy(), |report, axis| {
        let declared = declared.get(&axis).unwrap_or(&disabled);
        let observed = observed.get(&axis).unwrap_or(&disabled);
        report.merge(check_scope_drift(axis.attribute(), declared, observed))
    });

    if !report.is_healthy() {
        tracing::debug!(items = report.items.len(), "Drift detected");
    }
    report
}

/// Compare one declared scope against its observed counterpart.
pub fn check_scope_drift(label: &str, declared: &ScopeModel, observed: &ScopeModel) -> DriftReport {
    let declared = declared.normalized();
    let observed = observed.normalized();
    let mut items = Vec::new();

    let item = |kind: ScopeDriftKind, entity: Option<&EntityRef>, description: String| ScopeDrift {
        scope: label.to_string(),
        kind,
        entity: entity.cloned(),
        description,
    };

    if declared.applies_to_all != observed.applies_to_all {
        items.push(item(
            ScopeDriftKind::GlobalFlag,
            None,
            format!(
                "applies to all: declared {}, observed {}",
                declared.applies_to_all, observed.applies_to_all
            ),
        ));
    }

    for entity in declared.include.difference(&observed.include) {
        items.push(item(
            ScopeDriftKind::MissingInclude,
            Some(entity),
            format!("{entity} is declared but not included"),
        ));
    }
    for entity in observed.include.difference(&declared.include) {
        items.push(item(
            ScopeDriftKind::ExtraInclude,
            Some(entity),
            format!("{entity} is included but not declared"),
        ));
    }
    for entity in declared.omit.difference(&observed.omit) {
        items.push(item(
            ScopeDriftKind::MissingOmit,
            Some(entity),
            format!("{entity} is declared omitted but still applies"),
        ));
    }
    for entity in observed.omit.difference(&declared.omit) {
        items.push(item(
            ScopeDriftKind::ExtraOmit,
            Some(entity),
            format!("{entity} is omitted but not declared"),
        ));
    }

    let nested: BTreeSet<&EntityRef> = declared
        .nested_overrides
        .keys()
        .chain(observed.nested_overrides.keys())
        .collect();
    for entity in nested {
        let want = declared.nested_overrides.get(entity).map(|n| &n.sub_entities);
        let have = observed.nested_overrides.get(entity).map(|n| &n.sub_entities);
        if want != have {
            items.push(item(
                ScopeDriftKind::NestedMismatch,
                Some(entity),
                format!("{entity}: declared {want:?}, observed {have:?}"),
            ));
        }
    }

    DriftReport::from_items(items)
}
