//! Forward reconciliation: scope models to override records

use std::collections::{BTreeMap, BTreeSet};

use scope_model::validation::{validate_attachment_scope, validate_flag_scope};
use scope_model::{
    AttachmentOverride, Axis, AxisFlags, CheckOverride, EntityRef, OverrideMap, OverrideRecord,
    ScopeModel,
};

use super::ATTACHMENT_ATTRIBUTE;
use crate::Result;

/// Combine independent per-axis scopes into one record per entity.
///
/// Every scope is validated first; no record is produced for invalid input.
/// For each axis:
///
/// - applying to all: each omitted entity gets the axis flag `false`
/// - explicit list: each included entity gets the axis flag `true`
///
/// Records touched by several axes carry the union of their flags, and
/// records left with every axis inheriting are dropped.
pub fn reconcile(scopes: &BTreeMap<Axis, ScopeModel>) -> Result<OverrideMap<CheckOverride>> {
    for (axis, scope) in scopes {
        validate_flag_scope(axis.attribute(), scope)?;
    }

    let mut records: OverrideMap<CheckOverride> = OverrideMap::new();
    for (axis, scope) in scopes {
        let scope = scope.normalized();
        let (entities, flag) = if scope.applies_to_all {
            (&scope.omit, false)
        } else {
            (&scope.include, true)
        };

        for entity in entities {
            records
                .entry(entity.clone())
                .or_default()
                .set(*axis, Some(flag));
        }

        tracing::debug!(
            axis = %axis,
            applies_to_all = scope.applies_to_all,
            entities = entities.len(),
            "Reconciled axis"
        );
    }

    records.retain(|_, record| !record.is_inherited());
    Ok(records)
}

/// Owner-wide flag of every axis present in `scopes`.
pub fn global_flags(scopes: &BTreeMap<Axis, ScopeModel>) -> AxisFlags {
    scopes
        .iter()
        .map(|(axis, scope)| (*axis, scope.normalized().applies_to_all))
        .collect()
}

/// Build attachment records from a nested (workflow-level) scope.
///
/// `apply_to_whole_entity` is derived from each entity's sub-entities on
/// every call, whatever the input nested scope claims. Under an owner-wide
/// attachment, entities covered as a whole need no record and get none.
pub fn reconcile_attachment(scope: &ScopeModel) -> Result<OverrideMap<AttachmentOverride>> {
    validate_attachment_scope(ATTACHMENT_ATTRIBUTE, scope)?;
    let scope = scope.normalized();

    let entities: BTreeSet<&EntityRef> = scope
        .include
        .iter()
        .chain(scope.nested_overrides.keys())
        .collect();

    let mut records = OverrideMap::new();
    for entity in entities {
        let sub_entities = scope
            .nested_overrides
            .get(entity)
            .map(|nested| nested.sub_entities.clone())
            .unwrap_or_default();
        let record = AttachmentOverride::from_sub_entities(sub_entities);

        if scope.applies_to_all && record.apply_to_whole_entity {
            continue;
        }
        records.insert(entity.clone(), record);
    }

    tracing::debug!(
        applies_to_all = scope.applies_to_all,
        records = records.len(),
        "Reconciled attachment scope"
    );
    Ok(records)
}
