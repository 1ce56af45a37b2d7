//! Inverse reconciliation: override records back to scope models

use std::collections::BTreeMap;

use scope_model::{
    AttachmentOverride, Axis, AxisFlags, CheckOverride, NestedScope, OverrideMap, ScopeModel,
};

/// Rebuild one scope per axis in `globals` from the per-entity records.
///
/// With the axis's global flag on, entities whose flag is `false` are
/// omitted; with it off, entities whose flag is `true` are included. A
/// flag equal to the global one, or no flag at all, is redundant and
/// contributes nothing.
pub fn invert(
    records: &OverrideMap<CheckOverride>,
    globals: &AxisFlags,
) -> BTreeMap<Axis, ScopeModel> {
    globals
        .iter()
        .map(|(axis, &global)| {
            let mut scope = if global {
                ScopeModel::all()
            } else {
                ScopeModel::none()
            };

            for (entity, record) in records {
                match record.get(*axis) {
                    Some(flag) if flag != global => {
                        if global {
                            scope.omit.insert(entity.clone());
                        } else {
                            scope.include.insert(entity.clone());
                        }
                    }
                    _ => {}
                }
            }

            tracing::debug!(
                axis = %axis,
                global,
                include = scope.include.len(),
                omit = scope.omit.len(),
                "Inverted axis"
            );
            (*axis, scope)
        })
        .collect()
}

/// Rebuild an attachment scope from its per-entity records.
///
/// Whole-entity flags stored by the backend are ignored and recomputed from
/// the sub-entity lists. Under an owner-wide attachment a whole-entity
/// record is redundant and dropped.
pub fn invert_attachment(
    records: &OverrideMap<AttachmentOverride>,
    applies_to_all: bool,
) -> ScopeModel {
    let mut scope = ScopeModel {
        applies_to_all,
        ..ScopeModel::default()
    };

    for (entity, record) in records {
        let record = record.derived();
        if applies_to_all && record.apply_to_whole_entity {
            continue;
        }
        if !applies_to_all {
            scope.include.insert(entity.clone());
        }
        if !record.apply_to_whole_entity {
            scope.nested_overrides.insert(
                entity.clone(),
                NestedScope::new(entity.clone(), record.sub_entities),
            );
        }
    }

    scope
}
