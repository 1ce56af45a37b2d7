//! Proptest strategies for well-formed, normalized scopes.
//!
//! Every generated scope already passes validation and is equal to its own
//! normalized form, so round-trip properties can compare with `==`.

use std::collections::{BTreeMap, BTreeSet};

use proptest::collection::{btree_map, btree_set};
use proptest::prelude::*;
use scope_model::{Axis, EntityRef, NestedScope, ScopeModel};

/// A short repository name; never the wildcard.
pub fn entity_name() -> impl Strategy<Value = String> {
    "[a-f][a-z0-9-]{0,2}"
}

pub fn entity() -> impl Strategy<Value = EntityRef> {
    entity_name().prop_map(EntityRef::new)
}

/// A scope for one flag axis: disabled, an explicit list, or all with
/// omissions.
pub fn flag_scope() -> impl Strategy<Value = ScopeModel> {
    prop_oneof![
        btree_set(entity(), 0..6).prop_map(|include| ScopeModel {
            include,
            ..ScopeModel::none()
        }),
        btree_set(entity(), 0..6).prop_map(|omit| ScopeModel {
            omit,
            ..ScopeModel::all()
        }),
    ]
}

/// One flag scope per axis. Names are short, so axes often share entities.
pub fn axis_scopes() -> impl Strategy<Value = BTreeMap<Axis, ScopeModel>> {
    (flag_scope(), flag_scope(), flag_scope()).prop_map(|(required, optional, baseline)| {
        BTreeMap::from([
            (Axis::Required, required),
            (Axis::Optional, optional),
            (Axis::Baseline, baseline),
        ])
    })
}

fn workflow() -> impl Strategy<Value = String> {
    "[a-z]{1,6}\\.yml"
}

/// An attachment scope: owner-wide or an explicit repository list, with
/// workflow narrowing on some repositories.
pub fn attachment_scope() -> impl Strategy<Value = ScopeModel> {
    (
        any::<bool>(),
        btree_map(entity(), btree_set(workflow(), 0..3), 0..6),
    )
        .prop_map(|(applies_to_all, repos)| build_attachment(applies_to_all, repos))
}

fn build_attachment(
    applies_to_all: bool,
    repos: BTreeMap<EntityRef, BTreeSet<String>>,
) -> ScopeModel {
    let mut scope = ScopeModel {
        applies_to_all,
        ..ScopeModel::default()
    };
    for (entity, workflows) in repos {
        if !applies_to_all {
            scope.include.insert(entity.clone());
        }
        if !workflows.is_empty() {
            scope
                .nested_overrides
                .insert(entity.clone(), NestedScope::new(entity, workflows));
        }
    }
    scope
}
