//! Round-trip and minimality properties of forward and inverse
//! reconciliation.

use proptest::prelude::*;
use scope_core::reconcile::{global_flags, invert, invert_attachment, reconcile, reconcile_attachment};
use scope_model::{Axis, AxisFlags, CheckOverride, EntityRef, OverrideRecord, ScopeModel};
use scope_test_utils::fixtures::{omit_include_scenario, scopes};
use scope_test_utils::strategies::{attachment_scope, axis_scopes, flag_scope};

proptest! {
    #[test]
    fn test_flag_scopes_round_trip(scopes in axis_scopes()) {
        let records = reconcile(&scopes).unwrap();
        let rebuilt = invert(&records, &global_flags(&scopes));
        prop_assert_eq!(rebuilt, scopes);
    }

    #[test]
    fn test_no_record_carries_only_default_flags(scopes in axis_scopes()) {
        let records = reconcile(&scopes).unwrap();
        let globals = global_flags(&scopes);

        for (entity, record) in &records {
            prop_assert!(!record.is_inherited(), "{entity} has an empty record");
            for (axis, global) in &globals {
                if let Some(flag) = record.get(*axis) {
                    prop_assert_ne!(flag, *global, "{} repeats the {} default", entity, axis);
                }
            }
        }
    }

    #[test]
    fn test_single_axis_covers_exactly_the_scope(scope in flag_scope(), probe in "[a-f][a-z0-9-]{0,2}") {
        let scopes = scopes(&[(Axis::Baseline, scope.clone())]);
        let records = reconcile(&scopes).unwrap();
        let entity = EntityRef::new(probe);

        let effective = records
            .get(&entity)
            .and_then(|record| record.get(Axis::Baseline))
            .unwrap_or(scope.applies_to_all);
        prop_assert_eq!(effective, scope.covers(&entity));
    }

    #[test]
    fn test_attachment_round_trip(scope in attachment_scope()) {
        let records = reconcile_attachment(&scope).unwrap();
        let rebuilt = invert_attachment(&records, scope.applies_to_all);
        prop_assert_eq!(&rebuilt, &scope);

        for (entity, nested) in &rebuilt.nested_overrides {
            prop_assert_eq!(nested.applies_to_whole_entity, nested.sub_entities.is_empty());
            prop_assert_eq!(
                records[entity].apply_to_whole_entity,
                nested.sub_entities.is_empty()
            );
        }
    }
}

#[test]
fn test_scenario_forward_and_back() {
    let scopes = omit_include_scenario("repoA");
    let records = reconcile(&scopes).unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(
        records[&EntityRef::new("repoA")],
        CheckOverride {
            required: Some(false),
            optional: Some(true),
            baseline: None,
        }
    );

    let globals = AxisFlags::from([(Axis::Required, true), (Axis::Optional, false)]);
    assert_eq!(global_flags(&scopes), globals);
    assert_eq!(invert(&records, &globals), scopes);
}

#[test]
fn test_omit_without_wildcard_rejected_before_reconciling() {
    let mut scope = ScopeModel::only(["a"]);
    scope.omit.insert(EntityRef::new("b"));

    let err = reconcile(&scopes(&[(Axis::Required, scope)])).unwrap_err();
    assert!(err.is_configuration());
}
