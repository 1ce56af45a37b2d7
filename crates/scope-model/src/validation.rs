//! Validation for scope models
//!
//! All checks here run before reconciliation and before any backend call.
//! A scope that passes [`validate_scope`] is well-formed: forward then
//! inverse reconciliation reproduces its normalized form.

use crate::entity::{EntityRef, WILDCARD};
use crate::error::{Error, Result};
use crate::scope::ScopeModel;

/// Checks shared by every scope variant.
///
/// - the wildcard never co-occurs with other `include` entries
/// - an explicit `include` list requires `applies_to_all == false`
/// - a non-empty `omit` requires `applies_to_all == true`
/// - entity names are non-empty and the wildcard never appears in `omit`
/// - nested overrides are keyed by their own entity
pub fn validate_scope(attribute: &str, scope: &ScopeModel) -> Result<()> {
    let has_wildcard = scope.include.iter().any(EntityRef::is_wildcard);
    if has_wildcard && scope.include.len() > 1 {
        return Err(Error::WildcardConflict {
            attribute: attribute.to_string(),
        });
    }

    if scope.applies_to_all && !scope.include.is_empty() && !has_wildcard {
        return Err(Error::ExplicitListWithGlobal {
            attribute: attribute.to_string(),
        });
    }

    let applies_to_all = scope.applies_to_all || has_wildcard;
    if !scope.omit.is_empty() && !applies_to_all {
        return Err(Error::OmitWithoutWildcard {
            attribute: attribute.to_string(),
        });
    }

    for entity in scope.include.iter().filter(|e| !e.is_wildcard()) {
        EntityRef::parse(entity.as_str())?;
    }
    for entity in &scope.omit {
        if entity.is_wildcard() {
            return Err(Error::InvalidEntity {
                name: WILDCARD.to_string(),
                reason: format!("{attribute}: the wildcard cannot be omitted"),
            });
        }
        EntityRef::parse(entity.as_str())?;
    }

    for (key, nested) in &scope.nested_overrides {
        if key != &nested.entity {
            return Err(Error::NestedKeyMismatch {
                attribute: attribute.to_string(),
                key: key.to_string(),
                entity: nested.entity.to_string(),
            });
        }
        if key.is_wildcard() {
            return Err(Error::InvalidEntity {
                name: WILDCARD.to_string(),
                reason: format!("{attribute}: nested overrides need a concrete entity"),
            });
        }
        EntityRef::parse(key.as_str())?;
        for sub in &nested.sub_entities {
            if sub.trim().is_empty() {
                return Err(Error::InvalidEntity {
                    name: sub.clone(),
                    reason: format!("{attribute}: empty sub-entity under {key}"),
                });
            }
        }
    }

    Ok(())
}

/// Validate a scope used on a boolean flag axis, which has no room for
/// nested overrides.
pub fn validate_flag_scope(attribute: &str, scope: &ScopeModel) -> Result<()> {
    validate_scope(attribute, scope)?;
    if !scope.nested_overrides.is_empty() {
        return Err(Error::NestedNotSupported {
            attribute: attribute.to_string(),
        });
    }
    Ok(())
}

/// Validate a scope used for nested (workflow-level) attachment.
///
/// The attachment record derives "applies to whole entity" from its
/// sub-entities, so it cannot express an omitted entity.
pub fn validate_attachment_scope(attribute: &str, scope: &ScopeModel) -> Result<()> {
    validate_scope(attribute, scope)?;
    if !scope.omit.is_empty() {
        return Err(Error::OmitNotSupported {
            attribute: attribute.to_string(),
        });
    }
    Ok(())
}
