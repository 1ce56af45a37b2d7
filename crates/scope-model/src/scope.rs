//! Scope models
//!
//! A [`ScopeModel`] is the user's intent for one policy axis: apply to every
//! entity, to every entity except an omit-list, or to an explicit include
//! list, optionally narrowed per entity by a [`NestedScope`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entity::EntityRef;
use crate::error::Error;

/// One independently toggleable policy dimension sharing the entity set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Checks that block merges when they fail.
    Required,
    /// Checks that report but do not block.
    Optional,
    /// The baseline check run on every pull request.
    Baseline,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::Required, Axis::Optional, Axis::Baseline];

    /// Attribute name of this axis in a checks resource block.
    pub fn attribute(&self) -> &'static str {
        match self {
            Axis::Required => "required_checks",
            Axis::Optional => "optional_checks",
            Axis::Baseline => "baseline_check",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Required => write!(f, "required"),
            Axis::Optional => write!(f, "optional"),
            Axis::Baseline => write!(f, "baseline"),
        }
    }
}

impl FromStr for Axis {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "required" | "required_checks" => Ok(Axis::Required),
            "optional" | "optional_checks" => Ok(Axis::Optional),
            "baseline" | "baseline_check" => Ok(Axis::Baseline),
            _ => Err(Error::UnknownAxis {
                name: s.to_string(),
            }),
        }
    }
}

/// Per-entity narrowing to a set of sub-entities (workflows of a repository).
///
/// `applies_to_whole_entity` is a derived field: it is `true` exactly when
/// `sub_entities` is empty. Values read from storage are never trusted; call
/// [`NestedScope::derived`] after any construction from raw data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedScope {
    pub entity: EntityRef,
    pub applies_to_whole_entity: bool,
    #[serde(default)]
    pub sub_entities: BTreeSet<String>,
}

impl NestedScope {
    pub fn new<I, S>(entity: impl Into<EntityRef>, sub_entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entity: entity.into(),
            applies_to_whole_entity: false,
            sub_entities: sub_entities.into_iter().map(Into::into).collect(),
        }
        .derived()
    }

    /// Scope covering the whole entity.
    pub fn whole(entity: impl Into<EntityRef>) -> Self {
        Self::new(entity, Vec::<String>::new())
    }

    /// Recompute `applies_to_whole_entity` from sub-entity presence.
    pub fn derived(mut self) -> Self {
        self.applies_to_whole_entity = self.sub_entities.is_empty();
        self
    }
}

/// User-facing description of which entities one axis applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeModel {
    pub applies_to_all: bool,
    #[serde(default)]
    pub include: BTreeSet<EntityRef>,
    #[serde(default)]
    pub omit: BTreeSet<EntityRef>,
    #[serde(default)]
    pub nested_overrides: BTreeMap<EntityRef, NestedScope>,
}

impl ScopeModel {
    /// Applies to every entity.
    pub fn all() -> Self {
        Self {
            applies_to_all: true,
            ..Self::default()
        }
    }

    /// Disabled everywhere.
    pub fn none() -> Self {
        Self::default()
    }

    /// Applies to exactly the given entities.
    pub fn only<I, E>(entities: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<EntityRef>,
    {
        Self {
            include: entities.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Applies to every entity except the given ones.
    pub fn all_except<I, E>(entities: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<EntityRef>,
    {
        Self {
            applies_to_all: true,
            omit: entities.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Add a nested override, keyed by its entity.
    pub fn with_nested(mut self, nested: NestedScope) -> Self {
        self.nested_overrides.insert(nested.entity.clone(), nested);
        self
    }

    /// True for the legal "disabled everywhere" state.
    pub fn is_disabled(&self) -> bool {
        !self.applies_to_all && self.include.is_empty() && self.nested_overrides.is_empty()
    }

    /// Whether this scope covers `entity` as a whole.
    pub fn covers(&self, entity: &EntityRef) -> bool {
        if self.applies_to_all {
            !self.omit.contains(entity)
        } else {
            self.include.contains(entity)
        }
    }

    /// Canonical form of a valid scope.
    ///
    /// - a lone wildcard in `include` becomes `applies_to_all`
    /// - nested keys are part of `include` when not applying to all
    /// - every nested `applies_to_whole_entity` is recomputed
    /// - nested overrides covering a whole entity are dropped, since the
    ///   global flag or the include entry already covers them
    pub fn normalized(&self) -> Self {
        let mut scope = self.clone();

        if scope.include.len() == 1 && scope.include.iter().all(EntityRef::is_wildcard) {
            scope.include.clear();
            scope.applies_to_all = true;
        }

        if !scope.applies_to_all {
            scope
                .include
                .extend(scope.nested_overrides.keys().cloned());
        }

        scope.nested_overrides = std::mem::take(&mut scope.nested_overrides)
            .into_iter()
            .map(|(key, nested)| (key, nested.derived()))
            .filter(|(_, nested)| !nested.applies_to_whole_entity)
            .collect();

        scope
    }
}
