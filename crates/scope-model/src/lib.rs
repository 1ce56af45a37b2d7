//! Scope models and override records for Policy Scope.
//!
//! This crate holds the value types exchanged between the reconciliation
//! engine and its callers: the user-facing [`ScopeModel`], the backend's flat
//! per-entity records, the declarative attribute trees they are converted
//! from, and the per-control settings merger.

pub mod attributes;
pub mod entity;
pub mod error;
pub mod record;
pub mod scope;
pub mod settings;
pub mod validation;

pub use attributes::{OrgAttachment, RepoSelection, WorkflowSelection};
pub use entity::{EntityRef, WILDCARD};
pub use error::{Error, Result};
pub use record::{
    AttachmentOverride, AxisFlags, CheckOverride, ChecksGlobal, OverrideMap, OverrideRecord,
    PrPolicyRecord,
};
pub use scope::{Axis, NestedScope, ScopeModel};
pub use settings::{
    CheckType, ControlConfig, ControlKind, ControlSettings, EffectiveControl, EffectiveSettings,
    merge_settings, resolve_controls,
};
