//! Scope reconciliation engine for Policy Scope
//!
//! This crate converts between user-facing scoped policies and a backend
//! that only stores per-entity flags, implementing:
//!
//! - **Forward reconciliation**: scope models to a minimal per-entity override map
//! - **Inverse reconciliation**: override map plus global flags back to scope models
//! - **Exclusion preservation**: snapshot, apply global, restore or delete
//! - **Resource handlers**: checks, policy-store attachment and policy-driven PR
//! - **Drift checks**: declared scopes compared against scopes rebuilt from a read
//!
//! # Architecture
//!
//! ```text
//!            resource handlers (create / read / update / delete)
//!                 |                      |                |
//!         reconcile::forward    reconcile::inverse    exclusion
//!                 |                      |                |
//!                 +----------- backend::OverrideBackend --+
//!                                        |
//!                                  scope-model
//! ```
//!
//! The backend client is always passed in explicitly; nothing here holds
//! process-wide state.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use scope_core::reconcile::{invert, reconcile, global_flags};
//! use scope_model::{Axis, ScopeModel};
//!
//! let mut scopes = BTreeMap::new();
//! scopes.insert(Axis::Required, ScopeModel::all_except(["repo-a"]));
//! scopes.insert(Axis::Optional, ScopeModel::only(["repo-a"]));
//!
//! let records = reconcile(&scopes).unwrap();
//! assert_eq!(records.len(), 1);
//!
//! let rebuilt = invert(&records, &global_flags(&scopes));
//! assert_eq!(rebuilt, scopes);
//! ```

pub mod backend;
pub mod config;
pub mod drift;
pub mod error;
pub mod exclusion;
pub mod logging;
pub mod reconcile;
pub mod resources;

pub use backend::{BackendCall, MemoryBackend, OverrideBackend};
pub use config::{ConfigResolver, ProviderConfig, ProviderManifest};
pub use drift::{DriftReport, DriftStatus, ScopeDrift, ScopeDriftKind, check_drift};
pub use error::{Error, Result};
pub use exclusion::{ExclusionPreserver, ExclusionReport, SnapshotFailurePolicy};
pub use reconcile::{global_flags, invert, invert_attachment, reconcile, reconcile_attachment};
pub use resources::{
    ChecksConfig, ChecksPlan, ChecksResource, PolicyAttachmentConfig,
    PolicyDrivenPrResource, PolicyStoreAttachmentResource, PrPolicyConfig,
};
