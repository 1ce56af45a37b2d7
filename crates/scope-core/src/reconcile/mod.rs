//! Forward and inverse reconciliation
//!
//! Forward reconciliation turns scope models into the smallest per-entity
//! override map that expresses them; inverse reconciliation rebuilds the
//! scope models from that map plus the owner-wide flags. The two directions
//! share one rule: only the non-default direction of a flag is ever
//! written, and anything equal to the default is dropped on the way back.
//! That rule is what makes `invert(reconcile(s)) == s` hold.

mod forward;
mod inverse;

pub use forward::{global_flags, reconcile, reconcile_attachment};
pub use inverse::{invert, invert_attachment};

/// Attribute name used when validating an attachment scope.
pub(crate) const ATTACHMENT_ATTRIBUTE: &str = "org";
