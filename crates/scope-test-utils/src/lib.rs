//! Shared test utilities for the policy-scope workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`fixtures`]: scope and control builders, provider config directories
//! - [`strategies`]: proptest strategies producing well-formed scopes

pub mod fixtures;
pub mod strategies;
