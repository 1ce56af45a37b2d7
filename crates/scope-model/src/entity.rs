//! Entity references
//!
//! An entity is the unit a policy is scoped to (in practice a repository
//! name). The backend stores one record per entity and has no notion of
//! wildcards, so the wildcard sentinel only ever lives at the declarative
//! boundary.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sentinel meaning "every entity" in a `repos` list.
pub const WILDCARD: &str = "*";

/// Name of a single entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityRef(String);

impl EntityRef {
    /// Create a reference without validation.
    ///
    /// Use [`EntityRef::parse`] for names coming from user configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Create a reference from user input, rejecting empty names and names
    /// with surrounding whitespace.
    pub fn parse(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::InvalidEntity {
                name: name.to_string(),
                reason: "name is empty".to_string(),
            });
        }
        if name.trim() != name {
            return Err(Error::InvalidEntity {
                name: name.to_string(),
                reason: "name has leading or trailing whitespace".to_string(),
            });
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.0 == WILDCARD
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EntityRef {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for EntityRef {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EntityRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
