//! Error types for scope-core

use std::path::PathBuf;

/// Result type for scope-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in scope-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A backend call failed
    #[error("Backend {operation} failed for {owner}: {message}")]
    Backend {
        operation: String,
        owner: String,
        message: String,
    },

    /// Fetching an entity's configuration before an exclusion failed and
    /// the snapshot policy does not allow skipping it
    #[error("Snapshot of {entity} failed before applying exclusions")]
    SnapshotFailed {
        entity: String,
        #[source]
        source: Box<Error>,
    },

    /// The global write succeeded but restoring or removing excluded
    /// entities did not; backend state no longer matches the declaration
    #[error("Global configuration for {owner} was written but {stage} failed for {entities:?}")]
    ExclusionIncomplete {
        owner: String,
        stage: String,
        entities: Vec<String>,
        #[source]
        source: Box<Error>,
    },

    /// Provider configuration file not found at expected path
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Provider or resource configuration is incomplete or inconsistent
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    // Transparent wrappers for underlying crate errors
    /// Configuration error from scope-model
    #[error(transparent)]
    Model(#[from] scope_model::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl Error {
    pub fn backend(
        operation: impl Into<String>,
        owner: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Backend {
            operation: operation.into(),
            owner: owner.into(),
            message: message.into(),
        }
    }

    /// Configuration errors are detected before any backend call and must
    /// never be retried.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Model(_)
                | Error::InvalidConfig { .. }
                | Error::ConfigNotFound { .. }
                | Error::TomlDe(_)
                | Error::Json(_)
        )
    }
}
