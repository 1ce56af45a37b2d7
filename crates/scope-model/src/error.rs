//! Error types for scope-model
//!
//! Every variant here is a configuration error: it is detected before any
//! backend call and is never retried.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Invalid entity name {name:?}: {reason}")]
    InvalidEntity { name: String, reason: String },

    #[error("{attribute}: the wildcard \"*\" cannot be combined with other entries")]
    WildcardConflict { attribute: String },

    #[error("{attribute}: an explicit list cannot be combined with applying to all entities")]
    ExplicitListWithGlobal { attribute: String },

    #[error("{attribute}: omitted entities require the scope to apply to all entities (\"*\")")]
    OmitWithoutWildcard { attribute: String },

    #[error("{attribute}: nested overrides are not supported on this scope")]
    NestedNotSupported { attribute: String },

    #[error("{attribute}: omitted entities are not supported on this scope")]
    OmitNotSupported { attribute: String },

    #[error("{attribute}: nested override keyed {key:?} names entity {entity:?}")]
    NestedKeyMismatch {
        attribute: String,
        key: String,
        entity: String,
    },

    #[error("{attribute}: duplicate entry {name:?}")]
    Duplicate { attribute: String, name: String },

    #[error("Unknown control: {name}")]
    UnknownControl { name: String },

    #[error("Unknown axis: {name}")]
    UnknownAxis { name: String },

    #[error("Control {control} does not support settings")]
    SettingsNotSupported { control: String },

    #[error("{name} must be between {min} and {max}, got {value}")]
    ParameterOutOfRange {
        name: String,
        value: i64,
        min: i64,
        max: i64,
    },
}
