//! Provider configuration
//!
//! Provider settings are read from `provider.toml`, overlaid by an optional
//! git-ignored `provider.local.toml`, then by `SCOPE_*` environment
//! variables. See [`ConfigResolver`] for the layer order.

mod provider;
mod resolver;

pub use provider::{ProviderConfig, ProviderManifest};
pub use resolver::{
    ConfigResolver, ENV_API_BASE_URL, ENV_LOG_LEVEL, ENV_OWNER, LOCAL_CONFIG_FILE,
    PROVIDER_CONFIG_FILE,
};
