//! Configuration resolution with layered merge
//!
//! The `ConfigResolver` loads provider configuration from a directory and
//! the environment, with later sources overriding earlier ones.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::provider::{ProviderConfig, ProviderManifest};
use crate::{Error, Result};

pub const PROVIDER_CONFIG_FILE: &str = "provider.toml";
pub const LOCAL_CONFIG_FILE: &str = "provider.local.toml";

pub const ENV_OWNER: &str = "SCOPE_OWNER";
pub const ENV_API_BASE_URL: &str = "SCOPE_API_BASE_URL";
pub const ENV_LOG_LEVEL: &str = "SCOPE_LOG_LEVEL";

/// Resolves provider configuration by merging multiple sources
///
/// Configuration is loaded from:
/// 1. Provider config (`<dir>/provider.toml`), required
/// 2. Local overrides (`<dir>/provider.local.toml`), optional
/// 3. Environment variables `SCOPE_OWNER`, `SCOPE_API_BASE_URL`,
///    `SCOPE_LOG_LEVEL`
pub struct ConfigResolver {
    dir: PathBuf,

    /// Replaces the process environment when set (used for testing).
    env_override: Option<BTreeMap<String, String>>,
}

impl ConfigResolver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            env_override: None,
        }
    }

    /// Read environment layer values from `env` instead of the process
    /// environment.
    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env_override = Some(env);
        self
    }

    fn env_var(&self, key: &str) -> Option<String> {
        let value = match &self.env_override {
            Some(env) => env.get(key).cloned(),
            None => std::env::var(key).ok(),
        };
        value.filter(|v| !v.trim().is_empty())
    }

    fn load_layer(path: &Path) -> Result<ProviderManifest> {
        let content = fs::read_to_string(path)?;
        ProviderManifest::parse(&content)
    }

    /// Resolve the configuration by merging all sources.
    ///
    /// A missing `provider.toml` is [`Error::ConfigNotFound`]; a missing
    /// local file is skipped. Invalid TOML in either file is an error.
    pub fn resolve(&self) -> Result<ProviderConfig> {
        // Layer 1 - provider.toml
        let config_path = self.dir.join(PROVIDER_CONFIG_FILE);
        if !config_path.is_file() {
            return Err(Error::ConfigNotFound { path: config_path });
        }
        tracing::debug!(?config_path, "Loading provider config (layer 1)");
        let mut manifest = Self::load_layer(&config_path)?;

        // Layer 2 - provider.local.toml
        let local_path = self.dir.join(LOCAL_CONFIG_FILE);
        if local_path.is_file() {
            tracing::debug!(?local_path, "Loading local overrides (layer 2)");
            manifest.merge(&Self::load_layer(&local_path)?);
        } else {
            tracing::debug!(?local_path, "No local overrides found (layer 2), skipping");
        }

        // Layer 3 - environment
        let env_layer = ProviderManifest {
            owner: self.env_var(ENV_OWNER),
            api_base_url: self.env_var(ENV_API_BASE_URL),
            snapshot_failure_policy: None,
            log_level: self.env_var(ENV_LOG_LEVEL),
        };
        if env_layer != ProviderManifest::default() {
            tracing::debug!("Applying environment overrides (layer 3)");
            manifest.merge(&env_layer);
        }

        manifest.try_into()
    }
}
