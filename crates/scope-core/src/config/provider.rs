//! Provider manifest parsing
//!
//! A [`ProviderManifest`] is one parsed configuration layer; every field is
//! optional so layers can be merged. The final [`ProviderConfig`] is built
//! once all layers are merged and requires an owner.

use serde::{Deserialize, Serialize};

use crate::exclusion::SnapshotFailurePolicy;
use crate::{Error, Result};

fn default_log_level() -> String {
    "info".to_string()
}

/// One layer of provider configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderManifest {
    /// Organization the provider manages
    #[serde(default)]
    pub owner: Option<String>,

    /// Base URL of the policy API
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// How snapshot failures are handled before an exclusion write
    #[serde(default)]
    pub snapshot_failure_policy: Option<SnapshotFailurePolicy>,

    /// `tracing` filter directive, e.g. `"debug"` or `"scope_core=trace"`
    #[serde(default)]
    pub log_level: Option<String>,
}

impl ProviderManifest {
    /// Parse a manifest from TOML content
    ///
    /// # Example
    ///
    /// ```
    /// use scope_core::config::ProviderManifest;
    ///
    /// let manifest = ProviderManifest::parse(r#"
    /// owner = "acme"
    /// snapshot_failure_policy = "fatal"
    /// "#).unwrap();
    ///
    /// assert_eq!(manifest.owner.as_deref(), Some("acme"));
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: ProviderManifest = toml::from_str(content)?;
        Ok(manifest)
    }

    /// Merge another manifest into this one; values set in `other` win.
    pub fn merge(&mut self, other: &ProviderManifest) {
        if other.owner.is_some() {
            self.owner = other.owner.clone();
        }
        if other.api_base_url.is_some() {
            self.api_base_url = other.api_base_url.clone();
        }
        if other.snapshot_failure_policy.is_some() {
            self.snapshot_failure_policy = other.snapshot_failure_policy;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level.clone();
        }
    }
}

/// Resolved provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub owner: String,
    pub api_base_url: Option<String>,
    pub snapshot_failure_policy: SnapshotFailurePolicy,
    pub log_level: String,
}

impl ProviderConfig {
    /// Parse a single TOML document straight into a resolved config.
    pub fn parse(content: &str) -> Result<Self> {
        ProviderManifest::parse(content)?.try_into()
    }
}

impl TryFrom<ProviderManifest> for ProviderConfig {
    type Error = Error;

    fn try_from(manifest: ProviderManifest) -> Result<Self> {
        let owner = manifest
            .owner
            .map(|owner| owner.trim().to_string())
            .filter(|owner| !owner.is_empty())
            .ok_or_else(|| Error::InvalidConfig {
                message: "owner is required".to_string(),
            })?;

        if let Some(url) = &manifest.api_base_url
            && !(url.starts_with("https://") || url.starts_with("http://"))
        {
            return Err(Error::InvalidConfig {
                message: format!("api_base_url must be an http(s) URL, got '{url}'"),
            });
        }

        Ok(Self {
            owner,
            api_base_url: manifest.api_base_url,
            snapshot_failure_policy: manifest.snapshot_failure_policy.unwrap_or_default(),
            log_level: manifest.log_level.unwrap_or_else(default_log_level),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_full() {
        let config = ProviderConfig::parse(
            r#"
owner = "acme"
api_base_url = "https://api.example.com"
snapshot_failure_policy = "fatal"
log_level = "debug"
"#,
        )
        .unwrap();

        assert_eq!(
            config,
            ProviderConfig {
                owner: "acme".to_string(),
                api_base_url: Some("https://api.example.com".to_string()),
                snapshot_failure_policy: SnapshotFailurePolicy::Fatal,
                log_level: "debug".to_string(),
            }
        );
    }

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::parse(r#"owner = "acme""#).unwrap();
        assert_eq!(config.snapshot_failure_policy, SnapshotFailurePolicy::BestEffort);
        assert_eq!(config.log_level, "info");
        assert!(config.api_base_url.is_none());
    }

    #[test]
    fn test_missing_owner_is_config_error() {
        let err = ProviderConfig::parse("").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));

        let err = ProviderConfig::parse(r#"owner = "  ""#).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_rejects_unknown_keys_and_bad_url() {
        assert!(matches!(
            ProviderManifest::parse(r#"ownr = "acme""#),
            Err(Error::TomlDe(_))
        ));
        assert!(matches!(
            ProviderConfig::parse("owner = \"acme\"\napi_base_url = \"ftp://x\""),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_merge_other_wins_when_set() {
        let mut base = ProviderManifest::parse(
            r#"
owner = "acme"
log_level = "warn"
"#,
        )
        .unwrap();
        let local = ProviderManifest::parse(r#"log_level = "trace""#).unwrap();
        base.merge(&local);

        assert_eq!(base.owner.as_deref(), Some("acme"));
        assert_eq!(base.log_level.as_deref(), Some("trace"));
    }
}
