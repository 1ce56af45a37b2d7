//! Builders for scopes, controls and provider config directories.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use scope_model::{Axis, CheckType, ControlConfig, ControlSettings, ScopeModel};
use tempfile::TempDir;

/// Per-axis scope map from a slice of pairs.
pub fn scopes(entries: &[(Axis, ScopeModel)]) -> BTreeMap<Axis, ScopeModel> {
    entries.iter().cloned().collect()
}

/// The required/optional scenario: `repo_a` omitted from required checks
/// and included in optional checks.
pub fn omit_include_scenario(repo_a: &str) -> BTreeMap<Axis, ScopeModel> {
    scopes(&[
        (Axis::Required, ScopeModel::all_except([repo_a])),
        (Axis::Optional, ScopeModel::only([repo_a])),
    ])
}

/// A package cooldown control entry with the given settings.
pub fn cooldown_control(period: Option<i64>, exempt: Option<&[&str]>) -> ControlConfig {
    ControlConfig {
        control: "npm_package_cooldown".to_string(),
        enable: true,
        check_type: CheckType::Required,
        settings: Some(ControlSettings {
            cool_down_period: period,
            packages_to_exempt: exempt.map(|p| p.iter().map(|s| s.to_string()).collect()),
        }),
    }
}

/// A control entry without settings.
pub fn control(name: &str) -> ControlConfig {
    ControlConfig {
        control: name.to_string(),
        enable: true,
        check_type: CheckType::Required,
        settings: None,
    }
}

/// A temporary directory holding provider configuration files.
///
/// # Example
///
/// ```rust
/// use scope_test_utils::fixtures::ProviderDir;
///
/// let dir = ProviderDir::new();
/// dir.write_config("owner = \"acme\"\n");
/// assert!(dir.path().join("provider.toml").is_file());
/// ```
pub struct ProviderDir {
    temp_dir: TempDir,
}

impl Default for ProviderDir {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderDir {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("ProviderDir::new: failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `provider.toml`.
    pub fn write_config(&self, content: &str) {
        self.write("provider.toml", content);
    }

    /// Write `provider.local.toml`.
    pub fn write_local(&self, content: &str) {
        self.write("provider.local.toml", content);
    }

    fn write(&self, name: &str, content: &str) {
        fs::write(self.path().join(name), content)
            .unwrap_or_else(|e| panic!("ProviderDir: failed to write {name}: {e}"));
    }
}
