//! Control settings
//!
//! Exactly one control kind (the npm package cooldown) carries a settings
//! sub-object. Settings are defaulted and range-checked here, independently
//! of any scope logic, and rejected outright on every other control kind.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default cooldown period in days, used when the value is absent or `0`.
pub const COOL_DOWN_DEFAULT: i64 = 2;
pub const COOL_DOWN_MIN: i64 = 1;
pub const COOL_DOWN_MAX: i64 = 30;

/// Known checks controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    NpmPackageCooldown,
    NpmPackageCompromisedUpdates,
    PwnRequest,
    ScriptInjection,
    HardenRunner,
    SecretExfiltration,
    PinnedActions,
    GithubTokenPermissions,
}

impl ControlKind {
    pub const ALL: [ControlKind; 8] = [
        ControlKind::NpmPackageCooldown,
        ControlKind::NpmPackageCompromisedUpdates,
        ControlKind::PwnRequest,
        ControlKind::ScriptInjection,
        ControlKind::HardenRunner,
        ControlKind::SecretExfiltration,
        ControlKind::PinnedActions,
        ControlKind::GithubTokenPermissions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ControlKind::NpmPackageCooldown => "npm_package_cooldown",
            ControlKind::NpmPackageCompromisedUpdates => "npm_package_compromised_updates",
            ControlKind::PwnRequest => "pwn_request",
            ControlKind::ScriptInjection => "script_injection",
            ControlKind::HardenRunner => "harden_runner",
            ControlKind::SecretExfiltration => "secret_exfiltration",
            ControlKind::PinnedActions => "pinned_actions",
            ControlKind::GithubTokenPermissions => "github_token_permissions",
        }
    }

    /// Whether this control accepts a settings sub-object.
    pub fn supports_settings(&self) -> bool {
        matches!(self, ControlKind::NpmPackageCooldown)
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlKind {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['-', ' '], "_");
        ControlKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| Error::UnknownControl {
                name: s.to_string(),
            })
    }
}

/// Whether a control blocks merges or only reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckType {
    #[default]
    Required,
    Optional,
}

/// Settings as written by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSettings {
    /// Days a freshly published package version is held back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cool_down_period: Option<i64>,

    /// Packages exempt from the cooldown check, kept in the user's order.
    #[serde(
        default,
        rename = "packages_to_exempt_in_cooldown_check",
        skip_serializing_if = "Option::is_none"
    )]
    pub packages_to_exempt: Option<Vec<String>>,
}

/// Settings after defaulting and validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveSettings {
    pub cool_down_period: i64,
    /// Absent rather than empty: the backend omits the field when empty.
    #[serde(
        default,
        rename = "packages_to_exempt_in_cooldown_check",
        skip_serializing_if = "Option::is_none"
    )]
    pub packages_to_exempt: Option<Vec<String>>,
}

impl Default for EffectiveSettings {
    fn default() -> Self {
        Self {
            cool_down_period: COOL_DOWN_DEFAULT,
            packages_to_exempt: None,
        }
    }
}

impl From<EffectiveSettings> for ControlSettings {
    fn from(settings: EffectiveSettings) -> Self {
        Self {
            cool_down_period: Some(settings.cool_down_period),
            packages_to_exempt: settings.packages_to_exempt,
        }
    }
}

/// Merge user settings for `kind` into effective settings.
///
/// Returns `Ok(None)` for control kinds without settings, and an error if
/// settings were supplied for such a kind anyway.
pub fn merge_settings(
    kind: ControlKind,
    user: Option<&ControlSettings>,
) -> Result<Option<EffectiveSettings>> {
    if !kind.supports_settings() {
        return match user {
            Some(_) => Err(Error::SettingsNotSupported {
                control: kind.to_string(),
            }),
            None => Ok(None),
        };
    }

    let Some(user) = user else {
        tracing::debug!(control = %kind, "No settings supplied, using defaults");
        return Ok(Some(EffectiveSettings::default()));
    };

    let cool_down_period = match user.cool_down_period {
        None | Some(0) => COOL_DOWN_DEFAULT,
        Some(value) if (COOL_DOWN_MIN..=COOL_DOWN_MAX).contains(&value) => value,
        Some(value) => {
            return Err(Error::ParameterOutOfRange {
                name: "cool_down_period".to_string(),
                value,
                min: COOL_DOWN_MIN,
                max: COOL_DOWN_MAX,
            });
        }
    };

    if let Some(packages) = &user.packages_to_exempt {
        let mut seen = BTreeSet::new();
        for package in packages {
            if !seen.insert(package.as_str()) {
                return Err(Error::Duplicate {
                    attribute: "packages_to_exempt_in_cooldown_check".to_string(),
                    name: package.clone(),
                });
            }
        }
    }

    let packages_to_exempt = user
        .packages_to_exempt
        .clone()
        .filter(|packages| !packages.is_empty());

    Ok(Some(EffectiveSettings {
        cool_down_period,
        packages_to_exempt,
    }))
}

/// A control entry in a checks resource block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlConfig {
    pub control: String,
    #[serde(default = "default_enable")]
    pub enable: bool,
    #[serde(rename = "type", default)]
    pub check_type: CheckType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<ControlSettings>,
}

fn default_enable() -> bool {
    true
}

/// A control after name resolution and settings merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveControl {
    pub enable: bool,
    pub check_type: CheckType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<EffectiveSettings>,
}

impl EffectiveControl {
    /// Declarative form of this control, as written back to state.
    pub fn to_config(&self, kind: ControlKind) -> ControlConfig {
        ControlConfig {
            control: kind.to_string(),
            enable: self.enable,
            check_type: self.check_type,
            settings: self.settings.clone().map(ControlSettings::from),
        }
    }
}

/// Resolve a list of control entries, rejecting unknown and duplicate
/// controls and merging each control's settings.
pub fn resolve_controls(
    controls: &[ControlConfig],
) -> Result<BTreeMap<ControlKind, EffectiveControl>> {
    let mut resolved = BTreeMap::new();
    for control in controls {
        let kind: ControlKind = control.control.parse()?;
        let settings = merge_settings(kind, control.settings.as_ref())?;
        let effective = EffectiveControl {
            enable: control.enable,
            check_type: control.check_type,
            settings,
        };
        if resolved.insert(kind, effective).is_some() {
            return Err(Error::Duplicate {
                attribute: "controls".to_string(),
                name: kind.to_string(),
            });
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn cooldown(period: Option<i64>, exempt: Option<Vec<&str>>) -> ControlSettings {
        ControlSettings {
            cool_down_period: period,
            packages_to_exempt: exempt.map(|p| p.into_iter().map(String::from).collect()),
        }
    }

    #[rstest]
    #[case(None, 2)]
    #[case(Some(0), 2)]
    #[case(Some(1), 1)]
    #[case(Some(15), 15)]
    #[case(Some(30), 30)]
    fn test_cool_down_period_defaults_and_passes_through(
        #[case] input: Option<i64>,
        #[case] expected: i64,
    ) {
        let merged = merge_settings(ControlKind::NpmPackageCooldown, Some(&cooldown(input, None)))
            .unwrap()
            .unwrap();
        assert_eq!(merged.cool_down_period, expected);
    }

    #[rstest]
    #[case(31)]
    #[case(50)]
    #[case(-1)]
    fn test_cool_down_period_out_of_range(#[case] input: i64) {
        let err = merge_settings(
            ControlKind::NpmPackageCooldown,
            Some(&cooldown(Some(input), None)),
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::ParameterOutOfRange {
                name: "cool_down_period".to_string(),
                value: input,
                min: 1,
                max: 30,
            }
        );
    }

    #[test]
    fn test_exempt_list_preserved_verbatim() {
        let merged = merge_settings(
            ControlKind::NpmPackageCooldown,
            Some(&cooldown(Some(15), Some(vec!["pkgB", "pkgA"]))),
        )
        .unwrap()
        .unwrap();
        assert_eq!(merged.cool_down_period, 15);
        assert_eq!(
            merged.packages_to_exempt,
            Some(vec!["pkgB".to_string(), "pkgA".to_string()])
        );
    }

    #[test]
    fn test_empty_exempt_list_becomes_absent() {
        let merged = merge_settings(
            ControlKind::NpmPackageCooldown,
            Some(&cooldown(None, Some(vec![]))),
        )
        .unwrap()
        .unwrap();
        assert_eq!(merged.packages_to_exempt, None);
    }

    #[test]
    fn test_duplicate_exempt_package_rejected() {
        let err = merge_settings(
            ControlKind::NpmPackageCooldown,
            Some(&cooldown(Some(5), Some(vec!["pkgA", "pkgB", "pkgA"]))),
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::Duplicate {
                attribute: "packages_to_exempt_in_cooldown_check".to_string(),
                name: "pkgA".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_settings_are_defaulted_for_cooldown() {
        let merged = merge_settings(ControlKind::NpmPackageCooldown, None).unwrap();
        assert_eq!(merged, Some(EffectiveSettings::default()));
    }

    #[test]
    fn test_settings_rejected_for_other_controls() {
        let err = merge_settings(ControlKind::PwnRequest, Some(&ControlSettings::default()))
            .unwrap_err();
        assert!(matches!(err, Error::SettingsNotSupported { .. }));
        assert_eq!(merge_settings(ControlKind::PwnRequest, None).unwrap(), None);
    }

    #[test]
    fn test_control_kind_parses_loosely() {
        assert_eq!(
            "Harden-Runner".parse::<ControlKind>().unwrap(),
            ControlKind::HardenRunner
        );
        assert_eq!(
            "npm package cooldown".parse::<ControlKind>().unwrap(),
            ControlKind::NpmPackageCooldown
        );
        assert!(matches!(
            "unknown".parse::<ControlKind>(),
            Err(Error::UnknownControl { .. })
        ));
    }

    #[test]
    fn test_resolve_controls_rejects_duplicates() {
        let control = ControlConfig {
            control: "pwn_request".to_string(),
            enable: true,
            check_type: CheckType::Required,
            settings: None,
        };
        let err = resolve_controls(&[control.clone(), control]).unwrap_err();
        assert!(matches!(err, Error::Duplicate { .. }));
    }

    #[test]
    fn test_resolve_controls_defaults_cooldown_settings() {
        let controls = [
            ControlConfig {
                control: "npm_package_cooldown".to_string(),
                enable: true,
                check_type: CheckType::Optional,
                settings: None,
            },
            ControlConfig {
                control: "script_injection".to_string(),
                enable: false,
                check_type: CheckType::Required,
                settings: None,
            },
        ];
        let resolved = resolve_controls(&controls).unwrap();
        assert_eq!(
            resolved[&ControlKind::NpmPackageCooldown].settings,
            Some(EffectiveSettings::default())
        );
        assert_eq!(resolved[&ControlKind::ScriptInjection].settings, None);
        assert!(!resolved[&ControlKind::ScriptInjection].enable);
    }
}
