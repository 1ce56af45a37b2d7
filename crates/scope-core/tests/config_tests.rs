//! Provider configuration resolution across files and environment.

use std::collections::BTreeMap;

use scope_core::config::{ENV_OWNER, LOCAL_CONFIG_FILE};
use scope_core::{ConfigResolver, Error, ProviderConfig, SnapshotFailurePolicy};
use scope_test_utils::fixtures::ProviderDir;

fn no_env() -> BTreeMap<String, String> {
    BTreeMap::new()
}

#[test]
fn test_resolve_provider_file_only() {
    let dir = ProviderDir::new();
    dir.write_config(
        r#"
owner = "acme"
api_base_url = "https://api.example.com"
"#,
    );

    let config = ConfigResolver::new(dir.path()).with_env(no_env()).resolve().unwrap();
    assert_eq!(
        config,
        ProviderConfig {
            owner: "acme".to_string(),
            api_base_url: Some("https://api.example.com".to_string()),
            snapshot_failure_policy: SnapshotFailurePolicy::BestEffort,
            log_level: "info".to_string(),
        }
    );
}

#[test]
fn test_local_overrides_and_env_layering() {
    let dir = ProviderDir::new();
    dir.write_config("owner = \"acme\"\nlog_level = \"warn\"\n");
    dir.write_local("log_level = \"debug\"\nsnapshot_failure_policy = \"fatal\"\n");

    let env = BTreeMap::from([(ENV_OWNER.to_string(), "globex".to_string())]);
    let config = ConfigResolver::new(dir.path()).with_env(env).resolve().unwrap();

    assert_eq!(config.owner, "globex");
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.snapshot_failure_policy, SnapshotFailurePolicy::Fatal);
}

#[test]
fn test_owner_may_come_from_environment_only() {
    let dir = ProviderDir::new();
    dir.write_config("log_level = \"info\"\n");

    let err = ConfigResolver::new(dir.path())
        .with_env(no_env())
        .resolve()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfig { .. }));

    let env = BTreeMap::from([(ENV_OWNER.to_string(), "acme".to_string())]);
    let config = ConfigResolver::new(dir.path()).with_env(env).resolve().unwrap();
    assert_eq!(config.owner, "acme");
}

#[test]
fn test_local_file_alone_is_not_enough() {
    let dir = ProviderDir::new();
    dir.write_local("owner = \"acme\"\n");
    assert!(dir.path().join(LOCAL_CONFIG_FILE).is_file());

    let err = ConfigResolver::new(dir.path())
        .with_env(no_env())
        .resolve()
        .unwrap_err();
    assert!(matches!(err, Error::ConfigNotFound { .. }));
    assert!(err.is_configuration());
}
