//! Resource state serialized to JSON and read back, as a provider host
//! would persist it between runs.

use std::fs;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use scope_core::{
    ChecksConfig, ChecksResource, MemoryBackend, PolicyAttachmentConfig, PrPolicyConfig,
};
use scope_model::{CheckOverride, RepoSelection};
use tempfile::TempDir;

#[tokio::test]
async fn test_checks_state_survives_json_persistence() {
    let backend = Arc::new(MemoryBackend::<CheckOverride>::new());
    let resource = ChecksResource::new("acme", backend);

    let declared = ChecksConfig {
        baseline_check: Some(RepoSelection::only(["web", "api"])),
        ..ChecksConfig::default()
    };
    resource.create(&declared).await.unwrap();
    let state = resource.read().await.unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");
    fs::write(&path, serde_json::to_string_pretty(&state).unwrap()).unwrap();

    let restored = ChecksConfig::from_json(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(restored, state);
    assert_eq!(
        restored.baseline_check,
        Some(RepoSelection::only(["api", "web"]))
    );
}

#[test]
fn test_state_json_shape() {
    let config = PrPolicyConfig {
        repos: vec!["*".to_string()],
        ..PrPolicyConfig::default()
    };
    let json = serde_json::to_value(&config).unwrap();

    // Empty omit lists are left out of state
    assert!(json.get("omit_repos").is_none());
    assert_eq!(json["repos"], serde_json::json!(["*"]));
    assert_eq!(json["auto_remediation_options"]["create_pr"], false);
}

#[test]
fn test_pr_state_loads_from_json() {
    let state = r#"{
        "auto_remediation_options": { "create_pr": true },
        "repos": ["*"],
        "omit_repos": ["legacy"]
    }"#;
    let config = PrPolicyConfig::from_json(state).unwrap();
    assert!(config.auto_remediation_options.create_pr);
    assert_eq!(config.omit_repos, vec!["legacy".to_string()]);
}

#[test]
fn test_malformed_state_is_a_configuration_error() {
    let err = PolicyAttachmentConfig::from_json("{\"policy_name\": 3}").unwrap_err();
    assert!(matches!(err, scope_core::Error::Json(_)));
    assert!(err.is_configuration());
}
