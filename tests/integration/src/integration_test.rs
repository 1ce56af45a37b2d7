//! End-to-end integration test for the provider flow
//!
//! Exercises: provider config -> resource create -> read -> drift check,
//! across all three resources sharing one owner.

use std::collections::BTreeMap;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use scope_core::{
    ChecksConfig, ChecksResource, ConfigResolver, MemoryBackend, PolicyAttachmentConfig,
    PolicyDrivenPrResource, PolicyStoreAttachmentResource, PrPolicyConfig, check_drift, logging,
};
use scope_model::{AttachmentOverride, CheckOverride, PrPolicyRecord};
use scope_test_utils::fixtures::ProviderDir;

const CHECKS: &str = r#"
[[controls]]
control = "npm_package_cooldown"
type = "optional"
settings = { cool_down_period = 15, packages_to_exempt_in_cooldown_check = ["pkgA"] }

[[controls]]
control = "harden_runner"

[required_checks]
repos = ["*"]
omit_repos = ["repoA"]

[optional_checks]
repos = ["repoA"]
"#;

const ATTACHMENT: &str = r#"
policy_name = "baseline"

[org]
repos = [
  { name = "repoA", workflows = ["ci.yml"] },
  { name = "repoB" },
]
"#;

const PR: &str = r#"
repos = ["*"]
omit_repos = ["repoA"]

[auto_remediation_options]
create_pr = true
pin_actions_to_sha = true
actions_to_exempt_while_pinning = ["actions/checkout"]
"#;

fn provider_dir() -> ProviderDir {
    let dir = ProviderDir::new();
    dir.write_config("owner = \"acme\"\nlog_level = \"debug\"\n");
    dir.write_local("snapshot_failure_policy = \"best_effort\"\n");
    dir
}

#[tokio::test]
async fn test_full_provider_flow() {
    let dir = provider_dir();
    let config = ConfigResolver::new(dir.path())
        .with_env(BTreeMap::new())
        .resolve()
        .unwrap();
    let _ = logging::init_with_level(&config.log_level);

    // Checks
    let checks_backend = Arc::new(MemoryBackend::<CheckOverride>::new());
    let checks = ChecksResource::new(&config.owner, checks_backend.clone());
    let declared = ChecksConfig::parse(CHECKS).unwrap();
    checks.create(&declared).await.unwrap();

    let observed = checks.read().await.unwrap();
    assert!(check_drift(&declared.scopes().unwrap(), &observed.scopes().unwrap()).is_healthy());
    assert_eq!(checks_backend.state("acme").overrides.len(), 1);

    let cooldown = observed
        .controls
        .iter()
        .find(|c| c.control == "npm_package_cooldown")
        .unwrap();
    let settings = cooldown.settings.as_ref().unwrap();
    assert_eq!(settings.cool_down_period, Some(15));
    assert_eq!(settings.packages_to_exempt, Some(vec!["pkgA".to_string()]));

    // Policy-store attachment
    let attachment_backend = Arc::new(MemoryBackend::<AttachmentOverride>::new());
    let attachments = PolicyStoreAttachmentResource::new(&config.owner, attachment_backend);
    let declared = PolicyAttachmentConfig::parse(ATTACHMENT).unwrap();
    let state = attachments.create(&declared).await.unwrap();
    assert_eq!(attachments.read("baseline").await.unwrap(), state);
    assert_eq!(
        state
            .org
            .repos
            .iter()
            .map(|r| (r.name.as_str(), r.apply_to_repo))
            .collect::<Vec<_>>(),
        vec![("repoA", Some(false)), ("repoB", Some(true))]
    );

    // Policy-driven PR
    let pr_backend =
        Arc::new(MemoryBackend::<PrPolicyRecord>::new().with_fan_out(|global| global.clone()));
    pr_backend.register_entities("acme", ["repoA", "repoB"]);
    let pr = PolicyDrivenPrResource::new(&config.owner, pr_backend.clone())
        .with_snapshot_policy(config.snapshot_failure_policy);
    let declared = PrPolicyConfig::parse(PR).unwrap();
    let report = pr.create(&declared).await.unwrap();

    assert_eq!(report.removed.len(), 1);
    assert_eq!(pr_backend.record("acme", "repoA"), None);
    assert_eq!(pr.read(Some(&declared)).await.unwrap(), Some(declared));
}

#[tokio::test]
async fn test_narrowing_pr_scope_keeps_repo_override() {
    let backend =
        Arc::new(MemoryBackend::<PrPolicyRecord>::new().with_fan_out(|global| global.clone()));
    backend.register_entities("acme", ["repoA", "repoB"]);
    let repo_a_options = PrPolicyRecord {
        create_issue: true,
        ..PrPolicyRecord::default()
    };
    backend.seed("acme", "repoA", repo_a_options.clone());

    let resource = PolicyDrivenPrResource::new("acme", backend.clone());
    let declared = PrPolicyConfig::parse(PR).unwrap();
    resource.create(&declared).await.unwrap();

    assert_eq!(backend.record("acme", "repoA"), Some(repo_a_options));
    assert_eq!(
        backend.record("acme", "repoB"),
        Some(declared.auto_remediation_options.clone())
    );
    assert_eq!(resource.read(Some(&declared)).await.unwrap(), Some(declared));
}
