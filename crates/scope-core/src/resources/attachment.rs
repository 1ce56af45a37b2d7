//! Policy-store attachment resource
//!
//! Attaches a named policy to the whole organization or to selected
//! repositories, optionally narrowed to specific workflows. Records are
//! stored under `<owner>/<policy_name>`.

use std::sync::Arc;

use scope_model::{AttachmentOverride, OrgAttachment, OverrideMap};
use serde::{Deserialize, Serialize};

use super::{delete_if_any, stale_entities};
use crate::backend::OverrideBackend;
use crate::reconcile::{ATTACHMENT_ATTRIBUTE, invert_attachment, reconcile_attachment};
use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyAttachmentConfig {
    pub policy_name: String,
    #[serde(default)]
    pub org: OrgAttachment,
}

impl PolicyAttachmentConfig {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

pub struct PolicyStoreAttachmentResource {
    owner: String,
    backend: Arc<dyn OverrideBackend<AttachmentOverride>>,
}

impl PolicyStoreAttachmentResource {
    pub fn new(
        owner: impl Into<String>,
        backend: Arc<dyn OverrideBackend<AttachmentOverride>>,
    ) -> Self {
        Self {
            owner: owner.into(),
            backend,
        }
    }

    /// Backend key of a policy's attachment records.
    pub fn store_key(&self, policy_name: &str) -> Result<String> {
        let policy_name = policy_name.trim();
        if policy_name.is_empty() {
            return Err(Error::InvalidConfig {
                message: "policy_name must not be empty".to_string(),
            });
        }
        Ok(format!("{}/{}", self.owner, policy_name))
    }

    /// Validate `config` and compute its owner-wide flag and records.
    pub fn plan(config: &PolicyAttachmentConfig) -> Result<(bool, OverrideMap<AttachmentOverride>)> {
        let scope = config.org.to_scope(ATTACHMENT_ATTRIBUTE)?;
        let records = reconcile_attachment(&scope)?;
        Ok((scope.applies_to_all, records))
    }

    pub async fn create(&self, config: &PolicyAttachmentConfig) -> Result<PolicyAttachmentConfig> {
        self.apply(config).await
    }

    pub async fn update(&self, config: &PolicyAttachmentConfig) -> Result<PolicyAttachmentConfig> {
        self.apply(config).await
    }

    async fn apply(&self, config: &PolicyAttachmentConfig) -> Result<PolicyAttachmentConfig> {
        let key = self.store_key(&config.policy_name)?;
        let (apply_to_org, records) = Self::plan(config)?;
        let (_, current) = self.backend.list_config(&key).await?;

        tracing::info!(
            policy = %key,
            apply_to_org,
            repos = records.len(),
            "Attaching policy"
        );
        self.backend.put_config(&key, &records, &apply_to_org).await?;

        let stale = stale_entities(&current, &records);
        delete_if_any(self.backend.as_ref(), &key, &stale).await?;

        Ok(Self::state(&config.policy_name, apply_to_org, &records))
    }

    /// Rebuild the attachment from backend state. `apply_to_repo` is always
    /// derived from the workflow lists.
    pub async fn read(&self, policy_name: &str) -> Result<PolicyAttachmentConfig> {
        let key = self.store_key(policy_name)?;
        let (apply_to_org, records) = self.backend.list_config(&key).await?;
        Ok(Self::state(policy_name, apply_to_org, &records))
    }

    pub async fn delete(&self, policy_name: &str) -> Result<()> {
        let key = self.store_key(policy_name)?;
        let (_, current) = self.backend.list_config(&key).await?;
        let entities: Vec<_> = current.into_keys().collect();
        delete_if_any(self.backend.as_ref(), &key, &entities).await?;

        tracing::info!(policy = %key, "Detaching policy");
        self.backend
            .put_config(&key, &OverrideMap::new(), &false)
            .await
    }

    fn state(
        policy_name: &str,
        apply_to_org: bool,
        records: &OverrideMap<AttachmentOverride>,
    ) -> PolicyAttachmentConfig {
        let scope = invert_attachment(records, apply_to_org);
        PolicyAttachmentConfig {
            policy_name: policy_name.trim().to_string(),
            org: OrgAttachment::from_scope(&scope),
        }
    }
}
