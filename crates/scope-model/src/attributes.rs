//! Declarative attribute trees
//!
//! These are the typed shapes of resource blocks as they appear in
//! configuration and state (`repos`, `omit_repos`, nested `workflows`).
//! Conversion to and from [`ScopeModel`] happens only through the explicit
//! `to_scope` / `from_scope` functions below, and output lists are always
//! sorted so state never churns on ordering.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityRef, WILDCARD};
use crate::error::{Error, Result};
use crate::scope::{NestedScope, ScopeModel};
use crate::validation::{validate_attachment_scope, validate_scope};

/// A `{ repos, omit_repos }` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSelection {
    #[serde(default)]
    pub repos: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub omit_repos: Vec<String>,
}

impl RepoSelection {
    pub fn all() -> Self {
        Self {
            repos: vec![WILDCARD.to_string()],
            omit_repos: Vec::new(),
        }
    }

    pub fn all_except<I, S>(omit: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            repos: vec![WILDCARD.to_string()],
            omit_repos: omit.into_iter().map(Into::into).collect(),
        }
    }

    pub fn only<I, S>(repos: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            repos: repos.into_iter().map(Into::into).collect(),
            omit_repos: Vec::new(),
        }
    }

    /// Convert to a normalized scope, rejecting `omit_repos` without
    /// `repos = ["*"]` and a wildcard mixed with explicit names.
    pub fn to_scope(&self, attribute: &str) -> Result<ScopeModel> {
        let has_wildcard = self.repos.iter().any(|r| r == WILDCARD);
        if has_wildcard && self.repos.len() > 1 {
            return Err(Error::WildcardConflict {
                attribute: format!("{attribute}.repos"),
            });
        }
        if !self.omit_repos.is_empty() && !has_wildcard {
            return Err(Error::OmitWithoutWildcard {
                attribute: format!("{attribute}.omit_repos"),
            });
        }

        let scope = ScopeModel {
            applies_to_all: has_wildcard,
            include: if has_wildcard {
                BTreeSet::new()
            } else {
                unique_entities(&format!("{attribute}.repos"), &self.repos)?
            },
            omit: unique_entities(&format!("{attribute}.omit_repos"), &self.omit_repos)?,
            ..ScopeModel::default()
        };
        validate_scope(attribute, &scope)?;
        Ok(scope.normalized())
    }

    /// Declarative form of a scope.
    pub fn from_scope(scope: &ScopeModel) -> Self {
        if scope.applies_to_all {
            Self {
                repos: vec![WILDCARD.to_string()],
                omit_repos: scope.omit.iter().map(EntityRef::to_string).collect(),
            }
        } else {
            Self {
                repos: scope.include.iter().map(EntityRef::to_string).collect(),
                omit_repos: Vec::new(),
            }
        }
    }
}

/// One repository entry of a policy-store attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSelection {
    pub name: String,
    #[serde(default)]
    pub workflows: Vec<String>,
    /// Computed from `workflows`; any value supplied in configuration is
    /// ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_to_repo: Option<bool>,
}

impl WorkflowSelection {
    pub fn new<I, S>(name: impl Into<String>, workflows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            workflows: workflows.into_iter().map(Into::into).collect(),
            apply_to_repo: None,
        }
    }
}

/// The `org` block of a policy-store attachment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgAttachment {
    #[serde(default)]
    pub apply_to_org: bool,
    #[serde(default)]
    pub repos: Vec<WorkflowSelection>,
}

impl OrgAttachment {
    pub fn to_scope(&self, attribute: &str) -> Result<ScopeModel> {
        let repos_attribute = format!("{attribute}.repos");
        let mut scope = ScopeModel {
            applies_to_all: self.apply_to_org,
            ..ScopeModel::default()
        };

        for repo in &self.repos {
            if repo.name == WILDCARD {
                return Err(Error::InvalidEntity {
                    name: repo.name.clone(),
                    reason: format!("{repos_attribute}: use apply_to_org instead of \"*\""),
                });
            }
            let entity = EntityRef::parse(&repo.name)?;

            let mut workflows = BTreeSet::new();
            for workflow in &repo.workflows {
                if !workflows.insert(workflow.clone()) {
                    return Err(Error::Duplicate {
                        attribute: format!("{repos_attribute}.{entity}.workflows"),
                        name: workflow.clone(),
                    });
                }
            }

            // Under apply_to_org a whole repository is already covered.
            if self.apply_to_org && workflows.is_empty() {
                return Err(Error::ExplicitListWithGlobal {
                    attribute: format!("{repos_attribute}.{entity}"),
                });
            }

            if scope.nested_overrides.contains_key(&entity) {
                return Err(Error::Duplicate {
                    attribute: repos_attribute,
                    name: entity.to_string(),
                });
            }
            if !self.apply_to_org {
                scope.include.insert(entity.clone());
            }
            scope
                .nested_overrides
                .insert(entity.clone(), NestedScope::new(entity, workflows));
        }

        validate_attachment_scope(attribute, &scope)?;
        Ok(scope.normalized())
    }

    /// Declarative form of an attachment scope; `apply_to_repo` is always
    /// recomputed from the workflow list.
    pub fn from_scope(scope: &ScopeModel) -> Self {
        let mut names: BTreeSet<&EntityRef> = scope.nested_overrides.keys().collect();
        if !scope.applies_to_all {
            names.extend(scope.include.iter());
        }

        let repos = names
            .into_iter()
            .map(|entity| {
                let workflows: Vec<String> = scope
                    .nested_overrides
                    .get(entity)
                    .map(|nested| nested.sub_entities.iter().cloned().collect())
                    .unwrap_or_default();
                WorkflowSelection {
                    name: entity.to_string(),
                    apply_to_repo: Some(workflows.is_empty()),
                    workflows,
                }
            })
            .collect();

        Self {
            apply_to_org: scope.applies_to_all,
            repos,
        }
    }
}

fn unique_entities(attribute: &str, names: &[String]) -> Result<BTreeSet<EntityRef>> {
    let mut entities = BTreeSet::new();
    for name in names {
        let entity = EntityRef::parse(name)?;
        if !entities.insert(entity) {
            return Err(Error::Duplicate {
                attribute: attribute.to_string(),
                name: name.clone(),
            });
        }
    }
    Ok(entities)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_selection_is_global() {
        let scope = RepoSelection::all().to_scope("required_checks").unwrap();
        assert_eq!(scope, ScopeModel::all());
    }

    #[test]
    fn test_empty_selection_is_disabled() {
        let scope = RepoSelection::default().to_scope("required_checks").unwrap();
        assert!(scope.is_disabled());
    }

    #[test]
    fn test_from_scope_sorts_output() {
        let selection = RepoSelection::only(["b", "a", "c"]);
        let scope = selection.to_scope("repos").unwrap();
        assert_eq!(
            RepoSelection::from_scope(&scope),
            RepoSelection::only(["a", "b", "c"])
        );
    }

    #[test]
    fn test_workflow_selection_ignores_supplied_apply_to_repo() {
        let org = OrgAttachment {
            apply_to_org: false,
            repos: vec![WorkflowSelection {
                name: "a".to_string(),
                workflows: vec!["ci.yml".to_string()],
                apply_to_repo: Some(true),
            }],
        };
        let scope = org.to_scope("org").unwrap();
        let back = OrgAttachment::from_scope(&scope);
        assert_eq!(back.repos[0].apply_to_repo, Some(false));
    }
}
