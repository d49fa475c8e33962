//! Predefined system namespaces, roles, actions and base policies.
//!
//! Loaded into the schema registry on startup alongside any registered
//! resource namespaces. The organization-owner shortcut lives here as plain
//! policy data: every system action is granted to the namespace owner role
//! and scoped namespaces inherit from their parent through hierarchy roles,
//! so the authorization engine needs no special cases.

use uuid::Uuid;

use crate::action::Action;
use crate::metadata::Metadata;
use crate::namespace::Namespace;
use crate::policy::Policy;
use crate::role::{role_id, Role, GROUP_TYPE, USER_TYPE};

pub const NAMESPACE_USER: &str = "user";
pub const NAMESPACE_GROUP: &str = "group";
pub const NAMESPACE_ORGANIZATION: &str = "organization";
pub const NAMESPACE_PROJECT: &str = "project";

pub const ROLE_ORGANIZATION_OWNER: &str = "organization:owner";
pub const ROLE_PROJECT_ORGANIZATION: &str = "project:organization";
pub const ROLE_GROUP_ORGANIZATION: &str = "group:organization";
pub const ROLE_GROUP_MANAGER: &str = "group:manager";
pub const ROLE_GROUP_MEMBER: &str = "group:member";

/// Roles that establish group membership for subject-set resolution
pub const MEMBERSHIP_ROLES: &[&str] = &[ROLE_GROUP_MEMBER, ROLE_GROUP_MANAGER];

pub const ACTION_VIEW: &str = "view";
pub const ACTION_EDIT: &str = "edit";
pub const ACTION_DELETE: &str = "delete";
pub const ACTION_MANAGE: &str = "manage";

const DEFAULT_ACTIONS: &[&str] = &[ACTION_VIEW, ACTION_EDIT, ACTION_DELETE, ACTION_MANAGE];

pub fn is_system_namespace(namespace_id: &str) -> bool {
    matches!(
        namespace_id,
        NAMESPACE_USER | NAMESPACE_GROUP | NAMESPACE_ORGANIZATION | NAMESPACE_PROJECT
    )
}

fn system_namespace(id: &str, name: &str) -> Namespace {
    Namespace {
        id: id.to_string(),
        name: name.to_string(),
        backend: id.to_string(),
        resource_type: String::new(),
        created_at: None,
        updated_at: None,
    }
}

pub fn system_namespaces() -> Vec<Namespace> {
    vec![
        system_namespace(NAMESPACE_USER, "User"),
        system_namespace(NAMESPACE_GROUP, "Group"),
        system_namespace(NAMESPACE_ORGANIZATION, "Organization"),
        system_namespace(NAMESPACE_PROJECT, "Project"),
    ]
}

fn role(id: &str, name: &str, namespace_id: &str, types: &[&str]) -> Role {
    Role {
        id: id.to_string(),
        name: name.to_string(),
        namespace_id: namespace_id.to_string(),
        types: types.iter().map(|t| t.to_string()).collect(),
        metadata: Metadata::new(),
        created_at: None,
        updated_at: None,
    }
}

pub fn system_roles() -> Vec<Role> {
    vec![
        role(
            ROLE_ORGANIZATION_OWNER,
            "Owner",
            NAMESPACE_ORGANIZATION,
            &[USER_TYPE],
        ),
        role(
            ROLE_PROJECT_ORGANIZATION,
            "Organization",
            NAMESPACE_PROJECT,
            &[NAMESPACE_ORGANIZATION],
        ),
        role(
            ROLE_GROUP_ORGANIZATION,
            "Organization",
            NAMESPACE_GROUP,
            &[NAMESPACE_ORGANIZATION],
        ),
        role(
            ROLE_GROUP_MANAGER,
            "Manager",
            NAMESPACE_GROUP,
            &[USER_TYPE],
        ),
        role(ROLE_GROUP_MEMBER, "Member", NAMESPACE_GROUP, &[USER_TYPE]),
    ]
}

fn actions_for(namespace_id: &str) -> Vec<Action> {
    DEFAULT_ACTIONS
        .iter()
        .map(|a| Action {
            id: a.to_string(),
            name: a.to_string(),
            namespace_id: namespace_id.to_string(),
            created_at: None,
            updated_at: None,
        })
        .collect()
}

pub fn system_actions() -> Vec<Action> {
    let mut actions = actions_for(NAMESPACE_ORGANIZATION);
    actions.extend(actions_for(NAMESPACE_PROJECT));
    actions.extend(actions_for(NAMESPACE_GROUP));
    actions
}

fn policy(namespace_id: &str, role_id: &str, action_id: &str) -> Policy {
    Policy {
        id: Uuid::new_v4(),
        namespace_id: namespace_id.to_string(),
        role_id: role_id.to_string(),
        action_id: action_id.to_string(),
    }
}

/// Base policies: owners hold every action, scoped namespaces inherit every
/// action from their organization, group managers manage their group and
/// members view it.
pub fn system_policies() -> Vec<Policy> {
    let mut policies = Vec::new();
    for action in DEFAULT_ACTIONS {
        policies.push(policy(
            NAMESPACE_ORGANIZATION,
            ROLE_ORGANIZATION_OWNER,
            action,
        ));
        policies.push(policy(NAMESPACE_PROJECT, ROLE_PROJECT_ORGANIZATION, action));
        policies.push(policy(NAMESPACE_GROUP, ROLE_GROUP_ORGANIZATION, action));
    }
    policies.push(policy(NAMESPACE_GROUP, ROLE_GROUP_MANAGER, ACTION_MANAGE));
    policies.push(policy(NAMESPACE_GROUP, ROLE_GROUP_MANAGER, ACTION_VIEW));
    policies.push(policy(NAMESPACE_GROUP, ROLE_GROUP_MEMBER, ACTION_VIEW));
    policies
}

/// Default role/action/policy set granted to a newly registered resource
/// namespace. The hierarchy role links resources to their project, which in
/// turn inherits from the organization, so the onboarding organization owner
/// holds every action without any engine special case.
#[derive(Debug, Clone)]
pub struct ResourceGroupConfig {
    pub actions: Vec<String>,
}

impl Default for ResourceGroupConfig {
    fn default() -> Self {
        Self {
            actions: DEFAULT_ACTIONS.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl ResourceGroupConfig {
    /// Hierarchy role id linking a resource namespace to its project
    pub fn project_role_id(namespace_id: &str) -> String {
        role_id(namespace_id, NAMESPACE_PROJECT)
    }

    /// Owner role id for a resource namespace
    pub fn owner_role_id(namespace_id: &str) -> String {
        role_id(namespace_id, "owner")
    }

    pub fn roles(&self, namespace_id: &str) -> Vec<Role> {
        vec![
            role(
                &Self::owner_role_id(namespace_id),
                "Owner",
                namespace_id,
                &[USER_TYPE, GROUP_TYPE],
            ),
            role(
                &role_id(namespace_id, "viewer"),
                "Viewer",
                namespace_id,
                &[USER_TYPE, GROUP_TYPE],
            ),
            role(
                &Self::project_role_id(namespace_id),
                "Project",
                namespace_id,
                &[NAMESPACE_PROJECT],
            ),
        ]
    }

    pub fn actions(&self, namespace_id: &str) -> Vec<Action> {
        self.actions
            .iter()
            .map(|a| Action {
                id: a.clone(),
                name: a.clone(),
                namespace_id: namespace_id.to_string(),
                created_at: None,
                updated_at: None,
            })
            .collect()
    }

    pub fn policies(&self, namespace_id: &str) -> Vec<Policy> {
        let mut policies = Vec::new();
        for action in &self.actions {
            policies.push(policy(
                namespace_id,
                &Self::owner_role_id(namespace_id),
                action,
            ));
            policies.push(policy(
                namespace_id,
                &Self::project_role_id(namespace_id),
                action,
            ));
        }
        if self.actions.iter().any(|a| a == ACTION_VIEW) {
            policies.push(policy(
                namespace_id,
                &role_id(namespace_id, "viewer"),
                ACTION_VIEW,
            ));
        }
        policies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_policies_reference_system_roles() {
        let role_ids: Vec<String> = system_roles().into_iter().map(|r| r.id).collect();
        for policy in system_policies() {
            assert!(
                role_ids.contains(&policy.role_id),
                "policy references unknown role {}",
                policy.role_id
            );
        }
    }

    #[test]
    fn test_resource_group_defaults_cover_all_actions() {
        let config = ResourceGroupConfig::default();
        let policies = config.policies("entropy/firehose");
        let owner = ResourceGroupConfig::owner_role_id("entropy/firehose");
        for action in &config.actions {
            assert!(policies
                .iter()
                .any(|p| p.role_id == owner && &p.action_id == action));
        }
    }
}
