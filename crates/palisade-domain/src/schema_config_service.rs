use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::action::{Action, UpsertActionInput};
use crate::error::{DomainError, DomainResult};
use crate::policy::{Policy, UpsertPolicyInput};
use crate::repository::{
    ActionRepository, NamespaceRepository, PolicyRepository, RoleRepository,
};
use crate::role::{Role, UpsertRoleInput};

/// Domain service for custom roles, actions and policies.
///
/// Namespaces receive their predefined sets through registration; this
/// service lets operators layer their own entries on top. Upserted rows feed
/// the next schema compile.
pub struct SchemaConfigService {
    namespace_repository: Arc<dyn NamespaceRepository>,
    role_repository: Arc<dyn RoleRepository>,
    action_repository: Arc<dyn ActionRepository>,
    policy_repository: Arc<dyn PolicyRepository>,
}

impl SchemaConfigService {
    pub fn new(
        namespace_repository: Arc<dyn NamespaceRepository>,
        role_repository: Arc<dyn RoleRepository>,
        action_repository: Arc<dyn ActionRepository>,
        policy_repository: Arc<dyn PolicyRepository>,
    ) -> Self {
        Self {
            namespace_repository,
            role_repository,
            action_repository,
            policy_repository,
        }
    }

    /// Upsert a custom role. The id must be qualified to its namespace
    /// (`organization:auditor`) and accept at least one subject type.
    pub async fn upsert_role(&self, input: UpsertRoleInput) -> DomainResult<Role> {
        self.require_namespace(&input.namespace_id).await?;
        if !input.id.starts_with(&format!("{}:", input.namespace_id)) {
            return Err(DomainError::InvalidName(format!(
                "role id {} is not qualified to namespace {}",
                input.id, input.namespace_id
            )));
        }
        if input.types.is_empty() {
            return Err(DomainError::InvalidName(format!(
                "role {} accepts no subject types",
                input.id
            )));
        }

        let role = self
            .role_repository
            .upsert_role(Role {
                id: input.id,
                name: input.name,
                namespace_id: input.namespace_id,
                types: input.types,
                metadata: input.metadata,
                created_at: None,
                updated_at: None,
            })
            .await?;
        debug!(role_id = %role.id, "Role upserted");
        Ok(role)
    }

    /// Upsert a custom action within a namespace.
    pub async fn upsert_action(&self, input: UpsertActionInput) -> DomainResult<Action> {
        self.require_namespace(&input.namespace_id).await?;

        let action = self
            .action_repository
            .upsert_action(Action {
                id: input.id,
                name: input.name,
                namespace_id: input.namespace_id,
                created_at: None,
                updated_at: None,
            })
            .await?;
        debug!(action_id = %action.id, namespace_id = %action.namespace_id, "Action upserted");
        Ok(action)
    }

    /// Upsert a policy; the named role and action must already exist within
    /// the namespace.
    pub async fn upsert_policy(&self, input: UpsertPolicyInput) -> DomainResult<Policy> {
        self.require_namespace(&input.namespace_id).await?;

        let role = self
            .role_repository
            .get_role(&input.role_id)
            .await?
            .ok_or_else(|| DomainError::InvalidReference(format!("role {}", input.role_id)))?;
        if role.namespace_id != input.namespace_id {
            return Err(DomainError::InvalidReference(format!(
                "role {} does not belong to namespace {}",
                input.role_id, input.namespace_id
            )));
        }
        self.action_repository
            .get_action(&input.namespace_id, &input.action_id)
            .await?
            .ok_or_else(|| {
                DomainError::InvalidReference(format!(
                    "action {}#{}",
                    input.namespace_id, input.action_id
                ))
            })?;

        let policy = self
            .policy_repository
            .upsert_policy(Policy {
                id: Uuid::new_v4(),
                namespace_id: input.namespace_id,
                role_id: input.role_id,
                action_id: input.action_id,
            })
            .await?;
        debug!(policy_id = %policy.id, "Policy upserted");
        Ok(policy)
    }

    async fn require_namespace(&self, id: &str) -> DomainResult<()> {
        self.namespace_repository
            .get_namespace(id)
            .await?
            .map(|_| ())
            .ok_or_else(|| DomainError::InvalidReference(format!("namespace {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Metadata;
    use crate::namespace::Namespace;
    use crate::repository::{
        MockActionRepository, MockNamespaceRepository, MockPolicyRepository, MockRoleRepository,
    };
    use crate::role::USER_TYPE;

    fn namespace_repo_with(namespace_id: &'static str) -> MockNamespaceRepository {
        let mut repo = MockNamespaceRepository::new();
        repo.expect_get_namespace().returning(move |id| {
            if id == namespace_id {
                Ok(Some(Namespace {
                    id: id.to_string(),
                    name: "Organization".to_string(),
                    backend: id.to_string(),
                    resource_type: String::new(),
                    created_at: None,
                    updated_at: None,
                }))
            } else {
                Ok(None)
            }
        });
        repo
    }

    fn service(
        ns_repo: MockNamespaceRepository,
        role_repo: MockRoleRepository,
        action_repo: MockActionRepository,
        policy_repo: MockPolicyRepository,
    ) -> SchemaConfigService {
        SchemaConfigService::new(
            Arc::new(ns_repo),
            Arc::new(role_repo),
            Arc::new(action_repo),
            Arc::new(policy_repo),
        )
    }

    #[tokio::test]
    async fn test_upsert_role_persists_custom_role() {
        let mut role_repo = MockRoleRepository::new();
        role_repo
            .expect_upsert_role()
            .withf(|role| role.id == "organization:auditor")
            .times(1)
            .returning(Ok);

        let service = service(
            namespace_repo_with("organization"),
            role_repo,
            MockActionRepository::new(),
            MockPolicyRepository::new(),
        );
        let role = service
            .upsert_role(UpsertRoleInput {
                id: "organization:auditor".to_string(),
                name: "Auditor".to_string(),
                namespace_id: "organization".to_string(),
                types: vec![USER_TYPE.to_string()],
                metadata: Metadata::new(),
            })
            .await
            .unwrap();
        assert_eq!(role.namespace_id, "organization");
    }

    #[tokio::test]
    async fn test_upsert_role_rejects_unqualified_id() {
        let service = service(
            namespace_repo_with("organization"),
            MockRoleRepository::new(),
            MockActionRepository::new(),
            MockPolicyRepository::new(),
        );
        let result = service
            .upsert_role(UpsertRoleInput {
                id: "auditor".to_string(),
                name: "Auditor".to_string(),
                namespace_id: "organization".to_string(),
                types: vec![USER_TYPE.to_string()],
                metadata: Metadata::new(),
            })
            .await;
        assert!(matches!(result, Err(DomainError::InvalidName(_))));
    }

    #[tokio::test]
    async fn test_upsert_action_unknown_namespace_is_invalid_reference() {
        let service = service(
            namespace_repo_with("organization"),
            MockRoleRepository::new(),
            MockActionRepository::new(),
            MockPolicyRepository::new(),
        );
        let result = service
            .upsert_action(UpsertActionInput {
                id: "export".to_string(),
                name: "Export".to_string(),
                namespace_id: "nonexistent".to_string(),
            })
            .await;
        assert!(matches!(result, Err(DomainError::InvalidReference(_))));
    }

    #[tokio::test]
    async fn test_upsert_policy_unknown_role_is_invalid_reference() {
        let mut role_repo = MockRoleRepository::new();
        role_repo.expect_get_role().returning(|_| Ok(None));

        let service = service(
            namespace_repo_with("organization"),
            role_repo,
            MockActionRepository::new(),
            MockPolicyRepository::new(),
        );
        let result = service
            .upsert_policy(UpsertPolicyInput {
                namespace_id: "organization".to_string(),
                role_id: "organization:auditor".to_string(),
                action_id: "view".to_string(),
            })
            .await;
        assert!(matches!(result, Err(DomainError::InvalidReference(_))));
    }

    #[tokio::test]
    async fn test_upsert_policy_with_valid_references() {
        let mut role_repo = MockRoleRepository::new();
        role_repo.expect_get_role().return_once(|id| {
            Ok(Some(Role {
                id: id.to_string(),
                name: "Auditor".to_string(),
                namespace_id: "organization".to_string(),
                types: vec![USER_TYPE.to_string()],
                metadata: Metadata::new(),
                created_at: None,
                updated_at: None,
            }))
        });
        let mut action_repo = MockActionRepository::new();
        action_repo.expect_get_action().return_once(|namespace_id, id| {
            Ok(Some(Action {
                id: id.to_string(),
                name: id.to_string(),
                namespace_id: namespace_id.to_string(),
                created_at: None,
                updated_at: None,
            }))
        });
        let mut policy_repo = MockPolicyRepository::new();
        policy_repo.expect_upsert_policy().times(1).returning(Ok);

        let service = service(
            namespace_repo_with("organization"),
            role_repo,
            action_repo,
            policy_repo,
        );
        let policy = service
            .upsert_policy(UpsertPolicyInput {
                namespace_id: "organization".to_string(),
                role_id: "organization:auditor".to_string(),
                action_id: "view".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(policy.role_id, "organization:auditor");
        assert_eq!(policy.action_id, "view");
    }
}
