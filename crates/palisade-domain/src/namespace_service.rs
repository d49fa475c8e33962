use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{DomainError, DomainResult};
use crate::namespace::{namespace_id, Namespace, RegisterNamespaceInput};
use crate::repository::{
    ActionRepository, NamespaceRepository, PolicyRepository, RoleRepository,
};
use crate::system::{
    system_actions, system_namespaces, system_policies, system_roles, ResourceGroupConfig,
};

/// Domain service for the resource namespacing layer.
///
/// Registers onboarded backend resource types as namespaces and seeds them
/// with the default resource-group roles, actions and policies so they are
/// protected uniformly from creation onward.
pub struct NamespaceService {
    repository: Arc<dyn NamespaceRepository>,
    role_repository: Arc<dyn RoleRepository>,
    action_repository: Arc<dyn ActionRepository>,
    policy_repository: Arc<dyn PolicyRepository>,
    resource_group_config: ResourceGroupConfig,
}

impl NamespaceService {
    pub fn new(
        repository: Arc<dyn NamespaceRepository>,
        role_repository: Arc<dyn RoleRepository>,
        action_repository: Arc<dyn ActionRepository>,
        policy_repository: Arc<dyn PolicyRepository>,
        resource_group_config: ResourceGroupConfig,
    ) -> Self {
        Self {
            repository,
            role_repository,
            action_repository,
            policy_repository,
            resource_group_config,
        }
    }

    /// Upsert the predefined system namespaces, roles, actions and base
    /// policies. Runs at startup before the first schema compile.
    pub async fn ensure_system_defaults(&self) -> DomainResult<()> {
        for ns in system_namespaces() {
            self.repository.upsert_namespace(ns).await?;
        }
        for role in system_roles() {
            self.role_repository.upsert_role(role).await?;
        }
        for action in system_actions() {
            self.action_repository.upsert_action(action).await?;
        }
        for policy in system_policies() {
            self.policy_repository.upsert_policy(policy).await?;
        }
        debug!("System namespace defaults ensured");
        Ok(())
    }

    /// Register a resource namespace for an onboarded backend type.
    ///
    /// Idempotent for an identical registration; fails with
    /// `NamespaceAlreadyRegistered` when the id exists with different
    /// backend/resource_type attributes. New namespaces receive the default
    /// resource-group role/action/policy set.
    pub async fn register(&self, input: RegisterNamespaceInput) -> DomainResult<Namespace> {
        if input.backend.trim().is_empty() {
            return Err(DomainError::InvalidName(
                "namespace backend cannot be empty".to_string(),
            ));
        }
        let id = namespace_id(&input.backend, &input.resource_type);
        debug!(namespace_id = %id, "Registering namespace");

        if let Some(existing) = self.repository.get_namespace(&id).await? {
            if existing.backend != input.backend || existing.resource_type != input.resource_type {
                return Err(DomainError::NamespaceAlreadyRegistered(id));
            }
            return Ok(existing);
        }

        let namespace = self
            .repository
            .upsert_namespace(Namespace {
                id: id.clone(),
                name: input.name,
                backend: input.backend,
                resource_type: input.resource_type,
                created_at: None,
                updated_at: None,
            })
            .await?;

        for role in self.resource_group_config.roles(&id) {
            self.role_repository.upsert_role(role).await?;
        }
        for action in self.resource_group_config.actions(&id) {
            self.action_repository.upsert_action(action).await?;
        }
        for policy in self.resource_group_config.policies(&id) {
            self.policy_repository.upsert_policy(policy).await?;
        }

        info!(namespace_id = %namespace.id, "Namespace registered");
        Ok(namespace)
    }

    pub async fn get(&self, id: &str) -> DomainResult<Namespace> {
        self.repository
            .get_namespace(id)
            .await?
            .ok_or_else(|| DomainError::NamespaceNotFound(id.to_string()))
    }

    pub async fn list(&self) -> DomainResult<Vec<Namespace>> {
        self.repository.list_namespaces().await
    }
}
