use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::group::{CreateGroupInput, CreateGroupInputWithId, Group, UpdateGroupInput};
use crate::relation::{CreateRelationInput, RelationTuple};
use crate::relation_service::RelationService;
use crate::repository::{GroupRepository, OrganizationRepository};
use crate::system::{
    NAMESPACE_GROUP, NAMESPACE_ORGANIZATION, NAMESPACE_USER, ROLE_GROUP_MANAGER,
    ROLE_GROUP_ORGANIZATION,
};

/// Domain service for groups.
///
/// Creation links the group to its organization and makes the creator the
/// first manager, so the group is reachable in the authorization graph from
/// day one.
pub struct GroupService {
    repository: Arc<dyn GroupRepository>,
    organization_repository: Arc<dyn OrganizationRepository>,
    relation_service: Arc<RelationService>,
}

impl GroupService {
    pub fn new(
        repository: Arc<dyn GroupRepository>,
        organization_repository: Arc<dyn OrganizationRepository>,
        relation_service: Arc<RelationService>,
    ) -> Self {
        Self {
            repository,
            organization_repository,
            relation_service,
        }
    }

    pub async fn create(&self, input: CreateGroupInput) -> DomainResult<Group> {
        if input.name.trim().is_empty() {
            return Err(DomainError::InvalidName(
                "group name cannot be empty".to_string(),
            ));
        }
        debug!(name = %input.name, organization_id = %input.organization_id, "Creating group");

        self.organization_repository
            .get_organization(input.organization_id)
            .await?
            .ok_or_else(|| {
                DomainError::OrganizationNotFound(input.organization_id.to_string())
            })?;

        let group = self
            .repository
            .create_group(CreateGroupInputWithId {
                id: Uuid::new_v4(),
                name: input.name,
                slug: input.slug,
                organization_id: input.organization_id,
                metadata: input.metadata,
            })
            .await?;

        self.relation_service
            .create(CreateRelationInput {
                tuple: RelationTuple::new(
                    NAMESPACE_ORGANIZATION,
                    group.organization_id.to_string(),
                    NAMESPACE_GROUP,
                    group.id.to_string(),
                    ROLE_GROUP_ORGANIZATION,
                ),
            })
            .await?;

        self.relation_service
            .create(CreateRelationInput {
                tuple: RelationTuple::new(
                    NAMESPACE_USER,
                    input.creator_user_id.to_string(),
                    NAMESPACE_GROUP,
                    group.id.to_string(),
                    ROLE_GROUP_MANAGER,
                ),
            })
            .await?;

        info!(group_id = %group.id, "Group created");
        Ok(group)
    }

    pub async fn get(&self, id: Uuid) -> DomainResult<Group> {
        self.repository
            .get_group(id)
            .await?
            .ok_or_else(|| DomainError::GroupNotFound(id.to_string()))
    }

    pub async fn list(&self) -> DomainResult<Vec<Group>> {
        self.repository.list_groups().await
    }

    pub async fn update(&self, input: UpdateGroupInput) -> DomainResult<Group> {
        if input.name.trim().is_empty() {
            return Err(DomainError::InvalidName(
                "group name cannot be empty".to_string(),
            ));
        }
        let group = self.repository.update_group(input).await?;
        info!(group_id = %group.id, "Group updated");
        Ok(group)
    }

    pub async fn delete(&self, id: Uuid) -> DomainResult<()> {
        self.repository.delete_group(id).await?;
        info!(group_id = %id, "Group soft deleted");
        Ok(())
    }
}
