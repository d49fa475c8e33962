use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::organization::{
    CreateOrganizationInput, CreateOrganizationInputWithId, Organization, UpdateOrganizationInput,
};
use crate::relation::{CreateRelationInput, RelationTuple};
use crate::relation_service::RelationService;
use crate::repository::OrganizationRepository;
use crate::system::{NAMESPACE_ORGANIZATION, NAMESPACE_USER, ROLE_ORGANIZATION_OWNER};

/// Domain service for organizations.
///
/// Creation grants the creator the `organization:owner` relation, rooting
/// the authorization chain every scoped entity hangs off.
pub struct OrganizationService {
    repository: Arc<dyn OrganizationRepository>,
    relation_service: Arc<RelationService>,
}

impl OrganizationService {
    pub fn new(
        repository: Arc<dyn OrganizationRepository>,
        relation_service: Arc<RelationService>,
    ) -> Self {
        Self {
            repository,
            relation_service,
        }
    }

    pub async fn create(&self, input: CreateOrganizationInput) -> DomainResult<Organization> {
        if input.name.trim().is_empty() {
            return Err(DomainError::InvalidName(
                "organization name cannot be empty".to_string(),
            ));
        }
        debug!(name = %input.name, "Creating organization");

        let organization = self
            .repository
            .create_organization(CreateOrganizationInputWithId {
                id: Uuid::new_v4(),
                name: input.name,
                slug: input.slug,
                metadata: input.metadata,
            })
            .await?;

        self.relation_service
            .create(CreateRelationInput {
                tuple: RelationTuple::new(
                    NAMESPACE_USER,
                    input.creator_user_id.to_string(),
                    NAMESPACE_ORGANIZATION,
                    organization.id.to_string(),
                    ROLE_ORGANIZATION_OWNER,
                ),
            })
            .await?;

        info!(organization_id = %organization.id, "Organization created");
        Ok(organization)
    }

    pub async fn get(&self, id: Uuid) -> DomainResult<Organization> {
        self.repository
            .get_organization(id)
            .await?
            .ok_or_else(|| DomainError::OrganizationNotFound(id.to_string()))
    }

    pub async fn list(&self) -> DomainResult<Vec<Organization>> {
        self.repository.list_organizations().await
    }

    pub async fn update(&self, input: UpdateOrganizationInput) -> DomainResult<Organization> {
        if input.name.trim().is_empty() {
            return Err(DomainError::InvalidName(
                "organization name cannot be empty".to_string(),
            ));
        }
        let organization = self.repository.update_organization(input).await?;
        info!(organization_id = %organization.id, "Organization updated");
        Ok(organization)
    }

    pub async fn delete(&self, id: Uuid) -> DomainResult<()> {
        self.repository.delete_organization(id).await?;
        info!(organization_id = %id, "Organization soft deleted");
        Ok(())
    }
}
