use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::project::{CreateProjectInput, CreateProjectInputWithId, Project, UpdateProjectInput};
use crate::relation::{CreateRelationInput, RelationTuple};
use crate::relation_service::RelationService;
use crate::repository::{OrganizationRepository, ProjectRepository};
use crate::system::{NAMESPACE_ORGANIZATION, NAMESPACE_PROJECT, ROLE_PROJECT_ORGANIZATION};

/// Domain service for projects.
///
/// Creation links the project to its organization through the
/// `project:organization` relation; hierarchy checks walk that link.
pub struct ProjectService {
    repository: Arc<dyn ProjectRepository>,
    organization_repository: Arc<dyn OrganizationRepository>,
    relation_service: Arc<RelationService>,
}

impl ProjectService {
    pub fn new(
        repository: Arc<dyn ProjectRepository>,
        organization_repository: Arc<dyn OrganizationRepository>,
        relation_service: Arc<RelationService>,
    ) -> Self {
        Self {
            repository,
            organization_repository,
            relation_service,
        }
    }

    pub async fn create(&self, input: CreateProjectInput) -> DomainResult<Project> {
        if input.name.trim().is_empty() {
            return Err(DomainError::InvalidName(
                "project name cannot be empty".to_string(),
            ));
        }
        debug!(name = %input.name, organization_id = %input.organization_id, "Creating project");

        // The scoping organization must exist and be active
        self.organization_repository
            .get_organization(input.organization_id)
            .await?
            .ok_or_else(|| {
                DomainError::OrganizationNotFound(input.organization_id.to_string())
            })?;

        let project = self
            .repository
            .create_project(CreateProjectInputWithId {
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
                    project.organization_id.to_string(),
                    NAMESPACE_PROJECT,
                    project.id.to_string(),
                    ROLE_PROJECT_ORGANIZATION,
                ),
            })
            .await?;

        info!(project_id = %project.id, "Project created");
        Ok(project)
    }

    pub async fn get(&self, id: Uuid) -> DomainResult<Project> {
        self.repository
            .get_project(id)
            .await?
            .ok_or_else(|| DomainError::ProjectNotFound(id.to_string()))
    }

    pub async fn list(&self) -> DomainResult<Vec<Project>> {
        self.repository.list_projects().await
    }

    pub async fn update(&self, input: UpdateProjectInput) -> DomainResult<Project> {
        if input.name.trim().is_empty() {
            return Err(DomainError::InvalidName(
                "project name cannot be empty".to_string(),
            ));
        }
        let project = self.repository.update_project(input).await?;
        info!(project_id = %project.id, "Project updated");
        Ok(project)
    }

    pub async fn delete(&self, id: Uuid) -> DomainResult<()> {
        self.repository.delete_project(id).await?;
        info!(project_id = %id, "Project soft deleted");
        Ok(())
    }
}
