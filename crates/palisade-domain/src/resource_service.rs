use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::relation::{CreateRelationInput, RelationTuple};
use crate::relation_service::RelationService;
use crate::repository::{NamespaceRepository, ProjectRepository, ResourceRepository};
use crate::resource::{
    CreateResourceInput, CreateResourceInputWithId, Resource, UpdateResourceInput,
};
use crate::system::{is_system_namespace, ResourceGroupConfig, NAMESPACE_PROJECT, NAMESPACE_USER};

/// Domain service for onboarded resources.
///
/// A resource lives in a registered resource namespace and under a project;
/// creation writes the hierarchy relation to the project and an owner
/// relation for the creating user, completing the chain up to the
/// organization.
pub struct ResourceService {
    repository: Arc<dyn ResourceRepository>,
    project_repository: Arc<dyn ProjectRepository>,
    namespace_repository: Arc<dyn NamespaceRepository>,
    relation_service: Arc<RelationService>,
}

impl ResourceService {
    pub fn new(
        repository: Arc<dyn ResourceRepository>,
        project_repository: Arc<dyn ProjectRepository>,
        namespace_repository: Arc<dyn NamespaceRepository>,
        relation_service: Arc<RelationService>,
    ) -> Self {
        Self {
            repository,
            project_repository,
            namespace_repository,
            relation_service,
        }
    }

    pub async fn create(&self, input: CreateResourceInput) -> DomainResult<Resource> {
        if input.name.trim().is_empty() {
            return Err(DomainError::InvalidName(
                "resource name cannot be empty".to_string(),
            ));
        }
        if is_system_namespace(&input.namespace_id) {
            return Err(DomainError::InvalidId(format!(
                "cannot create resources in system namespace {}",
                input.namespace_id
            )));
        }
        debug!(name = %input.name, namespace_id = %input.namespace_id, "Creating resource");

        self.namespace_repository
            .get_namespace(&input.namespace_id)
            .await?
            .ok_or_else(|| DomainError::NamespaceNotFound(input.namespace_id.clone()))?;

        let project = self
            .project_repository
            .get_project(input.project_id)
            .await?
            .ok_or_else(|| DomainError::ProjectNotFound(input.project_id.to_string()))?;

        let urn = format!("r/{}/{}", input.namespace_id, input.name);
        let resource = self
            .repository
            .create_resource(CreateResourceInputWithId {
                id: Uuid::new_v4(),
                name: input.name,
                urn,
                namespace_id: input.namespace_id.clone(),
                project_id: project.id,
                organization_id: project.organization_id,
                metadata: input.metadata,
            })
            .await?;

        self.relation_service
            .create(CreateRelationInput {
                tuple: RelationTuple::new(
                    NAMESPACE_PROJECT,
                    project.id.to_string(),
                    input.namespace_id.clone(),
                    resource.id.to_string(),
                    ResourceGroupConfig::project_role_id(&input.namespace_id),
                ),
            })
            .await?;

        self.relation_service
            .create(CreateRelationInput {
                tuple: RelationTuple::new(
                    NAMESPACE_USER,
                    input.creator_user_id.to_string(),
                    input.namespace_id.clone(),
                    resource.id.to_string(),
                    ResourceGroupConfig::owner_role_id(&input.namespace_id),
                ),
            })
            .await?;

        info!(resource_id = %resource.id, urn = %resource.urn, "Resource created");
        Ok(resource)
    }

    pub async fn get(&self, id: Uuid) -> DomainResult<Resource> {
        self.repository
            .get_resource(id)
            .await?
            .ok_or_else(|| DomainError::ResourceNotFound(id.to_string()))
    }

    pub async fn get_by_urn(&self, urn: &str) -> DomainResult<Resource> {
        self.repository
            .get_resource_by_urn(urn)
            .await?
            .ok_or_else(|| DomainError::ResourceNotFound(urn.to_string()))
    }

    pub async fn list(&self) -> DomainResult<Vec<Resource>> {
        self.repository.list_resources().await
    }

    pub async fn update(&self, input: UpdateResourceInput) -> DomainResult<Resource> {
        if input.name.trim().is_empty() {
            return Err(DomainError::InvalidName(
                "resource name cannot be empty".to_string(),
            ));
        }
        let resource = self.repository.update_resource(input).await?;
        info!(resource_id = %resource.id, "Resource updated");
        Ok(resource)
    }

    pub async fn delete(&self, id: Uuid) -> DomainResult<()> {
        self.repository.delete_resource(id).await?;
        info!(resource_id = %id, "Resource soft deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Metadata;
    use crate::namespace::Namespace;
    use crate::project::Project;
    use crate::relation::{Relation, SyncStatus};
    use crate::repository::{
        MockNamespaceRepository, MockProjectRepository, MockRelationRepository,
        MockResourceRepository,
    };
    use chrono::Utc;

    #[tokio::test]
    async fn test_create_resource_rejects_system_namespace() {
        let service = ResourceService::new(
            Arc::new(MockResourceRepository::new()),
            Arc::new(MockProjectRepository::new()),
            Arc::new(MockNamespaceRepository::new()),
            Arc::new(RelationService::new(Arc::new(MockRelationRepository::new()))),
        );

        let result = service
            .create(CreateResourceInput {
                name: "thing".to_string(),
                namespace_id: "organization".to_string(),
                project_id: Uuid::new_v4(),
                metadata: Metadata::new(),
                creator_user_id: Uuid::new_v4(),
            })
            .await;
        assert!(matches!(result, Err(DomainError::InvalidId(_))));
    }

    #[tokio::test]
    async fn test_create_resource_writes_hierarchy_and_owner_relations() {
        let project_id = Uuid::new_v4();
        let org_id = Uuid::new_v4();

        let mut ns_repo = MockNamespaceRepository::new();
        ns_repo.expect_get_namespace().times(1).return_once(|id| {
            Ok(Some(Namespace {
                id: id.to_string(),
                name: "Firehose".to_string(),
                backend: "entropy".to_string(),
                resource_type: "firehose".to_string(),
                created_at: None,
                updated_at: None,
            }))
        });

        let mut project_repo = MockProjectRepository::new();
        project_repo
            .expect_get_project()
            .times(1)
            .return_once(move |id| {
                Ok(Some(Project {
                    id,
                    name: "Billing".to_string(),
                    slug: "billing".to_string(),
                    organization_id: org_id,
                    metadata: Metadata::new(),
                    created_at: Some(Utc::now()),
                    updated_at: Some(Utc::now()),
                    deleted_at: None,
                }))
            });

        let mut resource_repo = MockResourceRepository::new();
        resource_repo
            .expect_create_resource()
            .times(1)
            .returning(|input| {
                Ok(Resource {
                    id: input.id,
                    name: input.name,
                    urn: input.urn,
                    namespace_id: input.namespace_id,
                    project_id: input.project_id,
                    organization_id: input.organization_id,
                    metadata: input.metadata,
                    created_at: Some(Utc::now()),
                    updated_at: Some(Utc::now()),
                    deleted_at: None,
                })
            });

        let mut relation_repo = MockRelationRepository::new();
        relation_repo
            .expect_create_relation()
            .withf(move |input| {
                (input.tuple.role_id == "entropy/firehose:project"
                    && input.tuple.subject_id == project_id.to_string())
                    || input.tuple.role_id == "entropy/firehose:owner"
            })
            .times(2)
            .returning(|input| {
                Ok(Relation {
                    id: input.id,
                    tuple: input.tuple,
                    sync_status: SyncStatus::Pending,
                    created_at: Some(Utc::now()),
                    updated_at: Some(Utc::now()),
                    deleted_at: None,
                })
            });

        let service = ResourceService::new(
            Arc::new(resource_repo),
            Arc::new(project_repo),
            Arc::new(ns_repo),
            Arc::new(RelationService::new(Arc::new(relation_repo))),
        );

        let result = service
            .create(CreateResourceInput {
                name: "orders-stream".to_string(),
                namespace_id: "entropy/firehose".to_string(),
                project_id,
                metadata: Metadata::new(),
                creator_user_id: Uuid::new_v4(),
            })
            .await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap().urn, "r/entropy/firehose/orders-stream");
    }
}
