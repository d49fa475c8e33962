use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::relation::{
    CreateRelationInput, CreateRelationInputWithId, Relation, RelationFilter, RelationTuple,
};
use crate::repository::RelationRepository;

/// Domain service for the relation store.
///
/// Mutations commit locally and are mirrored to the permission backend by
/// the synchronizer; a relation stays `Pending` until the backend
/// acknowledges it.
pub struct RelationService {
    repository: Arc<dyn RelationRepository>,
}

impl RelationService {
    pub fn new(repository: Arc<dyn RelationRepository>) -> Self {
        Self { repository }
    }

    fn validate_tuple(tuple: &RelationTuple) -> DomainResult<()> {
        if tuple.subject_namespace_id.is_empty()
            || tuple.subject_id.is_empty()
            || tuple.object_namespace_id.is_empty()
            || tuple.object_id.is_empty()
            || tuple.role_id.is_empty()
        {
            return Err(DomainError::InvalidRelationDetail(
                "all tuple fields must be non-empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a relation with generated ID.
    ///
    /// Fails with `RelationAlreadyExists` when an identical active tuple is
    /// present; an identical soft-deleted tuple does not conflict.
    pub async fn create(&self, input: CreateRelationInput) -> DomainResult<Relation> {
        Self::validate_tuple(&input.tuple)?;
        debug!(tuple = %input.tuple, "Creating relation");

        let relation = self
            .repository
            .create_relation(CreateRelationInputWithId {
                id: Uuid::new_v4(),
                tuple: input.tuple,
            })
            .await?;

        info!(relation_id = %relation.id, tuple = %relation.tuple, "Relation created");
        Ok(relation)
    }

    /// Get a relation by ID
    pub async fn get(&self, id: Uuid) -> DomainResult<Relation> {
        self.repository
            .get_relation(id)
            .await?
            .ok_or_else(|| DomainError::RelationNotFound(id.to_string()))
    }

    /// Get the active relation matching the tuple
    pub async fn get_by_tuple(&self, tuple: &RelationTuple) -> DomainResult<Relation> {
        Self::validate_tuple(tuple)?;
        self.repository
            .get_active_by_tuple(tuple)
            .await?
            .ok_or_else(|| DomainError::RelationNotFound(tuple.to_string()))
    }

    /// List relations matching the filter, insertion order
    pub async fn list(&self, filter: RelationFilter) -> DomainResult<Vec<Relation>> {
        let relations = self.repository.list_relations(filter).await?;
        debug!(count = relations.len(), "Listed relations");
        Ok(relations)
    }

    /// Soft-delete the active relation matching the tuple
    pub async fn delete(&self, tuple: &RelationTuple) -> DomainResult<()> {
        Self::validate_tuple(tuple)?;
        debug!(tuple = %tuple, "Deleting relation");

        let relation = self.repository.delete_relation(tuple).await?;

        info!(relation_id = %relation.id, tuple = %tuple, "Relation soft deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::SyncStatus;
    use crate::repository::MockRelationRepository;
    use chrono::Utc;

    fn tuple() -> RelationTuple {
        RelationTuple::new("user", "u1", "organization", "o1", "organization:owner")
    }

    fn stored(tuple: RelationTuple) -> Relation {
        Relation {
            id: Uuid::new_v4(),
            tuple,
            sync_status: SyncStatus::Pending,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_create_relation_success() {
        let mut mock_repo = MockRelationRepository::new();
        let expected = stored(tuple());

        mock_repo
            .expect_create_relation()
            .withf(|input: &CreateRelationInputWithId| {
                !input.id.is_nil() && input.tuple.subject_id == "u1"
            })
            .times(1)
            .return_once(move |_| Ok(expected.clone()));

        let service = RelationService::new(Arc::new(mock_repo));
        let result = service.create(CreateRelationInput { tuple: tuple() }).await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap().tuple, tuple());
    }

    #[tokio::test]
    async fn test_create_relation_empty_field() {
        let mock_repo = MockRelationRepository::new();
        let service = RelationService::new(Arc::new(mock_repo));

        let mut bad = tuple();
        bad.role_id = String::new();
        let result = service.create(CreateRelationInput { tuple: bad }).await;
        assert!(matches!(result, Err(DomainError::InvalidRelationDetail(_))));
    }

    #[tokio::test]
    async fn test_create_duplicate_surfaces_conflict() {
        let mut mock_repo = MockRelationRepository::new();
        mock_repo
            .expect_create_relation()
            .times(1)
            .return_once(|input| Err(DomainError::RelationAlreadyExists(input.tuple.to_string())));

        let service = RelationService::new(Arc::new(mock_repo));
        let result = service.create(CreateRelationInput { tuple: tuple() }).await;
        assert!(matches!(result, Err(DomainError::RelationAlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_delete_relation_not_found() {
        let mut mock_repo = MockRelationRepository::new();
        mock_repo
            .expect_delete_relation()
            .times(1)
            .return_once(|t| Err(DomainError::RelationNotFound(t.to_string())));

        let service = RelationService::new(Arc::new(mock_repo));
        let result = service.delete(&tuple()).await;
        assert!(matches!(result, Err(DomainError::RelationNotFound(_))));
    }

    #[tokio::test]
    async fn test_get_relation_not_found() {
        let mut mock_repo = MockRelationRepository::new();
        mock_repo
            .expect_get_relation()
            .times(1)
            .return_once(|_| Ok(None));

        let service = RelationService::new(Arc::new(mock_repo));
        let result = service.get(Uuid::new_v4()).await;
        assert!(matches!(result, Err(DomainError::RelationNotFound(_))));
    }
}
