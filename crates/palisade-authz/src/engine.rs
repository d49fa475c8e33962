use async_trait::async_trait;

use palisade_domain::{DomainResult, RelationTuple};
use palisade_schema::SchemaDocument;

/// A permission-check query against the backend's relationship graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckQuery {
    pub subject_namespace_id: String,
    pub subject_id: String,
    pub object_namespace_id: String,
    pub object_id: String,
    pub permission: String,
}

/// Interface to the external relationship-based permission backend.
///
/// The backend owns hierarchy resolution: `check_permission` walks the
/// mirrored relation graph (group membership, organizational hierarchy)
/// according to the pushed schema. Implementations map transport failures to
/// `DomainError::BackendUnavailable`.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuthzEngine: Send + Sync {
    /// Push a compiled schema; safe to re-push an identical document
    async fn push_schema(&self, document: &SchemaDocument) -> DomainResult<()>;

    /// Mirror a relation creation
    async fn write_relationship(&self, tuple: &RelationTuple) -> DomainResult<()>;

    /// Mirror a relation deletion
    async fn delete_relationship(&self, tuple: &RelationTuple) -> DomainResult<()>;

    /// Does the subject hold the permission on the object, directly or
    /// through the relation graph?
    async fn check_permission(&self, query: &CheckQuery) -> DomainResult<bool>;
}
