use async_trait::async_trait;
use uuid::Uuid;

use crate::action::Action;
use crate::error::DomainResult;
use crate::group::{CreateGroupInputWithId, Group, UpdateGroupInput};
use crate::namespace::Namespace;
use crate::organization::{CreateOrganizationInputWithId, Organization, UpdateOrganizationInput};
use crate::outbox::RelationEvent;
use crate::policy::{Policy, PolicyFilter};
use crate::project::{CreateProjectInputWithId, Project, UpdateProjectInput};
use crate::relation::{CreateRelationInputWithId, Relation, RelationFilter, RelationTuple};
use crate::resource::{CreateResourceInputWithId, Resource, UpdateResourceInput};
use crate::role::Role;
use crate::user::{CreateUserInputWithId, UpdateUserInput, User, UserMetadataKey};

/// Repository trait for relation storage.
///
/// Implementations enforce tuple uniqueness over active rows and append the
/// matching outbox event in the same commit as every create/delete, so the
/// synchronizer replays mutations in commit order.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RelationRepository: Send + Sync {
    /// Insert an active relation; fails with `RelationAlreadyExists` when an
    /// identical active tuple is present.
    async fn create_relation(&self, input: CreateRelationInputWithId) -> DomainResult<Relation>;

    /// Get a relation by ID, soft-deleted rows included
    async fn get_relation(&self, id: Uuid) -> DomainResult<Option<Relation>>;

    /// Get the active relation matching the tuple, if any
    async fn get_active_by_tuple(&self, tuple: &RelationTuple) -> DomainResult<Option<Relation>>;

    /// List relations matching the filter, ordered by creation time ascending
    async fn list_relations(&self, filter: RelationFilter) -> DomainResult<Vec<Relation>>;

    /// Soft-delete the active relation matching the tuple; fails with
    /// `RelationNotFound` when none is active.
    async fn delete_relation(&self, tuple: &RelationTuple) -> DomainResult<Relation>;

    /// Record backend acknowledgement for a relation
    async fn mark_synced(&self, id: Uuid) -> DomainResult<()>;
}

/// Consumer side of the relation outbox
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait OutboxRepository: Send + Sync {
    /// Fetch up to `limit` unacknowledged events, ordered by sequence
    async fn poll_pending(&self, limit: usize) -> DomainResult<Vec<RelationEvent>>;

    /// Acknowledge an event after the backend accepted it
    async fn ack(&self, seq: u64) -> DomainResult<()>;

    /// Number of unacknowledged events
    async fn pending_count(&self) -> DomainResult<u64>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait NamespaceRepository: Send + Sync {
    async fn get_namespace(&self, id: &str) -> DomainResult<Option<Namespace>>;
    async fn upsert_namespace(&self, ns: Namespace) -> DomainResult<Namespace>;
    async fn list_namespaces(&self) -> DomainResult<Vec<Namespace>>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn get_role(&self, id: &str) -> DomainResult<Option<Role>>;
    async fn upsert_role(&self, role: Role) -> DomainResult<Role>;
    async fn list_roles(&self) -> DomainResult<Vec<Role>>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ActionRepository: Send + Sync {
    async fn get_action(&self, namespace_id: &str, id: &str) -> DomainResult<Option<Action>>;
    async fn upsert_action(&self, action: Action) -> DomainResult<Action>;
    async fn list_actions(&self) -> DomainResult<Vec<Action>>;
}

/// Policies are keyed by their (namespace, role, action) content; upserting
/// an existing triple returns the stored policy unchanged.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PolicyRepository: Send + Sync {
    async fn upsert_policy(&self, policy: Policy) -> DomainResult<Policy>;
    async fn list_policies(&self, filter: PolicyFilter) -> DomainResult<Vec<Policy>>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, input: CreateUserInputWithId) -> DomainResult<User>;
    async fn get_user(&self, id: Uuid) -> DomainResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> DomainResult<Option<User>>;
    async fn list_users(&self) -> DomainResult<Vec<User>>;
    async fn update_user(&self, input: UpdateUserInput) -> DomainResult<User>;
    async fn create_metadata_key(&self, key: UserMetadataKey) -> DomainResult<UserMetadataKey>;
    async fn list_metadata_keys(&self) -> DomainResult<Vec<UserMetadataKey>>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn create_organization(
        &self,
        input: CreateOrganizationInputWithId,
    ) -> DomainResult<Organization>;
    async fn get_organization(&self, id: Uuid) -> DomainResult<Option<Organization>>;
    async fn list_organizations(&self) -> DomainResult<Vec<Organization>>;
    async fn update_organization(&self, input: UpdateOrganizationInput)
        -> DomainResult<Organization>;
    async fn delete_organization(&self, id: Uuid) -> DomainResult<()>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn create_project(&self, input: CreateProjectInputWithId) -> DomainResult<Project>;
    async fn get_project(&self, id: Uuid) -> DomainResult<Option<Project>>;
    async fn list_projects(&self) -> DomainResult<Vec<Project>>;
    async fn update_project(&self, input: UpdateProjectInput) -> DomainResult<Project>;
    async fn delete_project(&self, id: Uuid) -> DomainResult<()>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn create_group(&self, input: CreateGroupInputWithId) -> DomainResult<Group>;
    async fn get_group(&self, id: Uuid) -> DomainResult<Option<Group>>;
    async fn list_groups(&self) -> DomainResult<Vec<Group>>;
    async fn update_group(&self, input: UpdateGroupInput) -> DomainResult<Group>;
    async fn delete_group(&self, id: Uuid) -> DomainResult<()>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    async fn create_resource(&self, input: CreateResourceInputWithId) -> DomainResult<Resource>;
    async fn get_resource(&self, id: Uuid) -> DomainResult<Option<Resource>>;
    async fn get_resource_by_urn(&self, urn: &str) -> DomainResult<Option<Resource>>;
    async fn list_resources(&self) -> DomainResult<Vec<Resource>>;
    async fn update_resource(&self, input: UpdateResourceInput) -> DomainResult<Resource>;
    async fn delete_resource(&self, id: Uuid) -> DomainResult<()>;
}
