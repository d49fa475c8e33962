mod action;
mod error;
mod group;
mod group_service;
mod metadata;
mod namespace;
mod namespace_service;
mod organization;
mod organization_service;
mod outbox;
mod policy;
mod project;
mod project_service;
mod relation;
mod relation_service;
mod repository;
mod schema_config_service;
mod resource;
mod resource_service;
mod role;
pub mod system;
mod user;
mod user_service;

pub use action::{Action, UpsertActionInput};
pub use error::{DomainError, DomainResult};
pub use group::{CreateGroupInput, CreateGroupInputWithId, Group, UpdateGroupInput};
pub use group_service::GroupService;
pub use metadata::{validate_metadata_keys, Metadata};
pub use namespace::{namespace_id, Namespace, RegisterNamespaceInput};
pub use namespace_service::NamespaceService;
pub use organization::{
    CreateOrganizationInput, CreateOrganizationInputWithId, Organization, UpdateOrganizationInput,
};
pub use organization_service::OrganizationService;
pub use outbox::{RelationEvent, RelationOp};
pub use policy::{Policy, PolicyFilter, UpsertPolicyInput};
pub use project::{CreateProjectInput, CreateProjectInputWithId, Project, UpdateProjectInput};
pub use project_service::ProjectService;
pub use relation::{
    CreateRelationInput, CreateRelationInputWithId, Relation, RelationFilter, RelationTuple,
    SyncStatus,
};
pub use relation_service::RelationService;
pub use repository::{
    ActionRepository, GroupRepository, NamespaceRepository, OrganizationRepository,
    OutboxRepository, PolicyRepository, ProjectRepository, RelationRepository,
    ResourceRepository, RoleRepository, UserRepository,
};
pub use resource::{
    CreateResourceInput, CreateResourceInputWithId, Resource, UpdateResourceInput,
};
pub use resource_service::ResourceService;
pub use role::{role_id, role_relation_name, Role, UpsertRoleInput, GROUP_TYPE, USER_TYPE};
pub use schema_config_service::SchemaConfigService;
pub use user::{
    CreateMetadataKeyInput, CreateUserInput, CreateUserInputWithId, UpdateUserInput, User,
    UserMetadataKey,
};
pub use user_service::UserService;

// Re-export mocks when the testing feature is enabled
#[cfg(any(test, feature = "testing"))]
pub use repository::{
    MockActionRepository, MockGroupRepository, MockNamespaceRepository,
    MockOrganizationRepository, MockOutboxRepository, MockPolicyRepository,
    MockProjectRepository, MockRelationRepository, MockResourceRepository, MockRoleRepository,
    MockUserRepository,
};
