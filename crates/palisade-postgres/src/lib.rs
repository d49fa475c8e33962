mod action_repository;
mod client;
mod config;
mod conversions;
mod group_repository;
mod namespace_repository;
mod organization_repository;
mod policy_repository;
mod project_repository;
mod relation_repository;
mod resource_repository;
mod role_repository;
mod user_repository;

pub use action_repository::PostgresActionRepository;
pub use client::PostgresClient;
pub use config::PostgresConfig;
pub use group_repository::PostgresGroupRepository;
pub use namespace_repository::PostgresNamespaceRepository;
pub use organization_repository::PostgresOrganizationRepository;
pub use policy_repository::PostgresPolicyRepository;
pub use project_repository::PostgresProjectRepository;
pub use relation_repository::{PostgresOutboxRepository, PostgresRelationRepository};
pub use resource_repository::PostgresResourceRepository;
pub use role_repository::PostgresRoleRepository;
pub use user_repository::PostgresUserRepository;
