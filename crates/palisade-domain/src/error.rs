use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Relation already exists: {0}")]
    RelationAlreadyExists(String),

    #[error("Relation not found: {0}")]
    RelationNotFound(String),

    #[error("Invalid relation detail: {0}")]
    InvalidRelationDetail(String),

    #[error("Namespace not found: {0}")]
    NamespaceNotFound(String),

    #[error("Namespace already registered with different attributes: {0}")]
    NamespaceAlreadyRegistered(String),

    #[error("Conflicting namespace declarations: {0}")]
    NamespaceConflict(String),

    #[error("Invalid reference in policy configuration: {0}")]
    InvalidReference(String),

    #[error("Role not found: {0}")]
    RoleNotFound(String),

    #[error("Action not found: {0}")]
    ActionNotFound(String),

    #[error("Policy not found: {0}")]
    PolicyNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User already exists: {0}")]
    UserAlreadyExists(String),

    #[error("Unknown metadata key: {0}")]
    UnknownMetadataKey(String),

    #[error("Organization not found: {0}")]
    OrganizationNotFound(String),

    #[error("Organization already exists: {0}")]
    OrganizationAlreadyExists(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Project already exists: {0}")]
    ProjectAlreadyExists(String),

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Group already exists: {0}")]
    GroupAlreadyExists(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Resource already exists: {0}")]
    ResourceAlreadyExists(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid ID: {0}")]
    InvalidId(String),

    #[error("Permission backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Permission backend call timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Repository error: {0}")]
    RepositoryError(#[from] anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;
