use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::metadata::Metadata;

/// Resource domain entity: an onboarded backend object protected through a
/// registered resource namespace, always scoped to a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub id: Uuid,
    pub name: String,
    pub urn: String,
    pub namespace_id: String,
    pub project_id: Uuid,
    pub organization_id: Uuid,
    pub metadata: Metadata,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// External input for creating a resource (no ID).
/// `creator_user_id` receives the namespace owner relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateResourceInput {
    pub name: String,
    pub namespace_id: String,
    pub project_id: Uuid,
    pub metadata: Metadata,
    pub creator_user_id: Uuid,
}

/// Input for updating a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResourceInput {
    pub resource_id: Uuid,
    pub name: String,
    pub metadata: Metadata,
}

/// Internal input with generated ID and resolved scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateResourceInputWithId {
    pub id: Uuid,
    pub name: String,
    pub urn: String,
    pub namespace_id: String,
    pub project_id: Uuid,
    pub organization_id: Uuid,
    pub metadata: Metadata,
}
