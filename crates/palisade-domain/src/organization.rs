use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::metadata::Metadata;

/// Organization domain entity, the root of every authorization chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub metadata: Metadata,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// External input for creating an organization (no ID).
/// `creator_user_id` receives the `organization:owner` relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrganizationInput {
    pub name: String,
    pub slug: String,
    pub metadata: Metadata,
    pub creator_user_id: Uuid,
}

/// Internal input with generated ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrganizationInputWithId {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub metadata: Metadata,
}

/// Input for updating an organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOrganizationInput {
    pub organization_id: Uuid,
    pub name: String,
    pub metadata: Metadata,
}
