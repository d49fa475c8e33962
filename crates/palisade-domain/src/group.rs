use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::metadata::Metadata;

/// Group domain entity, always scoped to an organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub organization_id: Uuid,
    pub metadata: Metadata,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// External input for creating a group (no ID).
/// `creator_user_id` receives the `group:manager` relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateGroupInput {
    pub name: String,
    pub slug: String,
    pub organization_id: Uuid,
    pub metadata: Metadata,
    pub creator_user_id: Uuid,
}

/// Internal input with generated ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateGroupInputWithId {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub organization_id: Uuid,
    pub metadata: Metadata,
}

/// Input for updating a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateGroupInput {
    pub group_id: Uuid,
    pub name: String,
    pub metadata: Metadata,
}
