use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::metadata::Metadata;

/// Project domain entity, always scoped to an organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub organization_id: Uuid,
    pub metadata: Metadata,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// External input for creating a project (no ID)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProjectInput {
    pub name: String,
    pub slug: String,
    pub organization_id: Uuid,
    pub metadata: Metadata,
}

/// Internal input with generated ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProjectInputWithId {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub organization_id: Uuid,
    pub metadata: Metadata,
}

/// Input for updating a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateProjectInput {
    pub project_id: Uuid,
    pub name: String,
    pub metadata: Metadata,
}
