use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::metadata::Metadata;

/// User domain entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub metadata: Metadata,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A server-registered metadata key users are allowed to set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMetadataKey {
    pub key: String,
    pub description: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// External input for creating a user (no ID)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    pub metadata: Metadata,
}

/// Internal input with generated ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserInputWithId {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub metadata: Metadata,
}

/// Input for updating a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateUserInput {
    pub user_id: Uuid,
    pub name: String,
    pub metadata: Metadata,
}

/// Input for registering a metadata key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateMetadataKeyInput {
    pub key: String,
    pub description: String,
}
