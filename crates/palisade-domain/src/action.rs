use chrono::{DateTime, Utc};

/// Action entity: an operation a role may perform within a namespace.
///
/// `id` is the short action name (`manage`); uniqueness is per namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub id: String,
    pub name: String,
    pub namespace_id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input for upserting an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertActionInput {
    pub id: String,
    pub name: String,
    pub namespace_id: String,
}
