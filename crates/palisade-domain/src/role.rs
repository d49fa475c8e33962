use chrono::{DateTime, Utc};

use crate::metadata::Metadata;

/// Principal namespace a role subject may belong to
pub const USER_TYPE: &str = "user";
pub const GROUP_TYPE: &str = "group";

/// Role entity: a named permission grouping scoped to a namespace.
///
/// `id` is namespace-qualified (`organization:owner`). `types` lists the
/// subject namespaces the role accepts; a non-principal entry (for example
/// `organization` on `project:organization`) marks the role as a hierarchy
/// link to that namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub namespace_id: String,
    pub types: Vec<String>,
    pub metadata: Metadata,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input for upserting a role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertRoleInput {
    pub id: String,
    pub name: String,
    pub namespace_id: String,
    pub types: Vec<String>,
    pub metadata: Metadata,
}

/// Builds a namespace-qualified role identifier (`organization:owner`).
pub fn role_id(namespace_id: &str, name: &str) -> String {
    format!("{}:{}", namespace_id, name)
}

/// Short relation name of a role within its namespace (`owner` for
/// `organization:owner`). Falls back to the full id when unqualified.
pub fn role_relation_name(id: &str) -> &str {
    id.rsplit_once(':').map(|(_, name)| name).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_relation_name_qualified() {
        assert_eq!(role_relation_name("organization:owner"), "owner");
    }

    #[test]
    fn test_role_relation_name_unqualified() {
        assert_eq!(role_relation_name("owner"), "owner");
    }
}
