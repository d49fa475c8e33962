use chrono::{DateTime, Utc};

/// Namespace entity: a scope for roles, actions and policies.
///
/// System namespaces are predefined; resource namespaces are registered at
/// runtime as `backend/resource_type`. Identifiers are immutable once created
/// and namespaces are never deleted at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub id: String,
    pub name: String,
    pub backend: String,
    pub resource_type: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input for registering a resource namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterNamespaceInput {
    pub name: String,
    pub backend: String,
    pub resource_type: String,
}

/// Builds the namespace identifier from a backend and resource type.
///
/// A bare backend keeps its own name; onboarded resource types are scoped as
/// `backend/resource_type`.
pub fn namespace_id(backend: &str, resource_type: &str) -> String {
    if resource_type.is_empty() {
        backend.to_string()
    } else {
        format!("{}/{}", backend, resource_type)
    }
}
