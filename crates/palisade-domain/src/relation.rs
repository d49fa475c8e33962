use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The identity of a relation while active: subject has role on object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationTuple {
    pub subject_namespace_id: String,
    pub subject_id: String,
    pub object_namespace_id: String,
    pub object_id: String,
    pub role_id: String,
}

impl RelationTuple {
    pub fn new(
        subject_namespace_id: impl Into<String>,
        subject_id: impl Into<String>,
        object_namespace_id: impl Into<String>,
        object_id: impl Into<String>,
        role_id: impl Into<String>,
    ) -> Self {
        Self {
            subject_namespace_id: subject_namespace_id.into(),
            subject_id: subject_id.into(),
            object_namespace_id: object_namespace_id.into(),
            object_id: object_id.into(),
            role_id: role_id.into(),
        }
    }
}

impl std::fmt::Display for RelationTuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}#{}@{}:{}",
            self.object_namespace_id,
            self.object_id,
            self.role_id,
            self.subject_namespace_id,
            self.subject_id
        )
    }
}

/// Whether the permission backend has acknowledged the relation.
///
/// A `Pending` relation is visible locally but not yet authoritative for
/// permission checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Pending,
    Synced,
}

/// Relation entity: a concrete grant in the authorization graph.
///
/// Unique by tuple while `deleted_at` is unset; revocation soft-deletes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub id: Uuid,
    pub tuple: RelationTuple,
    pub sync_status: SyncStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Relation {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Input for creating a relation (no ID)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRelationInput {
    pub tuple: RelationTuple,
}

/// Internal input with generated ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRelationInputWithId {
    pub id: Uuid,
    pub tuple: RelationTuple,
}

/// Filter for listing relations; unset fields match everything.
/// Results are ordered by `created_at` ascending (insertion order).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationFilter {
    pub subject_namespace_id: Option<String>,
    pub subject_id: Option<String>,
    pub object_namespace_id: Option<String>,
    pub object_id: Option<String>,
    pub role_id: Option<String>,
    /// When true, soft-deleted relations are excluded
    pub active_only: bool,
}

impl RelationFilter {
    pub fn active() -> Self {
        Self {
            active_only: true,
            ..Default::default()
        }
    }

    pub fn matches(&self, relation: &Relation) -> bool {
        if self.active_only && !relation.is_active() {
            return false;
        }
        let t = &relation.tuple;
        self.subject_namespace_id
            .as_ref()
            .map_or(true, |v| v == &t.subject_namespace_id)
            && self
                .subject_id
                .as_ref()
                .map_or(true, |v| v == &t.subject_id)
            && self
                .object_namespace_id
                .as_ref()
                .map_or(true, |v| v == &t.object_namespace_id)
            && self.object_id.as_ref().map_or(true, |v| v == &t.object_id)
            && self.role_id.as_ref().map_or(true, |v| v == &t.role_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_relation(deleted: bool) -> Relation {
        Relation {
            id: Uuid::new_v4(),
            tuple: RelationTuple::new("user", "u1", "organization", "o1", "organization:owner"),
            sync_status: SyncStatus::Pending,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
            deleted_at: deleted.then(Utc::now),
        }
    }

    #[test]
    fn test_filter_matches_subset_of_fields() {
        let relation = sample_relation(false);
        let filter = RelationFilter {
            object_namespace_id: Some("organization".to_string()),
            role_id: Some("organization:owner".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&relation));
    }

    #[test]
    fn test_filter_active_only_excludes_deleted() {
        let relation = sample_relation(true);
        assert!(!RelationFilter::active().matches(&relation));
        assert!(RelationFilter::default().matches(&relation));
    }

    #[test]
    fn test_filter_mismatch() {
        let relation = sample_relation(false);
        let filter = RelationFilter {
            subject_id: Some("someone-else".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&relation));
    }
}
