use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::relation::RelationTuple;

/// Mutation kind mirrored to the permission backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationOp {
    Created,
    Deleted,
}

impl RelationOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationOp::Created => "created",
            RelationOp::Deleted => "deleted",
        }
    }
}

/// Outbox record appended in the same commit as a relation mutation.
///
/// `seq` is assigned by the store and strictly increases in commit order, so
/// events for the same tuple replay in the order they were committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationEvent {
    pub seq: u64,
    pub relation_id: Uuid,
    pub op: RelationOp,
    pub tuple: RelationTuple,
    pub enqueued_at: DateTime<Utc>,
}
