use palisade_domain::{Metadata, RelationOp, SyncStatus};

/// Metadata is stored as a JSONB object; anything else in the column is
/// treated as empty.
pub(crate) fn metadata_from_value(value: serde_json::Value) -> Metadata {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Metadata::new(),
    }
}

pub(crate) fn metadata_to_value(metadata: &Metadata) -> serde_json::Value {
    serde_json::Value::Object(metadata.clone())
}

pub(crate) fn sync_status_to_str(status: SyncStatus) -> &'static str {
    match status {
        SyncStatus::Pending => "pending",
        SyncStatus::Synced => "synced",
    }
}

pub(crate) fn sync_status_from_str(value: &str) -> SyncStatus {
    match value {
        "synced" => SyncStatus::Synced,
        _ => SyncStatus::Pending,
    }
}

pub(crate) fn relation_op_from_str(value: &str) -> RelationOp {
    match value {
        "deleted" => RelationOp::Deleted,
        _ => RelationOp::Created,
    }
}
