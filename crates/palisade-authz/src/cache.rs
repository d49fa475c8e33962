use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use palisade_domain::RelationTuple;

/// Cache key for a single permission check
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CheckKey {
    subject_namespace_id: String,
    subject_id: String,
    object_namespace_id: String,
    object_id: String,
    permission: String,
}

/// Positive-only TTL cache for permission checks.
///
/// Only allowed results are stored; denials always go back to the backend so
/// a freshly granted relation takes effect as soon as the synchronizer
/// applies it. Entries are evicted lazily on read and eagerly when the
/// synchronizer reports a relation change touching the subject/object pair.
pub struct CheckCache {
    ttl: Duration,
    entries: Mutex<HashMap<CheckKey, Instant>>,
}

impl CheckCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn key(
        subject_namespace_id: &str,
        subject_id: &str,
        object_namespace_id: &str,
        object_id: &str,
        permission: &str,
    ) -> CheckKey {
        CheckKey {
            subject_namespace_id: subject_namespace_id.to_string(),
            subject_id: subject_id.to_string(),
            object_namespace_id: object_namespace_id.to_string(),
            object_id: object_id.to_string(),
            permission: permission.to_string(),
        }
    }

    /// Whether a still-fresh allow is cached for this check
    pub fn get(
        &self,
        subject_namespace_id: &str,
        subject_id: &str,
        object_namespace_id: &str,
        object_id: &str,
        permission: &str,
    ) -> bool {
        let key = Self::key(
            subject_namespace_id,
            subject_id,
            object_namespace_id,
            object_id,
            permission,
        );
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match entries.get(&key) {
            Some(inserted_at) if inserted_at.elapsed() < self.ttl => true,
            Some(_) => {
                entries.remove(&key);
                false
            }
            None => false,
        }
    }

    /// Record an allowed check
    pub fn insert(
        &self,
        subject_namespace_id: &str,
        subject_id: &str,
        object_namespace_id: &str,
        object_id: &str,
        permission: &str,
    ) {
        let key = Self::key(
            subject_namespace_id,
            subject_id,
            object_namespace_id,
            object_id,
            permission,
        );
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert(key, Instant::now());
    }

    /// Drop every cached allow involving the tuple's subject or object.
    ///
    /// Called by the synchronizer after applying a relation change. A changed
    /// tuple can affect checks on any object reachable through it, so this
    /// clears broadly rather than trying to trace the graph.
    pub fn invalidate_tuple(&self, tuple: &RelationTuple) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.retain(|key, _| {
            let touches_subject = key.subject_namespace_id == tuple.subject_namespace_id
                && key.subject_id == tuple.subject_id;
            let touches_object = key.object_namespace_id == tuple.object_namespace_id
                && key.object_id == tuple.object_id;
            !(touches_subject || touches_object)
        });
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
