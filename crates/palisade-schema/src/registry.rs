use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::info;

use palisade_domain::{Action, DomainResult, Namespace, Policy, Role};

use crate::compiler::compile;
use crate::document::SchemaDocument;

/// An immutable, versioned view of the compiled schema.
///
/// Swapped atomically on reload; readers hold an `Arc` and are never exposed
/// to a partially built schema.
#[derive(Debug)]
pub struct SchemaSnapshot {
    pub generation: u64,
    pub document: SchemaDocument,
}

/// Holds the active schema snapshot.
///
/// `reload` serializes compilations behind an exclusive lock so concurrent
/// reloads cannot interleave; a failed compile leaves the previous snapshot
/// in effect.
pub struct SchemaRegistry {
    active: RwLock<Arc<SchemaSnapshot>>,
    compile_lock: Mutex<()>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    /// Starts with an empty generation-zero snapshot
    pub fn new() -> Self {
        Self {
            active: RwLock::new(Arc::new(SchemaSnapshot {
                generation: 0,
                document: SchemaDocument::default(),
            })),
            compile_lock: Mutex::new(()),
        }
    }

    /// The currently active snapshot
    pub async fn snapshot(&self) -> Arc<SchemaSnapshot> {
        self.active.read().await.clone()
    }

    /// Compile the inputs and atomically activate the result.
    ///
    /// Returns the new snapshot so the caller can push its document to the
    /// permission backend (re-pushing an identical document is safe).
    pub async fn reload(
        &self,
        namespaces: &[Namespace],
        roles: &[Role],
        actions: &[Action],
        policies: &[Policy],
    ) -> DomainResult<Arc<SchemaSnapshot>> {
        let _guard = self.compile_lock.lock().await;

        let document = compile(namespaces, roles, actions, policies)?;

        let mut active = self.active.write().await;
        let snapshot = Arc::new(SchemaSnapshot {
            generation: active.generation + 1,
            document,
        });
        *active = snapshot.clone();

        info!(generation = snapshot.generation, "Schema snapshot activated");
        Ok(snapshot)
    }
}
