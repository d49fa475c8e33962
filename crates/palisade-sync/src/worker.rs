use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use palisade_authz::{AuthzEngine, CheckCache};
use palisade_domain::{
    DomainError, DomainResult, OutboxRepository, RelationEvent, RelationOp, RelationRepository,
};

use crate::retry::{retry_with_backoff, RetryConfig};

#[derive(Clone, Debug)]
pub struct SyncConfig {
    pub poll_interval: Duration,
    pub batch_size: usize,
    /// Number of concurrent apply lanes. Events for the same tuple always
    /// land in the same lane, preserving their commit order.
    pub lanes: usize,
    pub retry: RetryConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            batch_size: 64,
            lanes: 8,
            retry: RetryConfig::default(),
        }
    }
}

/// Relation synchronizer.
///
/// Drains the relation outbox and mirrors each mutation to the permission
/// backend, at least once. Delivery is sharded by tuple so independent
/// tuples proceed in parallel while each tuple replays in commit order;
/// the backend's touch/delete semantics absorb redelivery after a crash
/// between apply and ack.
pub struct SyncProcess {
    outbox: Arc<dyn OutboxRepository>,
    relations: Arc<dyn RelationRepository>,
    engine: Arc<dyn AuthzEngine>,
    cache: Arc<CheckCache>,
    config: SyncConfig,
    cancellation_token: CancellationToken,
}

impl SyncProcess {
    pub fn new(
        outbox: Arc<dyn OutboxRepository>,
        relations: Arc<dyn RelationRepository>,
        engine: Arc<dyn AuthzEngine>,
        cache: Arc<CheckCache>,
        config: SyncConfig,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            outbox,
            relations,
            engine,
            cache,
            config,
            cancellation_token,
        }
    }

    pub async fn run(self) -> DomainResult<()> {
        info!("Starting relation synchronizer");

        loop {
            tokio::select! {
                _ = self.cancellation_token.cancelled() => {
                    info!("Relation synchronizer cancelled, shutting down");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }

            if let Err(e) = self.drain_once().await {
                warn!(error = %e, "Outbox drain failed, will retry next poll");
            }
        }
    }

    /// Drain one batch of pending events; returns the number applied.
    pub async fn drain_once(&self) -> DomainResult<usize> {
        let events = self.outbox.poll_pending(self.config.batch_size).await?;
        if events.is_empty() {
            return Ok(0);
        }
        debug!(events = events.len(), "Draining relation outbox");

        let lanes = self.config.lanes.max(1);
        let mut shards: Vec<Vec<RelationEvent>> = vec![Vec::new(); lanes];
        for event in events {
            let mut hasher = DefaultHasher::new();
            event.tuple.hash(&mut hasher);
            shards[hasher.finish() as usize % lanes].push(event);
        }

        let mut set = JoinSet::new();
        for shard in shards.into_iter().filter(|s| !s.is_empty()) {
            set.spawn(apply_lane(
                self.outbox.clone(),
                self.relations.clone(),
                self.engine.clone(),
                self.cache.clone(),
                self.config.retry.clone(),
                self.cancellation_token.clone(),
                shard,
            ));
        }

        let mut applied = 0;
        while let Some(result) = set.join_next().await {
            applied += result
                .map_err(|e| DomainError::RepositoryError(anyhow::anyhow!(e)))??;
        }
        Ok(applied)
    }
}

/// Apply one lane's events sequentially, retrying each until the backend
/// accepts it or the process is cancelled.
async fn apply_lane(
    outbox: Arc<dyn OutboxRepository>,
    relations: Arc<dyn RelationRepository>,
    engine: Arc<dyn AuthzEngine>,
    cache: Arc<CheckCache>,
    retry: RetryConfig,
    cancellation_token: CancellationToken,
    events: Vec<RelationEvent>,
) -> DomainResult<usize> {
    let mut applied = 0;

    for event in events {
        let apply = retry_with_backoff(&retry, "apply_relation_event", || async {
            match event.op {
                RelationOp::Created => engine.write_relationship(&event.tuple).await,
                RelationOp::Deleted => engine.delete_relationship(&event.tuple).await,
            }
        });

        tokio::select! {
            _ = cancellation_token.cancelled() => {
                debug!(seq = event.seq, "Lane cancelled mid-drain");
                return Ok(applied);
            }
            result = apply => result?,
        }

        if event.op == RelationOp::Created {
            // The row may have been soft-deleted between commit and apply;
            // the later Deleted event supersedes this one.
            match relations.mark_synced(event.relation_id).await {
                Ok(()) => {}
                Err(DomainError::RelationNotFound(_)) => {
                    warn!(relation_id = %event.relation_id, "Synced relation no longer present");
                }
                Err(e) => return Err(e),
            }
        }

        outbox.ack(event.seq).await?;
        cache.invalidate_tuple(&event.tuple);
        debug!(seq = event.seq, op = event.op.as_str(), tuple = %event.tuple, "Relation event applied");
        applied += 1;
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use palisade_authz::MemoryAuthzEngine;
    use palisade_domain::{CreateRelationInputWithId, RelationTuple, SyncStatus};
    use palisade_store::MemoryStore;
    use uuid::Uuid;

    fn tuple() -> RelationTuple {
        RelationTuple::new("user", "u1", "organization", "o1", "organization:owner")
    }

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 0,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            backoff_multiplier: 2.0,
        }
    }

    fn process(
        store: Arc<MemoryStore>,
        engine: Arc<MemoryAuthzEngine>,
        cache: Arc<CheckCache>,
    ) -> SyncProcess {
        SyncProcess::new(
            store.clone(),
            store,
            engine,
            cache,
            SyncConfig {
                retry: fast_retry(),
                ..Default::default()
            },
            CancellationToken::new(),
        )
    }

    async fn create(store: &MemoryStore, tuple: RelationTuple) -> Uuid {
        store
            .create_relation(CreateRelationInputWithId {
                id: Uuid::new_v4(),
                tuple,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_drain_applies_events_and_marks_synced() {
        let store = Arc::new(MemoryStore::new());
        let engine = Arc::new(MemoryAuthzEngine::new());
        let cache = Arc::new(CheckCache::new(Duration::from_secs(60)));

        let id = create(&store, tuple()).await;
        let sync = process(store.clone(), engine.clone(), cache);

        assert_eq!(sync.drain_once().await.unwrap(), 1);
        assert!(engine.has_tuple(&tuple()).await);
        assert_eq!(store.pending_count().await.unwrap(), 0);

        let relation = store.get_relation(id).await.unwrap().unwrap();
        assert_eq!(relation.sync_status, SyncStatus::Synced);
    }

    #[tokio::test]
    async fn test_create_delete_create_converges_to_created() {
        let store = Arc::new(MemoryStore::new());
        let engine = Arc::new(MemoryAuthzEngine::new());
        let cache = Arc::new(CheckCache::new(Duration::from_secs(60)));

        create(&store, tuple()).await;
        store.delete_relation(&tuple()).await.unwrap();
        create(&store, tuple()).await;

        let sync = process(store.clone(), engine.clone(), cache);
        assert_eq!(sync.drain_once().await.unwrap(), 3);

        // Same tuple, same lane: the final create wins
        assert!(engine.has_tuple(&tuple()).await);
        assert_eq!(store.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_retries_until_backend_recovers() {
        let store = Arc::new(MemoryStore::new());
        let engine = Arc::new(MemoryAuthzEngine::new());
        let cache = Arc::new(CheckCache::new(Duration::from_secs(60)));

        engine.set_available(false);
        create(&store, tuple()).await;

        let sync = process(store.clone(), engine.clone(), cache);

        let flipper = {
            let engine = engine.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                engine.set_available(true);
            })
        };

        assert_eq!(sync.drain_once().await.unwrap(), 1);
        flipper.await.unwrap();

        assert!(engine.has_tuple(&tuple()).await);
        assert_eq!(store.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_deleted_event_invalidates_cache() {
        let store = Arc::new(MemoryStore::new());
        let engine = Arc::new(MemoryAuthzEngine::new());
        let cache = Arc::new(CheckCache::new(Duration::from_secs(60)));

        create(&store, tuple()).await;
        let sync = process(store.clone(), engine.clone(), cache.clone());
        sync.drain_once().await.unwrap();

        cache.insert("user", "u1", "organization", "o1", "manage");
        store.delete_relation(&tuple()).await.unwrap();
        sync.drain_once().await.unwrap();

        assert!(!engine.has_tuple(&tuple()).await);
        assert!(!cache.get("user", "u1", "organization", "o1", "manage"));
    }

    #[tokio::test]
    async fn test_independent_tuples_all_applied() {
        let store = Arc::new(MemoryStore::new());
        let engine = Arc::new(MemoryAuthzEngine::new());
        let cache = Arc::new(CheckCache::new(Duration::from_secs(60)));

        let tuples: Vec<_> = (0..10)
            .map(|n| {
                RelationTuple::new(
                    "user",
                    format!("u{n}"),
                    "organization",
                    "o1",
                    "organization:owner",
                )
            })
            .collect();
        for t in &tuples {
            create(&store, t.clone()).await;
        }

        let sync = process(store.clone(), engine.clone(), cache);
        assert_eq!(sync.drain_once().await.unwrap(), 10);
        for t in &tuples {
            assert!(engine.has_tuple(t).await);
        }
    }
}
