use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use palisade_domain::{
    DomainError, DomainResult, RelationRepository, RelationTuple,
};
use palisade_schema::{PermissionRule, SchemaRegistry};

use crate::cache::CheckCache;
use crate::engine::{AuthzEngine, CheckQuery};

pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Per-check knobs
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Overrides the engine-wide check timeout
    pub timeout: Option<Duration>,
    /// When the backend is unreachable, fall back to evaluating direct role
    /// grants from the local relation store. Inherited and group-resolved
    /// permissions are not visible to the fallback, so it can under-grant
    /// but never over-grant.
    pub local_fallback: bool,
}

/// Authorization front end.
///
/// Resolves the permission against the active schema, consults the
/// positive-only check cache, then delegates to the permission backend with
/// a timeout.
pub struct AuthorizationEngine {
    registry: Arc<SchemaRegistry>,
    backend: Arc<dyn AuthzEngine>,
    relations: Arc<dyn RelationRepository>,
    cache: Arc<CheckCache>,
    default_timeout: Duration,
}

impl AuthorizationEngine {
    pub fn new(
        registry: Arc<SchemaRegistry>,
        backend: Arc<dyn AuthzEngine>,
        relations: Arc<dyn RelationRepository>,
        cache: Arc<CheckCache>,
    ) -> Self {
        Self {
            registry,
            backend,
            relations,
            cache,
            default_timeout: DEFAULT_CHECK_TIMEOUT,
        }
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn cache(&self) -> &Arc<CheckCache> {
        &self.cache
    }

    /// Check whether the subject user holds the permission on the object.
    pub async fn check(
        &self,
        subject_namespace_id: &str,
        subject_id: &str,
        object_namespace_id: &str,
        object_id: &str,
        permission: &str,
        options: CheckOptions,
    ) -> DomainResult<bool> {
        let snapshot = self.registry.snapshot().await;
        let definition = snapshot
            .document
            .definition(object_namespace_id)
            .ok_or_else(|| {
                DomainError::InvalidReference(format!("namespace {object_namespace_id}"))
            })?;
        let rules = definition.permissions.get(permission).ok_or_else(|| {
            DomainError::InvalidReference(format!(
                "permission {object_namespace_id}#{permission}"
            ))
        })?;

        if self.cache.get(
            subject_namespace_id,
            subject_id,
            object_namespace_id,
            object_id,
            permission,
        ) {
            debug!(
                subject_id,
                object_namespace_id, object_id, permission, "Check served from cache"
            );
            return Ok(true);
        }

        let query = CheckQuery {
            subject_namespace_id: subject_namespace_id.to_string(),
            subject_id: subject_id.to_string(),
            object_namespace_id: object_namespace_id.to_string(),
            object_id: object_id.to_string(),
            permission: permission.to_string(),
        };
        let timeout = options.timeout.unwrap_or(self.default_timeout);

        let outcome = tokio::time::timeout(timeout, self.backend.check_permission(&query)).await;
        let allowed = match outcome {
            Err(_) => return Err(DomainError::Timeout(timeout)),
            Ok(Err(DomainError::BackendUnavailable(reason))) if options.local_fallback => {
                warn!(
                    reason,
                    subject_id,
                    object_namespace_id,
                    object_id,
                    permission,
                    "Backend unavailable, evaluating direct grants locally"
                );
                // Degraded answer: never cached
                return self
                    .check_direct(
                        rules,
                        subject_namespace_id,
                        subject_id,
                        object_namespace_id,
                        object_id,
                    )
                    .await;
            }
            Ok(result) => result?,
        };

        if allowed {
            self.cache.insert(
                subject_namespace_id,
                subject_id,
                object_namespace_id,
                object_id,
                permission,
            );
        }
        Ok(allowed)
    }

    /// Fallback evaluation against the local store: direct role grants only.
    async fn check_direct(
        &self,
        rules: &std::collections::BTreeSet<PermissionRule>,
        subject_namespace_id: &str,
        subject_id: &str,
        object_namespace_id: &str,
        object_id: &str,
    ) -> DomainResult<bool> {
        for rule in rules {
            let PermissionRule::Role { role_id } = rule else {
                continue;
            };
            let tuple = RelationTuple::new(
                subject_namespace_id,
                subject_id,
                object_namespace_id,
                object_id,
                role_id.clone(),
            );
            if self.relations.get_active_by_tuple(&tuple).await?.is_some() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use palisade_domain::system::{
        system_actions, system_namespaces, system_policies, system_roles,
    };
    use palisade_domain::{MockRelationRepository, Relation, SyncStatus};
    use palisade_schema::SchemaDocument;
    use uuid::Uuid;

    use crate::engine::MockAuthzEngine;

    async fn loaded_registry() -> Arc<SchemaRegistry> {
        let registry = Arc::new(SchemaRegistry::new());
        registry
            .reload(
                &system_namespaces(),
                &system_roles(),
                &system_actions(),
                &system_policies(),
            )
            .await
            .unwrap();
        registry
    }

    fn engine(
        registry: Arc<SchemaRegistry>,
        backend: Arc<dyn AuthzEngine>,
        relations: MockRelationRepository,
    ) -> AuthorizationEngine {
        AuthorizationEngine::new(
            registry,
            backend,
            Arc::new(relations),
            Arc::new(CheckCache::new(Duration::from_secs(60))),
        )
    }

    #[tokio::test]
    async fn test_check_allowed_and_cached() {
        let registry = loaded_registry().await;
        let mut backend = MockAuthzEngine::new();
        // Second identical check must be served from cache
        backend
            .expect_check_permission()
            .withf(|q| q.subject_id == "u1" && q.permission == "manage")
            .times(1)
            .returning(|_| Ok(true));

        let engine = engine(registry, Arc::new(backend), MockRelationRepository::new());
        for _ in 0..2 {
            let allowed = engine
                .check(
                    "user",
                    "u1",
                    "organization",
                    "o1",
                    "manage",
                    CheckOptions::default(),
                )
                .await
                .unwrap();
            assert!(allowed);
        }
    }

    #[tokio::test]
    async fn test_check_denied_not_cached() {
        let registry = loaded_registry().await;
        let mut backend = MockAuthzEngine::new();
        // Denials skip the cache, so both checks hit the backend
        backend
            .expect_check_permission()
            .times(2)
            .returning(|_| Ok(false));

        let engine = engine(registry, Arc::new(backend), MockRelationRepository::new());
        for _ in 0..2 {
            let allowed = engine
                .check(
                    "user",
                    "u1",
                    "organization",
                    "o1",
                    "manage",
                    CheckOptions::default(),
                )
                .await
                .unwrap();
            assert!(!allowed);
        }
    }

    #[tokio::test]
    async fn test_check_unknown_namespace_is_invalid_reference() {
        let registry = loaded_registry().await;
        let engine = engine(
            registry,
            Arc::new(MockAuthzEngine::new()),
            MockRelationRepository::new(),
        );

        let result = engine
            .check(
                "user",
                "u1",
                "nonexistent",
                "o1",
                "manage",
                CheckOptions::default(),
            )
            .await;
        assert!(matches!(result, Err(DomainError::InvalidReference(_))));
    }

    #[tokio::test]
    async fn test_check_unknown_permission_is_invalid_reference() {
        let registry = loaded_registry().await;
        let engine = engine(
            registry,
            Arc::new(MockAuthzEngine::new()),
            MockRelationRepository::new(),
        );

        let result = engine
            .check(
                "user",
                "u1",
                "organization",
                "o1",
                "launch",
                CheckOptions::default(),
            )
            .await;
        assert!(matches!(result, Err(DomainError::InvalidReference(_))));
    }

    #[tokio::test]
    async fn test_backend_unavailable_propagates_without_fallback() {
        let registry = loaded_registry().await;
        let mut backend = MockAuthzEngine::new();
        backend.expect_check_permission().times(1).returning(|_| {
            Err(DomainError::BackendUnavailable("connection refused".to_string()))
        });

        let engine = engine(registry, Arc::new(backend), MockRelationRepository::new());
        let result = engine
            .check(
                "user",
                "u1",
                "organization",
                "o1",
                "manage",
                CheckOptions::default(),
            )
            .await;
        assert!(matches!(result, Err(DomainError::BackendUnavailable(_))));
    }

    #[tokio::test]
    async fn test_backend_unavailable_local_fallback_direct_grant() {
        let registry = loaded_registry().await;
        let mut backend = MockAuthzEngine::new();
        backend.expect_check_permission().times(1).returning(|_| {
            Err(DomainError::BackendUnavailable("connection refused".to_string()))
        });

        let mut relations = MockRelationRepository::new();
        relations
            .expect_get_active_by_tuple()
            .withf(|tuple| tuple.role_id == "organization:owner" && tuple.subject_id == "u1")
            .returning(|tuple| {
                Ok(Some(Relation {
                    id: Uuid::new_v4(),
                    tuple: tuple.clone(),
                    sync_status: SyncStatus::Synced,
                    created_at: None,
                    updated_at: None,
                    deleted_at: None,
                }))
            });

        let engine = engine(registry, Arc::new(backend), relations);
        let allowed = engine
            .check(
                "user",
                "u1",
                "organization",
                "o1",
                "manage",
                CheckOptions {
                    local_fallback: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(allowed);
    }

    #[tokio::test]
    async fn test_backend_unavailable_local_fallback_no_grant() {
        let registry = loaded_registry().await;
        let mut backend = MockAuthzEngine::new();
        backend.expect_check_permission().times(1).returning(|_| {
            Err(DomainError::BackendUnavailable("connection refused".to_string()))
        });

        let mut relations = MockRelationRepository::new();
        relations
            .expect_get_active_by_tuple()
            .returning(|_| Ok(None));

        let engine = engine(registry, Arc::new(backend), relations);
        let allowed = engine
            .check(
                "user",
                "u1",
                "organization",
                "o1",
                "manage",
                CheckOptions {
                    local_fallback: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!allowed);
    }

    /// A backend that never answers; used to exercise the check timeout.
    struct SlowEngine;

    #[async_trait]
    impl AuthzEngine for SlowEngine {
        async fn push_schema(&self, _document: &SchemaDocument) -> DomainResult<()> {
            Ok(())
        }

        async fn write_relationship(&self, _tuple: &RelationTuple) -> DomainResult<()> {
            Ok(())
        }

        async fn delete_relationship(&self, _tuple: &RelationTuple) -> DomainResult<()> {
            Ok(())
        }

        async fn check_permission(&self, _query: &CheckQuery) -> DomainResult<bool> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_check_times_out() {
        let registry = loaded_registry().await;
        let engine = engine(
            registry,
            Arc::new(SlowEngine),
            MockRelationRepository::new(),
        );

        let result = engine
            .check(
                "user",
                "u1",
                "organization",
                "o1",
                "manage",
                CheckOptions {
                    timeout: Some(Duration::from_millis(10)),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(DomainError::Timeout(_))));
    }
}
