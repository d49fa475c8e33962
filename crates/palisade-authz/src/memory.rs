use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use palisade_domain::system::MEMBERSHIP_ROLES;
use palisade_domain::{DomainError, DomainResult, RelationTuple};
use palisade_schema::{PermissionRule, SchemaDocument};

use crate::engine::{AuthzEngine, CheckQuery};

/// Hierarchy recursion bound; relation chains are shallow (resource ->
/// project -> organization) so this is generous.
const MAX_CHECK_DEPTH: usize = 8;

#[derive(Default)]
struct State {
    schema: SchemaDocument,
    tuples: HashSet<RelationTuple>,
}

/// In-process permission backend.
///
/// Evaluates checks against its own mirrored relationship graph using the
/// pushed schema: direct role grants, group membership and inherited
/// namespace hierarchy. Default backend for development and the test suite;
/// production deployments put the real relationship database behind the same
/// trait.
///
/// `set_available(false)` simulates an unreachable backend.
pub struct MemoryAuthzEngine {
    state: RwLock<State>,
    available: AtomicBool,
}

impl Default for MemoryAuthzEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuthzEngine {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Toggle simulated reachability
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> DomainResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DomainError::BackendUnavailable(
                "memory engine marked unavailable".to_string(),
            ))
        }
    }

    /// Whether the mirrored graph currently holds the tuple
    pub async fn has_tuple(&self, tuple: &RelationTuple) -> bool {
        self.state.read().await.tuples.contains(tuple)
    }

    fn evaluate(
        state: &State,
        subject_namespace_id: &str,
        subject_id: &str,
        object_namespace_id: &str,
        object_id: &str,
        permission: &str,
        depth: usize,
    ) -> bool {
        if depth == 0 {
            return false;
        }
        let Some(definition) = state.schema.definition(object_namespace_id) else {
            return false;
        };
        let Some(rules) = definition.permissions.get(permission) else {
            return false;
        };

        for rule in rules {
            match rule {
                PermissionRule::Role { role_id } => {
                    let direct = RelationTuple::new(
                        subject_namespace_id,
                        subject_id,
                        object_namespace_id,
                        object_id,
                        role_id.clone(),
                    );
                    if state.tuples.contains(&direct) {
                        return true;
                    }
                    // Group-held roles resolve through membership
                    for tuple in state.tuples.iter().filter(|t| {
                        t.object_namespace_id == object_namespace_id
                            && t.object_id == object_id
                            && &t.role_id == role_id
                            && t.subject_namespace_id == "group"
                    }) {
                        for membership in MEMBERSHIP_ROLES {
                            let member = RelationTuple::new(
                                subject_namespace_id,
                                subject_id,
                                "group",
                                tuple.subject_id.clone(),
                                *membership,
                            );
                            if state.tuples.contains(&member) {
                                return true;
                            }
                        }
                    }
                }
                PermissionRule::Inherited {
                    via_role_id,
                    namespace_id,
                    permission: inherited_permission,
                } => {
                    for tuple in state.tuples.iter().filter(|t| {
                        t.object_namespace_id == object_namespace_id
                            && t.object_id == object_id
                            && &t.role_id == via_role_id
                            && &t.subject_namespace_id == namespace_id
                    }) {
                        if Self::evaluate(
                            state,
                            subject_namespace_id,
                            subject_id,
                            namespace_id,
                            &tuple.subject_id,
                            inherited_permission,
                            depth - 1,
                        ) {
                            return true;
                        }
                    }
                }
            }
        }
        false
    }
}

#[async_trait]
impl AuthzEngine for MemoryAuthzEngine {
    async fn push_schema(&self, document: &SchemaDocument) -> DomainResult<()> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        state.schema = document.clone();
        debug!(
            definitions = document.definitions.len(),
            "Schema pushed to memory engine"
        );
        Ok(())
    }

    async fn write_relationship(&self, tuple: &RelationTuple) -> DomainResult<()> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        // Touch semantics: re-writing an existing tuple is a no-op
        state.tuples.insert(tuple.clone());
        Ok(())
    }

    async fn delete_relationship(&self, tuple: &RelationTuple) -> DomainResult<()> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        state.tuples.remove(tuple);
        Ok(())
    }

    async fn check_permission(&self, query: &CheckQuery) -> DomainResult<bool> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(Self::evaluate(
            &state,
            &query.subject_namespace_id,
            &query.subject_id,
            &query.object_namespace_id,
            &query.object_id,
            &query.permission,
            MAX_CHECK_DEPTH,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palisade_domain::system::{
        system_actions, system_namespaces, system_policies, system_roles,
    };
    use palisade_schema::compile;

    async fn engine_with_system_schema() -> MemoryAuthzEngine {
        let engine = MemoryAuthzEngine::new();
        let document = compile(
            &system_namespaces(),
            &system_roles(),
            &system_actions(),
            &system_policies(),
        )
        .unwrap();
        engine.push_schema(&document).await.unwrap();
        engine
    }

    fn query(subject: &str, ns: &str, object: &str, permission: &str) -> CheckQuery {
        CheckQuery {
            subject_namespace_id: "user".to_string(),
            subject_id: subject.to_string(),
            object_namespace_id: ns.to_string(),
            object_id: object.to_string(),
            permission: permission.to_string(),
        }
    }

    #[tokio::test]
    async fn test_direct_role_grant() {
        let engine = engine_with_system_schema().await;
        engine
            .write_relationship(&RelationTuple::new(
                "user",
                "u1",
                "organization",
                "o1",
                "organization:owner",
            ))
            .await
            .unwrap();

        assert!(engine
            .check_permission(&query("u1", "organization", "o1", "manage"))
            .await
            .unwrap());
        assert!(!engine
            .check_permission(&query("u2", "organization", "o1", "manage"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_hierarchy_resolution_org_to_project() {
        let engine = engine_with_system_schema().await;
        engine
            .write_relationship(&RelationTuple::new(
                "user",
                "u1",
                "organization",
                "o1",
                "organization:owner",
            ))
            .await
            .unwrap();
        engine
            .write_relationship(&RelationTuple::new(
                "organization",
                "o1",
                "project",
                "p1",
                "project:organization",
            ))
            .await
            .unwrap();

        // No direct relation between u1 and p1
        assert!(engine
            .check_permission(&query("u1", "project", "p1", "manage"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_group_membership_resolution() {
        use palisade_domain::system::ResourceGroupConfig;
        use palisade_domain::Namespace;

        // A resource namespace whose owner role accepts groups
        let resource_ns = Namespace {
            id: "entropy/firehose".to_string(),
            name: "Firehose".to_string(),
            backend: "entropy".to_string(),
            resource_type: "firehose".to_string(),
            created_at: None,
            updated_at: None,
        };
        let config = ResourceGroupConfig::default();
        let mut namespaces = system_namespaces();
        namespaces.push(resource_ns);
        let mut roles = system_roles();
        roles.extend(config.roles("entropy/firehose"));
        let mut actions = system_actions();
        actions.extend(config.actions("entropy/firehose"));
        let mut policies = system_policies();
        policies.extend(config.policies("entropy/firehose"));

        let engine = MemoryAuthzEngine::new();
        let document = compile(&namespaces, &roles, &actions, &policies).unwrap();
        engine.push_schema(&document).await.unwrap();

        // Group g1 owns the resource, u1 is a member of g1
        engine
            .write_relationship(&RelationTuple::new(
                "group",
                "g1",
                "entropy/firehose",
                "r1",
                "entropy/firehose:owner",
            ))
            .await
            .unwrap();
        engine
            .write_relationship(&RelationTuple::new(
                "user",
                "u1",
                "group",
                "g1",
                "group:member",
            ))
            .await
            .unwrap();

        assert!(engine
            .check_permission(&query("u1", "entropy/firehose", "r1", "edit"))
            .await
            .unwrap());
        assert!(!engine
            .check_permission(&query("u2", "entropy/firehose", "r1", "edit"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_delete_revokes() {
        let engine = engine_with_system_schema().await;
        let tuple =
            RelationTuple::new("user", "u1", "organization", "o1", "organization:owner");
        engine.write_relationship(&tuple).await.unwrap();
        engine.delete_relationship(&tuple).await.unwrap();

        assert!(!engine
            .check_permission(&query("u1", "organization", "o1", "manage"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_unavailable_engine_errors() {
        let engine = engine_with_system_schema().await;
        engine.set_available(false);

        let result = engine
            .check_permission(&query("u1", "organization", "o1", "manage"))
            .await;
        assert!(matches!(result, Err(DomainError::BackendUnavailable(_))));
    }
}
