use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use palisade_domain::{
    Action, ActionRepository, CreateGroupInputWithId, CreateOrganizationInputWithId,
    CreateProjectInputWithId, CreateRelationInputWithId, CreateResourceInputWithId,
    CreateUserInputWithId, DomainError, DomainResult, Group, GroupRepository, Namespace,
    NamespaceRepository, Organization, OrganizationRepository, OutboxRepository, Policy,
    PolicyFilter, PolicyRepository, Project, ProjectRepository, Relation, RelationEvent,
    RelationFilter, RelationOp, RelationRepository, RelationTuple, Resource, ResourceRepository,
    Role, RoleRepository, SyncStatus, UpdateGroupInput, UpdateOrganizationInput,
    UpdateProjectInput, UpdateResourceInput, UpdateUserInput, User, UserMetadataKey,
    UserRepository,
};

#[derive(Default)]
struct State {
    relations: Vec<Relation>,
    outbox: Vec<RelationEvent>,
    next_seq: u64,
    namespaces: Vec<Namespace>,
    roles: Vec<Role>,
    actions: Vec<Action>,
    policies: Vec<Policy>,
    users: Vec<User>,
    metadata_keys: Vec<UserMetadataKey>,
    organizations: Vec<Organization>,
    projects: Vec<Project>,
    groups: Vec<Group>,
    resources: Vec<Resource>,
}

impl State {
    fn append_event(&mut self, relation_id: Uuid, op: RelationOp, tuple: RelationTuple) {
        self.next_seq += 1;
        self.outbox.push(RelationEvent {
            seq: self.next_seq,
            relation_id,
            op,
            tuple,
            enqueued_at: Utc::now(),
        });
    }
}

/// In-memory store backing every repository trait.
///
/// A single mutex guards all collections, so a relation mutation and its
/// outbox event land atomically the way a database transaction would.
/// Intended for development and tests; the Postgres store is the production
/// implementation.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RelationRepository for MemoryStore {
    async fn create_relation(&self, input: CreateRelationInputWithId) -> DomainResult<Relation> {
        let mut state = self.lock();
        let duplicate = state
            .relations
            .iter()
            .any(|r| r.is_active() && r.tuple == input.tuple);
        if duplicate {
            return Err(DomainError::RelationAlreadyExists(input.tuple.to_string()));
        }

        let now = Utc::now();
        let relation = Relation {
            id: input.id,
            tuple: input.tuple,
            sync_status: SyncStatus::Pending,
            created_at: Some(now),
            updated_at: Some(now),
            deleted_at: None,
        };
        state.relations.push(relation.clone());
        state.append_event(relation.id, RelationOp::Created, relation.tuple.clone());
        debug!(relation_id = %relation.id, tuple = %relation.tuple, "Created relation");
        Ok(relation)
    }

    async fn get_relation(&self, id: Uuid) -> DomainResult<Option<Relation>> {
        let state = self.lock();
        Ok(state.relations.iter().find(|r| r.id == id).cloned())
    }

    async fn get_active_by_tuple(&self, tuple: &RelationTuple) -> DomainResult<Option<Relation>> {
        let state = self.lock();
        Ok(state
            .relations
            .iter()
            .find(|r| r.is_active() && &r.tuple == tuple)
            .cloned())
    }

    async fn list_relations(&self, filter: RelationFilter) -> DomainResult<Vec<Relation>> {
        let state = self.lock();
        Ok(state
            .relations
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn delete_relation(&self, tuple: &RelationTuple) -> DomainResult<Relation> {
        let mut state = self.lock();
        let now = Utc::now();
        let relation = state
            .relations
            .iter_mut()
            .find(|r| r.is_active() && &r.tuple == tuple)
            .ok_or_else(|| DomainError::RelationNotFound(tuple.to_string()))?;
        relation.deleted_at = Some(now);
        relation.updated_at = Some(now);
        let deleted = relation.clone();
        state.append_event(deleted.id, RelationOp::Deleted, deleted.tuple.clone());
        debug!(relation_id = %deleted.id, tuple = %deleted.tuple, "Soft-deleted relation");
        Ok(deleted)
    }

    async fn mark_synced(&self, id: Uuid) -> DomainResult<()> {
        let mut state = self.lock();
        let relation = state
            .relations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| DomainError::RelationNotFound(id.to_string()))?;
        relation.sync_status = SyncStatus::Synced;
        relation.updated_at = Some(Utc::now());
        Ok(())
    }
}

#[async_trait]
impl OutboxRepository for MemoryStore {
    async fn poll_pending(&self, limit: usize) -> DomainResult<Vec<RelationEvent>> {
        let state = self.lock();
        Ok(state.outbox.iter().take(limit).cloned().collect())
    }

    async fn ack(&self, seq: u64) -> DomainResult<()> {
        let mut state = self.lock();
        state.outbox.retain(|event| event.seq != seq);
        Ok(())
    }

    async fn pending_count(&self) -> DomainResult<u64> {
        let state = self.lock();
        Ok(state.outbox.len() as u64)
    }
}

#[async_trait]
impl NamespaceRepository for MemoryStore {
    async fn get_namespace(&self, id: &str) -> DomainResult<Option<Namespace>> {
        let state = self.lock();
        Ok(state.namespaces.iter().find(|ns| ns.id == id).cloned())
    }

    async fn upsert_namespace(&self, ns: Namespace) -> DomainResult<Namespace> {
        let mut state = self.lock();
        let now = Utc::now();
        let mut ns = ns;
        match state.namespaces.iter().position(|n| n.id == ns.id) {
            Some(idx) => {
                ns.created_at = state.namespaces[idx].created_at;
                ns.updated_at = Some(now);
                state.namespaces[idx] = ns.clone();
            }
            None => {
                ns.created_at = Some(now);
                ns.updated_at = Some(now);
                state.namespaces.push(ns.clone());
            }
        }
        Ok(ns)
    }

    async fn list_namespaces(&self) -> DomainResult<Vec<Namespace>> {
        let state = self.lock();
        Ok(state.namespaces.clone())
    }
}

#[async_trait]
impl RoleRepository for MemoryStore {
    async fn get_role(&self, id: &str) -> DomainResult<Option<Role>> {
        let state = self.lock();
        Ok(state.roles.iter().find(|r| r.id == id).cloned())
    }

    async fn upsert_role(&self, role: Role) -> DomainResult<Role> {
        let mut state = self.lock();
        let now = Utc::now();
        let mut role = role;
        match state.roles.iter().position(|r| r.id == role.id) {
            Some(idx) => {
                role.created_at = state.roles[idx].created_at;
                role.updated_at = Some(now);
                state.roles[idx] = role.clone();
            }
            None => {
                role.created_at = Some(now);
                role.updated_at = Some(now);
                state.roles.push(role.clone());
            }
        }
        Ok(role)
    }

    async fn list_roles(&self) -> DomainResult<Vec<Role>> {
        let state = self.lock();
        Ok(state.roles.clone())
    }
}

#[async_trait]
impl ActionRepository for MemoryStore {
    async fn get_action(&self, namespace_id: &str, id: &str) -> DomainResult<Option<Action>> {
        let state = self.lock();
        Ok(state
            .actions
            .iter()
            .find(|a| a.namespace_id == namespace_id && a.id == id)
            .cloned())
    }

    async fn upsert_action(&self, action: Action) -> DomainResult<Action> {
        let mut state = self.lock();
        let now = Utc::now();
        let mut action = action;
        match state
            .actions
            .iter()
            .position(|a| a.namespace_id == action.namespace_id && a.id == action.id)
        {
            Some(idx) => {
                action.created_at = state.actions[idx].created_at;
                action.updated_at = Some(now);
                state.actions[idx] = action.clone();
            }
            None => {
                action.created_at = Some(now);
                action.updated_at = Some(now);
                state.actions.push(action.clone());
            }
        }
        Ok(action)
    }

    async fn list_actions(&self) -> DomainResult<Vec<Action>> {
        let state = self.lock();
        Ok(state.actions.clone())
    }
}

#[async_trait]
impl PolicyRepository for MemoryStore {
    async fn upsert_policy(&self, policy: Policy) -> DomainResult<Policy> {
        let mut state = self.lock();
        // Keyed by content: an existing (namespace, role, action) triple wins
        if let Some(existing) = state.policies.iter().find(|p| {
            p.namespace_id == policy.namespace_id
                && p.role_id == policy.role_id
                && p.action_id == policy.action_id
        }) {
            return Ok(existing.clone());
        }
        state.policies.push(policy.clone());
        Ok(policy)
    }

    async fn list_policies(&self, filter: PolicyFilter) -> DomainResult<Vec<Policy>> {
        let state = self.lock();
        Ok(state
            .policies
            .iter()
            .filter(|p| {
                filter
                    .namespace_id
                    .as_ref()
                    .map_or(true, |ns| ns == &p.namespace_id)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, input: CreateUserInputWithId) -> DomainResult<User> {
        let mut state = self.lock();
        if state
            .users
            .iter()
            .any(|u| u.deleted_at.is_none() && u.email == input.email)
        {
            return Err(DomainError::UserAlreadyExists(input.email));
        }
        let now = Utc::now();
        let user = User {
            id: input.id,
            name: input.name,
            email: input.email,
            metadata: input.metadata,
            created_at: Some(now),
            updated_at: Some(now),
            deleted_at: None,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> DomainResult<Option<User>> {
        let state = self.lock();
        Ok(state
            .users
            .iter()
            .find(|u| u.id == id && u.deleted_at.is_none())
            .cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let state = self.lock();
        Ok(state
            .users
            .iter()
            .find(|u| u.email == email && u.deleted_at.is_none())
            .cloned())
    }

    async fn list_users(&self) -> DomainResult<Vec<User>> {
        let state = self.lock();
        Ok(state
            .users
            .iter()
            .filter(|u| u.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn update_user(&self, input: UpdateUserInput) -> DomainResult<User> {
        let mut state = self.lock();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == input.user_id && u.deleted_at.is_none())
            .ok_or_else(|| DomainError::UserNotFound(input.user_id.to_string()))?;
        user.name = input.name;
        user.metadata = input.metadata;
        user.updated_at = Some(Utc::now());
        Ok(user.clone())
    }

    async fn create_metadata_key(&self, key: UserMetadataKey) -> DomainResult<UserMetadataKey> {
        let mut state = self.lock();
        let now = Utc::now();
        let mut key = key;
        match state.metadata_keys.iter().position(|k| k.key == key.key) {
            Some(idx) => {
                key.created_at = state.metadata_keys[idx].created_at;
                key.updated_at = Some(now);
                state.metadata_keys[idx] = key.clone();
            }
            None => {
                key.created_at = Some(now);
                key.updated_at = Some(now);
                state.metadata_keys.push(key.clone());
            }
        }
        Ok(key)
    }

    async fn list_metadata_keys(&self) -> DomainResult<Vec<UserMetadataKey>> {
        let state = self.lock();
        Ok(state.metadata_keys.clone())
    }
}

#[async_trait]
impl OrganizationRepository for MemoryStore {
    async fn create_organization(
        &self,
        input: CreateOrganizationInputWithId,
    ) -> DomainResult<Organization> {
        let mut state = self.lock();
        if state
            .organizations
            .iter()
            .any(|o| o.deleted_at.is_none() && o.slug == input.slug)
        {
            return Err(DomainError::OrganizationAlreadyExists(input.slug));
        }
        let now = Utc::now();
        let org = Organization {
            id: input.id,
            name: input.name,
            slug: input.slug,
            metadata: input.metadata,
            created_at: Some(now),
            updated_at: Some(now),
            deleted_at: None,
        };
        state.organizations.push(org.clone());
        Ok(org)
    }

    async fn get_organization(&self, id: Uuid) -> DomainResult<Option<Organization>> {
        let state = self.lock();
        Ok(state
            .organizations
            .iter()
            .find(|o| o.id == id && o.deleted_at.is_none())
            .cloned())
    }

    async fn list_organizations(&self) -> DomainResult<Vec<Organization>> {
        let state = self.lock();
        Ok(state
            .organizations
            .iter()
            .filter(|o| o.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn update_organization(
        &self,
        input: UpdateOrganizationInput,
    ) -> DomainResult<Organization> {
        let mut state = self.lock();
        let org = state
            .organizations
            .iter_mut()
            .find(|o| o.id == input.organization_id && o.deleted_at.is_none())
            .ok_or_else(|| DomainError::OrganizationNotFound(input.organization_id.to_string()))?;
        org.name = input.name;
        org.metadata = input.metadata;
        org.updated_at = Some(Utc::now());
        Ok(org.clone())
    }

    async fn delete_organization(&self, id: Uuid) -> DomainResult<()> {
        let mut state = self.lock();
        let org = state
            .organizations
            .iter_mut()
            .find(|o| o.id == id && o.deleted_at.is_none())
            .ok_or_else(|| DomainError::OrganizationNotFound(id.to_string()))?;
        let now = Utc::now();
        org.deleted_at = Some(now);
        org.updated_at = Some(now);
        Ok(())
    }
}

#[async_trait]
impl ProjectRepository for MemoryStore {
    async fn create_project(&self, input: CreateProjectInputWithId) -> DomainResult<Project> {
        let mut state = self.lock();
        if state
            .projects
            .iter()
            .any(|p| p.deleted_at.is_none() && p.slug == input.slug)
        {
            return Err(DomainError::ProjectAlreadyExists(input.slug));
        }
        let now = Utc::now();
        let project = Project {
            id: input.id,
            name: input.name,
            slug: input.slug,
            organization_id: input.organization_id,
            metadata: input.metadata,
            created_at: Some(now),
            updated_at: Some(now),
            deleted_at: None,
        };
        state.projects.push(project.clone());
        Ok(project)
    }

    async fn get_project(&self, id: Uuid) -> DomainResult<Option<Project>> {
        let state = self.lock();
        Ok(state
            .projects
            .iter()
            .find(|p| p.id == id && p.deleted_at.is_none())
            .cloned())
    }

    async fn list_projects(&self) -> DomainResult<Vec<Project>> {
        let state = self.lock();
        Ok(state
            .projects
            .iter()
            .filter(|p| p.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn update_project(&self, input: UpdateProjectInput) -> DomainResult<Project> {
        let mut state = self.lock();
        let project = state
            .projects
            .iter_mut()
            .find(|p| p.id == input.project_id && p.deleted_at.is_none())
            .ok_or_else(|| DomainError::ProjectNotFound(input.project_id.to_string()))?;
        project.name = input.name;
        project.metadata = input.metadata;
        project.updated_at = Some(Utc::now());
        Ok(project.clone())
    }

    async fn delete_project(&self, id: Uuid) -> DomainResult<()> {
        let mut state = self.lock();
        let project = state
            .projects
            .iter_mut()
            .find(|p| p.id == id && p.deleted_at.is_none())
            .ok_or_else(|| DomainError::ProjectNotFound(id.to_string()))?;
        let now = Utc::now();
        project.deleted_at = Some(now);
        project.updated_at = Some(now);
        Ok(())
    }
}

#[async_trait]
impl GroupRepository for MemoryStore {
    async fn create_group(&self, input: CreateGroupInputWithId) -> DomainResult<Group> {
        let mut state = self.lock();
        if state
            .groups
            .iter()
            .any(|g| g.deleted_at.is_none() && g.slug == input.slug)
        {
            return Err(DomainError::GroupAlreadyExists(input.slug));
        }
        let now = Utc::now();
        let group = Group {
            id: input.id,
            name: input.name,
            slug: input.slug,
            organization_id: input.organization_id,
            metadata: input.metadata,
            created_at: Some(now),
            updated_at: Some(now),
            deleted_at: None,
        };
        state.groups.push(group.clone());
        Ok(group)
    }

    async fn get_group(&self, id: Uuid) -> DomainResult<Option<Group>> {
        let state = self.lock();
        Ok(state
            .groups
            .iter()
            .find(|g| g.id == id && g.deleted_at.is_none())
            .cloned())
    }

    async fn list_groups(&self) -> DomainResult<Vec<Group>> {
        let state = self.lock();
        Ok(state
            .groups
            .iter()
            .filter(|g| g.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn update_group(&self, input: UpdateGroupInput) -> DomainResult<Group> {
        let mut state = self.lock();
        let group = state
            .groups
            .iter_mut()
            .find(|g| g.id == input.group_id && g.deleted_at.is_none())
            .ok_or_else(|| DomainError::GroupNotFound(input.group_id.to_string()))?;
        group.name = input.name;
        group.metadata = input.metadata;
        group.updated_at = Some(Utc::now());
        Ok(group.clone())
    }

    async fn delete_group(&self, id: Uuid) -> DomainResult<()> {
        let mut state = self.lock();
        let group = state
            .groups
            .iter_mut()
            .find(|g| g.id == id && g.deleted_at.is_none())
            .ok_or_else(|| DomainError::GroupNotFound(id.to_string()))?;
        let now = Utc::now();
        group.deleted_at = Some(now);
        group.updated_at = Some(now);
        Ok(())
    }
}

#[async_trait]
impl ResourceRepository for MemoryStore {
    async fn create_resource(&self, input: CreateResourceInputWithId) -> DomainResult<Resource> {
        let mut state = self.lock();
        if state
            .resources
            .iter()
            .any(|r| r.deleted_at.is_none() && r.urn == input.urn)
        {
            return Err(DomainError::ResourceAlreadyExists(input.urn));
        }
        let now = Utc::now();
        let resource = Resource {
            id: input.id,
            name: input.name,
            urn: input.urn,
            namespace_id: input.namespace_id,
            project_id: input.project_id,
            organization_id: input.organization_id,
            metadata: input.metadata,
            created_at: Some(now),
            updated_at: Some(now),
            deleted_at: None,
        };
        state.resources.push(resource.clone());
        Ok(resource)
    }

    async fn get_resource(&self, id: Uuid) -> DomainResult<Option<Resource>> {
        let state = self.lock();
        Ok(state
            .resources
            .iter()
            .find(|r| r.id == id && r.deleted_at.is_none())
            .cloned())
    }

    async fn get_resource_by_urn(&self, urn: &str) -> DomainResult<Option<Resource>> {
        let state = self.lock();
        Ok(state
            .resources
            .iter()
            .find(|r| r.urn == urn && r.deleted_at.is_none())
            .cloned())
    }

    async fn list_resources(&self) -> DomainResult<Vec<Resource>> {
        let state = self.lock();
        Ok(state
            .resources
            .iter()
            .filter(|r| r.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn update_resource(&self, input: UpdateResourceInput) -> DomainResult<Resource> {
        let mut state = self.lock();
        let resource = state
            .resources
            .iter_mut()
            .find(|r| r.id == input.resource_id && r.deleted_at.is_none())
            .ok_or_else(|| DomainError::ResourceNotFound(input.resource_id.to_string()))?;
        resource.name = input.name;
        resource.metadata = input.metadata;
        resource.updated_at = Some(Utc::now());
        Ok(resource.clone())
    }

    async fn delete_resource(&self, id: Uuid) -> DomainResult<()> {
        let mut state = self.lock();
        let resource = state
            .resources
            .iter_mut()
            .find(|r| r.id == id && r.deleted_at.is_none())
            .ok_or_else(|| DomainError::ResourceNotFound(id.to_string()))?;
        let now = Utc::now();
        resource.deleted_at = Some(now);
        resource.updated_at = Some(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuple() -> RelationTuple {
        RelationTuple::new("user", "u1", "organization", "o1", "organization:owner")
    }

    fn create_input(tuple: RelationTuple) -> CreateRelationInputWithId {
        CreateRelationInputWithId {
            id: Uuid::new_v4(),
            tuple,
        }
    }

    #[tokio::test]
    async fn test_create_relation_appends_outbox_event() {
        let store = MemoryStore::new();
        let relation = store.create_relation(create_input(tuple())).await.unwrap();

        let events = store.poll_pending(10).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].relation_id, relation.id);
        assert_eq!(events[0].op, RelationOp::Created);
        assert_eq!(events[0].tuple, tuple());
    }

    #[tokio::test]
    async fn test_duplicate_active_tuple_rejected() {
        let store = MemoryStore::new();
        store.create_relation(create_input(tuple())).await.unwrap();

        let result = store.create_relation(create_input(tuple())).await;
        assert!(matches!(result, Err(DomainError::RelationAlreadyExists(_))));
        // Failed insert must not enqueue an event
        assert_eq!(store.pending_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_then_recreate_allowed() {
        let store = MemoryStore::new();
        let first = store.create_relation(create_input(tuple())).await.unwrap();
        store.delete_relation(&tuple()).await.unwrap();
        let second = store.create_relation(create_input(tuple())).await.unwrap();

        assert_ne!(first.id, second.id);
        // Soft-deleted row stays queryable by ID
        let fetched = store.get_relation(first.id).await.unwrap().unwrap();
        assert!(fetched.deleted_at.is_some());

        let events = store.poll_pending(10).await.unwrap();
        let ops: Vec<_> = events.iter().map(|e| e.op).collect();
        assert_eq!(
            ops,
            vec![RelationOp::Created, RelationOp::Deleted, RelationOp::Created]
        );
    }

    #[tokio::test]
    async fn test_delete_missing_relation_fails() {
        let store = MemoryStore::new();
        let result = store.delete_relation(&tuple()).await;
        assert!(matches!(result, Err(DomainError::RelationNotFound(_))));
    }

    #[tokio::test]
    async fn test_ack_removes_event_and_mark_synced() {
        let store = MemoryStore::new();
        let relation = store.create_relation(create_input(tuple())).await.unwrap();
        let events = store.poll_pending(10).await.unwrap();

        store.ack(events[0].seq).await.unwrap();
        store.mark_synced(relation.id).await.unwrap();

        assert_eq!(store.pending_count().await.unwrap(), 0);
        let fetched = store.get_relation(relation.id).await.unwrap().unwrap();
        assert_eq!(fetched.sync_status, SyncStatus::Synced);
    }

    #[tokio::test]
    async fn test_outbox_sequence_is_monotonic() {
        let store = MemoryStore::new();
        for n in 0..3 {
            let t = RelationTuple::new("user", format!("u{n}"), "organization", "o1", "organization:owner");
            store.create_relation(create_input(t)).await.unwrap();
        }
        let events = store.poll_pending(10).await.unwrap();
        let seqs: Vec<_> = events.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_list_relations_filters_and_preserves_order() {
        let store = MemoryStore::new();
        let t1 = RelationTuple::new("user", "u1", "organization", "o1", "organization:owner");
        let t2 = RelationTuple::new("user", "u2", "organization", "o1", "organization:owner");
        store.create_relation(create_input(t1.clone())).await.unwrap();
        store.create_relation(create_input(t2)).await.unwrap();
        store.delete_relation(&t1).await.unwrap();

        let active = store
            .list_relations(RelationFilter::active())
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].tuple.subject_id, "u2");

        let all = store
            .list_relations(RelationFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].tuple.subject_id, "u1");
    }

    #[tokio::test]
    async fn test_policy_upsert_is_content_keyed() {
        let store = MemoryStore::new();
        let policy = Policy {
            id: Uuid::new_v4(),
            namespace_id: "organization".to_string(),
            role_id: "organization:owner".to_string(),
            action_id: "manage".to_string(),
        };
        let stored = store.upsert_policy(policy.clone()).await.unwrap();

        let mut duplicate = policy.clone();
        duplicate.id = Uuid::new_v4();
        let second = store.upsert_policy(duplicate).await.unwrap();
        assert_eq!(second.id, stored.id);

        let listed = store
            .list_policies(PolicyFilter {
                namespace_id: Some("organization".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_user_email_uniqueness() {
        let store = MemoryStore::new();
        let input = CreateUserInputWithId {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            metadata: Default::default(),
        };
        store.create_user(input.clone()).await.unwrap();

        let mut duplicate = input;
        duplicate.id = Uuid::new_v4();
        let result = store.create_user(duplicate).await;
        assert!(matches!(result, Err(DomainError::UserAlreadyExists(_))));
    }
}
