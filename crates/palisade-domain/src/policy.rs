use uuid::Uuid;

/// Policy entity: grants an action to a role within a namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub id: Uuid,
    pub namespace_id: String,
    pub role_id: String,
    pub action_id: String,
}

/// Input for upserting a policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertPolicyInput {
    pub namespace_id: String,
    pub role_id: String,
    pub action_id: String,
}

/// Filter for listing policies
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyFilter {
    pub namespace_id: Option<String>,
}
