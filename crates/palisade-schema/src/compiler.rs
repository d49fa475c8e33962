use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::debug;

use palisade_domain::{
    role_relation_name, Action, DomainError, DomainResult, Namespace, Policy, Role,
    GROUP_TYPE, USER_TYPE,
};

use crate::document::{Definition, PermissionRule, SchemaDocument};

fn is_principal(namespace_id: &str) -> bool {
    namespace_id == USER_TYPE || namespace_id == GROUP_TYPE
}

/// Compile namespaces, roles, actions and policies into a schema document.
///
/// Deterministic: the result depends only on the content of the input sets,
/// never on their order. Fails with `NamespaceConflict` when one namespace id
/// is declared with differing attributes, and `InvalidReference` when a
/// role, action or policy names something absent from the inputs.
pub fn compile(
    namespaces: &[Namespace],
    roles: &[Role],
    actions: &[Action],
    policies: &[Policy],
) -> DomainResult<SchemaDocument> {
    let mut namespace_ids: HashSet<&str> = HashSet::new();
    let mut seen: HashMap<&str, &Namespace> = HashMap::new();
    for ns in namespaces {
        if let Some(previous) = seen.get(ns.id.as_str()) {
            // Byte-identical duplicate declarations collapse into one
            if previous.name != ns.name
                || previous.backend != ns.backend
                || previous.resource_type != ns.resource_type
            {
                return Err(DomainError::NamespaceConflict(ns.id.clone()));
            }
        } else {
            seen.insert(&ns.id, ns);
        }
        namespace_ids.insert(&ns.id);
    }

    let mut roles_by_id: HashMap<&str, &Role> = HashMap::new();
    for role in roles {
        if !namespace_ids.contains(role.namespace_id.as_str()) {
            return Err(DomainError::InvalidReference(format!(
                "role {} references unknown namespace {}",
                role.id, role.namespace_id
            )));
        }
        for subject_type in &role.types {
            if !namespace_ids.contains(subject_type.as_str()) {
                return Err(DomainError::InvalidReference(format!(
                    "role {} references unknown subject namespace {}",
                    role.id, subject_type
                )));
            }
        }
        roles_by_id.insert(&role.id, role);
    }

    let mut action_keys: HashSet<(&str, &str)> = HashSet::new();
    for action in actions {
        if !namespace_ids.contains(action.namespace_id.as_str()) {
            return Err(DomainError::InvalidReference(format!(
                "action {} references unknown namespace {}",
                action.id, action.namespace_id
            )));
        }
        action_keys.insert((&action.namespace_id, &action.id));
    }

    let mut definitions: BTreeMap<String, Definition> = BTreeMap::new();
    for id in &namespace_ids {
        definitions.insert(id.to_string(), Definition::default());
    }

    for role in roles_by_id.values() {
        let definition = definitions
            .get_mut(&role.namespace_id)
            .expect("validated above");
        definition
            .relations
            .entry(role_relation_name(&role.id).to_string())
            .or_default()
            .extend(role.types.iter().cloned());
    }

    for policy in policies {
        if !namespace_ids.contains(policy.namespace_id.as_str()) {
            return Err(DomainError::InvalidReference(format!(
                "policy references unknown namespace {}",
                policy.namespace_id
            )));
        }
        let role = roles_by_id.get(policy.role_id.as_str()).ok_or_else(|| {
            DomainError::InvalidReference(format!(
                "policy references unknown role {}",
                policy.role_id
            ))
        })?;
        if role.namespace_id != policy.namespace_id {
            return Err(DomainError::InvalidReference(format!(
                "policy in namespace {} references role {} from namespace {}",
                policy.namespace_id, policy.role_id, role.namespace_id
            )));
        }
        if !action_keys.contains(&(policy.namespace_id.as_str(), policy.action_id.as_str())) {
            return Err(DomainError::InvalidReference(format!(
                "policy references unknown action {} in namespace {}",
                policy.action_id, policy.namespace_id
            )));
        }

        let definition = definitions
            .get_mut(&policy.namespace_id)
            .expect("validated above");
        let rules = definition
            .permissions
            .entry(policy.action_id.clone())
            .or_default();
        for subject_type in &role.types {
            if is_principal(subject_type) {
                rules.insert(PermissionRule::Role {
                    role_id: role.id.clone(),
                });
            } else {
                rules.insert(PermissionRule::Inherited {
                    via_role_id: role.id.clone(),
                    namespace_id: subject_type.clone(),
                    permission: policy.action_id.clone(),
                });
            }
        }
    }

    debug!(definitions = definitions.len(), "Schema compiled");
    Ok(SchemaDocument { definitions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use palisade_domain::system::{
        system_actions, system_namespaces, system_policies, system_roles,
    };
    use uuid::Uuid;

    fn policy(namespace_id: &str, role_id: &str, action_id: &str) -> Policy {
        Policy {
            id: Uuid::new_v4(),
            namespace_id: namespace_id.to_string(),
            role_id: role_id.to_string(),
            action_id: action_id.to_string(),
        }
    }

    #[test]
    fn test_compile_system_defaults() {
        let document = compile(
            &system_namespaces(),
            &system_roles(),
            &system_actions(),
            &system_policies(),
        )
        .unwrap();

        let org = document.definition("organization").unwrap();
        assert!(org.relations.contains_key("owner"));
        assert!(org.permissions["manage"].contains(&PermissionRule::Role {
            role_id: "organization:owner".to_string()
        }));

        // Project manage inherits from the organization
        let project = document.definition("project").unwrap();
        assert!(project
            .permissions["manage"]
            .contains(&PermissionRule::Inherited {
                via_role_id: "project:organization".to_string(),
                namespace_id: "organization".to_string(),
                permission: "manage".to_string(),
            }));
    }

    #[test]
    fn test_compile_deterministic_under_permutation() {
        let namespaces = system_namespaces();
        let roles = system_roles();
        let actions = system_actions();
        let policies = system_policies();

        let forward = compile(&namespaces, &roles, &actions, &policies).unwrap();

        let mut reversed_policies = policies.clone();
        reversed_policies.reverse();
        let mut reversed_roles = roles.clone();
        reversed_roles.reverse();
        let reversed = compile(&namespaces, &reversed_roles, &actions, &reversed_policies).unwrap();

        assert_eq!(forward, reversed);
        assert_eq!(forward.render(), reversed.render());
    }

    #[test]
    fn test_compile_unknown_role_is_invalid_reference() {
        let namespaces = system_namespaces();
        let roles = system_roles();
        let actions = system_actions();
        let policies = vec![policy("organization", "organization:sorcerer", "manage")];

        let result = compile(&namespaces, &roles, &actions, &policies);
        assert!(matches!(result, Err(DomainError::InvalidReference(_))));
    }

    #[test]
    fn test_compile_unknown_action_is_invalid_reference() {
        let namespaces = system_namespaces();
        let roles = system_roles();
        let actions = system_actions();
        let policies = vec![policy("organization", "organization:owner", "transmogrify")];

        let result = compile(&namespaces, &roles, &actions, &policies);
        assert!(matches!(result, Err(DomainError::InvalidReference(_))));
    }

    #[test]
    fn test_compile_conflicting_namespace_declarations() {
        let mut namespaces = system_namespaces();
        let mut conflicting = namespaces[0].clone();
        conflicting.name = "Something Else".to_string();
        namespaces.push(conflicting);

        let result = compile(&namespaces, &[], &[], &[]);
        assert!(matches!(result, Err(DomainError::NamespaceConflict(_))));
    }

    #[test]
    fn test_compile_duplicate_identical_namespaces_collapse() {
        let mut namespaces = system_namespaces();
        namespaces.push(namespaces[0].clone());

        let result = compile(&namespaces, &[], &[], &[]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_compile_role_in_wrong_namespace() {
        let namespaces = system_namespaces();
        let roles = system_roles();
        let actions = system_actions();
        // group:manager exists, but not in the organization namespace
        let policies = vec![policy("organization", "group:manager", "manage")];

        let result = compile(&namespaces, &roles, &actions, &policies);
        assert!(matches!(result, Err(DomainError::InvalidReference(_))));
    }
}
