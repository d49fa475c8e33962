use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use palisade_domain::role_relation_name;

/// How a permission is satisfied within a definition.
///
/// Ordered so permission expressions render deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PermissionRule {
    /// Subject holds the role directly on the object (or through group
    /// membership resolved by the backend)
    Role { role_id: String },
    /// Subject holds the permission on the object linked through the
    /// hierarchy role (`project -> organization`)
    Inherited {
        via_role_id: String,
        namespace_id: String,
        permission: String,
    },
}

/// Compiled definition for one namespace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    /// Relation name -> allowed subject namespaces
    pub relations: BTreeMap<String, BTreeSet<String>>,
    /// Permission (action id) -> rules that satisfy it
    pub permissions: BTreeMap<String, BTreeSet<PermissionRule>>,
}

/// The compiled schema pushed to the permission backend.
///
/// Content-addressed by construction: identical input sets produce an
/// identical structure, and `render` emits byte-identical text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub definitions: BTreeMap<String, Definition>,
}

impl SchemaDocument {
    pub fn definition(&self, namespace_id: &str) -> Option<&Definition> {
        self.definitions.get(namespace_id)
    }

    /// Render the document in the backend's text schema dialect
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (namespace_id, definition) in &self.definitions {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("definition {} {{\n", namespace_id));
            for (relation, subject_types) in &definition.relations {
                let types: Vec<&str> = subject_types.iter().map(String::as_str).collect();
                out.push_str(&format!("\trelation {}: {}\n", relation, types.join(" | ")));
            }
            for (permission, rules) in &definition.permissions {
                let terms: Vec<String> = rules
                    .iter()
                    .map(|rule| match rule {
                        PermissionRule::Role { role_id } => {
                            role_relation_name(role_id).to_string()
                        }
                        PermissionRule::Inherited {
                            via_role_id,
                            permission,
                            ..
                        } => format!("{}->{}", role_relation_name(via_role_id), permission),
                    })
                    .collect();
                out.push_str(&format!(
                    "\tpermission {} = {}\n",
                    permission,
                    terms.join(" + ")
                ));
            }
            out.push_str("}\n");
        }
        out
    }
}
