//! RBAC and access-control resources
//!
//! Roles, bindings and service accounts as returned by the `/api/rbac/*` and
//! `/api/serviceaccounts` endpoints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{or_dash, Resource};

pub const ROLE_COLUMNS: &[&str] = &["NAMESPACE", "NAME", "RULES", "AGE"];
pub const ROLE_BINDING_COLUMNS: &[&str] = &["NAMESPACE", "NAME", "ROLE", "SUBJECTS", "AGE"];
pub const CLUSTER_ROLE_COLUMNS: &[&str] = &["NAME", "RULES", "AGE"];
pub const CLUSTER_ROLE_BINDING_COLUMNS: &[&str] = &["NAME", "ROLE", "SUBJECTS", "AGE"];
pub const SERVICE_ACCOUNT_COLUMNS: &[&str] = &["NAMESPACE", "NAME", "SECRETS", "AGE"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub rules: u32,
    #[serde(default)]
    pub age: String,
}

impl Resource for Role {
    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> Option<&str> {
        Some(&self.namespace)
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.namespace.clone(),
            self.name.clone(),
            self.rules.to_string(),
            or_dash(&self.age),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleBinding {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub role_ref: String,
    #[serde(default)]
    pub subjects: u32,
    #[serde(default)]
    pub age: String,
}

impl Resource for RoleBinding {
    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> Option<&str> {
        Some(&self.namespace)
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.namespace.clone(),
            self.name.clone(),
            or_dash(&self.role_ref),
            self.subjects.to_string(),
            or_dash(&self.age),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRole {
    pub name: String,
    #[serde(default)]
    pub rules: u32,
    #[serde(default)]
    pub age: String,
}

impl Resource for ClusterRole {
    fn name(&self) -> &str {
        &self.name
    }

    fn cells(&self) -> Vec<String> {
        vec![self.name.clone(), self.rules.to_string(), or_dash(&self.age)]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRoleBinding {
    pub name: String,
    #[serde(default)]
    pub role_ref: String,
    #[serde(default)]
    pub subjects: u32,
    #[serde(default)]
    pub age: String,
}

impl Resource for ClusterRoleBinding {
    fn name(&self) -> &str {
        &self.name
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            or_dash(&self.role_ref),
            self.subjects.to_string(),
            or_dash(&self.age),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceAccount {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub secrets: u32,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl Resource for ServiceAccount {
    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> Option<&str> {
        Some(&self.namespace)
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.namespace.clone(),
            self.name.clone(),
            self.secrets.to_string(),
            or_dash(&self.age),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ResourceKind;

    #[test]
    fn test_role_binding_parses_camel_case() {
        let json = r#"{"name":"read-pods","namespace":"dev","roleRef":"Role/pod-reader","subjects":2,"age":"4d"}"#;
        let rb: RoleBinding = serde_json::from_str(json).unwrap();
        assert_eq!(rb.role_ref, "Role/pod-reader");
        assert_eq!(rb.cells(), vec!["dev", "read-pods", "Role/pod-reader", "2", "4d"]);
    }

    #[test]
    fn test_cluster_role_missing_fields_default() {
        let cr: ClusterRole = serde_json::from_str(r#"{"name":"view"}"#).unwrap();
        assert_eq!(cr.cells(), vec!["view", "0", "-"]);
    }

    #[test]
    fn test_role_into_row_keeps_namespace() {
        let role = Role {
            name: "editor".to_string(),
            namespace: "team-a".to_string(),
            rules: 5,
            age: "1h".to_string(),
        };
        let row = role.into_row(ResourceKind::Roles);
        assert_eq!(row.target.namespace.as_deref(), Some("team-a"));
        assert_eq!(row.cells.len(), ROLE_COLUMNS.len());
    }

    #[test]
    fn test_service_account_labels_optional() {
        let sa: ServiceAccount =
            serde_json::from_str(r#"{"name":"default","namespace":"kube-system","secrets":1,"age":"90d"}"#)
                .unwrap();
        assert!(sa.labels.is_empty());
        assert_eq!(sa.cells(), vec!["kube-system", "default", "1", "90d"]);
    }
}
