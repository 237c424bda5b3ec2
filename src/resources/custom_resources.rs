//! Custom resource definitions

use serde::{Deserialize, Serialize};

use super::{or_dash, Resource};

pub const CRD_COLUMNS: &[&str] = &["NAME", "GROUP", "VERSION", "KIND", "SCOPE", "INSTANCES", "AGE"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomResourceDefinition {
    pub name: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub kind: String,
    /// "Namespaced" or "Cluster"
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub instances: u32,
    #[serde(default)]
    pub namespaces: Vec<String>,
    #[serde(default)]
    pub age: String,
}

impl Resource for CustomResourceDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            or_dash(&self.group),
            or_dash(&self.version),
            or_dash(&self.kind),
            or_dash(&self.scope),
            self.instances.to_string(),
            or_dash(&self.age),
        ]
    }
}
