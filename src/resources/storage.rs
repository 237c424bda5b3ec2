//! Storage resources: persistent volumes, claims and storage classes

use serde::{Deserialize, Serialize};

use super::{join_or_dash, or_dash, Resource};

pub const PV_COLUMNS: &[&str] = &[
    "NAME", "CAPACITY", "ACCESS MODES", "RECLAIM", "STATUS", "CLAIM", "CLASS", "AGE",
];
pub const PVC_COLUMNS: &[&str] = &[
    "NAMESPACE", "NAME", "STATUS", "VOLUME", "CAPACITY", "ACCESS MODES", "CLASS", "AGE",
];
pub const STORAGE_CLASS_COLUMNS: &[&str] = &[
    "NAME", "PROVISIONER", "RECLAIM", "BINDING MODE", "EXPANSION", "AGE",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolume {
    pub name: String,
    #[serde(default)]
    pub capacity: String,
    #[serde(default)]
    pub access_modes: Vec<String>,
    #[serde(default)]
    pub reclaim_policy: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub storage_class: String,
    #[serde(default)]
    pub claim: Option<String>,
    #[serde(default)]
    pub age: String,
}

impl Resource for PersistentVolume {
    fn name(&self) -> &str {
        &self.name
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            or_dash(&self.capacity),
            join_or_dash(&self.access_modes),
            or_dash(&self.reclaim_policy),
            or_dash(&self.status),
            self.claim.as_deref().map(or_dash).unwrap_or_else(|| "-".to_string()),
            or_dash(&self.storage_class),
            or_dash(&self.age),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeClaim {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub volume: String,
    #[serde(default)]
    pub capacity: String,
    #[serde(default)]
    pub access_modes: Vec<String>,
    #[serde(default)]
    pub storage_class: String,
    #[serde(default)]
    pub age: String,
}

impl Resource for PersistentVolumeClaim {
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
            or_dash(&self.status),
            or_dash(&self.volume),
            or_dash(&self.capacity),
            join_or_dash(&self.access_modes),
            or_dash(&self.storage_class),
            or_dash(&self.age),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageClass {
    pub name: String,
    #[serde(default)]
    pub provisioner: String,
    #[serde(default)]
    pub reclaim_policy: String,
    #[serde(default)]
    pub volume_binding_mode: String,
    #[serde(default)]
    pub allow_volume_expansion: bool,
    #[serde(default)]
    pub age: String,
}

impl Resource for StorageClass {
    fn name(&self) -> &str {
        &self.name
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            or_dash(&self.provisioner),
            or_dash(&self.reclaim_policy),
            or_dash(&self.volume_binding_mode),
            if self.allow_volume_expansion { "yes" } else { "no" }.to_string(),
            or_dash(&self.age),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pv_unbound_claim_renders_dash() {
        let json = r#"{
            "name": "pv-001",
            "capacity": "10Gi",
            "accessModes": ["ReadWriteOnce"],
            "reclaimPolicy": "Retain",
            "status": "Available",
            "storageClass": "standard",
            "age": "3d"
        }"#;
        let pv: PersistentVolume = serde_json::from_str(json).unwrap();
        assert_eq!(pv.claim, None);
        assert_eq!(pv.cells()[5], "-");
        assert_eq!(pv.cells()[2], "ReadWriteOnce");
    }

    #[test]
    fn test_pvc_multiple_access_modes() {
        let json = r#"{
            "name": "data-postgres-0",
            "namespace": "db",
            "status": "Bound",
            "volume": "pvc-1234",
            "capacity": "20Gi",
            "accessModes": ["ReadWriteOnce", "ReadOnlyMany"],
            "storageClass": "gp3",
            "age": "40d"
        }"#;
        let pvc: PersistentVolumeClaim = serde_json::from_str(json).unwrap();
        assert_eq!(pvc.cells()[5], "ReadWriteOnce, ReadOnlyMany");
        assert_eq!(pvc.cells().len(), PVC_COLUMNS.len());
    }

    #[test]
    fn test_storage_class_expansion_flag() {
        let sc: StorageClass = serde_json::from_str(
            r#"{"name":"gp3","provisioner":"ebs.csi.aws.com","allowVolumeExpansion":true}"#,
        )
        .unwrap();
        assert_eq!(sc.cells()[4], "yes");
        assert_eq!(sc.cells()[3], "-");
    }
}
