//! Resource models for the KubeGraf console
//!
//! This module contains the typed payloads returned by the backend list
//! endpoints, the `ResourceKind` catalogue describing each kind's endpoints and
//! supported actions, and the flattened `ResourceRow` the table renders.

pub mod certificates;
pub mod custom_resources;
pub mod rbac;
pub mod storage;
pub mod workloads;

use serde::de::DeserializeOwned;

pub use certificates::Certificate;
pub use custom_resources::CustomResourceDefinition;
pub use rbac::{ClusterRole, ClusterRoleBinding, Role, RoleBinding, ServiceAccount};
pub use storage::{PersistentVolume, PersistentVolumeClaim, StorageClass};
pub use workloads::StatefulSet;

/// Actions the console can dispatch for a single resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ViewYaml,
    EditYaml,
    Delete,
    Scale,
    Restart,
}

impl Action {
    pub fn label(self) -> &'static str {
        match self {
            Action::ViewYaml => "View YAML",
            Action::EditYaml => "Edit YAML",
            Action::Delete => "Delete",
            Action::Scale => "Scale",
            Action::Restart => "Restart",
        }
    }
}

/// Every resource kind the console can list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Roles,
    RoleBindings,
    ClusterRoles,
    ClusterRoleBindings,
    ServiceAccounts,
    StatefulSets,
    PersistentVolumes,
    PersistentVolumeClaims,
    StorageClasses,
    Certificates,
    CustomResourceDefinitions,
}

const ALL_KINDS: [ResourceKind; 11] = [
    ResourceKind::StatefulSets,
    ResourceKind::ServiceAccounts,
    ResourceKind::Roles,
    ResourceKind::RoleBindings,
    ResourceKind::ClusterRoles,
    ResourceKind::ClusterRoleBindings,
    ResourceKind::PersistentVolumes,
    ResourceKind::PersistentVolumeClaims,
    ResourceKind::StorageClasses,
    ResourceKind::Certificates,
    ResourceKind::CustomResourceDefinitions,
];

impl ResourceKind {
    /// All kinds in tab order
    pub fn all() -> &'static [ResourceKind] {
        &ALL_KINDS
    }

    /// Tab title
    pub fn title(self) -> &'static str {
        match self {
            ResourceKind::Roles => "Roles",
            ResourceKind::RoleBindings => "RoleBindings",
            ResourceKind::ClusterRoles => "ClusterRoles",
            ResourceKind::ClusterRoleBindings => "ClusterRoleBindings",
            ResourceKind::ServiceAccounts => "ServiceAccounts",
            ResourceKind::StatefulSets => "StatefulSets",
            ResourceKind::PersistentVolumes => "PVs",
            ResourceKind::PersistentVolumeClaims => "PVCs",
            ResourceKind::StorageClasses => "StorageClasses",
            ResourceKind::Certificates => "Certificates",
            ResourceKind::CustomResourceDefinitions => "CRDs",
        }
    }

    /// Cache key for this kind's list
    pub fn cache_key(self) -> &'static str {
        match self {
            ResourceKind::Roles => "roles",
            ResourceKind::RoleBindings => "rolebindings",
            ResourceKind::ClusterRoles => "clusterroles",
            ResourceKind::ClusterRoleBindings => "clusterrolebindings",
            ResourceKind::ServiceAccounts => "serviceaccounts",
            ResourceKind::StatefulSets => "statefulsets",
            ResourceKind::PersistentVolumes => "persistentvolumes",
            ResourceKind::PersistentVolumeClaims => "persistentvolumeclaims",
            ResourceKind::StorageClasses => "storageclasses",
            ResourceKind::Certificates => "certificates",
            ResourceKind::CustomResourceDefinitions => "crds",
        }
    }

    /// List endpoint path
    pub fn list_path(self) -> &'static str {
        match self {
            ResourceKind::Roles => "/api/rbac/roles",
            ResourceKind::RoleBindings => "/api/rbac/rolebindings",
            ResourceKind::ClusterRoles => "/api/rbac/clusterroles",
            ResourceKind::ClusterRoleBindings => "/api/rbac/clusterrolebindings",
            ResourceKind::ServiceAccounts => "/api/serviceaccounts",
            ResourceKind::StatefulSets => "/api/statefulsets",
            ResourceKind::PersistentVolumes => "/api/storage/persistentvolumes",
            ResourceKind::PersistentVolumeClaims => "/api/storage/persistentvolumeclaims",
            ResourceKind::StorageClasses => "/api/storage/storageclasses",
            ResourceKind::Certificates => "/api/certificates",
            ResourceKind::CustomResourceDefinitions => "/api/crds",
        }
    }

    /// Prefix of single-resource endpoints (`<prefix>/yaml`, `<prefix>/delete`, ...)
    ///
    /// `None` for list-only kinds.
    pub fn item_path(self) -> Option<&'static str> {
        match self {
            ResourceKind::Roles => Some("/api/rbac/role"),
            ResourceKind::RoleBindings => Some("/api/rbac/rolebinding"),
            ResourceKind::ClusterRoles => Some("/api/rbac/clusterrole"),
            ResourceKind::ClusterRoleBindings => Some("/api/rbac/clusterrolebinding"),
            ResourceKind::ServiceAccounts => Some("/api/serviceaccount"),
            ResourceKind::StatefulSets => Some("/api/statefulset"),
            ResourceKind::PersistentVolumes => Some("/api/storage/persistentvolume"),
            ResourceKind::PersistentVolumeClaims => Some("/api/storage/persistentvolumeclaim"),
            ResourceKind::StorageClasses => Some("/api/storage/storageclass"),
            ResourceKind::Certificates | ResourceKind::CustomResourceDefinitions => None,
        }
    }

    /// Whether resources of this kind live in a namespace
    pub fn is_namespaced(self) -> bool {
        matches!(
            self,
            ResourceKind::Roles
                | ResourceKind::RoleBindings
                | ResourceKind::ServiceAccounts
                | ResourceKind::StatefulSets
                | ResourceKind::PersistentVolumeClaims
                | ResourceKind::Certificates
        )
    }

    /// Whether the backend exposes `action` for this kind
    pub fn supports(self, action: Action) -> bool {
        match action {
            Action::ViewYaml | Action::EditYaml | Action::Delete => self.item_path().is_some(),
            Action::Scale | Action::Restart => self == ResourceKind::StatefulSets,
        }
    }

    /// Table column headers, matching `Resource::cells`
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            ResourceKind::Roles => rbac::ROLE_COLUMNS,
            ResourceKind::RoleBindings => rbac::ROLE_BINDING_COLUMNS,
            ResourceKind::ClusterRoles => rbac::CLUSTER_ROLE_COLUMNS,
            ResourceKind::ClusterRoleBindings => rbac::CLUSTER_ROLE_BINDING_COLUMNS,
            ResourceKind::ServiceAccounts => rbac::SERVICE_ACCOUNT_COLUMNS,
            ResourceKind::StatefulSets => workloads::STATEFUL_SET_COLUMNS,
            ResourceKind::PersistentVolumes => storage::PV_COLUMNS,
            ResourceKind::PersistentVolumeClaims => storage::PVC_COLUMNS,
            ResourceKind::StorageClasses => storage::STORAGE_CLASS_COLUMNS,
            ResourceKind::Certificates => certificates::CERTIFICATE_COLUMNS,
            ResourceKind::CustomResourceDefinitions => custom_resources::CRD_COLUMNS,
        }
    }

    /// Parses a kind from its cache key, singular name, or short alias
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "roles" | "role" => Some(ResourceKind::Roles),
            "rolebindings" | "rolebinding" | "rb" => Some(ResourceKind::RoleBindings),
            "clusterroles" | "clusterrole" | "cr" => Some(ResourceKind::ClusterRoles),
            "clusterrolebindings" | "clusterrolebinding" | "crb" => {
                Some(ResourceKind::ClusterRoleBindings)
            }
            "serviceaccounts" | "serviceaccount" | "sa" => Some(ResourceKind::ServiceAccounts),
            "statefulsets" | "statefulset" | "sts" => Some(ResourceKind::StatefulSets),
            "persistentvolumes" | "persistentvolume" | "pv" | "pvs" => {
                Some(ResourceKind::PersistentVolumes)
            }
            "persistentvolumeclaims" | "persistentvolumeclaim" | "pvc" | "pvcs" => {
                Some(ResourceKind::PersistentVolumeClaims)
            }
            "storageclasses" | "storageclass" | "sc" => Some(ResourceKind::StorageClasses),
            "certificates" | "certificate" | "certs" | "cert" => Some(ResourceKind::Certificates),
            "crds" | "crd" | "customresourcedefinitions" => {
                Some(ResourceKind::CustomResourceDefinitions)
            }
            _ => None,
        }
    }
}

/// Identifies a single resource for YAML and mutation calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub name: String,
    pub namespace: Option<String>,
}

impl ResourceRef {
    /// `namespace/name`, or just `name` for cluster-scoped resources
    pub fn display_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}/{}", ns, self.name),
            None => self.name.clone(),
        }
    }
}

/// One table row: the resource identity plus its rendered cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRow {
    pub target: ResourceRef,
    pub cells: Vec<String>,
}

/// A typed list item that can be flattened into a table row
pub trait Resource: DeserializeOwned {
    fn name(&self) -> &str;

    /// Namespace, or `None` for cluster-scoped resources
    fn namespace(&self) -> Option<&str> {
        None
    }

    /// Cell values in `ResourceKind::columns` order
    fn cells(&self) -> Vec<String>;

    fn into_row(self, kind: ResourceKind) -> ResourceRow
    where
        Self: Sized,
    {
        let cells = self.cells();
        ResourceRow {
            target: ResourceRef {
                kind,
                name: self.name().to_string(),
                namespace: self
                    .namespace()
                    .filter(|ns| !ns.is_empty())
                    .map(str::to_string),
            },
            cells,
        }
    }
}

/// Joins a list for a single table cell, with a dash for empty lists
pub(crate) fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

/// Returns the value or a dash when blank
pub(crate) fn or_dash(value: &str) -> String {
    if value.trim().is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}
