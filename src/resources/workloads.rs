//! Workload resources

use serde::{Deserialize, Serialize};

use super::{or_dash, Resource};

pub const STATEFUL_SET_COLUMNS: &[&str] = &["NAMESPACE", "NAME", "READY", "REPLICAS", "AGE"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatefulSet {
    pub name: String,
    pub namespace: String,
    /// "ready/desired", e.g. "2/3"
    #[serde(default)]
    pub ready: String,
    #[serde(default)]
    pub replicas: u32,
    #[serde(default)]
    pub age: String,
}

impl StatefulSet {
    /// Returns true when every desired replica reports ready
    pub fn is_fully_ready(&self) -> bool {
        match self.ready.split_once('/') {
            Some((ready, desired)) => ready.trim() == desired.trim(),
            None => false,
        }
    }
}

impl Resource for StatefulSet {
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
            or_dash(&self.ready),
            self.replicas.to_string(),
            or_dash(&self.age),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sts(ready: &str) -> StatefulSet {
        StatefulSet {
            name: "postgres".to_string(),
            namespace: "db".to_string(),
            ready: ready.to_string(),
            replicas: 3,
            age: "12d".to_string(),
        }
    }

    #[test]
    fn test_is_fully_ready() {
        assert!(sts("3/3").is_fully_ready());
        assert!(!sts("2/3").is_fully_ready());
        assert!(!sts("").is_fully_ready());
    }

    #[test]
    fn test_cells() {
        assert_eq!(sts("2/3").cells(), vec!["db", "postgres", "2/3", "3", "12d"]);
    }
}
