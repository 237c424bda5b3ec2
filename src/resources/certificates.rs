//! cert-manager certificates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{join_or_dash, or_dash, Resource};

pub const CERTIFICATE_COLUMNS: &[&str] = &[
    "NAMESPACE", "NAME", "STATUS", "ISSUER", "SECRET", "EXPIRES", "DNS NAMES", "AGE",
];

/// Certificates expiring within this many days are flagged
const EXPIRY_WARNING_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub secret_name: String,
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub not_before: String,
    #[serde(default)]
    pub not_after: String,
    #[serde(default)]
    pub renewal_time: String,
    #[serde(default)]
    pub dns_names: Vec<String>,
    #[serde(default)]
    pub age: String,
}

impl Certificate {
    /// Parses `notAfter` (RFC 3339). Returns `None` when absent or malformed.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(self.not_after.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Human-readable expiry relative to `now`
    pub fn expiry_label(&self, now: DateTime<Utc>) -> String {
        let Some(expires_at) = self.expires_at() else {
            return "-".to_string();
        };

        let days = (expires_at - now).num_days();
        if expires_at <= now {
            "expired".to_string()
        } else if days == 0 {
            "<1d".to_string()
        } else if days <= EXPIRY_WARNING_DAYS {
            format!("{}d (soon)", days)
        } else {
            format!("{}d", days)
        }
    }

    /// Returns true if the certificate expires within the warning window
    pub fn expires_soon(&self, now: DateTime<Utc>) -> bool {
        self.expires_at()
            .is_some_and(|expires_at| (expires_at - now).num_days() <= EXPIRY_WARNING_DAYS)
    }
}

impl Resource for Certificate {
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
            or_dash(&self.issuer),
            or_dash(&self.secret_name),
            self.expiry_label(Utc::now()),
            join_or_dash(&self.dns_names),
            or_dash(&self.age),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cert(not_after: &str) -> Certificate {
        Certificate {
            name: "web-tls".to_string(),
            namespace: "ingress".to_string(),
            secret_name: "web-tls".to_string(),
            issuer: "letsencrypt".to_string(),
            status: "Ready".to_string(),
            not_before: String::new(),
            not_after: not_after.to_string(),
            renewal_time: String::new(),
            dns_names: vec!["example.com".to_string()],
            age: "10d".to_string(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_expiry_label_far_future() {
        assert_eq!(cert("2026-06-01T00:00:00Z").expiry_label(now()), "151d");
    }

    #[test]
    fn test_expiry_label_soon() {
        let c = cert("2026-01-11T00:00:00Z");
        assert_eq!(c.expiry_label(now()), "10d (soon)");
        assert!(c.expires_soon(now()));
    }

    #[test]
    fn test_expiry_label_expired() {
        assert_eq!(cert("2025-12-01T00:00:00Z").expiry_label(now()), "expired");
    }

    #[test]
    fn test_expiry_label_unparseable() {
        let c = cert("next tuesday");
        assert_eq!(c.expiry_label(now()), "-");
        assert!(!c.expires_soon(now()));
    }

    #[test]
    fn test_parses_backend_payload() {
        let json = r#"{
            "name": "api-tls",
            "namespace": "prod",
            "secretName": "api-tls-secret",
            "issuer": "ca-issuer",
            "status": "Ready",
            "notAfter": "2026-03-01T12:00:00+00:00",
            "dnsNames": ["api.example.com", "www.example.com"],
            "age": "2d"
        }"#;
        let c: Certificate = serde_json::from_str(json).unwrap();
        assert_eq!(c.secret_name, "api-tls-secret");
        assert!(c.expires_at().is_some());
        assert_eq!(c.cells()[6], "api.example.com, www.example.com");
    }
}
