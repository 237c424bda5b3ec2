//! HTTP client for the KubeGraf backend

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{ApiError, MutationResponse, YamlResponse};
use crate::resources::{
    Action, Certificate, ClusterRole, ClusterRoleBinding, CustomResourceDefinition,
    PersistentVolume, PersistentVolumeClaim, Resource, ResourceKind, ResourceRef, ResourceRow,
    Role, RoleBinding, ServiceAccount, StatefulSet, StorageClass,
};

/// Backend address used when none is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Upper bound on any single request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Response from `/api/namespaces`
#[derive(Debug, Deserialize)]
struct NamespacesResponse {
    #[serde(default)]
    namespaces: Vec<String>,
}

/// Client for the KubeGraf REST API
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Backend origin, e.g. `http://localhost:3000`
    base_url: String,
}

impl ApiClient {
    /// Creates a client for the backend at `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(http_client, base_url))
    }

    /// Creates a client around an existing reqwest client
    pub fn with_client(http_client: Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetches the namespace names visible in the current cluster
    pub async fn namespaces(&self) -> Result<Vec<String>, ApiError> {
        let response = self
            .http_client
            .get(self.endpoint("/api/namespaces"))
            .send()
            .await?;
        let body = read_body(response).await?;
        let parsed: NamespacesResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::ParseError(e.to_string()))?;

        let mut namespaces = parsed.namespaces;
        namespaces.sort();
        Ok(namespaces)
    }

    /// Fetches the list for `kind` and flattens it into table rows.
    ///
    /// `namespace` is ignored for cluster-scoped kinds; `None` lists every
    /// namespace.
    pub async fn list(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
    ) -> Result<Vec<ResourceRow>, ApiError> {
        let mut request = self.http_client.get(self.endpoint(kind.list_path()));
        if kind.is_namespaced() {
            request = request.query(&[("namespace", namespace.unwrap_or(""))]);
        }

        debug!(kind = kind.cache_key(), namespace, "listing resources");
        let body = read_body(request.send().await?).await?;
        decode_rows(kind, &body)
    }

    /// Fetches the YAML manifest for a resource
    pub async fn get_yaml(&self, target: &ResourceRef) -> Result<String, ApiError> {
        let url = self.item_endpoint(target, Action::ViewYaml, "yaml")?;
        let response = self
            .http_client
            .get(url)
            .query(&item_query(target))
            .send()
            .await?;
        let body = read_body(response).await?;
        parse_yaml_body(&body)
    }

    /// Replaces a resource with the given YAML manifest
    pub async fn update_yaml(&self, target: &ResourceRef, yaml: String) -> Result<(), ApiError> {
        let url = self.item_endpoint(target, Action::EditYaml, "update")?;
        let request = self
            .http_client
            .post(url)
            .query(&item_query(target))
            .header(CONTENT_TYPE, "text/yaml")
            .body(yaml);
        mutate(request, "Update failed").await
    }

    /// Deletes a resource
    pub async fn delete(&self, target: &ResourceRef) -> Result<(), ApiError> {
        let url = self.item_endpoint(target, Action::Delete, "delete")?;
        let request = self.http_client.post(url).query(&item_query(target));
        mutate(request, "Delete failed").await
    }

    /// Scales a workload to `replicas`
    pub async fn scale(&self, target: &ResourceRef, replicas: u32) -> Result<(), ApiError> {
        let url = self.item_endpoint(target, Action::Scale, "scale")?;
        let mut query = item_query(target);
        query.push(("replicas", replicas.to_string()));
        let request = self.http_client.post(url).query(&query);
        mutate(request, "Scale failed").await
    }

    /// Triggers a rolling restart of a workload
    pub async fn restart(&self, target: &ResourceRef) -> Result<(), ApiError> {
        let url = self.item_endpoint(target, Action::Restart, "restart")?;
        let request = self.http_client.post(url).query(&item_query(target));
        mutate(request, "Restart failed").await
    }

    fn item_endpoint(
        &self,
        target: &ResourceRef,
        action: Action,
        verb: &'static str,
    ) -> Result<String, ApiError> {
        let unsupported = ApiError::Unsupported {
            action: action.label(),
            kind: target.kind.title(),
        };
        if !target.kind.supports(action) {
            return Err(unsupported);
        }
        let prefix = target.kind.item_path().ok_or(unsupported)?;
        Ok(self.endpoint(&format!("{}/{}", prefix, verb)))
    }
}

/// `name` and, for namespaced resources, `namespace` query parameters
fn item_query(target: &ResourceRef) -> Vec<(&'static str, String)> {
    let mut query = vec![("name", target.name.clone())];
    if let Some(ref namespace) = target.namespace {
        query.push(("namespace", namespace.clone()));
    }
    query
}

/// Reads the body, mapping non-2xx responses to `StatusError`
async fn read_body(response: Response) -> Result<String, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(ApiError::StatusError {
            status: status.as_u16(),
            body: error_message(&body).unwrap_or_else(|| format!("API error: {}", status.as_u16())),
        })
    }
}

async fn mutate(request: RequestBuilder, fallback: &str) -> Result<(), ApiError> {
    let body = read_body(request.send().await?).await?;
    parse_mutation_body(&body, fallback)
}

/// Extracts a useful message from an error body: `{error}` JSON or plain text
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => map
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some(trimmed.to_string())),
        _ => Some(trimmed.to_string()),
    }
}

fn parse_mutation_body(body: &str, fallback: &str) -> Result<(), ApiError> {
    let response: MutationResponse =
        serde_json::from_str(body).map_err(|e| ApiError::ParseError(e.to_string()))?;
    response.into_result(fallback)
}

/// YAML endpoints answer either `{success, yaml}` JSON or the raw manifest
fn parse_yaml_body(body: &str) -> Result<String, ApiError> {
    match serde_json::from_str::<YamlResponse>(body) {
        Ok(response) => {
            if response.success == Some(false) {
                return Err(ApiError::Rejected(
                    response
                        .error
                        .unwrap_or_else(|| "Failed to load YAML".to_string()),
                ));
            }
            response
                .yaml
                .ok_or_else(|| ApiError::ParseError("response has no yaml field".to_string()))
        }
        Err(_) => Ok(body.to_string()),
    }
}

/// Decodes a list body into typed resources, then into rows
fn decode_rows(kind: ResourceKind, body: &str) -> Result<Vec<ResourceRow>, ApiError> {
    match kind {
        ResourceKind::Roles => rows::<Role>(kind, body),
        ResourceKind::RoleBindings => rows::<RoleBinding>(kind, body),
        ResourceKind::ClusterRoles => rows::<ClusterRole>(kind, body),
        ResourceKind::ClusterRoleBindings => rows::<ClusterRoleBinding>(kind, body),
        ResourceKind::ServiceAccounts => rows::<ServiceAccount>(kind, body),
        ResourceKind::StatefulSets => rows::<StatefulSet>(kind, body),
        ResourceKind::PersistentVolumes => rows::<PersistentVolume>(kind, body),
        ResourceKind::PersistentVolumeClaims => rows::<PersistentVolumeClaim>(kind, body),
        ResourceKind::StorageClasses => rows::<StorageClass>(kind, body),
        ResourceKind::Certificates => rows::<Certificate>(kind, body),
        ResourceKind::CustomResourceDefinitions => rows::<CustomResourceDefinition>(kind, body),
    }
}

fn rows<T: Resource>(kind: ResourceKind, body: &str) -> Result<Vec<ResourceRow>, ApiError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| ApiError::ParseError(e.to_string()))?;

    let items: Vec<T> = match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()
            .map_err(|e| {
                ApiError::ParseError(format!("invalid {} payload: {}", kind.cache_key(), e))
            })?,
        Value::Object(ref map) if map.get("success") == Some(&Value::Bool(false)) => {
            let message = map
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("request failed");
            return Err(ApiError::Rejected(message.to_string()));
        }
        other => {
            return Err(ApiError::ParseError(format!(
                "expected a JSON array of {}, got {}",
                kind.cache_key(),
                json_type(&other)
            )))
        }
    };

    Ok(items.into_iter().map(|item| item.into_row(kind)).collect())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
