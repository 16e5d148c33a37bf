/// HTTP client for the remote automation service
///
/// Owns request shaping: which fields are illegal on create/update, how list
/// pagination is exhausted, and how transport failures map onto the typed
/// error taxonomy. Constructed explicitly from configuration and passed to
/// every orchestrator call.

use crate::config::RemoteConfig;
use crate::remote::error::ApiError;
use crate::workflow::types::WorkflowDefinition;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Fields the service owns; stripped from every create/update body
///
/// The service rejects writes carrying read-only fields, so the client strips
/// them rather than forcing every caller to pre-clean its definitions.
const READ_ONLY_KEYS: &[&str] = &[
    "id",
    "active",
    "tags",
    "isArchived",
    "createdAt",
    "updatedAt",
    "versionId",
    "triggerCount",
    "shared",
    "meta",
];

/// Page size requested from the list endpoint
const LIST_PAGE_SIZE: usize = 100;

/// One page of the cursor-paginated list endpoint
#[derive(Debug, Deserialize)]
struct ListPage {
    data: Vec<WorkflowDefinition>,
    #[serde(default, rename = "nextCursor")]
    next_cursor: Option<String>,
}

/// Shape a definition into a legal create/update body
pub fn write_body(definition: &WorkflowDefinition) -> Result<Value, ApiError> {
    let mut value = serde_json::to_value(definition)?;
    if let Value::Object(map) = &mut value {
        for key in READ_ONLY_KEYS {
            map.remove(*key);
        }
    }
    Ok(value)
}

/// Client for the service's workflow API
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RemoteClient {
    /// Build a client from explicit configuration
    ///
    /// The timeout applies to every request; there is no automatic retry.
    pub fn new(config: &RemoteConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Connectivity {
                url: config.base_url.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn workflows_url(&self) -> String {
        format!("{}/api/v1/workflows", self.base_url)
    }

    fn workflow_url(&self, id: &str) -> String {
        format!("{}/api/v1/workflows/{}", self.base_url, id)
    }

    fn connectivity_error(&self, err: reqwest::Error) -> ApiError {
        ApiError::Connectivity {
            url: self.base_url.clone(),
            message: err.to_string(),
        }
    }

    /// Map a non-success response onto the error taxonomy
    async fn reject(&self, response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        match status {
            401 | 403 => ApiError::Auth { status },
            400 | 422 => ApiError::RemoteRejected { status, body },
            _ => ApiError::Unexpected { status, body },
        }
    }

    /// Cheap connectivity probe used as the pre-write gate
    pub async fn ping(&self) -> Result<(), ApiError> {
        let response = self
            .http
            .get(self.workflows_url())
            .header("X-API-KEY", &self.api_key)
            .query(&[("limit", "1")])
            .send()
            .await
            .map_err(|e| self.connectivity_error(e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.reject(response).await)
        }
    }

    /// Enumerate the full workflow inventory, paging until exhausted
    pub async fn list(&self) -> Result<Vec<WorkflowDefinition>, ApiError> {
        let mut inventory = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(self.workflows_url())
                .header("X-API-KEY", &self.api_key)
                .query(&[("limit", LIST_PAGE_SIZE.to_string())]);
            if let Some(cursor) = &cursor {
                request = request.query(&[("cursor", cursor)]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| self.connectivity_error(e))?;
            if !response.status().is_success() {
                return Err(self.reject(response).await);
            }

            let page: ListPage = response
                .json()
                .await
                .map_err(|e| self.connectivity_error(e))?;
            inventory.extend(page.data);

            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        tracing::debug!("Listed {} workflows from the service", inventory.len());
        Ok(inventory)
    }

    /// Fetch a single workflow; `None` when the service no longer has it
    pub async fn get(&self, id: &str) -> Result<Option<WorkflowDefinition>, ApiError> {
        let response = self
            .http
            .get(self.workflow_url(id))
            .header("X-API-KEY", &self.api_key)
            .send()
            .await
            .map_err(|e| self.connectivity_error(e))?;

        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(self.reject(response).await);
        }

        let definition = response
            .json()
            .await
            .map_err(|e| self.connectivity_error(e))?;
        Ok(Some(definition))
    }

    /// Create a workflow; the service assigns a fresh id
    pub async fn create(
        &self,
        definition: &WorkflowDefinition,
    ) -> Result<WorkflowDefinition, ApiError> {
        let body = write_body(definition)?;
        let response = self
            .http
            .post(self.workflows_url())
            .header("X-API-KEY", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.connectivity_error(e))?;

        if !response.status().is_success() {
            return Err(self.reject(response).await);
        }

        let created = response
            .json()
            .await
            .map_err(|e| self.connectivity_error(e))?;
        Ok(created)
    }

    /// Update a workflow in place, addressing it by id in the path only
    ///
    /// `None` means the service no longer has this id - the definition was
    /// deleted remotely and must be recreated by name.
    pub async fn update(
        &self,
        id: &str,
        definition: &WorkflowDefinition,
    ) -> Result<Option<WorkflowDefinition>, ApiError> {
        let body = write_body(definition)?;
        let response = self
            .http
            .put(self.workflow_url(id))
            .header("X-API-KEY", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.connectivity_error(e))?;

        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(self.reject(response).await);
        }

        let updated = response
            .json()
            .await
            .map_err(|e| self.connectivity_error(e))?;
        Ok(Some(updated))
    }

    /// Archive a workflow; already-gone targets are not an error
    pub async fn archive(&self, id: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .post(format!("{}/archive", self.workflow_url(id)))
            .header("X-API-KEY", &self.api_key)
            .send()
            .await
            .map_err(|e| self.connectivity_error(e))?;

        if response.status().is_success() || response.status().as_u16() == 404 {
            Ok(())
        } else {
            Err(self.reject(response).await)
        }
    }

    /// Delete a workflow; the service requires archiving it first
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.archive(id).await?;

        let response = self
            .http
            .delete(self.workflow_url(id))
            .header("X-API-KEY", &self.api_key)
            .send()
            .await
            .map_err(|e| self.connectivity_error(e))?;

        if response.status().is_success() || response.status().as_u16() == 404 {
            Ok(())
        } else {
            Err(self.reject(response).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn write_body_strips_read_only_fields() {
        let definition: WorkflowDefinition = serde_json::from_value(json!({
            "id": "wf-1",
            "name": "Nightly ETL",
            "active": true,
            "tags": [{ "id": "t1", "name": "etl" }],
            "createdAt": "2026-01-01T00:00:00Z",
            "updatedAt": "2026-02-01T00:00:00Z",
            "versionId": "v1",
            "nodes": [],
            "connections": {},
            "settings": { "timezone": "UTC" }
        }))
        .unwrap();

        let body = write_body(&definition).unwrap();
        let map = body.as_object().unwrap();

        for key in ["id", "active", "tags", "createdAt", "updatedAt", "versionId"] {
            assert!(!map.contains_key(key), "{} must be stripped", key);
        }
        assert_eq!(body["name"], json!("Nightly ETL"));
        assert_eq!(body["settings"]["timezone"], json!("UTC"));
    }
}
