//! REST binding for the project HTTP API.
//!
//! Wraps `GET/POST /api/projects` and `GET/PUT/DELETE /api/projects/{id}`
//! using [`reqwest`]. Responses may be bare JSON or wrapped in a
//! `{ "data": ... }` envelope, and field names vary between deployments
//! (`imageUrl` / `img_url` / `image`, `createdAt` / `created_at`, numeric or
//! string ids). All of that is normalised here.

use std::time::Duration;

use async_trait::async_trait;
use outreach_core::project::{Project, ProjectDraft, ProjectId, ProjectPatch};
use outreach_core::types::Timestamp;
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::ResourceStoreClient;
use crate::error::StoreError;

/// HTTP client for one project API deployment.
#[derive(Clone)]
pub struct RestStore {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl RestStore {
    /// Create a client for the API at `api_url`, e.g. `http://localhost:3000`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Create a client whose requests give up after `timeout`.
    pub fn with_timeout(api_url: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, api_url))
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn request(&self, method: Method, id: Option<&ProjectId>) -> Result<RequestBuilder, StoreError> {
        let builder = self.client.request(method, self.url(id)?);
        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    /// `{api_url}/api/projects`, plus the id as a single percent-encoded
    /// path segment.
    fn url(&self, id: Option<&ProjectId>) -> Result<Url, StoreError> {
        if let Some(id) = id {
            if matches!(id.as_str(), "" | "." | "..") {
                return Err(StoreError::InvalidUrl(format!(
                    "project id '{id}' cannot address a resource"
                )));
            }
        }

        let mut url = Url::parse(&self.api_url)
            .map_err(|e| StoreError::InvalidUrl(format!("{}: {e}", self.api_url)))?;
        url.path_segments_mut()
            .map_err(|()| StoreError::InvalidUrl(format!("{} cannot be a base URL", self.api_url)))?
            .pop_if_empty()
            .extend(["api", "projects"])
            .extend(id.map(ProjectId::as_str));
        Ok(url)
    }

    // ---- private helpers ----

    /// Return the response unchanged on 2xx, otherwise
    /// [`StoreError::Api`] carrying the status and the body's `error` message.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        Err(StoreError::Api {
            status: status.as_u16(),
            message: error_message(status, &body),
        })
    }

    /// Parse a successful JSON body, with or without a `data` envelope.
    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, StoreError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        match serde_json::from_slice::<Envelope<T>>(&bytes) {
            Ok(Envelope::Wrapped { data }) | Ok(Envelope::Bare(data)) => Ok(data),
            Err(e) => Err(StoreError::Decode(e.to_string())),
        }
    }
}

#[async_trait]
impl ResourceStoreClient for RestStore {
    async fn list(&self) -> Result<Vec<Project>, StoreError> {
        let response = self.request(Method::GET, None)?.send().await?;
        let wire: Vec<WireProject> = Self::parse_response(response).await?;
        Ok(wire.into_iter().map(Project::from).collect())
    }

    async fn get(&self, id: &ProjectId) -> Result<Project, StoreError> {
        let response = self.request(Method::GET, Some(id))?.send().await?;
        let wire: WireProject = Self::parse_response(response).await?;
        Ok(wire.into())
    }

    async fn create(&self, draft: &ProjectDraft) -> Result<Project, StoreError> {
        let response = self.request(Method::POST, None)?.json(draft).send().await?;
        let wire: WireProject = Self::parse_response(response).await?;
        Ok(wire.into())
    }

    async fn update(&self, id: &ProjectId, patch: &ProjectPatch) -> Result<Project, StoreError> {
        let response = self
            .request(Method::PUT, Some(id))?
            .json(patch)
            .send()
            .await?;
        let wire: WireProject = Self::parse_response(response).await?;
        Ok(wire.into())
    }

    async fn delete(&self, id: &ProjectId) -> Result<(), StoreError> {
        let response = self.request(Method::DELETE, Some(id))?.send().await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Some deployments send ids and years as numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireText {
    Number(i64),
    Text(String),
}

impl From<WireText> for String {
    fn from(value: WireText) -> Self {
        match value {
            WireText::Number(n) => n.to_string(),
            WireText::Text(s) => s,
        }
    }
}

#[derive(Deserialize)]
struct WireProject {
    id: WireText,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, alias = "imageUrl", alias = "img_url", alias = "image")]
    image_url: Option<String>,
    #[serde(default)]
    year: Option<WireText>,
    #[serde(alias = "createdAt")]
    created_at: Timestamp,
    #[serde(alias = "updatedAt")]
    updated_at: Timestamp,
}

impl From<WireProject> for Project {
    fn from(wire: WireProject) -> Self {
        Project {
            id: ProjectId::new(String::from(wire.id)),
            title: wire.title,
            description: wire.description,
            category: wire.category,
            status: wire.status,
            image_url: wire.image_url,
            year: wire.year.map(String::from),
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        }
    }
}

/// The `error` field of a JSON error body, the raw body, or the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.error;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalises_camel_case_payload() {
        let json = r#"{
            "id": 17,
            "title": "Clean Water",
            "imageUrl": "https://img.example.org/w.jpg",
            "year": 2024,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-02T00:00:00Z"
        }"#;
        let project: Project = serde_json::from_str::<WireProject>(json).unwrap().into();
        assert_eq!(project.id.as_str(), "17");
        assert_eq!(project.image_url.as_deref(), Some("https://img.example.org/w.jpg"));
        assert_eq!(project.year.as_deref(), Some("2024"));
        assert!(project.description.is_none());
    }

    #[test]
    fn normalises_table_style_payload() {
        let json = r#"{
            "id": "0b6f5c3e-7d1a-4c55-9a55-2f1f3f7a1e01",
            "title": "Youth Camp",
            "img_url": "https://img.example.org/c.jpg",
            "created_at": "2024-02-01T00:00:00Z",
            "updated_at": "2024-02-01T00:00:00Z"
        }"#;
        let project: Project = serde_json::from_str::<WireProject>(json).unwrap().into();
        assert_eq!(project.image_url.as_deref(), Some("https://img.example.org/c.jpg"));
    }

    #[test]
    fn accepts_enveloped_and_bare_lists() {
        let item = r#"{"id":"p1","title":"A","created_at":"2024-01-01T00:00:00Z","updated_at":"2024-01-01T00:00:00Z"}"#;

        let bare = format!("[{item}]");
        let Envelope::Bare(list) = serde_json::from_str::<Envelope<Vec<WireProject>>>(&bare).unwrap()
        else {
            panic!("bare list should parse as Bare");
        };
        assert_eq!(list.len(), 1);

        let wrapped = format!(r#"{{"data":[{item}]}}"#);
        let Envelope::Wrapped { data } =
            serde_json::from_str::<Envelope<Vec<WireProject>>>(&wrapped).unwrap()
        else {
            panic!("enveloped list should parse as Wrapped");
        };
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn ids_are_encoded_as_one_path_segment() {
        let store = RestStore::new("http://api.example.org/v1/");
        assert_eq!(
            store.url(None).unwrap().as_str(),
            "http://api.example.org/v1/api/projects"
        );
        assert_eq!(
            store.url(Some(&ProjectId::from("../../admin/users"))).unwrap().path(),
            "/v1/api/projects/..%2F..%2Fadmin%2Fusers"
        );
        let url = store.url(Some(&ProjectId::from("a?b=1#c"))).unwrap();
        assert_eq!(url.path(), "/v1/api/projects/a%3Fb=1%23c");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn dot_segments_and_bad_base_urls_are_rejected() {
        let store = RestStore::new("http://api.example.org");
        for id in ["", ".", ".."] {
            assert!(matches!(
                store.url(Some(&ProjectId::from(id))),
                Err(StoreError::InvalidUrl(_))
            ));
        }
        assert!(matches!(
            RestStore::new("not a url").url(None),
            Err(StoreError::InvalidUrl(_))
        ));
    }

    #[test]
    fn error_message_prefers_json_error_field() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"error":"Title is required","code":"VALIDATION_ERROR"}"#),
            "Title is required"
        );
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "upstream down\n"), "upstream down");
        assert_eq!(error_message(StatusCode::SERVICE_UNAVAILABLE, ""), "Service Unavailable");
    }
}
