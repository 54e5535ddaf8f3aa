//! REST implementation of [`TaskApi`] over reqwest.
//!
//! Routes, relative to the configured base URL:
//!
//! ```text
//! GET    /api/{user_id}/tasks                 list
//! POST   /api/{user_id}/tasks                 create
//! PUT    /api/{user_id}/tasks/{id}            update
//! DELETE /api/{user_id}/tasks/{id}            delete
//! PATCH  /api/{user_id}/tasks/{id}/complete   toggle completion
//! ```
//!
//! The bearer token of the current [`SessionHandle`] is attached to every
//! request when present.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use taskdeck_proto::auth::UserId;
use taskdeck_proto::error::error_message;
use taskdeck_proto::task::{CompletionUpdate, Task, TaskCreate, TaskId, TaskUpdate};

use super::{ApiError, TaskApi};
use crate::auth::session::SessionHandle;

/// Timeouts applied to every HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    /// Total time allowed for a request, including the body.
    pub request_timeout: Duration,
    /// Time allowed to establish the TCP/TLS connection.
    pub connect_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl HttpSettings {
    /// Builds a reqwest client with these timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the TLS backend cannot be initialised.
    pub fn build_client(&self) -> Result<reqwest::Client, ApiError> {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {e}")))
    }
}

/// Appends path segments to `base`, percent-encoding each one.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| ApiError::Network(format!("API URL cannot be a base: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Sends `request` and turns non-success statuses into [`ApiError`]s.
pub(crate) async fn execute(request: RequestBuilder) -> Result<Response, ApiError> {
    let response = request.send().await.map_err(transport_error)?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await.unwrap_or_default();
    let message = error_message(&body, status.canonical_reason().unwrap_or("request failed"));
    tracing::debug!(status = status.as_u16(), %message, "API request failed");
    Err(ApiError::from_status(status.as_u16(), message))
}

/// Reads and decodes a JSON response body.
pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_decode() {
        ApiError::Decode(err.to_string())
    } else {
        ApiError::Network(err.to_string())
    }
}

/// Task API client for the REST backend.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    http: reqwest::Client,
    base: Url,
    session: SessionHandle,
}

impl HttpTaskApi {
    /// Creates a client rooted at `base`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the HTTP client cannot be built.
    pub fn new(base: Url, settings: HttpSettings, session: SessionHandle) -> Result<Self, ApiError> {
        Ok(Self {
            http: settings.build_client()?,
            base,
            session,
        })
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn tasks_url(&self, user: &UserId) -> Result<Url, ApiError> {
        endpoint(&self.base, &["api", user.as_str(), "tasks"])
    }

    fn task_url(&self, user: &UserId, id: TaskId, suffix: Option<&str>) -> Result<Url, ApiError> {
        let id = id.to_string();
        let mut segments = vec!["api", user.as_str(), "tasks", id.as_str()];
        segments.extend(suffix);
        endpoint(&self.base, &segments)
    }
}

impl TaskApi for HttpTaskApi {
    async fn list(&self, user: &UserId) -> Result<Vec<Task>, ApiError> {
        let url = self.tasks_url(user)?;
        tracing::debug!(%url, "listing tasks");
        let response = execute(self.request(Method::GET, url)).await?;
        decode_json(response).await
    }

    async fn create(&self, user: &UserId, draft: &TaskCreate) -> Result<Task, ApiError> {
        let url = self.tasks_url(user)?;
        tracing::debug!(%url, "creating task");
        let response = execute(self.request(Method::POST, url).json(draft)).await?;
        decode_json(response).await
    }

    async fn update(&self, user: &UserId, id: TaskId, patch: &TaskUpdate) -> Result<Task, ApiError> {
        let url = self.task_url(user, id, None)?;
        tracing::debug!(%url, "updating task");
        let response = execute(self.request(Method::PUT, url).json(patch)).await?;
        decode_json(response).await
    }

    async fn delete(&self, user: &UserId, id: TaskId) -> Result<(), ApiError> {
        let url = self.task_url(user, id, None)?;
        tracing::debug!(%url, "deleting task");
        execute(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    async fn toggle_complete(
        &self,
        user: &UserId,
        id: TaskId,
        completed: bool,
    ) -> Result<Task, ApiError> {
        let url = self.task_url(user, id, Some("complete"))?;
        tracing::debug!(%url, completed, "toggling completion");
        let body = CompletionUpdate {
            is_completed: completed,
        };
        let response = execute(self.request(Method::PATCH, url).json(&body)).await?;
        decode_json(response).await
    }
}
