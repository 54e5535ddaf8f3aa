//! Remote task API boundary.
//!
//! Defines the [`TaskApi`] trait that every task backend must satisfy and
//! the structured [`ApiError`] it reports. Implementations:
//! - [`http::HttpTaskApi`]: the REST API over reqwest
//! - [`memory::InMemoryTaskApi`]: in-process backend for tests and offline mode

pub mod http;
pub mod memory;

use std::future::Future;

use tokio_util::sync::CancellationToken;

use taskdeck_proto::auth::UserId;
use taskdeck_proto::task::{Task, TaskCreate, TaskId, TaskUpdate};

/// Errors reported by an API backend.
///
/// Each variant is a distinct failure kind so callers dispatch on the
/// variant instead of inspecting message text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request could not complete (connection refused, timeout, DNS).
    #[error("network failure: {0}")]
    Network(String),

    /// The server rejected the payload.
    #[error("request rejected ({status}): {message}")]
    Validation {
        /// HTTP status code.
        status: u16,
        /// Server-provided reason.
        message: String,
    },

    /// Missing, expired, or invalid credentials.
    #[error("not authorized: {0}")]
    Unauthorized(String),

    /// The addressed resource does not exist server-side.
    #[error("resource not found")]
    NotFound,

    /// The request conflicts with existing state (e.g. duplicate account).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other non-success status.
    #[error("server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Server-provided reason.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The call was aborted by session teardown.
    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    /// Maps a non-success HTTP status and its message to an error kind.
    #[must_use]
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            400 | 422 => Self::Validation { status, message },
            401 | 403 => Self::Unauthorized(message),
            404 => Self::NotFound,
            409 => Self::Conflict(message),
            _ => Self::Server { status, message },
        }
    }
}

/// Async interface of the remote task API.
///
/// Every call is scoped by the owning user's id. Implementations must not
/// retry; a failed request is reported immediately.
pub trait TaskApi: Send + Sync {
    /// Fetch every task owned by `user`.
    fn list(&self, user: &UserId) -> impl Future<Output = Result<Vec<Task>, ApiError>> + Send;

    /// Create a task and return it with its server-assigned id.
    fn create(
        &self,
        user: &UserId,
        draft: &TaskCreate,
    ) -> impl Future<Output = Result<Task, ApiError>> + Send;

    /// Apply a partial update and return the updated task.
    fn update(
        &self,
        user: &UserId,
        id: TaskId,
        patch: &TaskUpdate,
    ) -> impl Future<Output = Result<Task, ApiError>> + Send;

    /// Delete a task.
    fn delete(&self, user: &UserId, id: TaskId) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Set a task's completion state and return the updated task.
    fn toggle_complete(
        &self,
        user: &UserId,
        id: TaskId,
        completed: bool,
    ) -> impl Future<Output = Result<Task, ApiError>> + Send;
}

/// Runs `call` unless `cancel` fires first.
///
/// # Errors
///
/// Returns [`ApiError::Cancelled`] if the token is cancelled before the
/// call settles, otherwise whatever `call` returns.
pub async fn cancellable<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ApiError::Cancelled),
        result = call => result,
    }
}
