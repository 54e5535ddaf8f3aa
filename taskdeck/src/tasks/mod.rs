//! Task list session state.
//!
//! Holds the signed-in user's task collection and multi-select set in
//! memory, mediating every mutation through the remote [`TaskApi`] and
//! folding server responses back into the local list.
//!
//! [`TaskApi`]: crate::api::TaskApi

pub mod manager;
pub mod reconcile;

use std::collections::HashSet;

use thiserror::Error;

use taskdeck_proto::task::{Task, TaskId, ValidationError};

use crate::api::ApiError;

pub use manager::TaskListManager;

/// Errors returned by [`TaskListManager`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// The remote API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The payload was rejected locally before any network call.
    #[error("invalid task: {0}")]
    Validation(#[from] ValidationError),
    /// The task is not in the local collection.
    #[error("task {0} is not in the list")]
    NotFoundLocal(TaskId),
    /// No user is signed in; nothing was sent.
    #[error("not signed in")]
    NotAuthenticated,
    /// A new ordering does not hold exactly the tasks in the list.
    #[error("new order does not match the current list")]
    InvalidOrder,
    /// A bulk operation was requested with nothing selected.
    #[error("no tasks selected")]
    EmptySelection,
    /// The session ended while the call was in flight.
    #[error("operation cancelled")]
    Cancelled,
}

impl TaskError {
    /// Lifts an API error, folding cancellation into [`TaskError::Cancelled`].
    #[must_use]
    pub fn from_api(err: ApiError) -> Self {
        match err {
            ApiError::Cancelled => Self::Cancelled,
            other => Self::Api(other),
        }
    }
}

/// Whether a notification reports success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// The operation succeeded.
    Success,
    /// The operation failed.
    Error,
}

/// User-visible outcome of a network operation.
///
/// Emitted on the manager's notification channel alongside the
/// operation's own return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Success or failure.
    pub kind: NotificationKind,
    /// Headline, e.g. "Task created successfully!".
    pub title: String,
    /// Optional detail line.
    pub description: Option<String>,
}

impl Notification {
    /// A success notification.
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: title.into(),
            description: None,
        }
    }

    /// A failure notification.
    pub fn error(title: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: title.into(),
            description: None,
        }
    }

    /// Adds a detail line.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether this reports a failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }
}

/// Per-item outcome of a bulk operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    /// Number of requests issued.
    pub requested: usize,
    /// Ids whose request succeeded.
    pub succeeded: Vec<TaskId>,
    /// Ids whose request failed, with the reason.
    pub failed: Vec<(TaskId, ApiError)>,
}

impl BulkReport {
    /// Whether every request succeeded.
    #[must_use]
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty() && self.succeeded.len() == self.requested
    }
}

/// Read-only copy of the manager's state for the presentation layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskSnapshot {
    /// Tasks in display order.
    pub tasks: Vec<Task>,
    /// Currently selected ids.
    pub selected: HashSet<TaskId>,
    /// Whether a full load is in progress.
    pub loading: bool,
    /// Error of the most recent failed load.
    pub last_error: Option<ApiError>,
}

impl TaskSnapshot {
    /// Whether every task is selected (and there is at least one).
    #[must_use]
    pub fn all_selected(&self) -> bool {
        !self.tasks.is_empty() && self.selected.len() == self.tasks.len()
    }
}

/// "1 task" / "3 tasks".
#[must_use]
pub fn count_label(count: usize) -> String {
    if count == 1 {
        "1 task".to_string()
    } else {
        format!("{count} tasks")
    }
}
