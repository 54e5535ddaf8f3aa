//! Task types exchanged with the remote task API.
//!
//! Defines the [`Task`] model returned by the server, the [`TaskCreate`]
//! and [`TaskUpdate`] request payloads, and local payload validation.
//! Display fields the client does not interpret are kept in
//! [`Task::extra`] so they survive a round trip unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Maximum allowed task title length in characters.
pub const MAX_TITLE_LENGTH: usize = 256;

/// Maximum allowed task description length in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// Server-assigned task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    /// Wraps a raw identifier returned by the server.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A task as stored by the remote API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier assigned by the server, immutable after creation.
    pub id: TaskId,
    /// Owning user, when the server echoes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Short task title.
    pub title: String,
    /// Optional free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the task has been completed.
    #[serde(default, alias = "isCompleted", alias = "completed")]
    pub is_completed: bool,
    /// Creation time reported by the server.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last modification time reported by the server.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Server-defined display fields the client passes through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    /// Builds a task with only the required fields populated.
    #[must_use]
    pub fn new(id: TaskId, title: impl Into<String>) -> Self {
        Self {
            id,
            user_id: None,
            title: title.into(),
            description: None,
            is_completed: false,
            created_at: None,
            updated_at: None,
            extra: Map::new(),
        }
    }
}

/// Errors produced by local payload validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Title is empty or whitespace only.
    #[error("task title cannot be empty")]
    TitleEmpty,
    /// Title exceeds [`MAX_TITLE_LENGTH`] characters.
    #[error("task title too long ({len} characters, max {max})")]
    TitleTooLong {
        /// Actual length in characters.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },
    /// Description exceeds [`MAX_DESCRIPTION_LENGTH`] characters.
    #[error("task description too long ({len} characters, max {max})")]
    DescriptionTooLong {
        /// Actual length in characters.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::TitleEmpty);
    }
    let len = title.chars().count();
    if len > MAX_TITLE_LENGTH {
        return Err(ValidationError::TitleTooLong {
            len,
            max: MAX_TITLE_LENGTH,
        });
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), ValidationError> {
    let len = description.chars().count();
    if len > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::DescriptionTooLong {
            len,
            max: MAX_DESCRIPTION_LENGTH,
        });
    }
    Ok(())
}

/// Payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCreate {
    /// Title of the new task.
    pub title: String,
    /// Optional description of the new task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TaskCreate {
    /// Creates a draft with a title and no description.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Checks the draft before it is sent.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the title is blank or either field
    /// exceeds its length limit.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        Ok(())
    }
}

/// Partial update of a task's mutable fields.
///
/// Fields left as `None` are not serialized and stay unchanged server-side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    /// New title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New completion state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

impl TaskUpdate {
    /// Returns `true` if the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.is_completed.is_none()
    }

    /// Checks the fields that are present.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if a present title is blank or a
    /// present field exceeds its length limit.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        Ok(())
    }

    /// Returns a copy of `task` with this patch applied.
    #[must_use]
    pub fn apply_to(&self, task: &Task) -> Task {
        let mut patched = task.clone();
        if let Some(title) = &self.title {
            patched.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            patched.description = Some(description.clone());
        }
        if let Some(done) = self.is_completed {
            patched.is_completed = done;
        }
        patched
    }
}

/// Body of the completion toggle endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionUpdate {
    /// Desired completion state.
    pub is_completed: bool,
}
