//! In-process task backend.
//!
//! [`InMemoryTaskApi`] keeps per-user task lists behind a shared lock so a
//! test can hold a clone, inject failures, and inspect what the client did.
//! It also backs `--offline` demo mode.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use taskdeck_proto::auth::UserId;
use taskdeck_proto::task::{Task, TaskCreate, TaskId, TaskUpdate};

use super::{ApiError, TaskApi};

#[derive(Debug, Default)]
struct Backend {
    /// User id -> tasks, newest first.
    tasks: HashMap<UserId, Vec<Task>>,
    next_id: i64,
    /// Ids whose mutations fail with the paired error.
    failing_ids: HashMap<TaskId, ApiError>,
    /// When set, every call fails with this error.
    fail_all: Option<ApiError>,
    calls: usize,
    deleted: HashSet<TaskId>,
}

/// Cloneable in-memory [`TaskApi`]; clones share one backend.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskApi {
    backend: Arc<Mutex<Backend>>,
    latency: Option<Duration>,
}

impl InMemoryTaskApi {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every call by `latency` before it touches the backend.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Seeds `user`'s list with tasks built from `titles`, returning them
    /// in list order.
    pub fn seed(&self, user: &UserId, titles: &[&str]) -> Vec<Task> {
        let mut backend = self.backend.lock();
        let mut created = Vec::with_capacity(titles.len());
        for title in titles {
            backend.next_id += 1;
            let mut task = Task::new(TaskId::new(backend.next_id), *title);
            task.user_id = Some(user.to_string());
            created.push(task);
        }
        backend
            .tasks
            .entry(user.clone())
            .or_default()
            .extend(created.iter().cloned());
        created
    }

    /// Makes every mutation of `id` fail with `error`.
    pub fn fail_on(&self, id: TaskId, error: ApiError) {
        self.backend.lock().failing_ids.insert(id, error);
    }

    /// Makes every call fail with `error`, or clears the failure with `None`.
    pub fn fail_all(&self, error: Option<ApiError>) {
        self.backend.lock().fail_all = error;
    }

    /// Number of API calls received so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.backend.lock().calls
    }

    /// Current server-side list for `user`.
    #[must_use]
    pub fn tasks_of(&self, user: &UserId) -> Vec<Task> {
        self.backend
            .lock()
            .tasks
            .get(user)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether `id` has been deleted server-side.
    #[must_use]
    pub fn was_deleted(&self, id: TaskId) -> bool {
        self.backend.lock().deleted.contains(&id)
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    /// Records a call and returns the injected failure for it, if any.
    fn begin(&self, target: Option<TaskId>) -> Result<(), ApiError> {
        let mut backend = self.backend.lock();
        backend.calls += 1;
        if let Some(err) = &backend.fail_all {
            return Err(err.clone());
        }
        if let Some(err) = target.and_then(|id| backend.failing_ids.get(&id)) {
            return Err(err.clone());
        }
        Ok(())
    }

    fn modify(
        &self,
        user: &UserId,
        id: TaskId,
        change: impl FnOnce(&Task) -> Task,
    ) -> Result<Task, ApiError> {
        let mut backend = self.backend.lock();
        let task = backend
            .tasks
            .get_mut(user)
            .and_then(|list| list.iter_mut().find(|t| t.id == id))
            .ok_or(ApiError::NotFound)?;
        *task = change(task);
        Ok(task.clone())
    }
}

impl TaskApi for InMemoryTaskApi {
    async fn list(&self, user: &UserId) -> Result<Vec<Task>, ApiError> {
        self.pause().await;
        self.begin(None)?;
        Ok(self.tasks_of(user))
    }

    async fn create(&self, user: &UserId, draft: &TaskCreate) -> Result<Task, ApiError> {
        self.pause().await;
        self.begin(None)?;
        let mut backend = self.backend.lock();
        backend.next_id += 1;
        let mut task = Task::new(TaskId::new(backend.next_id), draft.title.clone());
        task.description.clone_from(&draft.description);
        task.user_id = Some(user.to_string());
        backend
            .tasks
            .entry(user.clone())
            .or_default()
            .insert(0, task.clone());
        Ok(task)
    }

    async fn update(&self, user: &UserId, id: TaskId, patch: &TaskUpdate) -> Result<Task, ApiError> {
        self.pause().await;
        self.begin(Some(id))?;
        self.modify(user, id, |task| patch.apply_to(task))
    }

    async fn delete(&self, user: &UserId, id: TaskId) -> Result<(), ApiError> {
        self.pause().await;
        self.begin(Some(id))?;
        let mut backend = self.backend.lock();
        let list = backend.tasks.get_mut(user).ok_or(ApiError::NotFound)?;
        let before = list.len();
        list.retain(|t| t.id != id);
        if list.len() == before {
            return Err(ApiError::NotFound);
        }
        backend.deleted.insert(id);
        Ok(())
    }

    async fn toggle_complete(
        &self,
        user: &UserId,
        id: TaskId,
        completed: bool,
    ) -> Result<Task, ApiError> {
        self.pause().await;
        self.begin(Some(id))?;
        self.modify(user, id, |task| {
            let mut updated = task.clone();
            updated.is_completed = completed;
            updated
        })
    }
}
