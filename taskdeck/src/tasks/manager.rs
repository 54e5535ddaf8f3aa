//! Task list manager for a signed-in user's session.
//!
//! `TaskListManager` owns the in-memory task collection and selection set,
//! performs every mutation through a [`TaskApi`], and reports outcomes on
//! a [`Notification`] channel in addition to its return values.

use std::collections::HashSet;

use futures_util::future::join_all;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use taskdeck_proto::auth::UserId;
use taskdeck_proto::task::{Task, TaskCreate, TaskId, TaskUpdate};

use super::reconcile;
use super::{BulkReport, Notification, TaskError, TaskSnapshot, count_label};
use crate::api::{ApiError, TaskApi, cancellable};
use crate::auth::SessionHandle;

/// Manages one user's task list for the lifetime of a session.
///
/// All state changes happen after the relevant network calls settle, so
/// the collection only ever moves between consistent states. The
/// manager is discarded on sign-out.
pub struct TaskListManager<A: TaskApi> {
    api: A,
    session: SessionHandle,
    /// Tasks in display order (newest first unless reordered).
    tasks: Vec<Task>,
    /// Multi-select set; always a subset of the ids in `tasks`.
    selected: HashSet<TaskId>,
    loading: bool,
    last_error: Option<ApiError>,
    /// Aborts in-flight calls when the session ends.
    cancel: CancellationToken,
    notify_tx: mpsc::Sender<Notification>,
}

impl<A: TaskApi> TaskListManager<A> {
    /// Creates an empty manager.
    ///
    /// Returns the manager and a receiver for the [`Notification`]s it
    /// emits. Notifications are dropped (and logged) if the receiver
    /// falls more than `notify_buffer` behind.
    pub fn new(
        api: A,
        session: SessionHandle,
        cancel: CancellationToken,
        notify_buffer: usize,
    ) -> (Self, mpsc::Receiver<Notification>) {
        let (notify_tx, notify_rx) = mpsc::channel(notify_buffer.max(1));
        let manager = Self {
            api,
            session,
            tasks: Vec::new(),
            selected: HashSet::new(),
            loading: false,
            last_error: None,
            cancel,
            notify_tx,
        };
        (manager, notify_rx)
    }

    /// Tasks in display order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Currently selected task ids.
    #[must_use]
    pub const fn selected(&self) -> &HashSet<TaskId> {
        &self.selected
    }

    /// Whether a full load is in progress.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Error of the most recent failed load, cleared by a successful one.
    #[must_use]
    pub const fn last_error(&self) -> Option<&ApiError> {
        self.last_error.as_ref()
    }

    /// The token that aborts this manager's in-flight calls.
    #[must_use]
    pub const fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Copies the current state for rendering.
    #[must_use]
    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            tasks: self.tasks.clone(),
            selected: self.selected.clone(),
            loading: self.loading,
            last_error: self.last_error.clone(),
        }
    }

    fn require_user(&self) -> Result<UserId, TaskError> {
        self.session
            .current_user_id()
            .ok_or(TaskError::NotAuthenticated)
    }

    fn notify(&self, notification: Notification) {
        if let Err(e) = self.notify_tx.try_send(notification) {
            tracing::warn!(error = %e, "dropping task notification");
        }
    }

    /// Emits a failure notification unless the call was cancelled.
    fn notify_failure(&self, title: &str, err: &ApiError) {
        if matches!(err, ApiError::Cancelled) {
            return;
        }
        self.notify(Notification::error(title).with_description(err.to_string()));
    }

    /// Fetches the full task list, replacing the local one on success.
    ///
    /// On failure the previous list stays visible and the error is kept
    /// in [`last_error`](Self::last_error). Does nothing when signed out.
    pub async fn load_all(&mut self) {
        let Some(user) = self.session.current_user_id() else {
            tracing::debug!("load skipped: not signed in");
            return;
        };

        self.loading = true;
        let result = cancellable(&self.cancel, self.api.list(&user)).await;
        self.loading = false;

        match result {
            Ok(tasks) => {
                tracing::info!(user_id = %user, count = tasks.len(), "tasks loaded");
                self.tasks = tasks;
                self.last_error = None;
                let present: HashSet<TaskId> = self.tasks.iter().map(|t| t.id).collect();
                self.selected.retain(|id| present.contains(id));
            }
            Err(ApiError::Cancelled) => {
                tracing::debug!("load cancelled");
            }
            Err(e) => {
                tracing::warn!(user_id = %user, error = %e, "failed to load tasks");
                self.last_error = Some(e);
            }
        }
    }

    /// Creates a task and puts it at the head of the list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Validation`] for an invalid draft,
    /// [`TaskError::Api`] if the API call fails, or
    /// [`TaskError::NotAuthenticated`] when signed out. The list is
    /// unchanged on error.
    pub async fn create(&mut self, draft: TaskCreate) -> Result<Task, TaskError> {
        let user = self.require_user()?;
        draft.validate()?;

        match cancellable(&self.cancel, self.api.create(&user, &draft)).await {
            Ok(task) => {
                tracing::info!(task_id = %task.id, "task created");
                self.tasks.insert(0, task.clone());
                self.notify(
                    Notification::success("Task created successfully!")
                        .with_description(draft.title),
                );
                Ok(task)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to create task");
                self.notify_failure("Failed to create task", &e);
                Err(TaskError::from_api(e))
            }
        }
    }

    /// Applies `patch` to a task, keeping its position in the list.
    ///
    /// If the task is no longer in the local list the server result is
    /// returned but not inserted.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Validation`] for an invalid patch,
    /// [`TaskError::Api`] if the API call fails (after a failure
    /// notification), or [`TaskError::NotAuthenticated`] when signed out.
    pub async fn update(&mut self, id: TaskId, patch: TaskUpdate) -> Result<Task, TaskError> {
        let user = self.require_user()?;
        patch.validate()?;

        match cancellable(&self.cancel, self.api.update(&user, id, &patch)).await {
            Ok(task) => {
                self.replace_local(task.clone());
                self.notify(Notification::success("Task updated successfully!"));
                Ok(task)
            }
            Err(e) => {
                tracing::warn!(task_id = %id, error = %e, "failed to update task");
                self.notify_failure("Failed to update task", &e);
                Err(TaskError::from_api(e))
            }
        }
    }

    /// Deletes a task and drops it from the selection.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Api`] if the API call fails (after a failure
    /// notification), or [`TaskError::NotAuthenticated`] when signed out.
    pub async fn delete(&mut self, id: TaskId) -> Result<(), TaskError> {
        let user = self.require_user()?;

        match cancellable(&self.cancel, self.api.delete(&user, id)).await {
            Ok(()) => {
                self.tasks.retain(|t| t.id != id);
                self.selected.remove(&id);
                tracing::info!(task_id = %id, "task deleted");
                self.notify(Notification::success("Task deleted successfully!"));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(task_id = %id, error = %e, "failed to delete task");
                self.notify_failure("Failed to delete task", &e);
                Err(TaskError::from_api(e))
            }
        }
    }

    /// Sets a task's completion state, keeping its position in the list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Api`] if the API call fails (after a failure
    /// notification), or [`TaskError::NotAuthenticated`] when signed out.
    pub async fn toggle_complete(&mut self, id: TaskId, completed: bool) -> Result<Task, TaskError> {
        let user = self.require_user()?;

        match cancellable(&self.cancel, self.api.toggle_complete(&user, id, completed)).await {
            Ok(task) => {
                self.replace_local(task.clone());
                let title = if completed {
                    "Task completed!"
                } else {
                    "Task marked as incomplete"
                };
                self.notify(Notification::success(title));
                Ok(task)
            }
            Err(e) => {
                tracing::warn!(task_id = %id, error = %e, "failed to toggle completion");
                self.notify_failure("Failed to update task", &e);
                Err(TaskError::from_api(e))
            }
        }
    }

    fn replace_local(&mut self, task: Task) {
        let id = task.id;
        if !reconcile::replace_by_id(&mut self.tasks, task) {
            tracing::warn!(task_id = %id, "updated task is no longer in the local list");
        }
    }

    /// Adds `id` to the selection, or removes it if already selected.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotFoundLocal`] if no task in the list has
    /// this id; the selection is unchanged.
    pub fn toggle_selection(&mut self, id: TaskId) -> Result<(), TaskError> {
        if !self.tasks.iter().any(|t| t.id == id) {
            return Err(TaskError::NotFoundLocal(id));
        }
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
        Ok(())
    }

    /// Selects every task in the list.
    pub fn select_all(&mut self) {
        self.selected = self.tasks.iter().map(|t| t.id).collect();
    }

    /// Clears the selection.
    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    fn bulk_targets(&self) -> Result<(UserId, Vec<TaskId>), TaskError> {
        let user = self.require_user()?;
        if self.selected.is_empty() {
            return Err(TaskError::EmptySelection);
        }
        let mut ids: Vec<TaskId> = self.selected.iter().copied().collect();
        ids.sort_unstable();
        Ok((user, ids))
    }

    /// Deletes every selected task concurrently.
    ///
    /// All requests are joined before the list changes. Tasks whose delete
    /// succeeded are removed from the list and the selection; tasks whose
    /// delete failed stay in both. A single aggregate notification is
    /// emitted. Request failures are reported in the [`BulkReport`], not
    /// as an error.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotAuthenticated`] when signed out,
    /// [`TaskError::EmptySelection`] when nothing is selected, or
    /// [`TaskError::Cancelled`] if the session ended mid-flight. Nothing
    /// local is changed then, even for deletes the server already applied;
    /// the list only catches up on the next session's [`Self::load_all`].
    pub async fn bulk_delete(&mut self) -> Result<BulkReport, TaskError> {
        let (user, ids) = self.bulk_targets()?;
        let count = ids.len();
        tracing::info!(count, "bulk delete started");

        let api = &self.api;
        let cancel = &self.cancel;
        let user = &user;
        let outcomes = join_all(ids.into_iter().map(|id| async move {
            (id, cancellable(cancel, api.delete(user, id)).await)
        }))
        .await;

        if self.cancel.is_cancelled() {
            tracing::debug!("bulk delete cancelled");
            return Err(TaskError::Cancelled);
        }

        let mut report = BulkReport {
            requested: count,
            ..BulkReport::default()
        };
        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => report.succeeded.push(id),
                Err(e) => report.failed.push((id, e)),
            }
        }

        let removed: HashSet<TaskId> = report.succeeded.iter().copied().collect();
        reconcile::remove_ids(&mut self.tasks, &removed);
        self.selected.retain(|id| !removed.contains(id));

        if report.is_complete_success() {
            tracing::info!(count, "bulk delete succeeded");
            self.notify(Notification::success(format!(
                "{} deleted successfully!",
                count_label(count)
            )));
        } else {
            tracing::warn!(
                failed = report.failed.len(),
                requested = count,
                "bulk delete partially failed"
            );
            self.notify(
                Notification::error("Failed to delete some tasks")
                    .with_description(failure_summary(&report)),
            );
        }
        Ok(report)
    }

    /// Sets the completion state of every selected task concurrently.
    ///
    /// All requests are joined before the list changes. Each task returned
    /// by the server replaces its local counterpart; tasks whose request
    /// failed keep their previous state. The selection is cleared either
    /// way, and a single aggregate notification is emitted.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotAuthenticated`] when signed out,
    /// [`TaskError::EmptySelection`] when nothing is selected, or
    /// [`TaskError::Cancelled`] if the session ended mid-flight. Results
    /// the server already applied are discarded until the next session's
    /// [`Self::load_all`].
    pub async fn bulk_toggle_complete(&mut self, completed: bool) -> Result<BulkReport, TaskError> {
        let (user, ids) = self.bulk_targets()?;
        let count = ids.len();
        tracing::info!(count, completed, "bulk completion started");

        let api = &self.api;
        let cancel = &self.cancel;
        let user = &user;
        let outcomes = join_all(ids.into_iter().map(|id| async move {
            (
                id,
                cancellable(cancel, api.toggle_complete(user, id, completed)).await,
            )
        }))
        .await;

        if self.cancel.is_cancelled() {
            tracing::debug!("bulk completion cancelled");
            return Err(TaskError::Cancelled);
        }

        let mut report = BulkReport {
            requested: count,
            ..BulkReport::default()
        };
        let mut updated = Vec::with_capacity(count);
        for (id, outcome) in outcomes {
            match outcome {
                Ok(task) => {
                    report.succeeded.push(id);
                    updated.push(task);
                }
                Err(e) => report.failed.push((id, e)),
            }
        }

        reconcile::merge_updated(&mut self.tasks, updated);
        self.selected.clear();

        if report.is_complete_success() {
            let state = if completed { "complete" } else { "incomplete" };
            self.notify(Notification::success(format!(
                "{} marked as {state}!",
                count_label(count)
            )));
        } else {
            tracing::warn!(
                failed = report.failed.len(),
                requested = count,
                "bulk completion partially failed"
            );
            self.notify(
                Notification::error("Failed to update some tasks")
                    .with_description(failure_summary(&report)),
            );
        }
        Ok(report)
    }

    /// Replaces the list with a caller-supplied ordering. No network call.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::InvalidOrder`] if `new_order` is not a
    /// permutation of the current list; the list is left as it was.
    pub fn reorder(&mut self, new_order: Vec<Task>) -> Result<(), TaskError> {
        if !reconcile::is_permutation(&self.tasks, &new_order) {
            tracing::warn!(
                current = self.tasks.len(),
                proposed = new_order.len(),
                "rejected stale reorder"
            );
            return Err(TaskError::InvalidOrder);
        }
        self.tasks = new_order;
        Ok(())
    }

    /// Moves one task `delta` places (negative is up) within the current
    /// list, clamped to its bounds. No network call.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotFoundLocal`] if `id` is not in the list.
    pub fn move_task(&mut self, id: TaskId, delta: isize) -> Result<(), TaskError> {
        if !self.tasks.iter().any(|t| t.id == id) {
            return Err(TaskError::NotFoundLocal(id));
        }
        if let Some(order) = reconcile::move_by(&self.tasks, id, delta) {
            self.tasks = order;
        }
        Ok(())
    }
}

/// "2 of 5 failed: network failure: ..." using the first failure.
fn failure_summary(report: &BulkReport) -> String {
    let failed = report.failed.len();
    match report.failed.first() {
        Some((_, first)) => format!("{failed} of {} failed: {first}", report.requested),
        None => format!("{failed} of {} failed", report.requested),
    }
}
