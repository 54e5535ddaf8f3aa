//! Integration tests for bulk delete and bulk completion.
//!
//! Covers concurrent fan-out, per-item reconciliation on partial failure,
//! aggregate notifications, and cancellation.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use taskdeck::api::memory::InMemoryTaskApi;
use taskdeck::api::{ApiError, TaskApi};
use taskdeck::auth::SessionHandle;
use taskdeck::tasks::{Notification, TaskError, TaskListManager};
use taskdeck_proto::auth::{User, UserId};
use taskdeck_proto::task::{Task, TaskCreate, TaskId, TaskUpdate};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn user() -> User {
    User {
        id: UserId::new("bulk-user"),
        email: "bulk@example.com".to_string(),
        name: "Bulk".to_string(),
    }
}

fn drain(rx: &mut mpsc::Receiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(n) = rx.try_recv() {
        out.push(n);
    }
    out
}

/// Wraps the in-memory backend and records how many calls overlap.
#[derive(Clone, Default)]
struct ConcurrencyGauge {
    inner: InMemoryTaskApi,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ConcurrencyGauge {
    async fn track<T>(&self, call: impl Future<Output = T>) -> T {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        // Give every sibling future a chance to start before finishing.
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        let out = call.await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        out
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl TaskApi for ConcurrencyGauge {
    async fn list(&self, user: &UserId) -> Result<Vec<Task>, ApiError> {
        self.inner.list(user).await
    }

    async fn create(&self, user: &UserId, draft: &TaskCreate) -> Result<Task, ApiError> {
        self.inner.create(user, draft).await
    }

    async fn update(&self, user: &UserId, id: TaskId, patch: &TaskUpdate) -> Result<Task, ApiError> {
        self.inner.update(user, id, patch).await
    }

    async fn delete(&self, user: &UserId, id: TaskId) -> Result<(), ApiError> {
        self.track(self.inner.delete(user, id)).await
    }

    async fn toggle_complete(
        &self,
        user: &UserId,
        id: TaskId,
        completed: bool,
    ) -> Result<Task, ApiError> {
        self.track(self.inner.toggle_complete(user, id, completed))
            .await
    }
}

/// Mutations hang forever once `stall` is set.
#[derive(Clone, Default)]
struct StallingApi {
    inner: InMemoryTaskApi,
    stall: Arc<AtomicBool>,
}

impl StallingApi {
    async fn gate(&self) {
        if self.stall.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
    }
}

impl TaskApi for StallingApi {
    async fn list(&self, user: &UserId) -> Result<Vec<Task>, ApiError> {
        self.inner.list(user).await
    }

    async fn create(&self, user: &UserId, draft: &TaskCreate) -> Result<Task, ApiError> {
        self.gate().await;
        self.inner.create(user, draft).await
    }

    async fn update(&self, user: &UserId, id: TaskId, patch: &TaskUpdate) -> Result<Task, ApiError> {
        self.gate().await;
        self.inner.update(user, id, patch).await
    }

    async fn delete(&self, user: &UserId, id: TaskId) -> Result<(), ApiError> {
        self.gate().await;
        self.inner.delete(user, id).await
    }

    async fn toggle_complete(
        &self,
        user: &UserId,
        id: TaskId,
        completed: bool,
    ) -> Result<Task, ApiError> {
        self.gate().await;
        self.inner.toggle_complete(user, id, completed).await
    }
}

/// Deletes reach the server, but their replies never arrive once `stall` is set.
#[derive(Clone, Default)]
struct LostReplyApi {
    inner: InMemoryTaskApi,
    stall: Arc<AtomicBool>,
}

impl TaskApi for LostReplyApi {
    async fn list(&self, user: &UserId) -> Result<Vec<Task>, ApiError> {
        self.inner.list(user).await
    }

    async fn create(&self, user: &UserId, draft: &TaskCreate) -> Result<Task, ApiError> {
        self.inner.create(user, draft).await
    }

    async fn update(&self, user: &UserId, id: TaskId, patch: &TaskUpdate) -> Result<Task, ApiError> {
        self.inner.update(user, id, patch).await
    }

    async fn delete(&self, user: &UserId, id: TaskId) -> Result<(), ApiError> {
        let result = self.inner.delete(user, id).await;
        if self.stall.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        result
    }

    async fn toggle_complete(
        &self,
        user: &UserId,
        id: TaskId,
        completed: bool,
    ) -> Result<Task, ApiError> {
        self.inner.toggle_complete(user, id, completed).await
    }
}

async fn loaded<A: TaskApi>(
    api: A,
) -> (TaskListManager<A>, mpsc::Receiver<Notification>) {
    let session = SessionHandle::signed_in(user(), "tok");
    let (mut mgr, rx) = TaskListManager::new(api, session, CancellationToken::new(), 32);
    mgr.load_all().await;
    (mgr, rx)
}

// ---------------------------------------------------------------------------
// Fan-out
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bulk_delete_issues_requests_concurrently() {
    let gauge = ConcurrencyGauge::default();
    let titles: Vec<String> = (0..8).map(|i| format!("t{i}")).collect();
    let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
    gauge.inner.seed(&user().id, &refs);

    let (mut mgr, mut rx) = loaded(gauge.clone()).await;
    mgr.select_all();
    let report = mgr.bulk_delete().await.unwrap();

    assert_eq!(report.succeeded.len(), 8);
    assert!(mgr.tasks().is_empty());
    assert_eq!(gauge.peak(), 8, "all deletes should be in flight together");
    assert_eq!(drain(&mut rx)[0].title, "8 tasks deleted successfully!");
}

#[tokio::test]
async fn bulk_toggle_issues_requests_concurrently() {
    let gauge = ConcurrencyGauge::default();
    gauge.inner.seed(&user().id, &["a", "b", "c"]);

    let (mut mgr, _rx) = loaded(gauge.clone()).await;
    mgr.select_all();
    mgr.bulk_toggle_complete(true).await.unwrap();

    assert_eq!(gauge.peak(), 3);
    assert!(mgr.tasks().iter().all(|t| t.is_completed));
}

// ---------------------------------------------------------------------------
// Partial failure
// ---------------------------------------------------------------------------

#[tokio::test]
async fn partial_bulk_delete_keeps_failed_tasks_selected() {
    let api = InMemoryTaskApi::new();
    let seeded = api.seed(&user().id, &["a", "b", "c", "d"]);
    api.fail_on(seeded[1].id, ApiError::Network("timeout".to_string()));
    api.fail_on(seeded[3].id, ApiError::NotFound);

    let (mut mgr, mut rx) = loaded(api.clone()).await;
    mgr.select_all();
    let report = mgr.bulk_delete().await.unwrap();

    assert_eq!(report.requested, 4);
    assert_eq!(report.succeeded.len(), 2);
    assert_eq!(report.failed.len(), 2);

    let remaining: Vec<TaskId> = mgr.tasks().iter().map(|t| t.id).collect();
    assert_eq!(remaining, [seeded[1].id, seeded[3].id]);
    assert_eq!(
        mgr.selected(),
        &HashSet::from([seeded[1].id, seeded[3].id])
    );

    let notes = drain(&mut rx);
    assert_eq!(notes.len(), 1, "exactly one aggregate notification");
    assert!(notes[0].is_error());
    assert_eq!(notes[0].title, "Failed to delete some tasks");
}

#[tokio::test]
async fn partial_bulk_toggle_merges_successes_and_clears_selection() {
    let api = InMemoryTaskApi::new();
    let seeded = api.seed(&user().id, &["a", "b", "c"]);
    api.fail_on(seeded[2].id, ApiError::Server {
        status: 500,
        message: "boom".to_string(),
    });

    let (mut mgr, mut rx) = loaded(api.clone()).await;
    mgr.select_all();
    let report = mgr.bulk_toggle_complete(true).await.unwrap();

    assert_eq!(report.succeeded.len(), 2);
    assert!(mgr.tasks()[0].is_completed);
    assert!(mgr.tasks()[1].is_completed);
    assert_eq!(mgr.tasks()[2], seeded[2]);
    assert!(mgr.selected().is_empty());

    let notes = drain(&mut rx);
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Failed to update some tasks");
    assert!(
        notes[0]
            .description
            .as_deref()
            .is_some_and(|d| d.contains("1 of 3 failed"))
    );
}

#[tokio::test]
async fn bulk_toggle_preserves_order() {
    let api = InMemoryTaskApi::new();
    let seeded = api.seed(&user().id, &["a", "b", "c", "d"]);
    let (mut mgr, _rx) = loaded(api.clone()).await;

    mgr.toggle_selection(seeded[3].id).unwrap();
    mgr.toggle_selection(seeded[1].id).unwrap();
    mgr.bulk_toggle_complete(true).await.unwrap();

    let order: Vec<TaskId> = mgr.tasks().iter().map(|t| t.id).collect();
    let seeded_order: Vec<TaskId> = seeded.iter().map(|t| t.id).collect();
    assert_eq!(order, seeded_order);
    let done: Vec<bool> = mgr.tasks().iter().map(|t| t.is_completed).collect();
    assert_eq!(done, [false, true, false, true]);
}

// ---------------------------------------------------------------------------
// Guards and cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_selection_is_rejected_without_calls() {
    let api = InMemoryTaskApi::new();
    api.seed(&user().id, &["a"]);
    let (mut mgr, mut rx) = loaded(api.clone()).await;
    let calls = api.calls();

    assert_eq!(
        mgr.bulk_toggle_complete(true).await,
        Err(TaskError::EmptySelection)
    );
    assert_eq!(mgr.bulk_delete().await, Err(TaskError::EmptySelection));
    assert_eq!(api.calls(), calls);
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn cancelled_bulk_toggle_leaves_state_untouched() {
    let api = StallingApi::default();
    let seeded = api.inner.seed(&user().id, &["a", "b"]);
    let cancel = CancellationToken::new();
    let session = SessionHandle::signed_in(user(), "tok");
    let (mut mgr, mut rx) = TaskListManager::new(api.clone(), session, cancel.clone(), 4);
    mgr.load_all().await;
    mgr.select_all();
    api.stall.store(true, Ordering::SeqCst);

    let trigger = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
    });
    let result = mgr.bulk_toggle_complete(true).await;
    trigger.await.unwrap();

    assert_eq!(result, Err(TaskError::Cancelled));
    assert_eq!(mgr.tasks(), seeded.as_slice());
    assert_eq!(mgr.selected().len(), 2);
    assert!(drain(&mut rx).is_empty());
    assert!(api.inner.tasks_of(&user().id).iter().all(|t| !t.is_completed));
}

#[tokio::test]
async fn cancelled_bulk_delete_resyncs_on_next_load() {
    let api = LostReplyApi::default();
    let seeded = api.inner.seed(&user().id, &["a", "b", "c"]);
    let cancel = CancellationToken::new();
    let session = SessionHandle::signed_in(user(), "tok");
    let (mut mgr, mut rx) = TaskListManager::new(api.clone(), session, cancel.clone(), 4);
    mgr.load_all().await;
    mgr.toggle_selection(seeded[0].id).unwrap();
    mgr.toggle_selection(seeded[2].id).unwrap();
    api.stall.store(true, Ordering::SeqCst);

    let trigger = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
    });
    let result = mgr.bulk_delete().await;
    trigger.await.unwrap();

    // The server applied both deletes, but the cancelled manager keeps its list.
    assert_eq!(result, Err(TaskError::Cancelled));
    assert_eq!(mgr.tasks(), seeded.as_slice());
    assert_eq!(mgr.selected().len(), 2);
    assert!(drain(&mut rx).is_empty());
    assert_eq!(api.inner.tasks_of(&user().id).len(), 1);

    api.stall.store(false, Ordering::SeqCst);
    let (fresh, _rx) = loaded(api.clone()).await;
    let titles: Vec<&str> = fresh.tasks().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["b"]);
    assert!(fresh.selected().is_empty());
}
