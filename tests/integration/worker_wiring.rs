//! Integration tests for the command/event worker that sits between the
//! TUI and the task manager.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use taskdeck::api::ApiError;
use taskdeck::api::memory::InMemoryTaskApi;
use taskdeck::auth::SessionHandle;
use taskdeck::tasks::{TaskError, TaskListManager, TaskSnapshot, reconcile};
use taskdeck::worker::{OpKind, TaskCommand, WorkerEvent, spawn_worker};
use taskdeck_proto::auth::{User, UserId};
use taskdeck_proto::task::{MAX_TITLE_LENGTH, TaskCreate};

fn kim() -> User {
    User {
        id: UserId::new("u-kim"),
        email: "kim@example.com".to_string(),
        name: "Kim".to_string(),
    }
}

struct Harness {
    tx: mpsc::Sender<TaskCommand>,
    rx: mpsc::Receiver<WorkerEvent>,
    cancel: CancellationToken,
}

impl Harness {
    fn start(api: &InMemoryTaskApi) -> Self {
        let cancel = CancellationToken::new();
        let session = SessionHandle::signed_in(kim(), "tok");
        let (mgr, notes) = TaskListManager::new(api.clone(), session, cancel.clone(), 16);
        let (tx, rx) = spawn_worker(mgr, notes, 32);
        Self { tx, rx, cancel }
    }

    async fn send(&self, cmd: TaskCommand) {
        self.tx.send(cmd).await.unwrap();
    }

    async fn next(&mut self) -> WorkerEvent {
        timeout(Duration::from_secs(5), self.rx.recv())
            .await
            .expect("worker stalled")
            .expect("worker exited")
    }

    /// Events up to and including the outcome of the current command.
    async fn settle(&mut self) -> Vec<WorkerEvent> {
        let mut events = Vec::new();
        loop {
            let event = self.next().await;
            let done = matches!(
                event,
                WorkerEvent::Completed { .. } | WorkerEvent::Failed { .. }
            );
            events.push(event);
            if done {
                return events;
            }
        }
    }
}

fn last_snapshot(events: &[WorkerEvent]) -> &TaskSnapshot {
    events
        .iter()
        .rev()
        .find_map(|e| match e {
            WorkerEvent::Snapshot(s) => Some(s),
            _ => None,
        })
        .expect("no snapshot")
}

#[tokio::test]
async fn commands_are_processed_in_order() {
    let api = InMemoryTaskApi::new();
    api.seed(&kim().id, &["first"]);
    let mut h = Harness::start(&api);

    h.send(TaskCommand::Load).await;
    h.send(TaskCommand::Create(TaskCreate::new("second"))).await;
    h.send(TaskCommand::SelectAll).await;

    let load = h.settle().await;
    assert!(matches!(load[0], WorkerEvent::Loading));
    assert_eq!(last_snapshot(&load).tasks.len(), 1);

    let create = h.settle().await;
    assert!(matches!(
        create.as_slice(),
        [
            WorkerEvent::Notification(_),
            WorkerEvent::Snapshot(_),
            WorkerEvent::Completed { op: OpKind::Create }
        ]
    ));
    assert_eq!(last_snapshot(&create).tasks[0].title, "second");

    let select = h.settle().await;
    assert!(last_snapshot(&select).all_selected());
}

#[tokio::test]
async fn invalid_create_fails_without_notification() {
    let api = InMemoryTaskApi::new();
    let mut h = Harness::start(&api);

    h.send(TaskCommand::Create(TaskCreate::new(
        "x".repeat(MAX_TITLE_LENGTH + 1),
    )))
    .await;
    let events = h.settle().await;

    assert!(
        !events
            .iter()
            .any(|e| matches!(e, WorkerEvent::Notification(_)))
    );
    match events.last() {
        Some(WorkerEvent::Failed { op, error }) => {
            assert_eq!(*op, OpKind::Create);
            assert!(matches!(error, TaskError::Validation(_)));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(api.calls(), 0);
}

#[tokio::test]
async fn api_failure_emits_notification_and_failed_outcome() {
    let api = InMemoryTaskApi::new();
    api.fail_all(Some(ApiError::Network("offline".to_string())));
    let mut h = Harness::start(&api);

    h.send(TaskCommand::Create(TaskCreate::new("nope"))).await;
    let events = h.settle().await;

    match &events[0] {
        WorkerEvent::Notification(n) => {
            assert!(n.is_error());
            assert_eq!(n.title, "Failed to create task");
        }
        other => panic!("expected notification, got {other:?}"),
    }
    assert!(matches!(
        events.last(),
        Some(WorkerEvent::Failed {
            op: OpKind::Create,
            error: TaskError::Api(ApiError::Network(_)),
        })
    ));
}

#[tokio::test]
async fn bulk_commands_flow_through_worker() {
    let api = InMemoryTaskApi::new();
    api.seed(&kim().id, &["a", "b", "c"]);
    let mut h = Harness::start(&api);

    h.send(TaskCommand::Load).await;
    h.settle().await;
    h.send(TaskCommand::SelectAll).await;
    h.settle().await;
    h.send(TaskCommand::BulkToggleComplete { completed: true })
        .await;
    let toggled = h.settle().await;
    let snap = last_snapshot(&toggled);
    assert!(snap.tasks.iter().all(|t| t.is_completed));
    assert!(snap.selected.is_empty());

    h.send(TaskCommand::BulkDelete).await;
    match h.settle().await.last() {
        Some(WorkerEvent::Failed { op, error }) => {
            assert_eq!(*op, OpKind::BulkDelete);
            assert_eq!(*error, TaskError::EmptySelection);
        }
        other => panic!("expected empty selection, got {other:?}"),
    }
}

#[tokio::test]
async fn stale_reorder_after_delete_is_rejected_and_worker_keeps_running() {
    let api = InMemoryTaskApi::new();
    let seeded = api.seed(&kim().id, &["A", "B", "C"]);
    let mut h = Harness::start(&api);

    h.send(TaskCommand::Load).await;
    h.settle().await;

    // The UI built this order before the delete reached the worker.
    let stale = reconcile::move_by(&seeded, seeded[1].id, 1).unwrap();
    h.send(TaskCommand::Delete(seeded[0].id)).await;
    h.send(TaskCommand::Reorder(stale)).await;

    h.settle().await;
    let rejected = h.settle().await;
    let titles: Vec<&str> = last_snapshot(&rejected)
        .tasks
        .iter()
        .map(|t| t.title.as_str())
        .collect();
    assert_eq!(titles, ["B", "C"]);
    assert!(matches!(
        rejected.last(),
        Some(WorkerEvent::Failed {
            op: OpKind::Reorder,
            error: TaskError::InvalidOrder,
        })
    ));

    // The worker is still alive and moves apply to its current list.
    h.send(TaskCommand::Move {
        id: seeded[1].id,
        delta: 1,
    })
    .await;
    let moved = h.settle().await;
    let titles: Vec<&str> = last_snapshot(&moved)
        .tasks
        .iter()
        .map(|t| t.title.as_str())
        .collect();
    assert_eq!(titles, ["C", "B"]);
}

#[tokio::test]
async fn queued_moves_accumulate() {
    let api = InMemoryTaskApi::new();
    let seeded = api.seed(&kim().id, &["A", "B", "C"]);
    let mut h = Harness::start(&api);

    h.send(TaskCommand::Load).await;
    h.send(TaskCommand::Move {
        id: seeded[0].id,
        delta: 1,
    })
    .await;
    h.send(TaskCommand::Move {
        id: seeded[0].id,
        delta: 1,
    })
    .await;

    h.settle().await;
    h.settle().await;
    let last = h.settle().await;
    let titles: Vec<&str> = last_snapshot(&last)
        .tasks
        .iter()
        .map(|t| t.title.as_str())
        .collect();
    assert_eq!(titles, ["B", "C", "A"]);
}

#[tokio::test]
async fn cancelling_the_token_stops_the_worker() {
    let api = InMemoryTaskApi::new();
    let mut h = Harness::start(&api);

    h.cancel.cancel();
    let closed = timeout(Duration::from_secs(5), h.rx.recv()).await.unwrap();
    assert!(closed.is_none());
    assert!(h.tx.send(TaskCommand::Load).await.is_err());
}

#[tokio::test]
async fn dropping_the_sender_stops_the_worker() {
    let api = InMemoryTaskApi::new();
    let Harness { tx, mut rx, .. } = Harness::start(&api);

    drop(tx);
    let closed = timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
    assert!(closed.is_none());
}
