//! Background worker wiring the TUI to the task manager.
//!
//! The worker owns a [`TaskListManager`] inside a tokio task and is the
//! only code that mutates it. The TUI main loop sends [`TaskCommand`]s and
//! drains [`WorkerEvent`]s on each tick.
//!
//! ```text
//! TUI (main thread)  <── WorkerEvent ───  worker task (owns the manager)
//!                    ─── TaskCommand ──>
//! ```

use tokio::sync::mpsc;

use taskdeck_proto::task::{Task, TaskCreate, TaskId, TaskUpdate};

use crate::api::TaskApi;
use crate::tasks::{Notification, TaskError, TaskListManager, TaskSnapshot};

/// Requests from the TUI, processed strictly in order.
#[derive(Debug)]
pub enum TaskCommand {
    /// Fetch the full list.
    Load,
    /// Create a task.
    Create(TaskCreate),
    /// Patch a task.
    Update {
        /// Target task.
        id: TaskId,
        /// Fields to change.
        patch: TaskUpdate,
    },
    /// Delete a task.
    Delete(TaskId),
    /// Set one task's completion state.
    ToggleComplete {
        /// Target task.
        id: TaskId,
        /// New state.
        completed: bool,
    },
    /// Flip one task's selection.
    ToggleSelection(TaskId),
    /// Select every task.
    SelectAll,
    /// Clear the selection.
    DeselectAll,
    /// Delete every selected task.
    BulkDelete,
    /// Set the completion state of every selected task.
    BulkToggleComplete {
        /// New state.
        completed: bool,
    },
    /// Replace the display order with a full permutation of the list.
    Reorder(Vec<Task>),
    /// Move one task within whatever the list is when the command runs.
    Move {
        /// Task to move.
        id: TaskId,
        /// Places to move; negative is up.
        delta: isize,
    },
    /// Stop the worker.
    Shutdown,
}

/// Which command an outcome event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    /// [`TaskCommand::Load`].
    Load,
    /// [`TaskCommand::Create`].
    Create,
    /// [`TaskCommand::Update`].
    Update,
    /// [`TaskCommand::Delete`].
    Delete,
    /// [`TaskCommand::ToggleComplete`].
    ToggleComplete,
    /// Any of the selection commands.
    Selection,
    /// [`TaskCommand::BulkDelete`].
    BulkDelete,
    /// [`TaskCommand::BulkToggleComplete`].
    BulkToggleComplete,
    /// [`TaskCommand::Reorder`] or [`TaskCommand::Move`].
    Reorder,
}

/// Events published to the TUI.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// A full load started.
    Loading,
    /// Manager state after a command settled.
    Snapshot(TaskSnapshot),
    /// An outcome notification from the manager.
    Notification(Notification),
    /// A command succeeded.
    Completed {
        /// The command that finished.
        op: OpKind,
    },
    /// A command failed; the manager state is unchanged for that command.
    Failed {
        /// The command that failed.
        op: OpKind,
        /// Why.
        error: TaskError,
    },
}

/// Spawns the worker task and returns its channel handles.
///
/// `notifications` is the receiver returned by [`TaskListManager::new`].
/// The task exits on [`TaskCommand::Shutdown`], when the command sender is
/// dropped, when the event receiver is dropped, or when the manager's
/// cancellation token fires.
pub fn spawn_worker<A>(
    manager: TaskListManager<A>,
    notifications: mpsc::Receiver<Notification>,
    capacity: usize,
) -> (mpsc::Sender<TaskCommand>, mpsc::Receiver<WorkerEvent>)
where
    A: TaskApi + 'static,
{
    let capacity = capacity.max(1);
    let (cmd_tx, cmd_rx) = mpsc::channel(capacity);
    let (evt_tx, evt_rx) = mpsc::channel(capacity);

    tokio::spawn(async move {
        run(manager, notifications, cmd_rx, evt_tx).await;
    });

    (cmd_tx, evt_rx)
}

async fn run<A: TaskApi>(
    mut manager: TaskListManager<A>,
    mut notifications: mpsc::Receiver<Notification>,
    mut cmd_rx: mpsc::Receiver<TaskCommand>,
    evt_tx: mpsc::Sender<WorkerEvent>,
) {
    let cancel = manager.cancel_token().clone();
    loop {
        let cmd = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!("task worker cancelled");
                break;
            }
            cmd = cmd_rx.recv() => cmd,
        };
        let Some(cmd) = cmd else {
            tracing::debug!("command channel closed");
            break;
        };
        if matches!(cmd, TaskCommand::Shutdown) {
            tracing::info!("task worker shutting down");
            break;
        }

        if matches!(cmd, TaskCommand::Load) && evt_tx.send(WorkerEvent::Loading).await.is_err() {
            break;
        }

        let outcome = execute(&mut manager, cmd).await;

        let mut events = Vec::new();
        while let Ok(note) = notifications.try_recv() {
            events.push(WorkerEvent::Notification(note));
        }
        events.push(WorkerEvent::Snapshot(manager.snapshot()));
        if let Some(outcome) = outcome {
            events.push(outcome);
        }

        for event in events {
            if evt_tx.send(event).await.is_err() {
                tracing::debug!("event receiver dropped");
                return;
            }
        }
    }
}

/// Applies one command, returning its outcome event.
///
/// Cancelled operations produce no outcome.
async fn execute<A: TaskApi>(
    manager: &mut TaskListManager<A>,
    cmd: TaskCommand,
) -> Option<WorkerEvent> {
    let (op, result) = match cmd {
        TaskCommand::Load => {
            manager.load_all().await;
            (OpKind::Load, Ok(()))
        }
        TaskCommand::Create(draft) => (OpKind::Create, manager.create(draft).await.map(drop)),
        TaskCommand::Update { id, patch } => {
            (OpKind::Update, manager.update(id, patch).await.map(drop))
        }
        TaskCommand::Delete(id) => (OpKind::Delete, manager.delete(id).await),
        TaskCommand::ToggleComplete { id, completed } => (
            OpKind::ToggleComplete,
            manager.toggle_complete(id, completed).await.map(drop),
        ),
        TaskCommand::ToggleSelection(id) => (OpKind::Selection, manager.toggle_selection(id)),
        TaskCommand::SelectAll => {
            manager.select_all();
            (OpKind::Selection, Ok(()))
        }
        TaskCommand::DeselectAll => {
            manager.deselect_all();
            (OpKind::Selection, Ok(()))
        }
        TaskCommand::BulkDelete => (OpKind::BulkDelete, manager.bulk_delete().await.map(drop)),
        TaskCommand::BulkToggleComplete { completed } => (
            OpKind::BulkToggleComplete,
            manager.bulk_toggle_complete(completed).await.map(drop),
        ),
        TaskCommand::Reorder(order) => (OpKind::Reorder, manager.reorder(order)),
        TaskCommand::Move { id, delta } => (OpKind::Reorder, manager.move_task(id, delta)),
        TaskCommand::Shutdown => return None,
    };

    match result {
        Ok(()) => Some(WorkerEvent::Completed { op }),
        Err(TaskError::Cancelled) => None,
        Err(error) => {
            tracing::debug!(?op, error = %error, "command failed");
            Some(WorkerEvent::Failed { op, error })
        }
    }
}
