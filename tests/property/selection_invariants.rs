//! Property tests for the task list manager's selection and ordering.
//!
//! Uses proptest to verify, over random operation sequences with random
//! server failures:
//! 1. The selection is always a subset of the listed task ids.
//! 2. Task ids in the list stay unique.
//! 3. Reordering only ever permutes the list.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::HashSet;

use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

use taskdeck::api::ApiError;
use taskdeck::api::memory::InMemoryTaskApi;
use taskdeck::auth::SessionHandle;
use taskdeck::tasks::{TaskListManager, reconcile};
use taskdeck_proto::auth::{User, UserId};
use taskdeck_proto::task::{Task, TaskCreate, TaskId};

#[derive(Debug, Clone)]
enum Op {
    Load,
    Create(String),
    Delete(usize),
    Toggle(usize),
    Select(usize),
    SelectAll,
    DeselectAll,
    BulkDelete,
    BulkToggle(bool),
    Move(usize, isize),
    Reorder(usize, isize),
    Fail(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Load),
        "[a-z]{1,12}".prop_map(Op::Create),
        any::<usize>().prop_map(Op::Delete),
        any::<usize>().prop_map(Op::Toggle),
        any::<usize>().prop_map(Op::Select),
        Just(Op::SelectAll),
        Just(Op::DeselectAll),
        Just(Op::BulkDelete),
        any::<bool>().prop_map(Op::BulkToggle),
        (any::<usize>(), -3isize..=3).prop_map(|(i, d)| Op::Move(i, d)),
        (any::<usize>(), -3isize..=3).prop_map(|(i, d)| Op::Reorder(i, d)),
        any::<usize>().prop_map(Op::Fail),
    ]
}

fn user() -> User {
    User {
        id: UserId::new("prop-user"),
        email: "prop@example.com".to_string(),
        name: "Prop".to_string(),
    }
}

/// Picks the id at `index` modulo the list length.
fn pick(tasks: &[Task], index: usize) -> Option<TaskId> {
    if tasks.is_empty() {
        None
    } else {
        Some(tasks[index % tasks.len()].id)
    }
}

fn check_invariants(mgr: &TaskListManager<InMemoryTaskApi>) -> Result<(), TestCaseError> {
    let ids: HashSet<TaskId> = mgr.tasks().iter().map(|t| t.id).collect();
    prop_assert_eq!(ids.len(), mgr.tasks().len(), "duplicate ids in list");
    prop_assert!(
        mgr.selected().is_subset(&ids),
        "selection {:?} escapes list {:?}",
        mgr.selected(),
        ids
    );
    Ok(())
}

async fn apply(api: &InMemoryTaskApi, mgr: &mut TaskListManager<InMemoryTaskApi>, op: Op) {
    match op {
        Op::Load => mgr.load_all().await,
        Op::Create(title) => {
            let _ = mgr.create(TaskCreate::new(title)).await;
        }
        Op::Delete(i) => {
            if let Some(id) = pick(mgr.tasks(), i) {
                let _ = mgr.delete(id).await;
            }
        }
        Op::Toggle(i) => {
            if let Some(id) = pick(mgr.tasks(), i) {
                let _ = mgr.toggle_complete(id, true).await;
            }
        }
        Op::Select(i) => {
            if let Some(id) = pick(mgr.tasks(), i) {
                mgr.toggle_selection(id).unwrap();
            }
        }
        Op::SelectAll => mgr.select_all(),
        Op::DeselectAll => mgr.deselect_all(),
        Op::BulkDelete => {
            let _ = mgr.bulk_delete().await;
        }
        Op::BulkToggle(done) => {
            let _ = mgr.bulk_toggle_complete(done).await;
        }
        Op::Move(i, delta) => {
            if let Some(id) = pick(mgr.tasks(), i) {
                mgr.move_task(id, delta).unwrap();
            }
        }
        Op::Reorder(i, delta) => {
            if let Some(id) = pick(mgr.tasks(), i)
                && let Some(order) = reconcile::move_by(mgr.tasks(), id, delta)
            {
                mgr.reorder(order).unwrap();
            }
        }
        Op::Fail(i) => {
            if let Some(id) = pick(mgr.tasks(), i) {
                api.fail_on(id, ApiError::Network("flaky".to_string()));
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The selection never refers to a task that is not in the list.
    #[test]
    fn selection_stays_within_list(
        seed in 0usize..6,
        ops in prop::collection::vec(arb_op(), 1..40),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("runtime");

        rt.block_on(async {
            let api = InMemoryTaskApi::new();
            let titles: Vec<String> = (0..seed).map(|i| format!("seed {i}")).collect();
            let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
            api.seed(&user().id, &refs);

            let session = SessionHandle::signed_in(user(), "tok");
            let (mut mgr, _notes) =
                TaskListManager::new(api.clone(), session, CancellationToken::new(), 4);
            mgr.load_all().await;

            for op in ops {
                apply(&api, &mut mgr, op).await;
                check_invariants(&mgr)?;
            }
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// Moving a task keeps the same set of tasks and shifts only that task.
    #[test]
    fn move_by_is_a_permutation(len in 1usize..12, index in any::<usize>(), delta in -15isize..=15) {
        let tasks: Vec<Task> = (0..len)
            .map(|i| Task::new(TaskId::new(i64::try_from(i).unwrap()), format!("t{i}")))
            .collect();
        let id = tasks[index % len].id;

        match reconcile::move_by(&tasks, id, delta) {
            Some(moved) => {
                prop_assert!(reconcile::is_permutation(&tasks, &moved));
                let from = index % len;
                let to = moved.iter().position(|t| t.id == id).unwrap();
                let expected = from.saturating_add_signed(delta).min(len - 1);
                prop_assert_eq!(to, expected);
                let rest_before: Vec<TaskId> =
                    tasks.iter().map(|t| t.id).filter(|t| *t != id).collect();
                let rest_after: Vec<TaskId> =
                    moved.iter().map(|t| t.id).filter(|t| *t != id).collect();
                prop_assert_eq!(rest_before, rest_after);
            }
            None => {
                let from = index % len;
                prop_assert_eq!(from.saturating_add_signed(delta).min(len - 1), from);
            }
        }
    }
}
