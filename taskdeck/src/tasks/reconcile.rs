//! Folding server responses back into the local task list.
//!
//! Every function addresses tasks by [`TaskId`] and preserves the
//! positions of tasks it does not touch.

use std::collections::HashSet;

use taskdeck_proto::task::{Task, TaskId};

/// Replaces the task with `updated.id` in place.
///
/// Returns `false` (and leaves `tasks` untouched) if no task has that id.
pub fn replace_by_id(tasks: &mut [Task], updated: Task) -> bool {
    match tasks.iter_mut().find(|t| t.id == updated.id) {
        Some(slot) => {
            *slot = updated;
            true
        }
        None => false,
    }
}

/// Replaces every task that has a counterpart in `updated`.
///
/// Tasks without a counterpart stay as they are; entries of `updated`
/// with no local task are ignored. Returns the number replaced.
pub fn merge_updated(tasks: &mut [Task], updated: Vec<Task>) -> usize {
    updated
        .into_iter()
        .map(|task| replace_by_id(tasks, task))
        .filter(|replaced| *replaced)
        .count()
}

/// Removes every task whose id is in `ids`, returning how many went.
pub fn remove_ids(tasks: &mut Vec<Task>, ids: &HashSet<TaskId>) -> usize {
    let before = tasks.len();
    tasks.retain(|t| !ids.contains(&t.id));
    before - tasks.len()
}

/// Whether `candidate` holds exactly the ids of `current`, in any order.
#[must_use]
pub fn is_permutation(current: &[Task], candidate: &[Task]) -> bool {
    if current.len() != candidate.len() {
        return false;
    }
    let ids: HashSet<TaskId> = current.iter().map(|t| t.id).collect();
    let candidate_ids: HashSet<TaskId> = candidate.iter().map(|t| t.id).collect();
    candidate_ids.len() == candidate.len() && ids == candidate_ids
}

/// Returns a copy of `tasks` with `id` moved `delta` places (negative is
/// up), clamped to the list bounds.
///
/// Returns `None` if `id` is not present or the move would not change
/// the order.
#[must_use]
pub fn move_by(tasks: &[Task], id: TaskId, delta: isize) -> Option<Vec<Task>> {
    let from = tasks.iter().position(|t| t.id == id)?;
    let last = tasks.len().saturating_sub(1);
    let to = from.saturating_add_signed(delta).min(last);
    if to == from {
        return None;
    }
    let mut reordered = tasks.to_vec();
    let task = reordered.remove(from);
    reordered.insert(to, task);
    Some(reordered)
}
