//! Pure mutations over the canonical task list.
//!
//! Every function borrows the current list and hands back a fresh one. A
//! `None` return means the intent was rejected (blank text) or matched no
//! task, and the caller keeps its current snapshot untouched.

use std::collections::BTreeSet;

use taskboard_shared::Priority;
use tracing::trace;

use crate::task::{Task, contains, is_blank};

/// Id for a task created at `now_millis`: the timestamp, bumped past the
/// largest existing id when the clock has not advanced. `None` once the
/// largest id is `u64::MAX` and nothing fits above it.
pub fn next_id(tasks: &[Task], now_millis: i64) -> Option<u64> {
    let stamp = u64::try_from(now_millis).unwrap_or(0);
    match tasks.iter().map(|task| task.id).max() {
        Some(max) if stamp <= max => max.checked_add(1),
        _ => Some(stamp),
    }
}

pub fn add(tasks: &[Task], text: &str, id: u64) -> Option<Vec<Task>> {
    if is_blank(text) {
        return None;
    }
    if contains(tasks, id) {
        trace!(id, "refusing duplicate id");
        return None;
    }

    let mut next = tasks.to_vec();
    next.push(Task::new(id, text));
    Some(next)
}

pub fn toggle(tasks: &[Task], id: u64) -> Option<Vec<Task>> {
    update_one(tasks, id, |task| task.completed = !task.completed)
}

pub fn delete(tasks: &[Task], id: u64) -> Option<Vec<Task>> {
    if !contains(tasks, id) {
        return None;
    }
    Some(tasks.iter().filter(|task| task.id != id).cloned().collect())
}

pub fn set_priority(tasks: &[Task], id: u64, priority: Priority) -> Option<Vec<Task>> {
    update_one(tasks, id, |task| task.priority = priority)
}

pub fn rename(tasks: &[Task], id: u64, text: &str) -> Option<Vec<Task>> {
    if is_blank(text) {
        return None;
    }
    update_one(tasks, id, |task| task.text = text.to_string())
}

pub fn bulk_delete(tasks: &[Task], ids: &BTreeSet<u64>) -> Option<Vec<Task>> {
    if !tasks.iter().any(|task| ids.contains(&task.id)) {
        return None;
    }
    Some(
        tasks
            .iter()
            .filter(|task| !ids.contains(&task.id))
            .cloned()
            .collect(),
    )
}

/// Marks every task in `ids` complete (or not). Covers both bulk
/// complete and bulk uncomplete.
pub fn bulk_set_completed(
    tasks: &[Task],
    ids: &BTreeSet<u64>,
    completed: bool,
) -> Option<Vec<Task>> {
    if !tasks.iter().any(|task| ids.contains(&task.id)) {
        return None;
    }
    Some(
        tasks
            .iter()
            .map(|task| {
                if ids.contains(&task.id) {
                    task.clone().with_completed(completed)
                } else {
                    task.clone()
                }
            })
            .collect(),
    )
}

fn update_one<F>(tasks: &[Task], id: u64, apply: F) -> Option<Vec<Task>>
where
    F: FnOnce(&mut Task),
{
    if !contains(tasks, id) {
        return None;
    }

    let mut next = tasks.to_vec();
    if let Some(task) = next.iter_mut().find(|task| task.id == id) {
        apply(task);
    }
    Some(next)
}
