//! Drag-to-reorder gesture tracking.
//!
//! A gesture is `start`, any number of `enter`/`leave`, then one drop. Only
//! the dragged id and the hovered id are remembered between events.

use tracing::debug;

use crate::task::{Task, position_of};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DragState {
    dragged: Option<u64>,
    hovered: Option<u64>,
}

impl DragState {
    pub fn dragged(&self) -> Option<u64> {
        self.dragged
    }

    pub fn hovered(&self) -> Option<u64> {
        self.hovered
    }

    pub fn is_dragging(&self) -> bool {
        self.dragged.is_some()
    }

    pub fn start(&mut self, source: u64) {
        self.dragged = Some(source);
        self.hovered = None;
    }

    /// Hovering the dragged task itself never highlights it.
    pub fn enter(&mut self, target: u64) {
        match self.dragged {
            Some(dragged) if dragged != target => self.hovered = Some(target),
            _ => {}
        }
    }

    pub fn leave(&mut self, target: u64) {
        if self.hovered == Some(target) {
            self.hovered = None;
        }
    }

    /// Ends the gesture, returning the id that was being dragged.
    pub fn finish(&mut self) -> Option<u64> {
        self.hovered = None;
        self.dragged.take()
    }
}

/// Moves `source` to the canonical index `target` held before the move and
/// gives it `target`'s priority. Dropping on itself, or on an id that is no
/// longer present, changes nothing.
pub fn reorder(tasks: &[Task], source: u64, target: u64) -> Option<Vec<Task>> {
    if source == target {
        return None;
    }

    let Some(target_index) = position_of(tasks, target) else {
        debug!(target, "drop target no longer exists");
        return None;
    };
    let Some(source_index) = position_of(tasks, source) else {
        debug!(source, "dragged task no longer exists");
        return None;
    };

    let target_priority = tasks[target_index].priority;
    let mut next = tasks.to_vec();
    let mut moved = next.remove(source_index);
    moved.priority = target_priority;
    next.insert(target_index, moved);

    debug!(
        source,
        target,
        from = source_index,
        to = target_index,
        priority = %target_priority,
        "reordered task"
    );
    Some(next)
}

#[cfg(test)]
mod tests {
    use taskboard_shared::Priority;

    use super::*;

    fn scenario() -> Vec<Task> {
        vec![
            Task::new(1, "A").with_priority(Priority::High),
            Task::new(2, "B").with_priority(Priority::Low),
            Task::new(3, "C").with_priority(Priority::High),
        ]
    }

    fn ids(tasks: &[Task]) -> Vec<u64> {
        tasks.iter().map(|task| task.id).collect()
    }

    #[test]
    fn gesture_tracks_hover_and_clears_on_finish() {
        let mut drag = DragState::default();
        assert!(!drag.is_dragging());

        drag.start(1);
        assert_eq!(drag.dragged(), Some(1));

        drag.enter(1);
        assert_eq!(drag.hovered(), None);

        drag.enter(2);
        assert_eq!(drag.hovered(), Some(2));

        drag.leave(3);
        assert_eq!(drag.hovered(), Some(2));

        drag.leave(2);
        assert_eq!(drag.hovered(), None);

        drag.enter(3);
        assert_eq!(drag.finish(), Some(1));
        assert_eq!(drag, DragState::default());
    }

    #[test]
    fn enter_without_gesture_is_ignored() {
        let mut drag = DragState::default();
        drag.enter(4);
        assert_eq!(drag.hovered(), None);
        assert_eq!(drag.finish(), None);
    }

    #[test]
    fn drop_downward_takes_target_index_and_priority() {
        let tasks = scenario();
        let next = reorder(&tasks, 1, 2).expect("reorder should apply");
        assert_eq!(ids(&next), vec![2, 1, 3]);
        assert_eq!(next[1].priority, Priority::Low);
        // target keeps its own priority
        assert_eq!(next[0].priority, Priority::Low);
    }

    #[test]
    fn drop_upward_takes_target_index_and_priority() {
        let tasks = scenario();
        let next = reorder(&tasks, 3, 2).expect("reorder should apply");
        assert_eq!(ids(&next), vec![1, 3, 2]);
        assert_eq!(next[1].priority, Priority::Low);
        assert_eq!(next[2].priority, Priority::Low);
    }

    #[test]
    fn drop_onto_first_and_last_slots() {
        let tasks = scenario();
        let to_front = reorder(&tasks, 3, 1).expect("to front");
        assert_eq!(ids(&to_front), vec![3, 1, 2]);

        let to_back = reorder(&tasks, 1, 3).expect("to back");
        assert_eq!(ids(&to_back), vec![2, 3, 1]);
        assert_eq!(to_back[2].priority, Priority::High);
    }

    #[test]
    fn drop_on_self_or_missing_is_noop() {
        let tasks = scenario();
        assert!(reorder(&tasks, 2, 2).is_none());
        assert!(reorder(&tasks, 2, 99).is_none());
        assert!(reorder(&tasks, 99, 2).is_none());
    }
}
