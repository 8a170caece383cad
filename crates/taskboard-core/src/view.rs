use taskboard_shared::FilterMode;
use tracing::trace;

use crate::task::Task;

/// Filters by completion state, then orders by priority rank. The sort is
/// stable, so equal-priority tasks keep their canonical relative order.
#[tracing::instrument(skip(tasks), fields(total = tasks.len()))]
pub fn project(tasks: &[Task], filter: FilterMode) -> Vec<&Task> {
    let mut rows: Vec<&Task> = tasks
        .iter()
        .filter(|task| filter.admits(task.completed))
        .collect();

    rows.sort_by_key(|task| task.priority.rank());
    trace!(visible = rows.len(), "projected tasks");
    rows
}

#[cfg(test)]
mod tests {
    use taskboard_shared::Priority;

    use super::*;

    fn ids(rows: &[&Task]) -> Vec<u64> {
        rows.iter().map(|task| task.id).collect()
    }

    fn scenario() -> Vec<Task> {
        vec![
            Task::new(1, "A").with_priority(Priority::High),
            Task::new(2, "B").with_priority(Priority::Low),
            Task::new(3, "C").with_priority(Priority::High),
        ]
    }

    #[test]
    fn all_sorts_high_first_and_keeps_ties_in_canonical_order() {
        let tasks = scenario();
        assert_eq!(ids(&project(&tasks, FilterMode::All)), vec![1, 3, 2]);
    }

    #[test]
    fn medium_sits_between_high_and_low() {
        let tasks = vec![
            Task::new(1, "low").with_priority(Priority::Low),
            Task::new(2, "medium"),
            Task::new(3, "high").with_priority(Priority::High),
            Task::new(4, "medium again"),
        ];
        assert_eq!(ids(&project(&tasks, FilterMode::All)), vec![3, 2, 4, 1]);
    }

    #[test]
    fn completion_filters() {
        let tasks = vec![
            Task::new(1, "done").with_completed(true),
            Task::new(2, "open"),
            Task::new(3, "done high")
                .with_completed(true)
                .with_priority(Priority::High),
        ];

        assert_eq!(ids(&project(&tasks, FilterMode::Completed)), vec![3, 1]);
        assert_eq!(ids(&project(&tasks, FilterMode::Incomplete)), vec![2]);
        assert_eq!(ids(&project(&tasks, FilterMode::All)), vec![3, 1, 2]);
    }

    #[test]
    fn projection_leaves_canonical_order_alone() {
        let tasks = scenario();
        let _ = project(&tasks, FilterMode::All);
        assert_eq!(
            tasks.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn empty_list_projects_to_nothing() {
        assert!(project(&[], FilterMode::Completed).is_empty());
    }
}
