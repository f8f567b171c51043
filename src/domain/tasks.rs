//! In-memory views over fetched task records.

use crate::domain::models::{Priority, TaskAssignment, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
}

impl TaskFilter {
    pub fn matches(&self, task: &TaskAssignment) -> bool {
        self.status.map_or(true, |s| task.status == s)
            && self.priority.map_or(true, |p| task.priority == p)
    }
}

/// Newest first, by insertion sequence.
pub fn newest_first(mut tasks: Vec<TaskAssignment>) -> Vec<TaskAssignment> {
    tasks.sort_by(|a, b| b.seq.cmp(&a.seq));
    tasks
}

/// Applies `filter` and returns the survivors newest first.
pub fn select(tasks: Vec<TaskAssignment>, filter: &TaskFilter) -> Vec<TaskAssignment> {
    newest_first(tasks.into_iter().filter(|t| filter.matches(t)).collect())
}

/// Exact, case-sensitive match on the stored display name.
pub fn for_assignee<'a>(
    tasks: &'a [TaskAssignment],
    employee_name: &'a str,
) -> impl Iterator<Item = &'a TaskAssignment> + 'a {
    tasks.iter().filter(move |t| t.employee_name == employee_name)
}

pub fn group_by_status(tasks: &[TaskAssignment]) -> BTreeMap<TaskStatus, Vec<TaskAssignment>> {
    let mut groups: BTreeMap<TaskStatus, Vec<TaskAssignment>> = BTreeMap::new();
    for task in tasks {
        groups.entry(task.status).or_default().push(task.clone());
    }
    groups
}

/// Keys iterate Urgent, High, Medium, Low.
pub fn group_by_priority(tasks: &[TaskAssignment]) -> BTreeMap<Priority, Vec<TaskAssignment>> {
    let mut groups: BTreeMap<Priority, Vec<TaskAssignment>> = BTreeMap::new();
    for task in tasks {
        groups.entry(task.priority).or_default().push(task.clone());
    }
    groups
}

pub fn group_by_assignee(tasks: &[TaskAssignment]) -> BTreeMap<String, Vec<TaskAssignment>> {
    let mut groups: BTreeMap<String, Vec<TaskAssignment>> = BTreeMap::new();
    for task in tasks {
        groups
            .entry(task.employee_name.clone())
            .or_default()
            .push(task.clone());
    }
    groups
}

pub fn is_overdue(task: &TaskAssignment, now: DateTime<Utc>) -> bool {
    task.status == TaskStatus::Pending && task.deadline.is_some_and(|d| d < now)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PriorityCount {
    pub priority: Priority,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TaskSummary {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub overdue: usize,
    pub by_priority: Vec<PriorityCount>,
}

pub fn summarize(tasks: &[TaskAssignment], now: DateTime<Utc>) -> TaskSummary {
    let completed = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .count();
    let by_priority = Priority::ALL
        .iter()
        .map(|p| PriorityCount {
            priority: *p,
            count: tasks.iter().filter(|t| t.priority == *p).count(),
        })
        .collect();

    TaskSummary {
        total: tasks.len(),
        pending: tasks.len() - completed,
        completed,
        overdue: tasks.iter().filter(|t| is_overdue(t, now)).count(),
        by_priority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn task(seq: i64, name: &str, priority: Priority, status: TaskStatus) -> TaskAssignment {
        TaskAssignment {
            id: Uuid::new_v4(),
            seq,
            employee_name: name.to_string(),
            priority,
            task_name: format!("task {seq}"),
            comments: String::new(),
            deadline: None,
            assigned_by: "Unknown".to_string(),
            status,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    fn sample() -> Vec<TaskAssignment> {
        vec![
            task(1, "Ali", Priority::Low, TaskStatus::Pending),
            task(2, "Sara", Priority::Urgent, TaskStatus::Completed),
            task(3, "Ali", Priority::Urgent, TaskStatus::Pending),
            task(4, "ali", Priority::High, TaskStatus::Pending),
        ]
    }

    #[test]
    fn test_newest_first_uses_sequence() {
        let seqs: Vec<i64> = newest_first(sample()).iter().map(|t| t.seq).collect();
        assert_eq!(seqs, vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_assignee_match_is_case_sensitive() {
        let tasks = sample();
        let ali: Vec<i64> = for_assignee(&tasks, "Ali").map(|t| t.seq).collect();
        assert_eq!(ali, vec![1, 3]);
        assert_eq!(for_assignee(&tasks, "Nobody").count(), 0);
    }

    #[test]
    fn test_filter_by_status_and_priority() {
        let filter = TaskFilter {
            status: Some(TaskStatus::Pending),
            priority: Some(Priority::Urgent),
        };
        let picked = select(sample(), &filter);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].seq, 3);
    }

    #[test]
    fn test_group_by_priority_orders_urgent_first() {
        let groups = group_by_priority(&sample());
        let keys: Vec<Priority> = groups.keys().copied().collect();
        assert_eq!(keys, vec![Priority::Urgent, Priority::High, Priority::Low]);
        assert_eq!(groups[&Priority::Urgent].len(), 2);
    }

    #[test]
    fn test_group_by_status_and_assignee() {
        let tasks = sample();
        let by_status = group_by_status(&tasks);
        assert_eq!(by_status[&TaskStatus::Pending].len(), 3);
        assert_eq!(by_status[&TaskStatus::Completed].len(), 1);

        let by_name = group_by_assignee(&tasks);
        assert_eq!(by_name["Ali"].len(), 2);
        assert_eq!(by_name["ali"].len(), 1);
    }

    #[test]
    fn test_summary_counts_overdue_pending_only() {
        let now = Utc::now();
        let mut tasks = sample();
        tasks[0].deadline = Some(now - Duration::days(1));
        tasks[1].deadline = Some(now - Duration::days(1));
        tasks[2].deadline = Some(now + Duration::days(1));

        let summary = summarize(&tasks, now);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.pending, 3);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.overdue, 1);
        assert_eq!(
            summary.by_priority[0],
            PriorityCount {
                priority: Priority::Urgent,
                count: 2
            }
        );
        assert_eq!(summary.by_priority.len(), 4);
    }
}
