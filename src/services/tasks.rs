use crate::domain::models::{NewTask, Priority, TaskAssignment, TaskStatus, UserRole};
use crate::domain::tasks::{self, TaskFilter, TaskSummary};
use crate::error::{AppError, AppResult};
use crate::services::directory::DirectoryService;
use crate::services::sessions::SessionRecord;
use crate::store::TaskStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Raw assignment form as submitted by an admin.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskDraft {
    pub employee_name: String,
    pub priority: Option<String>,
    pub task_name: String,
    #[serde(default)]
    pub comments: String,
    pub deadline: Option<DateTime<Utc>>,
}

/// Turns a draft into an insertable task.
pub fn validate_draft(draft: TaskDraft, assigned_by: String) -> AppResult<NewTask> {
    let employee_name = draft.employee_name.trim().to_string();
    if employee_name.is_empty() {
        return Err(AppError::validation("employee name is required"));
    }
    let task_name = draft.task_name.trim().to_string();
    if task_name.is_empty() {
        return Err(AppError::validation("task name is required"));
    }
    let priority = draft
        .priority
        .as_deref()
        .and_then(Priority::parse)
        .ok_or_else(|| AppError::validation("priority must be one of Urgent, High, Medium, Low"))?;
    let assigned_by = if assigned_by.trim().is_empty() {
        "Unknown".to_string()
    } else {
        assigned_by
    };

    Ok(NewTask {
        employee_name,
        priority,
        task_name,
        comments: draft.comments.trim().to_string(),
        deadline: draft.deadline,
        assigned_by,
    })
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    Status,
    Priority,
    Assignee,
}

/// Every task bucketed one way. Buckets keep newest-first order.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TaskBoard {
    Status(BTreeMap<TaskStatus, Vec<TaskAssignment>>),
    Priority(BTreeMap<Priority, Vec<TaskAssignment>>),
    Assignee(BTreeMap<String, Vec<TaskAssignment>>),
}

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
    directory: DirectoryService,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>, directory: DirectoryService) -> Self {
        Self { store, directory }
    }

    pub async fn create_task(&self, admin: &SessionRecord, draft: TaskDraft) -> AppResult<TaskAssignment> {
        let assigned_by = self.directory.assigner_name(&admin.email).await?;
        let new_task = validate_draft(draft, assigned_by)?;
        let task = self.store.insert_task(new_task).await?;
        tracing::info!(
            "Task {} '{}' assigned to {} by {}",
            task.id,
            task.task_name,
            task.employee_name,
            task.assigned_by
        );
        Ok(task)
    }

    pub async fn list_all_tasks(&self, filter: &TaskFilter) -> AppResult<Vec<TaskAssignment>> {
        let all = self.store.list_tasks().await?;
        Ok(tasks::select(all, filter))
    }

    /// Exact display-name match; no match is an empty list.
    pub async fn list_tasks_for_assignee(
        &self,
        employee_name: &str,
        filter: &TaskFilter,
    ) -> AppResult<Vec<TaskAssignment>> {
        let rows = self.store.list_tasks_by_assignee(employee_name).await?;
        Ok(tasks::select(rows, filter))
    }

    /// Tasks for the caller's own profile name.
    pub async fn list_my_tasks(
        &self,
        session: &SessionRecord,
        filter: &TaskFilter,
    ) -> AppResult<Vec<TaskAssignment>> {
        let profile = self.directory.find_profile_by_email(&session.email).await?;
        self.list_tasks_for_assignee(&profile.name, filter).await
    }

    pub async fn summary(&self) -> AppResult<TaskSummary> {
        let all = self.store.list_tasks().await?;
        Ok(tasks::summarize(&all, Utc::now()))
    }

    pub async fn board(&self, grouping: Grouping) -> AppResult<TaskBoard> {
        let all = tasks::newest_first(self.store.list_tasks().await?);
        Ok(match grouping {
            Grouping::Status => TaskBoard::Status(tasks::group_by_status(&all)),
            Grouping::Priority => TaskBoard::Priority(tasks::group_by_priority(&all)),
            Grouping::Assignee => TaskBoard::Assignee(tasks::group_by_assignee(&all)),
        })
    }

    /// Pending -> Completed, by the assignee or an admin.
    pub async fn complete_task(&self, session: &SessionRecord, task_id: Uuid) -> AppResult<TaskAssignment> {
        let task = self
            .store
            .find_task(task_id)
            .await?
            .ok_or_else(|| AppError::not_found("task"))?;

        if session.role != UserRole::Admin {
            let is_assignee = match self.directory.find_profile_by_email(&session.email).await {
                Ok(profile) => profile.name == task.employee_name,
                Err(AppError::NotFound(_)) => false,
                Err(e) => return Err(e),
            };
            if !is_assignee {
                return Err(AppError::Forbidden);
            }
        }

        let done = self
            .store
            .mark_completed(task_id, Utc::now())
            .await?
            .ok_or_else(|| AppError::validation("task is already completed"))?;
        tracing::info!("Task {} completed by account {}", done.id, session.account_id);
        Ok(done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{EmployeeProfile, TaskStatus};
    use crate::store::{DirectoryStore, MemoryStore};
    use chrono::{Duration, TimeZone};

    fn session(email: &str, role: UserRole) -> SessionRecord {
        SessionRecord {
            session_id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            email: email.to_string(),
            role,
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    fn draft(employee: &str, task: &str, priority: &str) -> TaskDraft {
        TaskDraft {
            employee_name: employee.to_string(),
            priority: Some(priority.to_string()),
            task_name: task.to_string(),
            comments: String::new(),
            deadline: None,
        }
    }

    async fn setup() -> (TaskService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        for (email, name, id) in [
            ("boss@berc.org", "Nadia", 1),
            ("ali@berc.org", "Ali", 2),
            ("sara@berc.org", "Sara", 3),
        ] {
            store
                .upsert_profile(&EmployeeProfile {
                    id: Uuid::new_v4(),
                    employee_email: email.to_string(),
                    employee_id: id,
                    name: name.to_string(),
                    designation: String::new(),
                })
                .await
                .unwrap();
        }
        let directory = DirectoryService::new(store.clone());
        (TaskService::new(store.clone(), directory), store)
    }

    #[tokio::test]
    async fn test_assignee_listing_scenario() {
        let (svc, _) = setup().await;
        let admin = session("boss@berc.org", UserRole::Admin);
        let mut d = draft("Ali", "Inspect Panel", "High");
        d.deadline = Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
        let created = svc.create_task(&admin, d).await.unwrap();
        assert_eq!(created.assigned_by, "Nadia");
        assert_eq!(created.status, TaskStatus::Pending);

        let ali = svc
            .list_tasks_for_assignee("Ali", &TaskFilter::default())
            .await
            .unwrap();
        assert!(ali.iter().any(|t| t.id == created.id));

        let sara = svc
            .list_tasks_for_assignee("Sara", &TaskFilter::default())
            .await
            .unwrap();
        assert!(sara.is_empty());
        let lower = svc
            .list_tasks_for_assignee("ali", &TaskFilter::default())
            .await
            .unwrap();
        assert!(lower.is_empty());
    }

    #[tokio::test]
    async fn test_admin_list_is_newest_first() {
        let (svc, _) = setup().await;
        let admin = session("boss@berc.org", UserRole::Admin);
        for name in ["first", "second", "third"] {
            svc.create_task(&admin, draft("Ali", name, "Low")).await.unwrap();
        }
        let names: Vec<String> = svc
            .list_all_tasks(&TaskFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.task_name)
            .collect();
        assert_eq!(names, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_assigned_by_falls_back_to_email_local_part() {
        let (svc, _) = setup().await;
        let admin = session("ops.lead@berc.org", UserRole::Admin);
        let task = svc.create_task(&admin, draft("Sara", "Audit", "medium")).await.unwrap();
        assert_eq!(task.assigned_by, "ops.lead");
        assert_eq!(task.priority, Priority::Medium);
    }

    #[tokio::test]
    async fn test_validation_rejects_bad_drafts() {
        let (svc, store) = setup().await;
        let admin = session("boss@berc.org", UserRole::Admin);

        for bad in [
            draft("Ali", "   ", "High"),
            draft("", "Inspect", "High"),
            draft("Ali", "Inspect", "Critical"),
        ] {
            assert!(matches!(
                svc.create_task(&admin, bad).await,
                Err(AppError::Validation(_))
            ));
        }

        assert!(store.list_tasks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_my_tasks_requires_profile() {
        let (svc, _) = setup().await;
        let admin = session("boss@berc.org", UserRole::Admin);
        svc.create_task(&admin, draft("Ali", "Inspect", "High")).await.unwrap();

        let ali = session("ali@berc.org", UserRole::Employee);
        assert_eq!(svc.list_my_tasks(&ali, &TaskFilter::default()).await.unwrap().len(), 1);

        let stranger = session("new@berc.org", UserRole::Employee);
        assert!(matches!(
            svc.list_my_tasks(&stranger, &TaskFilter::default()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_completion_rules() {
        let (svc, _) = setup().await;
        let admin = session("boss@berc.org", UserRole::Admin);
        let task = svc.create_task(&admin, draft("Ali", "Inspect", "High")).await.unwrap();

        let sara = session("sara@berc.org", UserRole::Employee);
        assert!(matches!(
            svc.complete_task(&sara, task.id).await,
            Err(AppError::Forbidden)
        ));

        let ali = session("ali@berc.org", UserRole::Employee);
        let done = svc.complete_task(&ali, task.id).await.unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert!(done.completed_at.is_some());

        assert!(matches!(
            svc.complete_task(&admin, task.id).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            svc.complete_task(&admin, Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_summary() {
        let (svc, _) = setup().await;
        let admin = session("boss@berc.org", UserRole::Admin);
        let a = svc.create_task(&admin, draft("Ali", "a", "Urgent")).await.unwrap();
        svc.create_task(&admin, draft("Sara", "b", "Urgent")).await.unwrap();
        svc.complete_task(&admin, a.id).await.unwrap();

        let summary = svc.summary().await.unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.by_priority[0].count, 2);
    }

    #[tokio::test]
    async fn test_board_groups_by_assignee() {
        let (svc, _) = setup().await;
        let admin = session("boss@berc.org", UserRole::Admin);
        svc.create_task(&admin, draft("Ali", "a", "Low")).await.unwrap();
        svc.create_task(&admin, draft("Sara", "b", "High")).await.unwrap();
        svc.create_task(&admin, draft("Ali", "c", "High")).await.unwrap();

        let TaskBoard::Assignee(groups) = svc.board(Grouping::Assignee).await.unwrap() else {
            panic!("expected assignee grouping");
        };
        let ali: Vec<&str> = groups["Ali"].iter().map(|t| t.task_name.as_str()).collect();
        assert_eq!(ali, vec!["c", "a"]);
        assert_eq!(groups["Sara"].len(), 1);

        let TaskBoard::Priority(groups) = svc.board(Grouping::Priority).await.unwrap() else {
            panic!("expected priority grouping");
        };
        let order: Vec<Priority> = groups.keys().copied().collect();
        assert_eq!(order, vec![Priority::High, Priority::Low]);
    }
}
