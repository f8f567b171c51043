use super::{normalize_email, AccountStore, DirectoryStore, EventStore, TaskStore};
use crate::domain::models::{
    Account, EmployeeProfile, Event, NewEvent, NewTask, TaskAssignment, TaskStatus, UserRole,
};
use crate::domain::tasks;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Collections {
    profiles: HashMap<Uuid, EmployeeProfile>,
    tasks: Vec<TaskAssignment>,
    next_seq: i64,
    events: Vec<Event>,
    accounts: HashMap<Uuid, Account>,
}

/// Process-local backend used for development runs and tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn find_profile_by_email(&self, email: &str) -> Result<Option<EmployeeProfile>, StoreError> {
        let email = normalize_email(email);
        let data = self.inner.read().await;
        Ok(data
            .profiles
            .values()
            .find(|p| normalize_email(&p.employee_email) == email)
            .cloned())
    }

    async fn find_profile_by_id(&self, id: Uuid) -> Result<Option<EmployeeProfile>, StoreError> {
        Ok(self.inner.read().await.profiles.get(&id).cloned())
    }

    async fn list_profiles(&self) -> Result<Vec<EmployeeProfile>, StoreError> {
        Ok(self.inner.read().await.profiles.values().cloned().collect())
    }

    async fn upsert_profile(&self, profile: &EmployeeProfile) -> Result<(), StoreError> {
        let mut data = self.inner.write().await;
        let email = normalize_email(&profile.employee_email);
        let taken = data
            .profiles
            .values()
            .any(|p| p.id != profile.id && normalize_email(&p.employee_email) == email);
        if taken {
            return Err(StoreError::Conflict("employee_email".to_string()));
        }
        data.profiles.insert(profile.id, profile.clone());
        Ok(())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, task: NewTask) -> Result<TaskAssignment, StoreError> {
        let mut data = self.inner.write().await;
        data.next_seq += 1;
        let row = TaskAssignment {
            id: Uuid::new_v4(),
            seq: data.next_seq,
            employee_name: task.employee_name,
            priority: task.priority,
            task_name: task.task_name,
            comments: task.comments,
            deadline: task.deadline,
            assigned_by: task.assigned_by,
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
        };
        data.tasks.push(row.clone());
        Ok(row)
    }

    async fn list_tasks(&self) -> Result<Vec<TaskAssignment>, StoreError> {
        Ok(self.inner.read().await.tasks.clone())
    }

    async fn list_tasks_by_assignee(&self, employee_name: &str) -> Result<Vec<TaskAssignment>, StoreError> {
        let data = self.inner.read().await;
        Ok(tasks::for_assignee(&data.tasks, employee_name).cloned().collect())
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<TaskAssignment>, StoreError> {
        let data = self.inner.read().await;
        Ok(data.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn mark_completed(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<TaskAssignment>, StoreError> {
        let mut data = self.inner.write().await;
        let Some(task) = data
            .tasks
            .iter_mut()
            .find(|t| t.id == id && t.status == TaskStatus::Pending)
        else {
            return Ok(None);
        };
        task.status = TaskStatus::Completed;
        task.completed_at = Some(at);
        Ok(Some(task.clone()))
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn insert_event(&self, event: NewEvent) -> Result<Event, StoreError> {
        let row = Event {
            id: Uuid::new_v4(),
            date: event.date,
            event_name: event.event_name,
            participants: event.participants,
            created_at: Utc::now(),
        };
        self.inner.write().await.events.push(row.clone());
        Ok(row)
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        let data = self.inner.read().await;
        Ok(data.events.iter().find(|e| e.id == id).cloned())
    }

    async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        let mut events = self.inner.read().await.events.clone();
        events.sort_by_key(|e| (e.date, e.created_at));
        Ok(events)
    }

    async fn delete_event(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut data = self.inner.write().await;
        let before = data.events.len();
        data.events.retain(|e| e.id != id);
        Ok(data.events.len() != before)
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let email = normalize_email(email);
        let data = self.inner.read().await;
        Ok(data.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.inner.read().await.accounts.get(&id).cloned())
    }

    async fn insert_account(&self, email: &str, hash: &str, role: UserRole) -> Result<Account, StoreError> {
        let email = normalize_email(email);
        let mut data = self.inner.write().await;
        if data.accounts.values().any(|a| a.email == email) {
            return Err(StoreError::Conflict("email".to_string()));
        }
        let account = Account {
            id: Uuid::new_v4(),
            email,
            hash: hash.to_string(),
            role,
            created_at: Utc::now(),
        };
        data.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update_password_hash(&self, id: Uuid, hash: &str) -> Result<bool, StoreError> {
        let mut data = self.inner.write().await;
        match data.accounts.get_mut(&id) {
            Some(account) => {
                account.hash = hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Priority;
    use chrono::Duration;

    fn new_task(name: &str, task: &str) -> NewTask {
        NewTask {
            employee_name: name.to_string(),
            priority: Priority::High,
            task_name: task.to_string(),
            comments: String::new(),
            deadline: None,
            assigned_by: "Unknown".to_string(),
        }
    }

    #[tokio::test]
    async fn test_task_sequence_is_monotonic() {
        let store = MemoryStore::new();
        let a = store.insert_task(new_task("Ali", "one")).await.unwrap();
        let b = store.insert_task(new_task("Ali", "two")).await.unwrap();
        assert!(b.seq > a.seq);
        assert_eq!(a.status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn test_mark_completed_only_once() {
        let store = MemoryStore::new();
        let task = store.insert_task(new_task("Ali", "one")).await.unwrap();
        let now = Utc::now();
        let done = store.mark_completed(task.id, now).await.unwrap().unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert_eq!(done.completed_at, Some(now));
        assert!(store.mark_completed(task.id, now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_events_sorted_by_date() {
        let store = MemoryStore::new();
        let base = Utc::now();
        for offset in [3, 1, 2] {
            store
                .insert_event(NewEvent {
                    date: base + Duration::days(offset),
                    event_name: format!("day {offset}"),
                    participants: vec![],
                })
                .await
                .unwrap();
        }
        let names: Vec<String> = store
            .list_events()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.event_name)
            .collect();
        assert_eq!(names, vec!["day 1", "day 2", "day 3"]);
    }

    #[tokio::test]
    async fn test_account_email_is_unique_case_insensitively() {
        let store = MemoryStore::new();
        store
            .insert_account("Ali@Berc.org", "h", UserRole::Employee)
            .await
            .unwrap();
        let dup = store.insert_account("ali@berc.org", "h", UserRole::Employee).await;
        assert!(matches!(dup, Err(StoreError::Conflict(_))));
        assert!(store.find_account_by_email(" ALI@berc.org ").await.unwrap().is_some());
    }
}
