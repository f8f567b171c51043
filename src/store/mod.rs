//! Storage seams. Every collection the service touches is reached through one
//! of these traits so the Postgres backend and the in-memory backend are
//! interchangeable.

pub mod memory;

use crate::domain::models::{
    Account, EmployeeProfile, Event, NewEvent, NewTask, TaskAssignment, UserRole,
};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

pub use memory::MemoryStore;

/// Employee directory (`employees` collection).
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn find_profile_by_email(&self, email: &str) -> Result<Option<EmployeeProfile>, StoreError>;
    async fn find_profile_by_id(&self, id: Uuid) -> Result<Option<EmployeeProfile>, StoreError>;
    async fn list_profiles(&self) -> Result<Vec<EmployeeProfile>, StoreError>;
    /// Inserts or replaces by `id`. Used by seeding and directory sync.
    async fn upsert_profile(&self, profile: &EmployeeProfile) -> Result<(), StoreError>;
}

/// Task assignments (`assign_tasks` collection).
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, task: NewTask) -> Result<TaskAssignment, StoreError>;
    async fn list_tasks(&self) -> Result<Vec<TaskAssignment>, StoreError>;
    async fn list_tasks_by_assignee(&self, employee_name: &str) -> Result<Vec<TaskAssignment>, StoreError>;
    async fn find_task(&self, id: Uuid) -> Result<Option<TaskAssignment>, StoreError>;
    /// Flips a Pending task to Completed. Returns `None` when no Pending task
    /// with that id exists.
    async fn mark_completed(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<TaskAssignment>, StoreError>;
}

/// Scheduled events (`upcoming_events` collection).
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert_event(&self, event: NewEvent) -> Result<Event, StoreError>;
    async fn find_event(&self, id: Uuid) -> Result<Option<Event>, StoreError>;
    /// Ordered by date ascending, ties by creation time.
    async fn list_events(&self) -> Result<Vec<Event>, StoreError>;
    /// Returns whether a row was removed.
    async fn delete_event(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Identity-provider accounts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;
    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;
    async fn insert_account(&self, email: &str, hash: &str, role: UserRole) -> Result<Account, StoreError>;
    async fn update_password_hash(&self, id: Uuid, hash: &str) -> Result<bool, StoreError>;
}

/// The store handles shared by every request.
#[derive(Clone)]
pub struct Stores {
    pub directory: Arc<dyn DirectoryStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub events: Arc<dyn EventStore>,
    pub accounts: Arc<dyn AccountStore>,
}

impl Stores {
    /// One backend serving all four collections.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: DirectoryStore + TaskStore + EventStore + AccountStore + 'static,
    {
        Self {
            directory: backend.clone(),
            tasks: backend.clone(),
            events: backend.clone(),
            accounts: backend,
        }
    }

    pub fn in_memory() -> Self {
        Self::from_backend(Arc::new(MemoryStore::new()))
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
