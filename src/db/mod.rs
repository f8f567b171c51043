pub mod seed;

use crate::domain::models::{
    Account, EmployeeProfile, Event, NewEvent, NewTask, TaskAssignment, UserRole,
};
use crate::error::StoreError;
use crate::store::{normalize_email, AccountStore, DirectoryStore, EventStore, TaskStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Postgres backend for every collection.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_unique(err: sqlx::Error, key: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return StoreError::Conflict(key.to_string());
        }
    }
    err.into()
}

const PROFILE_COLUMNS: &str = "id, employee_email, employee_id, name, designation";

const TASK_COLUMNS: &str = r#"
    id,
    seq,
    employee_name,
    priority,
    task_name,
    comments,
    deadline,
    assigned_by,
    status,
    created_at,
    completed_at
"#;

const EVENT_COLUMNS: &str = "id, date, event_name, participants, created_at";

const ACCOUNT_COLUMNS: &str = "id, email, hash, role, created_at";

#[async_trait]
impl DirectoryStore for PgStore {
    async fn find_profile_by_email(&self, email: &str) -> Result<Option<EmployeeProfile>, StoreError> {
        let profile = sqlx::query_as::<_, EmployeeProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM employees WHERE lower(employee_email) = $1"
        ))
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn find_profile_by_id(&self, id: Uuid) -> Result<Option<EmployeeProfile>, StoreError> {
        let profile = sqlx::query_as::<_, EmployeeProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM employees WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn list_profiles(&self) -> Result<Vec<EmployeeProfile>, StoreError> {
        let profiles = sqlx::query_as::<_, EmployeeProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM employees"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(profiles)
    }

    async fn upsert_profile(&self, profile: &EmployeeProfile) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO employees (id, employee_email, employee_id, name, designation)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET employee_email = EXCLUDED.employee_email,
                employee_id = EXCLUDED.employee_id,
                name = EXCLUDED.name,
                designation = EXCLUDED.designation
            "#,
        )
        .bind(profile.id)
        .bind(normalize_email(&profile.employee_email))
        .bind(profile.employee_id)
        .bind(&profile.name)
        .bind(&profile.designation)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique(e, "employee_email"))?;
        Ok(())
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, task: NewTask) -> Result<TaskAssignment, StoreError> {
        let row = sqlx::query_as::<_, TaskAssignment>(&format!(
            r#"
            INSERT INTO assign_tasks
                (id, employee_name, priority, task_name, comments, deadline, assigned_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&task.employee_name)
        .bind(task.priority)
        .bind(&task.task_name)
        .bind(&task.comments)
        .bind(task.deadline)
        .bind(&task.assigned_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_tasks(&self) -> Result<Vec<TaskAssignment>, StoreError> {
        let rows = sqlx::query_as::<_, TaskAssignment>(&format!(
            "SELECT {TASK_COLUMNS} FROM assign_tasks"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_tasks_by_assignee(&self, employee_name: &str) -> Result<Vec<TaskAssignment>, StoreError> {
        let rows = sqlx::query_as::<_, TaskAssignment>(&format!(
            "SELECT {TASK_COLUMNS} FROM assign_tasks WHERE employee_name = $1"
        ))
        .bind(employee_name)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<TaskAssignment>, StoreError> {
        let row = sqlx::query_as::<_, TaskAssignment>(&format!(
            "SELECT {TASK_COLUMNS} FROM assign_tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn mark_completed(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<TaskAssignment>, StoreError> {
        let row = sqlx::query_as::<_, TaskAssignment>(&format!(
            r#"
            UPDATE assign_tasks
            SET status = 'COMPLETED',
                completed_at = $2
            WHERE id = $1
              AND status = 'PENDING'
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn insert_event(&self, event: NewEvent) -> Result<Event, StoreError> {
        let row = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO upcoming_events (id, date, event_name, participants)
            VALUES ($1, $2, $3, $4)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(event.date)
        .bind(&event.event_name)
        .bind(&event.participants)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        let row = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM upcoming_events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        let rows = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM upcoming_events ORDER BY date ASC, created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn delete_event(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM upcoming_events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn insert_account(&self, email: &str, hash: &str, role: UserRole) -> Result<Account, StoreError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            r#"
            INSERT INTO accounts (id, email, hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(normalize_email(email))
        .bind(hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, "email"))?;
        Ok(account)
    }

    async fn update_password_hash(&self, id: Uuid, hash: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE accounts SET hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
