use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    Employee,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Employee => "EMPLOYEE",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Some(UserRole::Admin),
            "EMPLOYEE" => Some(UserRole::Employee),
            _ => None,
        }
    }

    /// Label shown when the caller has no directory profile.
    pub fn placeholder_label(&self) -> &'static str {
        match self {
            UserRole::Admin => "Admin",
            UserRole::Employee => "Employee",
        }
    }
}

/// Declaration order is display order: most pressing first.
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[sqlx(type_name = "task_priority", rename_all = "UPPERCASE")]
pub enum Priority {
    Urgent,
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Urgent, Priority::High, Priority::Medium, Priority::Low];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "urgent" => Some(Priority::Urgent),
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[sqlx(type_name = "task_status", rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Pending,
    Completed,
}

#[derive(Clone, Debug, Serialize, Deserialize, FromRow, PartialEq)]
pub struct EmployeeProfile {
    pub id: Uuid,
    pub employee_email: String,
    pub employee_id: i64,
    pub name: String,
    pub designation: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, FromRow, PartialEq)]
pub struct TaskAssignment {
    pub id: Uuid,
    pub seq: i64,
    pub employee_name: String,
    pub priority: Priority,
    pub task_name: String,
    pub comments: String,
    pub deadline: Option<DateTime<Utc>>,
    pub assigned_by: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Validated insert payload for the task repository.
#[derive(Clone, Debug)]
pub struct NewTask {
    pub employee_name: String,
    pub priority: Priority,
    pub task_name: String,
    pub comments: String,
    pub deadline: Option<DateTime<Utc>>,
    pub assigned_by: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Event {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub event_name: String,
    pub participants: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Participant names are already resolved when this reaches a store.
#[derive(Clone, Debug)]
pub struct NewEvent {
    pub date: DateTime<Utc>,
    pub event_name: String,
    pub participants: Vec<String>,
}

#[derive(Clone, Debug, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}
