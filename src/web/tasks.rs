use crate::domain::models::{Priority, TaskAssignment, TaskStatus};
use crate::domain::tasks::{TaskFilter, TaskSummary};
use crate::error::AppResult;
use crate::services::tasks::{Grouping, TaskBoard, TaskDraft};
use crate::state::SharedState;
use crate::web::extract::{JsonBody, PathParam, QueryParams};
use crate::web::session::{AdminSession, AuthSession};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize, Default)]
pub struct TaskQuery {
    pub assignee: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
}

impl TaskQuery {
    fn filter(&self) -> TaskFilter {
        TaskFilter {
            status: self.status,
            priority: self.priority,
        }
    }
}

#[derive(Deserialize)]
pub struct BoardQuery {
    pub by: Grouping,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", post(create_task).get(list_tasks))
        .route("/mine", get(my_tasks))
        .route("/summary", get(summary))
        .route("/board", get(board))
        .route("/:id/complete", post(complete_task))
        .with_state(state)
}

async fn create_task(
    State(state): State<SharedState>,
    AdminSession(admin): AdminSession,
    JsonBody(draft): JsonBody<TaskDraft>,
) -> AppResult<impl IntoResponse> {
    let task = state.tasks.create_task(&admin, draft).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn list_tasks(
    State(state): State<SharedState>,
    AdminSession(_admin): AdminSession,
    QueryParams(query): QueryParams<TaskQuery>,
) -> AppResult<Json<Vec<TaskAssignment>>> {
    let filter = query.filter();
    let tasks = match query.assignee.as_deref() {
        Some(name) => state.tasks.list_tasks_for_assignee(name, &filter).await?,
        None => state.tasks.list_all_tasks(&filter).await?,
    };
    Ok(Json(tasks))
}

async fn my_tasks(
    State(state): State<SharedState>,
    AuthSession(session): AuthSession,
    QueryParams(query): QueryParams<TaskQuery>,
) -> AppResult<Json<Vec<TaskAssignment>>> {
    let tasks = state.tasks.list_my_tasks(&session, &query.filter()).await?;
    Ok(Json(tasks))
}

async fn summary(
    State(state): State<SharedState>,
    AdminSession(_admin): AdminSession,
) -> AppResult<Json<TaskSummary>> {
    Ok(Json(state.tasks.summary().await?))
}

async fn board(
    State(state): State<SharedState>,
    AdminSession(_admin): AdminSession,
    QueryParams(query): QueryParams<BoardQuery>,
) -> AppResult<Json<TaskBoard>> {
    Ok(Json(state.tasks.board(query.by).await?))
}

async fn complete_task(
    State(state): State<SharedState>,
    AuthSession(session): AuthSession,
    PathParam(id): PathParam<Uuid>,
) -> AppResult<Json<TaskAssignment>> {
    Ok(Json(state.tasks.complete_task(&session, id).await?))
}
