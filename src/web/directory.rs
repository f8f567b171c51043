use crate::domain::models::EmployeeProfile;
use crate::error::AppResult;
use crate::state::SharedState;
use crate::web::extract::{PathParam, QueryParams};
use crate::web::session::{AdminSession, AuthSession};
use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct EmployeeQuery {
    pub q: Option<String>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/employees", get(list_employees))
        .route("/employees/by-email/:email", get(find_by_email))
        .with_state(state)
}

async fn list_employees(
    State(state): State<SharedState>,
    AdminSession(_admin): AdminSession,
    QueryParams(query): QueryParams<EmployeeQuery>,
) -> AppResult<Json<Vec<EmployeeProfile>>> {
    let profiles = state.directory.list_profiles(query.q.as_deref()).await?;
    Ok(Json(profiles))
}

async fn find_by_email(
    State(state): State<SharedState>,
    AuthSession(_session): AuthSession,
    PathParam(email): PathParam<String>,
) -> AppResult<Json<EmployeeProfile>> {
    let profile = state.directory.find_profile_by_email(&email).await?;
    Ok(Json(profile))
}
