use crate::domain::models::UserRole;
use crate::error::{AppError, AppResult};
use crate::services::identity::IssuedSession;
use crate::state::SharedState;
use crate::web::extract::JsonBody;
use crate::web::session::AuthSession;
use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Role picked on the login screen.
    #[serde(default = "default_role")]
    pub role: UserRole,
}

fn default_role() -> UserRole {
    UserRole::Employee
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub account_id: Uuid,
    pub role: UserRole,
    pub display_name: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Serialize)]
pub struct SignUpResponse {
    pub account_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub account_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub display_name: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetConfirmRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Serialize)]
pub struct Message {
    pub message: &'static str,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/signup", post(sign_up))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/password", post(change_password))
        .route("/password/reset-request", post(request_reset))
        .route("/password/reset", post(confirm_reset))
        .route("/events", get(session_events))
        .with_state(state)
}

fn session_cookie(state: &SharedState, value: &str, max_age: i64) -> AppResult<HeaderMap> {
    let secure_flag = if state.secure_cookies { "; Secure" } else { "" };
    let cookie = format!("session={value}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age}{secure_flag}");
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie).map_err(|_| AppError::Internal)?,
    );
    Ok(headers)
}

async fn login(
    peer: Option<ConnectInfo<SocketAddr>>,
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let key = match peer {
        Some(ConnectInfo(addr)) => addr.ip().to_string(),
        None => crate::store::normalize_email(&payload.email),
    };
    if !state.login_limiter.check(&key).await {
        tracing::warn!("Login rate limit exceeded for {}", key);
        return Err(AppError::RateLimited);
    }

    let (account, role) = state
        .identity
        .check_credentials(&payload.email, &payload.password, payload.role)
        .await?;
    let display_name = state.directory.display_label(&account.email, role).await?;

    let IssuedSession { token, record } = state.identity.open_session(&account, role).await?;
    state.login_limiter.reset(&key).await;

    let max_age = (record.expires_at - Utc::now()).num_seconds().max(0);
    let headers = session_cookie(&state, &token, max_age)?;

    let resp = LoginResponse {
        token,
        account_id: record.account_id,
        role: record.role,
        display_name,
        expires_at: record.expires_at,
    };
    Ok((headers, Json(resp)))
}

async fn sign_up(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<SignUpRequest>,
) -> AppResult<impl IntoResponse> {
    let account = state
        .identity
        .sign_up(&payload.email, &payload.password, &payload.confirm_password)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            account_id: account.id,
            email: account.email,
            role: account.role,
            created_at: account.created_at,
        }),
    ))
}

async fn logout(
    State(state): State<SharedState>,
    AuthSession(record): AuthSession,
) -> AppResult<impl IntoResponse> {
    state.identity.logout(&record).await;
    let headers = session_cookie(&state, "", 0)?;
    Ok((headers, StatusCode::NO_CONTENT))
}

async fn me(
    State(state): State<SharedState>,
    AuthSession(record): AuthSession,
) -> AppResult<Json<MeResponse>> {
    let account = state.identity.current_account(&record).await?;
    let display_name = state.directory.display_label(&account.email, record.role).await?;
    Ok(Json(MeResponse {
        account_id: account.id,
        email: account.email,
        role: record.role,
        display_name,
        expires_at: record.expires_at,
    }))
}

async fn change_password(
    State(state): State<SharedState>,
    AuthSession(record): AuthSession,
    JsonBody(payload): JsonBody<ChangePasswordRequest>,
) -> AppResult<impl IntoResponse> {
    state
        .identity
        .change_password(
            &record,
            &payload.current_password,
            &payload.new_password,
            &payload.confirm_password,
        )
        .await?;
    let headers = session_cookie(&state, "", 0)?;
    Ok((headers, Json(Message { message: "password updated, please sign in again" })))
}

async fn request_reset(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<ResetRequest>,
) -> AppResult<impl IntoResponse> {
    let key = format!("reset:{}", crate::store::normalize_email(&payload.email));
    if !state.login_limiter.check(&key).await {
        tracing::warn!("Reset rate limit exceeded for {}", key);
        return Err(AppError::RateLimited);
    }
    state.identity.request_reset(&payload.email).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(Message { message: "if the account exists, a reset code has been sent" }),
    ))
}

async fn confirm_reset(
    State(state): State<SharedState>,
    JsonBody(payload): JsonBody<ResetConfirmRequest>,
) -> AppResult<Json<Message>> {
    let key = format!("reset-confirm:{}", crate::store::normalize_email(&payload.email));
    if !state.login_limiter.check(&key).await {
        tracing::warn!("Reset confirmation rate limit exceeded for {}", key);
        return Err(AppError::RateLimited);
    }
    state
        .identity
        .confirm_reset(
            &payload.email,
            &payload.code,
            &payload.new_password,
            &payload.confirm_password,
        )
        .await?;
    Ok(Json(Message { message: "password updated, please sign in again" }))
}

async fn session_events(
    State(state): State<SharedState>,
    AuthSession(record): AuthSession,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let hub = state.identity.hub();
    let subscription = hub.subscribe(record.account_id);
    tracing::debug!(
        "Account {} subscribed to session events ({} listeners)",
        record.account_id,
        hub.subscriber_count()
    );
    let stream = subscription
        .into_stream()
        .map(|event| Event::default().event(event.name()).json_data(&event));
    Sse::new(stream).keep_alive(KeepAlive::default())
}
