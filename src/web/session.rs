use crate::domain::models::UserRole;
use crate::error::AppError;
use crate::services::sessions::SessionRecord;
use crate::state::SharedState;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionClaims {
    pub session_id: Uuid,
    pub account_id: Uuid,
    pub role: UserRole,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid token format")]
    Invalid,
    #[error("signature mismatch")]
    Signature,
    #[error("expired")]
    Expired,
    #[error("bad role")]
    Role,
}

pub fn sign_session(record: &SessionRecord, key: &[u8]) -> Result<String, SessionError> {
    let payload = format!(
        "{}|{}|{}|{}",
        record.session_id,
        record.account_id,
        record.role.as_str(),
        record.expires_at.timestamp()
    );
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SessionError::Invalid)?;
    mac.update(payload.as_bytes());
    let sig = mac.finalize().into_bytes();
    let token = format!(
        "{}.{}",
        general_purpose::STANDARD.encode(payload.as_bytes()),
        general_purpose::STANDARD.encode(sig)
    );
    Ok(token)
}

pub fn verify_session(token: &str, key: &[u8]) -> Result<SessionClaims, SessionError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 2 {
        return Err(SessionError::Invalid);
    }
    let payload_bytes = general_purpose::STANDARD
        .decode(parts[0])
        .map_err(|_| SessionError::Invalid)?;
    let sig_bytes = general_purpose::STANDARD
        .decode(parts[1])
        .map_err(|_| SessionError::Invalid)?;

    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SessionError::Invalid)?;
    mac.update(&payload_bytes);
    mac.verify_slice(&sig_bytes)
        .map_err(|_| SessionError::Signature)?;

    let payload = String::from_utf8(payload_bytes).map_err(|_| SessionError::Invalid)?;
    let pieces: Vec<&str> = payload.split('|').collect();
    if pieces.len() != 4 {
        return Err(SessionError::Invalid);
    }
    let session_id = Uuid::parse_str(pieces[0]).map_err(|_| SessionError::Invalid)?;
    let account_id = Uuid::parse_str(pieces[1]).map_err(|_| SessionError::Invalid)?;
    let role = UserRole::parse(pieces[2]).ok_or(SessionError::Role)?;
    let exp: i64 = pieces[3].parse().map_err(|_| SessionError::Invalid)?;
    if Utc::now().timestamp() > exp {
        return Err(SessionError::Expired);
    }
    Ok(SessionClaims {
        session_id,
        account_id,
        role,
        exp,
    })
}

pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get(axum::http::header::AUTHORIZATION) {
        if let Ok(val) = auth.to_str() {
            if let Some(bearer) = val.strip_prefix("Bearer ") {
                return Some(bearer.trim().to_string());
            }
        }
    }
    if let Some(cookie) = headers.get(axum::http::header::COOKIE) {
        if let Ok(val) = cookie.to_str() {
            for pair in val.split(';') {
                let trimmed = pair.trim();
                if let Some(rest) = trimmed.strip_prefix("session=") {
                    return Some(rest.to_string());
                }
            }
        }
    }
    None
}

// ============================================
// Axum extractors
// ============================================

/// Any signed-in caller whose session is still registered.
pub struct AuthSession(pub SessionRecord);

/// A caller holding an Admin session.
pub struct AdminSession(pub SessionRecord);

#[async_trait]
impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
    SharedState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let shared_state = SharedState::from_ref(state);
        let token = extract_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let record = shared_state.identity.authenticate(&token).await?;
        Ok(AuthSession(record))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    SharedState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthSession(record) = AuthSession::from_request_parts(parts, state).await?;
        if record.role != UserRole::Admin {
            tracing::warn!("Admin route refused for account {}", record.account_id);
            return Err(AppError::Forbidden);
        }
        Ok(AdminSession(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(expires_in: Duration) -> SessionRecord {
        SessionRecord {
            session_id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            email: "ali@berc.org".to_string(),
            role: UserRole::Employee,
            expires_at: Utc::now() + expires_in,
        }
    }

    #[test]
    fn test_sign_and_verify() {
        let key = [9u8; 32];
        let rec = record(Duration::hours(1));
        let token = sign_session(&rec, &key).unwrap();
        let claims = verify_session(&token, &key).unwrap();
        assert_eq!(claims.session_id, rec.session_id);
        assert_eq!(claims.account_id, rec.account_id);
        assert_eq!(claims.role, UserRole::Employee);
    }

    #[test]
    fn test_tampered_or_foreign_key_rejected() {
        let rec = record(Duration::hours(1));
        let token = sign_session(&rec, &[1u8; 32]).unwrap();
        assert!(matches!(
            verify_session(&token, &[2u8; 32]),
            Err(SessionError::Signature)
        ));
        assert!(matches!(
            verify_session("garbage", &[1u8; 32]),
            Err(SessionError::Invalid)
        ));
    }

    #[test]
    fn test_expired_token() {
        let key = [3u8; 32];
        let token = sign_session(&record(Duration::hours(-1)), &key).unwrap();
        assert!(matches!(verify_session(&token, &key), Err(SessionError::Expired)));
    }

    #[test]
    fn test_extract_token_from_header_or_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::COOKIE, "theme=dark; session=abc.def".parse().unwrap());
        assert_eq!(extract_token(&headers).as_deref(), Some("abc.def"));
        headers.insert(axum::http::header::AUTHORIZATION, "Bearer tok.sig".parse().unwrap());
        assert_eq!(extract_token(&headers).as_deref(), Some("tok.sig"));
    }
}
