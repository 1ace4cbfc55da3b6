use crate::db;
use crate::domain::models::UserRole;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap, StatusCode},
};
use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct SessionClaims {
    pub user_id: Uuid,
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

pub fn sign_session(user_id: Uuid, role: UserRole, key: &[u8]) -> Result<String, SessionError> {
    let exp = Utc::now() + Duration::hours(SESSION_TTL_HOURS);
    let payload = format!("{}|{}|{}", user_id, role_string(role), exp.timestamp());
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SessionError::Invalid)?;
    mac.update(payload.as_bytes());
    let sig = mac.finalize().into_bytes();
    Ok(format!(
        "{}.{}",
        general_purpose::STANDARD.encode(payload.as_bytes()),
        general_purpose::STANDARD.encode(sig)
    ))
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
    if pieces.len() != 3 {
        return Err(SessionError::Invalid);
    }
    let user_id = Uuid::parse_str(pieces[0]).map_err(|_| SessionError::Invalid)?;
    let role = parse_role(pieces[1])?;
    let exp: i64 = pieces[2].parse().map_err(|_| SessionError::Invalid)?;
    if Utc::now().timestamp() > exp {
        return Err(SessionError::Expired);
    }
    Ok(SessionClaims { user_id, role, exp })
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
                if let Some(rest) = pair.trim().strip_prefix("session=") {
                    return Some(rest.to_string());
                }
            }
        }
    }
    None
}

fn role_string(role: UserRole) -> &'static str {
    match role {
        UserRole::Admin => "ADMIN",
        UserRole::Teacher => "TEACHER",
        UserRole::Student => "STUDENT",
    }
}

fn parse_role(raw: &str) -> Result<UserRole, SessionError> {
    match raw {
        "ADMIN" => Ok(UserRole::Admin),
        "TEACHER" => Ok(UserRole::Teacher),
        "STUDENT" => Ok(UserRole::Student),
        _ => Err(SessionError::Role),
    }
}

/// Axum extractor that validates the session token and re-checks the user
/// is still active.
pub struct UserSession(pub SessionClaims);

#[async_trait]
impl<S> FromRequestParts<S> for UserSession
where
    S: Send + Sync,
    crate::state::SharedState: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let shared_state = crate::state::SharedState::from_ref(state);

        let token = extract_token(&parts.headers).ok_or(StatusCode::UNAUTHORIZED)?;
        let claims = verify_session(&token, &shared_state.session_key).map_err(|e| {
            tracing::warn!("Session verification failed: {}", e);
            StatusCode::UNAUTHORIZED
        })?;

        let user = db::find_user_by_id(&shared_state.pool, claims.user_id)
            .await
            .map_err(|e| {
                tracing::warn!("User lookup failed for session: {}", e);
                StatusCode::UNAUTHORIZED
            })?;
        let Some(user) = user else {
            return Err(StatusCode::UNAUTHORIZED);
        };
        if !user.is_active {
            return Err(StatusCode::UNAUTHORIZED);
        }

        Ok(UserSession(claims))
    }
}

impl UserSession {
    pub fn require_admin(&self) -> Result<(), StatusCode> {
        if self.0.role == UserRole::Admin {
            Ok(())
        } else {
            Err(StatusCode::FORBIDDEN)
        }
    }

    pub fn require_teacher(&self) -> Result<(), StatusCode> {
        if self.0.role == UserRole::Teacher {
            Ok(())
        } else {
            Err(StatusCode::FORBIDDEN)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"test-session-key-32-bytes-long!!";

    #[test]
    fn sign_then_verify_roundtrip() {
        let user_id = Uuid::new_v4();
        let token = sign_session(user_id, UserRole::Teacher, KEY).unwrap();
        let claims = verify_session(&token, KEY).unwrap();
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.role, UserRole::Teacher);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn rejects_wrong_key() {
        let token = sign_session(Uuid::new_v4(), UserRole::Admin, KEY).unwrap();
        assert!(matches!(
            verify_session(&token, b"another-key"),
            Err(SessionError::Signature)
        ));
    }

    #[test]
    fn rejects_tampered_payload() {
        let token = sign_session(Uuid::new_v4(), UserRole::Student, KEY).unwrap();
        let sig = token.split('.').nth(1).unwrap();
        let forged_payload = general_purpose::STANDARD.encode(format!(
            "{}|ADMIN|{}",
            Uuid::new_v4(),
            (Utc::now() + Duration::hours(1)).timestamp()
        ));
        let forged = format!("{forged_payload}.{sig}");
        assert!(matches!(
            verify_session(&forged, KEY),
            Err(SessionError::Signature)
        ));
    }

    #[test]
    fn rejects_expired_token() {
        // Hand-sign a payload whose expiry is in the past.
        let payload = format!(
            "{}|ADMIN|{}",
            Uuid::new_v4(),
            (Utc::now() - Duration::hours(1)).timestamp()
        );
        let mut mac = HmacSha256::new_from_slice(KEY).unwrap();
        mac.update(payload.as_bytes());
        let sig = mac.finalize().into_bytes();
        let token = format!(
            "{}.{}",
            general_purpose::STANDARD.encode(payload.as_bytes()),
            general_purpose::STANDARD.encode(sig)
        );
        assert!(matches!(
            verify_session(&token, KEY),
            Err(SessionError::Expired)
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(verify_session("not-a-token", KEY).is_err());
        assert!(verify_session("a.b.c", KEY).is_err());
    }

    #[test]
    fn extracts_bearer_and_cookie_tokens() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Bearer abc123".parse().unwrap(),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("abc123"));

        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            "theme=dark; session=tok456".parse().unwrap(),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("tok456"));
    }
}
