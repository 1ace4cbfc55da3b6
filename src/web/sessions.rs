use crate::db;
use crate::reports::session::send_session_report;
use crate::state::SharedState;
use crate::web::session::UserSession;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const SESSION_CODE_LEN: usize = 6;
const SESSION_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const SESSION_CODE_MAX_TRIES: usize = 10;

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub quiz_id: Uuid,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub max_participants: Option<i32>,
}

#[derive(Deserialize)]
pub struct UpdateSessionRequest {
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub max_participants: Option<i32>,
}

#[derive(Serialize)]
pub struct PublishResponse {
    pub published: u64,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(show).put(update).delete(remove))
        .route("/:id/activate", post(activate))
        .route("/:id/complete", post(complete))
        .route("/:id/cancel", post(cancel))
        .route("/:id/results", get(results))
        .route("/:id/results/publish", post(publish_results))
        .with_state(state)
}

fn random_session_code() -> String {
    let mut rng = rand::thread_rng();
    (0..SESSION_CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..SESSION_CODE_ALPHABET.len());
            SESSION_CODE_ALPHABET[idx] as char
        })
        .collect()
}

async fn unique_session_code(state: &SharedState) -> Result<String, StatusCode> {
    for _ in 0..SESSION_CODE_MAX_TRIES {
        let code = random_session_code();
        let exists = db::session_code_exists(&state.pool, &code)
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        if !exists {
            return Ok(code);
        }
    }
    tracing::error!("Could not generate a unique session code");
    Err(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn owned_session(
    state: &SharedState,
    session: &UserSession,
    id: Uuid,
) -> Result<db::QuizSession, StatusCode> {
    let row = db::find_session(&state.pool, id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;
    if row.teacher_id != session.0.user_id {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(row)
}

async fn list(
    session: UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<db::QuizSession>>, StatusCode> {
    session.require_teacher()?;
    let rows = db::list_sessions_by_teacher(&state.pool, session.0.user_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list sessions: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(rows))
}

async fn show(
    session: UserSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<db::QuizSession>, StatusCode> {
    session.require_teacher()?;
    let row = owned_session(&state, &session, id).await?;
    Ok(Json(row))
}

async fn create(
    session: UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<db::QuizSession>), StatusCode> {
    session.require_teacher()?;
    if payload.title.trim().is_empty() || payload.ends_at <= payload.starts_at {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let quiz = db::find_quiz(&state.pool, payload.quiz_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::UNPROCESSABLE_ENTITY)?;
    if quiz.teacher_id != session.0.user_id {
        return Err(StatusCode::FORBIDDEN);
    }

    let code = unique_session_code(&state).await?;
    let row = db::insert_session(
        &state.pool,
        payload.quiz_id,
        session.0.user_id,
        &code,
        payload.title.trim(),
        payload.starts_at,
        payload.ends_at,
        payload.max_participants,
    )
    .await
    .map_err(|e| {
        tracing::error!("Failed to create session: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    tracing::info!("Session {} created with code {}", row.id, row.session_code);
    Ok((StatusCode::CREATED, Json(row)))
}

async fn update(
    session: UserSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSessionRequest>,
) -> Result<Json<db::QuizSession>, StatusCode> {
    session.require_teacher()?;
    if payload.title.trim().is_empty() || payload.ends_at <= payload.starts_at {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let existing = owned_session(&state, &session, id).await?;
    if !existing.status.can_edit() {
        return Err(StatusCode::CONFLICT);
    }
    let row = db::update_session(
        &state.pool,
        id,
        payload.title.trim(),
        payload.starts_at,
        payload.ends_at,
        payload.max_participants,
    )
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(row))
}

async fn remove(
    session: UserSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    session.require_teacher()?;
    let existing = owned_session(&state, &session, id).await?;
    if !existing.status.can_edit() {
        return Err(StatusCode::CONFLICT);
    }
    let deleted = db::delete_session(&state.pool, id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn activate(
    session: UserSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<db::QuizSession>, StatusCode> {
    session.require_teacher()?;
    owned_session(&state, &session, id).await?;
    // Status guard lives in the UPDATE itself; a stale session comes back None.
    let row = db::activate_session(&state.pool, id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::CONFLICT)?;
    tracing::info!("Session {} activated", id);
    Ok(Json(row))
}

async fn complete(
    session: UserSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<db::QuizSession>, StatusCode> {
    session.require_teacher()?;
    owned_session(&state, &session, id).await?;
    let row = db::complete_session(&state.pool, id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::CONFLICT)?;
    tracing::info!("Session {} completed", id);

    // Report generation happens in the background; the response never
    // waits on email delivery.
    let report_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = send_session_report(&report_state, id, &[]).await {
            tracing::error!("Session report job failed for {}: {}", id, e);
        }
    });

    Ok(Json(row))
}

async fn cancel(
    session: UserSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<db::QuizSession>, StatusCode> {
    session.require_teacher()?;
    owned_session(&state, &session, id).await?;
    let row = db::cancel_session(&state.pool, id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::CONFLICT)?;
    tracing::info!("Session {} cancelled", id);
    Ok(Json(row))
}

async fn results(
    session: UserSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<db::ResultRow>>, StatusCode> {
    session.require_teacher()?;
    owned_session(&state, &session, id).await?;
    let rows = db::results_for_session(&state.pool, id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load results for session {}: {}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(rows))
}

async fn publish_results(
    session: UserSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublishResponse>, StatusCode> {
    session.require_teacher()?;
    owned_session(&state, &session, id).await?;
    let published = db::publish_graded_results(&state.pool, id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to publish results for session {}: {}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    tracing::info!("Published {} results for session {}", published, id);
    Ok(Json(PublishResponse { published }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_codes_have_fixed_length_and_alphabet() {
        for _ in 0..100 {
            let code = random_session_code();
            assert_eq!(code.len(), SESSION_CODE_LEN);
            assert!(code.bytes().all(|b| SESSION_CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn session_code_alphabet_skips_ambiguous_characters() {
        for ambiguous in [b'0', b'O', b'1', b'I'] {
            assert!(!SESSION_CODE_ALPHABET.contains(&ambiguous));
        }
    }
}
