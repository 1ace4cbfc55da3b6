use crate::db;
use crate::state::SharedState;
use crate::web::session::UserSession;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct QuizPayload {
    pub title: String,
    pub subject: String,
    pub duration_minutes: i32,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(show).put(update).delete(remove))
        .with_state(state)
}

fn validate(payload: &QuizPayload) -> Result<(), StatusCode> {
    if payload.title.trim().is_empty()
        || payload.subject.trim().is_empty()
        || payload.duration_minutes <= 0
    {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    Ok(())
}

/// Teachers only see and manage their own quizzes.
async fn owned_quiz(
    state: &SharedState,
    session: &UserSession,
    id: Uuid,
) -> Result<db::Quiz, StatusCode> {
    let quiz = db::find_quiz(&state.pool, id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;
    if quiz.teacher_id != session.0.user_id {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(quiz)
}

async fn list(
    session: UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<db::Quiz>>, StatusCode> {
    session.require_teacher()?;
    let rows = db::list_quizzes_by_teacher(&state.pool, session.0.user_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list quizzes: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(rows))
}

async fn show(
    session: UserSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<db::Quiz>, StatusCode> {
    session.require_teacher()?;
    let quiz = owned_quiz(&state, &session, id).await?;
    Ok(Json(quiz))
}

async fn create(
    session: UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<QuizPayload>,
) -> Result<(StatusCode, Json<db::Quiz>), StatusCode> {
    session.require_teacher()?;
    validate(&payload)?;
    let quiz = db::insert_quiz(
        &state.pool,
        session.0.user_id,
        payload.title.trim(),
        payload.subject.trim(),
        payload.duration_minutes,
    )
    .await
    .map_err(|e| {
        tracing::error!("Failed to create quiz: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok((StatusCode::CREATED, Json(quiz)))
}

async fn update(
    session: UserSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuizPayload>,
) -> Result<Json<db::Quiz>, StatusCode> {
    session.require_teacher()?;
    validate(&payload)?;
    owned_quiz(&state, &session, id).await?;
    let quiz = db::update_quiz(
        &state.pool,
        id,
        payload.title.trim(),
        payload.subject.trim(),
        payload.duration_minutes,
    )
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(quiz))
}

async fn remove(
    session: UserSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    session.require_teacher()?;
    owned_quiz(&state, &session, id).await?;
    let deleted = db::delete_quiz(&state.pool, id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete quiz {}: {}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}
