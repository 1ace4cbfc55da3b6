use crate::db::notifications as store;
use crate::state::SharedState;
use crate::web::session::UserSession;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

const LIST_LIMIT: i64 = 50;

#[derive(Serialize)]
pub struct UnreadCountResponse {
    pub unread: i64,
}

#[derive(Serialize)]
pub struct MarkAllResponse {
    pub marked: u64,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list))
        .route("/unread-count", get(unread_count))
        .route("/:id/read", post(mark_read))
        .route("/read-all", post(mark_all_read))
        .with_state(state)
}

async fn list(
    session: UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<store::Notification>>, StatusCode> {
    let rows = store::list_active(&state.pool, session.0.user_id, LIST_LIMIT)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list notifications: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(rows))
}

async fn unread_count(
    session: UserSession,
    State(state): State<SharedState>,
) -> Result<Json<UnreadCountResponse>, StatusCode> {
    let unread = store::count_unread(&state.pool, session.0.user_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(UnreadCountResponse { unread }))
}

async fn mark_read(
    session: UserSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let marked = store::mark_read(&state.pool, session.0.user_id, id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    if marked {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn mark_all_read(
    session: UserSession,
    State(state): State<SharedState>,
) -> Result<Json<MarkAllResponse>, StatusCode> {
    let marked = store::mark_all_read(&state.pool, session.0.user_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to mark notifications read: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(MarkAllResponse { marked }))
}
