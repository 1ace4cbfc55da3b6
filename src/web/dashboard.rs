use crate::db;
use crate::state::SharedState;
use crate::web::session::UserSession;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/stats", get(own_stats))
        .route("/stats/:institution_id", get(stats))
        .with_state(state)
}

/// Stats for the administrator's own institution.
async fn own_stats(
    session: UserSession,
    State(state): State<SharedState>,
) -> Result<Json<db::DashboardStats>, StatusCode> {
    session.require_admin()?;
    let user = db::find_user_by_id(&state.pool, session.0.user_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let institution_id = user.institution_id.ok_or(StatusCode::UNPROCESSABLE_ENTITY)?;
    let stats = db::dashboard_stats(&state.pool, institution_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to compute dashboard stats: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(stats))
}

/// Stats for an explicit institution. Admins bound to an institution may
/// only query their own; unbound admins are platform-wide and may query any.
async fn stats(
    session: UserSession,
    State(state): State<SharedState>,
    Path(institution_id): Path<Uuid>,
) -> Result<Json<db::DashboardStats>, StatusCode> {
    session.require_admin()?;
    let user = db::find_user_by_id(&state.pool, session.0.user_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if let Some(own) = user.institution_id {
        if own != institution_id {
            return Err(StatusCode::FORBIDDEN);
        }
    }
    let stats = db::dashboard_stats(&state.pool, institution_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to compute dashboard stats: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(stats))
}
