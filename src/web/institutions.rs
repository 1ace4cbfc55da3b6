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
pub struct InstitutionPayload {
    pub name: String,
    pub city: Option<String>,
    pub contact_email: Option<String>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(show).put(update).delete(remove))
        .with_state(state)
}

async fn list(
    session: UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<db::Institution>>, StatusCode> {
    session.require_admin()?;
    let rows = db::list_institutions(&state.pool).await.map_err(|e| {
        tracing::error!("Failed to list institutions: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(rows))
}

async fn show(
    session: UserSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<db::Institution>, StatusCode> {
    session.require_admin()?;
    let row = db::find_institution(&state.pool, id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(row))
}

async fn create(
    session: UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<InstitutionPayload>,
) -> Result<(StatusCode, Json<db::Institution>), StatusCode> {
    session.require_admin()?;
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let row = db::insert_institution(
        &state.pool,
        name,
        payload.city.as_deref(),
        payload.contact_email.as_deref(),
    )
    .await
    .map_err(|e| {
        tracing::error!("Failed to create institution: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok((StatusCode::CREATED, Json(row)))
}

async fn update(
    session: UserSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<InstitutionPayload>,
) -> Result<Json<db::Institution>, StatusCode> {
    session.require_admin()?;
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let row = db::update_institution(
        &state.pool,
        id,
        name,
        payload.city.as_deref(),
        payload.contact_email.as_deref(),
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
    session.require_admin()?;
    let deleted = db::delete_institution(&state.pool, id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete institution {}: {}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}
