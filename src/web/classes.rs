use crate::db;
use crate::state::SharedState;
use crate::web::session::UserSession;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct ListQuery {
    pub institution_id: Uuid,
}

#[derive(Deserialize)]
pub struct CreateClassRequest {
    pub institution_id: Uuid,
    pub name: String,
    pub level: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateClassRequest {
    pub name: String,
    pub level: Option<String>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", axum::routing::put(update).delete(remove))
        .with_state(state)
}

async fn list(
    session: UserSession,
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<db::ClassGroup>>, StatusCode> {
    session.require_admin()?;
    let rows = db::list_class_groups(&state.pool, query.institution_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list class groups: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(rows))
}

async fn create(
    session: UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<CreateClassRequest>,
) -> Result<(StatusCode, Json<db::ClassGroup>), StatusCode> {
    session.require_admin()?;
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let institution = db::find_institution(&state.pool, payload.institution_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    if institution.is_none() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let row = db::insert_class_group(
        &state.pool,
        payload.institution_id,
        name,
        payload.level.as_deref(),
    )
    .await
    .map_err(|e| {
        tracing::error!("Failed to create class group: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok((StatusCode::CREATED, Json(row)))
}

async fn update(
    session: UserSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateClassRequest>,
) -> Result<Json<db::ClassGroup>, StatusCode> {
    session.require_admin()?;
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let row = db::update_class_group(&state.pool, id, name, payload.level.as_deref())
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
    let deleted = db::delete_class_group(&state.pool, id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete class group {}: {}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}
