use crate::db;
use crate::db::seed::hash_password;
use crate::domain::models::UserRole;
use crate::state::SharedState;
use crate::web::session::UserSession;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct ListQuery {
    pub role: Option<UserRole>,
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: UserRole,
    pub institution_id: Option<Uuid>,
    pub class_group_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub name: String,
    pub institution_id: Option<Uuid>,
    pub class_group_id: Option<Uuid>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(show).put(update))
        .route("/:id/deactivate", post(deactivate))
        .route("/:id/reactivate", post(reactivate))
        .route("/me/profile", put(update_own_profile))
        .with_state(state)
}

async fn list(
    session: UserSession,
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<db::DbUser>>, StatusCode> {
    session.require_admin()?;
    let users = db::list_users(&state.pool, query.role).await.map_err(|e| {
        tracing::error!("Failed to list users: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(users))
}

async fn show(
    session: UserSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<db::DbUser>, StatusCode> {
    // Admins can view anyone, other users only themselves.
    if session.0.role != UserRole::Admin && session.0.user_id != id {
        return Err(StatusCode::FORBIDDEN);
    }
    let user = db::find_user_by_id(&state.pool, id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(user))
}

async fn create(
    session: UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<db::DbUser>), StatusCode> {
    session.require_admin()?;

    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') || payload.password.len() < 8 {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let taken = db::email_taken(&state.pool, &email)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    if taken {
        return Err(StatusCode::CONFLICT);
    }

    let hash = hash_password(&payload.password).map_err(|e| {
        tracing::error!("Password hashing failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let user = db::insert_user(
        &state.pool,
        &email,
        &hash,
        payload.name.trim(),
        payload.role,
        payload.institution_id,
        payload.class_group_id,
    )
    .await
    .map_err(|e| {
        tracing::error!("Failed to create user: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    tracing::info!("User {} created by admin {}", user.id, session.0.user_id);
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update(
    session: UserSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<db::DbUser>, StatusCode> {
    session.require_admin()?;
    let user = db::update_user_profile(
        &state.pool,
        id,
        payload.name.trim(),
        payload.institution_id,
        payload.class_group_id,
    )
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(user))
}

async fn update_own_profile(
    session: UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<db::DbUser>, StatusCode> {
    // Non-admins cannot reassign themselves.
    let current = db::find_user_by_id(&state.pool, session.0.user_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let user = db::update_user_profile(
        &state.pool,
        session.0.user_id,
        payload.name.trim(),
        current.institution_id,
        current.class_group_id,
    )
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(user))
}

async fn deactivate(
    session: UserSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    session.require_admin()?;
    if id == session.0.user_id {
        // Admins cannot lock themselves out.
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    set_active(&state, id, false).await
}

async fn reactivate(
    session: UserSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    session.require_admin()?;
    set_active(&state, id, true).await
}

async fn set_active(state: &SharedState, id: Uuid, active: bool) -> Result<StatusCode, StatusCode> {
    let changed = db::set_user_active(&state.pool, id, active)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update user {} active flag: {}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    if changed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}
