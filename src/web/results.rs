use crate::db;
use crate::domain::models::UserRole;
use crate::state::SharedState;
use crate::web::session::UserSession;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/mine", get(my_results))
        .with_state(state)
}

/// Students only ever see their own published results.
async fn my_results(
    session: UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<db::ResultRow>>, StatusCode> {
    if session.0.role != UserRole::Student {
        return Err(StatusCode::FORBIDDEN);
    }
    let rows = db::published_results_for_student(&state.pool, session.0.user_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load student results: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(rows))
}
