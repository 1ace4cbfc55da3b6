pub mod auth;
pub mod classes;
pub mod dashboard;
pub mod institutions;
pub mod notifications;
pub mod quizzes;
pub mod results;
pub mod session;
pub mod sessions;
pub mod users;

use crate::state::SharedState;
use axum::{routing::get, Json, Router};

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/auth", auth::router(state.clone()))
        .nest("/api/institutions", institutions::router(state.clone()))
        .nest("/api/users", users::router(state.clone()))
        .nest("/api/classes", classes::router(state.clone()))
        .nest("/api/quizzes", quizzes::router(state.clone()))
        .nest("/api/sessions", sessions::router(state.clone()))
        .nest("/api/results", results::router(state.clone()))
        .nest("/api/notifications", notifications::router(state.clone()))
        .nest("/api/dashboard", dashboard::router(state))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
