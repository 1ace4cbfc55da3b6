use crate::middleware::RateLimiter;
use crate::services::mailer::MailTransport;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub mailer: Arc<dyn MailTransport>,
    pub session_key: Vec<u8>,
    pub login_limiter: RateLimiter,
}

pub type SharedState = Arc<AppState>;
