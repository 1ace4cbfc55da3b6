//! Typed wrappers around the notification store: well-known kinds and their
//! expiry policies.

use crate::db::notifications as store;
use anyhow::Result;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub const KIND_REPORT_AVAILABLE: &str = "report_available";
pub const KIND_SESSION_COMPLETED: &str = "session_completed";
pub const KIND_QUIZ_SESSION_CREATED: &str = "quiz_session_created";
pub const KIND_SYSTEM_ALERT: &str = "system_alert";

const REPORT_AVAILABLE_TTL_DAYS: i64 = 30;
const SESSION_COMPLETED_TTL_DAYS: i64 = 7;

/// "A new results report is available" notice for one user.
pub async fn notify_report_available(
    pool: &PgPool,
    user_id: Uuid,
    data: serde_json::Value,
) -> Result<store::Notification> {
    store::insert(
        pool,
        user_id,
        KIND_REPORT_AVAILABLE,
        "Results report available",
        "A new results report is available for review.",
        &data,
        Some(Utc::now() + Duration::days(REPORT_AVAILABLE_TTL_DAYS)),
    )
    .await
}

/// "Session completed" notice fanned out to the given administrators.
/// Returns the number of notifications created.
pub async fn notify_session_completed(
    pool: &PgPool,
    user_ids: &[Uuid],
    session_title: &str,
    data: serde_json::Value,
) -> Result<u64> {
    let message = format!(
        "The session '{session_title}' has completed. Results are available."
    );
    store::insert_bulk(
        pool,
        user_ids,
        KIND_SESSION_COMPLETED,
        "Exam session completed",
        &message,
        &data,
        Some(Utc::now() + Duration::days(SESSION_COMPLETED_TTL_DAYS)),
    )
    .await
}
