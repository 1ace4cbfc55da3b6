//! Platform notification bookkeeping: per-user records with an optional
//! expiry. The only invariant is that `expires_at` in the past makes a row
//! eligible for deletion.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub read_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(exp) if exp < now)
    }
}

const COLUMNS: &str = "id, user_id, kind, title, message, data, read_at, expires_at, created_at";

pub async fn insert(
    pool: &PgPool,
    user_id: Uuid,
    kind: &str,
    title: &str,
    message: &str,
    data: &serde_json::Value,
    expires_at: Option<DateTime<Utc>>,
) -> Result<Notification> {
    let row = sqlx::query_as::<_, Notification>(&format!(
        r#"
        INSERT INTO platform_notifications (user_id, kind, title, message, data, expires_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(kind)
    .bind(title)
    .bind(message)
    .bind(data)
    .bind(expires_at)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Insert the same notification for many users. Returns the inserted count.
pub async fn insert_bulk(
    pool: &PgPool,
    user_ids: &[Uuid],
    kind: &str,
    title: &str,
    message: &str,
    data: &serde_json::Value,
    expires_at: Option<DateTime<Utc>>,
) -> Result<u64> {
    if user_ids.is_empty() {
        return Ok(0);
    }
    let result = sqlx::query(
        r#"
        INSERT INTO platform_notifications (user_id, kind, title, message, data, expires_at)
        SELECT uid, $2, $3, $4, $5, $6
        FROM UNNEST($1::uuid[]) AS uid
        "#,
    )
    .bind(user_ids)
    .bind(kind)
    .bind(title)
    .bind(message)
    .bind(data)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Active notifications for a user: unread and not expired, newest first.
pub async fn list_active(pool: &PgPool, user_id: Uuid, limit: i64) -> Result<Vec<Notification>> {
    let rows = sqlx::query_as::<_, Notification>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM platform_notifications
        WHERE user_id = $1
          AND read_at IS NULL
          AND (expires_at IS NULL OR expires_at > NOW())
        ORDER BY created_at DESC
        LIMIT $2
        "#
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn count_unread(pool: &PgPool, user_id: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM platform_notifications WHERE user_id = $1 AND read_at IS NULL",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Mark one notification as read, scoped to its owner.
pub async fn mark_read(pool: &PgPool, user_id: Uuid, notification_id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE platform_notifications
        SET read_at = NOW()
        WHERE id = $1 AND user_id = $2 AND read_at IS NULL
        "#,
    )
    .bind(notification_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Mark every unread notification of a user as read. Returns the count.
pub async fn mark_all_read(pool: &PgPool, user_id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE platform_notifications SET read_at = NOW() WHERE user_id = $1 AND read_at IS NULL",
    )
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn count_expired(pool: &PgPool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM platform_notifications WHERE expires_at < NOW()",
    )
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// A small preview of expired rows, for the cleanup command's dry-run mode.
pub async fn preview_expired(pool: &PgPool, limit: i64) -> Result<Vec<Notification>> {
    let rows = sqlx::query_as::<_, Notification>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM platform_notifications
        WHERE expires_at < NOW()
        ORDER BY expires_at ASC
        LIMIT $1
        "#
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Delete every expired notification. Returns the number of rows removed.
pub async fn delete_expired(pool: &PgPool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM platform_notifications WHERE expires_at < NOW()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn count_all(pool: &PgPool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM platform_notifications")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn count_unread_all(pool: &PgPool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM platform_notifications WHERE read_at IS NULL",
    )
    .fetch_one(pool)
    .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn notification(expires_at: Option<DateTime<Utc>>) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            kind: "system_alert".into(),
            title: "t".into(),
            message: "m".into(),
            data: serde_json::json!({}),
            read_at: None,
            expires_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn expiry_requires_a_past_deadline() {
        let now = Utc::now();
        assert!(!notification(None).is_expired_at(now));
        assert!(!notification(Some(now + Duration::hours(1))).is_expired_at(now));
        assert!(notification(Some(now - Duration::seconds(1))).is_expired_at(now));
    }
}
