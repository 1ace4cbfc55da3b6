//! Read-side queries feeding the report pipeline. Sessions belong to an
//! institution through their teacher.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::models::ResultStatus;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct InstitutionRef {
    pub id: Uuid,
    pub name: String,
}

/// A completed session enriched with quiz and teacher context.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionContext {
    pub id: Uuid,
    pub title: String,
    pub quiz_title: String,
    pub teacher_name: String,
    pub institution_id: Option<Uuid>,
    pub institution_name: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// One student result joined with its display context.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResultDetail {
    pub quiz_session_id: Uuid,
    pub session_title: String,
    pub student_name: String,
    pub class_name: Option<String>,
    pub status: ResultStatus,
    pub percentage: f64,
    pub grade: f64,
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdminRecipient {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
}

/// Institutions with at least one completed session ending inside the
/// half-open window [start, end).
pub async fn institutions_with_completed_sessions(
    pool: &PgPool,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<InstitutionRef>> {
    let rows = sqlx::query_as::<_, InstitutionRef>(
        r#"
        SELECT DISTINCT i.id, i.name
        FROM institutions i
        JOIN users t ON t.institution_id = i.id AND t.role = 'TEACHER'
        JOIN quiz_sessions s ON s.teacher_id = t.id
        WHERE s.status = 'completed'
          AND s.ends_at >= $1
          AND s.ends_at < $2
        ORDER BY i.name ASC
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn completed_sessions_for_institution(
    pool: &PgPool,
    institution_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<SessionContext>> {
    let rows = sqlx::query_as::<_, SessionContext>(
        r#"
        SELECT s.id, s.title, q.title AS quiz_title, t.name AS teacher_name,
               t.institution_id, i.name AS institution_name,
               s.starts_at, s.ends_at, s.completed_at
        FROM quiz_sessions s
        JOIN quizzes q ON q.id = s.quiz_id
        JOIN users t ON t.id = s.teacher_id
        LEFT JOIN institutions i ON i.id = t.institution_id
        WHERE t.institution_id = $1
          AND s.status = 'completed'
          AND s.ends_at >= $2
          AND s.ends_at < $3
        ORDER BY s.ends_at ASC
        "#,
    )
    .bind(institution_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn published_results_for_sessions(
    pool: &PgPool,
    session_ids: &[Uuid],
) -> Result<Vec<ResultDetail>> {
    if session_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, ResultDetail>(
        r#"
        SELECT r.quiz_session_id, s.title AS session_title, u.name AS student_name,
               c.name AS class_name, r.status, r.percentage, r.grade, r.submitted_at
        FROM results r
        JOIN quiz_sessions s ON s.id = r.quiz_session_id
        JOIN users u ON u.id = r.student_id
        LEFT JOIN class_groups c ON c.id = u.class_group_id
        WHERE r.quiz_session_id = ANY($1)
          AND r.status = 'published'
        ORDER BY r.percentage DESC
        "#,
    )
    .bind(session_ids)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn administrators_for_institution(
    pool: &PgPool,
    institution_id: Uuid,
) -> Result<Vec<AdminRecipient>> {
    let rows = sqlx::query_as::<_, AdminRecipient>(
        r#"
        SELECT id AS user_id, email, name
        FROM users
        WHERE institution_id = $1
          AND role = 'ADMIN'
          AND is_active = true
        ORDER BY created_at ASC
        "#,
    )
    .bind(institution_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn administrators_by_ids(
    pool: &PgPool,
    ids: &[Uuid],
) -> Result<Vec<AdminRecipient>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, AdminRecipient>(
        r#"
        SELECT id AS user_id, email, name
        FROM users
        WHERE id = ANY($1)
          AND role = 'ADMIN'
          AND is_active = true
        "#,
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn session_context(pool: &PgPool, session_id: Uuid) -> Result<Option<SessionContext>> {
    let row = sqlx::query_as::<_, SessionContext>(
        r#"
        SELECT s.id, s.title, q.title AS quiz_title, t.name AS teacher_name,
               t.institution_id, i.name AS institution_name,
               s.starts_at, s.ends_at, s.completed_at
        FROM quiz_sessions s
        JOIN quizzes q ON q.id = s.quiz_id
        JOIN users t ON t.id = s.teacher_id
        LEFT JOIN institutions i ON i.id = t.institution_id
        WHERE s.id = $1
        "#,
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Every result of a session regardless of status, for the session report.
pub async fn session_results_detail(pool: &PgPool, session_id: Uuid) -> Result<Vec<ResultDetail>> {
    let rows = sqlx::query_as::<_, ResultDetail>(
        r#"
        SELECT r.quiz_session_id, s.title AS session_title, u.name AS student_name,
               c.name AS class_name, r.status, r.percentage, r.grade, r.submitted_at
        FROM results r
        JOIN quiz_sessions s ON s.id = r.quiz_session_id
        JOIN users u ON u.id = r.student_id
        LEFT JOIN class_groups c ON c.id = u.class_group_id
        WHERE r.quiz_session_id = $1
        ORDER BY u.name ASC
        "#,
    )
    .bind(session_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
