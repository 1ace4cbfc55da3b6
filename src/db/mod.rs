pub mod notifications;
pub mod reports;
pub mod seed;

use crate::domain::models::{ResultStatus, SessionStatus, UserRole};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub hash: String,
    pub name: String,
    pub role: UserRole,
    pub institution_id: Option<Uuid>,
    pub class_group_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Institution {
    pub id: Uuid,
    pub name: String,
    pub city: Option<String>,
    pub contact_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct ClassGroup {
    pub id: Uuid,
    pub institution_id: Uuid,
    pub name: String,
    pub level: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Quiz {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub title: String,
    pub subject: String,
    pub duration_minutes: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct QuizSession {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub teacher_id: Uuid,
    pub session_code: String,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub max_participants: Option<i32>,
    pub activated_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct ResultRow {
    pub id: Uuid,
    pub quiz_session_id: Uuid,
    pub student_id: Uuid,
    pub total_points: f64,
    pub max_points: f64,
    pub percentage: f64,
    pub grade: f64,
    pub status: ResultStatus,
    pub started_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub graded_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
}

// ========== Users ==========

const USER_COLUMNS: &str = "id, email, hash, name, role, institution_id, class_group_id, is_active, created_at, updated_at";

pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND is_active = true"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn find_user_by_id(pool: &PgPool, id: Uuid) -> Result<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn list_users(pool: &PgPool, role: Option<UserRole>) -> Result<Vec<DbUser>> {
    let users = match role {
        Some(role) => {
            sqlx::query_as::<_, DbUser>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE role = $1 ORDER BY created_at ASC"
            ))
            .bind(role)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, DbUser>(&format!(
                "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
            ))
            .fetch_all(pool)
            .await?
        }
    };
    Ok(users)
}

pub async fn email_taken(pool: &PgPool, email: &str) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = $1")
            .bind(email)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_user(
    pool: &PgPool,
    email: &str,
    hash: &str,
    name: &str,
    role: UserRole,
    institution_id: Option<Uuid>,
    class_group_id: Option<Uuid>,
) -> Result<DbUser> {
    let user = sqlx::query_as::<_, DbUser>(&format!(
        r#"
        INSERT INTO users (email, hash, name, role, institution_id, class_group_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(email)
    .bind(hash)
    .bind(name)
    .bind(role)
    .bind(institution_id)
    .bind(class_group_id)
    .fetch_one(pool)
    .await?;
    Ok(user)
}

pub async fn update_user_profile(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    institution_id: Option<Uuid>,
    class_group_id: Option<Uuid>,
) -> Result<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(&format!(
        r#"
        UPDATE users
        SET name = $2, institution_id = $3, class_group_id = $4, updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(name)
    .bind(institution_id)
    .bind(class_group_id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn set_user_active(pool: &PgPool, id: Uuid, active: bool) -> Result<bool> {
    let result = sqlx::query("UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(active)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ========== Institutions ==========

pub async fn list_institutions(pool: &PgPool) -> Result<Vec<Institution>> {
    let rows = sqlx::query_as::<_, Institution>(
        "SELECT id, name, city, contact_email, created_at, updated_at FROM institutions ORDER BY name ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_institution(pool: &PgPool, id: Uuid) -> Result<Option<Institution>> {
    let row = sqlx::query_as::<_, Institution>(
        "SELECT id, name, city, contact_email, created_at, updated_at FROM institutions WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn insert_institution(
    pool: &PgPool,
    name: &str,
    city: Option<&str>,
    contact_email: Option<&str>,
) -> Result<Institution> {
    let row = sqlx::query_as::<_, Institution>(
        r#"
        INSERT INTO institutions (name, city, contact_email)
        VALUES ($1, $2, $3)
        RETURNING id, name, city, contact_email, created_at, updated_at
        "#,
    )
    .bind(name)
    .bind(city)
    .bind(contact_email)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn update_institution(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    city: Option<&str>,
    contact_email: Option<&str>,
) -> Result<Option<Institution>> {
    let row = sqlx::query_as::<_, Institution>(
        r#"
        UPDATE institutions
        SET name = $2, city = $3, contact_email = $4, updated_at = NOW()
        WHERE id = $1
        RETURNING id, name, city, contact_email, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(city)
    .bind(contact_email)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn delete_institution(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM institutions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ========== Class groups ==========

pub async fn list_class_groups(pool: &PgPool, institution_id: Uuid) -> Result<Vec<ClassGroup>> {
    let rows = sqlx::query_as::<_, ClassGroup>(
        r#"
        SELECT id, institution_id, name, level, created_at
        FROM class_groups
        WHERE institution_id = $1
        ORDER BY name ASC
        "#,
    )
    .bind(institution_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn insert_class_group(
    pool: &PgPool,
    institution_id: Uuid,
    name: &str,
    level: Option<&str>,
) -> Result<ClassGroup> {
    let row = sqlx::query_as::<_, ClassGroup>(
        r#"
        INSERT INTO class_groups (institution_id, name, level)
        VALUES ($1, $2, $3)
        RETURNING id, institution_id, name, level, created_at
        "#,
    )
    .bind(institution_id)
    .bind(name)
    .bind(level)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn update_class_group(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    level: Option<&str>,
) -> Result<Option<ClassGroup>> {
    let row = sqlx::query_as::<_, ClassGroup>(
        r#"
        UPDATE class_groups
        SET name = $2, level = $3
        WHERE id = $1
        RETURNING id, institution_id, name, level, created_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(level)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn delete_class_group(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM class_groups WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ========== Quizzes ==========

pub async fn list_quizzes_by_teacher(pool: &PgPool, teacher_id: Uuid) -> Result<Vec<Quiz>> {
    let rows = sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, teacher_id, title, subject, duration_minutes, created_at
        FROM quizzes
        WHERE teacher_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(teacher_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_quiz(pool: &PgPool, id: Uuid) -> Result<Option<Quiz>> {
    let row = sqlx::query_as::<_, Quiz>(
        "SELECT id, teacher_id, title, subject, duration_minutes, created_at FROM quizzes WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn insert_quiz(
    pool: &PgPool,
    teacher_id: Uuid,
    title: &str,
    subject: &str,
    duration_minutes: i32,
) -> Result<Quiz> {
    let row = sqlx::query_as::<_, Quiz>(
        r#"
        INSERT INTO quizzes (teacher_id, title, subject, duration_minutes)
        VALUES ($1, $2, $3, $4)
        RETURNING id, teacher_id, title, subject, duration_minutes, created_at
        "#,
    )
    .bind(teacher_id)
    .bind(title)
    .bind(subject)
    .bind(duration_minutes)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn update_quiz(
    pool: &PgPool,
    id: Uuid,
    title: &str,
    subject: &str,
    duration_minutes: i32,
) -> Result<Option<Quiz>> {
    let row = sqlx::query_as::<_, Quiz>(
        r#"
        UPDATE quizzes
        SET title = $2, subject = $3, duration_minutes = $4
        WHERE id = $1
        RETURNING id, teacher_id, title, subject, duration_minutes, created_at
        "#,
    )
    .bind(id)
    .bind(title)
    .bind(subject)
    .bind(duration_minutes)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn delete_quiz(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ========== Quiz sessions ==========

const SESSION_COLUMNS: &str = "id, quiz_id, teacher_id, session_code, title, starts_at, ends_at, status, max_participants, activated_at, completed_at, created_at";

pub async fn list_sessions_by_teacher(pool: &PgPool, teacher_id: Uuid) -> Result<Vec<QuizSession>> {
    let rows = sqlx::query_as::<_, QuizSession>(&format!(
        "SELECT {SESSION_COLUMNS} FROM quiz_sessions WHERE teacher_id = $1 ORDER BY starts_at DESC"
    ))
    .bind(teacher_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_session(pool: &PgPool, id: Uuid) -> Result<Option<QuizSession>> {
    let row = sqlx::query_as::<_, QuizSession>(&format!(
        "SELECT {SESSION_COLUMNS} FROM quiz_sessions WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn session_code_exists(pool: &PgPool, code: &str) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM quiz_sessions WHERE session_code = $1")
            .bind(code)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_session(
    pool: &PgPool,
    quiz_id: Uuid,
    teacher_id: Uuid,
    session_code: &str,
    title: &str,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    max_participants: Option<i32>,
) -> Result<QuizSession> {
    let row = sqlx::query_as::<_, QuizSession>(&format!(
        r#"
        INSERT INTO quiz_sessions (quiz_id, teacher_id, session_code, title, starts_at, ends_at, max_participants)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {SESSION_COLUMNS}
        "#
    ))
    .bind(quiz_id)
    .bind(teacher_id)
    .bind(session_code)
    .bind(title)
    .bind(starts_at)
    .bind(ends_at)
    .bind(max_participants)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn update_session(
    pool: &PgPool,
    id: Uuid,
    title: &str,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    max_participants: Option<i32>,
) -> Result<Option<QuizSession>> {
    let row = sqlx::query_as::<_, QuizSession>(&format!(
        r#"
        UPDATE quiz_sessions
        SET title = $2, starts_at = $3, ends_at = $4, max_participants = $5
        WHERE id = $1
        RETURNING {SESSION_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(title)
    .bind(starts_at)
    .bind(ends_at)
    .bind(max_participants)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn delete_session(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM quiz_sessions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn activate_session(pool: &PgPool, id: Uuid) -> Result<Option<QuizSession>> {
    let row = sqlx::query_as::<_, QuizSession>(&format!(
        r#"
        UPDATE quiz_sessions
        SET status = 'active', activated_at = NOW()
        WHERE id = $1 AND status = 'scheduled'
        RETURNING {SESSION_COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn complete_session(pool: &PgPool, id: Uuid) -> Result<Option<QuizSession>> {
    let row = sqlx::query_as::<_, QuizSession>(&format!(
        r#"
        UPDATE quiz_sessions
        SET status = 'completed', completed_at = NOW()
        WHERE id = $1 AND status = 'active'
        RETURNING {SESSION_COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn cancel_session(pool: &PgPool, id: Uuid) -> Result<Option<QuizSession>> {
    let row = sqlx::query_as::<_, QuizSession>(&format!(
        r#"
        UPDATE quiz_sessions
        SET status = 'cancelled'
        WHERE id = $1 AND status IN ('scheduled', 'active')
        RETURNING {SESSION_COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

// ========== Dashboard ==========

#[derive(Debug, Serialize, FromRow)]
pub struct DashboardStats {
    pub teachers: i64,
    pub students: i64,
    pub class_groups: i64,
    pub completed_sessions: i64,
    pub published_results: i64,
}

pub async fn dashboard_stats(pool: &PgPool, institution_id: Uuid) -> Result<DashboardStats> {
    let stats = sqlx::query_as::<_, DashboardStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users WHERE institution_id = $1 AND role = 'TEACHER' AND is_active = true) AS teachers,
            (SELECT COUNT(*) FROM users WHERE institution_id = $1 AND role = 'STUDENT' AND is_active = true) AS students,
            (SELECT COUNT(*) FROM class_groups WHERE institution_id = $1) AS class_groups,
            (SELECT COUNT(*) FROM quiz_sessions qs
                JOIN users t ON t.id = qs.teacher_id
                WHERE t.institution_id = $1 AND qs.status = 'completed') AS completed_sessions,
            (SELECT COUNT(*) FROM results r
                JOIN quiz_sessions qs ON qs.id = r.quiz_session_id
                JOIN users t ON t.id = qs.teacher_id
                WHERE t.institution_id = $1 AND r.status = 'published') AS published_results
        "#,
    )
    .bind(institution_id)
    .fetch_one(pool)
    .await?;
    Ok(stats)
}

// ========== Results ==========

pub async fn results_for_session(pool: &PgPool, session_id: Uuid) -> Result<Vec<ResultRow>> {
    let rows = sqlx::query_as::<_, ResultRow>(
        r#"
        SELECT id, quiz_session_id, student_id, total_points, max_points, percentage, grade,
               status, started_at, submitted_at, graded_at, published_at
        FROM results
        WHERE quiz_session_id = $1
        ORDER BY percentage DESC
        "#,
    )
    .bind(session_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn published_results_for_student(pool: &PgPool, student_id: Uuid) -> Result<Vec<ResultRow>> {
    let rows = sqlx::query_as::<_, ResultRow>(
        r#"
        SELECT id, quiz_session_id, student_id, total_points, max_points, percentage, grade,
               status, started_at, submitted_at, graded_at, published_at
        FROM results
        WHERE student_id = $1 AND status = 'published'
        ORDER BY published_at DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Publish every graded result of a session. Returns the number of rows moved.
pub async fn publish_graded_results(pool: &PgPool, session_id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE results
        SET status = 'published', published_at = NOW()
        WHERE quiz_session_id = $1 AND status = 'graded'
        "#,
    )
    .bind(session_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
