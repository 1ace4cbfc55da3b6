use crate::domain::models::UserRole;
use anyhow::{anyhow, Result};
use argon2::{password_hash::SaltString, Argon2, PasswordHasher};
use rand_core::OsRng;
use sqlx::PgPool;

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("password hashing failed: {e}"))?;
    Ok(hash.to_string())
}

/// Create the bootstrap administrator when the users table is empty.
/// Controlled by SEED_ADMIN_EMAIL / SEED_ADMIN_PASSWORD.
pub async fn seed_admin(pool: &PgPool) -> Result<()> {
    let (Ok(email), Ok(password)) = (
        std::env::var("SEED_ADMIN_EMAIL"),
        std::env::var("SEED_ADMIN_PASSWORD"),
    ) else {
        tracing::debug!("Seed admin credentials not set, skipping seed");
        return Ok(());
    };

    let user_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    if user_count > 0 {
        return Ok(());
    }

    let hash = hash_password(&password)?;
    crate::db::insert_user(
        pool,
        &email.trim().to_lowercase(),
        &hash,
        "Platform Administrator",
        UserRole::Admin,
        None,
        None,
    )
    .await?;
    tracing::info!("Seeded bootstrap administrator {}", email);
    Ok(())
}
