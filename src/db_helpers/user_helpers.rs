use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    authentication::hash_password_argon2, config::AdminSeed, errors::RequestError, models::User,
};

pub async fn get_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, RequestError> {
    let result = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, password, created_at FROM users WHERE email = ?
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(result)
}

pub async fn insert_user(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, RequestError> {
    let mut tx = pool.begin().await?;
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email, password, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING id, name, email, password, created_at
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(Utc::now())
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(user)
}

/// Creates the configured administrator unless a user with that email exists.
pub async fn ensure_admin_user(pool: &SqlitePool, seed: &AdminSeed) -> anyhow::Result<()> {
    if get_user_by_email(pool, &seed.email).await?.is_some() {
        return Ok(());
    }
    let hash = hash_password_argon2(seed.password.clone()).await?;
    let user = insert_user(pool, &seed.name, &seed.email, &hash).await?;
    tracing::info!(user_id = user.id, email = %user.email, "seeded administrator");
    Ok(())
}
