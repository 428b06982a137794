use sqlx::SqlitePool;

use crate::{errors::RequestError, models::PostCategory};

pub async fn list_categories(pool: &SqlitePool) -> Result<Vec<PostCategory>, RequestError> {
    let result = sqlx::query_as::<_, PostCategory>(
        r#"
        SELECT id, name FROM post_categories ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(result)
}

pub async fn category_exists(pool: &SqlitePool, id: i64) -> Result<bool, RequestError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM post_categories WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}
