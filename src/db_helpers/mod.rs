mod category_helpers;
mod dashboard_helpers;
mod post_helpers;
mod user_helpers;

pub use category_helpers::*;
pub use dashboard_helpers::*;
pub use post_helpers::*;
pub use user_helpers::*;

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, Utc};
    use sqlx::SqlitePool;
    use tempfile::TempDir;

    use crate::models::{PostChanges, PostStatus};

    /// A migrated database in a fresh temporary directory. Keep the directory
    /// alive for as long as the pool is used.
    pub async fn test_pool() -> (TempDir, SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("admin.db").display());
        let pool = crate::init_db(&url).await.unwrap();
        (dir, pool)
    }

    pub async fn user(pool: &SqlitePool, email: &str) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO users (name, email, password, created_at) VALUES (?, ?, 'x', ?) RETURNING id",
        )
        .bind("Admin")
        .bind(email)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
        .unwrap()
    }

    pub async fn category(pool: &SqlitePool, name: &str) -> i64 {
        sqlx::query_scalar("INSERT INTO post_categories (name) VALUES (?) RETURNING id")
            .bind(name)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    pub fn changes(title: &str, category_id: i64, status: PostStatus) -> PostChanges {
        PostChanges {
            title: title.to_string(),
            post_category_id: category_id,
            content: "<p>body</p>".to_string(),
            status,
            meta_title: None,
            meta_description: None,
            meta_keyword: None,
        }
    }

    pub fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }
}
