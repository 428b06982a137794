use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::{data_formats::DashboardResponse, errors::RequestError};

/// The dashboard's four counts for the calendar day `today` (UTC).
///
/// Trashed projects and posts are not counted. Visitors and messages match on
/// the date part of their timestamp column, whatever text form it was written
/// in (`2024-03-15`, `2024-03-15 10:00:00`, RFC 3339).
pub async fn get_dashboard_counts_from_db(
    pool: &SqlitePool,
    today: NaiveDate,
) -> Result<DashboardResponse, RequestError> {
    let (projects, posts, today_visitors, today_messages) = tokio::try_join!(
        count(pool, "SELECT COUNT(*) FROM projects WHERE deleted_at IS NULL"),
        count(pool, "SELECT COUNT(*) FROM posts WHERE deleted_at IS NULL"),
        count_on_day(pool, "SELECT COUNT(*) FROM visitors WHERE date(visit_date) = ?", today),
        count_on_day(pool, "SELECT COUNT(*) FROM messages WHERE date(created_at) = ?", today),
    )?;

    Ok(DashboardResponse {
        projects,
        posts,
        today_visitors,
        today_messages,
    })
}

async fn count(pool: &SqlitePool, query: &'static str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(query).fetch_one(pool).await
}

async fn count_on_day(
    pool: &SqlitePool,
    query: &'static str,
    day: NaiveDate,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(query)
        .bind(day)
        .fetch_one(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use crate::db_helpers::{fixtures, insert_post_in_db, soft_delete_post_in_db};
    use crate::models::PostStatus;

    async fn visitor(pool: &SqlitePool, day: NaiveDate) {
        sqlx::query("INSERT INTO visitors (ip_address, visit_date, created_at) VALUES ('127.0.0.1', ?, ?)")
            .bind(day)
            .bind(Utc::now())
            .execute(pool)
            .await
            .unwrap();
    }

    async fn message(pool: &SqlitePool, created_at: DateTime<Utc>) {
        sqlx::query("INSERT INTO messages (name, email, body, created_at) VALUES ('a', 'a@b.c', 'hi', ?)")
            .bind(created_at)
            .execute(pool)
            .await
            .unwrap();
    }

    async fn project(pool: &SqlitePool, deleted_at: Option<DateTime<Utc>>) {
        sqlx::query("INSERT INTO projects (title, created_at, deleted_at) VALUES ('p', ?, ?)")
            .bind(Utc::now())
            .bind(deleted_at)
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn counts_only_active_rows_and_same_day_activity() {
        let (_dir, pool) = fixtures::test_pool().await;
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();

        project(&pool, None).await;
        project(&pool, None).await;
        project(&pool, Some(Utc::now())).await;

        let author = fixtures::user(&pool, "a@example.com").await;
        let category = fixtures::category(&pool, "News").await;
        let now = Utc::now();
        for (i, title) in ["one", "two", "three"].iter().enumerate() {
            let slug = format!("{}-{}", title, i);
            insert_post_in_db(
                &pool,
                author,
                &fixtures::changes(title, category, PostStatus::Draft),
                &slug,
                None,
                now,
            )
            .await
            .unwrap();
        }
        let trashed = insert_post_in_db(
            &pool,
            author,
            &fixtures::changes("gone", category, PostStatus::Draft),
            "gone",
            None,
            now,
        )
        .await
        .unwrap();
        assert!(soft_delete_post_in_db(&pool, trashed, now).await.unwrap());

        visitor(&pool, today).await;
        visitor(&pool, today).await;
        visitor(&pool, yesterday).await;

        message(&pool, fixtures::at("2024-03-15T00:00:00Z")).await;
        message(&pool, fixtures::at("2024-03-15T13:45:10.250Z")).await;
        message(&pool, fixtures::at("2024-03-15T23:59:59.999Z")).await;
        message(&pool, fixtures::at("2024-03-14T23:59:59.999Z")).await;
        message(&pool, fixtures::at("2024-03-16T00:00:00Z")).await;

        let counts = get_dashboard_counts_from_db(&pool, today).await.unwrap();
        assert_eq!(
            counts,
            DashboardResponse {
                projects: 2,
                posts: 3,
                today_visitors: 2,
                today_messages: 3,
            }
        );
    }

    #[tokio::test]
    async fn matches_the_date_part_of_plain_sqlite_timestamps() {
        let (_dir, pool) = fixtures::test_pool().await;
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

        for (ip_address, visit_date) in [
            ("10.0.0.1", "2024-03-15 08:00:00"),
            ("10.0.0.2", "2024-03-15"),
            ("10.0.0.3", "2024-03-14 23:59:59"),
        ] {
            sqlx::query(
                "INSERT INTO visitors (ip_address, visit_date, created_at) VALUES (?, ?, '2024-03-15 08:00:00')",
            )
            .bind(ip_address)
            .bind(visit_date)
            .execute(&pool)
            .await
            .unwrap();
        }
        for created_at in ["2024-03-15 10:00:00", "2024-03-15 00:00:00", "2024-03-16 00:00:00"] {
            sqlx::query(
                "INSERT INTO messages (name, email, body, created_at) VALUES ('a', 'a@b.c', 'hi', ?)",
            )
            .bind(created_at)
            .execute(&pool)
            .await
            .unwrap();
        }

        let counts = get_dashboard_counts_from_db(&pool, today).await.unwrap();
        assert_eq!(counts.today_visitors, 2);
        assert_eq!(counts.today_messages, 2);
    }

    #[tokio::test]
    async fn empty_database_counts_zero() {
        let (_dir, pool) = fixtures::test_pool().await;
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let counts = get_dashboard_counts_from_db(&pool, today).await.unwrap();
        assert_eq!(counts.projects + counts.posts, 0);
        assert_eq!(counts.today_visitors + counts.today_messages, 0);
    }
}
