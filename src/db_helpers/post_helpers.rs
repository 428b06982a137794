use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::{
    errors::{is_unique_violation, RequestError},
    models::{Post, PostChanges, PostImage, TrashedScope},
    slug::with_timestamp_suffix,
};

const POST_QUERY: &str = r#"
            SELECT posts.id                  AS "id",
                   posts.title               AS "title",
                   posts.slug                AS "slug",
                   posts.content             AS "content",
                   posts.status              AS "status",
                   posts.featured_image      AS "featured_image",
                   posts.meta_title          AS "meta_title",
                   posts.meta_description    AS "meta_description",
                   posts.meta_keyword        AS "meta_keyword",
                   posts.published_at        AS "published_at",
                   posts.created_at          AS "created_at",
                   posts.updated_at          AS "updated_at",
                   posts.deleted_at          AS "deleted_at",
                   posts.user_id             AS "author_id",
                   users.name                AS "author_name",
                   users.email               AS "author_email",
                   posts.post_category_id    AS "category_id",
                   post_categories.name      AS "category_name"
            FROM   posts
                LEFT JOIN users
                    ON users.id = posts.user_id
                LEFT JOIN post_categories
                    ON post_categories.id = posts.post_category_id
"#;

/// One listing page, newest first, with every post's images attached.
pub struct PostPage {
    pub posts: Vec<(Post, Vec<PostImage>)>,
    pub total: i64,
}

/// Lists a page of posts. Authors and categories come from the joined page
/// query and images from a single batched query over the page's ids.
pub async fn list_posts_in_db(
    pool: &SqlitePool,
    page: u32,
    per_page: u32,
    scope: TrashedScope,
) -> Result<PostPage, RequestError> {
    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM posts WHERE {}",
        scope.filter()
    ))
    .fetch_one(pool)
    .await?;

    let offset = i64::from(page.max(1) - 1) * i64::from(per_page);
    let posts = sqlx::query_as::<_, Post>(&format!(
        "{} WHERE {} ORDER BY posts.created_at DESC, posts.id DESC LIMIT ? OFFSET ?",
        POST_QUERY,
        scope.filter()
    ))
    .bind(i64::from(per_page))
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let ids: Vec<i64> = posts.iter().map(|post| post.id).collect();
    let mut images = get_images_for_posts(pool, &ids).await?;

    let posts = posts
        .into_iter()
        .map(|post| {
            let post_images = images.remove(&post.id).unwrap_or_default();
            (post, post_images)
        })
        .collect();

    Ok(PostPage { posts, total })
}

async fn get_images_for_posts(
    pool: &SqlitePool,
    post_ids: &[i64],
) -> Result<HashMap<i64, Vec<PostImage>>, RequestError> {
    let mut grouped: HashMap<i64, Vec<PostImage>> = HashMap::new();
    if post_ids.is_empty() {
        return Ok(grouped);
    }

    let mut builder =
        sqlx::QueryBuilder::<Sqlite>::new("SELECT id, post_id, path FROM post_images WHERE post_id IN (");
    let mut separated = builder.separated(", ");
    for id in post_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY id");

    let images = builder
        .build_query_as::<PostImage>()
        .fetch_all(pool)
        .await?;
    for image in images {
        grouped.entry(image.post_id).or_default().push(image);
    }
    Ok(grouped)
}

pub async fn get_post_by_id_in_db(
    pool: &SqlitePool,
    id: i64,
    scope: TrashedScope,
) -> Result<Option<Post>, RequestError> {
    let post = sqlx::query_as::<_, Post>(&format!(
        "{} WHERE posts.id = ? AND {}",
        POST_QUERY,
        scope.filter()
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(post)
}

/// Inserts a post and returns its id. The slug is written as given.
pub async fn insert_post_in_db(
    pool: &SqlitePool,
    author_id: i64,
    changes: &PostChanges,
    slug: &str,
    featured_image: Option<&str>,
    now: DateTime<Utc>,
) -> Result<i64, RequestError> {
    let mut tx = pool.begin().await?;
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO posts (user_id, post_category_id, title, slug, content, featured_image, status,
                           meta_title, meta_description, meta_keyword, published_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(author_id)
    .bind(changes.post_category_id)
    .bind(&changes.title)
    .bind(slug)
    .bind(&changes.content)
    .bind(featured_image)
    .bind(changes.status)
    .bind(&changes.meta_title)
    .bind(&changes.meta_description)
    .bind(&changes.meta_keyword)
    .bind(changes.status.published_at(now))
    .bind(now)
    .bind(now)
    .fetch_one(&mut tx)
    .await
    .map_err(slug_conflict)?;
    tx.commit().await?;
    Ok(id)
}

/// Overwrites a post's fields and returns the slug it ended up with.
///
/// `slug` is the normalized candidate; when another active post already uses
/// it, `-<unix timestamp>` is appended. Lookup and write share a transaction.
/// `featured_image` replaces the stored path when `Some`. The publication
/// time is recomputed from the new status.
pub async fn update_post_in_db(
    pool: &SqlitePool,
    id: i64,
    changes: &PostChanges,
    slug: &str,
    featured_image: Option<&str>,
    now: DateTime<Utc>,
) -> Result<String, RequestError> {
    let mut tx = pool.begin().await?;
    let slug = resolve_slug(&mut tx, slug, id, now).await?;

    let result = sqlx::query(
        r#"
        UPDATE posts
        SET    title = ?,
               slug = ?,
               post_category_id = ?,
               content = ?,
               featured_image = COALESCE(?, featured_image),
               meta_title = ?,
               meta_description = ?,
               meta_keyword = ?,
               status = ?,
               published_at = ?,
               updated_at = ?
        WHERE  id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(&changes.title)
    .bind(&slug)
    .bind(changes.post_category_id)
    .bind(&changes.content)
    .bind(featured_image)
    .bind(&changes.meta_title)
    .bind(&changes.meta_description)
    .bind(&changes.meta_keyword)
    .bind(changes.status)
    .bind(changes.status.published_at(now))
    .bind(now)
    .bind(id)
    .execute(&mut tx)
    .await
    .map_err(slug_conflict)?;

    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound);
    }
    tx.commit().await?;
    Ok(slug)
}

async fn resolve_slug(
    tx: &mut Transaction<'_, Sqlite>,
    candidate: &str,
    post_id: i64,
    now: DateTime<Utc>,
) -> Result<String, RequestError> {
    let taken: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM posts WHERE slug = ? AND id != ? AND deleted_at IS NULL",
    )
    .bind(candidate)
    .bind(post_id)
    .fetch_one(&mut *tx)
    .await?;

    if taken > 0 || candidate.is_empty() {
        Ok(with_timestamp_suffix(candidate, now.timestamp()))
    } else {
        Ok(candidate.to_string())
    }
}

/// Marks an active post as trashed. Returns `false` when no active post has
/// that id.
pub async fn soft_delete_post_in_db(
    pool: &SqlitePool,
    id: i64,
    now: DateTime<Utc>,
) -> Result<bool, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        "UPDATE posts SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(now)
    .bind(now)
    .bind(id)
    .execute(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

fn slug_conflict(error: sqlx::Error) -> RequestError {
    if is_unique_violation(&error) {
        RequestError::invalid("slug", "The slug has already been taken.")
    } else {
        error.into()
    }
}
