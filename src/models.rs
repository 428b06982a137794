use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
}

impl PostStatus {
    pub fn parse(value: &str) -> Option<PostStatus> {
        match value {
            "draft" => Some(PostStatus::Draft),
            "published" => Some(PostStatus::Published),
            _ => None,
        }
    }

    /// The publication timestamp a post with this status carries at `now`.
    pub fn published_at(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            PostStatus::Published => Some(now),
            PostStatus::Draft => None,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PostCategory {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostImage {
    pub id: i64,
    pub post_id: i64,
    pub path: String,
}

/// A post row joined with its author and category.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub status: PostStatus,
    pub featured_image: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keyword: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub author_id: i64,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub category_id: i64,
    pub category_name: Option<String>,
}

/// Column values written by a create or an update.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub title: String,
    pub post_category_id: i64,
    pub content: String,
    pub status: PostStatus,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keyword: Option<String>,
}

/// Which rows the soft-delete filter lets through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrashedScope {
    #[default]
    Without,
    With,
    Only,
}

impl TrashedScope {
    pub(crate) fn filter(self) -> &'static str {
        match self {
            TrashedScope::Without => "posts.deleted_at IS NULL",
            TrashedScope::With => "1 = 1",
            TrashedScope::Only => "posts.deleted_at IS NOT NULL",
        }
    }
}
