use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    models::{Post, PostImage, PostStatus, User},
    storage::PublicStorage,
};

#[derive(Deserialize, Serialize, Debug)]
pub struct UserResponse {
    pub email: String,
    pub token: String,
    pub name: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct AuthorResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct PostImageResponse {
    pub id: i64,
    pub path: String,
    pub url: String,
}

#[derive(Serialize, Debug)]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub status: PostStatus,
    pub featured_image: Option<String>,
    pub featured_image_url: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keyword: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub author: Option<AuthorResponse>,
    pub category: Option<CategoryResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<PostImageResponse>>,
}

#[derive(Serialize, Debug)]
pub struct PostPageResponse {
    pub data: Vec<PostResponse>,
    pub current_page: u32,
    pub per_page: u32,
    pub total: i64,
    pub last_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<&'static str>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct DashboardResponse {
    pub projects: i64,
    pub posts: i64,
    pub today_visitors: i64,
    pub today_messages: i64,
}

#[derive(Serialize, Debug)]
pub struct UploadErrorMessage {
    pub message: &'static str,
}

/// Reply shape the rich-text editor's upload adapter expects.
#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum UploadResponse {
    Uploaded {
        uploaded: bool,
        url: String,
    },
    Failed {
        uploaded: bool,
        error: UploadErrorMessage,
    },
}

impl UserResponse {
    pub fn new(User { name, email, .. }: User, token: String) -> Self {
        UserResponse { email, token, name }
    }
}

impl PostResponse {
    pub fn new(post: Post, images: Option<Vec<PostImage>>, storage: &PublicStorage) -> Self {
        let author = match (post.author_name, post.author_email) {
            (Some(name), Some(email)) => Some(AuthorResponse {
                id: post.author_id,
                name,
                email,
            }),
            _ => None,
        };
        let category = post.category_name.map(|name| CategoryResponse {
            id: post.category_id,
            name,
        });
        let images = images.map(|images| {
            images
                .into_iter()
                .map(|image| PostImageResponse {
                    id: image.id,
                    url: storage.url(&image.path),
                    path: image.path,
                })
                .collect()
        });

        PostResponse {
            id: post.id,
            title: post.title,
            slug: post.slug,
            content: post.content,
            status: post.status,
            featured_image_url: post.featured_image.as_deref().map(|p| storage.url(p)),
            featured_image: post.featured_image,
            meta_title: post.meta_title,
            meta_description: post.meta_description,
            meta_keyword: post.meta_keyword,
            published_at: post.published_at,
            created_at: post.created_at,
            updated_at: post.updated_at,
            deleted_at: post.deleted_at,
            author,
            category,
            images,
        }
    }
}

impl UploadResponse {
    pub fn uploaded(url: String) -> Self {
        UploadResponse::Uploaded {
            uploaded: true,
            url,
        }
    }

    pub fn missing_file() -> Self {
        UploadResponse::Failed {
            uploaded: false,
            error: UploadErrorMessage {
                message: "No file uploaded.",
            },
        }
    }
}
