use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;

use super::JsonResult;
use crate::{
    authentication::AuthUser,
    data_formats::{
        image_extension, CreatePostView, EditPostView, PostForm, PostListParams,
        PostPageResponse, PostResponse, PostRules, PostShowParams, PostWrapper, ValidImage,
        POSTS_PER_PAGE,
    },
    db_helpers::{
        get_post_by_id_in_db, insert_post_in_db, list_categories, list_posts_in_db,
        soft_delete_post_in_db, update_post_in_db,
    },
    errors::RequestError,
    flash::{clear_notice, redirect_with_notice, Flash, Notice},
    models::TrashedScope,
    slug::{slug_source, slugify, with_timestamp_suffix},
    storage::{PublicStorage, FEATURED_AREA},
    AppContext,
};

const POSTS_INDEX: &str = "/admin/posts";

// ----------------- Read Handlers -----------------
pub async fn index_posts(
    Extension(ctx): Extension<Arc<AppContext>>,
    _user: AuthUser,
    Flash(notice): Flash,
    Query(params): Query<PostListParams>,
) -> Result<Response, RequestError> {
    let page = params.page.max(1);
    let result = list_posts_in_db(&ctx.pool, page, POSTS_PER_PAGE, params.trashed).await?;

    let data = result
        .posts
        .into_iter()
        .map(|(post, images)| PostResponse::new(post, Some(images), &ctx.storage))
        .collect();
    let body = PostPageResponse {
        data,
        current_page: page,
        per_page: POSTS_PER_PAGE,
        total: result.total,
        last_page: last_page(result.total, POSTS_PER_PAGE),
        notice: notice.map(Notice::message),
    };

    let mut response = Json(body).into_response();
    if notice.is_some() {
        clear_notice(&mut response);
    }
    Ok(response)
}

pub async fn show_post(
    Extension(ctx): Extension<Arc<AppContext>>,
    _user: AuthUser,
    Path(id): Path<i64>,
    Query(params): Query<PostShowParams>,
) -> JsonResult<PostWrapper> {
    let post = get_post_by_id_in_db(&ctx.pool, id, params.trashed)
        .await?
        .ok_or(RequestError::NotFound)?;
    Ok(Json(PostWrapper {
        post: PostResponse::new(post, None, &ctx.storage),
    }))
}

pub async fn create_post(
    Extension(ctx): Extension<Arc<AppContext>>,
    _user: AuthUser,
) -> JsonResult<CreatePostView> {
    let categories = list_categories(&ctx.pool).await?;
    Ok(Json(CreatePostView { categories }))
}

pub async fn edit_post(
    Extension(ctx): Extension<Arc<AppContext>>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> JsonResult<EditPostView> {
    let post = get_post_by_id_in_db(&ctx.pool, id, TrashedScope::Without)
        .await?
        .ok_or(RequestError::NotFound)?;
    let categories = list_categories(&ctx.pool).await?;
    Ok(Json(EditPostView {
        post: PostResponse::new(post, None, &ctx.storage),
        categories,
    }))
}

// ----------------- Write Handlers -----------------
pub async fn store_post(
    Extension(ctx): Extension<Arc<AppContext>>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<Response, RequestError> {
    let post = PostForm::from_multipart(multipart)
        .await?
        .validate_for(&ctx.pool, PostRules::Create)
        .await?;

    let now = Utc::now();
    let slug = with_timestamp_suffix(&slugify(&post.changes.title), now.timestamp());
    let featured_image = store_featured_image(&ctx.storage, post.featured_image.as_ref()).await?;

    let id = match insert_post_in_db(
        &ctx.pool,
        user.id,
        &post.changes,
        &slug,
        featured_image.as_deref(),
        now,
    )
    .await
    {
        Ok(id) => id,
        Err(e) => {
            discard_file(&ctx.storage, featured_image.as_deref()).await;
            return Err(e);
        }
    };

    tracing::info!(post_id = id, %slug, author_id = user.id, "post created");
    Ok(redirect_with_notice(POSTS_INDEX, Notice::PostCreated))
}

pub async fn update_post(
    Extension(ctx): Extension<Arc<AppContext>>,
    user: AuthUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Response, RequestError> {
    let existing = get_post_by_id_in_db(&ctx.pool, id, TrashedScope::Without)
        .await?
        .ok_or(RequestError::NotFound)?;
    let post = PostForm::from_multipart(multipart)
        .await?
        .validate_for(&ctx.pool, PostRules::Update)
        .await?;

    let now = Utc::now();
    let candidate = slug_source(post.slug.as_deref(), &post.changes.title);
    let new_image = store_featured_image(&ctx.storage, post.featured_image.as_ref()).await?;

    let slug = match update_post_in_db(
        &ctx.pool,
        id,
        &post.changes,
        &candidate,
        new_image.as_deref(),
        now,
    )
    .await
    {
        Ok(slug) => slug,
        Err(e) => {
            discard_file(&ctx.storage, new_image.as_deref()).await;
            return Err(e);
        }
    };

    if let (Some(new), Some(old)) = (&new_image, &existing.featured_image) {
        if new != old && ctx.storage.exists(old).await {
            match ctx.storage.delete(old).await {
                Ok(()) => tracing::info!(post_id = id, %old, %new, "featured image replaced"),
                Err(e) => tracing::warn!(%e, post_id = id, %old, "could not remove replaced image"),
            }
        }
    }

    tracing::info!(post_id = id, %slug, editor_id = user.id, "post updated");
    Ok(redirect_with_notice(POSTS_INDEX, Notice::PostUpdated))
}

pub async fn destroy_post(
    Extension(ctx): Extension<Arc<AppContext>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Response, RequestError> {
    if !soft_delete_post_in_db(&ctx.pool, id, Utc::now()).await? {
        return Err(RequestError::NotFound);
    }
    tracing::info!(post_id = id, editor_id = user.id, "post moved to trash");
    Ok(redirect_with_notice(POSTS_INDEX, Notice::PostTrashed))
}

// ----------------- Helpers -----------------
async fn store_featured_image(
    storage: &PublicStorage,
    image: Option<&ValidImage>,
) -> Result<Option<String>, RequestError> {
    match image {
        Some(image) => {
            let path = storage
                .put(FEATURED_AREA, image_extension(image.format), &image.file.bytes)
                .await?;
            Ok(Some(path))
        }
        None => Ok(None),
    }
}

/// Removes a file stored for a write that did not go through.
async fn discard_file(storage: &PublicStorage, path: Option<&str>) {
    if let Some(path) = path {
        if let Err(e) = storage.delete(path).await {
            tracing::warn!(%e, %path, "could not remove orphaned upload");
        }
    }
}

fn last_page(total: i64, per_page: u32) -> u32 {
    let per_page = i64::from(per_page.max(1));
    let pages = (total.max(0) + per_page - 1) / per_page;
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}
