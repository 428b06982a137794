use serde::{Deserialize, Serialize};

use crate::models::PostCategory;

use super::response::PostResponse;

#[derive(Debug, Deserialize, Serialize)]
pub struct UserWrapper<T> {
    pub user: T,
}

#[derive(Debug, Serialize)]
pub struct PostWrapper {
    pub post: PostResponse,
}

/// Data behind the "new post" form.
#[derive(Debug, Serialize)]
pub struct CreatePostView {
    pub categories: Vec<PostCategory>,
}

/// Data behind the "edit post" form.
#[derive(Debug, Serialize)]
pub struct EditPostView {
    pub post: PostResponse,
    pub categories: Vec<PostCategory>,
}

impl<T> UserWrapper<T> {
    pub fn wrap_with_user_data(request: T) -> UserWrapper<T> {
        UserWrapper { user: request }
    }
}
