use serde::{Deserialize, Serialize};

use crate::models::TrashedScope;

use super::get_default_page;

// ----------------- User Request -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// ----------------- Post Request -----------------
#[derive(Deserialize, Debug)]
pub struct PostListParams {
    #[serde(default = "get_default_page")]
    pub page: u32,
    #[serde(default)]
    pub trashed: TrashedScope,
}

#[derive(Deserialize, Debug, Default)]
pub struct PostShowParams {
    #[serde(default)]
    pub trashed: TrashedScope,
}
