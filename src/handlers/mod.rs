mod dashboard;
mod posts;
mod uploads;
mod users;

pub use dashboard::*;
pub use posts::*;
pub use uploads::*;
pub use users::*;

use axum::{
    http::{StatusCode, Uri},
    Json,
};

use crate::errors::RequestError;

type JsonResult<T> = Result<Json<T>, RequestError>;

// ----------------- Helper Handlers -----------------
pub async fn alive() -> &'static str {
    "alive"
}

pub async fn not_found(uri: Uri) -> Result<(), (StatusCode, String)> {
    Err((
        StatusCode::NOT_FOUND,
        format!("URL {} provided was not found", uri),
    ))
}
