use std::collections::BTreeMap;

use axum::{http::StatusCode, response::IntoResponse, Json};
use validator::ValidationErrors;

use crate::JsonResponse;

/// Field name to the messages of every rule it failed.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Not Found")]
    NotFound,
    #[error("{0}")]
    NotAuthorized(&'static str),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    RunTimeError(&'static str),
    #[error("The given data was invalid.")]
    Validation(FieldErrors),
    #[error("Internal Server Error")]
    ServerError,
    #[error(transparent)]
    DatabaseError(#[from] sqlx::Error),
    #[error(transparent)]
    StorageError(#[from] std::io::Error),
}

#[derive(serde::Serialize)]
pub struct RequestErrorJsonWrapper {
    errors: FieldErrors,
}

impl RequestErrorJsonWrapper {
    pub fn new(error: &str) -> RequestErrorJsonWrapper {
        let mut errors = FieldErrors::new();
        errors.insert("body".to_string(), vec![error.to_string()]);
        RequestErrorJsonWrapper { errors }
    }

    pub fn fields(errors: FieldErrors) -> RequestErrorJsonWrapper {
        RequestErrorJsonWrapper { errors }
    }
}

impl From<ValidationErrors> for RequestError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(field_errors(&value))
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> axum::response::Response {
        self.to_json_response().into_response()
    }
}

impl RequestError {
    /// Single-field validation failure.
    pub fn invalid(field: &str, message: &str) -> RequestError {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.to_string()]);
        RequestError::Validation(errors)
    }

    pub fn to_json_response(&self) -> JsonResponse<RequestErrorJsonWrapper> {
        let (status_code, json) = match self {
            RequestError::NotFound => (
                StatusCode::NOT_FOUND,
                RequestErrorJsonWrapper::new("Not Found"),
            ),
            RequestError::NotAuthorized(message) => (
                StatusCode::UNAUTHORIZED,
                RequestErrorJsonWrapper::new(message),
            ),
            RequestError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, RequestErrorJsonWrapper::new(message))
            }
            RequestError::RunTimeError(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                RequestErrorJsonWrapper::new(message),
            ),
            RequestError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                RequestErrorJsonWrapper::fields(errors.clone()),
            ),
            RequestError::ServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                RequestErrorJsonWrapper::new("Internal Server Error"),
            ),
            RequestError::DatabaseError(e) => {
                tracing::error!(%e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    RequestErrorJsonWrapper::new("Internal Server Error"),
                )
            }
            RequestError::StorageError(e) => {
                tracing::error!(%e, "file storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    RequestErrorJsonWrapper::new("Internal Server Error"),
                )
            }
        };
        (status_code, Json(json))
    }
}

/// Flattens validator's errors into field name -> messages, falling back to
/// the rule code when a rule carries no message.
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let messages: Vec<String> = errors
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => e.code.to_string(),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

/// SQLite's extended result code for a violated UNIQUE constraint.
const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";

/// True when a database error is a violated UNIQUE constraint.
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(e) => e.code().as_deref() == Some(SQLITE_CONSTRAINT_UNIQUE),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_helpers::fixtures;

    #[tokio::test]
    async fn only_unique_constraint_errors_count_as_unique_violations() {
        let (_dir, pool) = fixtures::test_pool().await;
        fixtures::user(&pool, "taken@example.com").await;

        let duplicate = sqlx::query(
            "INSERT INTO users (name, email, password, created_at) VALUES ('b', 'taken@example.com', 'x', 'now')",
        )
        .execute(&pool)
        .await
        .unwrap_err();
        assert!(is_unique_violation(&duplicate));

        let not_null = sqlx::query("INSERT INTO post_categories (name) VALUES (NULL)")
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(!is_unique_violation(&not_null));
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn validation_errors_render_as_field_lists() {
        let (status, Json(body)) = RequestError::invalid("slug", "The slug has already been taken.")
            .to_json_response();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body.errors["slug"],
            vec!["The slug has already been taken.".to_string()]
        );
    }
}
