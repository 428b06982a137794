use std::sync::Arc;

use axum::{Extension, Json};

use super::JsonResult;
use crate::{
    authentication::{get_jwt_token, verify_password_argon2},
    data_formats::{LoginRequest, UserResponse, UserWrapper},
    db_helpers::get_user_by_email,
    errors::RequestError,
    AppContext,
};

type UserJson = UserWrapper<UserResponse>;

const BAD_CREDENTIALS: &str = "These credentials do not match our records.";

pub async fn login_user(
    Extension(ctx): Extension<Arc<AppContext>>,
    Json(UserWrapper { user: request }): Json<UserWrapper<LoginRequest>>,
) -> JsonResult<UserJson> {
    let user = match get_user_by_email(&ctx.pool, request.email.trim()).await? {
        Some(user) => user,
        None => {
            tracing::info!(email = %request.email, "login for unknown email");
            return Err(RequestError::RunTimeError(BAD_CREDENTIALS));
        }
    };

    let is_password_correct = verify_password_argon2(request.password, &user.password)
        .await
        .map_err(|e| {
            tracing::error!(%e, "could not verify password");
            RequestError::ServerError
        })?;
    if !is_password_correct {
        tracing::info!(user_id = user.id, "login with wrong password");
        return Err(RequestError::RunTimeError(BAD_CREDENTIALS));
    }

    let token = get_jwt_token(&ctx.config.jwt_secret, user.id).map_err(|e| {
        tracing::error!(%e, "could not sign token");
        RequestError::ServerError
    })?;
    tracing::info!(user_id = user.id, "administrator signed in");
    Ok(Json(UserWrapper::wrap_with_user_data(UserResponse::new(
        user, token,
    ))))
}
