use std::sync::Arc;

use axum::{Extension, Json};
use chrono::Utc;

use super::JsonResult;
use crate::{
    authentication::AuthUser, data_formats::DashboardResponse,
    db_helpers::get_dashboard_counts_from_db, AppContext,
};

pub async fn dashboard(
    Extension(ctx): Extension<Arc<AppContext>>,
    _user: AuthUser,
) -> JsonResult<DashboardResponse> {
    let counts = get_dashboard_counts_from_db(&ctx.pool, Utc::now().date_naive()).await?;
    Ok(Json(counts))
}
