mod authentication;
pub mod config;
mod data_formats;
mod db_helpers;
mod errors;
mod flash;
mod handlers;
mod models;
mod slug;
mod storage;

use anyhow::Context;
pub use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::*,
    Extension, Json, Router,
};
use handlers::*;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::{
    net::TcpListener,
    sync::Arc,
    time::Duration,
};
use tower_http::{
    classify::ServerErrorsFailureClass,
    services::ServeDir,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing_subscriber::{fmt::time::ChronoLocal, EnvFilter};

pub use authentication::{get_jwt_token, hash_password_argon2};
pub use config::{AdminSeed, Config};
pub use data_formats::*;
pub use db_helpers::ensure_admin_user;
pub use storage::PublicStorage;

pub type JsonResponse<T> = (StatusCode, Json<T>);

/// Request bodies above this are refused before any handler runs. Leaves
/// room for a 2 MB image plus the rest of the post form.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Everything a handler needs, shared behind an `Arc` extension.
pub struct AppContext {
    pub pool: SqlitePool,
    pub config: Config,
    pub storage: PublicStorage,
}

impl AppContext {
    pub fn new(pool: SqlitePool, config: Config) -> AppContext {
        let storage = PublicStorage::new(&config.storage_root, config.public_url.clone());
        AppContext {
            pool,
            config,
            storage,
        }
    }
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("SITE_ADMIN_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));
    tracing_subscriber::fmt()
        .with_target(false)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string()))
        .with_env_filter(filter)
        .init();
}

/// Opens the database, seeds the administrator and serves until the process
/// is stopped.
pub async fn run_app(config: Config) -> Result<()> {
    let pool = init_db(&config.database_url).await?;
    if let Some(seed) = &config.admin {
        ensure_admin_user(&pool, seed).await?;
    }

    let address = config.bind_address;
    let ctx = Arc::new(AppContext::new(pool, config));
    let listener = TcpListener::bind(address)
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!(%address, "server started");
    serve(make_router(ctx), listener).await
}

pub async fn serve(app: Router, listener: TcpListener) -> Result<()> {
    axum::Server::from_tcp(listener)?
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

pub async fn init_db(db_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        tracing::info!(db_url, "creating database");
        Sqlite::create_database(db_url)
            .await
            .with_context(|| format!("Failed to create database {}", db_url))?;
    } else {
        tracing::debug!(db_url, "database already exists");
    }
    let pool = SqlitePool::connect(db_url).await?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::debug!("migrations completed");
    Ok(pool)
}

pub fn make_router(ctx: Arc<AppContext>) -> Router {
    let storage_root = ctx.storage.root().to_path_buf();

    let admin = Router::new()
        .route("/login", post(login_user))
        .route("/dashboard", get(dashboard))
        .route("/posts", get(index_posts).post(store_post))
        .route("/posts/create", get(create_post))
        .route("/posts/upload-image", post(upload_image))
        .route(
            "/posts/:id",
            get(show_post)
                .put(update_post)
                .patch(update_post)
                .delete(destroy_post),
        )
        .route("/posts/:id/edit", get(edit_post));

    Router::new()
        .route("/check_health", get(alive))
        .nest("/admin", admin)
        .nest_service("/storage", ServeDir::new(storage_root))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(Extension(ctx))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(false))
                .on_failure(
                    |error: ServerErrorsFailureClass, latency: Duration, _: &tracing::Span| {
                        tracing::error!(%error, ?latency, "request failed");
                    },
                ),
        )
}
