#![allow(dead_code)]

use std::{net::TcpListener, path::PathBuf, sync::Arc};

use reqwest::{
    multipart::{Form, Part},
    redirect::Policy,
    Client, RequestBuilder, Response,
};
use site_admin::{
    ensure_admin_user, get_jwt_token, init_db, make_router, serve, AdminSeed, AppContext, Config,
};
use sqlx::SqlitePool;
use tempfile::TempDir;

pub const JWT_SECRET: &str = "integration-secret";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";
pub const GIF: &[u8] = b"GIF89a\x01\x00\x01\x00\x80\x00\x00";

pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub pool: SqlitePool,
    pub storage_root: PathBuf,
    pub user_id: i64,
    pub token: String,
    _dir: TempDir,
}

pub async fn spawn_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let database_url = format!("sqlite://{}", dir.path().join("admin.db").display());
    let storage_root = dir.path().join("public");

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let bind_address = listener.local_addr().unwrap();
    let address = format!("http://{}", bind_address);

    let seed = AdminSeed {
        name: "Site Admin".to_string(),
        email: ADMIN_EMAIL.to_string(),
        password: ADMIN_PASSWORD.to_string(),
    };
    let pool = init_db(&database_url).await.unwrap();
    ensure_admin_user(&pool, &seed).await.unwrap();
    let user_id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
        .bind(ADMIN_EMAIL)
        .fetch_one(&pool)
        .await
        .unwrap();

    let config = Config {
        database_url,
        jwt_secret: JWT_SECRET.to_string(),
        bind_address,
        storage_root: storage_root.clone(),
        public_url: address.clone(),
        admin: Some(seed),
    };
    let ctx = Arc::new(AppContext::new(pool.clone(), config));
    tokio::spawn(serve(make_router(ctx), listener));

    let client = Client::builder().redirect(Policy::none()).build().unwrap();
    let token = get_jwt_token(JWT_SECRET, user_id).unwrap();

    TestApp {
        address,
        client,
        pool,
        storage_root,
        user_id,
        token,
        _dir: dir,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Authorization", format!("Token {}", self.token))
    }

    pub async fn get(&self, path: &str) -> Response {
        self.authorized(self.client.get(self.url(path)))
            .send()
            .await
            .unwrap()
    }

    pub async fn get_with_cookie(&self, path: &str, cookie: &str) -> Response {
        self.authorized(self.client.get(self.url(path)))
            .header("Cookie", cookie)
            .send()
            .await
            .unwrap()
    }

    pub async fn get_json(&self, path: &str) -> serde_json::Value {
        let response = self.get(path).await;
        assert_eq!(response.status(), 200, "GET {}", path);
        response.json().await.unwrap()
    }

    pub async fn store_post(&self, form: Form) -> Response {
        self.authorized(self.client.post(self.url("/admin/posts")))
            .multipart(form)
            .send()
            .await
            .unwrap()
    }

    pub async fn update_post(&self, id: i64, form: Form) -> Response {
        self.authorized(self.client.put(self.url(&format!("/admin/posts/{}", id))))
            .multipart(form)
            .send()
            .await
            .unwrap()
    }

    pub async fn destroy_post(&self, id: i64) -> Response {
        self.authorized(self.client.delete(self.url(&format!("/admin/posts/{}", id))))
            .send()
            .await
            .unwrap()
    }

    /// Creates a post through the API and returns its id.
    pub async fn create_post(&self, form: Form) -> i64 {
        let response = self.store_post(form).await;
        assert_eq!(response.status(), 303);
        self.latest_post_id().await
    }

    pub async fn latest_post_id(&self) -> i64 {
        sqlx::query_scalar("SELECT id FROM posts ORDER BY id DESC LIMIT 1")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn post_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn category(&self, name: &str) -> i64 {
        sqlx::query_scalar("INSERT INTO post_categories (name) VALUES (?) RETURNING id")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn post(&self, id: i64) -> serde_json::Value {
        let body = self
            .get_json(&format!("/admin/posts/{}?trashed=with", id))
            .await;
        body["post"].clone()
    }
}

/// A complete, valid post form.
pub fn post_form(title: &str, category_id: i64, status: &str) -> Form {
    Form::new()
        .text("title", title.to_string())
        .text("post_category_id", category_id.to_string())
        .text("content", "<p>Some content</p>")
        .text("status", status.to_string())
}

pub fn image_part(bytes: &[u8], file_name: &str, mime: &str) -> Part {
    Part::bytes(bytes.to_vec())
        .file_name(file_name.to_string())
        .mime_str(mime)
        .unwrap()
}
