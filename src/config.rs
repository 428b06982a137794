use std::{net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result};

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3001";
const DEFAULT_STORAGE_ROOT: &str = "storage/app/public";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:3001";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_address: SocketAddr,
    pub storage_root: PathBuf,
    pub public_url: String,
    pub admin: Option<AdminSeed>,
}

/// Administrator account created at startup when it does not exist yet.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> Result<Config> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let bind_address = env_or("BIND_ADDRESS", DEFAULT_BIND_ADDRESS)
            .parse()
            .context("BIND_ADDRESS must be a socket address")?;
        let storage_root = PathBuf::from(env_or("STORAGE_ROOT", DEFAULT_STORAGE_ROOT));
        let public_url = env_or("PUBLIC_URL", DEFAULT_PUBLIC_URL);

        let admin = match (
            std::env::var("ADMIN_EMAIL").ok(),
            std::env::var("ADMIN_PASSWORD").ok(),
        ) {
            (Some(email), Some(password)) => Some(AdminSeed {
                name: env_or("ADMIN_NAME", "Administrator"),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            bind_address,
            storage_root,
            public_url: public_url.trim_end_matches('/').to_string(),
            admin,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
