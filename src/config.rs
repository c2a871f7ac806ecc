use std::{env, net::SocketAddr};

use crate::{error::AppError, models::session::SessionPage};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub max_connections: u32,
    /// Page size for admin listings when the request gives none; larger requests are clamped.
    pub admin_page_limit: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .unwrap_or_else(|| "sqlite://sessions.db?mode=rwc".to_string());
        let listen_addr: SocketAddr = lookup("APP_LISTEN_ADDR")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .map_err(|err| AppError::Config(format!("invalid DB_MAX_CONNECTIONS: {err}")))?,
            None => 10,
        };

        let admin_page_limit = match lookup("ADMIN_PAGE_LIMIT") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|limit| *limit > 0)
                .ok_or_else(|| AppError::Config(format!("invalid ADMIN_PAGE_LIMIT: {raw}")))?,
            None => SessionPage::DEFAULT_LIMIT,
        };

        Ok(Self {
            database_url,
            listen_addr,
            max_connections,
            admin_page_limit,
        })
    }
}
