#![allow(dead_code)]

use std::{fmt, fs::File};

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use sessions_admin::{
    db::{init_pool, migrate, DbPool},
    models::{session::UserSession, user::User},
};
use tempfile::TempDir;
use uuid::Uuid;

/// Pool over a throwaway SQLite file; keep the `TempDir` alive with it.
pub struct TestDb {
    pub pool: DbPool,
    _root: TempDir,
}

impl fmt::Debug for TestDb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestDb").finish()
    }
}

impl TestDb {
    pub async fn new() -> anyhow::Result<Self> {
        let root = TempDir::new().context("create temp dir for test db")?;
        let db_path = root.path().join("sessions.sqlite");
        File::create(&db_path)?;
        let database_url = format!("sqlite://{}", db_path.to_string_lossy());

        let pool = init_pool(&database_url, 5).await?;
        migrate(&pool).await?;
        Ok(Self { pool, _root: root })
    }
}

pub async fn insert_user(
    db: &DbPool,
    username: &str,
    role: &str,
    company_id: Option<i64>,
) -> anyhow::Result<User> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (username, email, role, company_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         RETURNING id, username, email, role, company_id, created_at",
    )
    .bind(username)
    .bind(format!("{username}@example.test"))
    .bind(role)
    .bind(company_id)
    .bind(Utc::now())
    .fetch_all(db)
    .await?
    .remove(0);
    Ok(user)
}

pub struct NewSession {
    pub user_id: i64,
    pub refresh_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

impl NewSession {
    /// Active, created now, expiring in an hour.
    pub fn live(user_id: i64) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            refresh_token: Uuid::new_v4().to_string(),
            created_at: now,
            expires_at: now + Duration::hours(1),
            is_active: true,
        }
    }

    pub fn created_ago(mut self, age: Duration) -> Self {
        self.created_at = Utc::now() - age;
        self
    }

    pub fn expires_in(mut self, ttl: Duration) -> Self {
        self.expires_at = Utc::now() + ttl;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn token(mut self, token: &str) -> Self {
        self.refresh_token = token.to_string();
        self
    }

    pub async fn insert(self, db: &DbPool) -> anyhow::Result<UserSession> {
        let session = sqlx::query_as::<_, UserSession>(
            "INSERT INTO user_sessions (user_id, refresh_token, created_at, expires_at, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, user_id, refresh_token, created_at, expires_at, is_active",
        )
        .bind(self.user_id)
        .bind(&self.refresh_token)
        .bind(self.created_at)
        .bind(self.expires_at)
        .bind(self.is_active)
        .fetch_all(db)
        .await?
        .remove(0);
        Ok(session)
    }
}

/// Inserts a session whose timestamps are written by SQLite itself
/// (`YYYY-MM-DD HH:MM:SS`), the way an outside writer might store them.
/// `created` and `expires` are `datetime('now', ...)` modifiers.
pub async fn insert_sqlite_dated_session(
    db: &DbPool,
    user_id: i64,
    refresh_token: &str,
    created: &str,
    expires: &str,
) -> anyhow::Result<UserSession> {
    let session = sqlx::query_as::<_, UserSession>(
        "INSERT INTO user_sessions (user_id, refresh_token, created_at, expires_at, is_active)
         VALUES (?1, ?2, datetime('now', ?3), datetime('now', ?4), 1)
         RETURNING id, user_id, refresh_token, created_at, expires_at, is_active",
    )
    .bind(user_id)
    .bind(refresh_token)
    .bind(created)
    .bind(expires)
    .fetch_all(db)
    .await?
    .remove(0);
    Ok(session)
}
