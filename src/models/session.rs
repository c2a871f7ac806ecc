use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSession {
    pub id: i64,
    pub user_id: i64,
    #[serde(skip_serializing)]
    pub refresh_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

impl UserSession {
    /// Live means not revoked and not yet expired at `now`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now < self.expires_at
    }

    pub fn is_live(&self) -> bool {
        self.is_live_at(Utc::now())
    }
}

/// Dashboard counters; serialized with fixed keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatistics {
    pub active_sessions_24h: i64,
    pub active_users_24h: i64,
    pub total_active_sessions: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPage {
    pub skip: i64,
    pub limit: i64,
}

impl SessionPage {
    pub const DEFAULT_LIMIT: i64 = 100;

    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip: skip.max(0),
            limit: limit.max(0),
        }
    }
}

impl Default for SessionPage {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn session(is_active: bool, expires_in: Duration) -> UserSession {
        let now = Utc::now();
        UserSession {
            id: 1,
            user_id: 7,
            refresh_token: "token".into(),
            created_at: now,
            expires_at: now + expires_in,
            is_active,
        }
    }

    #[test]
    fn live_requires_flag_and_future_expiry() {
        let now = Utc::now();
        assert!(session(true, Duration::hours(1)).is_live_at(now));
        assert!(!session(false, Duration::hours(1)).is_live_at(now));
        assert!(!session(true, Duration::hours(-1)).is_live_at(now));
    }

    #[test]
    fn expiry_instant_is_not_live() {
        let s = session(true, Duration::hours(1));
        assert!(!s.is_live_at(s.expires_at));
    }

    #[test]
    fn refresh_token_is_not_serialized() {
        let json = serde_json::to_value(session(true, Duration::hours(1))).unwrap();
        assert!(json.get("refresh_token").is_none());
        assert_eq!(json["user_id"], 7);
    }

    #[test]
    fn statistics_use_fixed_keys() {
        let stats = SessionStatistics {
            active_sessions_24h: 2,
            active_users_24h: 1,
            total_active_sessions: 5,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "active_sessions_24h": 2,
                "active_users_24h": 1,
                "total_active_sessions": 5,
            })
        );
    }

    #[test]
    fn page_clamps_negative_values() {
        assert_eq!(SessionPage::new(-3, -1), SessionPage { skip: 0, limit: 0 });
        assert_eq!(SessionPage::default().limit, 100);
    }
}
