//! Accessors over the `user_sessions` table.
//!
//! Every function takes the shared pool and runs one filtered query or one
//! update. A missing row is `None` or an empty `Vec`, never an error.

use chrono::{DateTime, Duration, Utc};
use sqlx::{QueryBuilder, Sqlite};
use tracing::{debug, info};

use crate::{
    db::DbPool,
    error::AppError,
    models::session::{SessionPage, SessionStatistics, UserSession},
};

const COLUMNS: &str = "user_sessions.id, user_sessions.user_id, user_sessions.refresh_token, \
                       user_sessions.created_at, user_sessions.expires_at, user_sessions.is_active";

const STATS_WINDOW_HOURS: i64 = 24;

/// Builds `SELECT <select> FROM user_sessions ... WHERE <live>` with the
/// optional creation-time and company filters applied.
fn live_sessions_query<'a>(
    select: &str,
    now: DateTime<Utc>,
    created_since: Option<DateTime<Utc>>,
    company_id: Option<i64>,
) -> QueryBuilder<'a, Sqlite> {
    let mut builder = QueryBuilder::new(format!("SELECT {select} FROM user_sessions"));
    if company_id.is_some() {
        builder.push(" JOIN users ON users.id = user_sessions.user_id");
    }
    builder.push(
        " WHERE user_sessions.is_active = 1 AND julianday(user_sessions.expires_at) > julianday(",
    );
    builder.push_bind(now);
    builder.push(")");
    if let Some(since) = created_since {
        builder.push(" AND julianday(user_sessions.created_at) >= julianday(");
        builder.push_bind(since);
        builder.push(")");
    }
    if let Some(company_id) = company_id {
        builder.push(" AND users.company_id = ");
        builder.push_bind(company_id);
    }
    builder
}

/// Live sessions of one user, newest first.
pub async fn get_user_active_sessions(
    db: &DbPool,
    user_id: i64,
) -> Result<Vec<UserSession>, AppError> {
    let sessions = sqlx::query_as::<_, UserSession>(&format!(
        "SELECT {COLUMNS} FROM user_sessions
         WHERE user_id = ?1 AND is_active = 1 AND julianday(expires_at) > julianday(?2)
         ORDER BY julianday(created_at) DESC"
    ))
    .bind(user_id)
    .bind(Utc::now())
    .fetch_all(db)
    .await?;
    debug!(user_id, count = sessions.len(), "loaded active sessions");
    Ok(sessions)
}

/// Active session `session_id`, but only if it belongs to `user_id`.
pub async fn get_user_session_by_id(
    db: &DbPool,
    user_id: i64,
    session_id: i64,
) -> Result<Option<UserSession>, AppError> {
    let session = sqlx::query_as::<_, UserSession>(&format!(
        "SELECT {COLUMNS} FROM user_sessions
         WHERE id = ?1 AND user_id = ?2 AND is_active = 1"
    ))
    .bind(session_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(session)
}

/// Active session by id without an ownership check. Admin use only.
pub async fn get_session_by_id(
    db: &DbPool,
    session_id: i64,
) -> Result<Option<UserSession>, AppError> {
    let session = sqlx::query_as::<_, UserSession>(&format!(
        "SELECT {COLUMNS} FROM user_sessions WHERE id = ?1 AND is_active = 1"
    ))
    .bind(session_id)
    .fetch_optional(db)
    .await?;
    Ok(session)
}

/// One page of live sessions across all users, newest first, optionally
/// restricted to users of `company_id`.
pub async fn get_all_active_sessions(
    db: &DbPool,
    page: &SessionPage,
    company_id: Option<i64>,
) -> Result<Vec<UserSession>, AppError> {
    let mut builder = live_sessions_query(COLUMNS, Utc::now(), None, company_id);
    builder.push(" ORDER BY julianday(user_sessions.created_at) DESC LIMIT ");
    builder.push_bind(page.limit);
    builder.push(" OFFSET ");
    builder.push_bind(page.skip);

    let sessions = builder
        .build_query_as::<UserSession>()
        .fetch_all(db)
        .await?;
    debug!(
        skip = page.skip,
        limit = page.limit,
        ?company_id,
        count = sessions.len(),
        "loaded active session page"
    );
    Ok(sessions)
}

async fn first_active_session(db: &DbPool, user_id: i64) -> Result<Option<UserSession>, AppError> {
    let session = sqlx::query_as::<_, UserSession>(&format!(
        "SELECT {COLUMNS} FROM user_sessions
         WHERE user_id = ?1 AND is_active = 1
         ORDER BY id ASC
         LIMIT 1"
    ))
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(session)
}

/// The session treated as "this" one when revoking all the others.
pub async fn get_current_user_session(
    db: &DbPool,
    user_id: i64,
) -> Result<Option<UserSession>, AppError> {
    first_active_session(db, user_id).await
}

/// Marks `session` inactive and persists the flag. The row is kept.
pub async fn revoke_session(db: &DbPool, session: &mut UserSession) -> Result<(), AppError> {
    session.is_active = false;
    sqlx::query("UPDATE user_sessions SET is_active = ?1 WHERE id = ?2")
        .bind(session.is_active)
        .bind(session.id)
        .execute(db)
        .await?;
    debug!(session_id = session.id, user_id = session.user_id, "revoked session");
    Ok(())
}

/// Dashboard counters over live sessions, optionally for one company.
///
/// The three counts are separate queries sharing one `now`; they are not
/// read in a single transaction.
pub async fn get_session_statistics(
    db: &DbPool,
    company_id: Option<i64>,
) -> Result<SessionStatistics, AppError> {
    let now = Utc::now();
    let since = now - Duration::hours(STATS_WINDOW_HOURS);

    let active_sessions_24h: i64 =
        live_sessions_query("COUNT(*)", now, Some(since), company_id)
            .build_query_scalar()
            .fetch_one(db)
            .await?;

    let active_users_24h: Option<i64> = live_sessions_query(
        "COUNT(DISTINCT user_sessions.user_id)",
        now,
        Some(since),
        company_id,
    )
    .build_query_scalar()
    .fetch_one(db)
    .await?;

    let total_active_sessions: i64 = live_sessions_query("COUNT(*)", now, None, company_id)
        .build_query_scalar()
        .fetch_one(db)
        .await?;

    Ok(SessionStatistics {
        active_sessions_24h,
        active_users_24h: active_users_24h.unwrap_or(0),
        total_active_sessions,
    })
}

/// Live session of `user_id` holding exactly `refresh_token`.
pub async fn get_session_by_refresh_token(
    db: &DbPool,
    user_id: i64,
    refresh_token: &str,
) -> Result<Option<UserSession>, AppError> {
    let session = sqlx::query_as::<_, UserSession>(&format!(
        "SELECT {COLUMNS} FROM user_sessions
         WHERE user_id = ?1 AND refresh_token = ?2 AND is_active = 1
           AND julianday(expires_at) > julianday(?3)
         LIMIT 1"
    ))
    .bind(user_id)
    .bind(refresh_token)
    .bind(Utc::now())
    .fetch_optional(db)
    .await?;
    Ok(session)
}

/// The session revoked by `logout`; same pick as the current session.
pub async fn get_user_sessions_for_logout(
    db: &DbPool,
    user_id: i64,
) -> Result<Option<UserSession>, AppError> {
    first_active_session(db, user_id).await
}

/// Revokes every live session of `user_id` except the current one.
/// Returns how many sessions were revoked.
///
/// When the current session has already expired, the oldest live session
/// is kept instead so the caller is never left without one.
pub async fn revoke_other_sessions(db: &DbPool, user_id: i64) -> Result<u64, AppError> {
    let now = Utc::now();
    let current = get_current_user_session(db, user_id).await?;
    let active = get_user_active_sessions(db, user_id).await?;
    let keep = match current {
        Some(session) if session.is_live_at(now) => Some(session.id),
        _ => active.iter().map(|session| session.id).min(),
    };

    let mut revoked = 0;
    for mut session in active {
        if Some(session.id) == keep {
            continue;
        }
        revoke_session(db, &mut session).await?;
        revoked += 1;
    }
    info!(user_id, revoked, "revoked other sessions");
    Ok(revoked)
}

/// Revokes the session used for logout. `false` if the user had none.
pub async fn logout(db: &DbPool, user_id: i64) -> Result<bool, AppError> {
    match get_user_sessions_for_logout(db, user_id).await? {
        Some(mut session) => {
            revoke_session(db, &mut session).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}
