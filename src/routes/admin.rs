use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    auth::CurrentUser,
    error::AppError,
    models::session::{SessionPage, SessionStatistics, UserSession},
    sessions,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(sessions_list))
        .route("/sessions/stats", get(session_stats))
        .route("/sessions/:id", get(session_detail).delete(session_revoke))
}

#[derive(Debug, Default, Deserialize)]
struct SessionListQuery {
    skip: Option<i64>,
    limit: Option<i64>,
    company_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct CompanyQuery {
    company_id: Option<i64>,
}

fn page_from_query(query: &SessionListQuery, max_limit: i64) -> Result<SessionPage, AppError> {
    let skip = query.skip.unwrap_or(0);
    let limit = query.limit.unwrap_or(max_limit);
    if skip < 0 || limit < 0 {
        return Err(AppError::BadRequest("skip and limit must not be negative".into()));
    }
    if limit > max_limit {
        warn!(limit, max_limit, "clamping admin session page size");
    }
    Ok(SessionPage::new(skip, limit.min(max_limit)))
}

async fn sessions_list(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<SessionListQuery>,
) -> Result<Json<Vec<UserSession>>, AppError> {
    current.require_admin()?;
    let page = page_from_query(&query, state.config.admin_page_limit)?;
    let items = sessions::get_all_active_sessions(&state.db, &page, query.company_id).await?;
    Ok(Json(items))
}

async fn session_stats(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<CompanyQuery>,
) -> Result<Json<SessionStatistics>, AppError> {
    current.require_admin()?;
    let stats = sessions::get_session_statistics(&state.db, query.company_id).await?;
    Ok(Json(stats))
}

async fn session_detail(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(session_id): Path<i64>,
) -> Result<Json<UserSession>, AppError> {
    current.require_admin()?;
    let session = sessions::get_session_by_id(&state.db, session_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(session))
}

async fn session_revoke(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(session_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let admin = current.require_admin()?;
    let Some(mut session) = sessions::get_session_by_id(&state.db, session_id).await? else {
        return Err(AppError::NotFound);
    };
    sessions::revoke_session(&state.db, &mut session).await?;
    info!(
        admin_id = admin.id,
        admin = %admin.username,
        session_id,
        owner_id = session.user_id,
        "session revoked by admin"
    );
    Ok(StatusCode::NO_CONTENT)
}
