use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::info;

use crate::{
    auth::CurrentUser, error::AppError, models::session::UserSession, sessions, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(sessions_list))
        .route("/sessions/revoke-others", post(revoke_others))
        .route("/sessions/:id", get(session_detail).delete(session_revoke))
        .route("/logout", post(logout))
}

async fn sessions_list(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<UserSession>>, AppError> {
    let user = current.require_user()?;
    let items = sessions::get_user_active_sessions(&state.db, user.id).await?;
    Ok(Json(items))
}

async fn session_detail(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(session_id): Path<i64>,
) -> Result<Json<UserSession>, AppError> {
    let user = current.require_user()?;
    let session = sessions::get_user_session_by_id(&state.db, user.id, session_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(session))
}

async fn session_revoke(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(session_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let user = current.require_user()?;
    let Some(mut session) =
        sessions::get_user_session_by_id(&state.db, user.id, session_id).await?
    else {
        return Err(AppError::NotFound);
    };
    sessions::revoke_session(&state.db, &mut session).await?;
    info!(
        user_id = user.id,
        username = %user.username,
        session_id,
        "session revoked by owner"
    );
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
struct RevokedResponse {
    revoked: u64,
}

async fn revoke_others(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<RevokedResponse>, AppError> {
    let user = current.require_user()?;
    let revoked = sessions::revoke_other_sessions(&state.db, user.id).await?;
    Ok(Json(RevokedResponse { revoked }))
}

async fn logout(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<StatusCode, AppError> {
    let user = current.require_user()?;
    if !sessions::logout(&state.db, user.id).await? {
        info!(
            user_id = user.id,
            username = %user.username,
            "logout without an active session"
        );
    }
    Ok(StatusCode::NO_CONTENT)
}
