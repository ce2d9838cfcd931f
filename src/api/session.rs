//! Session API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::{error, success, ApiResult};
use crate::auth::{resolve_login, roster_assignment, session_for};
use crate::errors::AppError;
use crate::models::{AdminScouter, LoginRequest, Session};
use crate::AppState;

/// POST /api/session/login - Log a scout or the admin in on this device.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Session> {
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);

    let roster = match state.store.get_admin_scouters().await {
        Ok(roster) => roster,
        Err(e) => return error(e, revision_id),
    };

    let session = match resolve_login(&request, &roster, &state.config.admin_username) {
        Ok(session) => session,
        Err(e) => return error(e, revision_id),
    };

    match state.store.set_user(&session.user).await {
        Ok(()) => {
            tracing::info!(
                username = %session.user.username,
                admin = session.is_admin,
                "Logged in"
            );
            let new_revision = state.store.get_revision_id().await.unwrap_or(revision_id);
            success(session, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/session - The current session.
pub async fn get_session(State(state): State<AppState>) -> ApiResult<Session> {
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);

    let user = match state.store.get_user().await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return error(
                AppError::Unauthorized("No active session".to_string()),
                revision_id,
            )
        }
        Err(e) => return error(e, revision_id),
    };

    match state.store.get_admin_scouters().await {
        Ok(roster) => success(
            session_for(user, &roster, &state.config.admin_username),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/session/logout - Erase every local record.
pub async fn logout(State(state): State<AppState>) -> ApiResult<()> {
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);

    match state.store.clear_all().await {
        Ok(()) => {
            let new_revision = state.store.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// Roster lookup shown while a scout types their name.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentPreview {
    pub is_admin: bool,
    pub assignment: Option<AdminScouter>,
}

/// GET /api/session/assignment/{username} - Preview what logging in as `username` yields.
pub async fn get_assignment(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<AssignmentPreview> {
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);

    match state.store.get_admin_scouters().await {
        Ok(roster) => success(
            AssignmentPreview {
                is_admin: crate::auth::is_admin_username(
                    &username,
                    &state.config.admin_username,
                ),
                assignment: roster_assignment(&roster, &username).cloned(),
            },
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}
