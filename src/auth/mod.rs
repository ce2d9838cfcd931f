//! Session resolution and the admin gate.
//!
//! Admin rights are a plain username comparison, done in constant time.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::errors::{AppError, AppErrorWithRevision};
use crate::models::{
    is_valid_position, AdminScouter, Alliance, LoginRequest, Session, User,
};
use crate::AppState;

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

pub fn is_admin_username(username: &str, admin_username: &str) -> bool {
    constant_time_compare(username.trim(), admin_username)
}

/// Roster entry whose name matches `username`, ignoring case.
pub fn roster_assignment<'a>(
    roster: &'a [AdminScouter],
    username: &str,
) -> Option<&'a AdminScouter> {
    let wanted = username.trim().to_lowercase();
    roster.iter().find(|s| s.name.to_lowercase() == wanted)
}

/// Decide who is logging in and which seat they scout.
///
/// The admin username wins, then a roster assignment, then the seat the scout picked.
pub fn resolve_login(
    request: &LoginRequest,
    roster: &[AdminScouter],
    admin_username: &str,
) -> Result<Session, AppError> {
    let username = request.username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("Username is required".to_string()));
    }

    if is_admin_username(username, admin_username) {
        return Ok(Session {
            user: User {
                username: username.to_string(),
                assigned_team: 0,
                assigned_alliance: Alliance::Red,
                assigned_position: 1,
            },
            is_admin: true,
            from_roster: false,
        });
    }

    if let Some(scouter) = roster_assignment(roster, username) {
        return Ok(Session {
            user: User {
                username: username.to_string(),
                assigned_team: 0,
                assigned_alliance: scouter.assigned_alliance,
                assigned_position: scouter.assigned_position,
            },
            is_admin: false,
            from_roster: true,
        });
    }

    let position = request.assigned_position.unwrap_or(1);
    if !is_valid_position(position) {
        return Err(AppError::Validation(format!(
            "Position must be between 1 and 3, got {}",
            position
        )));
    }

    Ok(Session {
        user: User {
            username: username.to_string(),
            assigned_team: 0,
            assigned_alliance: request.assigned_alliance.unwrap_or_default(),
            assigned_position: position,
        },
        is_admin: false,
        from_roster: false,
    })
}

/// Rebuild the session for a persisted user.
pub fn session_for(user: User, roster: &[AdminScouter], admin_username: &str) -> Session {
    Session {
        is_admin: is_admin_username(&user.username, admin_username),
        from_roster: roster_assignment(roster, &user.username).is_some(),
        user,
    }
}

/// Middleware letting a request through only when the stored user is the admin.
pub async fn require_admin(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let user = match state.store.get_user().await {
        Ok(user) => user,
        Err(e) => return AppErrorWithRevision::from(e).into_response(),
    };

    match user {
        Some(user) if is_admin_username(&user.username, &state.config.admin_username) => {
            next.run(request).await
        }
        Some(_) => AppErrorWithRevision::from(AppError::Forbidden(
            "Admin session required".to_string(),
        ))
        .into_response(),
        None => AppErrorWithRevision::from(AppError::Unauthorized(
            "No active session".to_string(),
        ))
        .into_response(),
    }
}
