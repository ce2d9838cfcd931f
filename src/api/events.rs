//! Competition selection API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::lookup::{is_valid_event_key, TeamEventStatus};
use crate::models::Competition;
use crate::AppState;

/// Reject event keys that are not plain alphanumeric codes.
pub(super) fn check_event_key(event_key: &str) -> Result<(), AppError> {
    if is_valid_event_key(event_key) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Invalid event key {:?}",
            event_key
        )))
    }
}

#[derive(Debug, Deserialize)]
pub struct EventSearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub year: Option<i32>,
}

/// GET /api/admin/events/search?q=&year= - Find competitions by name or code.
pub async fn search_events(
    State(state): State<AppState>,
    Query(query): Query<EventSearchQuery>,
) -> ApiResult<Vec<Competition>> {
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);

    if query.q.trim().is_empty() {
        return error(
            AppError::Validation("Search term is required".to_string()),
            revision_id,
        );
    }

    let year = query.year.unwrap_or_else(|| Utc::now().year());
    success(state.tba.search_events(year, &query.q).await, revision_id)
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedEvent {
    pub event_key: Option<String>,
}

/// GET /api/event - The competition currently selected.
pub async fn get_selected_event(State(state): State<AppState>) -> ApiResult<SelectedEvent> {
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);

    match state.store.get_selected_event().await {
        Ok(event_key) => success(SelectedEvent { event_key }, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/admin/event - Select a competition. Existing entries are kept.
pub async fn set_selected_event(
    State(state): State<AppState>,
    Json(request): Json<SelectedEvent>,
) -> ApiResult<SelectedEvent> {
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);

    let Some(event_key) = request
        .event_key
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
    else {
        return error(
            AppError::Validation("eventKey is required".to_string()),
            revision_id,
        );
    };

    if let Err(e) = check_event_key(&event_key) {
        return error(e, revision_id);
    }

    match state.store.set_selected_event(&event_key).await {
        Ok(()) => {
            let new_revision = state.store.get_revision_id().await.unwrap_or(revision_id);
            success(
                SelectedEvent {
                    event_key: Some(event_key),
                },
                new_revision,
            )
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/admin/events/{key}/rankings - Raw ranking rows for an event.
pub async fn event_rankings(
    State(state): State<AppState>,
    Path(event_key): Path<String>,
) -> ApiResult<Vec<serde_json::Value>> {
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);
    if let Err(e) = check_event_key(&event_key) {
        return error(e, revision_id);
    }
    success(state.tba.get_event_rankings(&event_key).await, revision_id)
}

/// GET /api/admin/events/{key}/teams/{team} - A team's rank and record at an event.
pub async fn team_event_status(
    State(state): State<AppState>,
    Path((event_key, team)): Path<(String, u32)>,
) -> ApiResult<Option<TeamEventStatus>> {
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);
    if let Err(e) = check_event_key(&event_key) {
        return error(e, revision_id);
    }
    success(state.tba.get_team_status(&event_key, team).await, revision_id)
}
