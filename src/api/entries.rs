//! Scouting entry API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{EntryPatch, NewEntryRequest, ScoutingEntry};
use crate::AppState;

/// GET /api/entries - Every recorded entry, in recording order.
pub async fn list_entries(State(state): State<AppState>) -> ApiResult<Vec<ScoutingEntry>> {
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);

    match state.store.get_scouting_data().await {
        Ok(entries) => success(entries, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/entries/unsynced - Entries not yet pushed to the sheet.
pub async fn list_unsynced(State(state): State<AppState>) -> ApiResult<Vec<ScoutingEntry>> {
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);

    match state.store.get_unsynced().await {
        Ok(entries) => success(entries, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/entries - Record an observation and schedule a sync.
pub async fn submit_entry(
    State(state): State<AppState>,
    Json(request): Json<NewEntryRequest>,
) -> ApiResult<ScoutingEntry> {
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);

    // Validate required fields
    if request.match_number == 0 || request.team_number == 0 {
        return error(
            AppError::Validation("Match and team numbers must be positive".to_string()),
            revision_id,
        );
    }
    if request.scouter_username.trim().is_empty() {
        return error(
            AppError::Validation("Scouter username is required".to_string()),
            revision_id,
        );
    }

    let event_key = match state.store.get_selected_event().await {
        Ok(event_key) => event_key,
        Err(e) => return error(e, revision_id),
    };

    let entry = ScoutingEntry::new(request, Utc::now().timestamp_millis(), event_key);

    match state.store.add_entry(entry.clone()).await {
        Ok(entries) => {
            tracing::info!(
                id = %entry.id,
                total = entries.len(),
                "Recorded scouting entry"
            );
            state.sync.schedule_auto_sync();
            let new_revision = state.store.get_revision_id().await.unwrap_or(revision_id);
            success(entry, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PATCH /api/entries/{id} - Merge fields into an entry. Unknown ids change nothing.
pub async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<EntryPatch>,
) -> ApiResult<Vec<ScoutingEntry>> {
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);

    match state.store.update_entry(&id, &patch).await {
        Ok(entries) => {
            let new_revision = state.store.get_revision_id().await.unwrap_or(revision_id);
            success(entries, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
