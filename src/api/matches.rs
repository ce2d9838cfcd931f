//! Match schedule API endpoints.

use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    Json,
};

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{demo_matches, AssignedMatch, Match};
use crate::AppState;

/// Stored schedule, or the demo schedule when none has been loaded.
async fn current_schedule(state: &AppState) -> Result<Vec<Match>, AppError> {
    let matches = state.store.get_matches().await?;
    if matches.is_empty() {
        Ok(demo_matches())
    } else {
        Ok(matches)
    }
}

/// GET /api/matches - The match schedule.
pub async fn list_matches(State(state): State<AppState>) -> ApiResult<Vec<Match>> {
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);

    match current_schedule(&state).await {
        Ok(matches) => success(matches, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/matches/mine - The schedule from the logged-in scout's seat.
pub async fn my_matches(State(state): State<AppState>) -> ApiResult<Vec<AssignedMatch>> {
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

    let (schedule, entries) = match (
        current_schedule(&state).await,
        state.store.get_scouting_data().await,
    ) {
        (Ok(schedule), Ok(entries)) => (schedule, entries),
        (Err(e), _) | (_, Err(e)) => return error(e, revision_id),
    };

    let scouted: HashSet<u32> = entries.iter().map(|e| e.match_number).collect();
    let assigned = schedule
        .into_iter()
        .map(|m| AssignedMatch {
            team_to_scout: m.team_for(user.assigned_alliance, user.assigned_position),
            scouted: scouted.contains(&m.match_number),
            schedule: m,
        })
        .collect();

    success(assigned, revision_id)
}

/// PUT /api/admin/matches - Replace the schedule wholesale.
pub async fn replace_matches(
    State(state): State<AppState>,
    Json(matches): Json<Vec<Match>>,
) -> ApiResult<Vec<Match>> {
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);

    if let Some(bad) = matches.iter().find(|m| m.match_number == 0) {
        return error(
            AppError::Validation(format!(
                "Match numbers must be positive (got {})",
                bad.match_number
            )),
            revision_id,
        );
    }

    match state.store.set_matches(&matches).await {
        Ok(()) => {
            let new_revision = state.store.get_revision_id().await.unwrap_or(revision_id);
            success(matches, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/admin/events/{key}/import - Load an event's qualification schedule and select it.
pub async fn import_event_matches(
    State(state): State<AppState>,
    Path(event_key): Path<String>,
) -> ApiResult<Vec<Match>> {
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);

    if let Err(e) = super::events::check_event_key(&event_key) {
        return error(e, revision_id);
    }

    let matches = state.tba.get_event_matches(&event_key).await;
    if matches.is_empty() {
        return error(
            AppError::Upstream(format!(
                "No qualification matches available for {}",
                event_key
            )),
            revision_id,
        );
    }

    if let Err(e) = state.store.set_matches(&matches).await {
        return error(e, revision_id);
    }
    if let Err(e) = state.store.set_selected_event(&event_key).await {
        return error(e, revision_id);
    }

    tracing::info!("Imported {} matches for {}", matches.len(), event_key);
    let new_revision = state.store.get_revision_id().await.unwrap_or(revision_id);
    success(matches, new_revision)
}
