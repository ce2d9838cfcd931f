//! Team statistics API endpoint.

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use super::{error, success, ApiResult};
use crate::models::ClimbStatus;
use crate::stats::{aggregate, attach_ranks, filter_and_sort, SortField, SortOrder, TeamStats};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    #[serde(default)]
    pub climb: Option<ClimbStatus>,
    #[serde(default)]
    pub sort_by: SortField,
    #[serde(default)]
    pub order: SortOrder,
    /// Look up event ranks (only when an event is selected)
    #[serde(default = "default_ranks")]
    pub ranks: bool,
}

fn default_ranks() -> bool {
    true
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub event_key: Option<String>,
    pub team_count: usize,
    pub teams: Vec<TeamStats>,
}

/// GET /api/admin/stats - Per-team averages for the selected event.
pub async fn team_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<StatsReport> {
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);

    let (entries, event_key) = match (
        state.store.get_scouting_data().await,
        state.store.get_selected_event().await,
    ) {
        (Ok(entries), Ok(event_key)) => (entries, event_key),
        (Err(e), _) | (_, Err(e)) => return error(e, revision_id),
    };

    let mut teams = aggregate(&entries, event_key.as_deref());
    if query.ranks {
        if let Some(event_key) = event_key.as_deref() {
            attach_ranks(&mut teams, &state.tba, event_key).await;
        }
    }
    let teams = filter_and_sort(teams, query.climb, query.sort_by, query.order);

    success(
        StatsReport {
            event_key,
            team_count: teams.len(),
            teams,
        },
        revision_id,
    )
}
