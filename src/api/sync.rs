//! Sync and connectivity API endpoints.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::{error, success, ApiResult};
use crate::sync::{SyncOutcome, SyncStatus};
use crate::AppState;

/// What the sync indicator needs to render.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOverview {
    pub status: SyncStatus,
    pub online: bool,
    pub unsynced_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub outcome: SyncOutcome,
    #[serde(flatten)]
    pub overview: SyncOverview,
}

async fn overview(state: &AppState) -> Result<SyncOverview, crate::errors::AppError> {
    Ok(SyncOverview {
        status: state.sync.status(),
        online: state.sync.connectivity().is_online(),
        unsynced_count: state.store.get_unsynced().await?.len(),
    })
}

/// POST /api/sync - Push unsynced entries now.
pub async fn trigger_sync(State(state): State<AppState>) -> ApiResult<SyncResult> {
    let outcome = state.sync.sync().await;
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);

    match overview(&state).await {
        Ok(overview) => success(SyncResult { outcome, overview }, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/sync/status - Current sync status and unsynced count.
pub async fn sync_status(State(state): State<AppState>) -> ApiResult<SyncOverview> {
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);

    match overview(&state).await {
        Ok(overview) => success(overview, revision_id),
        Err(e) => error(e, revision_id),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionCheck {
    pub endpoint_configured: bool,
    pub reachable: bool,
}

/// GET /api/sync/test - Probe the sheet endpoint.
pub async fn test_sync_connection(State(state): State<AppState>) -> ApiResult<ConnectionCheck> {
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);
    let sheets = state.sync.sheets();

    success(
        ConnectionCheck {
            endpoint_configured: sheets.endpoint().is_some(),
            reachable: sheets.test_connection().await,
        },
        revision_id,
    )
}

#[derive(Debug, Deserialize)]
pub struct ConnectivityRequest {
    pub online: bool,
}

/// PUT /api/connectivity - Report the device going online or offline.
pub async fn set_connectivity(
    State(state): State<AppState>,
    Json(request): Json<ConnectivityRequest>,
) -> ApiResult<SyncOverview> {
    state.sync.connectivity().set_online(request.online);
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);

    match overview(&state).await {
        Ok(overview) => success(overview, revision_id),
        Err(e) => error(e, revision_id),
    }
}
