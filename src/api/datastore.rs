//! Datastore API endpoints.

use axum::{extract::State, Json};
use serde::Deserialize;

use super::{error, success, ApiResult};
use crate::db::{RecordKey, StoreIssue};
use crate::errors::AppError;
use crate::models::{Datastore, RevisionInfo};
use crate::AppState;

/// GET /api/datastore - Get every persisted record.
pub async fn get_datastore(State(state): State<AppState>) -> ApiResult<Datastore> {
    let datastore = state.store.get_datastore().await?;
    let revision_id = datastore.revision_id;
    success(datastore, revision_id)
}

/// GET /api/datastore/revision - Get the current revision info.
pub async fn get_revision(State(state): State<AppState>) -> ApiResult<RevisionInfo> {
    let revision_info = state.store.get_revision_info().await?;
    let revision_id = revision_info.revision_id;
    success(revision_info, revision_id)
}

/// GET /api/store/issues - Records that were unreadable and served as defaults.
pub async fn list_store_issues(State(state): State<AppState>) -> ApiResult<Vec<StoreIssue>> {
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);
    success(state.store.issues(), revision_id)
}

/// Request body for importing a record exported from a browser build.
#[derive(Debug, Deserialize)]
pub struct ImportRecordRequest {
    pub key: String,
    /// The raw stored string, exactly as found under `key`
    pub value: String,
}

/// POST /api/admin/store/import - Store an unversioned record for migration on read.
pub async fn import_legacy_record(
    State(state): State<AppState>,
    Json(request): Json<ImportRecordRequest>,
) -> ApiResult<()> {
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);

    let Some(key) = RecordKey::parse(&request.key) else {
        return error(
            AppError::Validation(format!("Unknown record key {}", request.key)),
            revision_id,
        );
    };

    match state.store.import_legacy(key, &request.value).await {
        Ok(()) => {
            tracing::info!("Imported legacy record {}", key.as_str());
            let new_revision = state.store.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
