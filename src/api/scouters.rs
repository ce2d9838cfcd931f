//! Scout roster API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{
    is_valid_position, AdminScouter, CreateScouterRequest, UpdateScouterRequest,
};
use crate::AppState;

fn validate_position(position: u8) -> Result<(), AppError> {
    if is_valid_position(position) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Position must be between 1 and 3, got {}",
            position
        )))
    }
}

/// GET /api/admin/scouters - List the roster.
pub async fn list_scouters(State(state): State<AppState>) -> ApiResult<Vec<AdminScouter>> {
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);

    match state.store.get_admin_scouters().await {
        Ok(scouters) => success(scouters, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/admin/scouters - Add a scout to the roster.
pub async fn create_scouter(
    State(state): State<AppState>,
    Json(request): Json<CreateScouterRequest>,
) -> ApiResult<AdminScouter> {
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);

    // Validate required fields
    if request.name.trim().is_empty() {
        return error(
            AppError::Validation("Name is required".to_string()),
            revision_id,
        );
    }
    if let Err(e) = validate_position(request.assigned_position) {
        return error(e, revision_id);
    }

    match state.store.create_scouter(&request).await {
        Ok(scouter) => {
            let new_revision = state.store.get_revision_id().await.unwrap_or(revision_id);
            success(scouter, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/admin/scouters - Replace the whole roster.
pub async fn replace_scouters(
    State(state): State<AppState>,
    Json(scouters): Json<Vec<AdminScouter>>,
) -> ApiResult<Vec<AdminScouter>> {
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);

    for scouter in &scouters {
        if let Err(e) = validate_position(scouter.assigned_position) {
            return error(e, revision_id);
        }
    }

    match state.store.set_admin_scouters(&scouters).await {
        Ok(()) => {
            let new_revision = state.store.get_revision_id().await.unwrap_or(revision_id);
            success(scouters, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/admin/scouters/{id} - Edit a rostered scout.
pub async fn update_scouter(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateScouterRequest>,
) -> ApiResult<AdminScouter> {
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);

    if request.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return error(
            AppError::Validation("Name cannot be empty".to_string()),
            revision_id,
        );
    }
    if let Some(position) = request.assigned_position {
        if let Err(e) = validate_position(position) {
            return error(e, revision_id);
        }
    }

    match state.store.update_scouter(&id, &request).await {
        Ok(scouter) => {
            let new_revision = state.store.get_revision_id().await.unwrap_or(revision_id);
            success(scouter, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/admin/scouters/{id} - Remove a scout from the roster.
pub async fn delete_scouter(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.store.get_revision_id().await.unwrap_or(0);

    match state.store.delete_scouter(&id).await {
        Ok(()) => {
            let new_revision = state.store.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
