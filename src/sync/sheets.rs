//! Client for the remote sheet endpoint.

use serde::Serialize;

use crate::errors::AppError;
use crate::models::ScoutingEntry;

/// Request body accepted by the sheet endpoint.
#[derive(Debug, Serialize)]
struct SyncPayload<'a> {
    data: &'a [ScoutingEntry],
}

/// Pushes batches of entries to an append-only sheet endpoint.
#[derive(Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    endpoint: Option<String>,
}

impl SheetsClient {
    pub fn new(endpoint: Option<String>) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("frc-scouting-backend/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("HTTP client setup failed: {}", e)))?;

        if endpoint.is_none() {
            tracing::warn!("No sheet endpoint configured (SCOUT_SYNC_ENDPOINT). Every sync will fail!");
        }

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// POST one batch. Any 2xx status counts as acknowledged; the body is ignored.
    pub async fn push(&self, entries: &[ScoutingEntry]) -> Result<(), AppError> {
        let endpoint = self.require_endpoint()?;

        tracing::info!("Pushing {} entries to sheet endpoint", entries.len());

        let response = self
            .http
            .post(endpoint)
            .json(&SyncPayload { data: entries })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "Sheet endpoint rejected batch with status {}",
                status
            )));
        }

        Ok(())
    }

    /// Check that the endpoint answers a `?test=true` request.
    pub async fn test_connection(&self) -> bool {
        let Ok(endpoint) = self.require_endpoint() else {
            return false;
        };

        match self
            .http
            .get(endpoint)
            .query(&[("test", "true")])
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!("Sheet endpoint connection check failed: {}", e);
                false
            }
        }
    }

    fn require_endpoint(&self) -> Result<&str, AppError> {
        self.endpoint
            .as_deref()
            .ok_or_else(|| AppError::Upstream("No sheet endpoint configured".to_string()))
    }
}
