//! Snapshot of everything the local store holds.

use serde::{Deserialize, Serialize};

use super::{AdminScouter, Match, ScoutingEntry, User};

/// The five persisted records plus store metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Datastore {
    pub schema_version: i32,
    pub generated_at: String,
    pub revision_id: i64,
    pub user: Option<User>,
    pub matches: Vec<Match>,
    pub scouting_data: Vec<ScoutingEntry>,
    pub admin_scouters: Vec<AdminScouter>,
    pub selected_event: Option<String>,
}

/// Revision information for change detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub revision_id: i64,
    pub generated_at: String,
}
