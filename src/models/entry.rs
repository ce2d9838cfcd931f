//! Scouting entry model matching the frontend ScoutingData interface.

use serde::{Deserialize, Serialize};

/// Climb outcome recorded at the end of a match.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ClimbStatus {
    #[default]
    NoClimb,
    LowClimb,
    DeepClimb,
}

/// One scout's observations of one team in one match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScoutingEntry {
    pub id: String,
    pub match_number: u32,
    pub team_number: u32,
    pub scouter_username: String,
    /// Creation time in Unix milliseconds
    pub timestamp: i64,
    pub l1_count: u32,
    pub l2_count: u32,
    pub l3_count: u32,
    pub l4_count: u32,
    pub climb_status: ClimbStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub synced: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_key: Option<String>,
}

impl ScoutingEntry {
    /// Build a fresh, unsynced entry. The id is `{match}-{team}-{timestamp}`, so two entries
    /// for the same match and team created in the same millisecond share an id.
    pub fn new(request: NewEntryRequest, timestamp: i64, event_key: Option<String>) -> Self {
        Self {
            id: entry_id(request.match_number, request.team_number, timestamp),
            match_number: request.match_number,
            team_number: request.team_number,
            scouter_username: request.scouter_username,
            timestamp,
            l1_count: request.l1_count,
            l2_count: request.l2_count,
            l3_count: request.l3_count,
            l4_count: request.l4_count,
            climb_status: request.climb_status,
            notes: request
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            synced: false,
            event_key,
        }
    }

    /// Sum of the four scoring counters, widened so it cannot overflow.
    pub fn total_count(&self) -> u64 {
        [self.l1_count, self.l2_count, self.l3_count, self.l4_count]
            .into_iter()
            .map(u64::from)
            .sum()
    }

    /// Shallow merge of a patch into this entry. The id and synced flag are never touched.
    pub fn apply(&mut self, patch: &EntryPatch) {
        if let Some(v) = patch.match_number {
            self.match_number = v;
        }
        if let Some(v) = patch.team_number {
            self.team_number = v;
        }
        if let Some(v) = &patch.scouter_username {
            self.scouter_username = v.clone();
        }
        if let Some(v) = patch.l1_count {
            self.l1_count = v;
        }
        if let Some(v) = patch.l2_count {
            self.l2_count = v;
        }
        if let Some(v) = patch.l3_count {
            self.l3_count = v;
        }
        if let Some(v) = patch.l4_count {
            self.l4_count = v;
        }
        if let Some(v) = patch.climb_status {
            self.climb_status = v;
        }
        if let Some(v) = &patch.notes {
            self.notes = Some(v.clone());
        }
        if let Some(v) = &patch.event_key {
            self.event_key = Some(v.clone());
        }
    }
}

pub fn entry_id(match_number: u32, team_number: u32, timestamp: i64) -> String {
    format!("{}-{}-{}", match_number, team_number, timestamp)
}

/// Request body for recording a new entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntryRequest {
    pub match_number: u32,
    pub team_number: u32,
    pub scouter_username: String,
    #[serde(default)]
    pub l1_count: u32,
    #[serde(default)]
    pub l2_count: u32,
    #[serde(default)]
    pub l3_count: u32,
    #[serde(default)]
    pub l4_count: u32,
    #[serde(default)]
    pub climb_status: ClimbStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update applied to an existing entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPatch {
    #[serde(default)]
    pub match_number: Option<u32>,
    #[serde(default)]
    pub team_number: Option<u32>,
    #[serde(default)]
    pub scouter_username: Option<String>,
    #[serde(default)]
    pub l1_count: Option<u32>,
    #[serde(default)]
    pub l2_count: Option<u32>,
    #[serde(default)]
    pub l3_count: Option<u32>,
    #[serde(default)]
    pub l4_count: Option<u32>,
    #[serde(default)]
    pub climb_status: Option<ClimbStatus>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub event_key: Option<String>,
}
