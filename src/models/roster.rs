//! Scout roster model matching the frontend AdminScouter interface.

use serde::{Deserialize, Serialize};

/// One of the two three-team sides in a match.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Alliance {
    #[default]
    Red,
    Blue,
}

/// Whether and how a rostered scout takes part.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ScouterStatus {
    Remote,
    #[default]
    InPerson,
    NotScouting,
}

/// Seat (1-3) within an alliance.
pub const POSITIONS: std::ops::RangeInclusive<u8> = 1..=3;

pub fn is_valid_position(position: u8) -> bool {
    POSITIONS.contains(&position)
}

/// An administrator-declared scout assignment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdminScouter {
    pub id: String,
    pub name: String,
    pub assigned_alliance: Alliance,
    pub assigned_position: u8,
    pub status: ScouterStatus,
}

/// Request body for adding a scout to the roster.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScouterRequest {
    pub name: String,
    #[serde(default)]
    pub assigned_alliance: Alliance,
    #[serde(default = "default_position")]
    pub assigned_position: u8,
    #[serde(default)]
    pub status: ScouterStatus,
}

fn default_position() -> u8 {
    1
}

/// Request body for editing a rostered scout.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScouterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub assigned_alliance: Option<Alliance>,
    #[serde(default)]
    pub assigned_position: Option<u8>,
    #[serde(default)]
    pub status: Option<ScouterStatus>,
}

impl AdminScouter {
    pub fn apply(&mut self, request: &UpdateScouterRequest) {
        if let Some(name) = &request.name {
            self.name = name.trim().to_string();
        }
        if let Some(alliance) = request.assigned_alliance {
            self.assigned_alliance = alliance;
        }
        if let Some(position) = request.assigned_position {
            self.assigned_position = position;
        }
        if let Some(status) = request.status {
            self.status = status;
        }
    }
}
