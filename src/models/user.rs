//! Logged-in scout model matching the frontend User interface.

use serde::{Deserialize, Serialize};

use super::Alliance;

/// The scout (or admin) currently logged in on this device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub assigned_team: u32,
    pub assigned_alliance: Alliance,
    pub assigned_position: u8,
}

/// Request body for logging in.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    #[serde(default)]
    pub assigned_alliance: Option<Alliance>,
    #[serde(default)]
    pub assigned_position: Option<u8>,
}

/// Result of a login or a session lookup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: User,
    pub is_admin: bool,
    /// The assignment was taken from the admin roster
    pub from_roster: bool,
}
