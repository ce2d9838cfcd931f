//! Match schedule and competition models.

use serde::{Deserialize, Serialize};

use super::Alliance;

/// A single qualification match with both alliance rosters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub match_number: u32,
    pub red_teams: [u32; 3],
    pub blue_teams: [u32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blue_alliance_key: Option<String>,
}

impl Match {
    /// Team sitting at `position` (1-3) of `alliance`, if the position is valid.
    pub fn team_for(&self, alliance: Alliance, position: u8) -> Option<u32> {
        let teams = match alliance {
            Alliance::Red => &self.red_teams,
            Alliance::Blue => &self.blue_teams,
        };
        let index = usize::from(position).checked_sub(1)?;
        teams.get(index).copied()
    }
}

/// Schedule shown before an administrator imports a real event.
pub fn demo_matches() -> Vec<Match> {
    let pairs = [
        (1, [1234, 5678, 9012], [3456, 7890, 1357]),
        (2, [2468, 1357, 9753], [8642, 1234, 5678]),
        (3, [7890, 3456, 2468], [9012, 9753, 8642]),
    ];
    pairs
        .into_iter()
        .map(|(match_number, red_teams, blue_teams)| Match {
            match_number,
            red_teams,
            blue_teams,
            completed: None,
            event_key: None,
            blue_alliance_key: None,
        })
        .collect()
}

/// A match as seen by one scout: the team they observe and whether it is done.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedMatch {
    #[serde(flatten)]
    pub schedule: Match,
    pub team_to_scout: Option<u32>,
    pub scouted: bool,
}

/// A competition returned by event search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Competition {
    pub key: String,
    pub name: String,
    pub event_code: String,
    pub year: i32,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
}
