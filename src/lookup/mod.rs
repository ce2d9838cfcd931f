//! Read-only client for The Blue Alliance competition API.
//!
//! Every public call is best-effort: failures are logged and turned into an empty or absent
//! result, never an error.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Competition, Match};

/// Header carrying the API key.
pub const TBA_AUTH_HEADER: &str = "X-TBA-Auth-Key";

#[derive(Debug, Deserialize)]
struct TbaEvent {
    key: String,
    name: String,
    event_code: String,
    year: i32,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TbaMatch {
    key: String,
    comp_level: String,
    match_number: u32,
    alliances: TbaAlliances,
    #[serde(default)]
    winning_alliance: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TbaAlliances {
    red: TbaAlliance,
    blue: TbaAlliance,
}

#[derive(Debug, Deserialize)]
struct TbaAlliance {
    team_keys: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TbaTeamStatus {
    #[serde(default)]
    qual: Option<TbaQualStatus>,
}

#[derive(Debug, Deserialize)]
struct TbaQualStatus {
    #[serde(default)]
    ranking: Option<TbaRanking>,
}

#[derive(Debug, Deserialize)]
struct TbaRanking {
    #[serde(default)]
    rank: Option<u32>,
    #[serde(default)]
    record: Option<WinLossRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct TbaRankings {
    #[serde(default)]
    rankings: Vec<serde_json::Value>,
}

/// Qualification win-loss-tie record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WinLossRecord {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

/// A team's standing at an event.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TeamEventStatus {
    pub rank: Option<u32>,
    pub record: Option<WinLossRecord>,
}

/// Event keys are a year plus an event code, e.g. `2025casj`.
pub fn is_valid_event_key(key: &str) -> bool {
    !key.is_empty() && key.len() <= 32 && key.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Parse `frc254` into `254`.
pub fn parse_team_key(key: &str) -> Option<u32> {
    key.strip_prefix("frc").unwrap_or(key).parse().ok()
}

fn alliance_teams(alliance: &TbaAlliance) -> Option<[u32; 3]> {
    let teams: Vec<u32> = alliance
        .team_keys
        .iter()
        .map(|k| parse_team_key(k))
        .collect::<Option<_>>()?;
    teams.try_into().ok()
}

/// Client for the competition-data API.
#[derive(Clone)]
pub struct TbaClient {
    http: reqwest::Client,
    base_url: String,
    auth_key: String,
}

impl TbaClient {
    pub fn new(base_url: &str, auth_key: &str) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("frc-scouting-backend/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_key: auth_key.to_string(),
        })
    }

    async fn fetch_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .header(TBA_AUTH_HEADER, &self.auth_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!("GET {} returned {}", url, status)));
        }

        Ok(response.json().await?)
    }

    /// Fetch a path built from `event_key`, refusing keys that could escape the event path.
    async fn fetch_event_json<T: DeserializeOwned>(
        &self,
        event_key: &str,
        path: String,
    ) -> Result<T, AppError> {
        if !is_valid_event_key(event_key) {
            return Err(AppError::Validation(format!(
                "Invalid event key {:?}",
                event_key
            )));
        }
        self.fetch_json(&path).await
    }

    /// Events in `year` whose name or event code contains `term`, case-insensitively.
    pub async fn search_events(&self, year: i32, term: &str) -> Vec<Competition> {
        let events: Vec<TbaEvent> = match self.fetch_json(&format!("events/{}", year)).await {
            Ok(events) => events,
            Err(e) => {
                tracing::error!("Error searching events: {}", e);
                return Vec::new();
            }
        };

        let needle = term.trim().to_lowercase();
        events
            .into_iter()
            .filter(|event| {
                event.name.to_lowercase().contains(&needle)
                    || event.event_code.to_lowercase().contains(&needle)
            })
            .map(|event| Competition {
                key: event.key,
                name: event.name,
                event_code: event.event_code,
                year: event.year,
                start_date: event.start_date.unwrap_or_default(),
                end_date: event.end_date.unwrap_or_default(),
            })
            .collect()
    }

    /// Qualification matches of an event, ordered by match number.
    pub async fn get_event_matches(&self, event_key: &str) -> Vec<Match> {
        let matches: Vec<TbaMatch> =
            match self
                .fetch_event_json(event_key, format!("event/{}/matches", event_key))
                .await
            {
                Ok(matches) => matches,
                Err(e) => {
                    tracing::error!("Error fetching event matches: {}", e);
                    return Vec::new();
                }
            };

        let mut schedule: Vec<Match> = matches
            .into_iter()
            .filter(|m| m.comp_level == "qm")
            .filter_map(|m| {
                let (Some(red_teams), Some(blue_teams)) =
                    (alliance_teams(&m.alliances.red), alliance_teams(&m.alliances.blue))
                else {
                    tracing::warn!("Skipping match {} with unexpected team keys", m.key);
                    return None;
                };
                Some(Match {
                    match_number: m.match_number,
                    red_teams,
                    blue_teams,
                    completed: Some(m.winning_alliance.is_some_and(|w| !w.is_empty())),
                    event_key: Some(event_key.to_string()),
                    blue_alliance_key: Some(m.key),
                })
            })
            .collect();

        schedule.sort_by_key(|m| m.match_number);
        schedule
    }

    /// Rank and record of a team at an event, if the API knows them.
    pub async fn get_team_status(&self, event_key: &str, team: u32) -> Option<TeamEventStatus> {
        let path = format!("team/frc{}/event/{}/status", team, event_key);
        let status: Option<TbaTeamStatus> = match self.fetch_event_json(event_key, path).await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!("Error fetching team stats: {}", e);
                return None;
            }
        };

        let ranking = status.unwrap_or_default().qual.and_then(|q| q.ranking);
        Some(TeamEventStatus {
            rank: ranking
                .as_ref()
                .and_then(|r| r.rank)
                .filter(|rank| *rank > 0),
            record: ranking.and_then(|r| r.record),
        })
    }

    pub async fn get_team_rank(&self, event_key: &str, team: u32) -> Option<u32> {
        self.get_team_status(event_key, team)
            .await
            .and_then(|status| status.rank)
    }

    /// Raw ranking rows of an event.
    pub async fn get_event_rankings(&self, event_key: &str) -> Vec<serde_json::Value> {
        match self
            .fetch_event_json::<Option<TbaRankings>>(
                event_key,
                format!("event/{}/rankings", event_key),
            )
            .await
        {
            Ok(rankings) => rankings.unwrap_or_default().rankings,
            Err(e) => {
                tracing::error!("Error fetching rankings: {}", e);
                Vec::new()
            }
        }
    }
}
