//! Per-team aggregation of scouting entries for the admin analysis view.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::lookup::TbaClient;
use crate::models::{ClimbStatus, ScoutingEntry};

/// How often each climb outcome was recorded for a team.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ClimbTally {
    #[serde(rename = "no-climb")]
    pub no_climb: u32,
    #[serde(rename = "low-climb")]
    pub low_climb: u32,
    #[serde(rename = "deep-climb")]
    pub deep_climb: u32,
}

impl ClimbTally {
    fn record(&mut self, status: ClimbStatus) {
        match status {
            ClimbStatus::NoClimb => self.no_climb += 1,
            ClimbStatus::LowClimb => self.low_climb += 1,
            ClimbStatus::DeepClimb => self.deep_climb += 1,
        }
    }

    pub fn count(&self, status: ClimbStatus) -> u32 {
        match status {
            ClimbStatus::NoClimb => self.no_climb,
            ClimbStatus::LowClimb => self.low_climb,
            ClimbStatus::DeepClimb => self.deep_climb,
        }
    }
}

/// Aggregated performance of one team.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamStats {
    pub team_number: u32,
    pub match_count: u32,
    pub avg_l1: f64,
    pub avg_l2: f64,
    pub avg_l3: f64,
    pub avg_l4: f64,
    /// Average of the four counters summed per match
    pub total_score: f64,
    pub climb_stats: ClimbTally,
    pub rank: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    TeamNumber,
    MatchCount,
    AvgL1,
    AvgL2,
    AvgL3,
    AvgL4,
    #[default]
    TotalScore,
    Rank,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Default)]
struct Totals {
    matches: u32,
    levels: [u64; 4],
    scored: u64,
    climbs: ClimbTally,
}

/// Aggregate entries per team, in order of each team's first entry.
/// With an event selected, only entries recorded for that event count.
pub fn aggregate(entries: &[ScoutingEntry], event_key: Option<&str>) -> Vec<TeamStats> {
    let mut order: Vec<u32> = Vec::new();
    let mut totals: HashMap<u32, Totals> = HashMap::new();

    let selected = entries
        .iter()
        .filter(|e| event_key.is_none() || e.event_key.as_deref() == event_key);

    for entry in selected {
        let team = totals.entry(entry.team_number).or_insert_with(|| {
            order.push(entry.team_number);
            Totals::default()
        });
        team.matches += 1;
        team.levels[0] += u64::from(entry.l1_count);
        team.levels[1] += u64::from(entry.l2_count);
        team.levels[2] += u64::from(entry.l3_count);
        team.levels[3] += u64::from(entry.l4_count);
        team.scored += entry.total_count();
        team.climbs.record(entry.climb_status);
    }

    order
        .into_iter()
        .filter_map(|team_number| {
            let t = totals.remove(&team_number)?;
            let n = f64::from(t.matches);
            let avg = |sum: u64| sum as f64 / n;
            Some(TeamStats {
                team_number,
                match_count: t.matches,
                avg_l1: avg(t.levels[0]),
                avg_l2: avg(t.levels[1]),
                avg_l3: avg(t.levels[2]),
                avg_l4: avg(t.levels[3]),
                total_score: avg(t.scored),
                climb_stats: t.climbs,
                rank: None,
            })
        })
        .collect()
}

/// Fill in each team's event rank. Teams the API does not rank keep `None`.
pub async fn attach_ranks(stats: &mut [TeamStats], tba: &TbaClient, event_key: &str) {
    for team in stats.iter_mut() {
        team.rank = tba.get_team_rank(event_key, team.team_number).await;
    }
}

fn sort_value(stats: &TeamStats, field: SortField) -> Option<f64> {
    match field {
        SortField::TeamNumber => Some(f64::from(stats.team_number)),
        SortField::MatchCount => Some(f64::from(stats.match_count)),
        SortField::AvgL1 => Some(stats.avg_l1),
        SortField::AvgL2 => Some(stats.avg_l2),
        SortField::AvgL3 => Some(stats.avg_l3),
        SortField::AvgL4 => Some(stats.avg_l4),
        SortField::TotalScore => Some(stats.total_score),
        SortField::Rank => stats.rank.map(f64::from),
    }
}

/// Keep teams that recorded `climb` at least once, then sort. Missing values sort last
/// in either direction.
pub fn filter_and_sort(
    stats: Vec<TeamStats>,
    climb: Option<ClimbStatus>,
    field: SortField,
    order: SortOrder,
) -> Vec<TeamStats> {
    let mut stats: Vec<TeamStats> = stats
        .into_iter()
        .filter(|team| climb.map_or(true, |c| team.climb_stats.count(c) > 0))
        .collect();

    stats.sort_by(|a, b| match (sort_value(a, field), sort_value(b, field)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
            match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        }
    });
    stats
}
