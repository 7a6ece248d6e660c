use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::death::DeathRecord;

/// Reference offset for report dates and guild time ranges (UTC-8).
pub const REFERENCE_OFFSET_HOURS: i64 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encounter {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncountersResponse {
    #[serde(default)]
    pub encounters: Vec<Encounter>,
}

/// Body of `POST /api/analyze`. Both shapes are accepted by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalyzeRequest {
    Reports {
        reports: Vec<String>,
        encounter_id: u32,
    },
    Guild {
        guild_name: String,
        guild_server_slug: String,
        guild_server_region: String,
        start_time: i64,
        end_time: i64,
        encounter_id: u32,
    },
}

impl AnalyzeRequest {
    pub fn encounter_id(&self) -> u32 {
        match self {
            AnalyzeRequest::Reports { encounter_id, .. }
            | AnalyzeRequest::Guild { encounter_id, .. } => *encounter_id,
        }
    }

    pub fn guild_range(
        guild_name: &str,
        guild_server_slug: &str,
        guild_server_region: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        encounter_id: u32,
    ) -> Self {
        AnalyzeRequest::Guild {
            guild_name: guild_name.to_string(),
            guild_server_slug: guild_server_slug.to_string(),
            guild_server_region: guild_server_region.to_string(),
            start_time: range_start_millis(start_date),
            end_time: range_end_millis(end_date),
            encounter_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeathDetail {
    pub date: NaiveDate,
    pub fight_id: u32,
    pub death_order: u32,
    pub out_of: u32,
    pub ability_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerResult {
    pub name: String,
    #[serde(default)]
    pub bad_deaths: usize,
    #[serde(default)]
    pub avg_death_order: f64,
    #[serde(default)]
    pub early_deaths: usize,
    #[serde(default)]
    pub details: Vec<DeathDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub players: Vec<PlayerResult>,
}

impl AnalyzeResponse {
    /// Flatten every player's details into raw records, player by player.
    pub fn into_records(self) -> Vec<DeathRecord> {
        self.players
            .into_iter()
            .flat_map(|player| {
                let name = player.name;
                player.details.into_iter().map(move |d| DeathRecord {
                    player_name: name.clone(),
                    date: d.date,
                    fight_id: d.fight_id,
                    death_order: d.death_order,
                    out_of: d.out_of,
                    ability_name: d.ability_name,
                })
            })
            .collect()
    }

    /// Players whose reported `bad_deaths` disagrees with the details sent for them.
    pub fn count_mismatches(&self) -> Vec<&str> {
        self.players
            .iter()
            .filter(|p| p.bad_deaths != p.details.len())
            .map(|p| p.name.as_str())
            .collect()
    }
}

pub fn parse_encounters_json(raw: &str) -> Result<Vec<Encounter>> {
    let parsed: Option<EncountersResponse> =
        serde_json::from_str(raw).context("invalid encounters json")?;
    Ok(parsed.map(|r| r.encounters).unwrap_or_default())
}

pub fn parse_analyze_response_json(raw: &str) -> Result<AnalyzeResponse> {
    let parsed: Option<AnalyzeResponse> =
        serde_json::from_str(raw).context("invalid analyze response json")?;
    Ok(parsed.unwrap_or(AnalyzeResponse {
        players: Vec::new(),
    }))
}

fn start_of_day_millis(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or_default()
}

/// Midnight of `date` at the reference offset.
pub fn range_start_millis(date: NaiveDate) -> i64 {
    start_of_day_millis(date) + Duration::hours(REFERENCE_OFFSET_HOURS).num_milliseconds()
}

/// End of `date` at the reference offset: `start_of_day + 24h + 8h`.
pub fn range_end_millis(date: NaiveDate) -> i64 {
    start_of_day_millis(date) + Duration::hours(24 + REFERENCE_OFFSET_HOURS).num_milliseconds()
}

/// Calendar date of an epoch-millis instant at the reference offset.
pub fn reference_date(ms: i64) -> Option<NaiveDate> {
    let shifted = ms - Duration::hours(REFERENCE_OFFSET_HOURS).num_milliseconds();
    DateTime::from_timestamp_millis(shifted).map(|dt| dt.date_naive())
}
