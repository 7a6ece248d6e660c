use std::collections::{BTreeSet, HashMap};

use crate::death::{DeathRecord, EARLY_DEATH_WINDOW, validate_batch};
use crate::error::AnalysisError;

/// Which records count as "bad" deaths.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BadDeathRule {
    /// Records arrive already classified (the analysis service only sends bad deaths).
    #[default]
    AllRecords,
    /// Re-derive locally: died at or before this rank.
    OrderAtMost(u32),
    /// Re-derive locally: killed by one of these abilities.
    Abilities(BTreeSet<String>),
}

impl BadDeathRule {
    pub fn qualifies(&self, record: &DeathRecord) -> bool {
        match self {
            BadDeathRule::AllRecords => true,
            BadDeathRule::OrderAtMost(limit) => record.death_order <= *limit,
            BadDeathRule::Abilities(names) => names.contains(&record.ability_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateOptions {
    pub rule: BadDeathRule,
    pub early_window: u32,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            rule: BadDeathRule::AllRecords,
            early_window: EARLY_DEATH_WINDOW,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSummary {
    pub name: String,
    pub bad_deaths: usize,
    pub avg_death_order: f64,
    pub early_deaths: usize,
    pub details: Vec<DeathRecord>,
}

/// Group a batch of records into one summary per player.
///
/// Summaries come out in order of each player's first record. Players with no
/// qualifying record are left out, so an all-clean batch yields an empty list.
/// Any malformed record rejects the whole batch.
pub fn aggregate(
    records: &[DeathRecord],
    opts: &AggregateOptions,
) -> Result<Vec<PlayerSummary>, AnalysisError> {
    validate_batch(records)?;

    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&DeathRecord>)> = Vec::new();
    for record in records {
        let name = record.player_name.as_str();
        let idx = *slots.entry(name).or_insert_with(|| {
            groups.push((name, Vec::new()));
            groups.len() - 1
        });
        groups[idx].1.push(record);
    }

    let summaries = groups
        .into_iter()
        .filter_map(|(name, deaths)| summarize(name, &deaths, opts))
        .collect();
    Ok(summaries)
}

fn summarize(
    name: &str,
    deaths: &[&DeathRecord],
    opts: &AggregateOptions,
) -> Option<PlayerSummary> {
    let qualifying: Vec<u32> = deaths
        .iter()
        .filter(|d| opts.rule.qualifies(d))
        .map(|d| d.death_order)
        .collect();
    if qualifying.is_empty() {
        return None;
    }

    let total: u64 = qualifying.iter().map(|&o| u64::from(o)).sum();
    let avg_death_order = total as f64 / qualifying.len() as f64;
    let early_deaths = deaths
        .iter()
        .filter(|d| d.is_early(opts.early_window))
        .count();

    Some(PlayerSummary {
        name: name.to_string(),
        bad_deaths: qualifying.len(),
        avg_death_order,
        early_deaths,
        details: deaths.iter().map(|d| (*d).clone()).collect(),
    })
}
