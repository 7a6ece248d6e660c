use std::collections::{HashMap, HashSet};

use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::api_types::{AnalyzeRequest, Encounter};
use crate::death::DeathRecord;
use crate::error::AnalysisError;
use crate::fight_order::{FightDeath, FightLog, ReportContext, rank_report_deaths};

const DAY_MS: i64 = 86_400_000;
const MAX_DEMO_REPORTS: usize = 14;

const ROSTER: &[&str] = &[
    "Aelindra", "Brakka", "Cindervale", "Dùnmor", "eloise", "Fenwick", "Grimtotem", "Halvard",
    "Isolde", "Jorunn", "Kaelthos", "Lyrael", "Morwen", "Nyx", "Orrin", "Pellam", "Quillon",
    "Ravenna", "Sylas", "Thessaly",
];

struct DemoEncounter {
    id: u32,
    name: &'static str,
    bad: &'static [(u32, &'static str)],
}

const ENCOUNTERS: &[DemoEncounter] = &[
    DemoEncounter {
        id: 2902,
        name: "Ulgrax the Devourer",
        bad: &[(435138, "Digestive Acid"), (434705, "Tenderized")],
    },
    DemoEncounter {
        id: 2917,
        name: "The Bloodbound Horror",
        bad: &[(444363, "Gruesome Disgorge"), (445936, "Spewing Hemorrhage")],
    },
    DemoEncounter {
        id: 2898,
        name: "Sikran",
        bad: &[(433517, "Phase Blades"), (456420, "Shattering Sweep")],
    },
];

// Ordinary damage that does not count as a bad death.
const NEUTRAL_ABILITIES: &[(u32, &str)] = &[(1, "Melee"), (3, "Falling")];

pub fn demo_encounters() -> Vec<Encounter> {
    ENCOUNTERS
        .iter()
        .map(|e| Encounter {
            id: e.id,
            name: e.name.to_string(),
        })
        .collect()
}

/// Generate a plausible analysis for `request` without touching the network.
///
/// Report codes starting with `missing` fail the way an unknown report does
/// on the real service.
pub fn demo_analysis<R: Rng>(
    rng: &mut R,
    request: &AnalyzeRequest,
) -> Result<Vec<DeathRecord>, AnalysisError> {
    let encounter_id = request.encounter_id();
    let encounter = ENCOUNTERS
        .iter()
        .find(|e| e.id == encounter_id)
        .ok_or_else(|| {
            AnalysisError::Transport(format!("Encounter ID {encounter_id} not found in config"))
        })?;

    let report_starts: Vec<i64> = match request {
        AnalyzeRequest::Reports { reports, .. } => {
            if let Some(code) = reports.iter().find(|c| c.starts_with("missing")) {
                return Err(AnalysisError::Transport(format!("Report {code} not found")));
            }
            let now = Utc::now();
            reports
                .iter()
                .take(MAX_DEMO_REPORTS)
                .enumerate()
                .map(|(idx, _)| (now - ChronoDuration::days(idx as i64 * 7)).timestamp_millis())
                .collect()
        }
        AnalyzeRequest::Guild {
            start_time,
            end_time,
            ..
        } => {
            // One raid night every few days, starting 20:00 at the reference offset.
            let mut starts = Vec::new();
            let mut night = *start_time + 20 * 3_600_000;
            while night < *end_time && starts.len() < MAX_DEMO_REPORTS {
                starts.push(night);
                night += DAY_MS * rng.gen_range(2..=4);
            }
            starts
        }
    };

    let actor_names: HashMap<i32, String> = ROSTER
        .iter()
        .enumerate()
        .map(|(idx, name)| (idx as i32 + 1, name.to_string()))
        .collect();
    let ability_names: HashMap<u32, String> = encounter
        .bad
        .iter()
        .chain(NEUTRAL_ABILITIES)
        .map(|(id, name)| (*id, name.to_string()))
        .collect();
    let bad_abilities: HashSet<u32> = encounter.bad.iter().map(|(id, _)| *id).collect();

    let mut records = Vec::new();
    let mut fight_id = 1;
    for start in report_starts {
        let pulls = rng.gen_range(3..=8);
        let fights: Vec<FightLog> = (0..pulls)
            .map(|_| {
                let fight = random_fight(&mut *rng, fight_id, encounter, actor_names.len());
                fight_id += 1;
                fight
            })
            .collect();
        let ctx = ReportContext {
            report_start_ms: start,
            actor_names: &actor_names,
            ability_names: &ability_names,
            bad_abilities: &bad_abilities,
        };
        records.extend(rank_report_deaths(&fights, encounter.id, &ctx));
    }
    Ok(records)
}

fn random_fight<R: Rng>(
    rng: &mut R,
    fight_id: u32,
    encounter: &DemoEncounter,
    roster_size: usize,
) -> FightLog {
    let roster: Vec<i32> = (1..=roster_size as i32).collect();
    let mut victims = roster.clone();
    victims.shuffle(rng);
    let deaths_in_pull = rng.gen_range(1..=roster_size.min(12));

    let deaths = victims
        .into_iter()
        .take(deaths_in_pull)
        .map(|target_id| {
            let killing_ability_id = if rng.gen_bool(0.45) {
                encounter.bad.choose(rng).map(|(id, _)| *id)
            } else {
                NEUTRAL_ABILITIES.choose(rng).map(|(id, _)| *id)
            };
            FightDeath {
                timestamp_ms: rng.gen_range(5_000.0..360_000.0),
                target_id,
                killing_ability_id,
            }
        })
        .collect();

    FightLog {
        fight_id,
        encounter_id: encounter.id,
        kill: Some(rng.gen_bool(0.2)),
        roster,
        deaths,
    }
}
