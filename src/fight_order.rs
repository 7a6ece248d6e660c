use std::collections::{HashMap, HashSet};

use crate::api_types::reference_date;
use crate::death::DeathRecord;

/// A death as it appears in a raw combat log.
#[derive(Debug, Clone)]
pub struct FightDeath {
    pub timestamp_ms: f64,
    pub target_id: i32,
    pub killing_ability_id: Option<u32>,
}

/// One pull of an encounter together with its death events.
#[derive(Debug, Clone)]
pub struct FightLog {
    pub fight_id: u32,
    pub encounter_id: u32,
    pub kill: Option<bool>,
    /// Actor ids of friendly players present in the fight.
    pub roster: Vec<i32>,
    pub deaths: Vec<FightDeath>,
}

impl FightLog {
    /// Trash segments have no encounter id; aborted segments carry no kill flag.
    pub fn is_real_encounter(&self) -> bool {
        self.encounter_id != 0 && self.kill.is_some()
    }
}

/// Everything needed to classify deaths of one report.
pub struct ReportContext<'a> {
    pub report_start_ms: i64,
    pub actor_names: &'a HashMap<i32, String>,
    pub ability_names: &'a HashMap<u32, String>,
    pub bad_abilities: &'a HashSet<u32>,
}

/// Rank the roster's deaths in `fight` by time and keep the ones caused by a bad ability.
///
/// `death_order` is the 1-based position in that ranking. Every roster death is
/// ranked, including a second death after a battle resurrection, so `out_of` is
/// the roster size or the number of ranked deaths, whichever is larger.
pub fn rank_fight_deaths(fight: &FightLog, ctx: &ReportContext<'_>) -> Vec<DeathRecord> {
    let Some(date) = reference_date(ctx.report_start_ms) else {
        return Vec::new();
    };

    let mut ordered: Vec<&FightDeath> = fight
        .deaths
        .iter()
        .filter(|d| fight.roster.contains(&d.target_id))
        .collect();
    ordered.sort_by(|a, b| a.timestamp_ms.total_cmp(&b.timestamp_ms));

    let out_of = fight.roster.len().max(ordered.len()) as u32;
    ordered
        .into_iter()
        .enumerate()
        .filter_map(|(idx, death)| {
            let name = ctx.actor_names.get(&death.target_id)?;
            let ability_id = death.killing_ability_id?;
            if !ctx.bad_abilities.contains(&ability_id) {
                return None;
            }
            Some(DeathRecord {
                player_name: name.clone(),
                date,
                fight_id: fight.fight_id,
                death_order: idx as u32 + 1,
                out_of,
                ability_name: ability_label(ctx.ability_names, ability_id),
            })
        })
        .collect()
}

/// Records for every real pull of `encounter_id` in a report, fight by fight.
pub fn rank_report_deaths(
    fights: &[FightLog],
    encounter_id: u32,
    ctx: &ReportContext<'_>,
) -> Vec<DeathRecord> {
    fights
        .iter()
        .filter(|f| f.is_real_encounter() && f.encounter_id == encounter_id)
        .flat_map(|f| rank_fight_deaths(f, ctx))
        .collect()
}

pub fn ability_label(names: &HashMap<u32, String>, id: u32) -> String {
    names
        .get(&id)
        .cloned()
        .unwrap_or_else(|| format!("Unknown({id})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{AggregateOptions, aggregate};
    use chrono::NaiveDate;

    fn ctx_maps() -> (HashMap<i32, String>, HashMap<u32, String>, HashSet<u32>) {
        let actors = HashMap::from([
            (1, "Tank".to_string()),
            (2, "Healer".to_string()),
            (3, "Mage".to_string()),
        ]);
        let abilities = HashMap::from([(500, "Flame Wave".to_string())]);
        let bad = HashSet::from([500, 501]);
        (actors, abilities, bad)
    }

    fn death(ts: f64, target: i32, ability: Option<u32>) -> FightDeath {
        FightDeath {
            timestamp_ms: ts,
            target_id: target,
            killing_ability_id: ability,
        }
    }

    #[test]
    fn ranks_by_timestamp_and_keeps_bad_abilities() {
        let (actors, abilities, bad) = ctx_maps();
        // 2024-01-10 12:00 UTC, which is 04:00 at UTC-8.
        let start = NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis();
        let ctx = ReportContext {
            report_start_ms: start,
            actor_names: &actors,
            ability_names: &abilities,
            bad_abilities: &bad,
        };
        let fight = FightLog {
            fight_id: 4,
            encounter_id: 2900,
            kill: Some(false),
            roster: vec![1, 2, 3],
            deaths: vec![
                death(3000.0, 3, Some(501)),
                death(1000.0, 2, Some(500)),
                death(2000.0, 1, Some(9)),
                death(500.0, 99, Some(500)),
            ],
        };

        let out = rank_fight_deaths(&fight, &ctx);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].player_name, "Healer");
        assert_eq!(out[0].death_order, 1);
        assert_eq!(out[0].out_of, 3);
        assert_eq!(out[0].ability_name, "Flame Wave");
        assert_eq!(out[1].player_name, "Mage");
        assert_eq!(out[1].death_order, 3);
        assert_eq!(out[1].ability_name, "Unknown(501)");
        assert_eq!(out[0].date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
    }

    #[test]
    fn repeat_death_after_resurrection_stays_valid() {
        let (actors, abilities, bad) = ctx_maps();
        let ctx = ReportContext {
            report_start_ms: 1_704_888_000_000,
            actor_names: &actors,
            ability_names: &abilities,
            bad_abilities: &bad,
        };
        let fight = FightLog {
            fight_id: 1,
            encounter_id: 2900,
            kill: Some(true),
            roster: vec![1, 2],
            deaths: vec![
                death(100.0, 1, Some(500)),
                death(200.0, 2, Some(500)),
                death(300.0, 1, Some(500)),
            ],
        };

        let out = rank_fight_deaths(&fight, &ctx);
        let ranks: Vec<(&str, u32, u32)> = out
            .iter()
            .map(|r| (r.player_name.as_str(), r.death_order, r.out_of))
            .collect();
        assert_eq!(ranks, vec![("Tank", 1, 3), ("Healer", 2, 3), ("Tank", 3, 3)]);

        let summaries = aggregate(&out, &AggregateOptions::default()).unwrap();
        assert_eq!(summaries[0].name, "Tank");
        assert_eq!(summaries[0].bad_deaths, 2);
    }

    #[test]
    fn report_skips_trash_and_other_encounters() {
        let (actors, abilities, bad) = ctx_maps();
        let ctx = ReportContext {
            report_start_ms: 1_704_888_000_000,
            actor_names: &actors,
            ability_names: &abilities,
            bad_abilities: &bad,
        };
        let pull = |id, encounter, kill| FightLog {
            fight_id: id,
            encounter_id: encounter,
            kill,
            roster: vec![1],
            deaths: vec![death(10.0, 1, Some(500))],
        };
        let fights = vec![
            pull(1, 0, Some(true)),
            pull(2, 2900, None),
            pull(3, 2901, Some(true)),
            pull(4, 2900, Some(true)),
        ];
        let out = rank_report_deaths(&fights, 2900, &ctx);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].fight_id, 4);
    }
}
