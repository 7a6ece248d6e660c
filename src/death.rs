use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Deaths ranked within this window count as "early" unless configured otherwise.
pub const EARLY_DEATH_WINDOW: u32 = 3;

/// One player's death in one fight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathRecord {
    pub player_name: String,
    pub date: NaiveDate,
    pub fight_id: u32,
    pub death_order: u32,
    pub out_of: u32,
    pub ability_name: String,
}

impl DeathRecord {
    pub fn validate(&self, index: usize) -> Result<(), AnalysisError> {
        if self.player_name.is_empty() {
            return Err(AnalysisError::invalid(index, "empty player name"));
        }
        if self.death_order < 1 {
            return Err(AnalysisError::invalid(
                index,
                format!("{}: death order must be at least 1", self.player_name),
            ));
        }
        if self.out_of < self.death_order {
            return Err(AnalysisError::invalid(
                index,
                format!(
                    "{}: died {} out of {} in fight {}",
                    self.player_name, self.death_order, self.out_of, self.fight_id
                ),
            ));
        }
        Ok(())
    }

    pub fn is_early(&self, window: u32) -> bool {
        self.death_order <= window
    }

    /// Detail line, e.g. `fight 12 — died 1/20 to Crushing Blow`.
    pub fn detail_line(&self) -> String {
        format!(
            "fight {} — died {}/{} to {}",
            self.fight_id, self.death_order, self.out_of, self.ability_name
        )
    }
}

pub fn validate_batch(records: &[DeathRecord]) -> Result<(), AnalysisError> {
    records
        .iter()
        .enumerate()
        .try_for_each(|(idx, record)| record.validate(idx))
}
