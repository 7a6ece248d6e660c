use std::cmp::Ordering;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::aggregate::PlayerSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    BadDeaths,
    AvgDeathOrder,
    EarlyDeaths,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

impl SortKey {
    /// Names read A-Z; counts and averages show the largest first.
    pub fn default_direction(self) -> SortDirection {
        match self {
            SortKey::Name => SortDirection::Ascending,
            SortKey::BadDeaths | SortKey::AvgDeathOrder | SortKey::EarlyDeaths => {
                SortDirection::Descending
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self::for_key(SortKey::BadDeaths)
    }
}

impl SortState {
    pub fn for_key(key: SortKey) -> Self {
        Self {
            key,
            direction: key.default_direction(),
        }
    }

    /// Clicking the active column flips it; any other column starts at its default.
    pub fn select(self, key: SortKey) -> Self {
        if self.key == key {
            Self {
                key,
                direction: self.direction.flipped(),
            }
        } else {
            Self::for_key(key)
        }
    }
}

/// Ordered view over `summaries`. Equal keys keep their input order in either direction.
pub fn sort_summaries(summaries: &[PlayerSummary], sort: SortState) -> Vec<&PlayerSummary> {
    let mut rows: Vec<&PlayerSummary> = summaries.iter().collect();
    rows.sort_by(|a, b| {
        let ord = compare_by(a, b, sort.key);
        match sort.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
    rows
}

fn compare_by(a: &PlayerSummary, b: &PlayerSummary, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => locale_cmp(&a.name, &b.name),
        SortKey::BadDeaths => a.bad_deaths.cmp(&b.bad_deaths),
        SortKey::AvgDeathOrder => a.avg_death_order.total_cmp(&b.avg_death_order),
        SortKey::EarlyDeaths => a.early_deaths.cmp(&b.early_deaths),
    }
}

/// Dictionary-style comparison.
///
/// Base letters decide first, ignoring accents and case (`Dùnmor` sits next to
/// `Dunmor`, before `Dunzo`). Ties fall back to the case-folded text, then to
/// the exact text.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(&base_letters(b))
        .then_with(|| {
            let folded_a = a.chars().flat_map(char::to_lowercase);
            let folded_b = b.chars().flat_map(char::to_lowercase);
            folded_a.cmp(folded_b)
        })
        .then_with(|| a.cmp(b))
}

fn base_letters(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_cmp_ignores_case_before_text() {
        assert_eq!(locale_cmp("alice", "Bob"), Ordering::Less);
        assert_eq!(locale_cmp("Bob", "alice"), Ordering::Greater);
        assert_eq!(locale_cmp("Ana", "ana"), Ordering::Less);
        assert_eq!(locale_cmp("Ana", "Ana"), Ordering::Equal);
    }

    #[test]
    fn locale_cmp_ignores_accents_before_text() {
        assert_eq!(locale_cmp("Dùnmor", "Dunzo"), Ordering::Less);
        assert_eq!(locale_cmp("Élise", "Fenwick"), Ordering::Less);
        assert_eq!(locale_cmp("Elise", "Élise"), Ordering::Less);
        assert_eq!(locale_cmp("élise", "Élise"), Ordering::Greater);
    }
}
