use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::death::DeathRecord;

/// One calendar day of a player's deaths.
#[derive(Debug, Clone, PartialEq)]
pub struct DateGroup<'a> {
    pub date: NaiveDate,
    pub deaths: Vec<&'a DeathRecord>,
}

impl DateGroup<'_> {
    pub fn header(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Split `details` into per-date groups, oldest date first.
///
/// Records inside a group keep the order they had in `details`.
pub fn group_by_date(details: &[DeathRecord]) -> Vec<DateGroup<'_>> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&DeathRecord>> = BTreeMap::new();
    for record in details {
        by_date.entry(record.date).or_default().push(record);
    }
    by_date
        .into_iter()
        .map(|(date, deaths)| DateGroup { date, deaths })
        .collect()
}

/// Flattened render lines: a header per date, then one line per death.
pub fn detail_lines(details: &[DeathRecord]) -> Vec<DetailLine> {
    let mut lines = Vec::with_capacity(details.len() * 2);
    for group in group_by_date(details) {
        lines.push(DetailLine::DateHeader(group.header()));
        lines.extend(group.deaths.iter().map(|d| DetailLine::Death(d.detail_line())));
    }
    lines
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailLine {
    DateHeader(String),
    Death(String),
}
