use std::collections::BTreeSet;
use std::env;

use crate::aggregate::{AggregateOptions, BadDeathRule};
use crate::death::EARLY_DEATH_WINDOW;

const DEFAULT_API_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Http,
    Demo,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub source: Source,
    pub aggregate: AggregateOptions,
}

impl Settings {
    pub fn from_env() -> Self {
        let api_url = env::var("WCL_DEATHS_API")
            .ok()
            .map(|val| val.trim().trim_end_matches('/').to_string())
            .filter(|val| !val.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let source = match env::var("WCL_DEATHS_SOURCE")
            .unwrap_or_default()
            .trim()
            .to_lowercase()
            .as_str()
        {
            "demo" | "fake" => Source::Demo,
            _ => Source::Http,
        };
        let early_window = env::var("WCL_DEATHS_EARLY_WINDOW")
            .ok()
            .and_then(|val| val.trim().parse::<u32>().ok())
            .unwrap_or(EARLY_DEATH_WINDOW)
            .clamp(1, 40);
        let rule = env::var("WCL_DEATHS_RULE")
            .ok()
            .and_then(|val| parse_rule(&val))
            .unwrap_or_default();

        Self {
            api_url,
            source,
            aggregate: AggregateOptions { rule, early_window },
        }
    }
}

/// `all`, `order:<n>` or `abilities:<name>,<name>`.
pub fn parse_rule(raw: &str) -> Option<BadDeathRule> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("all") {
        return Some(BadDeathRule::AllRecords);
    }
    let (kind, rest) = raw.split_once(':')?;
    match kind.trim().to_lowercase().as_str() {
        "order" => rest
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|n| *n >= 1)
            .map(BadDeathRule::OrderAtMost),
        "abilities" => {
            let names: BTreeSet<String> = rest
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if names.is_empty() {
                None
            } else {
                Some(BadDeathRule::Abilities(names))
            }
        }
        _ => None,
    }
}
