use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use wcl_deaths::aggregate::{AggregateOptions, aggregate};
use wcl_deaths::api_types::{
    AnalyzeRequest, parse_analyze_response_json, parse_encounters_json, range_end_millis,
    range_start_millis, reference_date,
};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_encounters_fixture() {
    let raw = read_fixture("encounters.json");
    let encounters = parse_encounters_json(&raw).expect("fixture should parse");
    assert_eq!(encounters.len(), 2);
    assert_eq!(encounters[0].id, 2902);
    assert_eq!(encounters[0].name, "Ulgrax the Devourer");
}

#[test]
fn parses_analyze_fixture_into_records() {
    let raw = read_fixture("analyze_response.json");
    let response = parse_analyze_response_json(&raw).expect("fixture should parse");
    assert_eq!(response.players.len(), 3);
    assert_eq!(response.count_mismatches(), vec!["Brakka"]);

    let records = response.into_records();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].player_name, "Aelindra");
    assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 1, 9).unwrap());
    assert_eq!(records[1].ability_name, "Tenderized");
    assert_eq!(records[2].player_name, "Brakka");
    assert_eq!(records[2].fight_id, 5);
}

#[test]
fn fixture_aggregates_locally() {
    let raw = read_fixture("analyze_response.json");
    let records = parse_analyze_response_json(&raw)
        .expect("fixture should parse")
        .into_records();
    let summaries = aggregate(&records, &AggregateOptions::default()).expect("valid batch");
    // Cindervale has no details and no bad deaths.
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].bad_deaths, 2);
    assert_eq!(summaries[0].avg_death_order, 3.5);
    assert_eq!(summaries[0].early_deaths, 1);
    assert_eq!(summaries[1].bad_deaths, 1);
}

#[test]
fn null_bodies_are_empty() {
    assert!(parse_encounters_json("null").expect("null should parse").is_empty());
    assert!(
        parse_analyze_response_json("null")
            .expect("null should parse")
            .players
            .is_empty()
    );
    assert!(
        parse_analyze_response_json("{}")
            .expect("empty object should parse")
            .players
            .is_empty()
    );
}

#[test]
fn garbage_is_an_error() {
    assert!(parse_analyze_response_json("<html>502</html>").is_err());
}

#[test]
fn request_bodies_serialize_flat() {
    let reports = AnalyzeRequest::Reports {
        reports: vec!["abc".to_string(), "def".to_string()],
        encounter_id: 2902,
    };
    let value = serde_json::to_value(&reports).expect("serializes");
    assert_eq!(
        value,
        serde_json::json!({ "reports": ["abc", "def"], "encounter_id": 2902 })
    );

    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let guild = AnalyzeRequest::guild_range("G", "area-52", "us", start, end, 2917);
    let value = serde_json::to_value(&guild).expect("serializes");
    assert_eq!(
        value,
        serde_json::json!({
            "guild_name": "G",
            "guild_server_slug": "area-52",
            "guild_server_region": "us",
            "start_time": 1_704_096_000_000_i64,
            "end_time": 1_704_182_400_000_i64,
            "encounter_id": 2917,
        })
    );
}

#[test]
fn range_end_covers_whole_reference_day() {
    let day = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
    let start = range_start_millis(day);
    let end = range_end_millis(day);
    assert_eq!(end - start, 86_400_000);
    assert_eq!(reference_date(start), Some(day));
    assert_eq!(reference_date(end - 1), Some(day));
    assert_eq!(reference_date(end), NaiveDate::from_ymd_opt(2024, 6, 16));
}
