use wcl_deaths::aggregate::PlayerSummary;
use wcl_deaths::rank::{SortDirection, SortKey, SortState, sort_summaries};

fn summary(name: &str, bad: usize, avg: f64, early: usize) -> PlayerSummary {
    PlayerSummary {
        name: name.to_string(),
        bad_deaths: bad,
        avg_death_order: avg,
        early_deaths: early,
        details: Vec::new(),
    }
}

fn names(rows: &[&PlayerSummary]) -> Vec<String> {
    rows.iter().map(|p| p.name.clone()).collect()
}

#[test]
fn descending_and_ascending_are_reverses_without_ties() {
    let data = vec![
        summary("A", 3, 2.0, 1),
        summary("B", 7, 4.0, 0),
        summary("C", 1, 1.0, 2),
        summary("D", 5, 3.5, 3),
    ];
    let desc = names(&sort_summaries(&data, SortState::for_key(SortKey::BadDeaths)));
    let asc = names(&sort_summaries(
        &data,
        SortState::for_key(SortKey::BadDeaths).select(SortKey::BadDeaths),
    ));
    assert_eq!(desc, vec!["B", "D", "A", "C"]);
    let mut reversed = asc.clone();
    reversed.reverse();
    assert_eq!(desc, reversed);
}

#[test]
fn ties_keep_input_order_in_both_directions() {
    let data = vec![
        summary("first", 2, 1.0, 0),
        summary("top", 4, 1.0, 0),
        summary("second", 2, 1.0, 0),
        summary("third", 2, 1.0, 0),
    ];
    let desc = names(&sort_summaries(&data, SortState::for_key(SortKey::BadDeaths)));
    assert_eq!(desc, vec!["top", "first", "second", "third"]);

    let asc = SortState {
        key: SortKey::BadDeaths,
        direction: SortDirection::Ascending,
    };
    let asc = names(&sort_summaries(&data, asc));
    assert_eq!(asc, vec!["first", "second", "third", "top"]);
}

#[test]
fn names_sort_dictionary_style() {
    let data = vec![
        summary("zed", 1, 1.0, 0),
        summary("Bravo", 1, 1.0, 0),
        summary("alpha", 1, 1.0, 0),
        summary("Charlie", 1, 1.0, 0),
    ];
    let rows = names(&sort_summaries(&data, SortState::for_key(SortKey::Name)));
    assert_eq!(rows, vec!["alpha", "Bravo", "Charlie", "zed"]);
}

#[test]
fn accented_names_sort_with_their_base_letters() {
    let data = vec![
        summary("Fenwick", 1, 1.0, 0),
        summary("Élise", 1, 1.0, 0),
        summary("Dunzo", 1, 1.0, 0),
        summary("Dùnmor", 1, 1.0, 0),
    ];
    let rows = names(&sort_summaries(&data, SortState::for_key(SortKey::Name)));
    assert_eq!(rows, vec!["Dùnmor", "Dunzo", "Élise", "Fenwick"]);

    let desc = SortState::for_key(SortKey::Name).select(SortKey::Name);
    let rows = names(&sort_summaries(&data, desc));
    assert_eq!(rows, vec!["Fenwick", "Élise", "Dunzo", "Dùnmor"]);
}

#[test]
fn average_sort_puts_highest_first_by_default() {
    let data = vec![
        summary("A", 1, 2.5, 0),
        summary("B", 1, 7.25, 0),
        summary("C", 1, 4.0, 0),
    ];
    let rows = names(&sort_summaries(&data, SortState::for_key(SortKey::AvgDeathOrder)));
    assert_eq!(rows, vec!["B", "C", "A"]);
}

#[test]
fn selecting_keys_toggles_or_resets_direction() {
    let start = SortState::default();
    assert_eq!(start.key, SortKey::BadDeaths);
    assert_eq!(start.direction, SortDirection::Descending);

    let flipped = start.select(SortKey::BadDeaths);
    assert_eq!(flipped.direction, SortDirection::Ascending);

    let by_name = flipped.select(SortKey::Name);
    assert_eq!(by_name.key, SortKey::Name);
    assert_eq!(by_name.direction, SortDirection::Ascending);

    let early = by_name.select(SortKey::Name).select(SortKey::EarlyDeaths);
    assert_eq!(early.key, SortKey::EarlyDeaths);
    assert_eq!(early.direction, SortDirection::Descending);
}

#[test]
fn sorting_leaves_input_untouched() {
    let data = vec![summary("A", 1, 1.0, 0), summary("B", 9, 1.0, 0)];
    let _ = sort_summaries(&data, SortState::default());
    assert_eq!(data[0].name, "A");
    assert_eq!(data[1].name, "B");
}
