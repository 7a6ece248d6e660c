use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use chrono::NaiveDate;
use wcl_deaths::aggregate::{AggregateOptions, aggregate};
use wcl_deaths::death::DeathRecord;
use wcl_deaths::detail::group_by_date;
use wcl_deaths::rank::{SortKey, SortState, sort_summaries};

fn sample_records(players: usize, fights: u32) -> Vec<DeathRecord> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
    let mut out = Vec::with_capacity(players * fights as usize);
    for fight in 0..fights {
        for p in 0..players {
            let order = ((p as u32 + fight) % 20) + 1;
            out.push(DeathRecord {
                player_name: format!("Player {p}"),
                date: base + chrono::Duration::days(i64::from(fight / 8)),
                fight_id: fight + 1,
                death_order: order,
                out_of: 20,
                ability_name: "Digestive Acid".to_string(),
            });
        }
    }
    out
}

fn bench_aggregate(c: &mut Criterion) {
    let records = sample_records(30, 200);
    let opts = AggregateOptions::default();
    c.bench_function("aggregate_6000", |b| {
        b.iter(|| {
            let out = aggregate(black_box(&records), &opts).unwrap();
            black_box(out.len());
        })
    });
}

fn bench_sort(c: &mut Criterion) {
    let summaries = aggregate(&sample_records(30, 200), &AggregateOptions::default()).unwrap();
    c.bench_function("sort_by_name", |b| {
        b.iter(|| {
            let rows = sort_summaries(black_box(&summaries), SortState::for_key(SortKey::Name));
            black_box(rows.len());
        })
    });
    c.bench_function("sort_by_avg", |b| {
        b.iter(|| {
            let rows =
                sort_summaries(black_box(&summaries), SortState::for_key(SortKey::AvgDeathOrder));
            black_box(rows.len());
        })
    });
}

fn bench_group_by_date(c: &mut Criterion) {
    let summaries = aggregate(&sample_records(30, 200), &AggregateOptions::default()).unwrap();
    let details = &summaries[0].details;
    c.bench_function("group_by_date", |b| {
        b.iter(|| {
            let groups = group_by_date(black_box(details));
            black_box(groups.len());
        })
    });
}

criterion_group!(benches, bench_aggregate, bench_sort, bench_group_by_date);
criterion_main!(benches);
