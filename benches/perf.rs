use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use serde_json::Value;

use lol_fantasy_ingest::api::parse_stats;
use lol_fantasy_ingest::normalize::{self, MultiKillConvention};
use lol_fantasy_ingest::scoring;

fn bench_stats_parse(c: &mut Criterion) {
    c.bench_function("stats_parse", |b| {
        b.iter(|| {
            let value: Value = serde_json::from_str(black_box(STATS_JSON)).unwrap();
            let stats = parse_stats(&value).unwrap();
            black_box(stats.player_games.len());
        })
    });
}

fn bench_player_block_normalize(c: &mut Criterion) {
    let value: Value = serde_json::from_str(STATS_JSON).unwrap();
    let stats = parse_stats(&value).unwrap();
    let block = stats.player_games[0].clone();

    c.bench_function("player_block_normalize", |b| {
        b.iter(|| {
            let entries = normalize::summary_entries(black_box(&block.entries), "player");
            let mut total = 0.0;
            for entry in entries {
                let row = normalize::player_score_row(
                    entry,
                    block.match_id as i64,
                    MultiKillConvention::Exclusive,
                )
                .unwrap();
                total += row.points;
            }
            black_box(total);
        })
    });
}

fn bench_scoring(c: &mut Criterion) {
    c.bench_function("player_points", |b| {
        b.iter(|| {
            let points = scoring::player_points(
                black_box(12),
                black_box(4),
                black_box(3),
                black_box(200),
                black_box(1),
                black_box(0),
                black_box(0),
            );
            black_box(scoring::round_points(points));
        })
    });
}

criterion_group!(perf, bench_stats_parse, bench_player_block_normalize, bench_scoring);
criterion_main!(perf);

static STATS_JSON: &str = include_str!("../tests/fixtures/stats_relaunch.json");
