use criterion::{black_box, criterion_group, criterion_main, Criterion};
use runtime::{SimulatorConfig, TradingSimulator, DEFAULT_STARTING_CASH};
use series::CandleGenerator;
use strategy::{DivergenceMatcher, MatcherConfig};

const SERIES_LEN: usize = 5_000;

fn bench_query_and_simulation_latency(c: &mut Criterion) {
    let series = CandleGenerator::new(11, 50.0, 1.5).take_series(SERIES_LEN);
    let config =
        SimulatorConfig::new(DEFAULT_STARTING_CASH).expect("simulator config should build");
    let simulator = TradingSimulator::new(config).expect("simulator should build");
    let confirmed = DivergenceMatcher::new(
        MatcherConfig::default()
            .with_confirmation_count(2)
            .expect("confirmation count should be valid"),
    );

    c.bench_function("single_query_mid_series", |b| {
        b.iter(|| confirmed.query(black_box(&series), black_box(SERIES_LEN / 2)));
    });

    c.bench_function("simulate_full_series", |b| {
        b.iter(|| simulator.simulate(black_box(&series)));
    });
}

criterion_group!(benches, bench_query_and_simulation_latency);
criterion_main!(benches);
