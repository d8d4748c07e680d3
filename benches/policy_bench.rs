//! Move Selection Benchmarks
//!
//! Performance benchmarks for the sampling pipeline using Criterion.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mimicbot::engine::policy::{choose_from_prediction, rank, sample_order, sharpen};
use mimicbot::engine::rating::default_pair;
use mimicbot::engine::{Calibration, EncodedHistory, LatentRating, MoveToken, Prediction, SamplingConfig};
use mimicbot::game::Variant;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Every plain move token with a probability decaying by index
fn dense_prediction() -> Prediction {
    let moves = (1..=4096u32)
        .map(|id| (MoveToken(id), 1.0 / f64::from(id)))
        .collect();
    Prediction {
        moves,
        latent: vec![LatentRating { mean: 0.0, scale: 1.0 }; 2],
    }
}

fn opening_prediction() -> Prediction {
    let moves = ["e2e4", "d2d4", "g1f3", "c2c4", "e2e5", "b1c3", "g2g3", "f2f4"]
        .iter()
        .zip([0.35, 0.3, 0.12, 0.1, 0.05, 0.04, 0.02, 0.02])
        .filter_map(|(uci, p)| MoveToken::from_uci_str(uci).map(|t| (t, p)))
        .collect();
    Prediction {
        moves,
        latent: vec![LatentRating { mean: 0.0, scale: 1.0 }],
    }
}

fn bench_rank_full_vocabulary(c: &mut Criterion) {
    let prediction = dense_prediction();

    c.bench_function("rank_top10_of_4096", |b| b.iter(|| black_box(rank(&prediction, 10))));
}

fn bench_sharpen(c: &mut Criterion) {
    let probabilities = [0.4, 0.25, 0.15, 0.08, 0.05, 0.03, 0.02, 0.01, 0.007, 0.003];

    c.bench_function("sharpen_top10", |b| {
        b.iter(|| black_box(sharpen(black_box(&probabilities), 0.2, 1e-8)))
    });
}

fn bench_sample_order(c: &mut Criterion) {
    let weights = [0.5, 0.3, 0.1, 0.05, 0.03, 0.01, 0.005, 0.003, 0.001, 0.001];
    let mut rng = StdRng::seed_from_u64(7);

    c.bench_function("sample_order_top10", |b| {
        b.iter(|| black_box(sample_order(&weights, &mut rng)))
    });
}

fn bench_choose_opening_move(c: &mut Criterion) {
    let prediction = opening_prediction();
    let calibration = Calibration {
        mean: 1500.0,
        scale: 350.0,
    };
    let prior = default_pair(calibration);
    let mut rng = StdRng::seed_from_u64(11);

    c.bench_function("choose_from_prediction_opening", |b| {
        b.iter(|| {
            let Ok(mut history) = EncodedHistory::new(Variant::Standard, None) else {
                return;
            };
            let choice = choose_from_prediction(
                &mut history,
                &prediction,
                SamplingConfig::default(),
                prior,
                calibration,
                &mut rng,
            );
            black_box(choice.is_ok());
        })
    });
}

criterion_group!(
    benches,
    bench_rank_full_vocabulary,
    bench_sharpen,
    bench_sample_order,
    bench_choose_opening_move,
);
criterion_main!(benches);
