//! Criterion benchmarks for canopy-tune: preprocessing and a small grid search.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use canopy_tune::{
    CancelToken, CrossValidatedTuner, Dataset, HyperparameterGrid, Preprocessor, RandomForestTrainer,
};

fn make_dataset(n_samples: usize, n_features: usize) -> Dataset {
    let mut features = Vec::with_capacity(n_samples);
    let mut outcomes = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let class = i % 2;
        outcomes.push(if class == 1 { "pos" } else { "neg" }.to_string());
        let row: Vec<f64> = (0..n_features)
            .map(|f| class as f64 * 1.5 + ((i * 31 + f * 17) % 97) as f64 / 97.0)
            .collect();
        features.push(row);
    }
    let ids = (0..n_samples).map(|i| i.to_string()).collect();
    let names = (0..n_features).map(|f| format!("f{f}")).collect();
    Dataset::new(outcomes, ids, names, features).unwrap()
}

fn bench_preprocess(c: &mut Criterion) {
    let ds = make_dataset(500, 30);
    let all: Vec<usize> = (0..ds.n_records()).collect();
    let matrix = ds.select(&all);
    c.bench_function("preprocess_fit_500x30", |b| {
        b.iter(|| Preprocessor::default().fit(black_box(&matrix), 1).unwrap());
    });
}

fn bench_tune(c: &mut Criterion) {
    let ds = make_dataset(200, 9);
    let all: Vec<usize> = (0..ds.n_records()).collect();
    let matrix = ds.select(&all);
    let grid = HyperparameterGrid::regular(9, (2, 2)).unwrap();
    let tuner = CrossValidatedTuner::new(3, 1).unwrap().with_n_trees(10);
    let trainer = RandomForestTrainer::new();
    c.bench_function("tune_200x9_grid4_k3", |b| {
        b.iter(|| {
            tuner
                .tune(&trainer, black_box(&matrix), &grid, &CancelToken::new())
                .unwrap()
        });
    });
}

criterion_group!(benches, bench_preprocess, bench_tune);
criterion_main!(benches);
