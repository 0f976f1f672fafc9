use criterion::{Criterion, black_box, criterion_group, criterion_main};
use geomind_helpers::{DataPoint, seeded_rng};
use ndarray::array;
use rand::Rng;
use random_forest::{ForestParams, RandomForest};

fn synthetic_regions(n: usize) -> Vec<DataPoint<usize, f64>> {
    let (mut rng, _) = seeded_rng(Some(99));
    (0..n)
        .map(|_| {
            let temperature: f64 = rng.random_range(20.0..45.0);
            let rainfall: f64 = rng.random_range(50.0..300.0);
            let score: f64 = rng.random_range(0.0..1.0);
            let label = usize::from(temperature > 32.0 && rainfall < 150.0) + usize::from(score > 0.7);
            DataPoint::new(array![temperature, rainfall, score], label)
        })
        .collect()
}

fn bench_fit(c: &mut Criterion) {
    let data = synthetic_regions(200);
    let params = ForestParams::default().with_seed(42);
    c.bench_function("forest fit 200x3", |b| {
        b.iter(|| RandomForest::fit(black_box(&data), black_box(&params)))
    });

    let forest = RandomForest::fit(&data, &params).expect("training data is valid");
    let x = array![30.0, 150.0, 0.5];
    c.bench_function("forest predict", |b| b.iter(|| forest.predict(black_box(x.view()))));
}

criterion_group!(benches, bench_fit);
criterion_main!(benches);
