// Ranking and clustering cost on synthetic RFQ tables
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use rand::rngs::StdRng;
use steelmatch_core::{Record, Table};
use steelmatch_similarity::{
    cluster, ClusterConfig, EngineConfig, FeatureEngineer, FeatureTable, MetricStrategy, SimilarityEngine,
};

const FINISHES: [&str; 4] = ["gi", "hot rolled", "cold rolled", "oiled"];
const CARBON: [&str; 4] = ["0.17 %", "0.20-0.25 %", "max 0.22", "-"];

fn generate_features(size: usize) -> FeatureTable {
    let mut rng = StdRng::seed_from_u64(7);
    let records = (0..size)
        .map(|i| {
            let thickness: f64 = rng.random_range(0.5..12.0);
            let width: f64 = rng.random_range(800.0..2000.0);
            Record::new(i as u64)
                .with_field("thickness_min", thickness)
                .with_field("thickness_max", thickness + rng.random_range(0.0..1.0))
                .with_field("width_min", width)
                .with_field("width_max", width)
                .with_field("Carbon (C)", CARBON[rng.random_range(0..CARBON.len())])
                .with_field("finish", FINISHES[rng.random_range(0..FINISHES.len())])
        })
        .collect();
    let table = Table::from_records(records).unwrap();
    FeatureEngineer::default().engineer(&table)
}

fn benchmark_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank");

    for size in [100, 500, 1000].iter() {
        let features = generate_features(*size);

        let cosine = SimilarityEngine::new(EngineConfig::default()).unwrap();
        group.bench_with_input(BenchmarkId::new("cosine_blend", size), &features, |b, features| {
            b.iter(|| black_box(cosine.rank(features)));
        });

        let hybrid = SimilarityEngine::new(EngineConfig::default().with_strategy(MetricStrategy::Hybrid)).unwrap();
        group.bench_with_input(BenchmarkId::new("hybrid", size), &features, |b, features| {
            b.iter(|| black_box(hybrid.rank(features)));
        });
    }

    group.finish();
}

fn benchmark_cluster(c: &mut Criterion) {
    let mut group = c.benchmark_group("cluster");

    for size in [100, 1000].iter() {
        let features = generate_features(*size);
        group.bench_with_input(BenchmarkId::new("kmeans", size), &features, |b, features| {
            b.iter(|| black_box(cluster(features, &ClusterConfig::default()).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_rank, benchmark_cluster);
criterion_main!(benches);
