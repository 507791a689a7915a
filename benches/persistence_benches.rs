/*!
 * 多参数持久同调性能基准测试
 *
 * 使用 Criterion 框架进行性能测试。
 */

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use multipers::core::BinomialCoeffTable;
use multipers::{
    persistence_modules_from_distances, CompressedDistanceMatrix, EngineConfig, FiltrationGrid,
    GF2Matrix, Metric,
};
use std::hint::black_box;

/// 单位圆上均匀分布的 n 个点
fn circle(n: usize) -> Vec<[f64; 2]> {
    (0..n)
        .map(|i| {
            let t = i as f64 * std::f64::consts::TAU / n as f64;
            [t.cos(), t.sin()]
        })
        .collect()
}

/// 确定性的伪随机 0/1 矩阵（线性同余）
fn pseudo_random_matrix(rows: usize, cols: usize, seed: u64) -> GF2Matrix {
    let mut state = seed;
    let mut entries = Vec::new();
    for i in 0..rows {
        for j in 0..cols {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            if (state >> 33) % 3 == 0 {
                entries.push((i, j));
            }
        }
    }
    GF2Matrix::from_entries(rows, cols, &entries)
}

/// 基准测试：构建二项式系数表
fn benchmark_binomial_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("binomial_construction");

    group.bench_function("n=100_k=4", |b| {
        b.iter(|| BinomialCoeffTable::new(black_box(100), black_box(4)))
    });

    group.bench_function("n=1000_k=5", |b| {
        b.iter(|| BinomialCoeffTable::new(black_box(1000), black_box(5)))
    });

    group.finish();
}

/// 基准测试：GF(2) 行消元与核/像分解
fn benchmark_matrix_reduction(c: &mut Criterion) {
    let mut group = c.benchmark_group("matrix_reduction");

    for size in [16usize, 64, 128] {
        let matrix = pseudo_random_matrix(size, size, size as u64);
        group.bench_with_input(BenchmarkId::new("rank", size), &matrix, |b, m| {
            b.iter(|| black_box(m).rank())
        });
        group.bench_with_input(BenchmarkId::new("reduction", size), &matrix, |b, m| {
            b.iter(|| black_box(m).reduction())
        });
    }

    group.finish();
}

/// 基准测试：单位圆端到端流程
fn benchmark_circle_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("circle_pipeline");
    group.sample_size(20);

    let thresholds: Vec<f64> = (0..10).map(|i| i as f64 * 0.1).collect();
    let filtration = FiltrationGrid::new(vec![thresholds]).unwrap();

    for n in [10usize, 20] {
        let distances = vec![CompressedDistanceMatrix::from_points(&circle(n), Metric::Euclidean)];
        let config = EngineConfig::new(2);
        group.bench_with_input(BenchmarkId::new("points", n), &distances, |b, d| {
            b.iter(|| persistence_modules_from_distances(black_box(d), &filtration, &config).unwrap())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_binomial_construction,
    benchmark_matrix_reduction,
    benchmark_circle_pipeline
);
criterion_main!(benches);
