//! Benchmarks for the per-generation pipeline stages.

#[cfg(feature = "bench")]
extern crate criterion;

#[cfg(feature = "bench")]
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use pof_fronts::canonical::Canonicalizer;
use pof_fronts::coverage;
use pof_fronts::dominance::pareto_flags;
use pof_fronts::instance::{Instance, Site, FLAG_DEMAND};
use pof_fronts::solution::{Precision, Solution};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Create a random generation of objective pairs.
fn create_benchmark_points(size: usize) -> Vec<(f64, f64)> {
    let mut rng = ChaCha8Rng::seed_from_u64(size as u64);
    (0..size)
        .map(|_| (rng.gen_range(0.0..1000.0), rng.gen_range(0.0..1.0)))
        .collect()
}

/// Create an instance with demand points on a grid.
fn create_benchmark_instance(size: usize) -> Instance {
    let grid_size = (size as f64).sqrt().ceil() as usize;
    let sites = (0..size)
        .map(|i| {
            let x = (i % grid_size) as f64 * 10.0;
            let y = (i / grid_size) as f64 * 10.0;
            Site::new(i as u32 + 1, x, y, FLAG_DEMAND, 1.0 / size as f64)
        })
        .collect();
    Instance::new(format!("BenchInstance_{}", size), sites, 25.0)
}

#[cfg(feature = "bench")]
fn benchmark_dominance(c: &mut Criterion) {
    let mut group = c.benchmark_group("dominance");

    for size in [100, 500, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let points = create_benchmark_points(size);
            b.iter(|| pareto_flags(&points));
        });
    }

    group.finish();
}

#[cfg(feature = "bench")]
fn benchmark_coverage(c: &mut Criterion) {
    let mut group = c.benchmark_group("coverage");

    for size in [400, 2500].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let instance = create_benchmark_instance(size);
            let model = instance.demand_model();
            let ids: Vec<u32> = (1..=size as u32).step_by(7).collect();

            b.iter(|| coverage::evaluate_ids(&ids, &instance, &model));
        });
    }

    group.finish();
}

#[cfg(feature = "bench")]
fn benchmark_canonicalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("canonicalize");

    for size in [100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let points = create_benchmark_points(size);
            let flags = pareto_flags(&points);
            let solutions: Vec<Solution> = points
                .iter()
                .zip(flags)
                .enumerate()
                .map(|(i, (&(f1, f2), is_pareto_optimal))| {
                    let mut solution = Solution::new(f1, f2, vec![i as u32]);
                    solution.is_pareto_optimal = is_pareto_optimal;
                    solution
                })
                .collect();
            let canonicalizer = Canonicalizer::new(Precision::Legacy);

            b.iter(|| canonicalizer.canonicalize(solutions.clone()));
        });
    }

    group.finish();
}

#[cfg(feature = "bench")]
criterion_group!(
    benches,
    benchmark_dominance,
    benchmark_coverage,
    benchmark_canonicalize
);

#[cfg(feature = "bench")]
criterion_main!(benches);
