//! Criterion benchmarks for embedding search.
//!
//! Uses square lattices and a synthetic objective (sum of qubit labels) to
//! measure search overhead independent of any compiler.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use u_embed::anneal::{AnnealConfig, AnnealRunner};
use u_embed::graph::ConnectivityGraph;
use u_embed::perturb::Perturbation;
use u_embed::restart::{RestartConfig, RestartRunner};
use u_embed::subgraph::SubgraphGenerator;
use u_embed::{Embedding, ObjectiveError};

fn label_sum(e: &Embedding) -> Result<f64, ObjectiveError> {
    Ok(e.iter().map(f64::from).sum())
}

// ===========================================================================
// Subgraph generation
// ===========================================================================

fn bench_subgraph(c: &mut Criterion) {
    let mut group = c.benchmark_group("subgraph_dfs");

    for &side in &[5u32, 10, 20] {
        let graph = ConnectivityGraph::grid(side, side).unwrap();
        let generator = SubgraphGenerator::new(&graph, 7).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        group.bench_with_input(BenchmarkId::from_parameter(side * side), &generator, |b, g| {
            b.iter(|| black_box(g.from_random_start(&mut rng).unwrap()))
        });
    }
    group.finish();
}

// ===========================================================================
// Annealing
// ===========================================================================

fn bench_anneal(c: &mut Criterion) {
    let mut group = c.benchmark_group("anneal_grid");
    group.sample_size(10);

    let graph = ConnectivityGraph::grid(4, 5).unwrap();
    for &k in &[1usize, 2, 4] {
        let config = AnnealConfig::default()
            .with_perturbation(Perturbation::Chain(k))
            .with_max_iterations(1000)
            .with_seed(42);
        group.bench_with_input(BenchmarkId::new("chain", k), &config, |b, cfg| {
            b.iter(|| {
                let result =
                    AnnealRunner::run_random_start(black_box(&graph), black_box(cfg), 7, label_sum)
                        .unwrap();
                black_box(result)
            })
        });
    }
    group.finish();
}

// ===========================================================================
// Random restart
// ===========================================================================

fn bench_restart(c: &mut Criterion) {
    let mut group = c.benchmark_group("restart_grid");

    let graph = ConnectivityGraph::grid(4, 5).unwrap();
    for &samples in &[11usize, 50] {
        let config = RestartConfig::default().with_samples(samples).with_seed(42);
        group.bench_with_input(BenchmarkId::new("samples", samples), &config, |b, cfg| {
            b.iter(|| black_box(RestartRunner::run(&graph, black_box(cfg), 7, label_sum).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_subgraph, bench_anneal, bench_restart);
criterion_main!(benches);
