//! Benchmarks for backward induction on convex-lattice trees.
//!
//! Run with: cargo bench -p convex-lattice

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use convex_lattice::prelude::*;

// =============================================================================
// TEST DATA GENERATORS
// =============================================================================

fn equity_setup(steps: usize) -> (RollbackEngine, Arc<dyn Lattice>) {
    let config = LatticeConfig::default().with_steps(steps);
    let grid = build_uniform_grid(&[1.0], &config).unwrap();
    let lattice: Arc<dyn Lattice> =
        Arc::new(BlackScholesLattice::new(100.0, 0.05, 0.0, 0.2, grid).unwrap());
    (RollbackEngine::new(config).unwrap(), lattice)
}

fn american_put() -> DiscretizedVanillaOption {
    DiscretizedVanillaOption::new(
        PlainVanillaPayoff::new(OptionType::Put, 100.0),
        Exercise::american(0.0, 1.0).unwrap(),
    )
}

fn rate_setup(steps: usize) -> (RollbackEngine, Arc<dyn Lattice>) {
    let config = LatticeConfig::default().with_steps(steps);
    let grid = build_uniform_grid(&[5.0], &config).unwrap();
    let tree = HullWhite::new(0.1, 0.01)
        .unwrap()
        .build_tree(&|t| 0.03 + 0.004 * t, grid)
        .unwrap();
    (RollbackEngine::new(config).unwrap(), Arc::new(tree))
}

// =============================================================================
// EQUITY TREE BENCHMARKS
// =============================================================================

fn bench_american_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("american_put");

    for steps in &[100usize, 500, 1000] {
        let (engine, lattice) = equity_setup(*steps);
        group.bench_with_input(BenchmarkId::from_parameter(steps), &lattice, |b, lattice| {
            b.iter(|| {
                let mut option = american_put();
                engine.price(black_box(&mut option), Arc::clone(lattice))
            })
        });
    }

    group.finish();
}

fn bench_price_many(c: &mut Criterion) {
    let mut group = c.benchmark_group("price_many");
    group.sample_size(20);

    let (engine, lattice) = equity_setup(500);
    for size in &[8usize, 32] {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut assets: Vec<Box<dyn DiscretizedAsset>> = (0..size)
                    .map(|_| Box::new(american_put()) as Box<dyn DiscretizedAsset>)
                    .collect();
                engine.price_many(black_box(&mut assets), &lattice)
            })
        });
    }

    group.finish();
}

// =============================================================================
// SHORT RATE TREE BENCHMARKS
// =============================================================================

fn bench_hull_white_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("hull_white_build");

    for steps in &[100usize, 500] {
        let config = LatticeConfig::default().with_steps(*steps);
        let grid = build_uniform_grid(&[5.0], &config).unwrap();
        let model = HullWhite::new(0.1, 0.01).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(steps), &grid, |b, grid| {
            b.iter(|| model.build_tree(&|t| 0.03 + 0.004 * t, black_box(grid.clone())))
        });
    }

    group.finish();
}

fn bench_bermudan_swaption(c: &mut Criterion) {
    let (engine, lattice) = rate_setup(200);

    c.bench_function("bermudan_swaption_200", |b| {
        b.iter(|| {
            let swap = DiscretizedSwap::regular(SwapType::Payer, 100.0, 0.04, 1.0, 5.0, 1).unwrap();
            let mut option =
                DiscretizedOption::new(swap, Exercise::bermudan(vec![1.0, 2.0, 3.0, 4.0]).unwrap());
            engine.price(black_box(&mut option), Arc::clone(&lattice))
        })
    });
}

// =============================================================================
// CRITERION GROUPS
// =============================================================================

criterion_group!(equity, bench_american_put, bench_price_many,);

criterion_group!(short_rate, bench_hull_white_build, bench_bermudan_swaption,);

criterion_main!(equity, short_rate);
