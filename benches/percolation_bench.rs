use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use lattice_ctrw::percolation::{
    random_permutation, ClusterGrid, LatticeCoords, LatticeTopology, NeighborTable,
};
use lattice_ctrw::walks::{WalkConfig, WalkMode, WalkSimulator};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_percolate(c: &mut Criterion) {
    let mut group = c.benchmark_group("percolate");
    for (topology, name) in [
        (LatticeTopology::Square, "square"),
        (LatticeTopology::Honeycomb, "honeycomb"),
    ] {
        for grid_size in [64usize, 128] {
            let table = NeighborTable::build(topology, grid_size).expect("table");
            group.bench_function(BenchmarkId::new(name, grid_size), |b| {
                let mut rng = StdRng::seed_from_u64(grid_size as u64);
                b.iter_batched(
                    || random_permutation(table.n_sites(), &mut rng),
                    |permutation| {
                        ClusterGrid::percolate(&table, &permutation, 0.59).expect("percolate")
                    },
                    BatchSize::SmallInput,
                )
            });
        }
    }
    group.finish();
}

fn bench_walk_ensemble(c: &mut Criterion) {
    let table = NeighborTable::build(LatticeTopology::Honeycomb, 32).expect("table");
    let mut rng = StdRng::seed_from_u64(1);
    let permutation = random_permutation(table.n_sites(), &mut rng);
    let mut grid = ClusterGrid::percolate(&table, &permutation, 0.9).expect("percolate");
    let coords = LatticeCoords::build(&table, &mut grid);

    let config = WalkConfig {
        n_walks: 32,
        walk_length: 512,
        beta: 1.0,
        tau0: 1.0,
        noise: 0.0,
        walk_mode: WalkMode::LargestCluster,
        n_threads: 1,
        seed: Some(99),
    };
    let simulator = WalkSimulator::new(config).expect("simulator");

    c.bench_function("walk_ensemble/honeycomb_32x512", |b| {
        b.iter(|| {
            simulator
                .simulate(&table, &mut grid, &coords)
                .expect("simulate")
        })
    });
}

criterion_group!(benches, bench_percolate, bench_walk_ensemble);
criterion_main!(benches);
