use lattice_ctrw::percolation::{
    random_permutation, ClusterGrid, LatticeCoords, LatticeTopology, NeighborTable,
};
use lattice_ctrw::walks::{
    classify_crossing, subordinate, waiting_times, BoundaryCrossing, WalkConfig, WalkError,
    WalkMode, WalkSimulator,
};
use ndarray::Array3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Exp;

fn walk_config(n_walks: usize, walk_length: usize, seed: u64) -> WalkConfig {
    WalkConfig {
        n_walks,
        walk_length,
        beta: 0.0,
        tau0: 1.0,
        noise: 0.0,
        walk_mode: WalkMode::AnyOccupied,
        n_threads: 1,
        seed: Some(seed),
    }
}

fn percolated(
    topology: LatticeTopology,
    grid_size: usize,
    threshold: f64,
) -> (NeighborTable, ClusterGrid, LatticeCoords) {
    let table = NeighborTable::build(topology, grid_size).unwrap();
    let mut rng = StdRng::seed_from_u64(19);
    let permutation = random_permutation(table.n_sites(), &mut rng);
    let mut grid = ClusterGrid::percolate(&table, &permutation, threshold).unwrap();
    let coords = LatticeCoords::build(&table, &mut grid);
    (table, grid, coords)
}

fn simulate(config: WalkConfig, topology: LatticeTopology, grid_size: usize) -> Array3<f64> {
    let (table, mut grid, coords) = percolated(topology, grid_size, 1.0);
    let simulator = WalkSimulator::new(config).unwrap();
    simulator.simulate(&table, &mut grid, &coords).unwrap()
}

#[test]
fn disabled_subordination_uses_the_unit_time_grid() {
    let mut rng = StdRng::seed_from_u64(1);
    let times = waiting_times(None, 1.0, 10, 10, &mut rng);
    let expected: Vec<f64> = (1..=10).map(|k| k as f64).collect();
    assert_eq!(times, expected);
}

#[test]
fn stretched_hop_count_truncates_at_the_horizon() {
    let mut rng = StdRng::seed_from_u64(1);
    let times = waiting_times(None, 1.0, 20, 10, &mut rng);
    let expected: Vec<f64> = (1..=10).map(|k| k as f64).collect();
    assert_eq!(times, expected);
}

#[test]
fn heavy_tailed_times_are_increasing_and_clamped() {
    let mut rng = StdRng::seed_from_u64(9);
    let waiting = Exp::new(1.5).unwrap();
    let times = waiting_times(Some(&waiting), 0.5, 40, 10, &mut rng);
    assert!(times.len() <= 40);
    assert_eq!(*times.last().unwrap(), 10.0);
    for pair in times.windows(2) {
        assert!(pair[1] > pair[0]);
    }
    for &t in &times[..times.len() - 1] {
        assert!(t < 10.0);
    }
}

#[test]
fn unit_grid_subordination_lags_by_one_step() {
    // The counter advances only on a strict comparison, so an event time
    // equal to the step index holds the walk one extra step.
    let sites: Vec<usize> = (0..10).collect();
    let crossings = vec![BoundaryCrossing::None; 10];
    let mut rng = StdRng::seed_from_u64(1);
    let times = waiting_times(None, 1.0, 10, 10, &mut rng);
    let (true_sites, true_crossings) = subordinate(&sites, &crossings, &times, 10);
    assert_eq!(true_sites, vec![0, 0, 1, 2, 3, 4, 5, 6, 7, 8]);
    assert!(true_crossings[..2]
        .iter()
        .all(|&c| c == BoundaryCrossing::None));
}

#[test]
fn subordination_applies_the_crossing_when_the_counter_advances() {
    let sites = vec![4, 7];
    let crossings = vec![BoundaryCrossing::None, BoundaryCrossing::Top];
    let times = vec![2.5, 10.0];
    let (true_sites, true_crossings) = subordinate(&sites, &crossings, &times, 10);
    assert_eq!(true_sites, vec![4, 4, 4, 7, 7, 7, 7, 7, 7, 7]);
    for (step, &crossing) in true_crossings.iter().enumerate() {
        if step == 3 {
            assert_eq!(crossing, BoundaryCrossing::Top);
        } else {
            assert_eq!(crossing, BoundaryCrossing::None);
        }
    }
}

#[test]
fn honeycomb_crossings_cover_all_four_boundaries() {
    let table = NeighborTable::build(LatticeTopology::Honeycomb, 2).unwrap();
    assert_eq!(classify_crossing(&table, 6, 5), BoundaryCrossing::Top);
    assert_eq!(classify_crossing(&table, 5, 6), BoundaryCrossing::Bottom);
    assert_eq!(classify_crossing(&table, 14, 0), BoundaryCrossing::Right);
    assert_eq!(classify_crossing(&table, 0, 14), BoundaryCrossing::Left);
    assert_eq!(classify_crossing(&table, 4, 5), BoundaryCrossing::None);
}

#[test]
fn square_crossings_tag_only_the_horizontal_wrap() {
    let table = NeighborTable::build(LatticeTopology::Square, 4).unwrap();
    assert_eq!(classify_crossing(&table, 12, 0), BoundaryCrossing::Right);
    assert_eq!(classify_crossing(&table, 0, 12), BoundaryCrossing::Left);
    // The vertical wrap within a column carries no tag on square lattices.
    assert_eq!(classify_crossing(&table, 3, 0), BoundaryCrossing::None);
    assert_eq!(classify_crossing(&table, 0, 1), BoundaryCrossing::None);
}

#[test]
fn unwrapped_steps_stay_within_hop_distance() {
    let walks = simulate(walk_config(4, 60, 77), LatticeTopology::Honeycomb, 2);
    assert_eq!(walks.dim(), (4, 60, 2));
    for walk in 0..4 {
        for step in 1..60 {
            let dx = walks[(walk, step, 0)] - walks[(walk, step - 1, 0)];
            let dy = walks[(walk, step, 1)] - walks[(walk, step - 1, 1)];
            let dist = (dx * dx + dy * dy).sqrt();
            assert!(
                dist <= 2.0,
                "walk {walk} step {step} jumped {dist}"
            );
        }
    }
}

#[test]
fn exhausted_start_search_freezes_the_walk() {
    // One occupied site with no occupied neighbours.
    let table = NeighborTable::build(LatticeTopology::Square, 8).unwrap();
    let mut rng = StdRng::seed_from_u64(41);
    let permutation = random_permutation(table.n_sites(), &mut rng);
    let mut grid = ClusterGrid::percolate(&table, &permutation, 2.2 / 64.0).unwrap();
    assert_eq!(grid.n_occupied(), 1);
    let coords = LatticeCoords::build(&table, &mut grid);

    let simulator = WalkSimulator::new(walk_config(1, 10, 5)).unwrap();
    let walks = simulator.simulate(&table, &mut grid, &coords).unwrap();
    for step in 0..10 {
        assert_eq!(walks[(0, step, 0)], walks[(0, 0, 0)]);
        assert_eq!(walks[(0, step, 1)], walks[(0, 0, 1)]);
    }
}

#[test]
fn fixed_seed_reproduces_the_ensemble() {
    let mut config = walk_config(3, 40, 123);
    config.beta = 0.7;
    let a = simulate(config.clone(), LatticeTopology::Honeycomb, 2);
    let b = simulate(config.clone(), LatticeTopology::Honeycomb, 2);
    assert_eq!(a, b);

    config.seed = Some(124);
    let c = simulate(config, LatticeTopology::Honeycomb, 2);
    assert_ne!(a, c);
}

#[test]
fn zero_noise_leaves_walks_untouched_and_positive_noise_perturbs() {
    let quiet = walk_config(2, 30, 55);
    let mut noisy = quiet.clone();
    noisy.noise = 0.3;
    let a = simulate(quiet.clone(), LatticeTopology::Square, 4);
    let b = simulate(quiet, LatticeTopology::Square, 4);
    let c = simulate(noisy, LatticeTopology::Square, 4);
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn zero_walks_yield_an_empty_tensor() {
    let walks = simulate(walk_config(0, 25, 1), LatticeTopology::Square, 4);
    assert_eq!(walks.dim(), (0, 25, 2));
}

#[test]
fn empty_start_pool_is_reported() {
    // floor(0.3 * 4) = 1 activation budget, minus one: nothing occupied.
    let table = NeighborTable::build(LatticeTopology::Square, 2).unwrap();
    let mut rng = StdRng::seed_from_u64(43);
    let permutation = random_permutation(table.n_sites(), &mut rng);
    let mut grid = ClusterGrid::percolate(&table, &permutation, 0.3).unwrap();
    assert_eq!(grid.n_occupied(), 0);
    let coords = LatticeCoords::build(&table, &mut grid);

    let simulator = WalkSimulator::new(walk_config(1, 10, 5)).unwrap();
    assert!(matches!(
        simulator.simulate(&table, &mut grid, &coords),
        Err(WalkError::EmptyStartPool(WalkMode::AnyOccupied))
    ));
}

#[test]
fn invalid_walk_parameters_are_rejected() {
    let base = walk_config(1, 10, 1);

    let mut config = base.clone();
    config.walk_length = 0;
    assert!(matches!(
        WalkSimulator::new(config),
        Err(WalkError::ZeroWalkLength)
    ));

    let mut config = base.clone();
    config.beta = -1.0;
    assert!(matches!(
        WalkSimulator::new(config),
        Err(WalkError::InvalidRate(_))
    ));

    let mut config = base.clone();
    config.tau0 = 0.0;
    assert!(matches!(
        WalkSimulator::new(config),
        Err(WalkError::InvalidTimeScale(_))
    ));

    let mut config = base;
    config.noise = -0.1;
    assert!(matches!(
        WalkSimulator::new(config),
        Err(WalkError::InvalidNoise(_))
    ));
}

#[test]
fn sub_unit_tau0_stretches_the_raw_hop_count() {
    let mut config = walk_config(1, 10, 1);
    config.tau0 = 0.25;
    assert_eq!(config.sim_length(), 40);
    config.tau0 = 1.0;
    assert_eq!(config.sim_length(), 10);
    config.tau0 = 2.0;
    assert_eq!(config.sim_length(), 10);
}
