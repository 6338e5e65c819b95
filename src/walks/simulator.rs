use std::time::Instant;

use ndarray::{stack, Array2, Array3, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::ctrw::{classify_crossing, subordinate, waiting_times, BoundaryCrossing};
use crate::percolation::{ClusterGrid, LatticeCoords, NeighborTable};

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("Walk length must be positive")]
    ZeroWalkLength,

    #[error("Waiting-time rate beta must be finite and non-negative, got {0}")]
    InvalidRate(f64),

    #[error("Base time scale tau0 must be finite and positive, got {0}")]
    InvalidTimeScale(f64),

    #[error("Noise scale must be finite and non-negative, got {0}")]
    InvalidNoise(f64),

    #[error("No occupied start site available in mode {0:?}")]
    EmptyStartPool(WalkMode),

    #[error("Failed to initialize random number generator: {0}")]
    RngInitialization(#[from] getrandom::Error),

    #[error("Failed to build thread pool: {0}")]
    ThreadPoolBuild(#[from] ThreadPoolBuildError),

    #[error("Walk tensor assembly failed: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Start-site selection mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalkMode {
    /// Start anywhere on an occupied site.
    AnyOccupied,
    /// Start only on the largest cluster.
    LargestCluster,
}

/// Random-walk ensemble parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WalkConfig {
    pub n_walks: usize,
    /// Number of physical steps recorded per walk.
    pub walk_length: usize,
    /// CTRW waiting-time rate; `0` disables subordination.
    pub beta: f64,
    /// Base waiting-time scale; values below 1 stretch the raw hop count so
    /// enough lattice hops exist to subordinate against.
    pub tau0: f64,
    /// Gaussian localization noise standard deviation; `0` disables.
    pub noise: f64,
    pub walk_mode: WalkMode,
    /// Worker threads; `0` uses every available core.
    pub n_threads: usize,
    /// Run seed; `None` draws a fresh nondeterministic seed per run.
    pub seed: Option<u64>,
}

impl WalkConfig {
    pub fn validate(&self) -> Result<(), WalkError> {
        if self.walk_length == 0 {
            return Err(WalkError::ZeroWalkLength);
        }
        if !self.beta.is_finite() || self.beta < 0.0 {
            return Err(WalkError::InvalidRate(self.beta));
        }
        if !self.tau0.is_finite() || self.tau0 <= 0.0 {
            return Err(WalkError::InvalidTimeScale(self.tau0));
        }
        if !self.noise.is_finite() || self.noise < 0.0 {
            return Err(WalkError::InvalidNoise(self.noise));
        }
        Ok(())
    }

    /// Raw lattice hops simulated per walk. Sub-unit `tau0` stretches the
    /// hop count so the CTRW clock can reach the observation horizon.
    pub fn sim_length(&self) -> usize {
        if self.tau0 < 1.0 {
            (self.walk_length as f64 / self.tau0) as usize
        } else {
            self.walk_length
        }
    }
}

/// Simulates an ensemble of independent random walks on the occupied sites.
///
/// Walks are embarrassingly parallel: each runs on the owned thread pool
/// with its own generator, seeded from the run seed plus the walk index.
/// Results are therefore reproducible for a fixed seed regardless of the
/// worker count.
pub struct WalkSimulator {
    config: WalkConfig,
    thread_pool: ThreadPool,
}

impl WalkSimulator {
    pub fn new(config: WalkConfig) -> Result<Self, WalkError> {
        config.validate()?;
        let n_threads = resolve_threads(config.n_threads);
        let thread_pool = ThreadPoolBuilder::new().num_threads(n_threads).build()?;
        Ok(Self {
            config,
            thread_pool,
        })
    }

    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    pub fn set_num_threads(&mut self, num_threads: usize) -> Result<(), WalkError> {
        self.thread_pool = ThreadPoolBuilder::new()
            .num_threads(resolve_threads(num_threads))
            .build()?;
        Ok(())
    }

    /// Runs the ensemble and returns the walk tensor, shape
    /// `(n_walks, walk_length, 2)`.
    ///
    /// Per walk: pick a start site from the configured pool, hop across
    /// occupied neighbours for `sim_length` steps while tagging boundary
    /// crossings, subordinate the hop sequence to the CTRW clock, unwrap
    /// the periodic crossings into unbounded coordinates, and optionally
    /// add Gaussian localization noise.
    pub fn simulate(
        &self,
        table: &NeighborTable,
        grid: &mut ClusterGrid,
        coords: &LatticeCoords,
    ) -> Result<Array3<f64>, WalkError> {
        let cfg = &self.config;
        if cfg.n_walks == 0 {
            return Ok(Array3::zeros((0, cfg.walk_length, 2)));
        }

        let start_pool = match cfg.walk_mode {
            WalkMode::AnyOccupied => grid.occupied_sites(),
            WalkMode::LargestCluster => grid.largest_cluster_sites(),
        };
        if start_pool.is_empty() {
            return Err(WalkError::EmptyStartPool(cfg.walk_mode));
        }

        let run_seed = match cfg.seed {
            Some(seed) => seed,
            None => getrandom::u64()?,
        };
        let waiting = if cfg.beta > 0.0 {
            Some(Exp::new(cfg.beta).map_err(|_| WalkError::InvalidRate(cfg.beta))?)
        } else {
            None
        };
        let noise = if cfg.noise > 0.0 {
            Some(Normal::new(0.0, cfg.noise).map_err(|_| WalkError::InvalidNoise(cfg.noise))?)
        } else {
            None
        };
        let sim_length = cfg.sim_length();

        let grid = &*grid;
        let start_pool = &start_pool;
        let started = Instant::now();
        let trajectories: Vec<Array2<f64>> = self.thread_pool.install(|| {
            (0..cfg.n_walks)
                .into_par_iter()
                .map(|walk| {
                    let mut rng =
                        StdRng::seed_from_u64(run_seed.wrapping_add(1 + walk as u64));
                    single_walk(
                        cfg,
                        sim_length,
                        table,
                        grid,
                        coords,
                        start_pool,
                        waiting.as_ref(),
                        noise.as_ref(),
                        walk,
                        &mut rng,
                    )
                })
                .collect()
        });
        let views: Vec<_> = trajectories.iter().map(|t| t.view()).collect();
        let walks = stack(Axis(0), &views)?;
        debug!(
            n_walks = cfg.n_walks,
            sim_length,
            elapsed = ?started.elapsed(),
            "walk ensemble simulated"
        );
        Ok(walks)
    }
}

fn resolve_threads(requested: usize) -> usize {
    if requested == 0 {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    } else {
        requested
    }
}

/// One complete walk: start search, hop loop, subordination, unwrapping,
/// noise. Never fails; every degenerate condition collapses to a
/// well-defined stationary or truncated trajectory.
#[allow(clippy::too_many_arguments)]
fn single_walk(
    cfg: &WalkConfig,
    sim_length: usize,
    table: &NeighborTable,
    grid: &ClusterGrid,
    coords: &LatticeCoords,
    start_pool: &[usize],
    waiting: Option<&Exp<f64>>,
    noise: Option<&Normal<f64>>,
    walk_index: usize,
    rng: &mut StdRng,
) -> Array2<f64> {
    let budget = table.n_sites().clamp(100_000, 100_000_000);
    let mut neighbors = Vec::with_capacity(table.degree());

    // Start-site search: resample until the candidate has at least one
    // occupied neighbour or the attempt budget runs out.
    let mut attempts = 0usize;
    let mut pos;
    loop {
        pos = start_pool[rng.random_range(0..start_pool.len())];
        occupied_neighbors_into(table, grid, pos, &mut neighbors);
        if !neighbors.is_empty() || attempts >= budget {
            break;
        }
        attempts += 1;
    }

    let mut sites = vec![pos; sim_length];
    let mut crossings = vec![BoundaryCrossing::None; sim_length];
    if attempts == budget {
        // Exhausted search freezes the walk in place.
        warn!(
            walk = walk_index,
            site = pos,
            "start-site search exhausted attempt budget; walk frozen"
        );
    } else {
        for j in 1..sim_length {
            occupied_neighbors_into(table, grid, pos, &mut neighbors);
            if !neighbors.is_empty() {
                pos = neighbors[rng.random_range(0..neighbors.len())];
            }
            sites[j] = pos;
            crossings[j] = classify_crossing(table, sites[j - 1], pos);
        }
    }

    let times = waiting_times(waiting, cfg.tau0, sim_length, cfg.walk_length, rng);
    let (true_sites, true_crossings) = subordinate(&sites, &crossings, &times, cfg.walk_length);

    let mut out = Array2::zeros((cfg.walk_length, 2));
    let mut nx: i64 = 0;
    let mut ny: i64 = 0;
    for step in 0..cfg.walk_length {
        let (dx, dy) = true_crossings[step].cell_shift();
        nx += dx;
        ny += dy;
        let site = true_sites[step];
        out[(step, 0)] = coords.coords[(site, 0)] + nx as f64 * coords.unit_cell.x;
        out[(step, 1)] = coords.coords[(site, 1)] + ny as f64 * coords.unit_cell.y;
    }
    if let Some(noise) = noise {
        for value in out.iter_mut() {
            *value += noise.sample(rng);
        }
    }
    out
}

fn occupied_neighbors_into(
    table: &NeighborTable,
    grid: &ClusterGrid,
    site: usize,
    out: &mut Vec<usize>,
) {
    out.clear();
    for &neighbor in table.neighbors(site) {
        if grid.is_occupied(neighbor) {
            out.push(neighbor);
        }
    }
}
