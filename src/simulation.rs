use std::time::Instant;

use nalgebra::Vector2;
use ndarray::{Array2, Array3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::analysis::{AnalysisError, MsdAnalyzer};
use crate::percolation::{
    random_permutation, ClusterGrid, LatticeCoords, LatticeError, LatticeTopology, NeighborTable,
    PercolationError,
};
use crate::walks::{WalkConfig, WalkError, WalkSimulator};

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Occupation threshold must lie in (0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("Lattice error: {0}")]
    Lattice(#[from] LatticeError),

    #[error("Percolation error: {0}")]
    Percolation(#[from] PercolationError),

    #[error("Walk error: {0}")]
    Walk(#[from] WalkError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Failed to initialize random number generator: {0}")]
    RngInitialization(#[from] getrandom::Error),
}

/// Full simulation parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Linear lattice size.
    pub grid_size: usize,
    pub topology: LatticeTopology,
    /// Site occupation fraction in `(0, 1]`.
    pub threshold: f64,
    pub walks: WalkConfig,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.grid_size < 2 {
            return Err(LatticeError::GridTooSmall(self.grid_size).into());
        }
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(SimulationError::InvalidThreshold(self.threshold));
        }
        self.walks.validate()?;
        Ok(())
    }
}

/// Owned artifacts of one simulation run.
#[derive(Clone, Debug)]
pub struct SimulationOutput {
    /// One row per site: `[x, y, cluster label]` (label `0` = empty).
    pub lattice_coords: Array2<f64>,
    /// Periodic translation vector per axis.
    pub unit_cell: Vector2<f64>,
    pub largest_cluster_size: usize,
    /// Walk tensor, shape `(n_walks, walk_length, 2)`.
    pub walk_coords: Array3<f64>,
    /// MSD/ergodicity table, `None` when no walks were requested.
    pub analysis: Option<Array2<f64>>,
}

/// Drives the full pipeline: neighbour table, percolation, lattice
/// embedding, walk ensemble, MSD analysis.
///
/// A fixed seed and fixed configuration reproduce every output array
/// bit-for-bit; with no seed configured each run draws a fresh one.
pub struct CtrwSimulation {
    config: SimulationConfig,
}

impl CtrwSimulation {
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn run(&self) -> Result<SimulationOutput, SimulationError> {
        let cfg = &self.config;
        let run_seed = match cfg.walks.seed {
            Some(seed) => seed,
            None => getrandom::u64()?,
        };

        let started = Instant::now();
        let table = NeighborTable::build(cfg.topology, cfg.grid_size)?;
        debug!(
            topology = ?cfg.topology,
            n_sites = table.n_sites(),
            elapsed = ?started.elapsed(),
            "neighbour table built"
        );

        let mut rng = StdRng::seed_from_u64(run_seed);
        let permutation = random_permutation(table.n_sites(), &mut rng);

        let started = Instant::now();
        let mut grid = ClusterGrid::percolate(&table, &permutation, cfg.threshold)?;
        debug!(
            occupied = grid.n_occupied(),
            largest_cluster = grid.largest_cluster_size(),
            elapsed = ?started.elapsed(),
            "percolation complete"
        );

        let coords = LatticeCoords::build(&table, &mut grid);

        // Pin the resolved seed so the walk ensemble derives its per-walk
        // streams from the same root as the permutation.
        let mut walk_config = cfg.walks.clone();
        walk_config.seed = Some(run_seed);
        let simulator = WalkSimulator::new(walk_config)?;
        let walk_coords = simulator.simulate(&table, &mut grid, &coords)?;

        let analysis = if cfg.walks.n_walks > 0 {
            let analyzer = MsdAnalyzer::new(cfg.walks.n_threads)?;
            Some(analyzer.analyze(&walk_coords))
        } else {
            None
        };

        Ok(SimulationOutput {
            lattice_coords: coords.coords,
            unit_cell: coords.unit_cell,
            largest_cluster_size: grid.largest_cluster_size(),
            walk_coords,
            analysis,
        })
    }
}
