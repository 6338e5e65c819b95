//! Continuous-time random walks on percolation clusters.
//!
//! The crate grows a site-percolation cluster on a periodic square or
//! honeycomb lattice with the Newman-Ziff union-find algorithm, embeds the
//! occupied sites in real space, simulates ensembles of nearest-neighbour
//! random walks restricted to occupied sites (optionally subordinated to a
//! heavy-tailed CTRW waiting-time process and perturbed by Gaussian
//! localization noise), and reduces the walk ensemble to
//! mean-squared-displacement and ergodicity-breaking statistics.
//!
//! Data flows through the pipeline in one direction:
//! [`percolation::NeighborTable`] → [`percolation::ClusterGrid`] →
//! [`percolation::LatticeCoords`] → [`walks::WalkSimulator`] →
//! [`analysis::MsdAnalyzer`]. [`CtrwSimulation`] drives all five stages from
//! a single validated configuration.

pub mod analysis;
pub mod percolation;
pub mod simulation;
pub mod utils;
pub mod walks;

pub use simulation::{CtrwSimulation, SimulationConfig, SimulationError, SimulationOutput};
