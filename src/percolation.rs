mod cluster_grid;
mod coords;
mod errors;
mod neighbor_table;
mod topology;

pub use cluster_grid::{random_permutation, ClusterGrid};
pub use coords::LatticeCoords;
pub use errors::{LatticeError, PercolationError};
pub use neighbor_table::NeighborTable;
pub use topology::LatticeTopology;
