use serde::{Deserialize, Serialize};

/// Topology of the percolation substrate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LatticeTopology {
    Square,
    Honeycomb,
}

impl LatticeTopology {
    /// Total number of sites for linear grid size `grid_size`.
    ///
    /// A square lattice holds `L²` sites; the honeycomb unit cell carries
    /// four sub-lattice positions, so it holds `4L²`.
    pub fn n_sites(&self, grid_size: usize) -> usize {
        match self {
            LatticeTopology::Square => grid_size * grid_size,
            LatticeTopology::Honeycomb => 4 * grid_size * grid_size,
        }
    }

    /// Fixed neighbour count per site.
    pub fn degree(&self) -> usize {
        match self {
            LatticeTopology::Square => 4,
            LatticeTopology::Honeycomb => 3,
        }
    }
}
