use ndarray::{Array2, ArrayView1};

use super::{LatticeError, LatticeTopology};

/// Fixed-degree periodic adjacency table.
///
/// Row `i` lists the neighbours of site `i`; every off-grid neighbour wraps
/// to the opposite edge. For honeycomb lattices the table also records the
/// logical first and last rows, the site sets through which a walk crosses
/// the vertical periodic boundary. Square lattices leave those sets empty,
/// so only horizontal crossings are ever detected on them.
///
/// Invariant: the table is symmetric under the periodic wrap. If `b` is a
/// neighbour of `a` then `a` is a neighbour of `b`.
#[derive(Clone, Debug)]
pub struct NeighborTable {
    topology: LatticeTopology,
    grid_size: usize,
    table: Array2<usize>,
    first_row: Vec<usize>,
    last_row: Vec<usize>,
    in_first_row: Vec<bool>,
    in_last_row: Vec<bool>,
}

impl NeighborTable {
    /// Builds the adjacency table for `topology` at linear size `grid_size`.
    ///
    /// `grid_size < 2` is rejected: a single-column lattice would make the
    /// periodic wrap self-referential.
    pub fn build(topology: LatticeTopology, grid_size: usize) -> Result<Self, LatticeError> {
        if grid_size < 2 {
            return Err(LatticeError::GridTooSmall(grid_size));
        }
        match topology {
            LatticeTopology::Square => Ok(Self::build_square(grid_size)),
            LatticeTopology::Honeycomb => Ok(Self::build_honeycomb(grid_size)),
        }
    }

    /// Sites are laid out column-major: site `i` sits at column `i / L`,
    /// row `i % L`. Neighbours 0/1 step along the column (wrapping within
    /// it), neighbours 2/3 step across columns (wrapping around the grid).
    fn build_square(grid_size: usize) -> Self {
        let n = grid_size * grid_size;
        let mut table = Array2::zeros((n, 4));
        for i in 0..n {
            table[(i, 0)] = (i + 1) % n;
            table[(i, 1)] = (i + n - 1) % n;
            table[(i, 2)] = (i + grid_size) % n;
            table[(i, 3)] = (i + n - grid_size) % n;
            if i % grid_size == 0 {
                table[(i, 1)] = i + grid_size - 1;
            }
            if (i + 1) % grid_size == 0 {
                table[(i, 0)] = i + 1 - grid_size;
            }
        }
        Self {
            topology: LatticeTopology::Square,
            grid_size,
            table,
            first_row: Vec::new(),
            last_row: Vec::new(),
            in_first_row: vec![false; n],
            in_last_row: vec![false; n],
        }
    }

    /// The honeycomb lattice is stored as `4L` columns of `L` sites, indices
    /// increasing top-to-bottom within a column. Each column belongs to one
    /// of four sub-lattice classes (`(i / L) % 4`); the class decides which
    /// side the third, off-column bond points to, and the first/last-row
    /// sets mark where that bond wraps vertically.
    fn build_honeycomb(grid_size: usize) -> Self {
        let l = grid_size as i64;
        let n = 4 * grid_size * grid_size;
        let n_i = n as i64;

        let mut first_row = Vec::with_capacity(2 * grid_size);
        let mut last_row = Vec::with_capacity(2 * grid_size);
        for k in 1..=2 * l {
            // Integer forms of the alternating-sign row formulas.
            first_row.push((if k % 2 == 0 { 2 * k * l - l } else { 2 * k * l - 2 * l }) as usize);
            last_row.push((if k % 2 == 1 { 2 * k * l - 1 } else { 2 * k * l - l - 1 }) as usize);
        }
        let mut in_first_row = vec![false; n];
        let mut in_last_row = vec![false; n];
        for &site in &first_row {
            in_first_row[site] = true;
        }
        for &site in &last_row {
            in_last_row[site] = true;
        }

        let mut table = Array2::zeros((n, 3));
        for i in 0..n_i {
            let site = i as usize;
            let row: [i64; 3] = if i == 0 {
                // First site.
                [i + l, i + 2 * l - 1, i + n_i - l]
            } else if i == n_i - l {
                // Top right-hand corner.
                [i - 1, i - l, i - n_i + l]
            } else if i == n_i - l - 1 {
                // Bottom right-hand corner.
                [i - l, i + l, i + 1]
            } else if i < l {
                // First column.
                [i + l - 1, i + l, i + n_i - l]
            } else if i > n_i - l {
                // Last column.
                [i - l - 1, i - l, i - n_i + l]
            } else {
                match (i / l) % 4 {
                    0 => {
                        if in_first_row[site] {
                            [i - l, i + l, i + 2 * l - 1]
                        } else {
                            [i - l, i + l - 1, i + l]
                        }
                    }
                    1 => {
                        if in_last_row[site] {
                            [i - l, i + l, i - 2 * l + 1]
                        } else {
                            [i - l, i - l + 1, i + l]
                        }
                    }
                    2 => {
                        if in_last_row[site] {
                            [i - l, i + l, i + 1]
                        } else {
                            [i - l, i + l, i + l + 1]
                        }
                    }
                    _ => {
                        if in_first_row[site] {
                            [i - 1, i - l, i + l]
                        } else {
                            [i - l - 1, i - l, i + l]
                        }
                    }
                }
            };
            for (k, &neighbor) in row.iter().enumerate() {
                table[(site, k)] = neighbor as usize;
            }
        }

        Self {
            topology: LatticeTopology::Honeycomb,
            grid_size,
            table,
            first_row,
            last_row,
            in_first_row,
            in_last_row,
        }
    }

    pub fn topology(&self) -> LatticeTopology {
        self.topology
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    pub fn n_sites(&self) -> usize {
        self.table.nrows()
    }

    pub fn degree(&self) -> usize {
        self.table.ncols()
    }

    /// Neighbours of `site`, in table order.
    pub fn neighbors(&self, site: usize) -> ArrayView1<'_, usize> {
        self.table.row(site)
    }

    /// Sites forming the logical first row (empty for square lattices).
    pub fn first_row(&self) -> &[usize] {
        &self.first_row
    }

    /// Sites forming the logical last row (empty for square lattices).
    pub fn last_row(&self) -> &[usize] {
        &self.last_row
    }

    pub fn is_first_row(&self, site: usize) -> bool {
        self.in_first_row[site]
    }

    pub fn is_last_row(&self, site: usize) -> bool {
        self.in_last_row[site]
    }
}
