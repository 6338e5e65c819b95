use nalgebra::Vector2;
use ndarray::Array2;

use super::{ClusterGrid, LatticeTopology, NeighborTable};

const SQRT3: f64 = 1.732_050_807_568_877_2;
const SQRT3_HALF: f64 = 0.866_025_403_784_438_6;

/// Real-space embedding of the lattice.
///
/// `coords` holds one row per site: `[x, y, label]`, where `label` is the
/// 1-based cluster label (`0` for unoccupied sites). `unit_cell` is the
/// per-axis translation applied each time a walk wraps across the periodic
/// boundary.
#[derive(Clone, Debug)]
pub struct LatticeCoords {
    pub coords: Array2<f64>,
    pub unit_cell: Vector2<f64>,
}

impl LatticeCoords {
    pub fn build(table: &NeighborTable, grid: &mut ClusterGrid) -> Self {
        let labels = grid.cluster_labels();
        match table.topology() {
            LatticeTopology::Square => Self::build_square(table.grid_size(), &labels),
            LatticeTopology::Honeycomb => Self::build_honeycomb(table.grid_size(), &labels),
        }
    }

    fn build_square(grid_size: usize, labels: &[i64]) -> Self {
        let n = grid_size * grid_size;
        let mut coords = Array2::zeros((n, 3));
        let mut count = 0;
        for i in 0..grid_size {
            for j in 0..grid_size {
                coords[(count, 0)] = i as f64;
                coords[(count, 1)] = j as f64;
                coords[(count, 2)] = labels[count] as f64;
                count += 1;
            }
        }
        let unit_cell = axis_maxima(&coords) + Vector2::new(1.0, 1.0);
        Self { coords, unit_cell }
    }

    /// Brick-wall honeycomb embedding: four sub-lattice offsets per group of
    /// four columns, `√3` vertical spacing, indices running top-to-bottom
    /// within each column.
    fn build_honeycomb(grid_size: usize, labels: &[i64]) -> Self {
        let n = 4 * grid_size * grid_size;
        let mut coords = Array2::zeros((n, 3));
        let mut count = 0;
        for column in 0..4 * grid_size {
            let class = column % 4;
            let x_base = 0.75 * (column - class) as f64;
            for j in (0..grid_size).rev() {
                let (x, y) = match class {
                    0 => (x_base, j as f64 * SQRT3 + SQRT3_HALF),
                    1 => (x_base + 0.5, j as f64 * SQRT3),
                    2 => (x_base + 1.5, j as f64 * SQRT3),
                    _ => (x_base + 2.0, j as f64 * SQRT3 + SQRT3_HALF),
                };
                coords[(count, 0)] = x;
                coords[(count, 1)] = y;
                coords[(count, 2)] = labels[count] as f64;
                count += 1;
            }
        }
        let unit_cell = axis_maxima(&coords) + Vector2::new(1.5, SQRT3_HALF);
        Self { coords, unit_cell }
    }

    pub fn n_sites(&self) -> usize {
        self.coords.nrows()
    }

    /// `(x, y)` position of `site` within the home cell.
    pub fn position(&self, site: usize) -> Vector2<f64> {
        Vector2::new(self.coords[(site, 0)], self.coords[(site, 1)])
    }
}

fn axis_maxima(coords: &Array2<f64>) -> Vector2<f64> {
    let mut max = Vector2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for row in coords.rows() {
        max.x = max.x.max(row[0]);
        max.y = max.y.max(row[1]);
    }
    max
}
