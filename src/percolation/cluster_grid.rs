use rand::seq::SliceRandom;
use rand::Rng;

use super::{NeighborTable, PercolationError};

/// Uniformly random activation order over `0..n_sites`.
///
/// Every site appears exactly once; the percolation engine consumes the
/// prefix of this order up to the occupation threshold.
pub fn random_permutation<R: Rng>(n_sites: usize, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n_sites).collect();
    order.shuffle(rng);
    order
}

/// Union-find forest over lattice sites, grown by Newman-Ziff activation.
///
/// Cell encoding: the `EMPTY` sentinel (`-N - 1`) marks unoccupied sites;
/// a root stores its negated subtree size (`-s` for a cluster of `s`
/// sites); every other occupied site stores its parent index. Following
/// parent pointers from any occupied site terminates at a root.
#[derive(Clone, Debug)]
pub struct ClusterGrid {
    cells: Vec<i64>,
    empty: i64,
    n_occupied: usize,
    largest_cluster_size: usize,
}

impl ClusterGrid {
    /// Activates sites in permutation order up to the occupation threshold.
    ///
    /// Exactly `⌊threshold · N⌋ - 1` sites are activated, matching the
    /// Newman-Ziff convention of skipping the final activation. Each new
    /// site starts as a singleton root and is merged by size with every
    /// already-occupied neighbour; the running maximum cluster size is
    /// tracked across merges.
    ///
    /// `⌊threshold · N⌋ < 1` would activate nothing and is rejected up
    /// front.
    pub fn percolate(
        table: &NeighborTable,
        permutation: &[usize],
        threshold: f64,
    ) -> Result<Self, PercolationError> {
        let n = table.n_sites();
        if permutation.len() != n {
            return Err(PercolationError::PermutationLengthMismatch {
                got: permutation.len(),
                expected: n,
            });
        }
        let n_activate = (threshold * n as f64).floor() as i64 - 1;
        if n_activate < 0 {
            return Err(PercolationError::ThresholdTooLow {
                threshold,
                n_sites: n,
            });
        }
        let n_activate = n_activate as usize;

        let empty = -(n as i64) - 1;
        let mut cells = vec![empty; n];
        let degree = table.degree();
        let mut largest: i64 = 0;

        for &s1 in &permutation[..n_activate] {
            cells[s1] = -1;
            let mut r1 = s1;
            let neighbors = table.neighbors(s1);
            for k in 0..degree {
                let s2 = neighbors[k];
                if cells[s2] != empty {
                    let r2 = find_root_in(&mut cells, s2);
                    if r2 != r1 {
                        // Union by size: the more negative root wins.
                        if cells[r1] > cells[r2] {
                            cells[r2] += cells[r1];
                            cells[r1] = r2 as i64;
                            r1 = r2;
                        } else {
                            cells[r1] += cells[r2];
                            cells[r2] = r1 as i64;
                        }
                        if -cells[r1] > largest {
                            largest = -cells[r1];
                        }
                    }
                }
            }
        }

        let largest_cluster_size = if n_activate == 0 {
            0
        } else {
            largest.max(1) as usize
        };
        Ok(Self {
            cells,
            empty,
            n_occupied: n_activate,
            largest_cluster_size,
        })
    }

    pub fn n_sites(&self) -> usize {
        self.cells.len()
    }

    pub fn n_occupied(&self) -> usize {
        self.n_occupied
    }

    /// Size of the largest cluster formed during percolation.
    pub fn largest_cluster_size(&self) -> usize {
        self.largest_cluster_size
    }

    pub fn is_occupied(&self, site: usize) -> bool {
        self.cells[site] != self.empty
    }

    /// Raw union-find cell value of `site`.
    pub fn cell_value(&self, site: usize) -> i64 {
        self.cells[site]
    }

    /// All occupied sites in index order.
    pub fn occupied_sites(&self) -> Vec<usize> {
        (0..self.cells.len())
            .filter(|&site| self.is_occupied(site))
            .collect()
    }

    /// Root of the cluster containing `site`, with path compression.
    ///
    /// Every parent pointer traversed on the way is rewritten to point
    /// directly at the root, so repeated queries flatten the forest. Calling
    /// this on an unoccupied site returns the site itself.
    pub fn find_root(&mut self, site: usize) -> usize {
        find_root_in(&mut self.cells, site)
    }

    /// `(root, size)` pairs for every cluster, in root index order.
    pub fn cluster_sizes(&self) -> Vec<(usize, usize)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v != self.empty && v < 0)
            .map(|(site, &v)| (site, (-v) as usize))
            .collect()
    }

    /// Per-site cluster labels: `1 + root` for occupied sites, `0` for
    /// empty ones. The offset keeps the empty marker distinct from the
    /// cluster rooted at site 0.
    pub fn cluster_labels(&mut self) -> Vec<i64> {
        (0..self.cells.len())
            .map(|site| {
                if self.is_occupied(site) {
                    find_root_in(&mut self.cells, site) as i64 + 1
                } else {
                    0
                }
            })
            .collect()
    }

    /// All sites belonging to the largest cluster.
    ///
    /// Ties between equally sized clusters break toward the lowest root
    /// index.
    pub fn largest_cluster_sites(&mut self) -> Vec<usize> {
        let root = self
            .cluster_sizes()
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
            .map(|(root, _)| root);
        match root {
            Some(root) => (0..self.cells.len())
                .filter(|&site| {
                    self.is_occupied(site) && find_root_in(&mut self.cells, site) == root
                })
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Iterative two-pass root lookup: locate the root, then rewrite every
/// traversed parent pointer to it. Equivalent to the memoized recursive
/// form without unbounded stack depth on long chains.
fn find_root_in(cells: &mut [i64], site: usize) -> usize {
    let mut root = site;
    while cells[root] >= 0 {
        root = cells[root] as usize;
    }
    let mut cursor = site;
    while cells[cursor] >= 0 {
        let parent = cells[cursor] as usize;
        cells[cursor] = root as i64;
        cursor = parent;
    }
    root
}
