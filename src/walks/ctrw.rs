use rand::Rng;
use rand_distr::{Distribution, Exp};

use crate::percolation::NeighborTable;

/// Periodic-boundary crossing tag for one lattice hop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BoundaryCrossing {
    #[default]
    None,
    Top,
    Bottom,
    Right,
    Left,
}

impl BoundaryCrossing {
    /// Unit-cell counter increment `(nx, ny)` carried by this crossing.
    pub fn cell_shift(self) -> (i64, i64) {
        match self {
            BoundaryCrossing::None => (0, 0),
            BoundaryCrossing::Top => (0, 1),
            BoundaryCrossing::Bottom => (0, -1),
            BoundaryCrossing::Right => (1, 0),
            BoundaryCrossing::Left => (-1, 0),
        }
    }
}

/// Tags the hop `prev → next` with the periodic boundary it crosses.
///
/// Vertical crossings are detected through the first/last-row sets (only
/// populated for honeycomb lattices); horizontal crossings through the
/// first/last column index bands. A hop can carry at most one tag, tested
/// in this order.
pub fn classify_crossing(table: &NeighborTable, prev: usize, next: usize) -> BoundaryCrossing {
    let band = table.grid_size();
    let n = table.n_sites();
    if table.is_first_row(prev) && table.is_last_row(next) {
        BoundaryCrossing::Top
    } else if table.is_last_row(prev) && table.is_first_row(next) {
        BoundaryCrossing::Bottom
    } else if prev >= n - band && next < band {
        BoundaryCrossing::Right
    } else if prev < band && next >= n - band {
        BoundaryCrossing::Left
    } else {
        BoundaryCrossing::None
    }
}

/// CTRW event times for one walk.
///
/// With a waiting-time distribution, each increment is `tau0 · exp(x)` for
/// `x ~ Exp(beta)`, turning the exponential variates into Pareto-tailed
/// waiting times; the running sum gives the event clock. Without one, the
/// clock is the deterministic unit grid `1, 2, .., sim_length`.
///
/// The sequence is cut at the first entry reaching `walk_length` and that
/// entry is clamped to exactly `walk_length`, so the clock always spans the
/// physical observation window. If no entry reaches it the final entry is
/// clamped instead.
pub fn waiting_times<R: Rng>(
    waiting: Option<&Exp<f64>>,
    tau0: f64,
    sim_length: usize,
    walk_length: usize,
    rng: &mut R,
) -> Vec<f64> {
    let mut times: Vec<f64> = match waiting {
        Some(dist) => {
            let mut clock = 0.0;
            (0..sim_length)
                .map(|_| {
                    clock += tau0 * dist.sample(rng).exp();
                    clock
                })
                .collect()
        }
        None => (1..=sim_length).map(|k| k as f64).collect(),
    };
    let horizon = walk_length as f64;
    let cut = times
        .iter()
        .position(|&t| t >= horizon)
        .unwrap_or(times.len() - 1);
    times.truncate(cut + 1);
    times[cut] = horizon;
    times
}

/// Subordinates a lattice walk to its CTRW event clock.
///
/// The physical trajectory at step `j` is the lattice site at the current
/// event counter; the counter advances only when `j` strictly exceeds the
/// event time at the counter, so an exact hit holds the walk for one more
/// step. When the counter advances, the boundary tag of the newly reached
/// lattice hop takes effect at step `j`.
///
/// Returns the subordinated site sequence and the per-physical-step
/// boundary tags, both of length `walk_length`.
pub fn subordinate(
    sites: &[usize],
    crossings: &[BoundaryCrossing],
    times: &[f64],
    walk_length: usize,
) -> (Vec<usize>, Vec<BoundaryCrossing>) {
    let mut true_sites = Vec::with_capacity(walk_length);
    let mut true_crossings = vec![BoundaryCrossing::None; walk_length];
    let mut counter = 0usize;
    for j in 0..walk_length {
        if (j as f64) > times[counter] && counter + 1 < times.len() {
            counter += 1;
            true_crossings[j] = crossings[counter];
        }
        true_sites.push(sites[counter]);
    }
    (true_sites, true_crossings)
}
