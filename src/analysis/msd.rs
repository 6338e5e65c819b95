use std::time::Instant;

use ndarray::{Array2, Array3, ArrayView2, Axis};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Failed to build thread pool: {0}")]
    ThreadPoolBuild(#[from] ThreadPoolBuildError),
}

/// Time-averaged MSD of one trajectory at lag `delta`, integrated over the
/// prefix of length `t`:
///
/// `(1 / (t - delta)) · Σ_{i=0}^{t-delta-1} |r(i+delta) - r(i)|²`
///
/// A zero-length window (`t <= delta`) clamps to 0.
pub fn time_averaged_msd(walk: &ArrayView2<f64>, t: usize, delta: usize) -> f64 {
    let window = t.saturating_sub(delta);
    if window == 0 {
        return 0.0;
    }
    let mut integral = 0.0;
    for i in 0..window {
        let dx = walk[(i + delta, 0)] - walk[(i, 0)];
        let dy = walk[(i + delta, 1)] - walk[(i, 1)];
        integral += dx * dx + dy * dy;
    }
    integral / window as f64
}

/// Reduces a walk ensemble to MSD and ergodicity statistics.
///
/// The output table has one row per lag `j = 1..walk_length` and
/// `n_walks + 3` columns: ensemble-average MSD, ensemble-time-average MSD,
/// ergodicity-breaking parameter, then the per-walk time-averaged MSDs.
/// Non-finite intermediate values clamp to zero; nothing in the reduction
/// can fail.
pub struct MsdAnalyzer {
    thread_pool: ThreadPool,
}

impl MsdAnalyzer {
    /// `n_threads = 0` uses every available core.
    pub fn new(n_threads: usize) -> Result<Self, AnalysisError> {
        let n_threads = if n_threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            n_threads
        };
        let thread_pool = ThreadPoolBuilder::new().num_threads(n_threads).build()?;
        Ok(Self { thread_pool })
    }

    pub fn analyze(&self, walks: &Array3<f64>) -> Array2<f64> {
        let n_walks = walks.len_of(Axis(0));
        let walk_length = walks.len_of(Axis(1));
        let n_lags = walk_length.saturating_sub(1);
        let mut analysis = Array2::zeros((n_lags, n_walks + 3));
        if n_lags == 0 || n_walks == 0 {
            return analysis;
        }

        let started = Instant::now();
        // Per-walk columns: squared displacement from the walk's own origin,
        // full-trajectory TAMSD per lag, and the one-step TAMSD over the
        // prefix of length `j`.
        let per_walk: Vec<WalkColumns> = self.thread_pool.install(|| {
            (0..n_walks)
                .into_par_iter()
                .map(|i| {
                    let walk = walks.index_axis(Axis(0), i);
                    let origin_x = walk[(0, 0)];
                    let origin_y = walk[(0, 1)];
                    let mut columns = WalkColumns::zeros(n_lags);
                    for j in 1..walk_length {
                        let dx = walk[(j, 0)] - origin_x;
                        let dy = walk[(j, 1)] - origin_y;
                        columns.ensemble[j - 1] = dx * dx + dy * dy;
                        columns.time_avg[j - 1] = time_averaged_msd(&walk, walk_length, j);
                        columns.ensemble_time_avg[j - 1] = time_averaged_msd(&walk, j, 1);
                    }
                    columns
                })
                .collect()
        });

        let inverse_count = 1.0 / n_walks as f64;
        for row in 0..n_lags {
            let mut ensemble_mean = 0.0;
            let mut ensemble_time_mean = 0.0;
            let mut time_avg_mean = 0.0;
            let mut time_avg_sq_mean = 0.0;
            for (i, columns) in per_walk.iter().enumerate() {
                let time_avg = finite_or_zero(columns.time_avg[row]);
                ensemble_mean += finite_or_zero(columns.ensemble[row]);
                ensemble_time_mean += finite_or_zero(columns.ensemble_time_avg[row]);
                time_avg_mean += time_avg;
                time_avg_sq_mean += time_avg * time_avg;
                analysis[(row, 3 + i)] = time_avg;
            }
            ensemble_mean *= inverse_count;
            ensemble_time_mean *= inverse_count;
            time_avg_mean *= inverse_count;
            time_avg_sq_mean *= inverse_count;

            // Ergodicity breaking: relative variance of the per-walk TAMSD,
            // rescaled by the lag. Zero variance or zero mean clamps to 0.
            let lag = (row + 1) as f64;
            let mean_sq = time_avg_mean * time_avg_mean;
            let ergodicity = finite_or_zero((time_avg_sq_mean - mean_sq) / mean_sq) / lag;

            analysis[(row, 0)] = ensemble_mean;
            analysis[(row, 1)] = finite_or_zero(ensemble_time_mean);
            analysis[(row, 2)] = finite_or_zero(ergodicity);
        }
        debug!(n_walks, n_lags, elapsed = ?started.elapsed(), "walk ensemble analysed");
        analysis
    }
}

struct WalkColumns {
    ensemble: Vec<f64>,
    time_avg: Vec<f64>,
    ensemble_time_avg: Vec<f64>,
}

impl WalkColumns {
    fn zeros(n_lags: usize) -> Self {
        Self {
            ensemble: vec![0.0; n_lags],
            time_avg: vec![0.0; n_lags],
            ensemble_time_avg: vec![0.0; n_lags],
        }
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
