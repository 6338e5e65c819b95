use thiserror::Error;

#[derive(Debug, Error)]
pub enum LatticeError {
    #[error("Grid size must be at least 2, got {0}")]
    GridTooSmall(usize),
}

#[derive(Debug, Error)]
pub enum PercolationError {
    #[error("Occupation threshold {threshold} activates no site on {n_sites} sites")]
    ThresholdTooLow { threshold: f64, n_sites: usize },

    #[error("Permutation length {got} does not match lattice size {expected}")]
    PermutationLengthMismatch { got: usize, expected: usize },
}
