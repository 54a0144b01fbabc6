//! This module generates synthetic sparse-recovery problems.
//!
//! A problem is an operator `A` (`m x n`) with unit-norm Gaussian columns, a sparse
//! ground truth `x_true` with `s` non-zero entries of magnitude in `[1, 2)` and random
//! sign, and an observation `b = A x_true + sigma * e` with Gaussian noise `e`.
//! Everything is drawn from a seeded [`StdRng`], so a given configuration always
//! produces the same problem.

use faer::Mat;
use rand::{Rng, SeedableRng, rngs::StdRng, seq::index::sample};
use rand_distr::{Distribution, Normal, StandardNormal};
use thiserror::Error;

/// Represents all possible errors raised while generating a problem.
#[derive(Error, Debug, PartialEq)]
pub enum SyntheticError {
    /// The operator must have at least one row and one column.
    #[error("Invalid dimensions: the operator must be non-empty (got {rows} x {cols}).")]
    EmptyOperator { rows: usize, cols: usize },
    /// The support cannot be larger than the number of columns.
    #[error("Sparsity {sparsity} exceeds the number of columns {cols}.")]
    SparsityTooLarge { sparsity: usize, cols: usize },
    /// The noise level must be finite and non-negative.
    #[error("Invalid noise level: {0}")]
    InvalidNoise(f64),
}

/// A sparse-recovery instance with its ground truth.
#[derive(Debug, Clone)]
pub struct SparseRecoveryProblem {
    /// Operator `A`, `m x n`, with unit-norm columns.
    pub a: Mat<f64>,
    /// Observation `b`, `m x 1`.
    pub b: Mat<f64>,
    /// Ground truth `x_true`, `n x 1`.
    pub x_true: Mat<f64>,
    /// Indices of the non-zero entries of `x_true`, in increasing order.
    pub support: Vec<usize>,
}

impl SparseRecoveryProblem {
    /// The L1 norm of the ground truth, a natural L1-ball radius for the problem.
    pub fn true_l1_norm(&self) -> f64 {
        (0..self.x_true.nrows()).map(|i| self.x_true[(i, 0)].abs()).sum()
    }
}

/// Generates a seeded sparse-recovery problem.
///
/// # Arguments
/// * `rows`, `cols`: shape of the operator `A`.
/// * `sparsity`: number of non-zero entries of the ground truth.
/// * `noise`: standard deviation of the additive observation noise.
/// * `seed`: seed for the random number generator.
pub fn sparse_recovery_problem(
    rows: usize,
    cols: usize,
    sparsity: usize,
    noise: f64,
    seed: u64,
) -> Result<SparseRecoveryProblem, SyntheticError> {
    if rows == 0 || cols == 0 {
        return Err(SyntheticError::EmptyOperator { rows, cols });
    }
    if sparsity > cols {
        return Err(SyntheticError::SparsityTooLarge { sparsity, cols });
    }
    if !noise.is_finite() || noise < 0.0 {
        return Err(SyntheticError::InvalidNoise(noise));
    }

    let observation_noise =
        Normal::new(0.0, noise).map_err(|_| SyntheticError::InvalidNoise(noise))?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut a = Mat::from_fn(rows, cols, |_, _| rng.sample::<f64, _>(StandardNormal));
    for j in 0..cols {
        let norm = a.as_ref().col(j).norm_l2();
        if norm > 0.0 {
            for i in 0..rows {
                a.as_mut()[(i, j)] /= norm;
            }
        }
    }

    let mut support = sample(&mut rng, cols, sparsity).into_vec();
    support.sort_unstable();

    let mut x_true = Mat::<f64>::zeros(cols, 1);
    for &j in &support {
        let magnitude = rng.random_range(1.0..2.0);
        let sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        x_true.as_mut()[(j, 0)] = sign * magnitude;
    }

    let clean = &a * &x_true;
    let b = Mat::from_fn(rows, 1, |i, _| clean[(i, 0)] + observation_noise.sample(&mut rng));

    Ok(SparseRecoveryProblem {
        a,
        b,
        x_true,
        support,
    })
}

/// The signed coordinate vector `sign * e_index` of dimension `dim`, as a `dim x 1` atom.
pub fn coordinate_atom(dim: usize, index: usize, sign: f64) -> Mat<f64> {
    Mat::from_fn(dim, 1, |i, _| if i == index { sign } else { 0.0 })
}
