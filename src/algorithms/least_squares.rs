//! Least-squares solve for a restricted atom set.
//!
//! The backward pruning step re-fits the coefficients of the surviving atoms by solving
//! `min_c ||(A S) c - b||_2`, where `S` holds the surviving atoms as columns. When two
//! surviving atoms are (numerically) parallel after applying `A`, the operand `A S` loses
//! rank and the problem has no unique solution. Such systems are reported as singular
//! instead of being handed to the QR solver, which would otherwise produce huge or
//! non-finite coefficients.

use super::rank_tolerance;
use crate::error::{ActiveSetError, ActiveSetErrorKind};
use faer::linalg::solvers::SolveLstsq;
use faer::prelude::*;

/// Solves `operand * c ~= target` in the least-squares sense.
///
/// # Arguments
/// * `operand`: the `m x k` matrix `A S`.
/// * `target`: the `m x 1` observation vector `b`.
///
/// # Returns
/// The `k x 1` coefficient vector, or a singular-system error when `operand` does not
/// have full column rank or the solution is not finite.
pub fn solve_restricted(
    operand: MatRef<'_, f64>,
    target: MatRef<'_, f64>,
) -> Result<Mat<f64>, ActiveSetError> {
    let (m, k) = (operand.nrows(), operand.ncols());
    if k == 0 {
        return Err(ActiveSetErrorKind::EmptyActiveSet.into());
    }
    if target.nrows() != m || target.ncols() != 1 {
        return Err(ActiveSetErrorKind::DimensionMismatch {
            expected: m,
            actual: target.nrows(),
        }
        .into());
    }
    // More unknowns than equations can never have full column rank.
    if k > m {
        return Err(ActiveSetErrorKind::SingularSystem { atoms: k }.into());
    }
    if (0..m).any(|i| (0..k).any(|j| !operand[(i, j)].is_finite())) {
        return Err(ActiveSetErrorKind::SingularSystem { atoms: k }.into());
    }

    let singular_values = operand
        .singular_values()
        .map_err(ActiveSetErrorKind::SvdError)?;
    let sigma_max = singular_values.iter().copied().fold(0.0_f64, f64::max);
    let sigma_min = singular_values
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min);
    if sigma_max == 0.0 || sigma_min <= rank_tolerance(m, k, sigma_max) {
        return Err(ActiveSetErrorKind::SingularSystem { atoms: k }.into());
    }

    let solution: Mat<f64> = operand.qr().solve_lstsq(target);
    let finite = (0..solution.nrows()).all(|i| solution[(i, 0)].is_finite());
    if !finite {
        return Err(ActiveSetErrorKind::SingularSystem { atoms: k }.into());
    }
    Ok(solution)
}
