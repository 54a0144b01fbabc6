//! Low-level numerical kernels used by the active-set algorithms.
//!
//! ** NOTE: We recommend using the methods on [`crate::atoms::ActiveSet`] provided by
//! [`crate::solvers`] instead. These kernels work on plain slices and matrix views and
//! perform no bookkeeping on the active set.
//!
//! - [`projection`]: exact Euclidean projection onto the L1 ball.
//! - [`least_squares`]: rank-checked least-squares solve for a restricted atom set.

pub mod least_squares;
pub mod projection;

/// Relative threshold below which a singular value is treated as zero.
///
/// Follows the usual `max(m, n) * eps * sigma_max` rule for numerical rank.
pub(crate) fn rank_tolerance(nrows: usize, ncols: usize, sigma_max: f64) -> f64 {
    nrows.max(ncols) as f64 * f64::EPSILON * sigma_max
}
