//! This module defines the contract between the active set and the function being minimized.
//!
//! The pruning and refinement algorithms never look inside the objective. They only need
//! two things from it: its value at a point and its gradient at a point. Objectives built
//! from a linear operator `A` and an observation vector `b` expose those operands as well,
//! which is what the backward pruning step requires, since it re-solves a restricted
//! least-squares problem for every candidate deletion.
//!
//! Points and gradients are dense `d x 1` [`faer`] matrices.
//!
//! The module provides two traits:
//! 1.  [`Objective`]: value and gradient, enough for the L1-ball refiner.
//! 2.  [`LeastSquaresObjective`]: additionally exposes `A` and `b`, enough for pruning.
//!
//! and one concrete implementation, [`SquaredLoss`], the function
//! `f(x) = 0.5 * ||A x - b||^2`.

use crate::error::{ActiveSetError, ActiveSetErrorKind};
use faer::{Mat, MatMut, MatRef};

/// A smooth function of a dense vector.
///
/// Implementations must be deterministic and free of side effects, since the pruning
/// engine evaluates the same point more than once when it rejects a deletion.
///
/// # Example
///
/// ```
/// use faer::{Mat, MatMut, MatRef};
/// use fw_atoms::objective::Objective;
///
/// /// f(x) = 0.5 * ||x||^2
/// struct HalfNormSq;
///
/// impl Objective for HalfNormSq {
///     fn dim(&self) -> usize {
///         2
///     }
///
///     fn evaluate(&self, x: MatRef<'_, f64>) -> f64 {
///         0.5 * x.norm_l2().powi(2)
///     }
///
///     fn gradient(&self, x: MatRef<'_, f64>, mut out: MatMut<'_, f64>) {
///         out.copy_from(x);
///     }
/// }
///
/// let x = Mat::from_fn(2, 1, |i, _| (i + 1) as f64);
/// assert!((HalfNormSq.evaluate(x.as_ref()) - 2.5).abs() < 1e-12);
/// ```
pub trait Objective {
    /// Dimension `d` of the points the function accepts.
    fn dim(&self) -> usize;

    /// Returns the value of the function at the `d x 1` point `x`.
    fn evaluate(&self, x: MatRef<'_, f64>) -> f64;

    /// Writes the gradient at `x` into `out`.
    ///
    /// `out` is pre-sized by the caller to match `x`.
    fn gradient(&self, x: MatRef<'_, f64>, out: MatMut<'_, f64>);
}

/// An objective of generalized least-squares form, built from `A` (`m x d`) and `b` (`m x 1`).
pub trait LeastSquaresObjective: Objective {
    /// The linear operator `A`.
    fn operator(&self) -> MatRef<'_, f64>;

    /// The observation vector `b`.
    fn target(&self) -> MatRef<'_, f64>;
}

/// The squared residual `f(x) = 0.5 * ||A x - b||^2`, with gradient `A^T (A x - b)`.
#[derive(Debug, Clone)]
pub struct SquaredLoss {
    a: Mat<f64>,
    b: Mat<f64>,
}

impl SquaredLoss {
    /// Builds the objective from an operator `a` (`m x d`) and a target `b` (`m x 1`).
    pub fn new(a: Mat<f64>, b: Mat<f64>) -> Result<Self, ActiveSetError> {
        if b.ncols() != 1 {
            return Err(ActiveSetErrorKind::DimensionMismatch {
                expected: 1,
                actual: b.ncols(),
            }
            .into());
        }
        if b.nrows() != a.nrows() {
            return Err(ActiveSetErrorKind::DimensionMismatch {
                expected: a.nrows(),
                actual: b.nrows(),
            }
            .into());
        }
        Ok(Self { a, b })
    }

    /// The residual `A x - b`.
    pub fn residual(&self, x: MatRef<'_, f64>) -> Mat<f64> {
        assert_eq!(
            self.a.ncols(),
            x.nrows(),
            "Dimension mismatch: operator columns ({}) do not match point rows ({}).",
            self.a.ncols(),
            x.nrows(),
        );
        let ax = self.a.as_ref() * x;
        &ax - &self.b
    }
}

impl Objective for SquaredLoss {
    #[inline]
    fn dim(&self) -> usize {
        self.a.ncols()
    }

    fn evaluate(&self, x: MatRef<'_, f64>) -> f64 {
        let norm = self.residual(x).norm_l2();
        0.5 * norm * norm
    }

    fn gradient(&self, x: MatRef<'_, f64>, mut out: MatMut<'_, f64>) {
        let r = self.residual(x);
        let g = self.a.transpose() * &r;
        out.copy_from(g.as_ref());
    }
}

impl LeastSquaresObjective for SquaredLoss {
    #[inline]
    fn operator(&self) -> MatRef<'_, f64> {
        self.a.as_ref()
    }

    #[inline]
    fn target(&self) -> MatRef<'_, f64> {
        self.b.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::mat;

    #[test]
    fn test_squared_loss_value_and_gradient() {
        let a: Mat<f64> = mat![[1.0, 2.0], [3.0, 4.0], [0.0, 1.0]];
        let b: Mat<f64> = mat![[1.0], [1.0], [1.0]];
        let loss = SquaredLoss::new(a, b).unwrap();
        let x: Mat<f64> = mat![[1.0], [-1.0]];

        // r = A x - b = [-2, -2, -2]
        assert!((loss.evaluate(x.as_ref()) - 6.0).abs() < 1e-12);

        let mut g = Mat::zeros(2, 1);
        loss.gradient(x.as_ref(), g.as_mut());
        // A^T r = [-8, -14]
        assert!((g[(0, 0)] + 8.0).abs() < 1e-12);
        assert!((g[(1, 0)] + 14.0).abs() < 1e-12);
        assert_eq!(loss.dim(), 2);
    }

    #[test]
    fn test_squared_loss_exposes_operands() {
        let a: Mat<f64> = mat![[2.0, 0.0], [0.0, 2.0]];
        let b: Mat<f64> = mat![[1.0], [3.0]];
        let loss = SquaredLoss::new(a.clone(), b.clone()).unwrap();
        assert_eq!(loss.operator().to_owned(), a);
        assert_eq!(loss.target().to_owned(), b);
    }

    #[test]
    fn test_squared_loss_rejects_mismatched_target() {
        let a: Mat<f64> = Mat::zeros(3, 2);
        let b: Mat<f64> = Mat::zeros(2, 1);
        let err = SquaredLoss::new(a, b).unwrap_err();
        assert!(err.is_dimension_mismatch());

        let a: Mat<f64> = Mat::zeros(3, 2);
        let b: Mat<f64> = Mat::zeros(3, 2);
        assert!(SquaredLoss::new(a, b).unwrap_err().is_dimension_mismatch());
    }

    #[test]
    #[should_panic(
        expected = "Dimension mismatch: operator columns (2) do not match point rows (3)."
    )]
    fn test_dimension_mismatch_panic() {
        let a: Mat<f64> = mat![[1.0, 0.0], [0.0, 1.0]];
        let b: Mat<f64> = mat![[1.0], [1.0]];
        let loss = SquaredLoss::new(a, b).unwrap();
        let x: Mat<f64> = mat![[1.0], [2.0], [3.0]];
        loss.evaluate(x.as_ref());
    }
}
