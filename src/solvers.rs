//! This module provides the high-level algorithms that refine an [`ActiveSet`].
//!
//! - [`ActiveSet::prune_support`]: the backward step of a forward-backward greedy method.
//!   Atoms whose removal costs little are deleted one at a time, re-fitting the surviving
//!   coefficients by least squares after every tentative deletion.
//! - [`ActiveSet::projected_gradient_enhancement`]: projected gradient descent over the
//!   coefficients, constrained to the L1 ball of radius `tau`.
//! - [`ActiveSet::project_to_l1`]: the exact L1-ball projection of the coefficients.

use crate::{
    algorithms::{least_squares::solve_restricted, projection::project_onto_l1_ball},
    atoms::ActiveSet,
    error::{ActiveSetError, ActiveSetErrorKind},
    objective::{LeastSquaresObjective, Objective},
};
use faer::prelude::*;

/// What the pruning loop does when re-fitting a candidate deletion hits a singular system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SingularPolicy {
    /// Try the next candidate in order of increasing removal cost.
    #[default]
    NextCandidate,
    /// End pruning immediately.
    Stop,
}

/// Options controlling [`ActiveSet::prune_support`].
#[derive(Debug, Clone)]
pub struct PruneOptions {
    /// Pruning never shrinks the set below this many atoms. Values below 1 are treated as 1.
    pub min_atoms: usize,
    /// Reaction to a rank-deficient restricted system.
    pub singular_policy: SingularPolicy,
}

impl Default for PruneOptions {
    fn default() -> Self {
        Self {
            min_atoms: 1,
            singular_policy: SingularPolicy::NextCandidate,
        }
    }
}

/// Why [`ActiveSet::prune_support`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneStatus {
    /// The best remaining deletion would push the objective above the threshold.
    ThresholdExceeded,
    /// The set reached the minimum allowed size.
    MinimumSize,
    /// No candidate deletion produced a solvable restricted system.
    Singular,
}

/// Summary of a pruning call.
#[derive(Debug, Clone)]
pub struct PruneReport {
    /// Why pruning stopped.
    pub status: PruneStatus,
    /// Number of atoms deleted.
    pub removed: usize,
    /// Number of atoms left.
    pub atoms: usize,
    /// Objective value at the final recovered vector.
    pub value: f64,
}

/// Options controlling [`ActiveSet::projected_gradient_enhancement`].
#[derive(Debug, Clone)]
pub struct RefineOptions {
    /// Maximum number of projected gradient steps.
    pub max_iterations: usize,
    /// Stop once a step decreases the objective by less than this amount.
    pub tolerance: f64,
}

impl Default for RefineOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-3,
        }
    }
}

/// Why [`ActiveSet::projected_gradient_enhancement`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefineStatus {
    /// The last step decreased the objective by less than the tolerance.
    Converged,
    /// A step increased the objective; the coefficients before that step were kept.
    Stalled,
    /// The iteration budget ran out.
    MaxIterations,
}

/// Summary of a refinement call.
#[derive(Debug, Clone)]
pub struct RefineReport {
    /// Why refinement stopped.
    pub status: RefineStatus,
    /// Number of gradient steps taken, including a rejected final step.
    pub iterations: usize,
    /// Objective value at the final recovered vector.
    pub value: f64,
}

impl ActiveSet {
    /// Deletes atoms that contribute little to the fit of a least-squares objective.
    ///
    /// Each round scores every atom with the removal-cost gap
    /// `0.5 * c_i^2 * ||A a_i||^2 - c_i * <grad f(x), a_i>`, where the first term is
    /// computed once on entry and is not refreshed for surviving atoms. The atom with the
    /// smallest gap (lowest index on ties) is removed tentatively and the remaining
    /// coefficients are re-fitted by solving `(A S) c ~= b`. The deletion is kept if the
    /// objective at the re-fitted point does not exceed `threshold`; otherwise the set is
    /// left as it was and pruning ends.
    ///
    /// # Arguments
    /// * `threshold`: the largest objective value a deletion may produce.
    /// * `objective`: a function exposing its operator `A` and target `b`.
    /// * `options`: minimum size and singular-system policy.
    ///
    /// # Returns
    /// A [`PruneReport`]; the set is never left with NaN or infinite coefficients.
    pub fn prune_support<F>(
        &mut self,
        threshold: f64,
        objective: &F,
        options: &PruneOptions,
    ) -> Result<PruneReport, ActiveSetError>
    where
        F: LeastSquaresObjective + ?Sized,
    {
        if self.is_empty() {
            return Err(ActiveSetErrorKind::EmptyActiveSet.into());
        }
        if threshold.is_nan() {
            return Err(ActiveSetErrorKind::InputError(
                "pruning threshold must not be NaN".to_string(),
            )
            .into());
        }
        let d = self.atoms().nrows();
        let a = objective.operator();
        let b = objective.target();
        check_objective_dim(d, objective.dim())?;
        check_objective_dim(d, a.ncols())?;
        if b.nrows() != a.nrows() || b.ncols() != 1 {
            return Err(ActiveSetErrorKind::DimensionMismatch {
                expected: a.nrows(),
                actual: b.nrows(),
            }
            .into());
        }

        // 0.5 * c_i^2 * ||A a_i||^2, dropped entry by entry as atoms are removed.
        let mut sq_terms: Vec<f64> = {
            let projected = a * self.atoms();
            self.coefficient_slice()
                .iter()
                .enumerate()
                .map(|(j, c)| {
                    let norm = projected.as_ref().col(j).norm_l2();
                    0.5 * c * c * norm * norm
                })
                .collect()
        };

        let min_atoms = options.min_atoms.max(1);
        let mut gradient = Mat::<f64>::zeros(d, 1);
        let mut removed = 0;

        let status = loop {
            let k = self.len();
            if k <= min_atoms {
                break PruneStatus::MinimumSize;
            }

            let x = self.recover_vector()?;
            objective.gradient(x.as_ref(), gradient.as_mut());
            let gaps = removal_gaps(self, &sq_terms, gradient.as_ref());

            // Stable sort keeps the lowest index first among equal gaps.
            let mut candidates: Vec<usize> = (0..k).collect();
            candidates.sort_by(|&i, &j| gaps[i].total_cmp(&gaps[j]));

            let mut refit = None;
            for &index in &candidates {
                let atoms = without_column(self.atom_buffer(), d, index);
                let reduced = MatRef::from_column_major_slice(&atoms, d, k - 1);
                let operand = a * reduced;
                match solve_restricted(operand.as_ref(), b) {
                    Ok(coeffs) => {
                        refit = Some((index, atoms, coeffs));
                        break;
                    }
                    Err(err) if err.is_singular() => {
                        log::warn!("Pruning: deleting atom {index} leaves a singular system.");
                        if options.singular_policy == SingularPolicy::Stop {
                            break;
                        }
                    }
                    Err(err) => return Err(err),
                }
            }
            let Some((index, atoms, coeffs)) = refit else {
                break PruneStatus::Singular;
            };

            let coeffs: Vec<f64> = (0..k - 1).map(|i| coeffs[(i, 0)]).collect();
            let candidate_x = MatRef::from_column_major_slice(&atoms, d, k - 1)
                * MatRef::from_column_major_slice(&coeffs, k - 1, 1);
            let value = objective.evaluate(candidate_x.as_ref());

            // NaN compares false and is rejected together with values above the threshold.
            if !(value <= threshold) {
                log::debug!(
                    "Pruning: deleting atom {index} gives {value:.6e} > {threshold:.6e}; keeping it."
                );
                break PruneStatus::ThresholdExceeded;
            }

            self.commit(atoms, coeffs);
            sq_terms.remove(index);
            removed += 1;
            log::debug!(
                "Pruning: deleted atom {index}, {} atoms left, objective {value:.6e}.",
                self.len()
            );
        };

        let value = objective.evaluate(self.recover_vector()?.as_ref());
        Ok(PruneReport {
            status,
            removed,
            atoms: self.len(),
            value,
        })
    }

    /// Runs projected gradient descent over the coefficients, keeping the atoms fixed.
    ///
    /// The coefficients are first projected onto the L1 ball of radius `tau`. Each step then
    /// moves them against `S^T grad f(S c)`, where `S` holds the atoms as columns, and
    /// projects them back onto the ball. The loop stops when
    /// a step decreases the objective by less than `options.tolerance`, when a step
    /// increases it (the previous coefficients are restored), or after
    /// `options.max_iterations` steps. Running out of iterations is not an error.
    pub fn projected_gradient_enhancement<F>(
        &mut self,
        objective: &F,
        tau: f64,
        step_size: f64,
        options: &RefineOptions,
    ) -> Result<RefineReport, ActiveSetError>
    where
        F: Objective + ?Sized,
    {
        if self.is_empty() {
            return Err(ActiveSetErrorKind::EmptyActiveSet.into());
        }
        if !tau.is_finite() || tau < 0.0 {
            return Err(ActiveSetErrorKind::InputError(format!(
                "L1-ball radius must be finite and non-negative, got {tau}"
            ))
            .into());
        }
        if !step_size.is_finite() || step_size <= 0.0 {
            return Err(ActiveSetErrorKind::InputError(format!(
                "step size must be finite and positive, got {step_size}"
            ))
            .into());
        }
        if !(options.tolerance >= 0.0) {
            return Err(ActiveSetErrorKind::InputError(format!(
                "tolerance must be non-negative, got {}",
                options.tolerance
            ))
            .into());
        }
        let d = self.atoms().nrows();
        check_objective_dim(d, objective.dim())?;

        // Start from a feasible point so that every iterate compared below lies in the ball.
        self.project_to_l1(tau)?;
        let mut x = self.recover_vector()?;
        let mut value = objective.evaluate(x.as_ref());
        let mut gradient = Mat::<f64>::zeros(d, 1);
        let mut iterations = 0;
        let mut status = RefineStatus::MaxIterations;

        for iter in 0..options.max_iterations {
            objective.gradient(x.as_ref(), gradient.as_mut());
            // Chain rule through x = S c.
            let coeff_gradient = self.atoms().transpose() * gradient.as_ref();

            let previous = self.coefficient_slice().to_vec();
            for (i, c) in self.coefficients_mut().iter_mut().enumerate() {
                *c -= step_size * coeff_gradient[(i, 0)];
            }
            if let Err(err) = self.project_to_l1(tau) {
                self.coefficients_mut().copy_from_slice(&previous);
                return Err(err);
            }
            iterations = iter + 1;

            x = self.recover_vector()?;
            let value_new = objective.evaluate(x.as_ref());
            log::debug!("Refinement step {iterations}: objective {value_new:.6e}.");

            if !(value_new <= value) {
                self.coefficients_mut().copy_from_slice(&previous);
                status = RefineStatus::Stalled;
                break;
            }
            let decrease = value - value_new;
            value = value_new;
            if decrease < options.tolerance {
                status = RefineStatus::Converged;
                break;
            }
        }

        Ok(RefineReport {
            status,
            iterations,
            value,
        })
    }

    /// Projects the coefficients onto the L1 ball of radius `tau`.
    ///
    /// No-op when `||c||_1 <= tau`; otherwise the coefficients are replaced by their
    /// Euclidean projection, which soft-thresholds every entry by a common level.
    pub fn project_to_l1(&mut self, tau: f64) -> Result<(), ActiveSetError> {
        project_onto_l1_ball(self.coefficients_mut(), tau)
    }
}

/// `gap_i = sq_terms[i] - c_i * <gradient, a_i>` for every atom.
fn removal_gaps(set: &ActiveSet, sq_terms: &[f64], gradient: MatRef<'_, f64>) -> Vec<f64> {
    let atoms = set.atoms();
    set.coefficient_slice()
        .iter()
        .zip(sq_terms)
        .enumerate()
        .map(|(j, (c, sq))| {
            let inner: f64 = (0..atoms.nrows())
                .map(|r| atoms[(r, j)] * gradient[(r, 0)])
                .sum();
            sq - c * inner
        })
        .collect()
}

/// Copies a column-major `d x k` buffer without its `index`-th column.
fn without_column(buffer: &[f64], d: usize, index: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(buffer.len().saturating_sub(d));
    out.extend_from_slice(&buffer[..index * d]);
    out.extend_from_slice(&buffer[(index + 1) * d..]);
    out
}

fn check_objective_dim(expected: usize, actual: usize) -> Result<(), ActiveSetError> {
    if expected != actual {
        return Err(ActiveSetErrorKind::DimensionMismatch { expected, actual }.into());
    }
    Ok(())
}
