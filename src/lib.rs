//! Active-set machinery for atomic-norm regularized optimization.
//!
//! This crate maintains a sparse representation of a solution vector `x` as a linear
//! combination of a small, changing set of basis vectors ("atoms"),
//! `x = sum_i c_i * a_i`, and provides the two refinement steps used by
//! forward-backward greedy methods (Rao, Shah and Wright, 2015):
//!
//! - **Backward pruning** ([`ActiveSet::prune_support`]): deletes atoms whose removal
//!   keeps a least-squares objective below a threshold, re-fitting the surviving
//!   coefficients exactly after every deletion.
//! - **Coefficient refinement** ([`ActiveSet::projected_gradient_enhancement`]):
//!   projected gradient descent over the coefficients onto the L1 ball of radius `tau`,
//!   using an exact `O(k log k)` Euclidean projection.
//!
//! Choosing which atom to add (the forward step) is left to the caller.
//!
//! Built on the [`faer`] linear algebra framework: atoms are exposed as a `d x k`
//! [`faer::MatRef`] and points as `d x 1` matrices.
//!
//! ## Example Usage
//!
//! The following example fits `b = (1, 2, 0)` with the identity operator, using the three
//! coordinate vectors as atoms. The third atom is useless and is pruned; the remaining
//! coefficients are then refined inside an L1 ball of radius 2.
//!
//! ```rust
//! use faer::Mat;
//! use fw_atoms::{ActiveSet, PruneOptions, RefineOptions, SquaredLoss};
//!
//! let a = Mat::<f64>::identity(3, 3);
//! let b = Mat::from_fn(3, 1, |i, _| [1.0, 2.0, 0.0][i]);
//! let loss = SquaredLoss::new(a, b).unwrap();
//!
//! let mut set = ActiveSet::new();
//! for i in 0..3 {
//!     let atom = Mat::from_fn(3, 1, |r, _| if r == i { 1.0 } else { 0.0 });
//!     set.add_atom(atom.as_ref(), [1.0, 2.0, 0.0][i]).unwrap();
//! }
//!
//! let pruned = set.prune_support(1e-9, &loss, &PruneOptions::default()).unwrap();
//! assert_eq!(pruned.removed, 1);
//! assert_eq!(set.len(), 2);
//!
//! set.projected_gradient_enhancement(&loss, 2.0, 0.5, &RefineOptions::default())
//!     .unwrap();
//! assert!(set.atomic_norm() <= 2.0 + 1e-12);
//! ```

pub mod algorithms;
pub mod atoms;
pub mod error;
pub mod objective;
pub mod solvers;
pub mod utils;

pub use atoms::ActiveSet;
pub use error::ActiveSetError;
pub use objective::{LeastSquaresObjective, Objective, SquaredLoss};
pub use solvers::{
    PruneOptions, PruneReport, PruneStatus, RefineOptions, RefineReport, RefineStatus,
    SingularPolicy,
};
