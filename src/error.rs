//! This module defines the custom error types for the library.
//!
//! Every failure that the active-set store, the pruning engine and the coefficient
//! refiner can report is collected in a single enum, wrapped by the public
//! [`ActiveSetError`] type.
//!
//! Shape and emptiness errors are precondition violations: they are returned before
//! any state is touched. [`ActiveSetError::is_singular`] errors come from the
//! restricted least-squares solve and are normally absorbed by the pruning loop.
//! Note that [`faer::linalg::svd::SvdError`] does not implement [`std::error::Error`],
//! so it is wrapped by hand.
use thiserror::Error;

/// Represents all possible errors raised while manipulating an active set.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct ActiveSetError(#[from] ActiveSetErrorKind);

/// Private enum containing the distinct kinds of errors.
#[derive(Error, Debug, PartialEq)]
pub(crate) enum ActiveSetErrorKind {
    /// A vector or matrix does not have the shape required by the active set.
    #[error("Dimension mismatch: expected {expected} but found {actual}.")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The operation needs at least one atom.
    #[error("The active set is empty.")]
    EmptyActiveSet,

    /// An atom index past the end of the active set.
    #[error("Atom index {index} is out of bounds for an active set of {len} atoms.")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Indicates that an invalid input parameter was provided to a function.
    #[error("Invalid input parameter: {0}")]
    InputError(String),

    /// The restricted least-squares system has no unique finite solution.
    #[error("Restricted least-squares system over {atoms} atoms is singular.")]
    SingularSystem { atoms: usize },

    /// Wraps an error originating from [`faer`]'s singular value decomposition.
    #[error("A numerical error occurred while computing singular values: {0:?}")]
    SvdError(faer::linalg::svd::SvdError),
}

impl ActiveSetError {
    /// `true` if the error comes from a rank-deficient or non-finite restricted solve.
    pub fn is_singular(&self) -> bool {
        matches!(self.0, ActiveSetErrorKind::SingularSystem { .. })
    }

    /// `true` if the error was raised because the active set holds no atoms.
    pub fn is_empty_active_set(&self) -> bool {
        matches!(self.0, ActiveSetErrorKind::EmptyActiveSet)
    }

    /// `true` for shape violations on atoms, coefficients, operators or targets.
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(self.0, ActiveSetErrorKind::DimensionMismatch { .. })
    }

    /// `true` for invalid scalar parameters and out-of-range indices.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self.0,
            ActiveSetErrorKind::InputError(_) | ActiveSetErrorKind::IndexOutOfBounds { .. }
        )
    }
}

impl PartialEq for ActiveSetError {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
