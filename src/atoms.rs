//! The active-set store: atoms and their coefficients.
//!
//! An [`ActiveSet`] represents a vector `x` of dimension `d` as the combination
//! `x = sum_i c_i * a_i` of `k` atoms `a_i` with coefficients `c_i`. Atoms live in a
//! single column-major buffer so that the whole set can be viewed as a `d x k`
//! [`MatRef`] without copying; coefficients are viewed as a `k x 1` matrix.
//!
//! The recovered vector is never cached. It is recomputed from the current atoms and
//! coefficients every time it is requested.
//!
//! Every mutation goes through a validated method, so the invariant
//! `atoms().ncols() == coefficients().nrows()` holds after any sequence of calls.

use crate::error::{ActiveSetError, ActiveSetErrorKind};
use faer::{Mat, MatRef};

/// Atoms paired one-to-one with scalar coefficients.
///
/// Atoms need not be distinct or orthogonal; the set is a multiset of vectors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveSet {
    /// Ambient dimension, fixed by the first atom unless set explicitly.
    dim: Option<usize>,
    /// Column-major `dim x len` storage of the atoms.
    atoms: Vec<f64>,
    coeffs: Vec<f64>,
}

impl ActiveSet {
    /// Creates an empty active set whose dimension is fixed by the first atom added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty active set for atoms of dimension `dim`.
    pub fn with_dimension(dim: usize) -> Self {
        Self {
            dim: Some(dim),
            ..Self::default()
        }
    }

    /// Number of atoms `k`.
    #[inline]
    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    /// `true` when the set holds no atoms.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Ambient dimension `d`, if known.
    #[inline]
    pub fn dim(&self) -> Option<usize> {
        self.dim
    }

    /// The atoms as a `d x k` matrix view.
    pub fn atoms(&self) -> MatRef<'_, f64> {
        MatRef::from_column_major_slice(&self.atoms, self.dim.unwrap_or(0), self.len())
    }

    /// The coefficients as a `k x 1` matrix view.
    pub fn coefficients(&self) -> MatRef<'_, f64> {
        MatRef::from_column_major_slice(&self.coeffs, self.len(), 1)
    }

    /// The coefficients as a slice, in atom order.
    #[inline]
    pub fn coefficient_slice(&self) -> &[f64] {
        &self.coeffs
    }

    /// The `index`-th atom as a `d x 1` matrix view.
    pub fn atom(&self, index: usize) -> Result<MatRef<'_, f64>, ActiveSetError> {
        self.check_index(index)?;
        let d = self.dim.unwrap_or(0);
        Ok(MatRef::from_column_major_slice(
            &self.atoms[index * d..(index + 1) * d],
            d,
            1,
        ))
    }

    /// The coefficient paired with the `index`-th atom.
    pub fn coefficient(&self, index: usize) -> Result<f64, ActiveSetError> {
        self.check_index(index)?;
        Ok(self.coeffs[index])
    }

    /// The atomic (L1) norm of the coefficient vector.
    pub fn atomic_norm(&self) -> f64 {
        self.coeffs.iter().map(|c| c.abs()).sum()
    }

    /// Inserts `atom` (a `d x 1` column) at index 0 together with `coefficient`.
    ///
    /// The most recently added atom always occupies index 0. A shape mismatch leaves the
    /// set untouched.
    pub fn add_atom(&mut self, atom: MatRef<'_, f64>, coefficient: f64) -> Result<(), ActiveSetError> {
        if atom.ncols() != 1 {
            return Err(ActiveSetErrorKind::DimensionMismatch {
                expected: 1,
                actual: atom.ncols(),
            }
            .into());
        }
        let d = *self.dim.get_or_insert(atom.nrows());
        if atom.nrows() != d {
            return Err(ActiveSetErrorKind::DimensionMismatch {
                expected: d,
                actual: atom.nrows(),
            }
            .into());
        }

        self.atoms.splice(0..0, (0..d).map(|i| atom[(i, 0)]));
        self.coeffs.insert(0, coefficient);
        Ok(())
    }

    /// Recovers `x = A c`, the `d x 1` vector represented by the active set.
    pub fn recover_vector(&self) -> Result<Mat<f64>, ActiveSetError> {
        if self.is_empty() {
            return Err(ActiveSetErrorKind::EmptyActiveSet.into());
        }
        Ok(self.atoms() * self.coefficients())
    }

    /// Overwrites the coefficient of the `index`-th atom.
    pub fn set_coefficient(&mut self, index: usize, value: f64) -> Result<(), ActiveSetError> {
        self.check_index(index)?;
        self.coeffs[index] = value;
        Ok(())
    }

    /// Overwrites every coefficient at once. `coefficients` must have length `k`.
    pub fn set_coefficients(&mut self, coefficients: &[f64]) -> Result<(), ActiveSetError> {
        if coefficients.len() != self.len() {
            return Err(ActiveSetErrorKind::DimensionMismatch {
                expected: self.len(),
                actual: coefficients.len(),
            }
            .into());
        }
        self.coeffs.copy_from_slice(coefficients);
        Ok(())
    }

    /// Replaces the whole active set with the columns of `atoms` and `coefficients`.
    ///
    /// The dimension of the set becomes `atoms.nrows()`.
    pub fn replace_atoms(
        &mut self,
        atoms: MatRef<'_, f64>,
        coefficients: &[f64],
    ) -> Result<(), ActiveSetError> {
        if atoms.ncols() != coefficients.len() {
            return Err(ActiveSetErrorKind::DimensionMismatch {
                expected: atoms.ncols(),
                actual: coefficients.len(),
            }
            .into());
        }
        let d = atoms.nrows();
        let mut buffer = Vec::with_capacity(d * atoms.ncols());
        for j in 0..atoms.ncols() {
            buffer.extend((0..d).map(|i| atoms[(i, j)]));
        }
        self.dim = Some(d);
        self.atoms = buffer;
        self.coeffs = coefficients.to_vec();
        Ok(())
    }

    /// Removes the `index`-th atom, shifting later atoms down by one.
    ///
    /// Returns the removed atom and its coefficient.
    pub fn remove_atom(&mut self, index: usize) -> Result<(Mat<f64>, f64), ActiveSetError> {
        self.check_index(index)?;
        let d = self.dim.unwrap_or(0);
        let removed: Vec<f64> = self.atoms.drain(index * d..(index + 1) * d).collect();
        let coefficient = self.coeffs.remove(index);
        Ok((Mat::from_fn(d, 1, |i, _| removed[i]), coefficient))
    }

    /// Raw column-major atom storage, for the algorithms in this crate.
    pub(crate) fn atom_buffer(&self) -> &[f64] {
        &self.atoms
    }

    /// Installs a state produced by the pruning engine. Shapes are checked by the caller.
    pub(crate) fn commit(&mut self, atoms: Vec<f64>, coeffs: Vec<f64>) {
        debug_assert_eq!(atoms.len(), self.dim.unwrap_or(0) * coeffs.len());
        self.atoms = atoms;
        self.coeffs = coeffs;
    }

    pub(crate) fn coefficients_mut(&mut self) -> &mut [f64] {
        &mut self.coeffs
    }

    fn check_index(&self, index: usize) -> Result<(), ActiveSetError> {
        if index >= self.len() {
            return Err(ActiveSetErrorKind::IndexOutOfBounds {
                index,
                len: self.len(),
            }
            .into());
        }
        Ok(())
    }
}
