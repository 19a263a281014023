use core::fmt::Debug;
use num_traits::{Float, Num, One, Zero};

/// Trait for types that can be used as matrix elements.
///
/// Blanket-implemented for all types satisfying the bounds.
pub trait Scalar: Copy + PartialEq + Debug + Zero + One + Num {}

impl<T: Copy + PartialEq + Debug + Zero + One + Num> Scalar for T {}

/// Trait for the real floating-point element types the decompositions run on
/// (`f32`, `f64`).
///
/// Required by anything that needs `sqrt`, `abs`, `epsilon`, ...
pub trait FloatScalar: Scalar + Float {
    /// `2` in this type; used all over the reflector and shift formulas.
    #[inline]
    fn two() -> Self {
        Self::one() + Self::one()
    }
}

impl<T: Scalar + Float> FloatScalar for T {}

/// Read-only access to a row-major matrix-like type.
///
/// Rows are contiguous, so algorithms that sweep along a row can hand the
/// slice straight to a [`Kernels`](crate::backend::Kernels) routine.
pub trait MatrixRef<T> {
    fn nrows(&self) -> usize;
    fn ncols(&self) -> usize;
    fn get(&self, row: usize, col: usize) -> &T;

    /// Row `row`, starting at column `col_start`.
    fn row_as_slice(&self, row: usize, col_start: usize) -> &[T];
}

/// Mutable access to a row-major matrix-like type.
///
/// Extends `MatrixRef` with mutable element access, enabling the in-place
/// factorizations (LU, Cholesky, Householder reductions) to work generically.
pub trait MatrixMut<T>: MatrixRef<T> {
    fn get_mut(&mut self, row: usize, col: usize) -> &mut T;

    /// Mutable row `row`, starting at column `col_start`.
    fn row_as_mut_slice(&mut self, row: usize, col_start: usize) -> &mut [T];
}
