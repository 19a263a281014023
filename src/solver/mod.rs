//! Linear-system solvers built on the packed factorizations.
//!
//! A solver is bound to one coefficient matrix by [`LinearSolver::set_a`],
//! which factors it once; [`solve`](LinearSolver::solve) can then be called
//! any number of times with different right-hand sides. Solvers work from
//! the packed factor directly and never materialize `L`, `U`, `Q` or `R`.
//!
//! Some solvers reuse the caller's buffers: [`CholeskySolver`] factors in
//! place inside `A` and [`QrSolver`] overwrites `B` with `Qᵀ·B`. Both
//! advertise it through [`modifies_a`](LinearSolver::modifies_a) /
//! [`modifies_b`](LinearSolver::modifies_b), and [`SafeSolver`] wraps any
//! solver so the inputs come back untouched.
//!
//! ```
//! use densela::DynMatrix;
//! use densela::solver::{LinearSolver, LuSolver};
//!
//! let mut a = DynMatrix::from_rows(2, 2, &[2.0_f64, 1.0, 5.0, 3.0]);
//! let mut solver = LuSolver::new();
//! solver.set_a(&mut a).unwrap();
//!
//! let x = solver.solve_vector(&[4.0, 11.0]);
//! assert!((x[0] - 1.0).abs() < 1e-12);
//! assert!((x[1] - 2.0).abs() < 1e-12);
//! ```

mod cholesky;
mod lu;
mod qr;

pub use cholesky::CholeskySolver;
pub use lu::LuSolver;
pub use qr::QrSolver;

use crate::linalg::LinalgError;
use crate::traits::FloatScalar;
use crate::DynMatrix;

/// Solve `A·X = B` against a cached factorization of `A`.
///
/// Calling `solve`, `invert` or `quality` before a successful `set_a`
/// panics.
pub trait LinearSolver<T: FloatScalar> {
    /// Factor `a`. Fails if the factorization does (singular LU, non-SPD
    /// Cholesky). `a` may be overwritten when
    /// [`modifies_a`](Self::modifies_a) is true.
    fn set_a(&mut self, a: &mut DynMatrix<T>) -> Result<(), LinalgError>;

    /// Solve for every column of `b` (`m x k`); `x` is reshaped to `n x k`.
    /// `b` may be overwritten when [`modifies_b`](Self::modifies_b) is true.
    ///
    /// # Panics
    ///
    /// If `b` does not have `m` rows.
    fn solve(&mut self, b: &mut DynMatrix<T>, x: &mut DynMatrix<T>);

    /// Single right-hand side.
    fn solve_vector(&mut self, b: &[T]) -> Vec<T> {
        let mut bm = DynMatrix::from_vec(b.len(), 1, b.to_vec());
        let mut x = DynMatrix::zeros(0, 0, T::zero());
        self.solve(&mut bm, &mut x);
        x.into_vec()
    }

    /// `A⁻¹`, or the least-squares pseudo-inverse for a full-rank
    /// rectangular `A`.
    fn invert(&mut self) -> DynMatrix<T>;

    /// Scale-invariant singularity indicator in `[0, 1]`: zero for an
    /// exactly singular factor, near one for a well-conditioned one.
    fn quality(&self) -> T;

    fn modifies_a(&self) -> bool;

    fn modifies_b(&self) -> bool;
}

/// Wrapper that hands the inner solver private copies of whatever it
/// declares it modifies, so the caller's `A` and `B` are never touched.
///
/// ```
/// use densela::DynMatrix;
/// use densela::solver::{CholeskySolver, LinearSolver, SafeSolver};
///
/// let a0 = DynMatrix::from_rows(2, 2, &[4.0_f64, 2.0, 2.0, 3.0]);
/// let mut a = a0.clone();
/// let mut solver = SafeSolver::new(CholeskySolver::new());
/// solver.set_a(&mut a).unwrap();
/// assert_eq!(a, a0);
/// assert!(!solver.modifies_a());
/// ```
#[derive(Debug, Clone)]
pub struct SafeSolver<T, S> {
    inner: S,
    a_copy: DynMatrix<T>,
    b_copy: DynMatrix<T>,
}

impl<T: FloatScalar, S: LinearSolver<T>> SafeSolver<T, S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            a_copy: DynMatrix::zeros(0, 0, T::zero()),
            b_copy: DynMatrix::zeros(0, 0, T::zero()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<T: FloatScalar, S: LinearSolver<T>> LinearSolver<T> for SafeSolver<T, S> {
    fn set_a(&mut self, a: &mut DynMatrix<T>) -> Result<(), LinalgError> {
        if self.inner.modifies_a() {
            self.a_copy.copy_from(a);
            self.inner.set_a(&mut self.a_copy)
        } else {
            self.inner.set_a(a)
        }
    }

    fn solve(&mut self, b: &mut DynMatrix<T>, x: &mut DynMatrix<T>) {
        if self.inner.modifies_b() {
            self.b_copy.copy_from(b);
            self.inner.solve(&mut self.b_copy, x);
        } else {
            self.inner.solve(b, x);
        }
    }

    fn invert(&mut self) -> DynMatrix<T> {
        self.inner.invert()
    }

    fn quality(&self) -> T {
        self.inner.quality()
    }

    fn modifies_a(&self) -> bool {
        false
    }

    fn modifies_b(&self) -> bool {
        false
    }
}

/// Copy column `j` of `m` into `out`.
pub(crate) fn read_column<T: Copy>(m: &DynMatrix<T>, j: usize, out: &mut [T]) {
    for (i, o) in out.iter_mut().enumerate() {
        *o = m[(i, j)];
    }
}

/// Copy `col` into column `j` of `m`.
pub(crate) fn write_column<T: Copy>(m: &mut DynMatrix<T>, j: usize, col: &[T]) {
    for (i, &v) in col.iter().enumerate() {
        m[(i, j)] = v;
    }
}
