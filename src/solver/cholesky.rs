use crate::backend::{Kernels, Software};
use crate::linalg::cholesky::cholesky_in_place;
use crate::linalg::triangular::quality;
use crate::linalg::{CholeskyDecomposition, LinalgError, Triangle};
use crate::solver::{read_column, write_column, LinearSolver};
use crate::traits::FloatScalar;
use crate::DynMatrix;

/// Symmetric positive definite solver on `A = L·Lᵀ`.
///
/// `set_a` factors inside the caller's matrix (its lower triangle becomes
/// `L`, the upper triangle is zeroed) and keeps a copy of the factor. Use
/// [`SafeSolver`](crate::solver::SafeSolver) to keep `A` intact.
#[derive(Debug, Clone)]
pub struct CholeskySolver<T, K = Software> {
    chol: Option<CholeskyDecomposition<T, K>>,
    t: Vec<T>,
    kernels: K,
}

impl<T: FloatScalar> CholeskySolver<T> {
    pub fn new() -> Self {
        Self::with_kernels(Software)
    }
}

impl<T: FloatScalar> Default for CholeskySolver<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: FloatScalar, K: Kernels<T>> CholeskySolver<T, K> {
    pub fn with_kernels(kernels: K) -> Self {
        Self {
            chol: None,
            t: Vec::new(),
            kernels,
        }
    }

    fn factor(&self) -> &CholeskyDecomposition<T, K> {
        let Some(chol) = &self.chol else {
            panic!("CholeskySolver used before a successful set_a");
        };
        chol
    }
}

impl<T: FloatScalar, K: Kernels<T>> LinearSolver<T> for CholeskySolver<T, K> {
    fn set_a(&mut self, a: &mut DynMatrix<T>) -> Result<(), LinalgError> {
        self.chol = None;
        cholesky_in_place(&self.kernels, a)?;
        self.t.resize(a.nrows(), T::zero());
        self.chol = Some(CholeskyDecomposition::from_factor(
            a.clone(),
            Triangle::Lower,
            self.kernels.clone(),
        ));
        Ok(())
    }

    fn solve(&mut self, b: &mut DynMatrix<T>, x: &mut DynMatrix<T>) {
        let n = self.factor().packed().nrows();
        assert_eq!(b.nrows(), n, "B has {} rows, expected {}", b.nrows(), n);
        let k = b.ncols();
        x.reshape(n, k);
        let mut t = core::mem::take(&mut self.t);
        for j in 0..k {
            read_column(b, j, &mut t);
            self.factor().solve_in_place(&mut t);
            write_column(x, j, &t);
        }
        self.t = t;
    }

    fn invert(&mut self) -> DynMatrix<T> {
        self.factor().inverse()
    }

    fn quality(&self) -> T {
        quality(self.factor().packed())
    }

    fn modifies_a(&self) -> bool {
        true
    }

    fn modifies_b(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::SafeSolver;

    const TOL: f64 = 1e-10;

    fn spd() -> DynMatrix<f64> {
        DynMatrix::from_rows(3, 3, &[1.0, 2.0, 4.0, 2.0, 13.0, 23.0, 4.0, 23.0, 90.0])
    }

    #[test]
    fn known_solution() {
        let mut a = spd();
        let mut solver = CholeskySolver::new();
        solver.set_a(&mut a).unwrap();
        let x = solver.solve_vector(&[17.0, 97.0, 320.0]);
        for (xi, e) in x.iter().zip([1.0, 2.0, 3.0]) {
            assert!((xi - e).abs() < TOL, "{:?}", x);
        }
        // A now holds L
        assert_eq!(a[(0, 1)], 0.0);
        assert_eq!(a[(1, 1)], 3.0);
    }

    #[test]
    fn invert_matches_product() {
        let mut solver = SafeSolver::new(CholeskySolver::new());
        let mut a = spd();
        solver.set_a(&mut a).unwrap();
        assert_eq!(a, spd());
        let inv = solver.invert();
        assert!((&spd() * &inv).approx_eq(&DynMatrix::eye(3, 0.0), TOL));
    }

    #[test]
    fn not_positive_definite() {
        let mut a = DynMatrix::from_rows(2, 2, &[1.0, -2.0, -1.0, -2.0]);
        let mut solver = CholeskySolver::new();
        assert_eq!(solver.set_a(&mut a), Err(LinalgError::NotPositiveDefinite));
    }

    #[test]
    fn quality_is_scale_invariant() {
        let mut solver = CholeskySolver::new();
        solver.set_a(&mut spd()).unwrap();
        let q1 = solver.quality();
        solver.set_a(&mut (&spd() * 1e-6)).unwrap();
        let q2 = solver.quality();
        assert!((q1 - q2).abs() < 1e-12);
        // L = [[1,0,0],[2,3,0],[4,5,7]]
        assert!((q1 - 3.0 / 49.0).abs() < 1e-12);
    }
}
