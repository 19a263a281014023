use crate::linalg::{
    BidiagonalDecomposition, CholeskyDecomposition, GeneralEigen, HessenbergDecomposition,
    LdlDecomposition, LinalgError, LuDecomposition, LuResult, QrColumnDecomposition,
    QrDecomposition, SvdDecomposition, SymmetricEigen,
};
use crate::solver::{LinearSolver, LuSolver, QrSolver};
use crate::traits::FloatScalar;

use super::DynMatrix;

/// Convenience entry points for the decompositions and solvers.
impl<T: FloatScalar> DynMatrix<T> {
    /// LU decomposition with partial pivoting (any shape).
    ///
    /// ```
    /// use densela::DynMatrix;
    /// use densela::linalg::LuResult;
    ///
    /// let a = DynMatrix::from_rows(2, 2, &[2.0_f64, 1.0, 5.0, 3.0]);
    /// let lu = a.lu();
    /// assert!(!lu.is_singular());
    /// assert!((lu.determinant() - 1.0).abs() < 1e-12);
    /// ```
    pub fn lu(&self) -> LuDecomposition<T> {
        LuDecomposition::new(self)
    }

    /// Householder QR (row-major variant).
    pub fn qr(&self) -> QrDecomposition<T> {
        QrDecomposition::new(self)
    }

    /// Cholesky `A = L·Lᵀ`. Only the upper triangle is read.
    pub fn cholesky(&self) -> Result<CholeskyDecomposition<T>, LinalgError> {
        CholeskyDecomposition::new(self)
    }

    /// `A = L·D·Lᵀ` with unit-diagonal `L`.
    pub fn ldl(&self) -> Result<LdlDecomposition<T>, LinalgError> {
        LdlDecomposition::new(self)
    }

    pub fn bidiagonal(&self) -> BidiagonalDecomposition<T> {
        BidiagonalDecomposition::new(self)
    }

    pub fn hessenberg(&self) -> HessenbergDecomposition<T> {
        HessenbergDecomposition::new(self)
    }

    /// Thin SVD with both sets of singular vectors.
    ///
    /// ```
    /// use densela::DynMatrix;
    /// use densela::linalg::SvdResult;
    ///
    /// let a = DynMatrix::from_rows(3, 2, &[1.0_f64, 0.0, 0.0, 2.0, 0.0, 0.0]);
    /// let svd = a.svd().unwrap();
    /// assert!((svd.singular_values()[0] - 2.0).abs() < 1e-12);
    /// assert!((svd.singular_values()[1] - 1.0).abs() < 1e-12);
    /// ```
    pub fn svd(&self) -> Result<SvdDecomposition<T>, LinalgError> {
        SvdDecomposition::new(self)
    }

    /// Singular values only, descending.
    pub fn singular_values(&self) -> Result<Vec<T>, LinalgError> {
        SvdDecomposition::values_only(self)
    }

    /// Eigen-decomposition of a symmetric matrix.
    pub fn eig_symmetric(&self) -> Result<SymmetricEigen<T>, LinalgError> {
        SymmetricEigen::new(self)
    }

    /// Eigenvalues (complex in general) of a square matrix.
    ///
    /// ```
    /// use densela::DynMatrix;
    ///
    /// let a = DynMatrix::from_rows(2, 2, &[2.0_f64, -1.0, 1.0, 0.0]);
    /// let eig = a.eig().unwrap();
    /// for l in eig.eigenvalues() {
    ///     assert!((l.re - 1.0).abs() < 1e-7);
    /// }
    /// ```
    pub fn eig(&self) -> Result<GeneralEigen<T>, LinalgError> {
        GeneralEigen::new(self)
    }

    /// Solve `A·x = b` for square `A` through LU.
    ///
    /// ```
    /// use densela::DynMatrix;
    ///
    /// let a = DynMatrix::from_rows(3, 3, &[2.0_f64, 1.0, -1.0, -3.0, -1.0, 2.0, -2.0, 1.0, 2.0]);
    /// let x = a.solve(&[8.0, -11.0, -3.0]).unwrap();
    /// assert!((x[0] - 2.0).abs() < 1e-12);
    /// assert!((x[1] - 3.0).abs() < 1e-12);
    /// assert!((x[2] + 1.0).abs() < 1e-12);
    /// ```
    pub fn solve(&self, b: &[T]) -> Result<Vec<T>, LinalgError> {
        let mut solver = LuSolver::new();
        solver.set_a(&mut self.clone())?;
        Ok(solver.solve_vector(b))
    }

    /// Least-squares (tall) or basic (wide) solution through QR.
    pub fn solve_least_squares(&self, b: &[T]) -> Vec<T> {
        QrSolver::from(QrColumnDecomposition::new(self)).solve_vector(b)
    }

    /// Inverse of a square matrix, `Err(Singular)` if it has none.
    pub fn inverse(&self) -> Result<DynMatrix<T>, LinalgError> {
        let mut solver = LuSolver::new();
        solver.set_a(&mut self.clone())?;
        Ok(solver.invert())
    }

    /// Determinant through LU. Panics if the matrix is not square.
    pub fn det(&self) -> T {
        self.lu().determinant()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::{CholeskyResult, QrResult};

    const TOL: f64 = 1e-10;

    #[test]
    fn convenience_round_trip() {
        let a = DynMatrix::from_rows(3, 3, &[4.0, 1.0, 2.0, 1.0, 3.0, 0.5, 2.0, 0.5, 5.0]);

        let qr = a.qr();
        assert!((&qr.get_q(true) * &qr.get_r(true)).approx_eq(&a, TOL));

        let chol = a.cholesky().unwrap();
        let l = chol.get_t();
        assert!((&l * &l.transpose()).approx_eq(&a, TOL));

        let inv = a.inverse().unwrap();
        assert!((&a * &inv).approx_eq(&DynMatrix::eye(3, 0.0), TOL));
        assert!((a.det() * inv.det() - 1.0).abs() < TOL);

        let ev = a.eig_symmetric().unwrap();
        let product: f64 = ev.eigenvalues().iter().product();
        assert!((product - a.det()).abs() < 1e-8);
    }

    #[test]
    fn singular_inverse_errors() {
        let a = DynMatrix::from_rows(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        assert_eq!(a.inverse().unwrap_err(), LinalgError::Singular);
        assert_eq!(a.solve(&[1.0, 1.0]).unwrap_err(), LinalgError::Singular);
        assert_eq!(a.det(), 0.0);
    }

    #[test]
    fn least_squares_through_qr() {
        let a: DynMatrix<f64> = DynMatrix::from_rows(3, 2, &[1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let x = a.solve_least_squares(&[1.0, 2.0, 2.0]);
        // normal equations: [[3,6],[6,14]] x = [5, 11]
        assert!((x[0] - 2.0 / 3.0).abs() < TOL);
        assert!((x[1] - 0.5).abs() < TOL);
    }
}
