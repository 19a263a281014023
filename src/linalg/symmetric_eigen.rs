use log::debug;
use num_complex::Complex;

use crate::linalg::implicit_qr::TridiagonalQr;
use crate::linalg::result::{EigenResult, TridiagonalResult};
use crate::linalg::tridiagonal::TridiagonalDecomposition;
use crate::linalg::{LinalgError, LOG_TARGET};
use crate::traits::FloatScalar;
use crate::DynMatrix;

/// Settings for [`SymmetricEigen`] and [`GeneralEigen`](crate::linalg::GeneralEigen).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EigenSettings {
    /// Also compute eigenvectors.
    pub compute_vectors: bool,
    /// Sweep budget per eigenvalue.
    pub max_iterations_per_value: usize,
}

impl Default for EigenSettings {
    fn default() -> Self {
        Self {
            compute_vectors: true,
            max_iterations_per_value: 20,
        }
    }
}

/// Eigen-decomposition of a real symmetric matrix, `A = Vᵀ·Λ·V` with the
/// eigenvectors as the rows of `V`.
///
/// Tridiagonal reduction followed by the implicit-QR engine, run in two
/// phases: eigenvalues first from a scratch copy of the tridiagonal form,
/// then (if requested) a second pass from the saved form that rotates the
/// reduction's `Qᵀ` into the eigenvector rows.
///
/// Only symmetric input is meaningful; the full matrix is read and no
/// symmetry check is made.
///
/// # Example
///
/// ```
/// use densela::DynMatrix;
/// use densela::linalg::{EigenResult, SymmetricEigen};
///
/// let a = DynMatrix::from_rows(2, 2, &[2.0_f64, 1.0, 1.0, 2.0]);
/// let eig = SymmetricEigen::new(&a).unwrap();
/// assert!((eig.eigenvalues()[0] - 1.0).abs() < 1e-12);
/// assert!((eig.eigenvalues()[1] - 3.0).abs() < 1e-12);
///
/// let v = eig.eigenvector(1).unwrap();
/// assert!((v[0].abs() - 0.5_f64.sqrt()).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct SymmetricEigen<T> {
    values: Vec<T>,
    vectors: Option<DynMatrix<T>>,
}

impl<T: FloatScalar> SymmetricEigen<T> {
    pub fn new(a: &DynMatrix<T>) -> Result<Self, LinalgError> {
        Self::with_settings(a, EigenSettings::default())
    }

    pub fn with_settings(a: &DynMatrix<T>, settings: EigenSettings) -> Result<Self, LinalgError> {
        assert!(
            a.is_square(),
            "symmetric eigen-decomposition requires a square matrix, got {}x{}",
            a.nrows(),
            a.ncols()
        );
        let td = TridiagonalDecomposition::new(a);
        let form = td.diagonal();
        let max_iter = settings.max_iterations_per_value;

        let (values, saved) = TridiagonalQr::compute_values(&form, max_iter)?;
        if !settings.compute_vectors {
            return Ok(Self { values, vectors: None });
        }

        let mut qt = td.get_q(true);
        let values = TridiagonalQr::compute_vectors(saved, max_iter, &mut qt)?;
        debug!(target: LOG_TARGET, "symmetric eigen: {} eigenpairs", values.len());
        Ok(Self {
            values,
            vectors: Some(qt),
        })
    }

    /// Eigenvalues, ascending.
    pub fn eigenvalues(&self) -> &[T] {
        &self.values
    }

    /// Eigenvectors as the rows of an orthogonal matrix, matching
    /// [`eigenvalues`](Self::eigenvalues) by index.
    ///
    /// # Panics
    ///
    /// If the decomposition was built with `compute_vectors: false`.
    pub fn eigenvectors(&self) -> &DynMatrix<T> {
        let Some(v) = &self.vectors else {
            panic!("eigenvectors were not computed (EigenSettings::compute_vectors is false)");
        };
        v
    }
}

impl<T: FloatScalar> EigenResult<T> for SymmetricEigen<T> {
    fn number_of_eigenvalues(&self) -> usize {
        self.values.len()
    }

    fn eigenvalue(&self, index: usize) -> Complex<T> {
        Complex::new(self.values[index], T::zero())
    }

    fn eigenvector(&self, index: usize) -> Option<Vec<T>> {
        self.vectors.as_ref().map(|v| v.row(index).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    fn assert_near(a: f64, b: f64, tol: f64, msg: &str) {
        assert!((a - b).abs() < tol, "{}: {} vs {} (diff {})", msg, a, b, (a - b).abs());
    }

    fn symmetric(n: usize) -> DynMatrix<f64> {
        let b = DynMatrix::from_fn(n, n, |i, j| ((i * 5 + j * 2) % 9) as f64 / 2.0 - 2.0);
        &b + &b.transpose()
    }

    #[test]
    fn reconstruction() {
        for n in [1, 2, 3, 5, 8] {
            let a = symmetric(n);
            let eig = SymmetricEigen::new(&a).unwrap();
            let v = eig.eigenvectors();
            let lambda = DynMatrix::from_diagonal(eig.eigenvalues());
            let rebuilt = &(&v.transpose() * &lambda) * v;
            assert!(rebuilt.approx_eq(&a, TOL), "n = {}", n);
            assert!((v * &v.transpose()).approx_eq(&DynMatrix::eye(n, 0.0), TOL));
            for w in eig.eigenvalues().windows(2) {
                assert!(w[0] <= w[1]);
            }
        }
    }

    #[test]
    fn known_values() {
        let a = DynMatrix::from_rows(3, 3, &[2.0, -1.0, 0.0, -1.0, 2.0, -1.0, 0.0, -1.0, 2.0]);
        let eig = SymmetricEigen::new(&a).unwrap();
        let s = 2.0_f64.sqrt();
        let expected = [2.0 - s, 2.0, 2.0 + s];
        for i in 0..3 {
            assert_near(eig.eigenvalues()[i], expected[i], TOL, "λ");
            let x = eig.eigenvector(i).unwrap();
            let ax = a.mul_vec(&x);
            for k in 0..3 {
                assert_near(ax[k], expected[i] * x[k], TOL, "A·x = λ·x");
            }
        }
    }

    #[test]
    fn values_only() {
        let a = symmetric(6);
        let settings = EigenSettings {
            compute_vectors: false,
            ..EigenSettings::default()
        };
        let fast = SymmetricEigen::with_settings(&a, settings).unwrap();
        let full = SymmetricEigen::new(&a).unwrap();
        assert!(fast.eigenvector(0).is_none());
        assert_eq!(fast.number_of_eigenvalues(), 6);
        for i in 0..6 {
            assert_near(fast.eigenvalues()[i], full.eigenvalues()[i], TOL, "λ");
            assert_eq!(fast.eigenvalue(i).im, 0.0);
        }
    }

    #[test]
    fn zero_and_identity() {
        let z = SymmetricEigen::new(&DynMatrix::zeros(3, 3, 0.0_f64)).unwrap();
        assert_eq!(z.eigenvalues(), &[0.0, 0.0, 0.0]);
        assert_eq!(z.eigenvectors(), &DynMatrix::eye(3, 0.0));

        let id = SymmetricEigen::new(&DynMatrix::eye(4, 0.0_f64)).unwrap();
        assert!(id.eigenvalues().iter().all(|&l| l == 1.0));
    }

    #[test]
    #[should_panic(expected = "square")]
    fn rectangular_panics() {
        let _ = SymmetricEigen::new(&DynMatrix::zeros(2, 3, 0.0_f64));
    }

    #[test]
    fn extreme_magnitudes_converge() {
        let s2 = 2.0_f64.sqrt();
        let cases = [
            (DynMatrix::from_rows(2, 2, &[1.0, 1.0, 1.0, 1.0]), vec![0.0, 2.0]),
            (
                DynMatrix::from_rows(3, 3, &[1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 0.0, 1.0, 1.0]),
                vec![1.0 - s2, 1.0, 1.0 + s2],
            ),
        ];
        for scale in [1e-170, 1e160] {
            for (a, expected) in &cases {
                let eig = SymmetricEigen::new(&(a * scale)).unwrap();
                for (l, e) in eig.eigenvalues().iter().zip(expected) {
                    assert_near(l / scale, *e, TOL, "λ / scale");
                }
                let v = eig.eigenvectors();
                let n = a.nrows();
                assert!((v * &v.transpose()).approx_eq(&DynMatrix::eye(n, 0.0), TOL));
            }
        }
    }
}
