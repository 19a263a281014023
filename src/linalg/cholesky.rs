use log::debug;

use crate::backend::{Kernels, Software};
use crate::linalg::result::CholeskyResult;
use crate::linalg::triangular::{
    solve_lower, solve_transpose_lower, solve_transpose_upper, solve_unit_lower, solve_upper,
};
use crate::linalg::{LinalgError, LOG_TARGET};
use crate::traits::FloatScalar;
use crate::DynMatrix;

/// Which triangular factor a Cholesky decomposition produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Triangle {
    /// `A = L·Lᵀ`
    #[default]
    Lower,
    /// `A = Rᵀ·R`
    Upper,
}

/// Inner-product Cholesky, in place: on success the lower triangle of `t`
/// (diagonal included) holds `L` and the strict upper triangle is zeroed.
///
/// Only the upper triangle of the input is read, so the caller does not need
/// to keep the lower half symmetric. Entry `(i, j)` of `L` is one dot product
/// of two already-finished row prefixes.
pub(crate) fn cholesky_in_place<T: FloatScalar, K: Kernels<T>>(
    k: &K,
    t: &mut DynMatrix<T>,
) -> Result<(), LinalgError> {
    let n = t.nrows();
    assert!(t.is_square(), "Cholesky decomposition requires a square matrix, got {}x{}", n, t.ncols());

    let mut inv_diag = T::zero();
    for i in 0..n {
        for j in i..n {
            let sum = t[(i, j)] - k.dot(&t.row(i)[..i], &t.row(j)[..i]);
            if i == j {
                if sum.is_nan() || sum <= T::zero() {
                    debug!(target: LOG_TARGET, "Cholesky: pivot {} is not positive ({:?})", i, sum);
                    return Err(LinalgError::NotPositiveDefinite);
                }
                let d = sum.sqrt();
                t[(i, i)] = d;
                inv_diag = T::one() / d;
            } else {
                t[(j, i)] = sum * inv_diag;
            }
        }
    }

    for i in 0..n {
        for j in (i + 1)..n {
            t[(i, j)] = T::zero();
        }
    }
    Ok(())
}

fn transpose_square_in_place<T: Copy>(t: &mut DynMatrix<T>) {
    let n = t.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            let tmp = t[(i, j)];
            t[(i, j)] = t[(j, i)];
            t[(j, i)] = tmp;
        }
    }
}

/// Cholesky decomposition of a symmetric positive definite matrix, as either
/// `A = L·Lᵀ` or `A = Rᵀ·R` (chosen at construction).
///
/// Only the upper triangle of `A` is read.
///
/// # Example
///
/// ```
/// use densela::DynMatrix;
/// use densela::linalg::CholeskyDecomposition;
///
/// let a = DynMatrix::from_rows(3, 3, &[1.0_f64, 2.0, 4.0, 2.0, 13.0, 23.0, 4.0, 23.0, 90.0]);
/// let chol = CholeskyDecomposition::new(&a).unwrap();
/// let x = chol.solve(&[17.0, 97.0, 320.0]);
/// assert!((x[0] - 1.0).abs() < 1e-12);
/// assert!((x[1] - 2.0).abs() < 1e-12);
/// assert!((x[2] - 3.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct CholeskyDecomposition<T, K = Software> {
    t: DynMatrix<T>,
    triangle: Triangle,
    kernels: K,
}

impl<T: FloatScalar> CholeskyDecomposition<T> {
    /// Lower-triangular factorization `A = L·Lᵀ`.
    pub fn new(a: &DynMatrix<T>) -> Result<Self, LinalgError> {
        Self::with_kernels(a, Triangle::Lower, Software)
    }

    pub fn with_triangle(a: &DynMatrix<T>, triangle: Triangle) -> Result<Self, LinalgError> {
        Self::with_kernels(a, triangle, Software)
    }
}

impl<T: FloatScalar, K: Kernels<T>> CholeskyDecomposition<T, K> {
    pub fn with_kernels(a: &DynMatrix<T>, triangle: Triangle, kernels: K) -> Result<Self, LinalgError> {
        Self::from_owned(a.clone(), triangle, kernels)
    }

    /// Factor `a`, reusing its storage for the factor.
    pub fn from_owned(mut a: DynMatrix<T>, triangle: Triangle, kernels: K) -> Result<Self, LinalgError> {
        cholesky_in_place(&kernels, &mut a)?;
        if triangle == Triangle::Upper {
            transpose_square_in_place(&mut a);
        }
        Ok(Self {
            t: a,
            triangle,
            kernels,
        })
    }

    pub(crate) fn from_factor(t: DynMatrix<T>, triangle: Triangle, kernels: K) -> Self {
        Self { t, triangle, kernels }
    }

    pub fn triangle(&self) -> Triangle {
        self.triangle
    }

    /// The triangular factor without a copy.
    pub fn packed(&self) -> &DynMatrix<T> {
        &self.t
    }

    pub fn into_factor(self) -> DynMatrix<T> {
        self.t
    }

    /// Solve `A·x = b`.
    pub fn solve(&self, b: &[T]) -> Vec<T> {
        let mut x = b.to_vec();
        self.solve_in_place(&mut x);
        x
    }

    /// Solve `A·x = b` overwriting `b` with `x`.
    pub fn solve_in_place(&self, b: &mut [T]) {
        let n = self.t.nrows();
        assert_eq!(b.len(), n, "right-hand side length {} does not match {}", b.len(), n);
        match self.triangle {
            Triangle::Lower => {
                solve_lower(&self.kernels, &self.t, b);
                solve_transpose_lower(&self.kernels, &self.t, b);
            }
            Triangle::Upper => {
                solve_transpose_upper(&self.kernels, &self.t, b);
                solve_upper(&self.kernels, &self.t, b);
            }
        }
    }

    /// Determinant: product of the squared diagonal.
    pub fn det(&self) -> T {
        let n = self.t.nrows();
        (0..n).fold(T::one(), |d, i| {
            let v = self.t[(i, i)];
            d * v * v
        })
    }

    /// Log-determinant, finite even where `det` would overflow.
    pub fn ln_det(&self) -> T {
        let n = self.t.nrows();
        (0..n).fold(T::zero(), |s, i| s + self.t[(i, i)].ln()) * T::two()
    }

    /// Inverse `A⁻¹ = L⁻ᵀ·L⁻¹`, built from the inverse of the factor and
    /// filled symmetrically.
    pub fn inverse(&self) -> DynMatrix<T> {
        let n = self.t.nrows();
        let l = |i: usize, j: usize| match self.triangle {
            Triangle::Lower => self.t[(i, j)],
            Triangle::Upper => self.t[(j, i)],
        };

        let mut linv = DynMatrix::zeros(n, n, T::zero());
        for j in 0..n {
            linv[(j, j)] = T::one() / l(j, j);
            for i in (j + 1)..n {
                let mut sum = T::zero();
                for k in j..i {
                    sum = sum + l(i, k) * linv[(k, j)];
                }
                linv[(i, j)] = -sum / l(i, i);
            }
        }

        // Rows of linvᵀ are the columns of L⁻¹, contiguous for the dot products
        let linv_t = linv.transpose();
        let mut inv = DynMatrix::zeros(n, n, T::zero());
        for i in 0..n {
            for j in 0..=i {
                let s = self.kernels.dot(&linv_t.row(i)[i..], &linv_t.row(j)[i..]);
                inv[(i, j)] = s;
                inv[(j, i)] = s;
            }
        }
        inv
    }
}

impl<T: FloatScalar, K: Kernels<T>> CholeskyResult<T> for CholeskyDecomposition<T, K> {
    fn is_lower(&self) -> bool {
        self.triangle == Triangle::Lower
    }

    fn get_t(&self) -> DynMatrix<T> {
        self.t.clone()
    }

    fn determinant(&self) -> T {
        self.det()
    }
}

// ── LDLᵀ ────────────────────────────────────────────────────────────

/// Square-root-free Cholesky `A = L·D·Lᵀ` with `L` unit lower triangular
/// and `D` diagonal (all positive for an SPD input).
#[derive(Debug, Clone)]
pub struct LdlDecomposition<T, K = Software> {
    l: DynMatrix<T>,
    d: Vec<T>,
    kernels: K,
}

impl<T: FloatScalar> LdlDecomposition<T> {
    pub fn new(a: &DynMatrix<T>) -> Result<Self, LinalgError> {
        Self::with_kernels(a, Software)
    }
}

impl<T: FloatScalar, K: Kernels<T>> LdlDecomposition<T, K> {
    pub fn with_kernels(a: &DynMatrix<T>, kernels: K) -> Result<Self, LinalgError> {
        let n = a.nrows();
        assert!(a.is_square(), "LDL decomposition requires a square matrix, got {}x{}", n, a.ncols());
        let mut l = a.clone();
        let mut d = vec![T::zero(); n];
        let mut scaled = vec![T::zero(); n];

        for i in 0..n {
            // scaled[k] = L[i][k]·d[k], reused for every j in this row
            for k in 0..i {
                scaled[k] = l[(i, k)] * d[k];
            }
            for j in i..n {
                let sum = l[(i, j)] - kernels.dot(&scaled[..i], &l.row(j)[..i]);
                if i == j {
                    if sum.is_nan() || sum <= T::zero() {
                        debug!(target: LOG_TARGET, "LDL: pivot {} is not positive ({:?})", i, sum);
                        return Err(LinalgError::NotPositiveDefinite);
                    }
                    d[i] = sum;
                } else {
                    l[(j, i)] = sum / d[i];
                }
            }
        }

        for i in 0..n {
            l[(i, i)] = T::one();
            for j in (i + 1)..n {
                l[(i, j)] = T::zero();
            }
        }
        Ok(Self { l, d, kernels })
    }

    /// Unit lower-triangular factor.
    pub fn get_l(&self) -> DynMatrix<T> {
        self.l.clone()
    }

    /// Diagonal factor as a matrix.
    pub fn get_d(&self) -> DynMatrix<T> {
        DynMatrix::from_diagonal(&self.d)
    }

    /// Diagonal factor as a slice.
    pub fn diagonal(&self) -> &[T] {
        &self.d
    }

    pub fn det(&self) -> T {
        self.d.iter().fold(T::one(), |p, &v| p * v)
    }

    /// Solve `A·x = b`.
    pub fn solve(&self, b: &[T]) -> Vec<T> {
        let n = self.l.nrows();
        assert_eq!(b.len(), n, "right-hand side length {} does not match {}", b.len(), n);
        let mut x = b.to_vec();
        solve_unit_lower(&self.kernels, &self.l, &mut x);
        for (xi, &di) in x.iter_mut().zip(&self.d) {
            *xi = *xi / di;
        }
        solve_transpose_lower(&self.kernels, &self.l, &mut x);
        x
    }
}
