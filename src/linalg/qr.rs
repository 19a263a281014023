use log::debug;

use crate::backend::{Kernels, Software};
use crate::linalg::householder::{accumulate_reflectors, make_reflector, rank1_update_mult_l};
use crate::linalg::result::QrResult;
use crate::linalg::LOG_TARGET;
use crate::traits::FloatScalar;
use crate::DynMatrix;

/// Householder QR decomposition `A = Q·R` working directly on row-major
/// storage.
///
/// Packed layout of `qr` (`m x n`): the upper triangle including the
/// diagonal holds `R`; below the diagonal, column `k` holds reflector `k`
/// with its leading `1` implicit. `gammas[k]` is that reflector's scale;
/// zero marks a column that was already zero (identity step).
///
/// Each column is gathered into a contiguous buffer before its reflector is
/// built, and the reflector is applied to the trailing columns with
/// row-wise rank-1 updates. For tall matrices
/// [`QrColumnDecomposition`](crate::linalg::QrColumnDecomposition) is usually
/// faster.
///
/// # Example
///
/// ```
/// use densela::DynMatrix;
/// use densela::linalg::{QrDecomposition, QrResult};
///
/// let a = DynMatrix::from_rows(3, 2, &[1.0_f64, 2.0, 3.0, 4.0, 5.0, 6.0]);
/// let qr = QrDecomposition::new(&a);
/// let rebuilt = &qr.get_q(true) * &qr.get_r(true);
/// assert!(rebuilt.approx_eq(&a, 1e-12));
/// ```
#[derive(Debug, Clone)]
pub struct QrDecomposition<T, K = Software> {
    qr: DynMatrix<T>,
    gammas: Vec<T>,
    degenerate: bool,
    kernels: K,
}

impl<T: FloatScalar> QrDecomposition<T> {
    pub fn new(a: &DynMatrix<T>) -> Self {
        Self::with_kernels(a, Software)
    }
}

impl<T: FloatScalar, K: Kernels<T>> QrDecomposition<T, K> {
    pub fn with_kernels(a: &DynMatrix<T>, kernels: K) -> Self {
        let m = a.nrows();
        let n = a.ncols();
        let min = m.min(n);
        let mut qr = a.clone();
        let mut gammas = vec![T::zero(); min];
        let mut degenerate = false;
        let mut u = vec![T::zero(); m];
        let mut w = vec![T::zero(); n];

        for k in 0..min {
            for i in k..m {
                u[i] = qr[(i, k)];
            }
            let Some(h) = make_reflector(&mut u[k..m]) else {
                debug!(target: LOG_TARGET, "QR: column {} is zero, reflector skipped", k);
                degenerate = true;
                continue;
            };
            gammas[k] = h.gamma;

            rank1_update_mult_l(&kernels, &mut qr, &u, h.gamma, k + 1, k, m, &mut w);

            qr[(k, k)] = -h.tau;
            for i in (k + 1)..m {
                qr[(i, k)] = u[i];
            }
        }

        Self {
            qr,
            gammas,
            degenerate,
            kernels,
        }
    }

    /// The packed factorization.
    pub fn packed(&self) -> &DynMatrix<T> {
        &self.qr
    }

    fn load_reflector(&self, k: usize, u: &mut [T]) -> Option<(usize, T)> {
        let gamma = self.gammas[k];
        if gamma == T::zero() {
            return None;
        }
        u[k] = T::one();
        for i in (k + 1)..self.qr.nrows() {
            u[i] = self.qr[(i, k)];
        }
        Some((k, gamma))
    }

    /// `b ← Qᵀ·b` for a vector of length `m`.
    pub fn apply_qt(&self, b: &mut [T]) {
        let m = self.qr.nrows();
        assert_eq!(b.len(), m, "vector length {} does not match {} rows", b.len(), m);
        for k in 0..self.gammas.len() {
            self.reflect(k, b);
        }
    }

    /// `b ← Q·b` for a vector of length `m`.
    pub fn apply_q(&self, b: &mut [T]) {
        let m = self.qr.nrows();
        assert_eq!(b.len(), m, "vector length {} does not match {} rows", b.len(), m);
        for k in (0..self.gammas.len()).rev() {
            self.reflect(k, b);
        }
    }

    fn reflect(&self, k: usize, b: &mut [T]) {
        let gamma = self.gammas[k];
        if gamma == T::zero() {
            return;
        }
        let mut d = b[k];
        for i in (k + 1)..b.len() {
            d = d + self.qr[(i, k)] * b[i];
        }
        d = d * gamma;
        b[k] = b[k] - d;
        for i in (k + 1)..b.len() {
            b[i] = b[i] - d * self.qr[(i, k)];
        }
    }
}

impl<T: FloatScalar, K: Kernels<T>> QrResult<T> for QrDecomposition<T, K> {
    fn get_q(&self, compact: bool) -> DynMatrix<T> {
        let m = self.qr.nrows();
        let cols = if compact { m.min(self.qr.ncols()) } else { m };
        let mut q = DynMatrix::identity(m, cols);
        accumulate_reflectors(&self.kernels, &mut q, self.gammas.len(), false, |k, u| {
            self.load_reflector(k, u)
        });
        q
    }

    fn get_r(&self, compact: bool) -> DynMatrix<T> {
        let (m, n) = (self.qr.nrows(), self.qr.ncols());
        let rows = if compact { m.min(n) } else { m };
        DynMatrix::from_fn(rows, n, |i, j| if j >= i { self.qr[(i, j)] } else { T::zero() })
    }

    fn gammas(&self) -> &[T] {
        &self.gammas
    }

    fn is_degenerate(&self) -> bool {
        self.degenerate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    fn assert_orthonormal_cols(q: &DynMatrix<f64>, tol: f64) {
        let qtq = q.transpose_mul(q);
        assert!(
            qtq.approx_eq(&DynMatrix::eye(q.ncols(), 0.0), tol),
            "QᵀQ not identity: {}",
            qtq
        );
    }

    #[test]
    fn known_factors() {
        let a = DynMatrix::from_rows(3, 3, &[0.0, 3.0, 1.0, 0.0, 4.0, -2.0, 2.0, 1.0, 1.0]);
        let qr = QrDecomposition::new(&a);
        let q = DynMatrix::from_rows(3, 3, &[0.0, -0.6, 0.8, 0.0, -0.8, -0.6, -1.0, 0.0, 0.0]);
        let r = DynMatrix::from_rows(3, 3, &[-2.0, -1.0, -1.0, 0.0, -5.0, 1.0, 0.0, 0.0, 2.0]);
        assert!(qr.get_q(false).approx_eq(&q, 1e-6), "Q = {}", qr.get_q(false));
        assert!(qr.get_r(false).approx_eq(&r, 1e-6), "R = {}", qr.get_r(false));
        assert!(!qr.is_degenerate());
    }

    #[test]
    fn tall_compact_and_full() {
        let a = DynMatrix::from_fn(5, 3, |i, j| ((i + 1) * (j + 2)) as f64 + if i == j { 3.0 } else { -0.5 });
        let qr = QrDecomposition::new(&a);

        let qc = qr.get_q(true);
        let rc = qr.get_r(true);
        assert_eq!((qc.nrows(), qc.ncols()), (5, 3));
        assert_eq!((rc.nrows(), rc.ncols()), (3, 3));
        assert_orthonormal_cols(&qc, TOL);
        assert!((&qc * &rc).approx_eq(&a, TOL));

        let qf = qr.get_q(false);
        let rf = qr.get_r(false);
        assert_eq!((qf.nrows(), qf.ncols()), (5, 5));
        assert_eq!((rf.nrows(), rf.ncols()), (5, 3));
        assert_orthonormal_cols(&qf, TOL);
        assert!((&qf * &rf).approx_eq(&a, TOL));
    }

    #[test]
    fn wide_matrix() {
        let a = DynMatrix::from_rows(2, 4, &[1.0, -2.0, 3.0, 0.5, 4.0, 1.0, -1.0, 2.0]);
        let qr = QrDecomposition::new(&a);
        assert_eq!(qr.get_r(true).nrows(), 2);
        assert!((&qr.get_q(true) * &qr.get_r(true)).approx_eq(&a, TOL));
    }

    #[test]
    fn apply_q_round_trip() {
        let a: DynMatrix<f64> = DynMatrix::from_rows(3, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let qr = QrDecomposition::new(&a);
        let b = [1.0, -1.0, 2.0];
        let mut v = b;
        qr.apply_qt(&mut v);
        let qt_b = qr.get_q(false).transpose().mul_vec(&b);
        for i in 0..3 {
            assert!((v[i] - qt_b[i]).abs() < TOL);
        }
        qr.apply_q(&mut v);
        for i in 0..3 {
            assert!((v[i] - b[i]).abs() < TOL);
        }
    }

    #[test]
    fn zero_matrix() {
        let a = DynMatrix::zeros(4, 3, 0.0_f64);
        let qr = QrDecomposition::new(&a);
        assert!(qr.is_degenerate());
        assert_eq!(qr.get_q(false), DynMatrix::eye(4, 0.0));
        assert_eq!(qr.get_r(false), DynMatrix::zeros(4, 3, 0.0));
    }

    #[test]
    fn zero_column_in_middle() {
        let a = DynMatrix::from_rows(3, 3, &[1.0, 0.0, 2.0, 2.0, 0.0, 1.0, -1.0, 0.0, 3.0]);
        let qr = QrDecomposition::new(&a);
        assert!(qr.is_degenerate());
        assert_eq!(qr.gammas()[1], 0.0);
        assert!((&qr.get_q(false) * &qr.get_r(false)).approx_eq(&a, TOL));
    }
}
