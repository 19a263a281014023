use log::debug;

use crate::backend::{Kernels, Software};
use crate::linalg::householder::{accumulate_reflectors, make_reflector};
use crate::linalg::result::QrResult;
use crate::linalg::LOG_TARGET;
use crate::traits::FloatScalar;
use crate::DynMatrix;

/// Householder QR decomposition that caches the input column-wise.
///
/// The matrix is stored transposed (`n x m`), so every column of `A` and
/// every reflector is a contiguous row and both the reflector construction
/// and its application are plain dot/axpy sweeps. Same factors as
/// [`QrDecomposition`](crate::linalg::QrDecomposition); faster when `A` has
/// many more rows than columns.
///
/// Packed layout of `qr_t`: row `k` holds column `k` of the factorization,
/// i.e. `R[0..=k, k]` in entries `0..=k` and reflector `k` (leading `1`
/// implicit) in entries `k+1..m`.
#[derive(Debug, Clone)]
pub struct QrColumnDecomposition<T, K = Software> {
    qr_t: DynMatrix<T>,
    gammas: Vec<T>,
    degenerate: bool,
    kernels: K,
}

impl<T: FloatScalar> QrColumnDecomposition<T> {
    pub fn new(a: &DynMatrix<T>) -> Self {
        Self::with_kernels(a, Software)
    }
}

impl<T: FloatScalar, K: Kernels<T>> QrColumnDecomposition<T, K> {
    pub fn with_kernels(a: &DynMatrix<T>, kernels: K) -> Self {
        let m = a.nrows();
        let n = a.ncols();
        let min = m.min(n);
        let mut qr_t = a.transpose();
        let mut gammas = vec![T::zero(); min];
        let mut degenerate = false;

        for j in 0..min {
            let Some(h) = make_reflector(&mut qr_t.row_mut(j)[j..m]) else {
                debug!(target: LOG_TARGET, "QR: column {} is zero, reflector skipped", j);
                degenerate = true;
                continue;
            };
            gammas[j] = h.gamma;

            for i in (j + 1)..n {
                let (u, col) = qr_t.two_rows_mut(j, i);
                let (u, col) = (&u[j..m], &mut col[j..m]);
                let d = h.gamma * kernels.dot(u, col);
                kernels.axpy_neg(col, d, u);
            }
            qr_t[(j, j)] = -h.tau;
        }

        Self {
            qr_t,
            gammas,
            degenerate,
            kernels,
        }
    }

    /// The packed, transposed factorization.
    pub fn packed_transposed(&self) -> &DynMatrix<T> {
        &self.qr_t
    }

    pub fn kernels(&self) -> &K {
        &self.kernels
    }

    /// `b ← Qᵀ·b` for a vector of length `m`.
    pub fn apply_qt(&self, b: &mut [T]) {
        assert_eq!(b.len(), self.qr_t.ncols(), "vector length {} does not match {} rows", b.len(), self.qr_t.ncols());
        for k in 0..self.gammas.len() {
            self.reflect(k, b);
        }
    }

    /// `b ← Q·b` for a vector of length `m`.
    pub fn apply_q(&self, b: &mut [T]) {
        assert_eq!(b.len(), self.qr_t.ncols(), "vector length {} does not match {} rows", b.len(), self.qr_t.ncols());
        for k in (0..self.gammas.len()).rev() {
            self.reflect(k, b);
        }
    }

    fn reflect(&self, k: usize, b: &mut [T]) {
        let gamma = self.gammas[k];
        if gamma == T::zero() {
            return;
        }
        let u = &self.qr_t.row(k)[k + 1..];
        let (head, tail) = b[k..].split_at_mut(1);
        let d = gamma * (head[0] + self.kernels.dot(u, tail));
        head[0] = head[0] - d;
        self.kernels.axpy_neg(tail, d, u);
    }

    fn load_reflector(&self, k: usize, u: &mut [T]) -> Option<(usize, T)> {
        let gamma = self.gammas[k];
        if gamma == T::zero() {
            return None;
        }
        let m = self.qr_t.ncols();
        u[k] = T::one();
        u[k + 1..m].copy_from_slice(&self.qr_t.row(k)[k + 1..]);
        Some((k, gamma))
    }
}

impl<T: FloatScalar, K: Kernels<T>> QrResult<T> for QrColumnDecomposition<T, K> {
    fn get_q(&self, compact: bool) -> DynMatrix<T> {
        let m = self.qr_t.ncols();
        let cols = if compact { m.min(self.qr_t.nrows()) } else { m };
        let mut q = DynMatrix::identity(m, cols);
        accumulate_reflectors(&self.kernels, &mut q, self.gammas.len(), false, |k, u| {
            self.load_reflector(k, u)
        });
        q
    }

    fn get_r(&self, compact: bool) -> DynMatrix<T> {
        let (n, m) = (self.qr_t.nrows(), self.qr_t.ncols());
        let rows = if compact { m.min(n) } else { m };
        DynMatrix::from_fn(rows, n, |i, j| if j >= i { self.qr_t[(j, i)] } else { T::zero() })
    }

    fn gammas(&self) -> &[T] {
        &self.gammas
    }

    fn is_degenerate(&self) -> bool {
        self.degenerate
    }
}
