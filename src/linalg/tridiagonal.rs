use log::debug;

use crate::backend::{Kernels, Software};
use crate::linalg::householder::{accumulate_reflectors, make_reflector};
use crate::linalg::result::TridiagonalResult;
use crate::linalg::LOG_TARGET;
use crate::traits::FloatScalar;
use crate::DynMatrix;

/// Diagonal and off-diagonal of a symmetric tridiagonal matrix.
///
/// The eigen engine consumes this form destructively, so it can be copied
/// out (`copy_from`) and later exchanged back (`swap`) without reallocating.
#[derive(Debug, Clone, PartialEq)]
pub struct TridiagonalForm<T> {
    pub diag: Vec<T>,
    /// `off[i]` couples `diag[i]` and `diag[i + 1]`.
    pub off: Vec<T>,
}

impl<T: FloatScalar> TridiagonalForm<T> {
    pub fn new(diag: Vec<T>, off: Vec<T>) -> Self {
        assert_eq!(
            off.len() + 1,
            diag.len().max(1),
            "off-diagonal length {} does not fit diagonal length {}",
            off.len(),
            diag.len()
        );
        Self { diag, off }
    }

    pub fn len(&self) -> usize {
        self.diag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diag.is_empty()
    }

    /// Overwrite with `other`, reusing this form's allocations.
    pub fn copy_from(&mut self, other: &TridiagonalForm<T>) {
        self.diag.clear();
        self.diag.extend_from_slice(&other.diag);
        self.off.clear();
        self.off.extend_from_slice(&other.off);
    }

    /// Exchange contents with `other` in O(1).
    pub fn swap(&mut self, other: &mut TridiagonalForm<T>) {
        core::mem::swap(self, other);
    }

    /// Dense `n x n` matrix.
    pub fn to_matrix(&self) -> DynMatrix<T> {
        let n = self.diag.len();
        let mut t = DynMatrix::zeros(n, n, T::zero());
        for i in 0..n {
            t[(i, i)] = self.diag[i];
        }
        for (i, &e) in self.off.iter().enumerate() {
            t[(i, i + 1)] = e;
            t[(i + 1, i)] = e;
        }
        t
    }
}

/// Orthogonal similarity of a symmetric matrix to tridiagonal form,
/// `A = Q·T·Qᵀ`.
///
/// Reflector `k` is built from row `k` past the superdiagonal (equal to the
/// column by symmetry, and contiguous in row-major storage), then applied to
/// the trailing block as the symmetric rank-2 update
/// `A ← A - u·wᵀ - w·uᵀ`, `w = p - (γ/2)(uᵀp)·u`, `p = γ·A·u`.
///
/// Packed layout of `qt`: the diagonal and superdiagonal hold `T`; right of
/// the superdiagonal, row `k` holds reflector `k` (leading one at column
/// `k+1`, implicit). The strict lower triangle is scratch. Only the input's
/// upper triangle and diagonal need to be meaningful if it is exactly
/// symmetric; otherwise the full matrix is read.
#[derive(Debug, Clone)]
pub struct TridiagonalDecomposition<T> {
    qt: DynMatrix<T>,
    gammas: Vec<T>,
}

impl<T: FloatScalar> TridiagonalDecomposition<T> {
    pub fn new(a: &DynMatrix<T>) -> Self {
        let n = a.nrows();
        assert!(a.is_square(), "tridiagonal decomposition requires a square matrix, got {}x{}", n, a.ncols());

        let mut qt = a.clone();
        let steps = n.saturating_sub(2);
        let mut gammas = vec![T::zero(); steps];
        let mut u = vec![T::zero(); n];
        let mut p = vec![T::zero(); n];
        let k = Software;

        for s in 0..steps {
            let c0 = s + 1;
            u[c0..n].copy_from_slice(&qt.row(s)[c0..]);
            let Some(h) = make_reflector(&mut u[c0..n]) else {
                debug!(target: LOG_TARGET, "tridiagonal: row {} already reduced", s);
                continue;
            };
            let gamma = h.gamma;
            gammas[s] = gamma;

            // p = γ·A·u over the trailing block
            for i in c0..n {
                p[i] = gamma * k.dot(&qt.row(i)[c0..], &u[c0..n]);
            }
            let half = gamma / T::two() * k.dot(&u[c0..n], &p[c0..n]);
            for i in c0..n {
                p[i] = p[i] - half * u[i];
            }
            // A ← A - u·wᵀ - w·uᵀ  (p now holds w)
            for i in c0..n {
                let (ui, wi) = (u[i], p[i]);
                let row = &mut qt.row_mut(i)[c0..];
                k.axpy_neg(row, ui, &p[c0..n]);
                k.axpy_neg(row, wi, &u[c0..n]);
            }

            qt[(s, c0)] = -h.tau;
            qt[(c0, s)] = -h.tau;
            qt.row_mut(s)[c0 + 1..].copy_from_slice(&u[c0 + 1..n]);
        }

        Self { qt, gammas }
    }

    /// The packed factorization.
    pub fn packed(&self) -> &DynMatrix<T> {
        &self.qt
    }

    fn load_reflector(&self, k: usize, u: &mut [T]) -> Option<(usize, T)> {
        let gamma = self.gammas[k];
        if gamma == T::zero() {
            return None;
        }
        u[k + 1] = T::one();
        u[k + 2..].copy_from_slice(&self.qt.row(k)[k + 2..]);
        Some((k + 1, gamma))
    }
}

impl<T: FloatScalar> TridiagonalResult<T> for TridiagonalDecomposition<T> {
    fn get_t(&self) -> DynMatrix<T> {
        self.diagonal().to_matrix()
    }

    fn get_q(&self, transposed: bool) -> DynMatrix<T> {
        let n = self.qt.nrows();
        let mut q = DynMatrix::eye(n, T::zero());
        accumulate_reflectors(&Software, &mut q, self.gammas.len(), transposed, |k, u| {
            self.load_reflector(k, u)
        });
        q
    }

    fn diagonal(&self) -> TridiagonalForm<T> {
        let n = self.qt.nrows();
        TridiagonalForm {
            diag: (0..n).map(|i| self.qt[(i, i)]).collect(),
            off: (0..n.saturating_sub(1)).map(|i| self.qt[(i, i + 1)]).collect(),
        }
    }
}
