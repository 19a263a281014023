use log::debug;

use crate::backend::Software;
use crate::linalg::householder::{
    accumulate_reflectors, make_reflector, rank1_update_mult_l, rank1_update_mult_r,
};
use crate::linalg::result::BidiagonalResult;
use crate::linalg::LOG_TARGET;
use crate::traits::FloatScalar;
use crate::DynMatrix;

/// Householder reduction of a general `m x n` matrix to upper bidiagonal
/// form, `A = U·B·Vᵀ`.
///
/// Step `k` alternates a left reflector that clears column `k` below the
/// diagonal with a right reflector that clears row `k` past the
/// superdiagonal.
///
/// Packed layout of `ubv` (`m x n`): the diagonal and superdiagonal hold
/// `B`; below the diagonal, column `k` holds left reflector `k`; right of
/// the superdiagonal, row `k` holds right reflector `k`. Leading ones are
/// implicit. A zero `γ` marks a skipped (identity) step.
///
/// # Example
///
/// ```
/// use densela::DynMatrix;
/// use densela::linalg::{BidiagonalDecomposition, BidiagonalResult};
///
/// let a = DynMatrix::from_rows(3, 2, &[1.0_f64, 2.0, 3.0, 4.0, 5.0, 6.0]);
/// let bd = BidiagonalDecomposition::new(&a);
/// let (u, b, v) = (bd.get_u(false, true), bd.get_b(true), bd.get_v(false, true));
/// assert!((&(&u * &b) * &v.transpose()).approx_eq(&a, 1e-12));
/// ```
#[derive(Debug, Clone)]
pub struct BidiagonalDecomposition<T> {
    ubv: DynMatrix<T>,
    gammas_u: Vec<T>,
    gammas_v: Vec<T>,
}

impl<T: FloatScalar> BidiagonalDecomposition<T> {
    pub fn new(a: &DynMatrix<T>) -> Self {
        let m = a.nrows();
        let n = a.ncols();
        let min = m.min(n);
        let mut ubv = a.clone();
        let mut gammas_u = vec![T::zero(); min];
        let mut gammas_v = vec![T::zero(); min];
        let mut u = vec![T::zero(); m.max(n)];
        let mut w = vec![T::zero(); n];

        for k in 0..min {
            // Left: clear ubv[k+1.., k]
            for i in k..m {
                u[i] = ubv[(i, k)];
            }
            match make_reflector(&mut u[k..m]) {
                Some(h) => {
                    gammas_u[k] = h.gamma;
                    rank1_update_mult_l(&Software, &mut ubv, &u, h.gamma, k + 1, k, m, &mut w);
                    ubv[(k, k)] = -h.tau;
                    for i in (k + 1)..m {
                        ubv[(i, k)] = u[i];
                    }
                }
                None => debug!(target: LOG_TARGET, "bidiagonal: column {} is zero", k),
            }

            // Right: clear ubv[k, k+2..]
            if k + 1 < n {
                u[k + 1..n].copy_from_slice(&ubv.row(k)[k + 1..]);
                if let Some(h) = make_reflector(&mut u[k + 1..n]) {
                    gammas_v[k] = h.gamma;
                    rank1_update_mult_r(&Software, &mut ubv, &u, h.gamma, k + 1, k + 1, n);
                    ubv[(k, k + 1)] = -h.tau;
                    ubv.row_mut(k)[k + 2..].copy_from_slice(&u[k + 2..n]);
                }
            }
        }

        Self {
            ubv,
            gammas_u,
            gammas_v,
        }
    }

    /// The packed factorization.
    pub fn packed(&self) -> &DynMatrix<T> {
        &self.ubv
    }

    /// Width of the compact `B`: one extra column when the input is wide.
    fn compact_width(&self) -> usize {
        let (m, n) = (self.ubv.nrows(), self.ubv.ncols());
        let min = m.min(n);
        if n > m {
            min + 1
        } else {
            min
        }
    }

    fn load_u(&self, k: usize, u: &mut [T]) -> Option<(usize, T)> {
        let gamma = self.gammas_u[k];
        if gamma == T::zero() {
            return None;
        }
        u[k] = T::one();
        for i in (k + 1)..self.ubv.nrows() {
            u[i] = self.ubv[(i, k)];
        }
        Some((k, gamma))
    }

    fn load_v(&self, k: usize, u: &mut [T]) -> Option<(usize, T)> {
        let gamma = self.gammas_v[k];
        if gamma == T::zero() {
            return None;
        }
        let n = self.ubv.ncols();
        u[k + 1] = T::one();
        u[k + 2..n].copy_from_slice(&self.ubv.row(k)[k + 2..]);
        Some((k + 1, gamma))
    }
}

impl<T: FloatScalar> BidiagonalResult<T> for BidiagonalDecomposition<T> {
    fn get_b(&self, compact: bool) -> DynMatrix<T> {
        let (m, n) = (self.ubv.nrows(), self.ubv.ncols());
        let (rows, cols) = if compact {
            (m.min(n), self.compact_width())
        } else {
            (m, n)
        };
        let mut b = DynMatrix::zeros(rows, cols, T::zero());
        for i in 0..m.min(n) {
            b[(i, i)] = self.ubv[(i, i)];
            if i + 1 < cols {
                b[(i, i + 1)] = self.ubv[(i, i + 1)];
            }
        }
        b
    }

    fn get_u(&self, transpose: bool, compact: bool) -> DynMatrix<T> {
        let m = self.ubv.nrows();
        let k = if compact { m.min(self.ubv.ncols()) } else { m };
        let mut u = if transpose {
            DynMatrix::identity(k, m)
        } else {
            DynMatrix::identity(m, k)
        };
        accumulate_reflectors(&Software, &mut u, self.gammas_u.len(), transpose, |r, buf| {
            self.load_u(r, buf)
        });
        u
    }

    fn get_v(&self, transpose: bool, compact: bool) -> DynMatrix<T> {
        let n = self.ubv.ncols();
        let k = if compact { self.compact_width() } else { n };
        let mut v = if transpose {
            DynMatrix::identity(k, n)
        } else {
            DynMatrix::identity(n, k)
        };
        accumulate_reflectors(&Software, &mut v, self.gammas_v.len(), transpose, |r, buf| {
            self.load_v(r, buf)
        });
        v
    }

    fn diagonal(&self) -> (Vec<T>, Vec<T>) {
        let min = self.ubv.nrows().min(self.ubv.ncols());
        let diag = (0..min).map(|i| self.ubv[(i, i)]).collect();
        let off = (0..self.compact_width().saturating_sub(1)).map(|i| self.ubv[(i, i + 1)]).collect();
        (diag, off)
    }
}
