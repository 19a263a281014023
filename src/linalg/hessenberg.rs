use log::debug;

use crate::backend::Software;
use crate::linalg::householder::{
    accumulate_reflectors, make_reflector, rank1_update_mult_l, rank1_update_mult_r,
};
use crate::linalg::result::HessenbergResult;
use crate::linalg::LOG_TARGET;
use crate::traits::FloatScalar;
use crate::DynMatrix;

/// Orthogonal similarity of a general square matrix to upper Hessenberg
/// form, `A = Q·H·Qᵀ`.
///
/// Reflector `k` clears column `k` below the subdiagonal and is applied from
/// both sides. Packed layout of `qh`: the Hessenberg part (upper triangle
/// plus subdiagonal) holds `H`; below the subdiagonal, column `k` holds
/// reflector `k` (leading one at row `k+1`, implicit).
///
/// # Example
///
/// ```
/// use densela::DynMatrix;
/// use densela::linalg::{HessenbergDecomposition, HessenbergResult};
///
/// let a = DynMatrix::from_rows(3, 3, &[4.0_f64, 1.0, -2.0, 1.0, 2.0, 0.0, -2.0, 0.0, 3.0]);
/// let hd = HessenbergDecomposition::new(&a);
/// let (q, h) = (hd.get_q(false), hd.get_h());
/// assert_eq!(h[(2, 0)], 0.0);
/// assert!((&(&q * &h) * &q.transpose()).approx_eq(&a, 1e-12));
/// ```
#[derive(Debug, Clone)]
pub struct HessenbergDecomposition<T> {
    qh: DynMatrix<T>,
    gammas: Vec<T>,
}

impl<T: FloatScalar> HessenbergDecomposition<T> {
    pub fn new(a: &DynMatrix<T>) -> Self {
        let n = a.nrows();
        assert!(a.is_square(), "Hessenberg decomposition requires a square matrix, got {}x{}", n, a.ncols());

        let mut qh = a.clone();
        let steps = n.saturating_sub(2);
        let mut gammas = vec![T::zero(); steps];
        let mut u = vec![T::zero(); n];
        let mut w = vec![T::zero(); n];

        for k in 0..steps {
            for i in (k + 1)..n {
                u[i] = qh[(i, k)];
            }
            let Some(h) = make_reflector(&mut u[k + 1..n]) else {
                debug!(target: LOG_TARGET, "Hessenberg: column {} already reduced", k);
                continue;
            };
            gammas[k] = h.gamma;

            rank1_update_mult_l(&Software, &mut qh, &u, h.gamma, k + 1, k + 1, n, &mut w);
            rank1_update_mult_r(&Software, &mut qh, &u, h.gamma, 0, k + 1, n);

            qh[(k + 1, k)] = -h.tau;
            for i in (k + 2)..n {
                qh[(i, k)] = u[i];
            }
        }

        Self { qh, gammas }
    }

    /// The packed factorization.
    pub fn packed(&self) -> &DynMatrix<T> {
        &self.qh
    }

    fn load_reflector(&self, k: usize, u: &mut [T]) -> Option<(usize, T)> {
        let gamma = self.gammas[k];
        if gamma == T::zero() {
            return None;
        }
        u[k + 1] = T::one();
        for i in (k + 2)..self.qh.nrows() {
            u[i] = self.qh[(i, k)];
        }
        Some((k + 1, gamma))
    }
}

impl<T: FloatScalar> HessenbergResult<T> for HessenbergDecomposition<T> {
    fn get_h(&self) -> DynMatrix<T> {
        let n = self.qh.nrows();
        DynMatrix::from_fn(n, n, |i, j| if i <= j + 1 { self.qh[(i, j)] } else { T::zero() })
    }

    fn get_q(&self, transposed: bool) -> DynMatrix<T> {
        let n = self.qh.nrows();
        let mut q = DynMatrix::eye(n, T::zero());
        accumulate_reflectors(&Software, &mut q, self.gammas.len(), transposed, |k, u| {
            self.load_reflector(k, u)
        });
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    #[test]
    fn reconstruction_and_structure() {
        let a = DynMatrix::from_fn(5, 5, |i, j| ((i * 7 + j * 3) % 11) as f64 - 5.0);
        let hd = HessenbergDecomposition::new(&a);
        let h = hd.get_h();
        let q = hd.get_q(false);

        for i in 0..5 {
            for j in 0..5 {
                if i > j + 1 {
                    assert_eq!(h[(i, j)], 0.0);
                }
            }
        }
        assert!((&(&q * &h) * &q.transpose()).approx_eq(&a, TOL));
        assert!(q.transpose_mul(&q).approx_eq(&DynMatrix::eye(5, 0.0), TOL));
        assert!(hd.get_q(true).approx_eq(&q.transpose(), TOL));
    }

    #[test]
    fn already_hessenberg() {
        let a = DynMatrix::from_rows(3, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 0.0, 7.0, 8.0]);
        let hd = HessenbergDecomposition::new(&a);
        assert!((&(&hd.get_q(false) * &hd.get_h()) * &hd.get_q(true)).approx_eq(&a, TOL));
    }

    #[test]
    fn small_and_zero() {
        let one = DynMatrix::from_rows(1, 1, &[3.0_f64]);
        assert_eq!(HessenbergDecomposition::new(&one).get_h(), one);

        let z = DynMatrix::zeros(4, 4, 0.0_f64);
        let hd = HessenbergDecomposition::new(&z);
        assert_eq!(hd.get_q(false), DynMatrix::eye(4, 0.0));
        assert_eq!(hd.get_h(), z);
    }
}
