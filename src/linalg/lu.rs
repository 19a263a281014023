use log::debug;

use crate::backend::{Kernels, Software};
use crate::linalg::result::LuResult;
use crate::linalg::triangular::{solve_unit_lower, solve_upper};
use crate::linalg::LOG_TARGET;
use crate::traits::{FloatScalar, MatrixRef};
use crate::DynMatrix;

/// Crout LU factorization with partial (row) pivoting, column by column.
///
/// Each column is copied into `vv` first, so the inner products run over a
/// contiguous cache and a contiguous row of the packed factor instead of
/// striding down a row-major column. Works for any `m x n` shape.
///
/// On return `lu` packs both factors: the upper triangle including the
/// diagonal is `U`, the strict lower triangle is `L` (unit diagonal
/// implied). `pivot[i]` is the original row now in row `i` and the return
/// value is the permutation sign.
pub(crate) fn crout_in_place<T: FloatScalar, K: Kernels<T>>(
    k: &K,
    lu: &mut DynMatrix<T>,
    pivot: &mut [usize],
    vv: &mut [T],
) -> T {
    let m = lu.nrows();
    let n = lu.ncols();
    debug_assert_eq!(pivot.len(), m);
    debug_assert!(vv.len() >= m);

    for (i, p) in pivot.iter_mut().enumerate() {
        *p = i;
    }
    let mut sign = T::one();

    for j in 0..n {
        for i in 0..m {
            vv[i] = lu[(i, j)];
        }

        // Apply the previous columns' eliminations to column j
        for i in 0..m {
            let kmax = i.min(j);
            let sum = k.dot(&lu.row(i)[..kmax], &vv[..kmax]);
            vv[i] = vv[i] - sum;
            lu[(i, j)] = vv[i];
        }

        // Pivot on the largest remaining magnitude
        let mut p = j;
        if j < m {
            let mut max = vv[j].abs();
            for i in (j + 1)..m {
                let v = vv[i].abs();
                if v > max {
                    max = v;
                    p = i;
                }
            }
        }

        if p != j {
            lu.swap_rows(p, j);
            pivot.swap(p, j);
            sign = -sign;
        }

        if j < m {
            let d = lu[(j, j)];
            if d != T::zero() {
                for i in (j + 1)..m {
                    lu[(i, j)] = lu[(i, j)] / d;
                }
            }
        }
    }

    sign
}

/// LU decomposition `P·A = L·U` of a general `m x n` matrix.
///
/// A zero pivot does not abort the factorization; it is recorded and
/// reported by [`is_singular`](LuResult::is_singular).
///
/// # Example
///
/// ```
/// use densela::DynMatrix;
/// use densela::linalg::{LuDecomposition, LuResult};
///
/// let a = DynMatrix::from_rows(2, 2, &[2.0_f64, 1.0, 5.0, 3.0]);
/// let lu = LuDecomposition::new(&a);
/// assert!(!lu.is_singular());
/// assert!((lu.determinant() - 1.0).abs() < 1e-12);
///
/// let x = lu.solve(&[4.0, 11.0]);
/// assert!((x[0] - 1.0).abs() < 1e-12);
/// assert!((x[1] - 2.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct LuDecomposition<T, K = Software> {
    lu: DynMatrix<T>,
    pivot: Vec<usize>,
    sign: T,
    kernels: K,
}

impl<T: FloatScalar> LuDecomposition<T> {
    /// Factor `a` with the software kernels.
    pub fn new(a: &DynMatrix<T>) -> Self {
        Self::with_kernels(a, Software)
    }
}

impl<T: FloatScalar, K: Kernels<T>> LuDecomposition<T, K> {
    /// Factor `a` with the given kernels.
    pub fn with_kernels(a: &DynMatrix<T>, kernels: K) -> Self {
        let mut lu = a.clone();
        let mut pivot = vec![0; a.nrows()];
        let mut vv = vec![T::zero(); a.nrows()];
        let sign = crout_in_place(&kernels, &mut lu, &mut pivot, &mut vv);

        let out = Self {
            lu,
            pivot,
            sign,
            kernels,
        };
        if out.is_singular() {
            debug!(target: LOG_TARGET, "LU of {}x{} matrix has a zero pivot", a.nrows(), a.ncols());
        }
        out
    }

    /// The packed factorization: `U` on and above the diagonal, the strict
    /// lower triangle holds `L` (unit diagonal implicit).
    pub fn packed(&self) -> &DynMatrix<T> {
        &self.lu
    }

    pub fn kernels(&self) -> &K {
        &self.kernels
    }

    /// Solve `A·x = b` for square `A`.
    ///
    /// The result is meaningless (inf/NaN) if the matrix is singular; check
    /// [`is_singular`](LuResult::is_singular) first.
    pub fn solve(&self, b: &[T]) -> Vec<T> {
        let mut x = vec![T::zero(); b.len()];
        self.solve_into(b, &mut x);
        x
    }

    /// Solve into a caller-provided buffer.
    pub fn solve_into(&self, b: &[T], x: &mut [T]) {
        let n = self.lu.nrows();
        assert!(self.lu.is_square(), "LU solve requires a square matrix");
        assert_eq!(b.len(), n, "right-hand side length {} does not match {}", b.len(), n);
        assert_eq!(x.len(), n, "solution length {} does not match {}", x.len(), n);

        for (xi, &p) in x.iter_mut().zip(&self.pivot) {
            *xi = b[p];
        }
        solve_unit_lower(&self.kernels, &self.lu, x);
        solve_upper(&self.kernels, &self.lu, x);
    }

    /// Inverse of a square matrix, one column of the identity at a time.
    pub fn inverse(&self) -> DynMatrix<T> {
        let n = self.lu.nrows();
        assert!(self.lu.is_square(), "LU inverse requires a square matrix");
        let mut inv = DynMatrix::zeros(n, n, T::zero());
        let mut e = vec![T::zero(); n];
        let mut col = vec![T::zero(); n];
        for j in 0..n {
            e.fill(T::zero());
            e[j] = T::one();
            self.solve_into(&e, &mut col);
            for i in 0..n {
                inv[(i, j)] = col[i];
            }
        }
        inv
    }
}

impl<T: FloatScalar, K: Kernels<T>> LuResult<T> for LuDecomposition<T, K> {
    fn get_l(&self) -> DynMatrix<T> {
        let m = self.lu.nrows();
        let k = m.min(self.lu.ncols());
        DynMatrix::from_fn(m, k, |i, j| {
            if i == j {
                T::one()
            } else if j < i {
                self.lu[(i, j)]
            } else {
                T::zero()
            }
        })
    }

    fn get_u(&self) -> DynMatrix<T> {
        let n = self.lu.ncols();
        let k = self.lu.nrows().min(n);
        DynMatrix::from_fn(k, n, |i, j| if j >= i { self.lu[(i, j)] } else { T::zero() })
    }

    fn get_p(&self, transposed: bool) -> DynMatrix<T> {
        let m = self.pivot.len();
        let mut p = DynMatrix::zeros(m, m, T::zero());
        for (i, &src) in self.pivot.iter().enumerate() {
            if transposed {
                p[(src, i)] = T::one();
            } else {
                p[(i, src)] = T::one();
            }
        }
        p
    }

    fn pivot(&self) -> &[usize] {
        &self.pivot
    }

    fn pivot_sign(&self) -> T {
        self.sign
    }

    fn is_singular(&self) -> bool {
        let k = self.lu.nrows().min(self.lu.ncols());
        (0..k).any(|i| self.lu.get(i, i).abs() < T::epsilon())
    }

    fn determinant(&self) -> T {
        assert!(
            self.lu.is_square(),
            "determinant requires a square matrix, got {}x{}",
            self.lu.nrows(),
            self.lu.ncols(),
        );
        (0..self.lu.nrows()).fold(self.sign, |d, i| d * self.lu[(i, i)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    fn assert_near(a: f64, b: f64, tol: f64, msg: &str) {
        assert!((a - b).abs() < tol, "{}: {} vs {} (diff {})", msg, a, b, (a - b).abs());
    }

    fn reconstruct(lu: &LuDecomposition<f64>) -> DynMatrix<f64> {
        &lu.get_p(true) * &(&lu.get_l() * &lu.get_u())
    }

    #[test]
    fn known_factors() {
        let a = DynMatrix::from_rows(3, 3, &[5.0, 2.0, 3.0, 1.5, -2.0, 8.0, -3.0, 4.7, -0.5]);
        let lu = LuDecomposition::new(&a);

        let l = DynMatrix::from_rows(3, 3, &[1.0, 0.0, 0.0, -0.6, 1.0, 0.0, 0.3, -0.44068, 1.0]);
        let u = DynMatrix::from_rows(3, 3, &[5.0, 2.0, 3.0, 0.0, 5.9, 1.3, 0.0, 0.0, 7.67288]);
        assert!(lu.get_l().approx_eq(&l, 1e-5), "L = {}", lu.get_l());
        assert!(lu.get_u().approx_eq(&u, 1e-5), "U = {}", lu.get_u());
        assert_eq!(lu.pivot(), &[0, 2, 1]);
        assert_eq!(lu.pivot_sign(), -1.0);
        assert!(reconstruct(&lu).approx_eq(&a, TOL));
    }

    #[test]
    fn permutation_convention() {
        let a = DynMatrix::from_rows(3, 3, &[1.0, 2.0, 3.0, 7.0, 1.0, 0.0, -2.0, 9.0, 4.0]);
        let lu = LuDecomposition::new(&a);
        let pa = &lu.get_p(false) * &a;
        assert!(pa.approx_eq(&(&lu.get_l() * &lu.get_u()), TOL));
        assert_eq!(lu.get_p(true), lu.get_p(false).transpose());
    }

    #[test]
    fn solve_and_inverse() {
        let a = DynMatrix::from_rows(3, 3, &[2.0, 1.0, -1.0, -3.0, -1.0, 2.0, -2.0, 1.0, 2.0]);
        let lu = LuDecomposition::new(&a);
        let x = lu.solve(&[8.0, -11.0, -3.0]);
        assert_near(x[0], 2.0, TOL, "x0");
        assert_near(x[1], 3.0, TOL, "x1");
        assert_near(x[2], -1.0, TOL, "x2");

        let inv = lu.inverse();
        assert!((&a * &inv).approx_eq(&DynMatrix::eye(3, 0.0), TOL));
    }

    #[test]
    fn determinant_with_swaps() {
        let a = DynMatrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        assert_near(LuDecomposition::new(&a).determinant(), -2.0, TOL, "det");
        let b = DynMatrix::from_rows(3, 3, &[6.0, 1.0, 1.0, 4.0, -2.0, 5.0, 2.0, 8.0, 7.0]);
        assert_near(LuDecomposition::new(&b).determinant(), -306.0, TOL, "det3");
    }

    #[test]
    fn singular_is_recorded() {
        let a = DynMatrix::from_rows(3, 3, &[1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 1.0, 0.0, 1.0]);
        let lu = LuDecomposition::new(&a);
        assert!(lu.is_singular());
        assert_near(lu.determinant(), 0.0, TOL, "det");
        assert!(reconstruct(&lu).approx_eq(&a, TOL));

        let z = LuDecomposition::new(&DynMatrix::zeros(3, 3, 0.0));
        assert!(z.is_singular());
        assert!(!z.get_u().has_uncountable());
    }

    #[test]
    fn rectangular_shapes() {
        let tall = DynMatrix::from_rows(4, 2, &[1.0, 2.0, 3.0, 4.0, -5.0, 6.0, 7.0, 0.5]);
        let lu = LuDecomposition::new(&tall);
        assert_eq!((lu.get_l().nrows(), lu.get_l().ncols()), (4, 2));
        assert_eq!((lu.get_u().nrows(), lu.get_u().ncols()), (2, 2));
        assert!(reconstruct(&lu).approx_eq(&tall, TOL));

        let wide = tall.transpose();
        let lu = LuDecomposition::new(&wide);
        assert_eq!((lu.get_l().nrows(), lu.get_l().ncols()), (2, 2));
        assert_eq!((lu.get_u().nrows(), lu.get_u().ncols()), (2, 4));
        assert!(reconstruct(&lu).approx_eq(&wide, TOL));
    }

    #[test]
    #[should_panic(expected = "square")]
    fn determinant_of_rectangular_panics() {
        let a = DynMatrix::zeros(2, 3, 0.0_f64);
        let _ = LuDecomposition::new(&a).determinant();
    }
}
