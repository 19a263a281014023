//! Forward and back substitution on packed row-major triangular factors.
//!
//! Each routine solves in place: `b` enters as the right-hand side and
//! leaves as the solution. The system order is `b.len()`, so a square
//! triangle stored in the leading block of a larger packed matrix (the `R`
//! of a tall QR, for example) can be solved directly. Only the relevant
//! triangle of `t` is read; whatever the other triangle holds is ignored.
//!
//! ```
//! use densela::backend::Software;
//! use densela::linalg::triangular::{solve_lower, solve_upper};
//! use densela::DynMatrix;
//!
//! let t = DynMatrix::from_rows(2, 2, &[2.0_f64, 1.0, 4.0, 3.0]);
//! let mut b = [2.0, 10.0];
//! solve_lower(&Software, &t, &mut b); // [[2, 0], [4, 3]] x = b
//! assert_eq!(b, [1.0, 2.0]);
//!
//! let mut b = [4.0, 6.0];
//! solve_upper(&Software, &t, &mut b); // [[2, 1], [0, 3]] x = b
//! assert_eq!(b, [1.0, 2.0]);
//! ```

use crate::backend::Kernels;
use crate::traits::{FloatScalar, MatrixRef};

#[inline]
fn check_order<T>(t: &impl MatrixRef<T>, n: usize) {
    assert!(
        t.nrows() >= n && t.ncols() >= n,
        "triangular factor {}x{} is smaller than system order {}",
        t.nrows(),
        t.ncols(),
        n,
    );
}

/// Solve `L·x = b` with `L` lower triangular.
pub fn solve_lower<T: FloatScalar, K: Kernels<T>>(k: &K, l: &impl MatrixRef<T>, b: &mut [T]) {
    let n = b.len();
    check_order(l, n);
    for i in 0..n {
        let row = l.row_as_slice(i, 0);
        let (head, tail) = b.split_at_mut(i);
        tail[0] = (tail[0] - k.dot(&row[..i], head)) / row[i];
    }
}

/// Solve `L·x = b` with `L` unit lower triangular (diagonal taken as one,
/// whatever is stored there).
pub fn solve_unit_lower<T: FloatScalar, K: Kernels<T>>(k: &K, l: &impl MatrixRef<T>, b: &mut [T]) {
    let n = b.len();
    check_order(l, n);
    for i in 1..n {
        let row = l.row_as_slice(i, 0);
        let (head, tail) = b.split_at_mut(i);
        tail[0] = tail[0] - k.dot(&row[..i], head);
    }
}

/// Solve `U·x = b` with `U` upper triangular.
pub fn solve_upper<T: FloatScalar, K: Kernels<T>>(k: &K, u: &impl MatrixRef<T>, b: &mut [T]) {
    let n = b.len();
    check_order(u, n);
    for i in (0..n).rev() {
        let row = u.row_as_slice(i, 0);
        let (head, tail) = b.split_at_mut(i + 1);
        let sum = k.dot(&row[i + 1..n], tail);
        head[i] = (head[i] - sum) / row[i];
    }
}

/// Solve `Lᵀ·x = b` with `L` lower triangular, without forming `Lᵀ`.
///
/// Runs column-oriented on `Lᵀ`, which is row-oriented on `L`.
pub fn solve_transpose_lower<T: FloatScalar, K: Kernels<T>>(
    k: &K,
    l: &impl MatrixRef<T>,
    b: &mut [T],
) {
    let n = b.len();
    check_order(l, n);
    for i in (0..n).rev() {
        let row = l.row_as_slice(i, 0);
        let (head, tail) = b.split_at_mut(i);
        tail[0] = tail[0] / row[i];
        k.axpy_neg(head, tail[0], &row[..i]);
    }
}

/// Solve `Uᵀ·x = b` with `U` upper triangular, without forming `Uᵀ`.
pub fn solve_transpose_upper<T: FloatScalar, K: Kernels<T>>(
    k: &K,
    u: &impl MatrixRef<T>,
    b: &mut [T],
) {
    let n = b.len();
    check_order(u, n);
    for i in 0..n {
        let row = u.row_as_slice(i, 0);
        let (head, tail) = b.split_at_mut(i + 1);
        head[i] = head[i] / row[i];
        k.axpy_neg(&mut tail[..n - i - 1], head[i], &row[i + 1..n]);
    }
}

/// Conditioning estimate of a triangular factor: `|Π t_ii / max|t_ii||`
/// over the leading `min(m, n)` diagonal.
///
/// Zero means exactly singular, values near one mean well conditioned, and
/// the result does not change when `t` is scaled.
pub fn quality<T: FloatScalar>(t: &impl MatrixRef<T>) -> T {
    let n = t.nrows().min(t.ncols());
    let max = (0..n).fold(T::zero(), |m, i| m.max(t.get(i, i).abs()));
    if max == T::zero() {
        return T::zero();
    }
    (0..n).fold(T::one(), |q, i| q * (*t.get(i, i) / max)).abs()
}
