//! Householder reflector primitives shared by QR, bidiagonal, Hessenberg
//! and tridiagonal reductions, plus the Givens rotation used by the
//! implicit-QR engines.
//!
//! A reflector is stored as `(u, γ)` with `u[start] = 1` implicit and
//! `H = I - γ·u·uᵀ`. Building one from a vector `x` scales `x` by its
//! largest magnitude first, so `‖x‖` never overflows, and leaves
//! `H·x = -τ·e₀`.

use crate::backend::Kernels;
use crate::traits::{FloatScalar, MatrixMut};
use crate::DynMatrix;

/// Largest absolute value in `u`.
#[inline]
pub(crate) fn find_max<T: FloatScalar>(u: &[T]) -> T {
    u.iter().fold(T::zero(), |m, &x| m.max(x.abs()))
}

#[inline]
pub(crate) fn divide_elements<T: FloatScalar>(u: &mut [T], val: T) {
    for x in u.iter_mut() {
        *x = *x / val;
    }
}

/// Divide `u` by `max` and return `τ = sign(u[0])·‖u‖` of the scaled vector.
pub(crate) fn compute_tau_and_divide<T: FloatScalar>(u: &mut [T], max: T) -> T {
    let mut norm = T::zero();
    for x in u.iter_mut() {
        *x = *x / max;
        norm = norm + *x * *x;
    }
    let tau = norm.sqrt();
    if u[0] < T::zero() {
        -tau
    } else {
        tau
    }
}

/// Reflector built in place over `x`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Reflector<T> {
    pub gamma: T,
    /// `H·x = -tau·e₀` in the original (unscaled) units.
    pub tau: T,
}

/// Overwrite `x` with the reflector vector `u` (`u[0] = 1`) that maps `x`
/// onto a multiple of `e₀`.
///
/// Returns `None`, leaving `x` untouched, when `x` is exactly zero; the
/// caller records `γ = 0` and treats the step as the identity.
pub(crate) fn make_reflector<T: FloatScalar>(x: &mut [T]) -> Option<Reflector<T>> {
    let max = find_max(x);
    if max == T::zero() {
        return None;
    }
    let tau = compute_tau_and_divide(x, max);
    let u0 = x[0] + tau;
    divide_elements(&mut x[1..], u0);
    x[0] = T::one();
    Some(Reflector {
        gamma: u0 / tau,
        tau: tau * max,
    })
}

/// `A[row0..row1, col0..] ← (I - γ·u·uᵀ)·A[row0..row1, col0..]`.
///
/// `u` is indexed by absolute row. `w` is scratch of length at least
/// `a.ncols()`. Both passes walk rows of `A`.
pub(crate) fn rank1_update_mult_l<T: FloatScalar, K: Kernels<T>>(
    k: &K,
    a: &mut impl MatrixMut<T>,
    u: &[T],
    gamma: T,
    col0: usize,
    row0: usize,
    row1: usize,
    w: &mut [T],
) {
    let w = &mut w[col0..a.ncols()];
    w.fill(T::zero());
    for i in row0..row1 {
        k.axpy_neg(w, -u[i], a.row_as_slice(i, col0));
    }
    for i in row0..row1 {
        k.axpy_neg(a.row_as_mut_slice(i, col0), gamma * u[i], w);
    }
}

/// `A[row0.., col0..col1] ← A[row0.., col0..col1]·(I - γ·u·uᵀ)`.
///
/// `u` is indexed by absolute column.
pub(crate) fn rank1_update_mult_r<T: FloatScalar, K: Kernels<T>>(
    k: &K,
    a: &mut impl MatrixMut<T>,
    u: &[T],
    gamma: T,
    row0: usize,
    col0: usize,
    col1: usize,
) {
    let u = &u[col0..col1];
    for i in row0..a.nrows() {
        let row = &mut a.row_as_mut_slice(i, col0)[..col1 - col0];
        let d = gamma * k.dot(row, u);
        k.axpy_neg(row, d, u);
    }
}

/// Multiply out a sequence of packed reflectors.
///
/// `q` must hold the identity seed (square or the leading columns/rows for
/// compact output). `load(r, u)` writes reflector `r` into `u` at absolute
/// indices `start..` (with `u[start] = 1`) and returns `(start, γ)`, or
/// `None` for a skipped step.
///
/// Non-transposed: `q ← H_0·H_1 ⋯ H_{count-1}·q`.
/// Transposed: `q ← q·H_{count-1} ⋯ H_0`, which for an identity seed is the
/// transpose of the former, built with row-contiguous updates.
pub(crate) fn accumulate_reflectors<T, K, F>(
    k: &K,
    q: &mut DynMatrix<T>,
    count: usize,
    transposed: bool,
    mut load: F,
) where
    T: FloatScalar,
    K: Kernels<T>,
    F: FnMut(usize, &mut [T]) -> Option<(usize, T)>,
{
    let (rows, cols) = (q.nrows(), q.ncols());
    let mut u = vec![T::zero(); rows.max(cols)];
    let mut w = vec![T::zero(); cols];
    for r in (0..count).rev() {
        let Some((start, gamma)) = load(r, &mut u) else {
            continue;
        };
        if transposed {
            if start < rows {
                rank1_update_mult_r(k, q, &u, gamma, start, start, cols);
            }
        } else if start < cols {
            rank1_update_mult_l(k, q, &u, gamma, start, start, rows, &mut w);
        }
    }
}

/// Givens rotation `(c, s)` with `[c s; -s c]·[a; b] = [r; 0]`.
pub(crate) fn givens<T: FloatScalar>(a: T, b: T) -> (T, T) {
    if b == T::zero() {
        (T::one(), T::zero())
    } else if b.abs() > a.abs() {
        let t = a / b;
        let s = T::one() / (T::one() + t * t).sqrt();
        (s * t, s)
    } else {
        let t = b / a;
        let c = T::one() / (T::one() + t * t).sqrt();
        (c, c * t)
    }
}

/// Rotate rows `i` and `j` of `m` in place:
/// `row_i ← c·row_i + s·row_j`, `row_j ← c·row_j - s·row_i`.
pub(crate) fn rotate_rows<T: FloatScalar>(m: &mut DynMatrix<T>, i: usize, j: usize, c: T, s: T) {
    let (ri, rj) = m.two_rows_mut(i, j);
    for (x, y) in ri.iter_mut().zip(rj.iter_mut()) {
        let (xi, yj) = (*x, *y);
        *x = c * xi + s * yj;
        *y = c * yj - s * xi;
    }
}
