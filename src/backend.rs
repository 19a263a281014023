//! Vector kernels used by the factorizations' inner loops.
//!
//! The decompositions and solvers never call a kernel routine through global
//! state: each one owns a [`Kernels`] value, which defaults to [`Software`].
//! An accelerated implementation (BLAS binding, SIMD intrinsics, ...) plugs in
//! through the `with_kernels` constructors.
//!
//! ```
//! use densela::backend::{Kernels, Software};
//!
//! let k = Software;
//! assert_eq!(k.dot(&[1.0_f64, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
//!
//! let mut y = [1.0_f64, 1.0];
//! k.axpy_neg(&mut y, 2.0, &[0.5, 1.0]);
//! assert_eq!(y, [0.0, -1.0]);
//! ```

use core::fmt::Debug;

use crate::traits::FloatScalar;

/// Level-1 vector operations on contiguous slices.
///
/// All three routines require equal slice lengths; implementations may
/// `debug_assert` it.
pub trait Kernels<T: FloatScalar>: Debug + Clone {
    /// `Σ a[i]·b[i]`
    fn dot(&self, a: &[T], b: &[T]) -> T;

    /// `y[i] -= alpha·x[i]`
    fn axpy_neg(&self, y: &mut [T], alpha: T, x: &[T]);

    /// `x[i] *= alpha`
    fn scale(&self, x: &mut [T], alpha: T);
}

/// Pure-Rust kernels. `dot` runs four accumulators over 4-wide chunks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Software;

impl<T: FloatScalar> Kernels<T> for Software {
    #[inline]
    fn dot(&self, a: &[T], b: &[T]) -> T {
        debug_assert_eq!(a.len(), b.len());
        let n = a.len().min(b.len());
        let (a, b) = (&a[..n], &b[..n]);

        let mut acc = [T::zero(); 4];
        let mut ca = a.chunks_exact(4);
        let mut cb = b.chunks_exact(4);
        for (x, y) in (&mut ca).zip(&mut cb) {
            acc[0] = acc[0] + x[0] * y[0];
            acc[1] = acc[1] + x[1] * y[1];
            acc[2] = acc[2] + x[2] * y[2];
            acc[3] = acc[3] + x[3] * y[3];
        }
        let mut sum = (acc[0] + acc[1]) + (acc[2] + acc[3]);
        for (x, y) in ca.remainder().iter().zip(cb.remainder()) {
            sum = sum + *x * *y;
        }
        sum
    }

    #[inline]
    fn axpy_neg(&self, y: &mut [T], alpha: T, x: &[T]) {
        debug_assert_eq!(y.len(), x.len());
        for (yi, &xi) in y.iter_mut().zip(x) {
            *yi = *yi - alpha * xi;
        }
    }

    #[inline]
    fn scale(&self, x: &mut [T], alpha: T) {
        for xi in x.iter_mut() {
            *xi = *xi * alpha;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_handles_remainder() {
        let a: Vec<f64> = (1..=7).map(|v| v as f64).collect();
        let b = vec![1.0; 7];
        assert_eq!(Software.dot(&a[..], &b[..]), 28.0);
        let empty: &[f64] = &[];
        assert_eq!(Software.dot(empty, empty), 0.0);
    }

    #[test]
    fn axpy_and_scale() {
        let mut y = vec![3.0_f32, 4.0, 5.0];
        Software.axpy_neg(&mut y[..], 0.5, &[2.0, 2.0, 2.0]);
        assert_eq!(y, vec![2.0, 3.0, 4.0]);
        Software.scale(&mut y[..], -1.0);
        assert_eq!(y, vec![-2.0, -3.0, -4.0]);
    }
}
