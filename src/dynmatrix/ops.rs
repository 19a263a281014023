use core::ops::{Add, Mul, Neg, Sub};

use crate::backend::{Kernels, Software};
use crate::traits::{FloatScalar, Scalar};

use super::DynMatrix;

// ── Element-wise addition / subtraction ─────────────────────────────

fn zip_with<T: Scalar>(a: &DynMatrix<T>, b: &DynMatrix<T>, op: &str, f: impl Fn(T, T) -> T) -> DynMatrix<T> {
    assert_eq!(
        (a.nrows, a.ncols),
        (b.nrows, b.ncols),
        "dimension mismatch: {}x{} {} {}x{}",
        a.nrows,
        a.ncols,
        op,
        b.nrows,
        b.ncols,
    );
    let data = a.data.iter().zip(b.data.iter()).map(|(&x, &y)| f(x, y)).collect();
    DynMatrix {
        data,
        nrows: a.nrows,
        ncols: a.ncols,
    }
}

impl<T: Scalar> Add<&DynMatrix<T>> for &DynMatrix<T> {
    type Output = DynMatrix<T>;
    fn add(self, rhs: &DynMatrix<T>) -> DynMatrix<T> {
        zip_with(self, rhs, "+", |x, y| x + y)
    }
}

impl<T: Scalar> Add for DynMatrix<T> {
    type Output = DynMatrix<T>;
    fn add(self, rhs: DynMatrix<T>) -> DynMatrix<T> {
        &self + &rhs
    }
}

impl<T: Scalar> Sub<&DynMatrix<T>> for &DynMatrix<T> {
    type Output = DynMatrix<T>;
    fn sub(self, rhs: &DynMatrix<T>) -> DynMatrix<T> {
        zip_with(self, rhs, "-", |x, y| x - y)
    }
}

impl<T: Scalar> Sub for DynMatrix<T> {
    type Output = DynMatrix<T>;
    fn sub(self, rhs: DynMatrix<T>) -> DynMatrix<T> {
        &self - &rhs
    }
}

impl<T: Scalar + Neg<Output = T>> Neg for DynMatrix<T> {
    type Output = DynMatrix<T>;
    fn neg(mut self) -> DynMatrix<T> {
        for x in self.data.iter_mut() {
            *x = -*x;
        }
        self
    }
}

// ── Scalar multiplication ───────────────────────────────────────────

impl<T: Scalar> Mul<T> for &DynMatrix<T> {
    type Output = DynMatrix<T>;
    fn mul(self, rhs: T) -> DynMatrix<T> {
        DynMatrix {
            data: self.data.iter().map(|&x| x * rhs).collect(),
            nrows: self.nrows,
            ncols: self.ncols,
        }
    }
}

impl<T: Scalar> Mul<T> for DynMatrix<T> {
    type Output = DynMatrix<T>;
    fn mul(mut self, rhs: T) -> DynMatrix<T> {
        for x in self.data.iter_mut() {
            *x = *x * rhs;
        }
        self
    }
}

// ── Matrix multiplication ───────────────────────────────────────────

impl<T: FloatScalar> DynMatrix<T> {
    /// Matrix product using the given kernels.
    ///
    /// i-k-j loop order: each step is an axpy of a row of `rhs` into a row of
    /// the output, so both operands are walked along contiguous rows.
    pub fn mul_with<K: Kernels<T>>(&self, rhs: &DynMatrix<T>, kernels: &K) -> DynMatrix<T> {
        assert_eq!(
            self.ncols, rhs.nrows,
            "dimension mismatch: {}x{} * {}x{}",
            self.nrows, self.ncols, rhs.nrows, rhs.ncols,
        );
        let (m, n, p) = (self.nrows, self.ncols, rhs.ncols);
        let mut out = DynMatrix::zeros(m, p, T::zero());
        for i in 0..m {
            let out_row = &mut out.data[i * p..(i + 1) * p];
            for k in 0..n {
                let a_ik = self.data[i * n + k];
                if a_ik != T::zero() {
                    kernels.axpy_neg(out_row, -a_ik, &rhs.data[k * p..(k + 1) * p]);
                }
            }
        }
        out
    }

    /// `selfᵀ · rhs` without materializing the transpose.
    pub fn transpose_mul(&self, rhs: &DynMatrix<T>) -> DynMatrix<T> {
        assert_eq!(
            self.nrows, rhs.nrows,
            "dimension mismatch: ({}x{})ᵀ * {}x{}",
            self.nrows, self.ncols, rhs.nrows, rhs.ncols,
        );
        let (m, n, p) = (self.nrows, self.ncols, rhs.ncols);
        let mut out = DynMatrix::zeros(n, p, T::zero());
        for k in 0..m {
            let r = &rhs.data[k * p..(k + 1) * p];
            for i in 0..n {
                let a_ki = self.data[k * n + i];
                if a_ki != T::zero() {
                    Software.axpy_neg(&mut out.data[i * p..(i + 1) * p], -a_ki, r);
                }
            }
        }
        out
    }

    /// Matrix-vector product `self · x`.
    pub fn mul_vec(&self, x: &[T]) -> Vec<T> {
        assert_eq!(x.len(), self.ncols, "vector length {} does not match {} columns", x.len(), self.ncols);
        (0..self.nrows).map(|i| Software.dot(self.row(i), x)).collect()
    }
}

impl<T: FloatScalar> Mul<&DynMatrix<T>> for &DynMatrix<T> {
    type Output = DynMatrix<T>;
    fn mul(self, rhs: &DynMatrix<T>) -> DynMatrix<T> {
        self.mul_with(rhs, &Software)
    }
}

impl<T: FloatScalar> Mul for DynMatrix<T> {
    type Output = DynMatrix<T>;
    fn mul(self, rhs: DynMatrix<T>) -> DynMatrix<T> {
        self.mul_with(&rhs, &Software)
    }
}
