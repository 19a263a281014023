use crate::backend::{Kernels, Software};
use crate::linalg::triangular::{quality, solve_transpose_lower};
use crate::linalg::{LinalgError, QrColumnDecomposition};
use crate::solver::{read_column, write_column, LinearSolver};
use crate::traits::FloatScalar;
use crate::DynMatrix;

/// Least-squares solver on Householder QR.
///
/// For a tall or square `A` (`m ≥ n`) it returns the `x` minimizing
/// `‖A·x - b‖`; for a wide `A` it returns the basic solution that satisfies
/// `A·x = b` with the trailing `n - m` unknowns set to zero. Both cases take
/// the same path: `b ← Qᵀ·b`, then back substitution on the leading
/// `min(m, n)` rows.
///
/// Built on the column-major QR variant, whose reflectors and `R` rows are
/// contiguous. `solve` leaves `Qᵀ·B` in `b`.
#[derive(Debug, Clone)]
pub struct QrSolver<T, K = Software> {
    qr: Option<QrColumnDecomposition<T, K>>,
    t: Vec<T>,
    kernels: K,
}

impl<T: FloatScalar> QrSolver<T> {
    pub fn new() -> Self {
        Self::with_kernels(Software)
    }
}

impl<T: FloatScalar> Default for QrSolver<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: FloatScalar, K: Kernels<T>> QrSolver<T, K> {
    pub fn with_kernels(kernels: K) -> Self {
        Self {
            qr: None,
            t: Vec::new(),
            kernels,
        }
    }

    fn factor(&self) -> &QrColumnDecomposition<T, K> {
        let Some(qr) = &self.qr else {
            panic!("QrSolver used before a successful set_a");
        };
        qr
    }
}

impl<T: FloatScalar, K: Kernels<T>> LinearSolver<T> for QrSolver<T, K> {
    /// Never fails; a rank-deficient `A` shows up as zero `quality`.
    fn set_a(&mut self, a: &mut DynMatrix<T>) -> Result<(), LinalgError> {
        *self = Self::from(QrColumnDecomposition::with_kernels(a, self.kernels.clone()));
        Ok(())
    }

    fn solve(&mut self, b: &mut DynMatrix<T>, x: &mut DynMatrix<T>) {
        let qr_t = self.factor().packed_transposed();
        let (n, m) = (qr_t.nrows(), qr_t.ncols());
        let k = m.min(n);
        assert_eq!(b.nrows(), m, "B has {} rows, expected {}", b.nrows(), m);
        let cols = b.ncols();
        x.reshape(n, cols);

        let mut t = core::mem::take(&mut self.t);
        for j in 0..cols {
            read_column(b, j, &mut t);
            let qr = self.factor();
            qr.apply_qt(&mut t);
            write_column(b, j, &t);
            // R[i][j] = qr_t[j][i]: R is the transpose of qr_t's lower triangle
            solve_transpose_lower(&self.kernels, qr.packed_transposed(), &mut t[..k]);
            write_column(x, j, &t[..k]);
        }
        self.t = t;
    }

    fn invert(&mut self) -> DynMatrix<T> {
        let m = self.factor().packed_transposed().ncols();
        let mut id = DynMatrix::eye(m, T::zero());
        let mut x = DynMatrix::zeros(0, 0, T::zero());
        self.solve(&mut id, &mut x);
        x
    }

    fn quality(&self) -> T {
        quality(self.factor().packed_transposed())
    }

    fn modifies_a(&self) -> bool {
        false
    }

    fn modifies_b(&self) -> bool {
        true
    }
}

impl<T: FloatScalar, K: Kernels<T>> From<QrColumnDecomposition<T, K>> for QrSolver<T, K> {
    /// Adopt an existing factorization. Always usable, whatever the rank.
    fn from(qr: QrColumnDecomposition<T, K>) -> Self {
        let m = qr.packed_transposed().ncols();
        Self {
            kernels: qr.kernels().clone(),
            qr: Some(qr),
            t: vec![T::zero(); m],
        }
    }
}
