use core::fmt;

use crate::traits::FloatScalar;

use super::DynMatrix;

// ── Comparison ──────────────────────────────────────────────────────

impl<T: FloatScalar> DynMatrix<T> {
    /// Largest absolute element, or zero for an empty matrix.
    pub fn max_abs(&self) -> T {
        self.data.iter().fold(T::zero(), |m, &x| m.max(x.abs()))
    }

    /// `true` if both matrices have the same shape and every pair of
    /// elements differs by at most `tol`. NaN never compares equal.
    ///
    /// ```
    /// use densela::DynMatrix;
    /// let a = DynMatrix::from_rows(1, 2, &[1.0_f64, 2.0]);
    /// let b = DynMatrix::from_rows(1, 2, &[1.0_f64, 2.0 + 1e-12]);
    /// assert!(a.approx_eq(&b, 1e-10));
    /// ```
    pub fn approx_eq(&self, other: &DynMatrix<T>, tol: T) -> bool {
        self.nrows == other.nrows
            && self.ncols == other.ncols
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(&a, &b)| (a - b).abs() <= tol)
    }

    /// `true` if any element is NaN or infinite.
    pub fn has_uncountable(&self) -> bool {
        self.data.iter().any(|x| !x.is_finite())
    }
}

// ── Display ─────────────────────────────────────────────────────────

impl<T: fmt::Display> fmt::Display for DynMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DynMatrix {}x{}", self.nrows, self.ncols)?;
        for i in 0..self.nrows {
            write!(f, "[")?;
            for j in 0..self.ncols {
                if j > 0 {
                    write!(f, ", ")?;
                }
                match f.precision() {
                    Some(p) => write!(f, "{:.*}", p, self.data[i * self.ncols + j])?,
                    None => write!(f, "{}", self.data[i * self.ncols + j])?,
                }
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}
