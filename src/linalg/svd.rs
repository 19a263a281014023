use log::debug;

use crate::linalg::bidiagonal::BidiagonalDecomposition;
use crate::linalg::implicit_qr::BidiagonalQr;
use crate::linalg::result::{BidiagonalResult, SvdResult};
use crate::linalg::{LinalgError, LOG_TARGET};
use crate::traits::FloatScalar;
use crate::DynMatrix;

/// Settings for [`SvdDecomposition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvdSettings {
    /// Accumulate the left singular vectors.
    pub compute_u: bool,
    /// Accumulate the right singular vectors.
    pub compute_v: bool,
    /// Thin factors (`m x k`, `k x k`, `n x k` with `k = min(m, n)`) instead
    /// of the full square `U` and `V`.
    pub compact: bool,
    /// Sweep budget per singular value.
    pub max_iterations_per_value: usize,
}

impl Default for SvdSettings {
    fn default() -> Self {
        Self {
            compute_u: true,
            compute_v: true,
            compact: true,
            max_iterations_per_value: 20,
        }
    }
}

impl SvdSettings {
    /// Singular values only.
    pub fn values_only() -> Self {
        Self {
            compute_u: false,
            compute_v: false,
            ..Self::default()
        }
    }
}

/// Singular value decomposition `A = U·W·Vᵀ` of an arbitrary `m x n` matrix.
///
/// Bidiagonal reduction followed by the implicit-shift QR engine. Wide
/// inputs are decomposed through their transpose with the roles of `U` and
/// `V` exchanged, so both shapes take the same code path.
///
/// Singular vectors are stored as rows (`Uᵀ`, `Vᵀ`), the layout the engine
/// rotates in.
///
/// # Example
///
/// ```
/// use densela::DynMatrix;
/// use densela::linalg::{SvdDecomposition, SvdResult};
///
/// let a = DynMatrix::from_rows(2, 3, &[3.0_f64, 2.0, 2.0, 2.0, 3.0, -2.0]);
/// let svd = SvdDecomposition::new(&a).unwrap();
/// assert!((svd.singular_values()[0] - 5.0).abs() < 1e-12);
/// assert!((svd.singular_values()[1] - 3.0).abs() < 1e-12);
///
/// let rebuilt = &(&svd.get_u(false) * &svd.get_w()) * &svd.get_v(true);
/// assert!(rebuilt.approx_eq(&a, 1e-12));
/// ```
#[derive(Debug, Clone)]
pub struct SvdDecomposition<T> {
    values: Vec<T>,
    ut: Option<DynMatrix<T>>,
    vt: Option<DynMatrix<T>>,
    nrows: usize,
    ncols: usize,
    compact: bool,
}

impl<T: FloatScalar> SvdDecomposition<T> {
    /// Decompose with [`SvdSettings::default`].
    ///
    /// Returns `Err(ConvergenceFailure)` if the engine runs out of sweeps.
    pub fn new(a: &DynMatrix<T>) -> Result<Self, LinalgError> {
        Self::with_settings(a, SvdSettings::default())
    }

    pub fn with_settings(a: &DynMatrix<T>, settings: SvdSettings) -> Result<Self, LinalgError> {
        let (m, n) = (a.nrows(), a.ncols());
        let transposed = n > m;
        let work;
        let tall = if transposed {
            work = a.transpose();
            &work
        } else {
            a
        };

        let bd = BidiagonalDecomposition::new(tall);
        let (diag, off) = bd.diagonal();

        // Left/right of the tall problem
        let (want_left, want_right) = if transposed {
            (settings.compute_v, settings.compute_u)
        } else {
            (settings.compute_u, settings.compute_v)
        };

        let mut left = want_left.then(|| bd.get_u(true, settings.compact));
        let mut right = want_right.then(|| bd.get_v(true, settings.compact));

        let values = if left.is_none() && right.is_none() {
            BidiagonalQr::compute_values(&diag, &off, settings.max_iterations_per_value)?.0
        } else {
            let mut engine = BidiagonalQr::new(diag, off, settings.max_iterations_per_value);
            engine.run(left.as_mut(), right.as_mut())?;
            debug!(target: LOG_TARGET, "SVD of {}x{} converged in {} sweeps", m, n, engine.iterations());
            engine.values().to_vec()
        };

        let (ut, vt) = if transposed { (right, left) } else { (left, right) };

        Ok(Self {
            values,
            ut,
            vt,
            nrows: m,
            ncols: n,
            compact: settings.compact,
        })
    }

    /// Singular values only, descending.
    pub fn values_only(a: &DynMatrix<T>) -> Result<Vec<T>, LinalgError> {
        Ok(Self::with_settings(a, SvdSettings::values_only())?.values)
    }

    /// Number of singular values above `tol`.
    pub fn rank(&self, tol: T) -> usize {
        self.values.iter().filter(|&&s| s > tol).count()
    }

    /// Dimension of the null space of `A`: `ncols - rank(tol)`.
    pub fn nullity(&self, tol: T) -> usize {
        self.ncols - self.rank(tol)
    }

    /// `σ_max / σ_min`; infinite when the smallest singular value is zero.
    pub fn condition_number(&self) -> T {
        match (self.values.first(), self.values.last()) {
            (Some(&max), Some(&min)) if min > T::zero() => max / min,
            (Some(_), Some(_)) => T::infinity(),
            _ => T::one(),
        }
    }

    /// Threshold below which a singular value is numerically zero:
    /// `max(m, n)·ε·σ_max`.
    pub fn default_tolerance(&self) -> T {
        let sigma_max = self.values.first().copied().unwrap_or_else(T::zero);
        T::from(self.nrows.max(self.ncols)).unwrap_or_else(T::one) * T::epsilon() * sigma_max
    }
}

impl<T: FloatScalar> SvdResult<T> for SvdDecomposition<T> {
    fn singular_values(&self) -> &[T] {
        &self.values
    }

    fn get_u(&self, transpose: bool) -> DynMatrix<T> {
        let Some(ut) = &self.ut else {
            panic!("U was not computed (SvdSettings::compute_u is false)");
        };
        if transpose {
            ut.clone()
        } else {
            ut.transpose()
        }
    }

    fn get_v(&self, transpose: bool) -> DynMatrix<T> {
        let Some(vt) = &self.vt else {
            panic!("V was not computed (SvdSettings::compute_v is false)");
        };
        if transpose {
            vt.clone()
        } else {
            vt.transpose()
        }
    }

    fn get_w(&self) -> DynMatrix<T> {
        let (rows, cols) = if self.compact {
            (self.values.len(), self.values.len())
        } else {
            (self.nrows, self.ncols)
        };
        let mut w = DynMatrix::zeros(rows, cols, T::zero());
        for (i, &s) in self.values.iter().enumerate() {
            w[(i, i)] = s;
        }
        w
    }
}
