use log::{trace, warn};
use num_complex::Complex;

use crate::linalg::hessenberg::HessenbergDecomposition;
use crate::linalg::result::{EigenResult, HessenbergResult};
use crate::linalg::symmetric_eigen::EigenSettings;
use crate::linalg::{LinalgError, LOG_TARGET};
use crate::solver::{LinearSolver, LuSolver};
use crate::traits::FloatScalar;
use crate::DynMatrix;

/// Francis double-shift QR iteration on an upper Hessenberg matrix.
///
/// Transforms `h` to real Schur form (quasi-upper-triangular) in place and,
/// if given, accumulates the orthogonal similarity into `q`. Real
/// eigenvalues end up as 1x1 diagonal blocks, complex conjugate pairs as
/// 2x2 blocks.
pub(crate) fn francis_qr<T: FloatScalar>(
    h: &mut DynMatrix<T>,
    mut q: Option<&mut DynMatrix<T>>,
    max_iter: usize,
) -> Result<(), LinalgError> {
    let n = h.nrows();
    if n <= 1 {
        return Ok(());
    }

    let eps = T::epsilon();
    let mut iter = 0usize;
    let mut p = n; // active block is h[0..p, 0..p]

    while p > 2 {
        let tol = eps * (h[(p - 2, p - 2)].abs() + h[(p - 1, p - 1)].abs());
        if h[(p - 1, p - 2)].abs() <= tol {
            h[(p - 1, p - 2)] = T::zero();
            p -= 1;
            trace!(target: LOG_TARGET, "Francis QR: 1x1 block deflated at {}", p);
            continue;
        }

        let tol2 = eps * (h[(p - 3, p - 3)].abs() + h[(p - 2, p - 2)].abs());
        if h[(p - 2, p - 3)].abs() <= tol2 {
            h[(p - 2, p - 3)] = T::zero();
            p -= 2;
            trace!(target: LOG_TARGET, "Francis QR: 2x2 block deflated at {}", p);
            continue;
        }

        iter += 1;
        if iter > max_iter {
            warn!(target: LOG_TARGET, "Francis QR did not converge in {} sweeps ({} values left)", max_iter, p);
            return Err(LinalgError::ConvergenceFailure);
        }

        let mut lo = p - 1;
        while lo > 0 {
            let tol_lo = eps * (h[(lo - 1, lo - 1)].abs() + h[(lo, lo)].abs());
            if h[(lo, lo - 1)].abs() <= tol_lo {
                h[(lo, lo - 1)] = T::zero();
                break;
            }
            lo -= 1;
        }

        // Exceptional shift every 10 sweeps breaks cycles
        let (s, t) = if iter % 10 == 0 {
            let w = h[(p - 1, p - 2)].abs() + h[(p - 2, p - 3)].abs();
            (w + w, w * w)
        } else {
            let a11 = h[(p - 2, p - 2)];
            let a12 = h[(p - 2, p - 1)];
            let a21 = h[(p - 1, p - 2)];
            let a22 = h[(p - 1, p - 1)];
            (a11 + a22, a11 * a22 - a12 * a21)
        };

        // First column of H² - s·H + t·I
        let h00 = h[(lo, lo)];
        let h10 = h[(lo + 1, lo)];
        let h01 = h[(lo, lo + 1)];
        let h11 = h[(lo + 1, lo + 1)];
        let mut x = h00 * h00 + h01 * h10 - s * h00 + t;
        let mut y = h10 * (h00 + h11 - s);
        let mut z = if lo + 2 < p {
            h10 * h[(lo + 2, lo + 1)]
        } else {
            T::zero()
        };

        for k in lo..(p - 1) {
            let use3 = k + 2 < p;
            let (v1, v2, tau) = if use3 {
                householder3(x, y, z)
            } else {
                let (v1, tau) = householder2(x, y);
                (v1, T::zero(), tau)
            };

            // Left
            let col_start = if k > lo { k - 1 } else { k };
            for j in col_start..n {
                let mut dot = h[(k, j)] + v1 * h[(k + 1, j)];
                if use3 {
                    dot = dot + v2 * h[(k + 2, j)];
                }
                dot = tau * dot;
                h[(k, j)] = h[(k, j)] - dot;
                h[(k + 1, j)] = h[(k + 1, j)] - dot * v1;
                if use3 {
                    h[(k + 2, j)] = h[(k + 2, j)] - dot * v2;
                }
            }

            // Right
            let row_end = if use3 { (k + 4).min(p) } else { p };
            apply_right(h, k, v1, v2, tau, use3, row_end);
            if let Some(q) = q.as_deref_mut() {
                apply_right(q, k, v1, v2, tau, use3, n);
            }

            // Next bulge from the fill-in of column k
            if k + 2 < p - 1 {
                x = h[(k + 1, k)];
                y = h[(k + 2, k)];
                z = h[(k + 3, k)];
            } else if k + 1 < p - 1 {
                x = h[(k + 1, k)];
                y = h[(k + 2, k)];
                z = T::zero();
            }
        }

        for i in 2..n {
            for j in 0..(i - 1) {
                if h[(i, j)].abs() < eps * (h[(i, i)].abs() + h[(j, j)].abs()) {
                    h[(i, j)] = T::zero();
                }
            }
        }
    }

    if p == 2 {
        let tol = eps * (h[(0, 0)].abs() + h[(1, 1)].abs());
        if h[(1, 0)].abs() <= tol {
            h[(1, 0)] = T::zero();
        }
    }

    Ok(())
}

/// Columns `k..k+2` (or `k..k+1`) of rows `0..row_end` times `I - τ·v·vᵀ`,
/// `v = (1, v1, v2)`.
fn apply_right<T: FloatScalar>(
    m: &mut DynMatrix<T>,
    k: usize,
    v1: T,
    v2: T,
    tau: T,
    use3: bool,
    row_end: usize,
) {
    for i in 0..row_end {
        let row = &mut m.row_mut(i)[k..];
        let mut dot = row[0] + v1 * row[1];
        if use3 {
            dot = dot + v2 * row[2];
        }
        dot = tau * dot;
        row[0] = row[0] - dot;
        row[1] = row[1] - dot * v1;
        if use3 {
            row[2] = row[2] - dot * v2;
        }
    }
}

/// 3-element Householder with implicit leading one: `(v1, v2, τ)`.
#[inline]
fn householder3<T: FloatScalar>(x: T, y: T, z: T) -> (T, T, T) {
    let norm = (x * x + y * y + z * z).sqrt();
    if norm <= T::epsilon() {
        return (T::zero(), T::zero(), T::zero());
    }
    let sign = if x >= T::zero() { T::one() } else { -T::one() };
    let u0 = x + sign * norm;
    let v1 = y / u0;
    let v2 = z / u0;
    (v1, v2, T::two() / (T::one() + v1 * v1 + v2 * v2))
}

/// 2-element Householder with implicit leading one: `(v1, τ)`.
#[inline]
fn householder2<T: FloatScalar>(x: T, y: T) -> (T, T) {
    let norm = (x * x + y * y).sqrt();
    if norm <= T::epsilon() {
        return (T::zero(), T::zero());
    }
    let sign = if x >= T::zero() { T::one() } else { -T::one() };
    let v1 = y / (x + sign * norm);
    (v1, T::two() / (T::one() + v1 * v1))
}

/// Eigenvalues of a general real square matrix via the real Schur form
/// `A = Q·S·Qᵀ`.
///
/// Hessenberg reduction followed by Francis double-shift QR. Eigenvalues are
/// reported in the order their blocks appear on the diagonal of `S`, complex
/// ones as conjugate pairs (positive imaginary part first). Eigenvectors of
/// real eigenvalues are computed on request by inverse iteration against an
/// LU factorization of `A - (λ + δ)·I`.
///
/// # Example
///
/// ```
/// use densela::DynMatrix;
/// use densela::linalg::{EigenResult, GeneralEigen};
///
/// // 90° rotation: eigenvalues ±i
/// let a = DynMatrix::from_rows(2, 2, &[0.0_f64, -1.0, 1.0, 0.0]);
/// let eig = GeneralEigen::new(&a).unwrap();
/// let l = eig.eigenvalue(0);
/// assert!(l.re.abs() < 1e-12);
/// assert!((l.im - 1.0).abs() < 1e-12);
/// assert!(eig.eigenvector(0).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct GeneralEigen<T> {
    a: DynMatrix<T>,
    schur: DynMatrix<T>,
    vectors: Option<DynMatrix<T>>,
    values: Vec<Complex<T>>,
}

impl<T: FloatScalar> GeneralEigen<T> {
    pub fn new(a: &DynMatrix<T>) -> Result<Self, LinalgError> {
        Self::with_settings(a, EigenSettings::default())
    }

    /// With `compute_vectors: false` the Schur vectors are not accumulated
    /// and [`eigenvector`](EigenResult::eigenvector) always returns `None`.
    pub fn with_settings(a: &DynMatrix<T>, settings: EigenSettings) -> Result<Self, LinalgError> {
        let n = a.nrows();
        assert!(a.is_square(), "eigen-decomposition requires a square matrix, got {}x{}", n, a.ncols());

        let hd = HessenbergDecomposition::new(a);
        let mut schur = hd.get_h();
        let mut vectors = settings.compute_vectors.then(|| hd.get_q(false));
        francis_qr(
            &mut schur,
            vectors.as_mut(),
            settings.max_iterations_per_value * n.max(1),
        )?;

        let values = block_eigenvalues(&schur);
        Ok(Self {
            a: a.clone(),
            schur,
            vectors,
            values,
        })
    }

    pub fn eigenvalues(&self) -> &[Complex<T>] {
        &self.values
    }

    /// The quasi-upper-triangular factor `S`.
    pub fn schur_form(&self) -> &DynMatrix<T> {
        &self.schur
    }

    /// The orthogonal factor `Q` (Schur vectors as columns), if computed.
    pub fn schur_vectors(&self) -> Option<&DynMatrix<T>> {
        self.vectors.as_ref()
    }

    /// Unit eigenvector of a real eigenvalue by inverse iteration. The
    /// largest-magnitude component is made positive.
    fn inverse_iteration(&self, lambda: T) -> Option<Vec<T>> {
        let n = self.a.nrows();
        let scale = self.a.max_abs().max(T::one());
        let shift = lambda + T::epsilon().sqrt() * scale;

        let mut shifted = self.a.clone();
        for i in 0..n {
            shifted[(i, i)] = shifted[(i, i)] - shift;
        }
        let mut solver = LuSolver::new();
        solver.set_a(&mut shifted).ok()?;

        let mut x: Vec<T> = (0..n)
            .map(|i| T::one() + T::from(i).unwrap_or_else(T::zero) / T::from(n + 1).unwrap_or_else(T::one))
            .collect();
        for _ in 0..4 {
            x = solver.solve_vector(&x);
            let norm = x.iter().fold(T::zero(), |s, &v| s + v * v).sqrt();
            if !norm.is_finite() || norm == T::zero() {
                return None;
            }
            for v in &mut x {
                *v = *v / norm;
            }
        }

        let lead = x.iter().fold(T::zero(), |m, &v| if v.abs() > m.abs() { v } else { m });
        if lead < T::zero() {
            for v in &mut x {
                *v = -*v;
            }
        }
        Some(x)
    }
}

/// Eigenvalues of the diagonal blocks of a real Schur form.
fn block_eigenvalues<T: FloatScalar>(s: &DynMatrix<T>) -> Vec<Complex<T>> {
    let n = s.nrows();
    let mut values = Vec::with_capacity(n);
    let mut i = 0;
    while i < n {
        if i + 1 < n && s[(i + 1, i)] != T::zero() {
            let (a, b) = (s[(i, i)], s[(i, i + 1)]);
            let (c, d) = (s[(i + 1, i)], s[(i + 1, i + 1)]);
            let tr = (a + d) / T::two();
            let disc = tr * tr - (a * d - b * c);
            if disc >= T::zero() {
                let sq = disc.sqrt();
                values.push(Complex::new(tr + sq, T::zero()));
                values.push(Complex::new(tr - sq, T::zero()));
            } else {
                let sq = (-disc).sqrt();
                values.push(Complex::new(tr, sq));
                values.push(Complex::new(tr, -sq));
            }
            i += 2;
        } else {
            values.push(Complex::new(s[(i, i)], T::zero()));
            i += 1;
        }
    }
    values
}

impl<T: FloatScalar> EigenResult<T> for GeneralEigen<T> {
    fn number_of_eigenvalues(&self) -> usize {
        self.values.len()
    }

    fn eigenvalue(&self, index: usize) -> Complex<T> {
        self.values[index]
    }

    fn eigenvector(&self, index: usize) -> Option<Vec<T>> {
        let value = self.values[index];
        if self.vectors.is_none() || value.im != T::zero() {
            return None;
        }
        self.inverse_iteration(value.re)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    fn assert_near(a: f64, b: f64, tol: f64, msg: &str) {
        assert!((a - b).abs() < tol, "{}: {} vs {} (diff {})", msg, a, b, (a - b).abs());
    }

    fn sorted_real(eig: &GeneralEigen<f64>) -> Vec<f64> {
        let mut re: Vec<f64> = eig.eigenvalues().iter().map(|c| c.re).collect();
        re.sort_by(|a, b| a.total_cmp(b));
        re
    }

    fn verify_schur(a: &DynMatrix<f64>, eig: &GeneralEigen<f64>) {
        let s = eig.schur_form();
        let q = eig.schur_vectors().unwrap();
        let qtaq = &q.transpose_mul(a) * q;
        assert!(qtaq.approx_eq(s, TOL), "QᵀAQ {}", qtaq);
        assert!(q.transpose_mul(q).approx_eq(&DynMatrix::eye(a.nrows(), 0.0), TOL));
        for i in 2..s.nrows() {
            for j in 0..(i - 1) {
                assert_near(s[(i, j)], 0.0, TOL, "below subdiagonal");
            }
        }
    }

    #[test]
    fn triangular_input() {
        let a = DynMatrix::from_rows(3, 3, &[1.0, 2.0, 3.0, 0.0, 4.0, 5.0, 0.0, 0.0, 6.0]);
        let eig = GeneralEigen::new(&a).unwrap();
        verify_schur(&a, &eig);
        assert_eq!(sorted_real(&eig), vec![1.0, 4.0, 6.0]);
    }

    #[test]
    fn companion_matrix_roots() {
        // x³ - 6x² + 11x - 6 = (x-1)(x-2)(x-3)
        let a = DynMatrix::from_rows(3, 3, &[0.0, 0.0, 6.0, 1.0, 0.0, -11.0, 0.0, 1.0, 6.0]);
        let eig = GeneralEigen::new(&a).unwrap();
        verify_schur(&a, &eig);
        let re = sorted_real(&eig);
        for (r, e) in re.iter().zip([1.0, 2.0, 3.0]) {
            assert_near(*r, e, 1e-8, "root");
        }
        for l in eig.eigenvalues() {
            assert_near(l.im, 0.0, 1e-8, "im");
        }
    }

    #[test]
    fn complex_pair() {
        let theta = core::f64::consts::FRAC_PI_4;
        let (c, s) = (theta.cos(), theta.sin());
        let a = DynMatrix::from_rows(3, 3, &[c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 2.0]);
        let eig = GeneralEigen::new(&a).unwrap();
        let complex: Vec<_> = eig.eigenvalues().iter().filter(|l| l.im != 0.0).collect();
        assert_eq!(complex.len(), 2);
        assert_near(complex[0].re, c, TOL, "re");
        assert_near(complex[0].im, s, TOL, "im");
        assert_near(complex[1].im, -s, TOL, "conjugate");
    }

    #[test]
    fn trace_of_general_4x4() {
        let a = DynMatrix::from_rows(
            4,
            4,
            &[4.0, 1.0, -2.0, 2.0, 1.0, 2.0, 0.0, 1.0, -2.0, 0.5, 3.0, -2.0, 2.0, 1.0, -2.0, 1.0],
        );
        let eig = GeneralEigen::new(&a).unwrap();
        verify_schur(&a, &eig);
        let sum = eig.eigenvalues().iter().fold(Complex::new(0.0, 0.0), |s, &l| s + l);
        assert_near(sum.re, 10.0, TOL, "trace");
        assert_near(sum.im, 0.0, TOL, "imaginary sum");
    }

    #[test]
    fn real_eigenvectors() {
        let a = DynMatrix::from_rows(3, 3, &[2.0, 1.0, 0.0, 0.0, 3.0, 1.0, 0.0, 0.0, 5.0]);
        let eig = GeneralEigen::new(&a).unwrap();
        for i in 0..eig.number_of_eigenvalues() {
            let lambda = eig.eigenvalue(i).re;
            let x = eig.eigenvector(i).unwrap();
            let ax = a.mul_vec(&x);
            for k in 0..3 {
                assert_near(ax[k], lambda * x[k], 1e-8, "A·x = λ·x");
            }
            let norm: f64 = x.iter().map(|v| v * v).sum();
            assert_near(norm, 1.0, 1e-12, "unit norm");
        }
    }

    #[test]
    fn values_only_has_no_vectors() {
        let a = DynMatrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let settings = EigenSettings {
            compute_vectors: false,
            ..EigenSettings::default()
        };
        let eig = GeneralEigen::with_settings(&a, settings).unwrap();
        assert!(eig.schur_vectors().is_none());
        assert!(eig.eigenvector(0).is_none());
        let sum = eig.eigenvalue(0).re + eig.eigenvalue(1).re;
        assert_near(sum, 5.0, TOL, "trace");
    }

    #[test]
    fn one_by_one() {
        let eig = GeneralEigen::new(&DynMatrix::from_rows(1, 1, &[42.0])).unwrap();
        assert_eq!(eig.eigenvalue(0), Complex::new(42.0, 0.0));
        let v = eig.eigenvector(0).unwrap();
        assert_near(v[0], 1.0, 1e-12, "unit vector");
    }
}
