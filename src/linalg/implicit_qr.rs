//! Implicit-shift QR iteration on compact bidiagonal and symmetric
//! tridiagonal forms.
//!
//! Both engines are explicit state machines driven by [`step`]: every call
//! either splits a converged value off the bottom of the active block
//! ([`EngineState::Deflated`]), performs one shifted sweep or zero-chase on
//! the unreduced block ([`EngineState::Active`]), or reports a terminal
//! state. [`run`] loops to completion and post-processes (sign fix, sort).
//!
//! Rotations are accumulated into the *rows* of optional `Uᵀ`/`Vᵀ`/`Qᵀ`
//! matrices, which keeps every update contiguous in row-major storage.
//!
//! The iteration budget is `max_iterations_per_value · n` sweeps in total.
//!
//! Both engines divide the form by its largest entry on construction and
//! multiply it back once a terminal state is reached, so the shift formulas
//! stay in range for any finite input. While an engine is non-terminal its
//! `values()` are in these normalized units.
//!
//! [`step`]: BidiagonalQr::step
//! [`run`]: BidiagonalQr::run

use log::{trace, warn};

use crate::linalg::householder::{givens, rotate_rows};
use crate::linalg::tridiagonal::TridiagonalForm;
use crate::linalg::{LinalgError, LOG_TARGET};
use crate::traits::FloatScalar;
use crate::DynMatrix;

/// Where an implicit-QR engine is in its iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Working on an unreduced block.
    Active,
    /// A value was just split off the active block.
    Deflated,
    /// Every value has converged.
    Converged,
    /// The iteration budget ran out.
    Failed,
}

impl EngineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, EngineState::Converged | EngineState::Failed)
    }
}

/// Divide `diag` and `off` by their largest magnitude. Returns the factor,
/// or one when the form is zero or not finite.
fn normalize<T: FloatScalar>(diag: &mut [T], off: &mut [T]) -> T {
    let max = diag
        .iter()
        .chain(off.iter())
        .fold(T::zero(), |m, &x| m.max(x.abs()));
    if max == T::zero() || !max.is_finite() {
        return T::one();
    }
    for x in diag.iter_mut().chain(off.iter_mut()) {
        *x = *x / max;
    }
    max
}

fn denormalize<T: FloatScalar>(diag: &mut [T], off: &mut [T], scale: T) {
    if scale != T::one() {
        for x in diag.iter_mut().chain(off.iter_mut()) {
            *x = *x * scale;
        }
    }
}

/// Copy of an undisturbed bidiagonal form, returned by
/// [`BidiagonalQr::compute_values`] and consumed by
/// [`BidiagonalQr::compute_vectors`].
#[derive(Debug, Clone)]
pub struct SavedBidiagonal<T> {
    diag: Vec<T>,
    off: Vec<T>,
}

// ── Bidiagonal (SVD) engine ─────────────────────────────────────────

/// Golub-Kahan implicit-shift QR on an upper bidiagonal matrix.
#[derive(Debug, Clone)]
pub struct BidiagonalQr<T> {
    diag: Vec<T>,
    off: Vec<T>,
    hi: usize,
    iterations: usize,
    max_iterations: usize,
    /// Entries at or below this are treated as zero: `ε·‖B‖`.
    tiny: T,
    scale: T,
    state: EngineState,
}

impl<T: FloatScalar> BidiagonalQr<T> {
    /// `off` must have one entry fewer than `diag` (or be empty).
    pub fn new(mut diag: Vec<T>, mut off: Vec<T>, max_iterations_per_value: usize) -> Self {
        let n = diag.len();
        assert!(
            off.len() + 1 == n || (n == 0 && off.is_empty()),
            "off-diagonal length {} does not fit diagonal length {}",
            off.len(),
            n
        );
        let scale = if n > 1 { normalize(&mut diag, &mut off) } else { T::one() };
        let norm = diag
            .iter()
            .chain(off.iter())
            .fold(T::zero(), |m, &x| m.max(x.abs()));
        Self {
            diag,
            off,
            hi: n.saturating_sub(1),
            iterations: 0,
            max_iterations: max_iterations_per_value * n.max(1),
            tiny: T::epsilon() * norm,
            scale,
            state: if n <= 1 {
                EngineState::Converged
            } else {
                EngineState::Active
            },
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Sweeps (and zero-chases) performed so far.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Current diagonal; the singular values once converged and finished.
    pub fn values(&self) -> &[T] {
        &self.diag
    }

    /// Enter a terminal state, restoring the input's scale.
    fn terminate(&mut self, state: EngineState) -> EngineState {
        denormalize(&mut self.diag, &mut self.off, self.scale);
        self.scale = T::one();
        self.state = state;
        state
    }

    fn negligible(&self, i: usize) -> bool {
        let e = self.off[i].abs();
        e <= self.tiny || e <= T::epsilon() * (self.diag[i].abs() + self.diag[i + 1].abs())
    }

    /// Advance by one deflation, sweep or zero-chase.
    pub fn step(
        &mut self,
        mut ut: Option<&mut DynMatrix<T>>,
        mut vt: Option<&mut DynMatrix<T>>,
    ) -> EngineState {
        if self.state.is_terminal() {
            return self.state;
        }
        let hi = self.hi;

        if self.negligible(hi - 1) {
            self.off[hi - 1] = T::zero();
            self.hi -= 1;
            trace!(target: LOG_TARGET, "bidiagonal QR: value {} deflated after {} sweeps", hi, self.iterations);
            if self.hi == 0 {
                return self.terminate(EngineState::Converged);
            }
            self.state = EngineState::Deflated;
            return self.state;
        }

        let mut lo = hi - 1;
        while lo > 0 {
            if self.negligible(lo - 1) {
                self.off[lo - 1] = T::zero();
                break;
            }
            lo -= 1;
        }

        self.iterations += 1;
        if self.iterations > self.max_iterations {
            warn!(
                target: LOG_TARGET,
                "bidiagonal QR did not converge in {} sweeps ({} values left)",
                self.max_iterations,
                hi + 1
            );
            return self.terminate(EngineState::Failed);
        }

        self.state = EngineState::Active;
        if let Some(idx) = (lo..hi).find(|&i| self.diag[i].abs() <= self.tiny) {
            self.chase_zero(idx, hi, ut.as_deref_mut());
        } else {
            self.sweep(lo, hi, ut.as_deref_mut(), vt.as_deref_mut());
        }
        self.state
    }

    /// `diag[idx] = 0`: rotate `off[idx]` down and out of the bottom with
    /// left rotations, decoupling the block at `idx`.
    fn chase_zero(&mut self, idx: usize, hi: usize, mut ut: Option<&mut DynMatrix<T>>) {
        self.diag[idx] = T::zero();
        let mut z = self.off[idx];
        self.off[idx] = T::zero();
        for j in (idx + 1)..=hi {
            let (c, s) = givens(self.diag[j], z);
            self.diag[j] = c * self.diag[j] + s * z;
            if j < hi {
                z = -s * self.off[j];
                self.off[j] = c * self.off[j];
            }
            if let Some(ut) = ut.as_deref_mut() {
                rotate_rows(ut, j, idx, c, s);
            }
        }
    }

    /// One Wilkinson-shifted bulge chase over `lo..=hi`.
    fn sweep(
        &mut self,
        lo: usize,
        hi: usize,
        mut ut: Option<&mut DynMatrix<T>>,
        mut vt: Option<&mut DynMatrix<T>>,
    ) {
        let (d, e) = (&mut self.diag, &mut self.off);

        // Shift: eigenvalue of the trailing 2x2 of BᵀB closer to its last entry
        let d_hi = d[hi];
        let d_hi1 = d[hi - 1];
        let e_hi1 = e[hi - 1];
        let e_hi2 = if hi >= lo + 2 { e[hi - 2] } else { T::zero() };
        let t11 = d_hi1 * d_hi1 + e_hi2 * e_hi2;
        let t12 = d_hi1 * e_hi1;
        let t22 = d_hi * d_hi + e_hi1 * e_hi1;
        let half = (t11 - t22) / T::two();
        let sign = if half >= T::zero() { T::one() } else { -T::one() };
        let denom = half + sign * (half * half + t12 * t12).sqrt();
        let mu = if denom == T::zero() { t22 } else { t22 - t12 * t12 / denom };

        let mut x = d[lo] * d[lo] - mu;
        let mut z = d[lo] * e[lo];

        for k in lo..hi {
            // Right rotation on columns k, k+1
            let (c, s) = givens(x, z);
            if k > lo {
                e[k - 1] = c * x + s * z;
            }
            let (dk, ek, dk1) = (d[k], e[k], d[k + 1]);
            d[k] = c * dk + s * ek;
            e[k] = c * ek - s * dk;
            let bulge = s * dk1;
            d[k + 1] = c * dk1;
            if let Some(vt) = vt.as_deref_mut() {
                rotate_rows(vt, k, k + 1, c, s);
            }

            // Left rotation on rows k, k+1 clears the bulge below the diagonal
            let (c2, s2) = givens(d[k], bulge);
            d[k] = c2 * d[k] + s2 * bulge;
            let (ek, dk1) = (e[k], d[k + 1]);
            e[k] = c2 * ek + s2 * dk1;
            d[k + 1] = c2 * dk1 - s2 * ek;
            if k + 1 < hi {
                let ek1 = e[k + 1];
                x = e[k];
                z = s2 * ek1;
                e[k + 1] = c2 * ek1;
            }
            if let Some(ut) = ut.as_deref_mut() {
                rotate_rows(ut, k, k + 1, c2, s2);
            }
        }
    }

    /// Iterate to completion, then make every value non-negative (negating
    /// the matching row of `Uᵀ`) and sort descending (permuting rows of
    /// `Uᵀ` and `Vᵀ` alike).
    pub fn run(
        &mut self,
        mut ut: Option<&mut DynMatrix<T>>,
        mut vt: Option<&mut DynMatrix<T>>,
    ) -> Result<(), LinalgError> {
        while !self.state.is_terminal() {
            self.step(ut.as_deref_mut(), vt.as_deref_mut());
        }
        if self.state == EngineState::Failed {
            return Err(LinalgError::ConvergenceFailure);
        }

        for i in 0..self.diag.len() {
            if self.diag[i] < T::zero() {
                self.diag[i] = -self.diag[i];
                if let Some(ut) = ut.as_deref_mut() {
                    for x in ut.row_mut(i) {
                        *x = -*x;
                    }
                }
            }
        }

        let n = self.diag.len();
        for i in 0..n {
            let mut best = i;
            for j in (i + 1)..n {
                if self.diag[j] > self.diag[best] {
                    best = j;
                }
            }
            if best != i {
                self.diag.swap(i, best);
                if let Some(ut) = ut.as_deref_mut() {
                    ut.swap_rows(i, best);
                }
                if let Some(vt) = vt.as_deref_mut() {
                    vt.swap_rows(i, best);
                }
            }
        }
        Ok(())
    }

    /// Values-only fast path. Returns the sorted singular values and a copy
    /// of the untouched input for a later [`compute_vectors`] call.
    ///
    /// [`compute_vectors`]: BidiagonalQr::compute_vectors
    pub fn compute_values(
        diag: &[T],
        off: &[T],
        max_iterations_per_value: usize,
    ) -> Result<(Vec<T>, SavedBidiagonal<T>), LinalgError> {
        let saved = SavedBidiagonal {
            diag: diag.to_vec(),
            off: off.to_vec(),
        };
        let mut engine = Self::new(diag.to_vec(), off.to_vec(), max_iterations_per_value);
        engine.run(None, None)?;
        Ok((engine.diag, saved))
    }

    /// Second phase: rerun from the saved form, accumulating rotations into
    /// `ut` / `vt`. Returns the singular values consistent with the vectors.
    pub fn compute_vectors(
        saved: SavedBidiagonal<T>,
        max_iterations_per_value: usize,
        ut: Option<&mut DynMatrix<T>>,
        vt: Option<&mut DynMatrix<T>>,
    ) -> Result<Vec<T>, LinalgError> {
        let mut engine = Self::new(saved.diag, saved.off, max_iterations_per_value);
        engine.run(ut, vt)?;
        Ok(engine.diag)
    }
}

// ── Tridiagonal (symmetric eigen) engine ────────────────────────────

/// Implicit Wilkinson-shift QR on a symmetric tridiagonal matrix.
#[derive(Debug, Clone)]
pub struct TridiagonalQr<T> {
    form: TridiagonalForm<T>,
    hi: usize,
    iterations: usize,
    max_iterations: usize,
    tiny: T,
    scale: T,
    state: EngineState,
}

impl<T: FloatScalar> TridiagonalQr<T> {
    pub fn new(mut form: TridiagonalForm<T>, max_iterations_per_value: usize) -> Self {
        let n = form.len();
        let scale = if n > 1 {
            normalize(&mut form.diag, &mut form.off)
        } else {
            T::one()
        };
        let norm = form
            .diag
            .iter()
            .chain(form.off.iter())
            .fold(T::zero(), |m, &x| m.max(x.abs()));
        Self {
            form,
            hi: n.saturating_sub(1),
            iterations: 0,
            max_iterations: max_iterations_per_value * n.max(1),
            tiny: T::epsilon() * norm,
            scale,
            state: if n <= 1 {
                EngineState::Converged
            } else {
                EngineState::Active
            },
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn values(&self) -> &[T] {
        &self.form.diag
    }

    fn terminate(&mut self, state: EngineState) -> EngineState {
        denormalize(&mut self.form.diag, &mut self.form.off, self.scale);
        self.scale = T::one();
        self.state = state;
        state
    }

    fn negligible(&self, i: usize) -> bool {
        let e = self.form.off[i].abs();
        let d = &self.form.diag;
        e <= self.tiny || e <= T::epsilon() * (d[i].abs() + d[i + 1].abs())
    }

    /// Advance by one deflation or sweep.
    pub fn step(&mut self, mut qt: Option<&mut DynMatrix<T>>) -> EngineState {
        if self.state.is_terminal() {
            return self.state;
        }
        let hi = self.hi;

        let mut lo = hi;
        while lo > 0 {
            if self.negligible(lo - 1) {
                self.form.off[lo - 1] = T::zero();
                break;
            }
            lo -= 1;
        }

        if lo == hi {
            self.hi -= 1;
            trace!(target: LOG_TARGET, "tridiagonal QR: value {} deflated after {} sweeps", hi, self.iterations);
            if self.hi == 0 {
                return self.terminate(EngineState::Converged);
            }
            self.state = EngineState::Deflated;
            return self.state;
        }

        self.iterations += 1;
        if self.iterations > self.max_iterations {
            warn!(
                target: LOG_TARGET,
                "tridiagonal QR did not converge in {} sweeps ({} values left)",
                self.max_iterations,
                hi + 1
            );
            return self.terminate(EngineState::Failed);
        }

        let (d, e) = (&mut self.form.diag, &mut self.form.off);

        // Wilkinson shift from the trailing 2x2
        let half = (d[hi - 1] - d[hi]) / T::two();
        let eh = e[hi - 1];
        let r = (half * half + eh * eh).sqrt();
        let shift = d[hi] - eh * eh / (half + if half >= T::zero() { r } else { -r });

        let mut x = d[lo] - shift;
        let mut z = e[lo];

        for k in lo..hi {
            let (c, s) = givens(x, z);
            if k > lo {
                e[k - 1] = c * x + s * z;
            }

            let (dk, dk1, ek) = (d[k], d[k + 1], e[k]);
            let two_cs = T::two() * c * s;
            d[k] = c * c * dk + two_cs * ek + s * s * dk1;
            d[k + 1] = s * s * dk - two_cs * ek + c * c * dk1;
            e[k] = c * s * (dk1 - dk) + (c * c - s * s) * ek;

            if k + 1 < hi {
                let en = e[k + 1];
                x = e[k];
                z = s * en;
                e[k + 1] = c * en;
            }

            if let Some(qt) = qt.as_deref_mut() {
                rotate_rows(qt, k, k + 1, c, s);
            }
        }

        self.state = EngineState::Active;
        self.state
    }

    /// Iterate to completion and sort ascending, permuting rows of `qt`.
    pub fn run(&mut self, mut qt: Option<&mut DynMatrix<T>>) -> Result<(), LinalgError> {
        while !self.state.is_terminal() {
            self.step(qt.as_deref_mut());
        }
        if self.state == EngineState::Failed {
            return Err(LinalgError::ConvergenceFailure);
        }

        let d = &mut self.form.diag;
        let n = d.len();
        for i in 0..n {
            let mut best = i;
            for j in (i + 1)..n {
                if d[j] < d[best] {
                    best = j;
                }
            }
            if best != i {
                d.swap(i, best);
                if let Some(qt) = qt.as_deref_mut() {
                    qt.swap_rows(i, best);
                }
            }
        }
        Ok(())
    }

    /// Values-only fast path. `form` is left untouched and a copy of it is
    /// returned as the saved state for [`compute_vectors`].
    ///
    /// [`compute_vectors`]: TridiagonalQr::compute_vectors
    pub fn compute_values(
        form: &TridiagonalForm<T>,
        max_iterations_per_value: usize,
    ) -> Result<(Vec<T>, TridiagonalForm<T>), LinalgError> {
        let mut saved = TridiagonalForm::new(Vec::new(), Vec::new());
        saved.copy_from(form);
        let mut engine = Self::new(form.clone(), max_iterations_per_value);
        engine.run(None)?;
        Ok((engine.form.diag, saved))
    }

    /// Second phase: rerun from the saved form, accumulating into the rows
    /// of `qt` (eigenvectors end up as rows).
    pub fn compute_vectors(
        mut saved: TridiagonalForm<T>,
        max_iterations_per_value: usize,
        qt: &mut DynMatrix<T>,
    ) -> Result<Vec<T>, LinalgError> {
        let mut work = TridiagonalForm::new(Vec::new(), Vec::new());
        work.swap(&mut saved);
        let mut engine = Self::new(work, max_iterations_per_value);
        engine.run(Some(qt))?;
        Ok(engine.form.diag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    fn bidiag(d: &[f64], e: &[f64]) -> DynMatrix<f64> {
        let n = d.len();
        DynMatrix::from_fn(n, n, |i, j| {
            if i == j {
                d[i]
            } else if j == i + 1 {
                e[i]
            } else {
                0.0
            }
        })
    }

    #[test]
    fn bidiagonal_vectors_reconstruct() {
        let d = [3.0, -1.0, 2.0, 0.5];
        let e = [1.0, 0.25, -2.0];
        let b = bidiag(&d, &e);

        let mut ut = DynMatrix::eye(4, 0.0);
        let mut vt = DynMatrix::eye(4, 0.0);
        let mut engine = BidiagonalQr::new(d.to_vec(), e.to_vec(), 20);
        engine.run(Some(&mut ut), Some(&mut vt)).unwrap();
        assert_eq!(engine.state(), EngineState::Converged);

        let s = engine.values();
        for w in s.windows(2) {
            assert!(w[0] >= w[1]);
        }
        assert!(s.iter().all(|&v| v >= 0.0));

        let rebuilt = &(&ut.transpose() * &DynMatrix::from_diagonal(s)) * &vt;
        assert!(rebuilt.approx_eq(&b, TOL), "rebuilt {}", rebuilt);
    }

    #[test]
    fn step_reports_deflation() {
        // already diagonal: every step deflates
        let mut engine = BidiagonalQr::new(vec![1.0, 2.0, 3.0], vec![0.0, 0.0], 20);
        assert_eq!(engine.step(None, None), EngineState::Deflated);
        assert_eq!(engine.step(None, None), EngineState::Converged);
        assert_eq!(engine.iterations(), 0);
    }

    #[test]
    fn zero_diagonal_is_chased() {
        let d = [0.0, 2.0, 1.0];
        let e = [1.0, 1.0];
        let b = bidiag(&d, &e);
        let mut ut = DynMatrix::eye(3, 0.0);
        let mut vt = DynMatrix::eye(3, 0.0);
        let mut engine = BidiagonalQr::new(d.to_vec(), e.to_vec(), 20);
        engine.run(Some(&mut ut), Some(&mut vt)).unwrap();
        let rebuilt = &(&ut.transpose() * &DynMatrix::from_diagonal(engine.values())) * &vt;
        assert!(rebuilt.approx_eq(&b, TOL));
        assert!(engine.values()[2].abs() < TOL);
    }

    #[test]
    fn two_phase_matches_single_pass() {
        let d = [4.0_f64, 3.0, -2.0, 1.0, 0.1];
        let e = [0.5_f64, 1.5, 0.2, -0.7];
        let (values, saved) = BidiagonalQr::compute_values(&d, &e, 20).unwrap();

        let mut ut = DynMatrix::eye(5, 0.0);
        let mut vt = DynMatrix::eye(5, 0.0);
        let again = BidiagonalQr::compute_vectors(saved, 20, Some(&mut ut), Some(&mut vt)).unwrap();
        for (a, b) in values.iter().zip(&again) {
            assert!((a - b).abs() < TOL);
        }
        let rebuilt = &(&ut.transpose() * &DynMatrix::from_diagonal(&again)) * &vt;
        assert!(rebuilt.approx_eq(&bidiag(&d, &e), TOL));
    }

    #[test]
    fn budget_exhaustion_fails() {
        let mut engine = BidiagonalQr::new(vec![1.0, 2.0, 3.0], vec![1.0, 1.0], 0);
        assert_eq!(engine.run(None, None), Err(LinalgError::ConvergenceFailure));
        assert_eq!(engine.state(), EngineState::Failed);
    }

    #[test]
    fn tridiagonal_vectors_reconstruct() {
        let form = TridiagonalForm::new(vec![2.0, -1.0, 3.0, 0.5], vec![1.0, 0.5, -1.5]);
        let t = form.to_matrix();
        let (values, saved) = TridiagonalQr::compute_values(&form, 20).unwrap();
        for w in values.windows(2) {
            assert!(w[0] <= w[1]);
        }

        let mut qt = DynMatrix::eye(4, 0.0);
        let vals = TridiagonalQr::compute_vectors(saved, 20, &mut qt).unwrap();
        let rebuilt = &(&qt.transpose() * &DynMatrix::from_diagonal(&vals)) * &qt;
        assert!(rebuilt.approx_eq(&t, TOL));
        for (a, b) in values.iter().zip(&vals) {
            assert!((a - b).abs() < TOL);
        }
    }

    #[test]
    fn tridiagonal_trace_preserved() {
        let form = TridiagonalForm::new(vec![1.0, 1.0, 1.0], vec![1e-300, 1.0]);
        let (values, _) = TridiagonalQr::compute_values(&form, 20).unwrap();
        let sum: f64 = values.iter().sum();
        assert!((sum - 3.0).abs() < TOL);
    }
}
