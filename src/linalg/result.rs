use num_complex::Complex;

use crate::linalg::tridiagonal::TridiagonalForm;
use crate::traits::FloatScalar;
use crate::DynMatrix;

/// LU factorization with row pivoting: `P·A = L·U`.
pub trait LuResult<T: FloatScalar> {
    /// Unit lower-triangular factor, `m x min(m, n)`.
    fn get_l(&self) -> DynMatrix<T>;

    /// Upper-triangular factor, `min(m, n) x n`.
    fn get_u(&self) -> DynMatrix<T>;

    /// Row permutation matrix `P` with `P·A = L·U`; `transposed` returns `Pᵀ`
    /// so that `A = Pᵀ·L·U`.
    fn get_p(&self, transposed: bool) -> DynMatrix<T>;

    /// `pivot()[i]` is the original row that ended up in row `i`.
    fn pivot(&self) -> &[usize];

    /// `+1` for an even number of row exchanges, `-1` for odd.
    fn pivot_sign(&self) -> T;

    /// `true` if any diagonal entry of `U` is below machine epsilon in
    /// magnitude.
    fn is_singular(&self) -> bool;

    /// Determinant. Panics for a non-square input.
    fn determinant(&self) -> T;
}

/// Householder QR factorization: `A = Q·R`.
pub trait QrResult<T: FloatScalar> {
    /// Orthogonal factor: `m x min(m, n)` when `compact`, otherwise `m x m`.
    fn get_q(&self, compact: bool) -> DynMatrix<T>;

    /// Upper-triangular factor: `min(m, n) x n` when `compact`, otherwise
    /// `m x n`.
    fn get_r(&self, compact: bool) -> DynMatrix<T>;

    /// Reflector scale factors `γ_k`, one per reflected column.
    fn gammas(&self) -> &[T];

    /// `true` if some column was exactly zero below the diagonal, in which
    /// case its reflector is the identity (`γ = 0`).
    fn is_degenerate(&self) -> bool;
}

/// Cholesky factorization of a symmetric positive definite matrix.
pub trait CholeskyResult<T: FloatScalar> {
    /// `true` for `A = L·Lᵀ`, `false` for `A = Rᵀ·R`.
    fn is_lower(&self) -> bool;

    /// The stored triangular factor (`L` or `R`), with the opposite
    /// triangle zeroed.
    fn get_t(&self) -> DynMatrix<T>;

    /// Lower factor of `A = L·Lᵀ`, whichever triangle was computed
    /// (`L = Rᵀ` for the upper form).
    fn get_l(&self) -> DynMatrix<T> {
        if self.is_lower() {
            self.get_t()
        } else {
            self.get_t().transpose()
        }
    }

    /// Upper factor of `A = Uᵀ·U`, i.e. `Lᵀ`.
    fn get_u(&self) -> DynMatrix<T> {
        if self.is_lower() {
            self.get_t().transpose()
        } else {
            self.get_t()
        }
    }

    fn determinant(&self) -> T;
}

/// Upper bidiagonal factorization `A = U·B·Vᵀ`.
pub trait BidiagonalResult<T: FloatScalar> {
    /// Bidiagonal factor. Compact: `min(m, n) x w` where `w = min + 1` for
    /// wide inputs and `min` otherwise; full: `m x n`.
    fn get_b(&self, compact: bool) -> DynMatrix<T>;

    /// Left orthogonal factor (`m x min` compact, `m x m` full), or its
    /// transpose.
    fn get_u(&self, transpose: bool, compact: bool) -> DynMatrix<T>;

    /// Right orthogonal factor (`n x w` compact, `n x n` full), or its
    /// transpose.
    fn get_v(&self, transpose: bool, compact: bool) -> DynMatrix<T>;

    /// Diagonal and superdiagonal of `B`.
    fn diagonal(&self) -> (Vec<T>, Vec<T>);
}

/// Orthogonal similarity to upper Hessenberg form: `A = Q·H·Qᵀ`.
pub trait HessenbergResult<T: FloatScalar> {
    fn get_h(&self) -> DynMatrix<T>;

    fn get_q(&self, transposed: bool) -> DynMatrix<T>;
}

/// Orthogonal similarity of a symmetric matrix to tridiagonal form:
/// `A = Q·T·Qᵀ`.
pub trait TridiagonalResult<T: FloatScalar> {
    fn get_t(&self) -> DynMatrix<T>;

    fn get_q(&self, transposed: bool) -> DynMatrix<T>;

    /// Diagonal and off-diagonal of `T` as an owned compact form.
    fn diagonal(&self) -> TridiagonalForm<T>;
}

/// Singular value decomposition `A = U·W·Vᵀ`.
pub trait SvdResult<T: FloatScalar> {
    /// Non-negative singular values, sorted descending.
    fn singular_values(&self) -> &[T];

    fn num_singular_values(&self) -> usize {
        self.singular_values().len()
    }

    /// Left singular vectors as columns (rows when `transpose`).
    ///
    /// Panics if `U` was not requested in the settings.
    fn get_u(&self, transpose: bool) -> DynMatrix<T>;

    /// Right singular vectors as columns (rows when `transpose`).
    ///
    /// Panics if `V` was not requested in the settings.
    fn get_v(&self, transpose: bool) -> DynMatrix<T>;

    /// Diagonal matrix of singular values, shaped to match `U` and `V`.
    fn get_w(&self) -> DynMatrix<T>;
}

/// Eigenvalues (and, when available, eigenvectors) of a square matrix.
pub trait EigenResult<T: FloatScalar> {
    fn number_of_eigenvalues(&self) -> usize;

    fn eigenvalue(&self, index: usize) -> Complex<T>;

    /// Unit-norm real eigenvector for `eigenvalue(index)`, or `None` when the
    /// eigenvalue is complex or vectors were not computed.
    fn eigenvector(&self, index: usize) -> Option<Vec<T>>;
}
