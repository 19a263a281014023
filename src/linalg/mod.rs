//! Dense factorizations.
//!
//! Every decomposition owns its packed factorization and hands out
//! independent copies of the factors through its result trait. Packed
//! layouts are documented on each type.

pub(crate) mod bidiagonal;
pub(crate) mod cholesky;
pub(crate) mod hessenberg;
pub(crate) mod householder;
pub(crate) mod implicit_qr;
pub(crate) mod lu;
pub(crate) mod qr;
pub(crate) mod qr_column;
pub(crate) mod result;
pub(crate) mod schur;
pub(crate) mod svd;
pub(crate) mod symmetric_eigen;
pub mod triangular;
pub(crate) mod tridiagonal;

pub use bidiagonal::BidiagonalDecomposition;
pub use cholesky::{CholeskyDecomposition, LdlDecomposition, Triangle};
pub use hessenberg::HessenbergDecomposition;
pub use implicit_qr::{BidiagonalQr, EngineState, SavedBidiagonal, TridiagonalQr};
pub use lu::LuDecomposition;
pub use qr::QrDecomposition;
pub use qr_column::QrColumnDecomposition;
pub use result::{
    BidiagonalResult, CholeskyResult, EigenResult, HessenbergResult, LuResult, QrResult,
    SvdResult, TridiagonalResult,
};
pub use schur::GeneralEigen;
pub use svd::{SvdDecomposition, SvdSettings};
pub use symmetric_eigen::{EigenSettings, SymmetricEigen};
pub use tridiagonal::{TridiagonalDecomposition, TridiagonalForm};

use thiserror::Error;

/// Log target shared by every event the library emits.
pub(crate) const LOG_TARGET: &str = "densela";

/// Errors from the numerical side of a factorization.
///
/// Shape errors (non-square input where a square one is required, mismatched
/// right-hand sides, asking for a factor that was switched off in the
/// settings) are programming errors and panic instead.
///
/// ```
/// use densela::DynMatrix;
/// use densela::linalg::LinalgError;
///
/// let not_pd = DynMatrix::from_rows(2, 2, &[1.0_f64, 5.0, 5.0, 1.0]);
/// assert_eq!(not_pd.cholesky().unwrap_err(), LinalgError::NotPositiveDefinite);
/// ```
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinalgError {
    /// Matrix is singular or nearly singular.
    #[error("matrix is singular")]
    Singular,
    /// Matrix is not symmetric positive definite (required for Cholesky).
    #[error("matrix is not positive definite")]
    NotPositiveDefinite,
    /// Iterative algorithm did not converge within the iteration budget.
    #[error("iterative algorithm did not converge")]
    ConvergenceFailure,
}
