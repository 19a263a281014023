//! # densela
//!
//! Dense linear algebra on row-major, heap-allocated matrices: the classic
//! factorizations and the solvers built on top of them, generic over `f32`
//! and `f64`.
//!
//! ## Quick start
//!
//! ```
//! use densela::DynMatrix;
//! use densela::linalg::{LuResult, SvdResult};
//!
//! let a = DynMatrix::from_rows(3, 3, &[5.0_f64, 2.0, 3.0, 1.5, -2.0, 8.0, -3.0, 4.7, -0.5]);
//!
//! // P·A = L·U
//! let lu = a.lu();
//! let pa = &lu.get_p(false) * &a;
//! assert!(pa.approx_eq(&(&lu.get_l() * &lu.get_u()), 1e-12));
//!
//! // A = U·W·Vᵀ
//! let svd = a.svd().unwrap();
//! let rebuilt = &(&svd.get_u(false) * &svd.get_w()) * &svd.get_v(true);
//! assert!(rebuilt.approx_eq(&a, 1e-10));
//! ```
//!
//! ## Modules
//!
//! - [`dynmatrix`] — `DynMatrix<T>` with runtime dimensions, `Vec<T>`
//!   row-major storage, arithmetic operators and convenience entry points
//!   (`a.lu()`, `a.svd()`, `a.solve(&b)`, ...).
//!
//! - [`linalg`] — the factorizations. Each one owns a packed in-place
//!   representation plus its auxiliary scalars (pivots, Householder `γ`s) and
//!   materializes factors on demand through its result trait:
//!   - LU with partial pivoting ([`LuResult`](linalg::LuResult))
//!   - Householder QR, row-major and column-major ([`QrResult`](linalg::QrResult))
//!   - Cholesky `L·Lᵀ` / `Rᵀ·R` and `L·D·Lᵀ` ([`CholeskyResult`](linalg::CholeskyResult))
//!   - bidiagonal, Hessenberg and symmetric tridiagonal reductions
//!   - SVD and symmetric eigen-decomposition on an implicit-shift QR engine
//!     with explicit states ([`EngineState`](linalg::EngineState))
//!   - general eigenvalues through the real Schur form
//!
//! - [`solver`] — [`LinearSolver`](solver::LinearSolver) implementations on
//!   LU, Cholesky and QR (least squares), and the copying
//!   [`SafeSolver`](solver::SafeSolver) wrapper.
//!
//! - [`backend`] — the [`Kernels`](backend::Kernels) strategy for the inner
//!   dot/axpy loops. Decompositions and solvers take one through their
//!   `with_kernels` constructors and default to [`Software`](backend::Software).
//!
//! - [`traits`] — element traits:
//!   - [`Scalar`] — all matrix elements (`Copy + PartialEq + Debug + Zero + One + Num`)
//!   - [`FloatScalar`] — real floats (`Scalar + Float`), used by every algorithm
//!   - [`MatrixRef`] / [`MatrixMut`] — row-slice access for the kernels
//!
//! ## Errors and logging
//!
//! Numerical failures come back as [`LinalgError`](linalg::LinalgError).
//! Shape mismatches are programming errors and panic. Diagnostic events go
//! through the `log` facade under the `densela` target; no logger is
//! installed by the library.

pub mod backend;
pub mod dynmatrix;
pub mod linalg;
pub mod solver;
pub mod traits;

pub use dynmatrix::DynMatrix;
pub use num_complex::Complex;
pub use traits::{FloatScalar, MatrixMut, MatrixRef, Scalar};
