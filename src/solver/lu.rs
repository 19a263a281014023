use crate::backend::{Kernels, Software};
use crate::linalg::lu::crout_in_place;
use crate::linalg::triangular::{quality, solve_unit_lower, solve_upper};
use crate::linalg::{LinalgError, LuDecomposition, LuResult};
use crate::solver::{read_column, write_column, LinearSolver};
use crate::traits::FloatScalar;
use crate::DynMatrix;

/// Square solver on LU with partial pivoting.
///
/// `set_a` copies `A` into the solver's own packed buffer, so neither input
/// is modified. Buffers are kept between `set_a` calls and only grow.
#[derive(Debug, Clone)]
pub struct LuSolver<T, K = Software> {
    lu: DynMatrix<T>,
    pivot: Vec<usize>,
    vv: Vec<T>,
    t: Vec<T>,
    ready: bool,
    kernels: K,
}

impl<T: FloatScalar> LuSolver<T> {
    pub fn new() -> Self {
        Self::with_kernels(Software)
    }
}

impl<T: FloatScalar> Default for LuSolver<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: FloatScalar, K: Kernels<T>> LuSolver<T, K> {
    pub fn with_kernels(kernels: K) -> Self {
        Self {
            lu: DynMatrix::zeros(0, 0, T::zero()),
            pivot: Vec::new(),
            vv: Vec::new(),
            t: Vec::new(),
            ready: false,
            kernels,
        }
    }

    /// The current packed factor.
    pub fn packed(&self) -> &DynMatrix<T> {
        &self.lu
    }

    fn order(&self) -> usize {
        assert!(self.ready, "LuSolver used before a successful set_a");
        self.lu.nrows()
    }
}

impl<T: FloatScalar, K: Kernels<T>> LinearSolver<T> for LuSolver<T, K> {
    fn set_a(&mut self, a: &mut DynMatrix<T>) -> Result<(), LinalgError> {
        assert!(a.is_square(), "LuSolver requires a square matrix, got {}x{}", a.nrows(), a.ncols());
        let n = a.nrows();
        self.ready = false;
        self.lu.copy_from(a);
        self.pivot.resize(n, 0);
        self.vv.resize(n, T::zero());
        self.t.resize(n, T::zero());
        crout_in_place(&self.kernels, &mut self.lu, &mut self.pivot, &mut self.vv);

        if (0..n).any(|i| self.lu[(i, i)].abs() < T::epsilon()) {
            return Err(LinalgError::Singular);
        }
        self.ready = true;
        Ok(())
    }

    fn solve(&mut self, b: &mut DynMatrix<T>, x: &mut DynMatrix<T>) {
        let n = self.order();
        assert_eq!(b.nrows(), n, "B has {} rows, expected {}", b.nrows(), n);
        let k = b.ncols();
        x.reshape(n, k);
        for j in 0..k {
            read_column(b, j, &mut self.vv);
            for (ti, &p) in self.t.iter_mut().zip(&self.pivot) {
                *ti = self.vv[p];
            }
            solve_unit_lower(&self.kernels, &self.lu, &mut self.t);
            solve_upper(&self.kernels, &self.lu, &mut self.t);
            write_column(x, j, &self.t);
        }
    }

    fn invert(&mut self) -> DynMatrix<T> {
        let n = self.order();
        let mut id = DynMatrix::eye(n, T::zero());
        let mut inv = DynMatrix::zeros(n, n, T::zero());
        self.solve(&mut id, &mut inv);
        inv
    }

    fn quality(&self) -> T {
        self.order();
        quality(&self.lu)
    }

    fn modifies_a(&self) -> bool {
        false
    }

    fn modifies_b(&self) -> bool {
        false
    }
}

impl<T: FloatScalar, K: Kernels<T>> From<LuDecomposition<T, K>> for LuSolver<T, K> {
    /// Adopt an existing factorization without refactoring. A singular
    /// factorization is adopted too; its `quality` is then zero or tiny.
    fn from(lu: LuDecomposition<T, K>) -> Self {
        assert!(lu.packed().is_square(), "LuSolver requires a square factorization");
        let n = lu.packed().nrows();
        Self {
            pivot: lu.pivot().to_vec(),
            lu: lu.packed().clone(),
            vv: vec![T::zero(); n],
            t: vec![T::zero(); n],
            ready: true,
            kernels: lu.kernels().clone(),
        }
    }
}
