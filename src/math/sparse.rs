//! Sparse storage and factorization for the assembled global system
//!
//! Frame stiffness matrices are overwhelmingly sparse and, after boundary
//! treatment, symmetric positive definite with a banded profile. Assembly
//! accumulates COO triplets and compresses to CSR; the solve uses a
//! skyline-profile Cholesky factorization whose fill stays inside the
//! envelope of the assembled matrix.

use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// Incremental COO builder for symmetric global matrices.
pub struct SparseBuilder {
    size: usize,
    entries: Vec<(usize, usize, f64)>,
}

impl SparseBuilder {
    /// Create a builder pre-sized for the expected number of element
    /// contributions (each frame element touches at most 144 entries).
    pub fn with_capacity(size: usize, estimated_nnz: usize) -> Self {
        Self {
            size,
            entries: Vec::with_capacity(estimated_nnz),
        }
    }

    /// Accumulate a value; duplicate coordinates are summed on compression.
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        if value != 0.0 {
            self.entries.push((row, col, value));
        }
    }

    /// Number of raw entries accumulated so far.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Compress to CSR for solves and mat-vec products.
    pub fn to_csr(&self) -> CsrMatrix<f64> {
        let mut coo = CooMatrix::new(self.size, self.size);
        for &(row, col, val) in &self.entries {
            coo.push(row, col, val);
        }
        CsrMatrix::from(&coo)
    }
}

/// y = A * x for CSR storage, with a fixed accumulation order so repeated
/// solves on identical inputs are bitwise reproducible.
pub fn matvec(csr: &CsrMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    let n = csr.nrows();
    let mut y = DVector::zeros(n);

    let row_offsets = csr.row_offsets();
    let col_indices = csr.col_indices();
    let values = csr.values();

    for row in 0..n {
        let mut sum = 0.0;
        for idx in row_offsets[row]..row_offsets[row + 1] {
            sum += values[idx] * x[col_indices[idx]];
        }
        y[row] = sum;
    }

    y
}

/// Maximum absolute column sum, i.e. the matrix 1-norm.
pub fn one_norm(csr: &CsrMatrix<f64>) -> f64 {
    let mut col_sums = vec![0.0_f64; csr.ncols()];
    for (_, col, &val) in csr.triplet_iter() {
        col_sums[col] += val.abs();
    }
    col_sums.into_iter().fold(0.0, f64::max)
}

/// Cholesky factorization in skyline (profile) storage.
///
/// Each row stores the span from its first structural non-zero to the
/// diagonal; profile Cholesky produces no fill outside that envelope. Rows
/// reduced to a bare penalty diagonal keep a zero-height profile, so fully
/// restrained DOFs cost nothing extra.
pub struct SkylineCholesky {
    size: usize,
    rows: Vec<Vec<f64>>,
    first: Vec<usize>,
}

impl SkylineCholesky {
    /// Factor a symmetric positive definite CSR matrix. Only the lower
    /// triangle is read; symmetry is the caller's invariant.
    pub fn factor(csr: &CsrMatrix<f64>) -> Result<Self, &'static str> {
        let size = csr.nrows();

        let mut first: Vec<usize> = (0..size).collect();
        for (row, col, _) in csr.triplet_iter() {
            if col < row && col < first[row] {
                first[row] = col;
            }
        }

        let mut rows: Vec<Vec<f64>> = (0..size)
            .map(|i| vec![0.0; i - first[i] + 1])
            .collect();
        for (row, col, &val) in csr.triplet_iter() {
            if col <= row {
                rows[row][col - first[row]] += val;
            }
        }

        let mut factor = Self { size, rows, first };
        factor.decompose()?;
        Ok(factor)
    }

    fn decompose(&mut self) -> Result<(), &'static str> {
        for i in 0..self.size {
            let first_i = self.first[i];

            for j in first_i..i {
                let start = first_i.max(self.first[j]);
                let mut sum = 0.0;
                for k in start..j {
                    sum += self.get(i, k) * self.get(j, k);
                }
                let pivot = self.get(j, j);
                if pivot.abs() < 1e-150 {
                    return Err("zero pivot in Cholesky factorization");
                }
                let idx = j - first_i;
                self.rows[i][idx] = (self.rows[i][idx] - sum) / pivot;
            }

            let mut sum = 0.0;
            for k in first_i..i {
                let val = self.get(i, k);
                sum += val * val;
            }
            let diagonal = self.rows[i][i - first_i] - sum;
            if diagonal <= 0.0 || !diagonal.is_finite() {
                return Err("matrix is not positive definite");
            }
            self.rows[i][i - first_i] = diagonal.sqrt();
        }
        Ok(())
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> f64 {
        debug_assert!(col <= row);
        if col < self.first[row] {
            0.0
        } else {
            self.rows[row][col - self.first[row]]
        }
    }

    /// Solve L Lᵀ x = b by forward and backward substitution.
    pub fn solve(&self, b: &DVector<f64>) -> DVector<f64> {
        let mut x = b.clone();

        for i in 0..self.size {
            let mut sum = 0.0;
            for j in self.first[i]..i {
                sum += self.get(i, j) * x[j];
            }
            x[i] = (x[i] - sum) / self.get(i, i);
        }

        for i in (0..self.size).rev() {
            x[i] /= self.get(i, i);
            let xi = x[i];
            for j in self.first[i]..i {
                x[j] -= self.get(i, j) * xi;
            }
        }

        x
    }
}
