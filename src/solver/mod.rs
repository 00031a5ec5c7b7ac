//! Solvers layered on the assembled global system

pub mod linear;
pub mod modal;
pub mod spectrum;

use nalgebra::{DMatrix, DVector, Dyn, LU};
use nalgebra_sparse::CsrMatrix;

use crate::math::SkylineCholesky;

/// A factorized symmetric system. Cholesky is preferred while the matrix is
/// certifiably positive definite; dense LU is the fallback (shifted modal
/// operators may be indefinite, and near-singular static systems still get
/// a best-effort solve before the conditioning check rejects them).
pub enum Factorization {
    Cholesky(SkylineCholesky),
    Lu(LU<f64, Dyn, Dyn>),
}

impl Factorization {
    /// Factor a sparse symmetric matrix, falling back from Cholesky to
    /// dense LU. Returns `None` when both factorizations fail.
    pub fn new(matrix: &CsrMatrix<f64>) -> Option<Self> {
        if let Ok(cholesky) = SkylineCholesky::factor(matrix) {
            return Some(Self::Cholesky(cholesky));
        }
        log::debug!("Cholesky factorization failed, falling back to dense LU");

        let dense = csr_to_dense(matrix);
        let lu = dense.lu();
        // LU in nalgebra always "succeeds"; probe it with a solve so a
        // structurally singular matrix is rejected here.
        let probe = DVector::from_element(matrix.nrows(), 1.0);
        lu.solve(&probe)?;
        Some(Self::Lu(lu))
    }

    pub fn solve(&self, rhs: &DVector<f64>) -> Option<DVector<f64>> {
        match self {
            Self::Cholesky(cholesky) => Some(cholesky.solve(rhs)),
            Self::Lu(lu) => lu.solve(rhs),
        }
    }

    pub fn is_cholesky(&self) -> bool {
        matches!(self, Self::Cholesky(_))
    }
}

/// Expand sparse storage to dense, for the LU fallback and small-system
/// condition estimates.
pub fn csr_to_dense(matrix: &CsrMatrix<f64>) -> DMatrix<f64> {
    let mut dense = DMatrix::zeros(matrix.nrows(), matrix.ncols());
    for (i, j, &value) in matrix.triplet_iter() {
        dense[(i, j)] += value;
    }
    dense
}
