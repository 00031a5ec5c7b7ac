//! Modal analysis: the generalized symmetric eigenproblem K φ = λ M φ
//!
//! Uses shift-invert Lanczos with the M-inner product so the lowest modes of
//! large sparse systems converge in a handful of operator applications. The
//! boundary-treated matrices pair a penalty-stiffened K with a mass matrix
//! whose restrained rows are zero, which pushes restrained DOFs out of the
//! finite spectrum entirely.

use log::{info, warn};
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

use crate::assembler::DOF_PER_NODE;
use crate::math::sparse::matvec;
use crate::results::{ModalResult, ModalStatus};
use crate::solver::Factorization;

/// Ritz values below this magnitude belong to the infinite (restrained) part
/// of the spectrum and are discarded.
const RITZ_FLOOR: f64 = 1e-13;
/// Lanczos breakdown threshold on the squared M-norm of the residual.
const BREAKDOWN: f64 = 1e-24;

/// Eigensolver settings.
#[derive(Debug, Clone)]
pub struct ModalSettings {
    /// Number of modes requested; capped at N - 1.
    pub num_modes: usize,
    /// Shift σ for shift-invert; the default 0 targets the lowest modes.
    pub shift: f64,
    /// Relative convergence tolerance on the Ritz residual estimate.
    pub tolerance: f64,
}

impl Default for ModalSettings {
    fn default() -> Self {
        Self {
            num_modes: 10,
            shift: 0.0,
            tolerance: 1e-8,
        }
    }
}

impl ModalSettings {
    pub fn new(num_modes: usize) -> Self {
        Self {
            num_modes,
            ..Self::default()
        }
    }
}

/// Influence vector for uniform base excitation along global Z: 1 at every
/// z-translation DOF, zero elsewhere (the seismic vertical convention).
pub fn influence_z(num_dofs: usize) -> DVector<f64> {
    let mut r = DVector::zeros(num_dofs);
    let mut dof = 2;
    while dof < num_dofs {
        r[dof] = 1.0;
        dof += DOF_PER_NODE;
    }
    r
}

/// Solve for the lowest modes of (K - λM)φ = 0.
///
/// Mode shapes come back mass-normalized (φᵀMφ = 1) with the sign convention
/// that the largest-magnitude component is positive, so independent runs
/// agree bitwise. Participation factors and effective modal masses are
/// evaluated against the supplied influence vector.
pub fn solve_modal(
    stiffness: &CsrMatrix<f64>,
    mass: &CsrMatrix<f64>,
    settings: &ModalSettings,
    influence: &DVector<f64>,
    node_ids: Vec<i64>,
) -> ModalResult {
    let n = stiffness.nrows();
    let requested = settings.num_modes.min(n.saturating_sub(1));
    if requested == 0 {
        return ModalResult::empty(ModalStatus::Converged, node_ids, n);
    }

    info!(
        "solving eigenvalue problem for {} modes (shift {:.3e})",
        requested, settings.shift
    );

    let shifted;
    let operator = if settings.shift == 0.0 {
        stiffness
    } else {
        shifted = shifted_operator(stiffness, mass, settings.shift);
        &shifted
    };

    let factor = match Factorization::new(operator) {
        Some(factor) => factor,
        None => {
            return ModalResult::empty(
                ModalStatus::failed("shifted stiffness could not be factorized", 0),
                node_ids,
                n,
            )
        }
    };

    let lanczos = match run_lanczos(&factor, mass, requested, n) {
        Ok(lanczos) => lanczos,
        Err(message) => {
            return ModalResult::empty(ModalStatus::failed(message, 0), node_ids, n)
        }
    };

    let steps = lanczos.alphas.len();
    let tridiagonal = DMatrix::from_fn(steps, steps, |i, j| {
        if i == j {
            lanczos.alphas[i]
        } else if i.abs_diff(j) == 1 {
            lanczos.betas[i.min(j)]
        } else {
            0.0
        }
    });
    let eigen = SymmetricEigen::new(tridiagonal);
    let beta_last = lanczos.betas[steps - 1];

    // Ritz values θ approximate 1/(λ - σ); recover λ and walk the spectrum
    // upward, accepting modes only while each one has converged.
    let mut candidates: Vec<(f64, usize, f64)> = Vec::new();
    for l in 0..steps {
        let theta = eigen.eigenvalues[l];
        if !theta.is_finite() || theta.abs() < RITZ_FLOOR {
            continue;
        }
        let lambda = settings.shift + 1.0 / theta;
        if !(lambda > 0.0) {
            continue;
        }
        let residual = (beta_last * eigen.eigenvectors[(steps - 1, l)]).abs();
        candidates.push((lambda, l, residual / theta.abs()));
    }
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut accepted: Vec<(f64, DVector<f64>)> = Vec::new();
    for &(lambda, l, relative_residual) in &candidates {
        if accepted.len() == requested {
            break;
        }
        if relative_residual > settings.tolerance {
            break;
        }

        let mut shape = DVector::zeros(n);
        for (j, q) in lanczos.basis.iter().enumerate() {
            shape.axpy(eigen.eigenvectors[(j, l)], q, 1.0);
        }

        let modal_mass = shape.dot(&matvec(mass, &shape));
        if !(modal_mass > 0.0) || !modal_mass.is_finite() {
            break;
        }
        shape /= modal_mass.sqrt();

        // Deterministic sign: largest-magnitude component positive.
        let mut max_index = 0;
        let mut max_abs = 0.0_f64;
        for (i, value) in shape.iter().enumerate() {
            if value.abs() > max_abs {
                max_abs = value.abs();
                max_index = i;
            }
        }
        if shape[max_index] < 0.0 {
            shape.neg_mut();
        }

        accepted.push((lambda, shape));
    }

    let recovered = accepted.len();
    let status = if recovered == requested {
        ModalStatus::Converged
    } else {
        warn!(
            "eigensolver converged {recovered} of {requested} requested modes"
        );
        ModalStatus::failed("eigensolver did not converge all requested modes", recovered)
    };

    let mut frequencies_hz = Vec::with_capacity(recovered);
    let mut periods_s = Vec::with_capacity(recovered);
    let mut mode_shapes = DMatrix::zeros(n, recovered);
    for (i, (lambda, shape)) in accepted.iter().enumerate() {
        let omega = lambda.sqrt();
        let frequency = omega / (2.0 * std::f64::consts::PI);
        frequencies_hz.push(frequency);
        periods_s.push(1.0 / frequency);
        mode_shapes.set_column(i, shape);
    }

    info!("modal analysis recovered {recovered} modes");

    let mut result = ModalResult {
        status,
        node_ids,
        frequencies_hz,
        periods_s,
        mode_shapes,
        participation: Vec::new(),
        effective_mass: Vec::new(),
        mass_ratio: Vec::new(),
        cumulative_ratio: Vec::new(),
        total_mass: 0.0,
    };
    attach_participation(&mut result, mass, influence);
    result
}

struct LanczosBasis {
    basis: Vec<DVector<f64>>,
    alphas: Vec<f64>,
    betas: Vec<f64>,
}

/// M-inner-product Lanczos on the operator (K - σM)⁻¹ M with full
/// reorthogonalization. The start vector is a fixed pseudo-random sequence:
/// deterministic across runs, yet without the symmetry that would hide
/// antisymmetric modes from an all-ones start.
fn run_lanczos(
    factor: &Factorization,
    mass: &CsrMatrix<f64>,
    requested: usize,
    n: usize,
) -> Result<LanczosBasis, &'static str> {
    let max_steps = n.min((3 * requested + 30).max(40));

    let mut q = deterministic_start(n);
    let mq = matvec(mass, &q);
    let norm2 = q.dot(&mq);
    if !(norm2 > 0.0) || !norm2.is_finite() {
        return Err("mass matrix carries no mass on any free DOF");
    }
    let norm = norm2.sqrt();
    q /= norm;

    let mut basis = vec![q];
    let mut m_basis = vec![mq / norm];
    let mut alphas: Vec<f64> = Vec::with_capacity(max_steps);
    let mut betas: Vec<f64> = Vec::with_capacity(max_steps);

    for j in 0..max_steps {
        let mut w = factor
            .solve(&m_basis[j])
            .ok_or("operator solve failed during Lanczos iteration")?;
        let alpha = w.dot(&m_basis[j]);
        if !alpha.is_finite() {
            return Err("non-finite Lanczos coefficient");
        }

        w.axpy(-alpha, &basis[j], 1.0);
        if j > 0 {
            w.axpy(-betas[j - 1], &basis[j - 1], 1.0);
        }
        // Full reorthogonalization keeps the basis M-orthonormal in floating
        // point; without it spurious duplicate modes appear.
        for (q_i, mq_i) in basis.iter().zip(&m_basis) {
            let overlap = w.dot(mq_i);
            w.axpy(-overlap, q_i, 1.0);
        }

        alphas.push(alpha);

        let mw = matvec(mass, &w);
        let beta2 = w.dot(&mw);
        if !beta2.is_finite() {
            return Err("non-finite Lanczos coefficient");
        }
        if beta2 <= BREAKDOWN {
            // Invariant subspace found; every Ritz pair is exact.
            betas.push(0.0);
            break;
        }
        let beta = beta2.sqrt();
        betas.push(beta);

        if j + 1 < max_steps {
            basis.push(&w / beta);
            m_basis.push(&mw / beta);
        }
    }

    Ok(LanczosBasis {
        basis,
        alphas,
        betas,
    })
}

/// K - σM merged in sparse form.
fn shifted_operator(
    stiffness: &CsrMatrix<f64>,
    mass: &CsrMatrix<f64>,
    shift: f64,
) -> CsrMatrix<f64> {
    let n = stiffness.nrows();
    let mut coo = CooMatrix::new(n, n);
    for (i, j, &value) in stiffness.triplet_iter() {
        coo.push(i, j, value);
    }
    for (i, j, &value) in mass.triplet_iter() {
        coo.push(i, j, -shift * value);
    }
    CsrMatrix::from(&coo)
}

/// Fixed linear-congruential sequence mapped into [-0.5, 0.5).
fn deterministic_start(n: usize) -> DVector<f64> {
    let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
    DVector::from_fn(n, |_, _| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5
    })
}

/// Participation factor Γ = φᵀMr / φᵀMφ, effective modal mass Γ²·(φᵀMφ),
/// and mass participation against rᵀMr with its cumulative sum.
fn attach_participation(result: &mut ModalResult, mass: &CsrMatrix<f64>, influence: &DVector<f64>) {
    let num_modes = result.frequencies_hz.len();
    let m_influence = matvec(mass, influence);
    let total_mass = influence.dot(&m_influence);

    let mut participation = Vec::with_capacity(num_modes);
    let mut effective_mass = Vec::with_capacity(num_modes);
    for i in 0..num_modes {
        let shape = result.mode_shapes.column(i);
        let numerator = shape.dot(&m_influence);
        let denominator = shape.dot(&matvec(mass, &shape.clone_owned()));
        if denominator.abs() > 1e-12 {
            let gamma = numerator / denominator;
            participation.push(gamma);
            effective_mass.push(gamma * gamma * denominator);
        } else {
            participation.push(0.0);
            effective_mass.push(0.0);
        }
    }

    let mut cumulative = 0.0;
    let mut mass_ratio = Vec::with_capacity(num_modes);
    let mut cumulative_ratio = Vec::with_capacity(num_modes);
    for &m_eff in &effective_mass {
        let ratio = if total_mass > 0.0 {
            m_eff / total_mass
        } else {
            0.0
        };
        cumulative += ratio;
        mass_ratio.push(ratio);
        cumulative_ratio.push(cumulative);
    }

    result.participation = participation;
    result.effective_mass = effective_mass;
    result.mass_ratio = mass_ratio;
    result.cumulative_ratio = cumulative_ratio;
    result.total_mass = total_mass;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::SparseBuilder;
    use approx::assert_relative_eq;

    fn diagonal_system(k_diag: &[f64]) -> (CsrMatrix<f64>, CsrMatrix<f64>) {
        let n = k_diag.len();
        let mut k = SparseBuilder::with_capacity(n, n);
        let mut m = SparseBuilder::with_capacity(n, n);
        for (i, &value) in k_diag.iter().enumerate() {
            k.add(i, i, value);
            m.add(i, i, 1.0);
        }
        (k.to_csr(), m.to_csr())
    }

    #[test]
    fn diagonal_eigenvalues_are_recovered_in_order() {
        let (k, m) = diagonal_system(&[9.0, 2.0, 5.0]);
        let influence = DVector::from_element(3, 1.0);
        let result = solve_modal(&k, &m, &ModalSettings::new(2), &influence, vec![1, 2, 3]);

        assert!(matches!(result.status, ModalStatus::Converged));
        let two_pi = 2.0 * std::f64::consts::PI;
        assert_relative_eq!(result.frequencies_hz[0], 2.0_f64.sqrt() / two_pi, epsilon = 1e-9);
        assert_relative_eq!(result.frequencies_hz[1], 5.0_f64.sqrt() / two_pi, epsilon = 1e-9);
    }

    #[test]
    fn mode_shapes_are_mass_normalized_with_positive_peak() {
        let (k, m) = diagonal_system(&[4.0, 1.0, 16.0, 9.0]);
        let influence = influence_z(4);
        let result = solve_modal(&k, &m, &ModalSettings::new(3), &influence, vec![1, 2, 3, 4]);

        for i in 0..3 {
            let shape = result.mode_shapes.column(i);
            let norm: f64 = shape.iter().map(|v| v * v).sum();
            assert_relative_eq!(norm, 1.0, epsilon = 1e-10);
            let peak = shape.iter().cloned().fold(0.0_f64, |acc, v| {
                if v.abs() > acc.abs() {
                    v
                } else {
                    acc
                }
            });
            assert!(peak > 0.0);
        }
    }

    #[test]
    fn request_is_capped_at_dimension_minus_one() {
        let (k, m) = diagonal_system(&[1.0, 4.0]);
        let influence = DVector::from_element(2, 1.0);
        let result = solve_modal(&k, &m, &ModalSettings::new(10), &influence, vec![1, 2]);
        assert_eq!(result.frequencies_hz.len(), 1);
    }

    #[test]
    fn participation_of_uniform_influence() {
        // Unit masses, influence = e_0 + e_1; single low mode along e_0.
        let (k, m) = diagonal_system(&[1.0, 100.0]);
        let influence = DVector::from_element(2, 1.0);
        let result = solve_modal(&k, &m, &ModalSettings::new(1), &influence, vec![1, 2]);

        assert_relative_eq!(result.participation[0].abs(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(result.effective_mass[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(result.total_mass, 2.0, epsilon = 1e-12);
        assert_relative_eq!(result.mass_ratio[0], 0.5, epsilon = 1e-9);
    }

    #[test]
    fn repeated_runs_are_bitwise_identical() {
        let (k, m) = diagonal_system(&[3.0, 7.0, 11.0, 19.0]);
        let influence = influence_z(4);
        let settings = ModalSettings::new(2);
        let a = solve_modal(&k, &m, &settings, &influence, vec![1, 2, 3, 4]);
        let b = solve_modal(&k, &m, &settings, &influence, vec![1, 2, 3, 4]);

        for i in 0..2 {
            assert_eq!(a.frequencies_hz[i].to_bits(), b.frequencies_hz[i].to_bits());
            for j in 0..4 {
                assert_eq!(
                    a.mode_shapes[(j, i)].to_bits(),
                    b.mode_shapes[(j, i)].to_bits()
                );
            }
        }
    }
}
