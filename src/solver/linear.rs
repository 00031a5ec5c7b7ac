//! Linear static analysis
//!
//! Assembles and factors the boundary-treated stiffness once, then solves
//! K·u = F per load combination, recovers support reactions against the
//! untreated stiffness, and derives per-element internal forces in the
//! local frame.

use log::{debug, info, warn};
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;

use crate::assembler::Assembler;
use crate::loads::LoadCombination;
use crate::math::{sparse, Vec12};
use crate::results::{ElementForces, SolveStatus, StaticResult};
use crate::solver::Factorization;

/// Diagonal entries below this are treated as structurally singular.
const SINGULAR_DIAGONAL: f64 = 1e-12;
/// 1-norm condition estimates above this fail the solve.
const CONDITION_LIMIT: f64 = 1e12;
/// Condition estimation is attempted only up to this system size.
const CONDITION_CHECK_LIMIT: usize = 1000;

/// Linear static solver over one assembled model.
///
/// Assembly and factorization happen once at construction; each call to
/// [`LinearSolver::solve`] only builds a load vector and runs the
/// triangular solves, so sweeping many load combinations reuses the same
/// sparsity pattern and factor.
pub struct LinearSolver<'a> {
    assembler: &'a Assembler<'a>,
    k_constrained: CsrMatrix<f64>,
    k_unconstrained: CsrMatrix<f64>,
    factor: Option<Factorization>,
    status: SolveStatus,
}

impl<'a> LinearSolver<'a> {
    pub fn new(assembler: &'a Assembler<'a>) -> Self {
        let n = assembler.num_dofs();
        info!("assembling global stiffness matrix ({n} DOFs)");
        let (k_constrained, k_unconstrained) = assembler.stiffness_matrices();

        let (factor, status) = Self::prepare(&k_constrained, n);
        Self {
            assembler,
            k_constrained,
            k_unconstrained,
            factor,
            status,
        }
    }

    fn prepare(
        k_constrained: &CsrMatrix<f64>,
        n: usize,
    ) -> (Option<Factorization>, SolveStatus) {
        if let Some(dof) = first_singular_diagonal(k_constrained) {
            warn!("zero diagonal at DOF {dof}; system is singular");
            return (None, SolveStatus::Singular);
        }

        let factor = match Factorization::new(k_constrained) {
            Some(factor) => factor,
            None => {
                warn!("factorization failed; system is singular");
                return (None, SolveStatus::Singular);
            }
        };

        // Best-effort conditioning estimate on small systems only.
        if n <= CONDITION_CHECK_LIMIT {
            let condition = estimate_condition(k_constrained, &factor, n);
            debug!("1-norm condition estimate: {condition:.3e}");
            if !condition.is_finite() || condition > CONDITION_LIMIT {
                warn!("condition estimate {condition:.3e} exceeds limit");
                return (None, SolveStatus::IllConditioned);
            }
        }

        (Some(factor), SolveStatus::Converged)
    }

    /// Solve one load combination. Solver-level failures are reported
    /// through [`SolveStatus`] on the result rather than as errors.
    pub fn solve(&self, combination: &LoadCombination) -> StaticResult {
        let n = self.assembler.num_dofs();
        let node_ids = self.assembler.dof_map().node_ids().to_vec();

        let factor = match (&self.factor, self.status) {
            (Some(factor), SolveStatus::Converged) => factor,
            _ => return StaticResult::failed(self.status, node_ids, n),
        };

        info!("solving linear system for combination '{}'", combination.label);
        let f = self.assembler.load_vector(combination);
        let u = match factor.solve(&f) {
            Some(u) if u.iter().all(|v| v.is_finite()) => u,
            _ => {
                warn!("triangular solve produced no finite solution");
                return StaticResult::failed(SolveStatus::Singular, node_ids, n);
            }
        };

        // Reactions come from the untreated stiffness: the penalty rows
        // carry no information about the forces the supports actually exert.
        let reactions = &sparse::matvec(&self.k_unconstrained, &u) - &f;
        let residual_inf = (&sparse::matvec(&self.k_constrained, &u) - &f).amax();

        let element_forces = recover_element_forces(self.assembler, &u);

        StaticResult {
            status: SolveStatus::Converged,
            node_ids,
            displacements: u,
            reactions,
            element_forces,
            residual_inf,
        }
    }
}

/// One-shot convenience: assemble, factor and solve a single combination.
pub fn solve_static(assembler: &Assembler, combination: &LoadCombination) -> StaticResult {
    LinearSolver::new(assembler).solve(combination)
}

fn first_singular_diagonal(matrix: &CsrMatrix<f64>) -> Option<usize> {
    let mut diagonal = vec![0.0_f64; matrix.nrows()];
    for (i, j, &value) in matrix.triplet_iter() {
        if i == j {
            diagonal[i] += value;
        }
    }
    diagonal.iter().position(|d| d.abs() < SINGULAR_DIAGONAL)
}

/// Hager-style 1-norm condition estimate using a handful of solves with the
/// existing factorization. The matrix is symmetric, so the transpose solves
/// reuse the same factorization.
fn estimate_condition(matrix: &CsrMatrix<f64>, factor: &Factorization, n: usize) -> f64 {
    let matrix_norm = sparse::one_norm(matrix);

    let mut x = DVector::from_element(n, 1.0 / n as f64);
    let mut inverse_norm = 0.0_f64;

    for _ in 0..5 {
        let y = match factor.solve(&x) {
            Some(y) => y,
            None => return f64::INFINITY,
        };
        inverse_norm = y.iter().map(|v| v.abs()).sum();
        if !inverse_norm.is_finite() {
            return f64::INFINITY;
        }

        let signs = y.map(|v| if v >= 0.0 { 1.0 } else { -1.0 });
        let z = match factor.solve(&signs) {
            Some(z) => z,
            None => return f64::INFINITY,
        };

        let mut j_max = 0;
        let mut z_max = 0.0_f64;
        for (j, value) in z.iter().enumerate() {
            if value.abs() > z_max {
                z_max = value.abs();
                j_max = j;
            }
        }
        if z_max <= z.dot(&x) {
            break;
        }
        x = DVector::zeros(n);
        x[j_max] = 1.0;
    }

    matrix_norm * inverse_norm
}

/// Per-element internal forces: f_loc = K_loc · (T · u_elem), with the
/// release-zeroed local stiffness so released DOFs report exactly zero
/// moment.
fn recover_element_forces(assembler: &Assembler, u: &DVector<f64>) -> Vec<ElementForces> {
    assembler
        .model()
        .elements
        .iter()
        .map(|element| {
            let dofs = assembler.element_dofs(element);
            let u_elem = Vec12::from_fn(|i, _| u[dofs[i]]);

            let t = assembler.element_transformation(element);
            let u_local = t * u_elem;
            let f_local = assembler.element_local_stiffness(element) * u_local;

            let max_pair = |a: usize, b: usize| f_local[a].abs().max(f_local[b].abs());
            let mut end_forces_local = [0.0; 12];
            for i in 0..12 {
                end_forces_local[i] = f_local[i];
            }

            ElementForces {
                id: element.id,
                end_forces_local,
                max_axial: max_pair(0, 6),
                max_shear_y: max_pair(1, 7),
                max_shear_z: max_pair(2, 8),
                max_torsion: max_pair(3, 9),
                max_moment_y: max_pair(4, 10),
                max_moment_z: max_pair(5, 11),
            }
        })
        .collect()
}
