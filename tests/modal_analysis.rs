//! Modal and response-spectrum benchmarks on discretized cantilevers

use approx::assert_relative_eq;
use frame_analysis::math::sparse::matvec;
use frame_analysis::prelude::*;
use nalgebra::DVector;
use std::f64::consts::PI;

const E: f64 = 2e11;
const NU: f64 = 0.3;
const RHO: f64 = 7850.0;
const AREA: f64 = 1e-3;
const IY: f64 = 8.333e-8;
const IZ: f64 = 1.6667e-7;
// Large enough that the first torsional mode sits above the first two
// bending modes (the torsional mass block is the axial-style lumping, not a
// polar-inertia term).
const J: f64 = 2e-7;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// First cantilever bending frequency from Euler-Bernoulli theory.
fn analytic_frequency(i: f64, length: f64) -> f64 {
    let beta1_sq = 1.875_104_068_7_f64.powi(2);
    beta1_sq / (2.0 * PI) * (E * i / (RHO * AREA * length.powi(4))).sqrt()
}

/// Cantilever along +X, `segments` equal elements, fixed at node 0.
fn cantilever_model(segments: usize, length: f64) -> Model {
    let mut model = Model::new();
    model.add_material(Material::new(1, E, NU, RHO));
    model.add_section(Section::new(1, AREA, IY, IZ, J));
    let dx = length / segments as f64;
    for i in 0..=segments {
        model.add_node(Node::new(i as i64, i as f64 * dx, 0.0, 0.0));
    }
    for i in 0..segments {
        model.add_element(Element::new(i as i64 + 1, i as i64, i as i64 + 1, 1, 1));
    }
    model.add_boundary_condition(BoundaryCondition::fixed(0));
    model
}

#[test]
fn cantilever_first_bending_modes() {
    init_logging();
    let model = cantilever_model(20, 5.0);
    let engine = AnalysisEngine::new(&model).unwrap();
    let modal = engine.modal(4);

    assert_eq!(modal.status, ModalStatus::Converged);
    assert_eq!(modal.num_modes(), 4);

    // Frequencies ascend
    for pair in modal.frequencies_hz.windows(2) {
        assert!(pair[0] <= pair[1]);
    }

    // Weak-axis bending first (deflection in global Y), strong axis second
    let f_weak = analytic_frequency(IY, 5.0);
    let f_strong = analytic_frequency(IZ, 5.0);
    assert_relative_eq!(modal.frequencies_hz[0], f_weak, max_relative = 0.02);
    assert_relative_eq!(modal.frequencies_hz[1], f_strong, max_relative = 0.02);

    let directions = modal.dominant_directions();
    assert_eq!(directions[0], frame_analysis::results::ModeDirection::TranslationY);
    assert_eq!(directions[1], frame_analysis::results::ModeDirection::TranslationZ);

    // Periods are reciprocal frequencies
    for i in 0..4 {
        assert_relative_eq!(
            modal.periods_s[i],
            1.0 / modal.frequencies_hz[i],
            max_relative = 1e-12
        );
    }
}

#[test]
fn mode_shapes_are_mass_orthonormal() {
    init_logging();
    let model = cantilever_model(12, 3.0);
    let engine = AnalysisEngine::new(&model).unwrap();
    let modal = engine.modal(3);
    assert_eq!(modal.status, ModalStatus::Converged);

    let mass = engine.assembler().mass_matrix();
    for i in 0..3 {
        let phi_i: DVector<f64> = modal.mode_shapes.column(i).clone_owned();
        let m_phi_i = matvec(&mass, &phi_i);
        assert!((phi_i.dot(&m_phi_i) - 1.0).abs() < 1e-10);
        for j in 0..i {
            let phi_j: DVector<f64> = modal.mode_shapes.column(j).clone_owned();
            assert!(phi_j.dot(&m_phi_i).abs() < 1e-8);
        }
    }
}

#[test]
fn lateral_participation_concentrates_in_the_first_mode() {
    init_logging();
    let model = cantilever_model(20, 5.0);
    let engine = AnalysisEngine::new(&model).unwrap();

    // Uniform base excitation along global Y, the first mode's direction
    let n = engine.assembler().num_dofs();
    let mut influence = DVector::zeros(n);
    let mut dof = 1;
    while dof < n {
        influence[dof] = 1.0;
        dof += 6;
    }

    let modal = engine
        .modal_with(&ModalSettings::new(4), Some(&influence))
        .unwrap();
    assert_eq!(modal.status, ModalStatus::Converged);
    assert!(modal.total_mass > 0.0);

    // The fundamental bending mode of a cantilever mobilises roughly 61% of
    // the participating mass.
    assert!(modal.mass_ratio[0] > 0.55 && modal.mass_ratio[0] < 0.70);

    // Cumulative ratios are monotone and bounded by one
    let mut previous = 0.0;
    for &ratio in &modal.cumulative_ratio {
        assert!(ratio >= previous);
        previous = ratio;
    }
    assert!(previous <= 1.0 + 1e-9);

    // The strong-axis mode moves in Z and picks up no Y mass
    assert!(modal.mass_ratio[1].abs() < 1e-6);
}

#[test]
fn modal_solve_is_deterministic() {
    init_logging();
    let model = cantilever_model(10, 2.5);
    let engine = AnalysisEngine::new(&model).unwrap();
    let a = engine.modal(3);
    let b = engine.modal(3);

    for i in 0..3 {
        assert_eq!(a.frequencies_hz[i].to_bits(), b.frequencies_hz[i].to_bits());
        for k in 0..a.mode_shapes.nrows() {
            assert_eq!(a.mode_shapes[(k, i)].to_bits(), b.mode_shapes[(k, i)].to_bits());
        }
    }
}

#[test]
fn frequencies_are_invariant_under_rigid_rotation() {
    init_logging();
    let model_x = cantilever_model(8, 2.0);

    // Same member rotated 90° about global Z, pointing along +Y
    let mut model_y = Model::new();
    model_y.add_material(Material::new(1, E, NU, RHO));
    model_y.add_section(Section::new(1, AREA, IY, IZ, J));
    for i in 0..=8 {
        model_y.add_node(Node::new(i as i64, 0.0, i as f64 * 0.25, 0.0));
    }
    for i in 0..8 {
        model_y.add_element(Element::new(i as i64 + 1, i as i64, i as i64 + 1, 1, 1));
    }
    model_y.add_boundary_condition(BoundaryCondition::fixed(0));

    let modal_x = AnalysisEngine::new(&model_x).unwrap().modal(2);
    let modal_y = AnalysisEngine::new(&model_y).unwrap().modal(2);
    assert_eq!(modal_x.status, ModalStatus::Converged);
    assert_eq!(modal_y.status, ModalStatus::Converged);

    for i in 0..2 {
        assert_relative_eq!(
            modal_x.frequencies_hz[i],
            modal_y.frequencies_hz[i],
            max_relative = 1e-9
        );
    }
}

#[test]
fn response_spectrum_combines_cantilever_modes() {
    init_logging();
    let model = cantilever_model(16, 4.0);
    let engine = AnalysisEngine::new(&model).unwrap();

    // Excite along global Y so the bending modes participate
    let n = engine.assembler().num_dofs();
    let mut influence = DVector::zeros(n);
    let mut dof = 1;
    while dof < n {
        influence[dof] = 1.0;
        dof += 6;
    }
    let modal = engine
        .modal_with(&ModalSettings::new(3), Some(&influence))
        .unwrap();
    assert_eq!(modal.status, ModalStatus::Converged);

    let table = SpectrumTable::new(vec![0.01, 10.0], vec![9.81, 9.81]).unwrap();
    let srss = engine.response_spectrum(&modal, &table, 0.05, CombinationMethod::Srss);
    let cqc = engine.response_spectrum(&modal, &table, 0.05, CombinationMethod::Cqc);

    assert!(srss.mode_status.iter().all(|s| *s == ModeStatus::Included));

    // Tip uy DOF: last node owns the final six DOFs
    let tip_uy = n - 5;
    assert!(srss.combined_displacement[tip_uy] > 0.0);

    // SRSS dominates every single-mode contribution
    for i in 0..modal.num_modes() {
        assert!(
            srss.combined_displacement[tip_uy]
                >= srss.per_mode_displacement[(tip_uy, i)].abs() - 1e-12
        );
    }

    // Cantilever bending modes are well separated, so the CQC cross terms
    // stay small.
    let a = srss.combined_displacement[tip_uy];
    let b = cqc.combined_displacement[tip_uy];
    assert!((a - b).abs() <= 0.1 * a);

    // Combined response is non-negative everywhere
    assert!(srss.combined_displacement.iter().all(|&v| v >= 0.0));
}
