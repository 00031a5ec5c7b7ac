//! Analysis engine: coordinates assembly and the three solver types
//!
//! One engine instance wraps a validated, immutable model. Each analysis
//! call assembles what it needs and returns an owned result record; the
//! engine holds no mutable state between calls.

use log::info;
use nalgebra::DVector;

use crate::assembler::Assembler;
use crate::error::{KernelError, KernelResult};
use crate::loads::LoadCombination;
use crate::model::Model;
use crate::results::{ModalResult, SpectrumResult, StaticResult};
use crate::solver::linear::{solve_static, LinearSolver};
use crate::solver::modal::{influence_z, solve_modal, ModalSettings};
use crate::solver::spectrum::{response_spectrum, CombinationMethod, SpectrumTable};

/// Entry point for running analyses on a model.
pub struct AnalysisEngine<'m> {
    model: &'m Model,
    assembler: Assembler<'m>,
    warnings: Vec<String>,
}

impl<'m> AnalysisEngine<'m> {
    /// Validate the model and prepare the assembler. Input-invariant
    /// violations abort here; warnings (under-constraint, missing loads)
    /// are logged and kept for inspection.
    pub fn new(model: &'m Model) -> KernelResult<Self> {
        let warnings = model.validate()?;
        for warning in &warnings {
            log::warn!("{warning}");
        }
        let assembler = Assembler::new(model)?;
        Ok(Self {
            model,
            assembler,
            warnings,
        })
    }

    /// Validation warnings gathered at construction.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn assembler(&self) -> &Assembler<'m> {
        &self.assembler
    }

    /// Linear static analysis for one load combination.
    pub fn linear_static(&self, combination: &LoadCombination) -> StaticResult {
        solve_static(&self.assembler, combination)
    }

    /// Linear static analysis for a combination looked up by label.
    pub fn linear_static_by_label(&self, label: &str) -> KernelResult<StaticResult> {
        let combination = self
            .model
            .combination(label)
            .ok_or_else(|| KernelError::CombinationNotFound(label.to_string()))?;
        Ok(self.linear_static(combination))
    }

    /// Run every load combination in the model, in declaration order. The
    /// stiffness is assembled and factored once; only the load vector
    /// changes between combinations.
    pub fn linear_static_all(&self) -> Vec<(String, StaticResult)> {
        let solver = LinearSolver::new(&self.assembler);
        self.model
            .load_combinations
            .iter()
            .map(|combination| {
                info!("running load combination '{}'", combination.label);
                (combination.label.clone(), solver.solve(combination))
            })
            .collect()
    }

    /// Modal analysis with default settings and the vertical (global Z)
    /// influence vector.
    pub fn modal(&self, num_modes: usize) -> ModalResult {
        let influence = influence_z(self.assembler.num_dofs());
        self.run_modal(&ModalSettings::new(num_modes), &influence)
    }

    /// Modal analysis with explicit settings and an optional custom
    /// influence vector (defaults to global-Z translations).
    pub fn modal_with(
        &self,
        settings: &ModalSettings,
        influence: Option<&DVector<f64>>,
    ) -> KernelResult<ModalResult> {
        let n = self.assembler.num_dofs();
        let influence = match influence {
            Some(vector) => {
                if vector.len() != n {
                    return Err(KernelError::InvalidProperty(format!(
                        "influence vector has {} entries, model has {} DOFs",
                        vector.len(),
                        n
                    )));
                }
                vector.clone()
            }
            None => influence_z(n),
        };
        Ok(self.run_modal(settings, &influence))
    }

    fn run_modal(&self, settings: &ModalSettings, influence: &DVector<f64>) -> ModalResult {
        info!("assembling global stiffness and mass matrices");
        let (stiffness, _) = self.assembler.stiffness_matrices();
        let mass = self.assembler.mass_matrix();
        solve_modal(
            &stiffness,
            &mass,
            settings,
            influence,
            self.assembler.dof_map().node_ids().to_vec(),
        )
    }

    /// Response-spectrum combination of an existing modal result.
    pub fn response_spectrum(
        &self,
        modal: &ModalResult,
        table: &SpectrumTable,
        damping_ratio: f64,
        method: CombinationMethod,
    ) -> SpectrumResult {
        info!(
            "running response spectrum ({} modes, ζ = {damping_ratio})",
            modal.num_modes()
        );
        response_spectrum(modal, table, damping_ratio, method)
    }
}
