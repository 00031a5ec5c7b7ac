//! Output records for the three analysis types

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::assembler::DOF_PER_NODE;
use crate::solver::spectrum::CombinationMethod;

/// Outcome of a linear static solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    Converged,
    Singular,
    IllConditioned,
}

/// Displacement components at one node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NodeDisplacement {
    pub ux: f64,
    pub uy: f64,
    pub uz: f64,
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
}

impl NodeDisplacement {
    fn from_slice(values: &[f64]) -> Self {
        Self {
            ux: values[0],
            uy: values[1],
            uz: values[2],
            rx: values[3],
            ry: values[4],
            rz: values[5],
        }
    }

    pub fn translation_magnitude(&self) -> f64 {
        (self.ux * self.ux + self.uy * self.uy + self.uz * self.uz).sqrt()
    }
}

/// Reaction components at one node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NodeReaction {
    pub fx: f64,
    pub fy: f64,
    pub fz: f64,
    pub mx: f64,
    pub my: f64,
    pub mz: f64,
}

impl NodeReaction {
    fn from_slice(values: &[f64]) -> Self {
        Self {
            fx: values[0],
            fy: values[1],
            fz: values[2],
            mx: values[3],
            my: values[4],
            mz: values[5],
        }
    }
}

/// Internal forces of one element in its local frame.
///
/// `end_forces_local` follows the local DOF order: N, Vy, Vz, T, My, Mz at
/// the start node then the end node. The scalar maxima take the larger
/// absolute value of the two ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementForces {
    pub id: i64,
    pub end_forces_local: [f64; 12],
    pub max_axial: f64,
    pub max_shear_y: f64,
    pub max_shear_z: f64,
    pub max_torsion: f64,
    pub max_moment_y: f64,
    pub max_moment_z: f64,
}

/// Extreme displacement magnitudes over the whole model.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DisplacementExtremes {
    pub max_ux: f64,
    pub max_uy: f64,
    pub max_uz: f64,
    pub max_rx: f64,
    pub max_ry: f64,
    pub max_rz: f64,
    pub max_translation: f64,
}

/// Results of a linear static solve.
///
/// `displacements` and `reactions` are full-length DOF vectors in global
/// DOF order; reactions at free DOFs are numerically zero. On a failed
/// solve both vectors are zero and `status` says why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticResult {
    pub status: SolveStatus,
    /// Node ids in assembler order; node i owns DOFs [6i, 6i+6)
    pub node_ids: Vec<i64>,
    pub displacements: DVector<f64>,
    pub reactions: DVector<f64>,
    pub element_forces: Vec<ElementForces>,
    /// Equilibrium self-check ‖K·u − F‖∞
    pub residual_inf: f64,
}

impl StaticResult {
    pub(crate) fn failed(status: SolveStatus, node_ids: Vec<i64>, num_dofs: usize) -> Self {
        Self {
            status,
            node_ids,
            displacements: DVector::zeros(num_dofs),
            reactions: DVector::zeros(num_dofs),
            element_forces: Vec::new(),
            residual_inf: f64::INFINITY,
        }
    }

    fn node_slice<'a>(&self, vector: &'a DVector<f64>, node_id: i64) -> Option<&'a [f64]> {
        let index = self.node_ids.iter().position(|&id| id == node_id)?;
        let base = index * DOF_PER_NODE;
        Some(&vector.as_slice()[base..base + DOF_PER_NODE])
    }

    pub fn node_displacement(&self, node_id: i64) -> Option<NodeDisplacement> {
        self.node_slice(&self.displacements, node_id)
            .map(NodeDisplacement::from_slice)
    }

    pub fn node_reaction(&self, node_id: i64) -> Option<NodeReaction> {
        self.node_slice(&self.reactions, node_id)
            .map(NodeReaction::from_slice)
    }

    pub fn element_forces(&self, element_id: i64) -> Option<&ElementForces> {
        self.element_forces.iter().find(|f| f.id == element_id)
    }

    /// Largest absolute displacement per component over all nodes.
    pub fn max_displacements(&self) -> DisplacementExtremes {
        let mut extremes = DisplacementExtremes::default();
        for chunk in self.displacements.as_slice().chunks_exact(DOF_PER_NODE) {
            extremes.max_ux = extremes.max_ux.max(chunk[0].abs());
            extremes.max_uy = extremes.max_uy.max(chunk[1].abs());
            extremes.max_uz = extremes.max_uz.max(chunk[2].abs());
            extremes.max_rx = extremes.max_rx.max(chunk[3].abs());
            extremes.max_ry = extremes.max_ry.max(chunk[4].abs());
            extremes.max_rz = extremes.max_rz.max(chunk[5].abs());
            let translation =
                (chunk[0] * chunk[0] + chunk[1] * chunk[1] + chunk[2] * chunk[2]).sqrt();
            extremes.max_translation = extremes.max_translation.max(translation);
        }
        extremes
    }

    /// Sum of all reaction components, [ΣFx, ΣFy, ΣFz, ΣMx, ΣMy, ΣMz].
    /// Force sums balance the applied loads when the solve converged.
    pub fn total_reactions(&self) -> [f64; 6] {
        let mut totals = [0.0; 6];
        for chunk in self.reactions.as_slice().chunks_exact(DOF_PER_NODE) {
            for k in 0..DOF_PER_NODE {
                totals[k] += chunk[k];
            }
        }
        totals
    }
}

/// Outcome of a modal solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModalStatus {
    Converged,
    Failed {
        message: String,
        /// Modes recovered before the failure; their data is present.
        modes_recovered: usize,
    },
}

impl ModalStatus {
    pub(crate) fn failed(message: &str, modes_recovered: usize) -> Self {
        Self::Failed {
            message: message.to_string(),
            modes_recovered,
        }
    }
}

/// Dominant translational direction of a mode shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeDirection {
    TranslationX,
    TranslationY,
    TranslationZ,
}

/// Results of a modal solve. Mode shapes are mass-normalized columns of an
/// N×m matrix, ascending in frequency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModalResult {
    pub status: ModalStatus,
    pub node_ids: Vec<i64>,
    pub frequencies_hz: Vec<f64>,
    pub periods_s: Vec<f64>,
    pub mode_shapes: DMatrix<f64>,
    /// Participation factor Γ per mode for the influence vector used
    pub participation: Vec<f64>,
    /// Effective modal mass Γ²·(φᵀMφ) per mode
    pub effective_mass: Vec<f64>,
    /// Effective mass over rᵀMr per mode
    pub mass_ratio: Vec<f64>,
    /// Running sum of `mass_ratio`
    pub cumulative_ratio: Vec<f64>,
    /// rᵀMr for the influence vector used
    pub total_mass: f64,
}

impl ModalResult {
    pub(crate) fn empty(status: ModalStatus, node_ids: Vec<i64>, num_dofs: usize) -> Self {
        Self {
            status,
            node_ids,
            frequencies_hz: Vec::new(),
            periods_s: Vec::new(),
            mode_shapes: DMatrix::zeros(num_dofs, 0),
            participation: Vec::new(),
            effective_mass: Vec::new(),
            mass_ratio: Vec::new(),
            cumulative_ratio: Vec::new(),
            total_mass: 0.0,
        }
    }

    pub fn num_modes(&self) -> usize {
        self.frequencies_hz.len()
    }

    /// Mode-shape components at one node, zero-based mode index.
    pub fn mode_shape_at(&self, mode: usize, node_id: i64) -> Option<NodeDisplacement> {
        if mode >= self.num_modes() {
            return None;
        }
        let index = self.node_ids.iter().position(|&id| id == node_id)?;
        let base = index * DOF_PER_NODE;
        let column = self.mode_shapes.column(mode);
        let values: Vec<f64> = (0..DOF_PER_NODE).map(|k| column[base + k]).collect();
        Some(NodeDisplacement::from_slice(&values))
    }

    /// Classify each mode by the RMS of its translational components.
    pub fn dominant_directions(&self) -> Vec<ModeDirection> {
        (0..self.num_modes())
            .map(|mode| {
                let column = self.mode_shapes.column(mode);
                let mut sums = [0.0_f64; 3];
                for (dof, value) in column.iter().enumerate() {
                    let component = dof % DOF_PER_NODE;
                    if component < 3 {
                        sums[component] += value * value;
                    }
                }
                if sums[0] >= sums[1] && sums[0] >= sums[2] {
                    ModeDirection::TranslationX
                } else if sums[1] >= sums[2] {
                    ModeDirection::TranslationY
                } else {
                    ModeDirection::TranslationZ
                }
            })
            .collect()
    }
}

/// Per-mode bookkeeping for the spectrum combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeStatus {
    Included,
    /// ω was too close to zero to divide by; the mode contributed nothing.
    SkippedZeroFrequency,
}

/// Results of a response-spectrum combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectrumResult {
    /// Combined absolute displacement per DOF
    pub combined_displacement: DVector<f64>,
    /// Per-mode displacement responses, one column per mode
    pub per_mode_displacement: DMatrix<f64>,
    pub mode_status: Vec<ModeStatus>,
    pub method: CombinationMethod,
    pub damping_ratio: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn node_views_follow_sorted_order() {
        let mut result = StaticResult::failed(SolveStatus::Converged, vec![2, 7], 12);
        result.displacements[6] = 0.5; // ux of node 7
        result.reactions[1] = -3.0; // fy of node 2

        assert_relative_eq!(result.node_displacement(7).unwrap().ux, 0.5);
        assert_relative_eq!(result.node_reaction(2).unwrap().fy, -3.0);
        assert!(result.node_displacement(99).is_none());
    }

    #[test]
    fn displacement_extremes_scan_all_nodes() {
        let mut result = StaticResult::failed(SolveStatus::Converged, vec![1, 2], 12);
        result.displacements[1] = -0.2;
        result.displacements[7] = 0.1;
        let extremes = result.max_displacements();
        assert_relative_eq!(extremes.max_uy, 0.2);
        assert_relative_eq!(extremes.max_translation, 0.2);
    }

    #[test]
    fn dominant_direction_picks_largest_rms() {
        let mut modal = ModalResult::empty(ModalStatus::Converged, vec![1], 6);
        modal.frequencies_hz = vec![1.0];
        modal.periods_s = vec![1.0];
        modal.mode_shapes = DMatrix::zeros(6, 1);
        modal.mode_shapes[(2, 0)] = 0.9; // uz dominates
        modal.mode_shapes[(0, 0)] = 0.1;
        assert_eq!(modal.dominant_directions(), vec![ModeDirection::TranslationZ]);
    }
}
