//! Assembly of the global stiffness, mass and load systems
//!
//! Maps element contributions into sparse global matrices, applies support
//! restraints and springs, and converts loads into the global load vector.

use std::collections::HashMap;

use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;

use crate::elements::{Element, Material, Node, Section};
use crate::error::{KernelError, KernelResult};
use crate::geometry;
use crate::loads::{Load, LoadCombination};
use crate::math::{self, Mat12, Mat3, SparseBuilder};
use crate::model::Model;

/// Penalty stiffness placed on the diagonal of restrained DOFs. Chosen to
/// dominate any physical stiffness while keeping double-precision condition
/// estimates finite.
pub const PENALTY_STIFFNESS: f64 = 1e12;

/// Degrees of freedom per node: three translations then three rotations.
pub const DOF_PER_NODE: usize = 6;

/// Maps node ids to contiguous global DOF ranges.
///
/// Node ids are sorted ascending; the node at sorted position `i` owns
/// global DOFs `[6i, 6i + 6)`.
#[derive(Debug, Clone)]
pub struct DofMap {
    node_ids: Vec<i64>,
    positions: HashMap<i64, usize>,
}

impl DofMap {
    pub fn new(nodes: &[Node]) -> Self {
        let mut node_ids: Vec<i64> = nodes.iter().map(|n| n.id).collect();
        node_ids.sort_unstable();
        let positions = node_ids
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, i))
            .collect();
        Self { node_ids, positions }
    }

    pub fn node_index(&self, node_id: i64) -> Option<usize> {
        self.positions.get(&node_id).copied()
    }

    /// First global DOF owned by a node.
    pub fn base_dof(&self, node_id: i64) -> Option<usize> {
        self.node_index(node_id).map(|i| i * DOF_PER_NODE)
    }

    pub fn node_ids(&self) -> &[i64] {
        &self.node_ids
    }

    pub fn num_nodes(&self) -> usize {
        self.node_ids.len()
    }

    pub fn num_dofs(&self) -> usize {
        self.node_ids.len() * DOF_PER_NODE
    }
}

/// Assembles global matrices and load vectors for a validated model.
pub struct Assembler<'m> {
    model: &'m Model,
    dof_map: DofMap,
    nodes: HashMap<i64, &'m Node>,
    elements: HashMap<i64, &'m Element>,
    materials: HashMap<i64, &'m Material>,
    sections: HashMap<i64, &'m Section>,
    restrained: Vec<bool>,
    springs: Vec<(usize, f64)>,
}

impl<'m> Assembler<'m> {
    /// Build the assembler, resolving all cross-references. The model is
    /// expected to have passed [`Model::validate`]; dangling references are
    /// still reported as errors rather than tolerated.
    pub fn new(model: &'m Model) -> KernelResult<Self> {
        let dof_map = DofMap::new(&model.nodes);

        let nodes: HashMap<i64, &Node> = model.nodes.iter().map(|n| (n.id, n)).collect();
        let elements: HashMap<i64, &Element> = model.elements.iter().map(|e| (e.id, e)).collect();
        let materials: HashMap<i64, &Material> = model.materials.iter().map(|m| (m.id, m)).collect();
        let sections: HashMap<i64, &Section> = model.sections.iter().map(|s| (s.id, s)).collect();

        for element in &model.elements {
            if !nodes.contains_key(&element.start_node) {
                return Err(KernelError::NodeNotFound(element.start_node));
            }
            if !nodes.contains_key(&element.end_node) {
                return Err(KernelError::NodeNotFound(element.end_node));
            }
            if !materials.contains_key(&element.material) {
                return Err(KernelError::MaterialNotFound(element.material));
            }
            if !sections.contains_key(&element.section) {
                return Err(KernelError::SectionNotFound(element.section));
            }
        }

        let mut restrained = vec![false; dof_map.num_dofs()];
        let mut springs = Vec::new();
        for bc in &model.boundary_conditions {
            let base = dof_map
                .base_dof(bc.node)
                .ok_or(KernelError::NodeNotFound(bc.node))?;
            for k in 0..DOF_PER_NODE {
                if bc.restraints[k] {
                    restrained[base + k] = true;
                } else if let Some(stiffness) = bc.springs[k] {
                    springs.push((base + k, stiffness));
                }
            }
        }

        Ok(Self {
            model,
            dof_map,
            nodes,
            elements,
            materials,
            sections,
            restrained,
            springs,
        })
    }

    pub fn model(&self) -> &Model {
        self.model
    }

    pub fn dof_map(&self) -> &DofMap {
        &self.dof_map
    }

    pub fn num_dofs(&self) -> usize {
        self.dof_map.num_dofs()
    }

    /// Per-DOF restraint flags in global DOF order.
    pub fn restrained_dofs(&self) -> &[bool] {
        &self.restrained
    }

    fn node(&self, id: i64) -> &Node {
        self.nodes[&id]
    }

    /// Element length from node coordinates.
    pub fn element_length(&self, element: &Element) -> f64 {
        geometry::element_length(
            &self.node(element.start_node).position(),
            &self.node(element.end_node).position(),
        )
    }

    /// 3x3 direction cosine matrix of the element's local frame.
    pub fn element_rotation(&self, element: &Element) -> Mat3 {
        geometry::local_axes(
            &self.node(element.start_node).position(),
            &self.node(element.end_node).position(),
            element.roll,
        )
    }

    /// Block-diagonal 12x12 transformation for the element.
    pub fn element_transformation(&self, element: &Element) -> Mat12 {
        math::transformation_matrix(&self.element_rotation(element))
    }

    /// Local stiffness with end releases applied. Releases zero the released
    /// rows and columns in local coordinates, before the global transform.
    pub fn element_local_stiffness(&self, element: &Element) -> Mat12 {
        let material = self.materials[&element.material];
        let section = self.sections[&element.section];
        let length = self.element_length(element);

        let mut k_local = math::frame_local_stiffness(
            material.elastic_modulus,
            material.shear_modulus(),
            section.area,
            section.iy,
            section.iz,
            section.j,
            length,
        );
        if element.releases.any() {
            math::zero_released_dofs(&mut k_local, &element.releases.as_local_dofs());
        }
        k_local
    }

    /// Consistent local mass matrix of the element.
    pub fn element_local_mass(&self, element: &Element) -> Mat12 {
        let material = self.materials[&element.material];
        let section = self.sections[&element.section];
        let length = self.element_length(element);
        math::frame_consistent_mass(material.density, section.area, length)
    }

    /// The 12 global DOF indices of an element, start node first.
    pub fn element_dofs(&self, element: &Element) -> [usize; 12] {
        let start = self.dof_map.base_dof(element.start_node).unwrap_or(0);
        let end = self.dof_map.base_dof(element.end_node).unwrap_or(0);
        let mut dofs = [0usize; 12];
        for k in 0..DOF_PER_NODE {
            dofs[k] = start + k;
            dofs[k + DOF_PER_NODE] = end + k;
        }
        dofs
    }

    /// Assemble the global stiffness matrix twice over: once with boundary
    /// treatment (restrained rows/columns zeroed, penalty diagonal) for the
    /// solve, and once untreated for reaction recovery. Springs appear in
    /// both; they are part of the physical stiffness.
    pub fn stiffness_matrices(&self) -> (CsrMatrix<f64>, CsrMatrix<f64>) {
        let n = self.num_dofs();
        let estimated = self.model.elements.len() * 144 + self.springs.len() + n;
        let mut constrained = SparseBuilder::with_capacity(n, estimated);
        let mut unconstrained = SparseBuilder::with_capacity(n, estimated);

        for element in &self.model.elements {
            let k_local = self.element_local_stiffness(element);
            let t = self.element_transformation(element);
            let k_global = t.transpose() * k_local * t;
            let dofs = self.element_dofs(element);

            for (i, &gi) in dofs.iter().enumerate() {
                for (j, &gj) in dofs.iter().enumerate() {
                    let value = k_global[(i, j)];
                    unconstrained.add(gi, gj, value);
                    if !self.restrained[gi] && !self.restrained[gj] {
                        constrained.add(gi, gj, value);
                    }
                }
            }
        }

        for &(dof, stiffness) in &self.springs {
            unconstrained.add(dof, dof, stiffness);
            constrained.add(dof, dof, stiffness);
        }

        for (dof, &is_restrained) in self.restrained.iter().enumerate() {
            if is_restrained {
                constrained.add(dof, dof, PENALTY_STIFFNESS);
            }
        }

        (constrained.to_csr(), unconstrained.to_csr())
    }

    /// Assemble the global consistent mass matrix with boundary treatment:
    /// restrained rows and columns are zeroed and the diagonal left at zero,
    /// pairing with the penalty-stiffened stiffness for eigenproblems.
    pub fn mass_matrix(&self) -> CsrMatrix<f64> {
        let n = self.num_dofs();
        let mut builder =
            SparseBuilder::with_capacity(n, self.model.elements.len() * 144);

        for element in &self.model.elements {
            let m_local = self.element_local_mass(element);
            let t = self.element_transformation(element);
            let m_global = t.transpose() * m_local * t;
            let dofs = self.element_dofs(element);

            for (i, &gi) in dofs.iter().enumerate() {
                for (j, &gj) in dofs.iter().enumerate() {
                    if !self.restrained[gi] && !self.restrained[gj] {
                        builder.add(gi, gj, m_global[(i, j)]);
                    }
                }
            }
        }

        builder.to_csr()
    }

    /// Build the global load vector for one load combination. Loads whose
    /// case has no factor in the combination contribute nothing.
    ///
    /// Distributed loads are lumped in GLOBAL axes: half the force resultant
    /// to each end node plus fixed-end moments w·L²/12, without transforming
    /// into the element frame first. Callers with inclined members resolve
    /// their line loads into global components up front.
    pub fn load_vector(&self, combination: &LoadCombination) -> DVector<f64> {
        let mut f = DVector::zeros(self.num_dofs());

        for load in &self.model.loads {
            let factor = combination.factor(load.case());
            if factor == 0.0 {
                continue;
            }

            match load {
                Load::Point(point) => {
                    if let Some(base) = self.dof_map.base_dof(point.node) {
                        for k in 0..DOF_PER_NODE {
                            f[base + k] += factor * point.components[k];
                        }
                    }
                }
                Load::Distributed(udl) => {
                    let element = self.elements[&udl.element];
                    let length = self.element_length(element);
                    let loaded = udl.loaded_length(length);

                    let wx = udl.w[0];
                    let wy = udl.w[1];
                    let wz = udl.w[2];
                    let half = loaded / 2.0;
                    let fem = loaded * loaded / 12.0;

                    let start = self.dof_map.base_dof(element.start_node).unwrap_or(0);
                    let end = self.dof_map.base_dof(element.end_node).unwrap_or(0);

                    f[start] += factor * wx * half;
                    f[start + 1] += factor * wy * half;
                    f[start + 2] += factor * wz * half;
                    f[start + 4] += factor * wz * fem;
                    f[start + 5] -= factor * wy * fem;

                    f[end] += factor * wx * half;
                    f[end + 1] += factor * wy * half;
                    f[end + 2] += factor * wz * half;
                    f[end + 4] -= factor * wz * fem;
                    f[end + 5] += factor * wy * fem;
                }
            }
        }

        f
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::BoundaryCondition;
    use approx::assert_relative_eq;

    fn two_node_model() -> Model {
        let mut model = Model::new();
        model.add_material(Material::steel(1));
        model.add_section(Section::new(1, 1e-4, 1e-8, 1e-8, 2e-8));
        model.add_node(Node::new(10, 0.0, 0.0, 0.0));
        model.add_node(Node::new(2, 4.0, 0.0, 0.0));
        model.add_element(Element::new(1, 10, 2, 1, 1));
        model.add_boundary_condition(BoundaryCondition::fixed(10));
        model
    }

    #[test]
    fn dof_map_sorts_node_ids() {
        let model = two_node_model();
        let map = DofMap::new(&model.nodes);
        assert_eq!(map.node_ids(), &[2, 10]);
        assert_eq!(map.base_dof(2), Some(0));
        assert_eq!(map.base_dof(10), Some(6));
        assert_eq!(map.num_dofs(), 12);
    }

    #[test]
    fn restrained_diagonal_takes_penalty() {
        let model = two_node_model();
        let assembler = Assembler::new(&model).unwrap();
        let (constrained, _) = assembler.stiffness_matrices();

        // Node 10 sorts second, so its DOFs are 6..12
        for dof in 6..12 {
            let diag: f64 = constrained
                .triplet_iter()
                .filter(|&(i, j, _)| i == dof && j == dof)
                .map(|(_, _, &v)| v)
                .sum();
            assert_relative_eq!(diag, PENALTY_STIFFNESS, epsilon = 1.0);
            // Off-diagonals of restrained rows are gone
            let off: f64 = constrained
                .triplet_iter()
                .filter(|&(i, j, _)| i == dof && j != dof)
                .map(|(_, _, &v)| v.abs())
                .sum();
            assert_eq!(off, 0.0);
        }
    }

    #[test]
    fn spring_adds_to_free_diagonal() {
        let diag = |csr: &CsrMatrix<f64>, dof: usize| -> f64 {
            csr.triplet_iter()
                .filter(|&(i, j, _)| i == dof && j == dof)
                .map(|(_, _, &v)| v)
                .sum()
        };

        let bare = two_node_model();
        let (bare_constrained, _) = Assembler::new(&bare).unwrap().stiffness_matrices();

        let mut sprung = two_node_model();
        sprung.add_boundary_condition(BoundaryCondition::free(2).with_spring(1, 5e6));
        let assembler = Assembler::new(&sprung).unwrap();
        let (constrained, unconstrained) = assembler.stiffness_matrices();

        // uy of node 2 is global DOF 1; the spring raises it in both matrices
        assert_relative_eq!(
            diag(&constrained, 1) - diag(&bare_constrained, 1),
            5e6,
            epsilon = 1e-6
        );
        assert_relative_eq!(diag(&constrained, 1), diag(&unconstrained, 1), epsilon = 1e-6);
    }

    #[test]
    fn point_load_lands_on_node_dofs() {
        let mut model = two_node_model();
        model.add_load(Load::point(2, [10.0, 20.0, 30.0, 1.0, 2.0, 3.0], "Case 1"));
        model.add_combination(LoadCombination::single("C", "Case 1"));

        let assembler = Assembler::new(&model).unwrap();
        let combo = model.combination("C").unwrap();
        let f = assembler.load_vector(combo);

        assert_relative_eq!(f[0], 10.0);
        assert_relative_eq!(f[1], 20.0);
        assert_relative_eq!(f[2], 30.0);
        assert_relative_eq!(f[3], 1.0);
        assert_relative_eq!(f[4], 2.0);
        assert_relative_eq!(f[5], 3.0);
        // Fixed node gets nothing
        for dof in 6..12 {
            assert_eq!(f[dof], 0.0);
        }
    }

    #[test]
    fn distributed_load_lumps_forces_and_fixed_end_moments() {
        let mut model = two_node_model();
        model.add_load(Load::distributed(1, [0.0, -1200.0, 600.0, 0.0, 0.0, 0.0], "Case 1"));
        model.add_combination(LoadCombination::single("C", "Case 1"));

        let assembler = Assembler::new(&model).unwrap();
        let f = assembler.load_vector(model.combination("C").unwrap());

        let l = 4.0;
        let fem = l * l / 12.0;
        // Start node (id 10) owns DOFs 6..12, end node (id 2) owns 0..6
        assert_relative_eq!(f[7], -1200.0 * l / 2.0, epsilon = 1e-9);
        assert_relative_eq!(f[8], 600.0 * l / 2.0, epsilon = 1e-9);
        assert_relative_eq!(f[10], 600.0 * fem, epsilon = 1e-9);
        assert_relative_eq!(f[11], 1200.0 * fem, epsilon = 1e-9);
        assert_relative_eq!(f[1], -1200.0 * l / 2.0, epsilon = 1e-9);
        assert_relative_eq!(f[2], 600.0 * l / 2.0, epsilon = 1e-9);
        assert_relative_eq!(f[4], -600.0 * fem, epsilon = 1e-9);
        assert_relative_eq!(f[5], -1200.0 * fem, epsilon = 1e-9);
    }

    #[test]
    fn absent_case_contributes_nothing() {
        let mut model = two_node_model();
        model.add_load(Load::point(2, [1.0; 6], "Wind"));
        model.add_combination(LoadCombination::single("D", "Dead"));

        let assembler = Assembler::new(&model).unwrap();
        let f = assembler.load_vector(model.combination("D").unwrap());
        assert_eq!(f.amax(), 0.0);
    }

    #[test]
    fn global_element_matrices_are_symmetric() {
        let mut model = two_node_model();
        model.elements[0].roll = 0.4;
        let assembler = Assembler::new(&model).unwrap();
        let element = &model.elements[0];

        let t = assembler.element_transformation(element);
        let k = t.transpose() * assembler.element_local_stiffness(element) * t;
        let m = t.transpose() * assembler.element_local_mass(element) * t;
        for i in 0..12 {
            for j in 0..12 {
                assert_relative_eq!(k[(i, j)], k[(j, i)], epsilon = 1e-4);
                assert_relative_eq!(m[(i, j)], m[(j, i)], epsilon = 1e-10);
            }
        }
    }
}
