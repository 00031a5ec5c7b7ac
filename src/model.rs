//! The input model: entities, invariant validation, wire-record loading

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::elements::{BoundaryCondition, Element, Material, Node, Section};
use crate::error::{KernelError, KernelResult};
use crate::geometry::COINCIDENT_TOLERANCE;
use crate::loads::{Load, LoadCombination};

/// Minimum number of independent restraints for a well-posed static problem.
const MIN_RESTRAINTS: usize = 6;

/// A complete structural model as handed to the kernel by an upstream
/// loader. All quantities are SI; the kernel never mutates the model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Model {
    pub nodes: Vec<Node>,
    pub elements: Vec<Element>,
    pub materials: Vec<Material>,
    pub sections: Vec<Section>,
    pub boundary_conditions: Vec<BoundaryCondition>,
    pub loads: Vec<Load>,
    pub load_combinations: Vec<LoadCombination>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn add_element(&mut self, element: Element) {
        self.elements.push(element);
    }

    pub fn add_material(&mut self, material: Material) {
        self.materials.push(material);
    }

    pub fn add_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    pub fn add_boundary_condition(&mut self, bc: BoundaryCondition) {
        self.boundary_conditions.push(bc);
    }

    pub fn add_load(&mut self, load: Load) {
        self.loads.push(load);
    }

    pub fn add_combination(&mut self, combination: LoadCombination) {
        self.load_combinations.push(combination);
    }

    pub fn node(&self, id: i64) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn element(&self, id: i64) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn material(&self, id: i64) -> Option<&Material> {
        self.materials.iter().find(|m| m.id == id)
    }

    pub fn section(&self, id: i64) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn combination(&self, label: &str) -> Option<&LoadCombination> {
        self.load_combinations.iter().find(|c| c.label == label)
    }

    /// Total independent restraints over all supports.
    pub fn num_restraints(&self) -> usize {
        self.boundary_conditions
            .iter()
            .map(BoundaryCondition::num_restrained)
            .sum()
    }

    /// Load the model from its JSON wire form.
    pub fn from_json(json: &str) -> KernelResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the model to its JSON wire form.
    pub fn to_json(&self) -> KernelResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Check every input invariant. Hard violations abort with an error;
    /// conditions that still permit some analysis (an under-constrained
    /// model can run modal analysis) come back as warnings.
    pub fn validate(&self) -> KernelResult<Vec<String>> {
        if self.nodes.is_empty() {
            return Err(KernelError::EmptyModel("model has no nodes"));
        }
        if self.elements.is_empty() {
            return Err(KernelError::EmptyModel("model has no elements"));
        }

        Self::check_unique("node", self.nodes.iter().map(|n| n.id))?;
        Self::check_unique("element", self.elements.iter().map(|e| e.id))?;
        Self::check_unique("material", self.materials.iter().map(|m| m.id))?;
        Self::check_unique("section", self.sections.iter().map(|s| s.id))?;
        Self::check_unique(
            "boundary condition",
            self.boundary_conditions.iter().map(|bc| bc.node),
        )?;

        for material in &self.materials {
            if !(material.elastic_modulus > 0.0) {
                return Err(KernelError::InvalidProperty(format!(
                    "material {}: elastic modulus must be positive",
                    material.id
                )));
            }
            if !(material.poisson_ratio > 0.0 && material.poisson_ratio < 0.5) {
                return Err(KernelError::InvalidProperty(format!(
                    "material {}: Poisson ratio must lie in (0, 0.5)",
                    material.id
                )));
            }
            if !(material.density >= 0.0) {
                return Err(KernelError::InvalidProperty(format!(
                    "material {}: density must be non-negative",
                    material.id
                )));
            }
        }

        for section in &self.sections {
            for (value, name) in [
                (section.area, "area"),
                (section.iy, "Iy"),
                (section.iz, "Iz"),
                (section.j, "J"),
            ] {
                if !(value > 0.0) {
                    return Err(KernelError::InvalidProperty(format!(
                        "section {}: {name} must be positive",
                        section.id
                    )));
                }
            }
        }

        for element in &self.elements {
            if element.start_node == element.end_node {
                return Err(KernelError::InvalidGeometry(format!(
                    "element {} connects node {} to itself",
                    element.id, element.start_node
                )));
            }
            let start = self
                .node(element.start_node)
                .ok_or(KernelError::NodeNotFound(element.start_node))?;
            let end = self
                .node(element.end_node)
                .ok_or(KernelError::NodeNotFound(element.end_node))?;
            if start.distance_to(end) <= COINCIDENT_TOLERANCE {
                return Err(KernelError::InvalidGeometry(format!(
                    "element {}: endpoints are coincident",
                    element.id
                )));
            }
            if self.material(element.material).is_none() {
                return Err(KernelError::MaterialNotFound(element.material));
            }
            if self.section(element.section).is_none() {
                return Err(KernelError::SectionNotFound(element.section));
            }
        }

        for bc in &self.boundary_conditions {
            if self.node(bc.node).is_none() {
                return Err(KernelError::NodeNotFound(bc.node));
            }
            for spring in bc.springs.iter().flatten() {
                if !(spring.is_finite() && *spring >= 0.0) {
                    return Err(KernelError::InvalidProperty(format!(
                        "boundary condition at node {}: spring stiffness must be finite and non-negative",
                        bc.node
                    )));
                }
            }
        }

        for load in &self.loads {
            match load {
                Load::Point(point) => {
                    if self.node(point.node).is_none() {
                        return Err(KernelError::NodeNotFound(point.node));
                    }
                }
                Load::Distributed(udl) => {
                    let element = self
                        .element(udl.element)
                        .ok_or(KernelError::ElementNotFound(udl.element))?;
                    let start = self.node(element.start_node);
                    let end = self.node(element.end_node);
                    if let (Some(start), Some(end)) = (start, end) {
                        let length = start.distance_to(end);
                        let from = udl.start_distance.unwrap_or(0.0);
                        let to = udl.end_distance.unwrap_or(length);
                        if !(from >= 0.0 && to <= length + COINCIDENT_TOLERANCE && from < to) {
                            return Err(KernelError::InvalidLoad(format!(
                                "distributed load on element {}: span [{from}, {to}] does not fit length {length}",
                                udl.element
                            )));
                        }
                    }
                }
            }
        }

        let mut warnings = Vec::new();

        if self.loads.is_empty() {
            warnings.push("model has no loads defined".to_string());
        }
        if self.boundary_conditions.is_empty() {
            warnings.push("model has no supports".to_string());
        }
        let restraints = self.num_restraints();
        if restraints < MIN_RESTRAINTS {
            warnings.push(format!(
                "model is under-constrained ({restraints} restraints, {MIN_RESTRAINTS} required for a static solve)"
            ));
        }

        let connected: HashSet<i64> = self
            .elements
            .iter()
            .flat_map(|e| [e.start_node, e.end_node])
            .collect();
        let disconnected = self
            .nodes
            .iter()
            .filter(|n| !connected.contains(&n.id))
            .count();
        if disconnected > 0 {
            warnings.push(format!("{disconnected} node(s) are not connected to any element"));
        }

        Ok(warnings)
    }

    fn check_unique(kind: &'static str, ids: impl Iterator<Item = i64>) -> KernelResult<()> {
        let mut seen = HashSet::new();
        for id in ids {
            if !seen.insert(id) {
                return Err(KernelError::DuplicateId { kind, id });
            }
        }
        Ok(())
    }
}
