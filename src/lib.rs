//! A structural analysis kernel for three-dimensional framed structures.
//!
//! Given a model of nodes, frame elements (beams, columns, braces),
//! materials, sections, supports and loads, the kernel produces nodal
//! displacements, support reactions and element internal forces from a
//! linear static solve; natural frequencies, mass-normalized mode shapes
//! and participation factors from a modal solve; and combined displacement
//! responses from a response-spectrum run.
//!
//! The kernel is a pure library: all inputs are resident in memory, nothing
//! is printed or persisted, and repeated solves on identical inputs are
//! bitwise reproducible. Status (singular system, eigensolver divergence)
//! travels inside the result records.
//!
//! ## Example
//! ```rust
//! use frame_analysis::prelude::*;
//!
//! let mut model = Model::new();
//! model.add_material(Material::steel(1));
//! model.add_section(Section::new(1, 7.65e-3, 204e-6, 17.3e-6, 0.3e-6));
//! model.add_node(Node::new(1, 0.0, 0.0, 0.0));
//! model.add_node(Node::new(2, 10.0, 0.0, 0.0));
//! model.add_element(Element::new(1, 1, 2, 1, 1));
//! model.add_boundary_condition(BoundaryCondition::fixed(1));
//! model.add_load(Load::point(2, [0.0, -10_000.0, 0.0, 0.0, 0.0, 0.0], "Dead"));
//! model.add_combination(LoadCombination::single("D", "Dead"));
//!
//! let engine = AnalysisEngine::new(&model).unwrap();
//! let result = engine.linear_static_by_label("D").unwrap();
//!
//! let tip = result.node_displacement(2).unwrap();
//! assert!(tip.uy < 0.0);
//! ```

pub mod analysis;
pub mod assembler;
pub mod elements;
pub mod error;
pub mod geometry;
pub mod loads;
pub mod math;
pub mod model;
pub mod results;
pub mod solver;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::AnalysisEngine;
    pub use crate::assembler::{Assembler, DofMap};
    pub use crate::elements::{
        BoundaryCondition, Element, ElementKind, EndReleases, Material, Node, Releases, Section,
    };
    pub use crate::error::{KernelError, KernelResult};
    pub use crate::loads::{DistributedLoad, Load, LoadCombination, PointLoad};
    pub use crate::model::Model;
    pub use crate::results::{
        ElementForces, ModalResult, ModalStatus, ModeStatus, NodeDisplacement, NodeReaction,
        SolveStatus, SpectrumResult, StaticResult,
    };
    pub use crate::solver::modal::{influence_z, ModalSettings};
    pub use crate::solver::spectrum::{CombinationMethod, SpectrumTable};
}
