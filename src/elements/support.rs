//! Support conditions at nodes

use serde::{Deserialize, Serialize};

/// Restraints and elastic springs at a node.
///
/// `restraints` follows the node DOF order [ux, uy, uz, rx, ry, rz]. Spring
/// stiffnesses (N/m, N·m/rad) apply additively on DOFs that are NOT
/// restrained; a spring on a restrained DOF is ignored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundaryCondition {
    pub node: i64,
    pub restraints: [bool; 6],
    pub springs: [Option<f64>; 6],
}

impl BoundaryCondition {
    /// No restraints, no springs.
    pub fn free(node: i64) -> Self {
        Self {
            node,
            restraints: [false; 6],
            springs: [None; 6],
        }
    }

    /// All six DOFs restrained.
    pub fn fixed(node: i64) -> Self {
        Self {
            restraints: [true; 6],
            ..Self::free(node)
        }
    }

    /// Translations restrained, rotations free.
    pub fn pinned(node: i64) -> Self {
        Self {
            restraints: [true, true, true, false, false, false],
            ..Self::free(node)
        }
    }

    pub fn with_restraints(node: i64, restraints: [bool; 6]) -> Self {
        Self {
            restraints,
            ..Self::free(node)
        }
    }

    /// Attach an elastic spring to one DOF (index 0..6 in node DOF order).
    pub fn with_spring(mut self, dof: usize, stiffness: f64) -> Self {
        self.springs[dof] = Some(stiffness);
        self
    }

    pub fn num_restrained(&self) -> usize {
        self.restraints.iter().filter(|&&r| r).count()
    }

    pub fn is_restrained(&self) -> bool {
        self.restraints.iter().any(|&r| r)
    }
}
