//! Load types and load combinations

mod distributed;
mod load_combo;
mod node_load;

pub use distributed::DistributedLoad;
pub use load_combo::LoadCombination;
pub use node_load::PointLoad;

use serde::{Deserialize, Serialize};

/// A load in the input record: either a point load at a node or a uniformly
/// distributed load over an element. Each load belongs to a load case; a
/// [`LoadCombination`] scales cases into an analysis load vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Load {
    Point(PointLoad),
    Distributed(DistributedLoad),
}

impl Load {
    /// Point load at a node, components [fx, fy, fz, mx, my, mz] in global
    /// axes (N, N·m).
    pub fn point(node: i64, components: [f64; 6], case: &str) -> Self {
        Self::Point(PointLoad::new(node, components, case))
    }

    /// Uniformly distributed load over the full element length, components
    /// per unit length in global axes.
    pub fn distributed(element: i64, w: [f64; 6], case: &str) -> Self {
        Self::Distributed(DistributedLoad::new(element, w, case))
    }

    pub fn case(&self) -> &str {
        match self {
            Self::Point(load) => &load.case,
            Self::Distributed(load) => &load.case,
        }
    }
}
