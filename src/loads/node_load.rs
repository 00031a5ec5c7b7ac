//! Point loads applied directly to nodes

use serde::{Deserialize, Serialize};

/// A concentrated load at a node, global axes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointLoad {
    pub node: i64,
    /// [fx, fy, fz, mx, my, mz] (N, N·m)
    pub components: [f64; 6],
    /// Load case label
    pub case: String,
}

impl PointLoad {
    pub fn new(node: i64, components: [f64; 6], case: &str) -> Self {
        Self {
            node,
            components,
            case: case.to_string(),
        }
    }

    /// Force-only load.
    pub fn force(node: i64, fx: f64, fy: f64, fz: f64, case: &str) -> Self {
        Self::new(node, [fx, fy, fz, 0.0, 0.0, 0.0], case)
    }

    /// Moment-only load.
    pub fn moment(node: i64, mx: f64, my: f64, mz: f64, case: &str) -> Self {
        Self::new(node, [0.0, 0.0, 0.0, mx, my, mz], case)
    }
}
