//! Distributed loads on frame elements

use serde::{Deserialize, Serialize};

/// A uniformly distributed load over an element, components per unit length
/// in GLOBAL axes.
///
/// The moment components are carried for interface completeness; the
/// equivalent-nodal-load conversion uses the force terms. Start/end
/// distances default to the full element; the kernel does not subdivide
/// elements, so partial loads are the caller's pre-split responsibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributedLoad {
    pub element: i64,
    /// [wx, wy, wz, mx, my, mz] per metre (N/m, N·m/m)
    pub w: [f64; 6],
    /// Distance from the start node where the load begins (m)
    pub start_distance: Option<f64>,
    /// Distance from the start node where the load ends (m)
    pub end_distance: Option<f64>,
    /// Load case label
    pub case: String,
}

impl DistributedLoad {
    pub fn new(element: i64, w: [f64; 6], case: &str) -> Self {
        Self {
            element,
            w,
            start_distance: None,
            end_distance: None,
            case: case.to_string(),
        }
    }

    /// Restrict the load to a sub-span of the element.
    pub fn over(mut self, start: f64, end: f64) -> Self {
        self.start_distance = Some(start);
        self.end_distance = Some(end);
        self
    }

    /// Loaded length given the element length.
    pub fn loaded_length(&self, element_length: f64) -> f64 {
        let start = self.start_distance.unwrap_or(0.0);
        let end = self.end_distance.unwrap_or(element_length);
        end - start
    }

    /// Total force resultant over the loaded length.
    pub fn total_force(&self, element_length: f64) -> [f64; 3] {
        let length = self.loaded_length(element_length);
        [self.w[0] * length, self.w[1] * length, self.w[2] * length]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_full_element() {
        let load = DistributedLoad::new(1, [0.0, -1000.0, 0.0, 0.0, 0.0, 0.0], "Dead");
        assert_eq!(load.loaded_length(8.0), 8.0);
        assert_eq!(load.total_force(8.0)[1], -8000.0);
    }

    #[test]
    fn partial_span() {
        let load = DistributedLoad::new(1, [0.0, 0.0, -500.0, 0.0, 0.0, 0.0], "Snow").over(1.0, 3.0);
        assert_eq!(load.loaded_length(10.0), 2.0);
        assert_eq!(load.total_force(10.0)[2], -1000.0);
    }
}
