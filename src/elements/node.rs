//! Nodes: points in 3D space owning six degrees of freedom

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// A node in the structural model. Coordinates are metres.
///
/// Each node owns six ordered DOFs: translations ux, uy, uz followed by
/// rotations rx, ry, rz.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Node {
    /// Stable identifier within one analysis
    pub id: i64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Node {
    pub fn new(id: i64, x: f64, y: f64, z: f64) -> Self {
        Self { id, x, y, z }
    }

    pub fn position(&self) -> Point3<f64> {
        Point3::new(self.x, self.y, self.z)
    }

    pub fn distance_to(&self, other: &Node) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}
