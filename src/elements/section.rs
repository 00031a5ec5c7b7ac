//! Cross-section properties for frame elements

use serde::{Deserialize, Serialize};

/// Cross-section of a prismatic frame element. The kernel interior is
/// SI-only; mm-based source data goes through [`Section::from_mm`] at the
/// loader boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Section {
    /// Stable identifier within one analysis
    pub id: i64,
    /// Cross-sectional area (m²)
    pub area: f64,
    /// Second moment of area about the local y-axis (m⁴)
    pub iy: f64,
    /// Second moment of area about the local z-axis (m⁴)
    pub iz: f64,
    /// Torsional constant (m⁴)
    pub j: f64,
}

impl Section {
    pub fn new(id: i64, area: f64, iy: f64, iz: f64, j: f64) -> Self {
        Self { id, area, iy, iz, j }
    }

    /// Convert mm-based catalogue properties (mm², mm⁴) to SI.
    pub fn from_mm(id: i64, area_mm2: f64, iy_mm4: f64, iz_mm4: f64, j_mm4: f64) -> Self {
        Self::new(id, area_mm2 / 1e6, iy_mm4 / 1e12, iz_mm4 / 1e12, j_mm4 / 1e12)
    }

    /// Solid rectangle, `width` along local z, `depth` along local y (m).
    pub fn rectangular(id: i64, width: f64, depth: f64) -> Self {
        let area = width * depth;
        let iy = width * depth.powi(3) / 12.0;
        let iz = depth * width.powi(3) / 12.0;

        let (long, short) = if width > depth {
            (width, depth)
        } else {
            (depth, width)
        };
        let j = long * short.powi(3) / 3.0 * (1.0 - 0.63 * short / long);

        Self::new(id, area, iy, iz, j)
    }

    /// Solid circle of the given diameter (m).
    pub fn circular(id: i64, diameter: f64) -> Self {
        let r = diameter / 2.0;
        let area = std::f64::consts::PI * r.powi(2);
        let i = std::f64::consts::PI * r.powi(4) / 4.0;
        let j = std::f64::consts::PI * r.powi(4) / 2.0;
        Self::new(id, area, i, i, j)
    }

    /// Doubly symmetric I-section from overall depth, flange width and
    /// plate thicknesses (m).
    pub fn wide_flange(
        id: i64,
        depth: f64,
        flange_width: f64,
        flange_thickness: f64,
        web_thickness: f64,
    ) -> Self {
        let bf = flange_width;
        let tf = flange_thickness;
        let tw = web_thickness;
        let hw = depth - 2.0 * tf;

        let area = 2.0 * bf * tf + hw * tw;
        let iy = (bf * depth.powi(3) - (bf - tw) * hw.powi(3)) / 12.0;
        let iz = (2.0 * tf * bf.powi(3) + hw * tw.powi(3)) / 12.0;
        let j = (2.0 * bf * tf.powi(3) + hw * tw.powi(3)) / 3.0;

        Self::new(id, area, iy, iz, j)
    }

    /// Radius of gyration about local y
    pub fn ry(&self) -> f64 {
        (self.iy / self.area).sqrt()
    }

    /// Radius of gyration about local z
    pub fn rz(&self) -> f64 {
        (self.iz / self.area).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rectangular_properties() {
        let s = Section::rectangular(1, 0.3, 0.5);
        assert_relative_eq!(s.area, 0.15, epsilon = 1e-12);
        assert_relative_eq!(s.iy, 0.3 * 0.5_f64.powi(3) / 12.0, epsilon = 1e-12);
        assert_relative_eq!(s.iz, 0.5 * 0.3_f64.powi(3) / 12.0, epsilon = 1e-12);
    }

    #[test]
    fn circular_section_is_doubly_symmetric() {
        let s = Section::circular(1, 0.4);
        assert_relative_eq!(s.iy, s.iz, epsilon = 1e-15);
        assert_relative_eq!(s.j, 2.0 * s.iy, epsilon = 1e-15);
    }

    #[test]
    fn mm_conversion_scales_correctly() {
        // 7650 mm², 204e6 mm⁴ style catalogue values
        let s = Section::from_mm(1, 7650.0, 204e6, 17.3e6, 0.3e6);
        assert_relative_eq!(s.area, 7.65e-3, epsilon = 1e-15);
        assert_relative_eq!(s.iy, 204e-6, epsilon = 1e-15);
    }
}
