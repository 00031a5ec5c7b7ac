//! Material properties

use serde::{Deserialize, Serialize};

/// Isotropic linear-elastic material. All quantities SI.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Material {
    /// Stable identifier within one analysis
    pub id: i64,
    /// Elastic modulus (Pa)
    pub elastic_modulus: f64,
    /// Poisson's ratio, in (0, 0.5)
    pub poisson_ratio: f64,
    /// Mass density (kg/m³)
    pub density: f64,
}

impl Material {
    pub fn new(id: i64, elastic_modulus: f64, poisson_ratio: f64, density: f64) -> Self {
        Self {
            id,
            elastic_modulus,
            poisson_ratio,
            density,
        }
    }

    /// Shear modulus G = E / (2 (1 + ν))
    pub fn shear_modulus(&self) -> f64 {
        self.elastic_modulus / (2.0 * (1.0 + self.poisson_ratio))
    }

    /// Isotropic material from E and ν; the shear modulus follows as
    /// G = E / (2 (1 + ν))
    pub fn isotropic(id: i64, elastic_modulus: f64, poisson_ratio: f64, density: f64) -> Self {
        Self::new(id, elastic_modulus, poisson_ratio, density)
    }

    /// Structural steel (E = 200 GPa, ν = 0.3, ρ = 7850 kg/m³)
    pub fn steel(id: i64) -> Self {
        Self::new(id, 200e9, 0.3, 7850.0)
    }

    /// Normal-weight concrete from its compressive strength f'c (Pa),
    /// with E = 4700 √(f'c in MPa) MPa
    pub fn concrete(id: i64, fc: f64) -> Self {
        let fc_mpa = fc / 1e6;
        let e = 4700.0 * fc_mpa.sqrt() * 1e6;
        Self::new(id, e, 0.2, 2400.0)
    }
}
