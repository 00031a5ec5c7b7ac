//! Frame elements: prismatic line members carrying axial force, biaxial
//! bending, shear and torsion

use serde::{Deserialize, Serialize};

/// Semantic classification of a frame element. Has no effect on the
/// stiffness formulation; carried through for downstream consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementKind {
    Beam,
    Column,
    Brace,
}

/// Moment releases at one element end. A released component transmits
/// exactly zero moment at that end. Axial force and shear are never
/// releasable, which the shape of this type enforces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndReleases {
    /// Torsion (moment about local x)
    pub torsion: bool,
    /// Bending about local y
    pub moment_y: bool,
    /// Bending about local z
    pub moment_z: bool,
}

impl EndReleases {
    /// Decode from the wire mask: bit 0 = torsion, bit 1 = bend-y,
    /// bit 2 = bend-z.
    pub fn from_bits(bits: u8) -> Self {
        Self {
            torsion: bits & 0b001 != 0,
            moment_y: bits & 0b010 != 0,
            moment_z: bits & 0b100 != 0,
        }
    }

    /// Encode to the wire mask.
    pub fn bits(&self) -> u8 {
        (self.torsion as u8) | (self.moment_y as u8) << 1 | (self.moment_z as u8) << 2
    }

    pub fn any(&self) -> bool {
        self.torsion || self.moment_y || self.moment_z
    }

    /// Release both bending components (a conventional pin).
    pub fn pinned() -> Self {
        Self {
            torsion: false,
            moment_y: true,
            moment_z: true,
        }
    }
}

/// Releases at both element ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Releases {
    pub start: EndReleases,
    pub end: EndReleases,
}

impl Releases {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn any(&self) -> bool {
        self.start.any() || self.end.any()
    }

    /// Map to the 12 local element DOFs. Released entries are the
    /// rotational slots 3..6 (start) and 9..12 (end).
    pub fn as_local_dofs(&self) -> [bool; 12] {
        let mut dofs = [false; 12];
        dofs[3] = self.start.torsion;
        dofs[4] = self.start.moment_y;
        dofs[5] = self.start.moment_z;
        dofs[9] = self.end.torsion;
        dofs[10] = self.end.moment_y;
        dofs[11] = self.end.moment_z;
        dofs
    }
}

/// A 3D frame element connecting two distinct nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    /// Stable identifier within one analysis
    pub id: i64,
    pub start_node: i64,
    pub end_node: i64,
    pub kind: ElementKind,
    /// Roll angle about the element axis (radians)
    pub roll: f64,
    /// Material id
    pub material: i64,
    /// Section id
    pub section: i64,
    pub releases: Releases,
}

impl Element {
    pub fn new(id: i64, start_node: i64, end_node: i64, material: i64, section: i64) -> Self {
        Self {
            id,
            start_node,
            end_node,
            kind: ElementKind::Beam,
            roll: 0.0,
            material,
            section,
            releases: Releases::none(),
        }
    }

    pub fn with_kind(mut self, kind: ElementKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_roll(mut self, roll: f64) -> Self {
        self.roll = roll;
        self
    }

    pub fn with_releases(mut self, releases: Releases) -> Self {
        self.releases = releases;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_mask_round_trip() {
        for bits in 0..8u8 {
            assert_eq!(EndReleases::from_bits(bits).bits(), bits);
        }
    }

    #[test]
    fn release_dof_mapping() {
        let releases = Releases {
            start: EndReleases {
                torsion: true,
                moment_y: false,
                moment_z: true,
            },
            end: EndReleases {
                torsion: false,
                moment_y: true,
                moment_z: false,
            },
        };
        let dofs = releases.as_local_dofs();
        assert!(dofs[3] && !dofs[4] && dofs[5]);
        assert!(!dofs[9] && dofs[10] && !dofs[11]);
        // Translational DOFs are never releasable
        for i in [0, 1, 2, 6, 7, 8] {
            assert!(!dofs[i]);
        }
    }

    #[test]
    fn element_builder() {
        let element = Element::new(7, 1, 2, 10, 20)
            .with_kind(ElementKind::Column)
            .with_roll(0.3);
        assert_eq!(element.kind, ElementKind::Column);
        assert_eq!(element.roll, 0.3);
        assert!(!element.releases.any());
    }
}
