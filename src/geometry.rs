//! Element geometry: lengths and local coordinate frames

use nalgebra::{Matrix3, Point3, Vector3};

/// Endpoints closer than this are treated as coincident (metres).
pub const COINCIDENT_TOLERANCE: f64 = 1e-9;

/// Elements whose axis has |cos| with global Z above this value take global Y
/// as the reference direction instead, keeping the cross product well
/// conditioned. The value is contractual: reference outputs depend on it.
const VERTICAL_THRESHOLD: f64 = 0.99;

/// Straight-line length between two element endpoints.
pub fn element_length(start: &Point3<f64>, end: &Point3<f64>) -> f64 {
    (end - start).norm()
}

/// Direction cosine matrix for an element's local frame.
///
/// Rows 0..3 hold the local x, y, z axes expressed in global components, so
/// the matrix maps global vectors into the local frame. Local x runs from
/// `start` to `end`; local z is built against a vertical-aware reference
/// direction; the roll angle (radians) then rotates local y and z about
/// local x.
///
/// Endpoints must not be coincident; callers validate this before assembly.
pub fn local_axes(start: &Point3<f64>, end: &Point3<f64>, roll: f64) -> Matrix3<f64> {
    let axis = end - start;
    let length = axis.norm();
    if length < COINCIDENT_TOLERANCE {
        panic!("element endpoints are coincident");
    }
    let local_x = axis / length;

    let reference = if local_x.dot(&Vector3::z()).abs() > VERTICAL_THRESHOLD {
        Vector3::y()
    } else {
        Vector3::z()
    };

    let local_z = local_x.cross(&reference).normalize();
    let local_y = local_z.cross(&local_x).normalize();

    let (local_y, local_z) = if roll != 0.0 {
        let (sin_r, cos_r) = roll.sin_cos();
        (
            local_y * cos_r + local_z * sin_r,
            local_z * cos_r - local_y * sin_r,
        )
    } else {
        (local_y, local_z)
    };

    Matrix3::from_rows(&[
        local_x.transpose(),
        local_y.transpose(),
        local_z.transpose(),
    ])
}
