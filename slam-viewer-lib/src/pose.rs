use crate::linalg::{
    determinant3_f64, dot3_f64, identity4, norm3_f64, quaternion_to_rotation_matrix,
    rotation_matrix_to_quaternion, widen3, widen_mat3, DVec3, Mat3, Mat4, Vec3, Vec4,
};
use crate::structures::{CameraPose, Quaternion};

/// Homogeneous transform `[R t; 0 1]` of a camera pose.
pub fn pose_to_matrix(pose: &CameraPose) -> Mat4 {
    let rot = quaternion_to_rotation_matrix(pose.q.to_array());
    let mut m = identity4();
    for (dst, src) in m.iter_mut().zip(rot.iter()) {
        dst[..3].copy_from_slice(src);
    }
    m[0][3] = pose.p.x;
    m[1][3] = pose.p.y;
    m[2][3] = pose.p.z;
    m
}

#[inline]
pub fn rotation_block(m: &Mat4) -> Mat3 {
    [
        [m[0][0], m[0][1], m[0][2]],
        [m[1][0], m[1][1], m[1][2]],
        [m[2][0], m[2][1], m[2][2]],
    ]
}

#[inline]
pub fn translation(m: &Mat4) -> Vec3 {
    [m[0][3], m[1][3], m[2][3]]
}

pub fn matrix3_to_quaternion(m: &Mat3) -> Quaternion {
    Quaternion::from_array(rotation_matrix_to_quaternion(m))
}

/// Orientation of a pose matrix; the translation column is ignored.
pub fn matrix4_to_quaternion(m: &Mat4) -> Quaternion {
    matrix3_to_quaternion(&rotation_block(m))
}

/// `m * mᵗ ≈ I` and `det(m) ≈ 1`, both within `margin`.
///
/// The products are evaluated in f64 so the check only measures the error
/// already present in `m`.
pub fn is_rotation_matrix(m: &Mat3, margin: f32) -> bool {
    if !m.iter().flatten().all(|v| v.is_finite()) {
        return false;
    }
    let margin = margin as f64;
    let md = widen_mat3(m);
    for i in 0..3 {
        for j in 0..3 {
            let dot: f64 = (0..3).map(|k| md[i][k] * md[j][k]).sum();
            let expected = if i == j { 1.0 } else { 0.0 };
            if (dot - expected).abs() > margin {
                return false;
            }
        }
    }
    (determinant3_f64(&md) - 1.0).abs() <= margin
}

/// Bottom row `≈ [0, 0, 0, 1]`, finite translation and a proper rotation block.
pub fn is_pose_matrix(m: &Mat4, margin: f32) -> bool {
    let bottom_ok = m[3]
        .iter()
        .zip([0.0f32, 0.0, 0.0, 1.0])
        .all(|(v, e)| (v - e).abs() <= margin);
    bottom_ok
        && is_finite_vector3(translation(m))
        && is_rotation_matrix(&rotation_block(m), margin)
}

#[inline]
pub fn is_finite_vector3(v: Vec3) -> bool {
    v.iter().all(|c| c.is_finite())
}

#[inline]
pub fn is_finite_vector4(v: Vec4) -> bool {
    v.iter().all(|c| c.is_finite())
}

/// Angle in radians between two non-zero vectors. NaN if either has zero length.
pub fn angle_between(a: Vec3, b: Vec3) -> f32 {
    angle_between_f64(widen3(a), widen3(b)) as f32
}

pub fn angle_between_f64(a: DVec3, b: DVec3) -> f64 {
    let cos = dot3_f64(a, b) / (norm3_f64(a) * norm3_f64(b));
    // Rounding can push parallel vectors just past ±1.
    cos.clamp(-1.0, 1.0).acos()
}
