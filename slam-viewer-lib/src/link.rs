//! Tapered tube glyph connecting two consecutive camera centers.
//!
//! The local tube runs along +z: a cap and ring around the origin (first
//! 13 vertices) and a ring and cap around z = 20 (last 13 vertices). The far
//! half is shifted back by 20 before scaling so each half is centered on its
//! own camera; both halves share one orientation frame.

use crate::common::{EPSILON_MARGIN, LINK_NUM_POINTS, LINK_NUM_TRIANGLES};
use crate::error::ViewerError;
use crate::linalg::{
    add3, axis_angle_to_rotation_f64, cross_f64, identity3, mul_mat3_vec3, narrow_mat3,
    norm3_f64, normalize3_f64, scale3, widen3, Mat3, Vec3,
};
use crate::pose::{
    angle_between_f64, is_finite_vector3, is_rotation_matrix, pose_to_matrix, translation,
};
use crate::structures::{CameraPose, Color, Mesh, Point, Triangle};
use tracing::trace;

const LINK_LENGTH: f32 = 20.0;

/// Below this length the projected "up" vector is treated as parallel to the link.
const PARALLEL_TOLERANCE: f64 = 1e-6;

const UP: Vec3 = [0.0, 0.0, 1.0];

const P: f32 = 0.707_106_7; // sqrt(2) / 2
const N: f32 = -P;
const PP: f32 = 0.577_350_2; // sqrt(3) / 3
const NN: f32 = -PP;
const P20: f32 = PP + LINK_LENGTH;

#[rustfmt::skip]
const LINK_POINTS: [[f32; 3]; LINK_NUM_POINTS] = [
    [0.0, 0.0, -1.0],
    [NN, NN, NN], [PP, NN, NN], [PP, PP, NN], [NN, PP, NN],
    [0.0, -1.0, 0.0], [N, N, 0.0], [-1.0, 0.0, 0.0], [N, P, 0.0],
    [0.0, 1.0, 0.0], [P, P, 0.0], [1.0, 0.0, 0.0], [P, N, 0.0],

    [0.0, -1.0, 20.0], [N, N, 20.0], [-1.0, 0.0, 20.0], [N, P, 20.0],
    [0.0, 1.0, 20.0], [P, P, 20.0], [1.0, 0.0, 20.0], [P, N, 20.0],
    [NN, NN, P20], [PP, NN, P20], [PP, PP, P20], [NN, PP, P20],
    [0.0, 0.0, 21.0],
];

const fn t(a: u32, b: u32, c: u32) -> Triangle {
    Triangle::new(a, b, c)
}

#[rustfmt::skip]
const LINK_TRIANGLES: [Triangle; LINK_NUM_TRIANGLES] = [
    // near cap
    t(0, 2, 1), t(0, 3, 2), t(0, 4, 3), t(0, 1, 4),

    // near cap to near ring
    t(1, 5, 6), t(1, 2, 5), t(5, 2, 12),
    t(2, 11, 12), t(2, 3, 11), t(11, 3, 10),
    t(3, 9, 10), t(3, 4, 9), t(9, 4, 8),
    t(4, 7, 8), t(4, 1, 7), t(7, 1, 6),

    // tube body
    t(5, 13, 6), t(13, 14, 6), t(6, 14, 7), t(14, 15, 7),
    t(7, 15, 8), t(15, 16, 8), t(8, 16, 9), t(16, 17, 9),
    t(9, 17, 10), t(17, 18, 10), t(10, 18, 11), t(18, 19, 11),
    t(11, 19, 12), t(19, 20, 12), t(12, 20, 13), t(13, 5, 12),

    // far ring to far cap
    t(19, 22, 20), t(19, 23, 22), t(18, 23, 19),
    t(17, 23, 18), t(17, 24, 23), t(16, 24, 17),
    t(15, 24, 16), t(15, 21, 24), t(14, 21, 15),
    t(13, 21, 14), t(13, 22, 21), t(20, 22, 13),

    // far cap
    t(25, 24, 21), t(25, 21, 22), t(25, 22, 23), t(25, 23, 24),
];

/// Frame whose local +z points from `cam1` to `cam2`.
///
/// The rotation about `cross(A, B')` by the angle between the link axis `A`
/// and world up `B` carries `A` onto `B`; its inverse is returned. When the
/// link is (anti)parallel to `B` the identity is used. The frame is built in
/// f64 and rounded once, so only genuinely degenerate links fail the
/// rotation check.
pub fn rotation_between_cam_centers(
    cam1: Vec3,
    cam2: Vec3,
    link: usize,
) -> Result<Mat3, ViewerError> {
    let (c1, c2) = (widen3(cam1), widen3(cam2));
    let a = normalize3_f64([c2[0] - c1[0], c2[1] - c1[1], c2[2] - c1[2]]);
    if !a.iter().all(|c| c.is_finite()) {
        return Err(ViewerError::DegenerateLink { link });
    }

    let up = widen3(UP);
    // B' = up - A (A . up)
    let b_proj = [-a[0] * a[2], -a[1] * a[2], up[2] - a[2] * a[2]];
    if norm3_f64(b_proj) < PARALLEL_TOLERANCE {
        return Ok(identity3());
    }
    let b_proj = normalize3_f64(b_proj);

    let angle = angle_between_f64(a, up);
    let axis = normalize3_f64(cross_f64(a, b_proj));
    let rot = narrow_mat3(&axis_angle_to_rotation_f64(axis, -angle));

    if !is_rotation_matrix(&rot, EPSILON_MARGIN) {
        return Err(ViewerError::InvalidRotationMatrix { link });
    }
    Ok(rot)
}

/// Appends one link glyph between `pose1` and `pose2`.
///
/// The glyph is scaled by `resize_for_links * resize`. `link` is the position
/// of this link in emission order, used for error reporting.
#[allow(clippy::too_many_arguments)]
pub fn make_cameras_link(
    mesh: &mut Mesh,
    color1: Color,
    color2: Color,
    pose1: &CameraPose,
    pose2: &CameraPose,
    resize: f32,
    resize_for_links: f32,
    link: usize,
) -> Result<(), ViewerError> {
    let cam1 = translation(&pose_to_matrix(pose1));
    let cam2 = translation(&pose_to_matrix(pose2));
    for cam in [cam1, cam2] {
        if !is_finite_vector3(cam) {
            return Err(ViewerError::NonFiniteVector {
                what: "link endpoint",
                index: link,
            });
        }
    }

    let rot = rotation_between_cam_centers(cam1, cam2, link)?;
    let ratio = resize_for_links * resize;
    let bias = mesh.bias(LINK_NUM_POINTS)?;
    let half = LINK_NUM_POINTS / 2;

    let mut staged = [Point::default(); LINK_NUM_POINTS];
    for (i, (local, slot)) in LINK_POINTS.iter().zip(staged.iter_mut()).enumerate() {
        let (cam, color, shift) = if i < half {
            (cam1, color1, 0.0)
        } else {
            (cam2, color2, LINK_LENGTH)
        };
        let p = [local[0], local[1], local[2] - shift];
        let world = add3(scale3(mul_mat3_vec3(&rot, p), ratio), cam);
        if !is_finite_vector3(world) {
            return Err(ViewerError::NonFiniteVector {
                what: "link vertex",
                index: link,
            });
        }
        *slot = Point::new(world, color);
    }

    mesh.points.extend_from_slice(&staged);
    mesh.triangles
        .extend(LINK_TRIANGLES.iter().map(|t| t.biased(bias)));

    trace!(link, bias, "link glyph emitted");
    Ok(())
}
