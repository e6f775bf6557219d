//! Pyramid glyph drawn at every selected camera.

use crate::common::{CAMERA_NUM_POINTS, CAMERA_NUM_TRIANGLES, EPSILON_MARGIN};
use crate::error::ViewerError;
use crate::linalg::mul_mat4_vec4;
use crate::pose::{is_finite_vector3, is_pose_matrix, pose_to_matrix};
use crate::structures::{CameraPose, Color, Mesh, Point, Triangle};
use tracing::trace;

/// Apex at the camera center, image plane at local z = 1, a small notch
/// below the frame (5, 6, 7) and a ridge point (8) marking "down".
#[rustfmt::skip]
const CAMERA_POINTS: [[f32; 3]; CAMERA_NUM_POINTS] = [
    [0.0, 0.0, 0.0],
    [0.75, 0.5, 1.0], [-0.75, 0.5, 1.0],
    [-0.75, -0.5, 1.0], [0.75, -0.5, 1.0],
    [-0.2, -0.5, 1.0], [0.2, -0.5, 1.0], [0.0, -0.7, 1.0],
    [0.0, 0.0, 0.5],
];

#[rustfmt::skip]
const CAMERA_TRIANGLES: [Triangle; CAMERA_NUM_TRIANGLES] = [
    Triangle::new(0, 2, 1), Triangle::new(0, 1, 4), Triangle::new(0, 4, 3),
    Triangle::new(0, 3, 2), Triangle::new(2, 3, 4), Triangle::new(1, 2, 4),
    Triangle::new(6, 5, 7), Triangle::new(7, 5, 8), Triangle::new(6, 7, 8),
];

/// Appends one camera glyph, scaled by `resize` and placed by `pose`.
///
/// `camera` is the trajectory index of the pose, used for error reporting.
pub fn make_camera_geometry(
    mesh: &mut Mesh,
    color: Color,
    pose: &CameraPose,
    resize: f32,
    camera: usize,
) -> Result<(), ViewerError> {
    let pose_m4 = pose_to_matrix(pose);
    if !is_pose_matrix(&pose_m4, EPSILON_MARGIN) {
        return Err(ViewerError::InvalidPoseMatrix { camera });
    }

    let bias = mesh.bias(CAMERA_NUM_POINTS)?;
    let mut staged = [Point::default(); CAMERA_NUM_POINTS];
    for (local, slot) in CAMERA_POINTS.iter().zip(staged.iter_mut()) {
        let position = [local[0] * resize, local[1] * resize, local[2] * resize, 1.0];
        let world = mul_mat4_vec4(&pose_m4, position);
        let world = [world[0], world[1], world[2]];
        if !is_finite_vector3(world) {
            return Err(ViewerError::NonFiniteVector {
                what: "camera vertex",
                index: camera,
            });
        }
        *slot = Point::new(world, color);
    }

    mesh.points.extend_from_slice(&staged);
    mesh.triangles
        .extend(CAMERA_TRIANGLES.iter().map(|t| t.biased(bias)));

    trace!(camera, bias, "camera glyph emitted");
    Ok(())
}
