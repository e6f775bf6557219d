use crate::camera::make_camera_geometry;
use crate::common::{
    clamp_u8, lerp, CAMERA_NUM_POINTS, CAMERA_NUM_TRIANGLES, DEFAULT_DOWNSAMPLE_CAMERAS,
    DEFAULT_DOWNSAMPLE_LINKS, DEFAULT_RESIZE, DEFAULT_RESIZE_FOR_LINKS, LINK_NUM_POINTS,
    LINK_NUM_TRIANGLES,
};
use crate::error::ViewerError;
use crate::link::make_cameras_link;
use crate::structures::{CameraPose, Color, Mesh, Quaternion};
use tracing::{debug, info};

/// Parameters of one trajectory-to-mesh conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryConfig {
    pub resize: f32,
    /// Multiplied with `resize` for link glyphs.
    pub resize_for_links: f32,
    pub first_color: Color,
    pub last_color: Color,
    pub downsample_cameras: i32,
    pub downsample_links: i32,
    /// Euler angles in degrees, applied to every orientation as `q * correction`.
    pub angle_correction: Option<[f32; 3]>,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            resize: DEFAULT_RESIZE,
            resize_for_links: DEFAULT_RESIZE_FOR_LINKS,
            first_color: Color::RED,
            last_color: Color::BLUE,
            downsample_cameras: DEFAULT_DOWNSAMPLE_CAMERAS,
            downsample_links: DEFAULT_DOWNSAMPLE_LINKS,
            angle_correction: None,
        }
    }
}

impl TrajectoryConfig {
    pub fn with_resize(mut self, resize: f32) -> Self {
        self.resize = resize;
        self
    }

    pub fn with_resize_for_links(mut self, resize_for_links: f32) -> Self {
        self.resize_for_links = resize_for_links;
        self
    }

    pub fn with_first_color(mut self, color: Color) -> Self {
        self.first_color = color;
        self
    }

    pub fn with_last_color(mut self, color: Color) -> Self {
        self.last_color = color;
        self
    }

    pub fn with_cameras_downsample(mut self, downsample: i32) -> Self {
        self.downsample_cameras = downsample;
        self
    }

    pub fn with_links_downsample(mut self, downsample: i32) -> Self {
        self.downsample_links = downsample;
        self
    }

    /// Accepts up to three angles; anything short of `[rx, ry, rz]` leaves the
    /// correction unset.
    pub fn with_angle_correction(mut self, angles: &[f32]) -> Self {
        self.angle_correction = match angles {
            [rx, ry, rz] => Some([*rx, *ry, *rz]),
            _ => None,
        };
        self
    }
}

/// Indices `0..len` kept by a stride of `downsample`.
///
/// `downsample <= 0` keeps nothing, `1` keeps everything, larger strides keep
/// every multiple of the stride plus the last index.
pub fn downsample_indices(len: usize, downsample: i32) -> Vec<usize> {
    if downsample <= 0 || len == 0 {
        return Vec::new();
    }
    if downsample == 1 {
        return (0..len).collect();
    }
    let mut indices: Vec<usize> = (0..len).step_by(downsample as usize).collect();
    if indices.last() != Some(&(len - 1)) {
        indices.push(len - 1);
    }
    indices
}

/// One color per pose, blending linearly from `first` to `last`.
pub fn cameras_colors(first: Color, last: Color, len: usize) -> Vec<Color> {
    if len == 1 {
        return vec![first];
    }
    let denom = len.saturating_sub(1) as f32;
    (0..len)
        .map(|i| {
            let t = i as f32 / denom;
            let channel = |a: u8, b: u8| clamp_u8(lerp(a as f32, b as f32, t));
            Color::new(
                channel(first.r, last.r),
                channel(first.g, last.g),
                channel(first.b, last.b),
            )
        })
        .collect()
}

/// Replaces every orientation by its unit-norm version.
pub fn normalize_poses(poses: &mut [CameraPose]) -> Result<(), ViewerError> {
    for (index, pose) in poses.iter_mut().enumerate() {
        pose.q = pose
            .q
            .try_normalized()
            .ok_or(ViewerError::InvalidQuaternion { index })?;
    }
    Ok(())
}

/// Right-multiplies every orientation by the rotation given in Euler degrees.
pub fn apply_angle_correction(poses: &mut [CameraPose], angles: [f32; 3]) {
    let correction = Quaternion::from_euler_degrees(angles[0], angles[1], angles[2]);
    for pose in poses.iter_mut() {
        pose.q = pose.q * correction;
    }
}

/// Converts a trajectory into a fresh mesh.
pub fn build_mesh(poses: &[CameraPose], config: &TrajectoryConfig) -> Result<Mesh, ViewerError> {
    let mut mesh = Mesh::default();
    build_mesh_into(&mut mesh, poses, config)?;
    Ok(mesh)
}

/// Clears `mesh` and fills it with the glyphs of `poses`.
///
/// Camera glyphs come first in ascending pose order, then one link per
/// consecutive pair of the link selection.
pub fn build_mesh_into(
    mesh: &mut Mesh,
    poses: &[CameraPose],
    config: &TrajectoryConfig,
) -> Result<(), ViewerError> {
    mesh.clear();
    if poses.is_empty() {
        return Err(ViewerError::EmptyPoses);
    }

    let mut poses = poses.to_vec();
    normalize_poses(&mut poses)?;
    if let Some(angles) = config.angle_correction {
        debug!(?angles, "applying angle correction");
        apply_angle_correction(&mut poses, angles);
    }

    let colors = cameras_colors(config.first_color, config.last_color, poses.len());
    let cameras_indices = downsample_indices(poses.len(), config.downsample_cameras);
    let links_indices = downsample_indices(poses.len(), config.downsample_links);
    let num_links = links_indices.len().saturating_sub(1);

    mesh.points.reserve(
        cameras_indices.len() * CAMERA_NUM_POINTS + num_links * LINK_NUM_POINTS,
    );
    mesh.triangles.reserve(
        cameras_indices.len() * CAMERA_NUM_TRIANGLES + num_links * LINK_NUM_TRIANGLES,
    );

    for &i in &cameras_indices {
        make_camera_geometry(mesh, colors[i], &poses[i], config.resize, i)?;
    }

    for (link, pair) in links_indices.windows(2).enumerate() {
        let (previous, current) = (pair[0], pair[1]);
        make_cameras_link(
            mesh,
            colors[previous],
            colors[current],
            &poses[previous],
            &poses[current],
            config.resize,
            config.resize_for_links,
            link,
        )?;
    }

    info!(
        "Trajectory of {} poses: {} cameras, {} links, {} vertices, {} faces",
        poses.len(),
        cameras_indices.len(),
        num_links,
        mesh.vertex_count(),
        mesh.face_count()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structures::Position;

    fn line_poses(n: usize) -> Vec<CameraPose> {
        (0..n)
            .map(|i| CameraPose::new(Position::new(i as f32, 0.0, 0.0), Quaternion::IDENTITY))
            .collect()
    }

    #[test]
    fn test_downsample_indices() {
        assert_eq!(downsample_indices(5, 1), vec![0, 1, 2, 3, 4]);
        assert!(downsample_indices(5, 0).is_empty());
        assert!(downsample_indices(5, -3).is_empty());
        assert_eq!(downsample_indices(10, 3), vec![0, 3, 6, 9]);
        assert_eq!(downsample_indices(10, 4), vec![0, 4, 8, 9]);
        assert_eq!(downsample_indices(3, 40), vec![0, 2]);
        assert_eq!(downsample_indices(1, 40), vec![0]);
        assert!(downsample_indices(0, 1).is_empty());
        assert!(downsample_indices(0, 40).is_empty());
    }

    #[test]
    fn test_downsample_keeps_last_exactly_once() {
        for len in 1..50 {
            for k in 2..12 {
                let idx = downsample_indices(len, k);
                assert_eq!(idx.iter().filter(|&&i| i == len - 1).count(), 1);
                assert!(idx.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }

    #[test]
    fn test_colors_interpolate_endpoints() {
        let colors = cameras_colors(Color::RED, Color::BLUE, 5);
        assert_eq!(colors.len(), 5);
        assert_eq!(colors[0], Color::RED);
        assert_eq!(colors[4], Color::BLUE);
        assert_eq!(colors[2], Color::new(128, 0, 128));

        assert_eq!(cameras_colors(Color::RED, Color::BLUE, 1), vec![Color::RED]);
        assert!(cameras_colors(Color::RED, Color::BLUE, 0).is_empty());
    }

    #[test]
    fn test_normalize_poses() {
        let mut poses = vec![CameraPose::new(
            Position::default(),
            Quaternion::new(0.0, 0.0, 0.0, 4.0),
        )];
        normalize_poses(&mut poses).unwrap();
        assert_eq!(poses[0].q, Quaternion::IDENTITY);

        let mut poses = line_poses(3);
        poses[2].q = Quaternion::new(0.0, 0.0, 0.0, 0.0);
        let err = normalize_poses(&mut poses).unwrap_err();
        assert!(matches!(err, ViewerError::InvalidQuaternion { index: 2 }));
    }

    #[test]
    fn test_angle_correction_right_multiplies() {
        let mut poses = line_poses(2);
        poses[1].q = Quaternion::from_euler_degrees(0.0, 0.0, 45.0);
        apply_angle_correction(&mut poses, [90.0, 0.0, 0.0]);
        let qx = Quaternion::from_euler_degrees(90.0, 0.0, 0.0);
        assert_eq!(poses[0].q, Quaternion::IDENTITY * qx);
        assert_eq!(poses[1].q, Quaternion::from_euler_degrees(0.0, 0.0, 45.0) * qx);
    }

    #[test]
    fn test_partial_correction_is_ignored() {
        let config = TrajectoryConfig::default().with_angle_correction(&[10.0, 20.0]);
        assert_eq!(config.angle_correction, None);
        let config = TrajectoryConfig::default().with_angle_correction(&[10.0, 20.0, 30.0]);
        assert_eq!(config.angle_correction, Some([10.0, 20.0, 30.0]));
    }

    #[test]
    fn test_empty_trajectory_fails() {
        let err = build_mesh(&[], &TrajectoryConfig::default()).unwrap_err();
        assert!(matches!(err, ViewerError::EmptyPoses));
    }

    #[test]
    fn test_mesh_counts_follow_selection() {
        let poses = line_poses(10);
        let config = TrajectoryConfig::default()
            .with_cameras_downsample(4)
            .with_links_downsample(3);
        let mesh = build_mesh(&poses, &config).unwrap();
        // cameras 0, 4, 8, 9; links 0-3, 3-6, 6-9
        assert_eq!(mesh.vertex_count(), 4 * 9 + 3 * 26);
        assert_eq!(mesh.face_count(), 4 * 9 + 3 * 48);
        let n = mesh.vertex_count() as u32;
        assert!(mesh.triangles.iter().all(|t| t.a < n && t.b < n && t.c < n));
    }

    #[test]
    fn test_no_cameras_only_links() {
        let poses = line_poses(4);
        let config = TrajectoryConfig::default()
            .with_cameras_downsample(0)
            .with_links_downsample(1);
        let mesh = build_mesh(&poses, &config).unwrap();
        assert_eq!(mesh.vertex_count(), 3 * 26);
        assert_eq!(mesh.points[0].color, Color::RED);
        assert_eq!(mesh.points.last().unwrap().color, Color::BLUE);
    }

    #[test]
    fn test_single_pose_has_no_link() {
        let poses = line_poses(1);
        let config = TrajectoryConfig::default().with_cameras_downsample(1);
        let mesh = build_mesh(&poses, &config).unwrap();
        assert_eq!(mesh.vertex_count(), 9);
        assert!(mesh.points.iter().all(|p| p.color == Color::RED));
    }

    #[test]
    fn test_build_into_resets_buffers() {
        let poses = line_poses(3);
        let config = TrajectoryConfig::default().with_cameras_downsample(1);
        let mut mesh = Mesh::default();
        build_mesh_into(&mut mesh, &poses, &config).unwrap();
        let first = mesh.vertex_count();
        build_mesh_into(&mut mesh, &poses, &config).unwrap();
        assert_eq!(mesh.vertex_count(), first);
    }

    #[test]
    fn test_duplicate_centers_abort_with_link_index() {
        let mut poses = line_poses(4);
        poses[3].p = poses[2].p;
        let config = TrajectoryConfig::default().with_cameras_downsample(1);
        let err = build_mesh(&poses, &config).unwrap_err();
        assert!(matches!(err, ViewerError::DegenerateLink { link: 2 }));
    }

    #[test]
    fn test_caller_poses_are_untouched() {
        let mut poses = line_poses(2);
        poses[0].q = Quaternion::new(0.0, 0.0, 0.0, 3.0);
        let snapshot = poses.clone();
        build_mesh(&poses, &TrajectoryConfig::default()).unwrap();
        assert_eq!(poses, snapshot);
    }
}
