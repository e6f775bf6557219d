pub mod camera;
pub mod common;
pub mod error;
pub mod linalg;
pub mod link;
pub mod loader;
pub mod ply;
pub mod pose;
mod structures;
pub mod trajectory;

pub use error::ViewerError;
pub use loader::{load_poses, parse_poses};
pub use ply::{save_ply, with_ply_extension, write_ply};
pub use structures::{CameraPose, Color, Mesh, Point, Position, Quaternion, Triangle};
pub use trajectory::{build_mesh, build_mesh_into, TrajectoryConfig};

use std::path::{Path, PathBuf};

/// Builds the trajectory mesh and writes it as ASCII PLY.
///
/// Nothing is written unless the whole mesh was built successfully. Returns
/// the output path, `.ply` appended if it was missing.
pub fn write_trajectory_to_ply(
    poses: &[CameraPose],
    config: &TrajectoryConfig,
    output_path: impl AsRef<Path>,
) -> Result<PathBuf, ViewerError> {
    let mesh = build_mesh(poses, config)?;
    save_ply(&mesh, output_path)
}

cfg_if::cfg_if! {
if #[cfg(feature = "async")] {
    use tokio::io::{AsyncWrite, AsyncWriteExt};

    #[inline(never)]
    pub async fn write_ply_async<W>(writer: &mut W, mesh: &Mesh) -> Result<(), ViewerError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();
        write_ply(&mut buf, mesh)?;
        writer.write_all(&buf).await?;
        writer.flush().await?;
        Ok(())
    }

    #[inline(never)]
    pub async fn save_ply_async(
        mesh: &Mesh,
        path: impl AsRef<Path>,
    ) -> Result<PathBuf, ViewerError> {
        let path = with_ply_extension(path);
        let mut file = tokio::fs::File::create(&path).await?;
        write_ply_async(&mut file, mesh).await?;
        tracing::info!("Wrote {} faces to {}", mesh.face_count(), path.display());
        Ok(path)
    }

    #[inline(never)]
    pub async fn load_poses_async(path: impl AsRef<Path>) -> Result<Vec<CameraPose>, ViewerError> {
        let raw_data = tokio::fs::read(path.as_ref()).await?;
        parse_poses(&raw_data)
    }

    #[inline(never)]
    pub async fn write_trajectory_to_ply_async(
        poses: &[CameraPose],
        config: &TrajectoryConfig,
        output_path: impl AsRef<Path>,
    ) -> Result<PathBuf, ViewerError> {
        let mesh = build_mesh(poses, config)?;
        save_ply_async(&mesh, output_path).await
    }
}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn two_poses() -> Vec<CameraPose> {
        vec![
            CameraPose::new(Position::new(0.0, 0.5, 1.0), Quaternion::new(0.0, 0.0, 0.0, 1.0)),
            CameraPose::new(
                Position::new(0.0, 1.0, 1.0),
                Quaternion::new(0.0, 0.7071068, 0.0, 0.7071068),
            ),
        ]
    }

    fn two_pose_config() -> TrajectoryConfig {
        TrajectoryConfig::default()
            .with_cameras_downsample(1)
            .with_links_downsample(1)
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("slam_viewer_{}_{}", name, std::process::id()))
    }

    fn header_count(text: &str, element: &str) -> usize {
        let prefix = format!("element {} ", element);
        text.lines()
            .find_map(|l| l.strip_prefix(prefix.as_str()))
            .and_then(|n| n.parse().ok())
            .expect("missing element line")
    }

    fn validate_output_ply(text: &str) -> (usize, usize) {
        let vertices = header_count(text, "vertex");
        let faces = header_count(text, "face");
        let body: Vec<&str> = text
            .split("end_header\n")
            .nth(1)
            .expect("missing end_header")
            .lines()
            .collect();
        assert_eq!(body.len(), vertices + faces);
        for line in &body[..vertices] {
            let fields: Vec<&str> = line.split(' ').collect();
            assert_eq!(fields.len(), 6, "{}", line);
            for f in &fields[..3] {
                assert!(f.parse::<f32>().unwrap().is_finite());
            }
            for f in &fields[3..] {
                f.parse::<u8>().unwrap();
            }
        }
        for line in &body[vertices..] {
            let fields: Vec<usize> = line.split(' ').map(|f| f.parse().unwrap()).collect();
            assert_eq!(fields.len(), 4, "{}", line);
            assert_eq!(fields[0], 3);
            assert!(fields[1..].iter().all(|&i| i < vertices));
        }
        (vertices, faces)
    }

    #[test]
    fn test_two_pose_trajectory_mesh() {
        let mesh = build_mesh(&two_poses(), &two_pose_config()).unwrap();
        assert_eq!(mesh.vertex_count(), 44);
        assert_eq!(mesh.face_count(), 66);

        // Camera glyphs first, then the link.
        assert_eq!(mesh.points[0].color, Color::RED);
        assert_eq!(mesh.points[9].color, Color::BLUE);
        assert_eq!(mesh.triangles[18], Triangle::new(18, 20, 19));
    }

    #[test]
    fn test_write_trajectory_to_ply() {
        let base = temp_path("two_poses");
        let path = write_trajectory_to_ply(&two_poses(), &two_pose_config(), &base).unwrap();
        assert_eq!(path, with_ply_extension(&base));

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("ply\nformat ascii 1.0\ncomment Slam Viewer generated\n"));
        assert_eq!(validate_output_ply(&text), (44, 66));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_invalid_trajectory_writes_nothing() {
        let base = temp_path("invalid");
        let mut poses = two_poses();
        poses[1].q = Quaternion::new(0.0, 0.0, 0.0, 0.0);
        let err = write_trajectory_to_ply(&poses, &two_pose_config(), &base).unwrap_err();
        assert!(err.is_invariant_violation());
        assert!(!with_ply_extension(&base).exists());

        let err = write_trajectory_to_ply(&[], &two_pose_config(), &base).unwrap_err();
        assert!(matches!(err, ViewerError::EmptyPoses));
        assert!(!with_ply_extension(&base).exists());
    }

    #[test]
    fn test_load_and_convert_file() {
        let input = temp_path("poses.txt");
        fs::write(
            &input,
            "0 0 0.5 1 0 0 0 1\n1 0 1 1 0 0.7071068 0 0.7071068\n2 0 1 2 0 0 0 1\n",
        )
        .unwrap();
        let poses = load_poses(&input).unwrap();
        assert_eq!(poses.len(), 3);
        fs::remove_file(&input).unwrap();

        let config = TrajectoryConfig::default()
            .with_first_color(Color::from_ints(0, 0, 3000))
            .with_last_color(Color::from_ints(255, 0, 0))
            .with_resize(0.05);
        let mesh = build_mesh(&poses, &config).unwrap();
        // Default stride 40 keeps the first and last cameras; every pair is linked.
        assert_eq!(mesh.vertex_count(), 2 * 9 + 2 * 26);
        assert_eq!(mesh.points[0].color, Color::BLUE);
        assert_eq!(mesh.points[9].color, Color::RED);

        let mut out = Vec::new();
        write_ply(&mut out, &mesh).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(validate_output_ply(&text), (70, 2 * 9 + 2 * 48));
    }

    #[test]
    fn test_non_finite_links_write_nothing() {
        let base = temp_path("non_finite_links");
        let config = two_pose_config()
            .with_cameras_downsample(0)
            .with_resize(f32::INFINITY);
        let err = write_trajectory_to_ply(&two_poses(), &config, &base).unwrap_err();
        assert!(matches!(
            err,
            ViewerError::NonFiniteVector {
                what: "link vertex",
                index: 0
            }
        ));
        assert!(!with_ply_extension(&base).exists());
    }

    #[test]
    fn test_angle_correction_rotates_camera_glyphs() {
        let poses = vec![
            CameraPose::default(),
            CameraPose::new(Position::new(1.0, 0.0, 0.0), Quaternion::IDENTITY),
        ];
        let plain = build_mesh(&poses, &two_pose_config()).unwrap();
        let corrected = build_mesh(
            &poses,
            &two_pose_config().with_angle_correction(&[0.0, 90.0, 0.0]),
        )
        .unwrap();
        // The ridge point moves from local +z to world +x.
        let r = TrajectoryConfig::default().resize;
        assert!((plain.points[8].z - 0.5 * r).abs() < 1e-6);
        assert!((corrected.points[8].x - 0.5 * r).abs() < 1e-6);
        assert!(corrected.points[8].z.abs() < 1e-6);
        // Link geometry only depends on camera centers.
        assert_eq!(plain.points[18..], corrected.points[18..]);
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_write_trajectory_async() {
        let base = temp_path("async");
        let path = write_trajectory_to_ply_async(&two_poses(), &two_pose_config(), &base)
            .await
            .expect("write_trajectory_to_ply_async failed");

        let sync_mesh = build_mesh(&two_poses(), &two_pose_config()).unwrap();
        let mut expected = Vec::new();
        write_ply(&mut expected, &sync_mesh).unwrap();

        let written = tokio::fs::read(&path).await.unwrap();
        assert_eq!(written, expected);
        tokio::fs::remove_file(path).await.unwrap();
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_load_poses_async() {
        let input = temp_path("async_poses.txt");
        tokio::fs::write(&input, "1 2 3 0 0 0 1\n").await.unwrap();
        let poses = load_poses_async(&input).await.unwrap();
        let expected = CameraPose::new(Position::new(1.0, 2.0, 3.0), Quaternion::IDENTITY);
        assert_eq!(poses, vec![expected]);
        tokio::fs::remove_file(input).await.unwrap();
    }
}
